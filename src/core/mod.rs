pub mod alerts;
pub mod model;
pub mod pipeline;
pub mod store;
