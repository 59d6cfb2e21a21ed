pub mod dashboard;
pub mod server;
