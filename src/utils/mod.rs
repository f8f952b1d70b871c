pub mod relay_server;
pub mod speech;
