pub mod config;
pub mod coordinator;
pub mod http_server;
