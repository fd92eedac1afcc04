pub mod config;
pub mod rate_limiter;
pub mod server;
pub mod ticket;
pub mod zoho;
