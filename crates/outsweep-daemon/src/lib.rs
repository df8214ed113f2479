pub mod clock;
pub mod config;
pub mod daemon;
pub mod error;
pub mod platform;
pub mod poller;
