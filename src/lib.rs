pub mod cli;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod poll;
pub mod quote;
pub mod scheduler;
pub mod shutdown;
pub mod store;
pub mod testkit;
