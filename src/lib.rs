pub mod classify;
pub mod config;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod scheduler;
pub mod snapshot;
pub mod source;
pub mod staleness;
pub mod store;
