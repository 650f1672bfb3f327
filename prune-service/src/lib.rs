pub mod config;
pub mod prune;
