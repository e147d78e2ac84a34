pub mod cli;
pub mod load_config;
pub mod pull_request;

pub use cli::{run, Cli, Commands};
