pub mod config;
pub mod progress;
pub mod prompts;
pub mod reconcile;
