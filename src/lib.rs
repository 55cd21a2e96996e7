pub mod cache;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod games;
pub mod orchestrator;
pub mod parser;
pub mod process;
pub mod prompts;
pub mod runner;
pub mod selection;
pub mod serve;
pub mod session;
pub mod types;
