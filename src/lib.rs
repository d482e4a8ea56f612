pub mod cli;
pub mod config;
pub mod data;
pub mod parallel;
pub mod server;
pub mod sim;
