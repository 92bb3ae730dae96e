pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod injector;
pub mod sharing;
pub mod vault;
