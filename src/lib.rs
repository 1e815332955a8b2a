pub mod api;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod report;
pub mod simulation;
pub mod state;
