//! Clipmark Core Library
//!
//! Configuration and logging shared by the `clipmark` binary.

pub mod colored_logger;
pub mod config;
