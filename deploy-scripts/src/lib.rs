//! Scripts for deploying compiled contracts and recording their addresses.

#![deny(missing_docs)]

pub mod artifacts;
pub mod cli;
pub mod client;
pub mod commands;
pub mod constants;
pub mod errors;
pub mod plan;
pub mod runner;
pub mod types;
pub mod utils;
