//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`count`] - Combination count for given tile sizes
//! - [`search`] - Main command (enumerate and build mosaics)
//! - [`tiles`] - Tile grouping and enumeration order of a catalog

pub mod common;
pub mod config;
pub mod count;
pub mod search;
pub mod tiles;
