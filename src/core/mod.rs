//! Core declaration runtime.

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod registry;
pub mod resource;
pub mod state;
pub mod types;
pub mod value;
