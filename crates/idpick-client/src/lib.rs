#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;
mod scheduler;
mod session;
#[cfg(test)]
mod testing;
mod transport;
mod view;

pub use crate::client::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::scheduler::*;
pub use crate::session::*;
pub use crate::transport::*;
pub use crate::view::*;
// Public re-export so downstream crates can reach the shared wire types via
// `idpick_client::idpick_core`
pub use idpick_core;
