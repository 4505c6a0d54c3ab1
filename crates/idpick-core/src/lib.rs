#![doc = include_str!("../README.md")]

mod catalog;
mod coerce;
mod common;
mod domain;
mod engine;
mod selection;
pub mod wire;

pub use crate::catalog::*;
pub use crate::coerce::*;
pub use crate::common::*;
pub use crate::domain::*;
pub use crate::engine::*;
pub use crate::selection::*;
