//! BSP Oracle - client for the external Library of Babel service.
//!
//! The service is a deterministic black box: `search` maps a 3200-symbol
//! page text to the coordinate it lives at, `fetch` maps a coordinate back
//! to the page text. This crate owns the HTTP contract, the defensive HTML
//! parsing, and the retry policy; the integrity of the stored coordinate
//! stream depends on it.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod error;
mod parse;

pub use client::*;
pub use error::*;
pub use parse::*;
