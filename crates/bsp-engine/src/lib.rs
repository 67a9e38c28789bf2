//! BSP Engine - wires codec, chunker, signatures, and the oracle client
//! into the four storage operations.
//!
//! Operations are logically single-threaded; within an upload or download
//! the coordinate calls run with bounded concurrency while reassembly is
//! strictly sequential over chunk indices. Progress is an output-only side
//! effect behind a watch channel; the engine never reads it back.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod engine;
mod error;
mod format;
mod operation;
mod progress;
mod verify;

pub use engine::*;
pub use error::*;
pub use format::*;
pub use operation::*;
pub use progress::*;
pub use verify::*;

// The estimate operation is the chunker's, re-exported for collaborators.
pub use bsp_chunker::{estimate, StorageEstimate};
