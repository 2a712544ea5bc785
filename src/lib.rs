//! Parsing and truth-table simulation of single-bit combinational chips.
//!
//! Chips are written in a small HDL:
//!
//! ```text
//! CHIP And {
//!     IN a, b;
//!     OUT out;
//!
//!     PARTS:
//!     Nand(a=a, b=b, out=nandOut);
//!     Not(in=nandOut, out=out);
//! }
//! ```
//!
//! Parsed chips are added to a [`Registry`], which starts out holding the
//! built-in gates (see [`Builtin`]). An [`Evaluator`] computes a chip's outputs
//! from its inputs, and a [`TestRunner`] checks a chip against [`TestVectors`].

mod loc;
mod error;
mod chip;
mod builtin;
mod registry;
mod eval;
mod parse;
mod testbench;
mod runner;
mod library;

#[cfg(test)]
mod tests;

pub use loc::*;
pub use error::*;
pub use chip::*;
pub use builtin::Builtin;
pub use registry::{Chip, Registry};
pub use eval::Evaluator;
pub use parse::*;
pub use testbench::*;
pub use runner::*;
pub use library::Library;
