//! Message channels consumed by the receive race and draining consumers.
//!
//! ## Contents
//! - [`Source`], [`Target`] minimal contracts the core depends on
//! - [`Buffer`] multi-producer FIFO queue (unbounded or bounded) with relink
//! - [`OverwriteBuffer`] single-slot sink used as the relink target after a consumer fails

mod buffer;
mod overwrite;
mod source;

pub use buffer::Buffer;
pub use overwrite::OverwriteBuffer;
pub use source::{Source, Target};
