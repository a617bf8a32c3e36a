//! Marker-framed shell session transport for Shellpilot.
//!
//! This crate turns the raw, unframed byte stream of an interactive child
//! process into discrete command results:
//! - [`Marker`] generates effectively-unique end-of-command tokens,
//! - [`Framer`] matches a marker incrementally across output chunks,
//! - [`ShellSession`] owns one child process and offers boot, one-shot
//!   command execution, and teardown.
//!
//! The framing protocol: every command written to the shell is followed
//! by `echo <marker>` on its own line; everything the shell prints before
//! the marker is that command's result.

pub mod error;
pub mod framer;
pub mod marker;
pub mod session;

pub use error::{Result, ShellError};
pub use framer::{Framed, Framer};
pub use marker::{Marker, READY_MARKER};
pub use session::{ExecOutcome, ShellSession};
