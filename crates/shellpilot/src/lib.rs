//! Shellpilot: an oracle-driven container shell.
//!
//! The binary wires the pieces together: a streaming oracle client, one
//! container shell session, and the turn loop that alternates between
//! them, with turns rendered to the terminal as they arrive.

pub mod cli;
pub mod printer;
