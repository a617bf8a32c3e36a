//! Turn records and the broadcast channel for Shellpilot.
//!
//! Everything user-visible in a pilot run is a [`Turn`]: a message
//! attributed to the user, the oracle, or the shell, either still
//! streaming (`partial`) or final (`done`). The [`TurnBus`] fans turns
//! out to any number of presentation consumers.
//!
//! # Example
//!
//! ```
//! use pilot_events::{Speaker, Turn, TurnBus};
//!
//! let bus = TurnBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(Turn::done(Speaker::Shell, "hello"));
//!
//! let turn = rx.try_recv().unwrap();
//! assert_eq!(turn.message, "hello");
//! ```

pub mod bus;
pub mod turn;

pub use bus::TurnBus;
pub use turn::{Outcome, Phase, Speaker, Turn};
