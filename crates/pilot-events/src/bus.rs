//! Broadcast fan-out of turns to presentation consumers.

use tokio::sync::broadcast;
use tracing::trace;

use crate::turn::Turn;

/// Default buffer size for the turn channel.
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out channel for [`Turn`]s.
///
/// Producers call [`TurnBus::emit`]; each consumer gets its own
/// [`broadcast::Receiver`] via [`TurnBus::subscribe`]. Emitting with no
/// subscribers is not an error. Partial turns are delivered in order but
/// carry no replay guarantee beyond the channel buffer; a slow consumer
/// that lags only loses superseded partials.
#[derive(Debug, Clone)]
pub struct TurnBus {
    tx: broadcast::Sender<Turn>,
}

impl TurnBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all turns emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Turn> {
        self.tx.subscribe()
    }

    /// Emit a turn to all subscribers.
    pub fn emit(&self, turn: Turn) {
        trace!(
            speaker = %turn.speaker,
            phase = ?turn.phase,
            outcome = ?turn.outcome,
            len = turn.message.len(),
            "emitting turn"
        );
        // Ignore send errors (no receivers).
        let _ = self.tx.send(turn);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for TurnBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::{Outcome, Phase, Speaker};

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = TurnBus::default();
        let mut rx = bus.subscribe();

        bus.emit(Turn::done(Speaker::Shell, "hello"));

        let turn = rx.recv().await.unwrap();
        assert_eq!(turn.message, "hello");
        assert_eq!(turn.speaker, Speaker::Shell);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = TurnBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(Turn::warn(Speaker::Oracle, "slow down"));

        assert_eq!(rx1.recv().await.unwrap().outcome, Outcome::Warn);
        assert_eq!(rx2.recv().await.unwrap().outcome, Outcome::Warn);
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_ok() {
        let bus = TurnBus::default();
        bus.emit(Turn::done(Speaker::User, "nobody listening"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_then_done_ordering() {
        let bus = TurnBus::default();
        let mut rx = bus.subscribe();

        bus.emit(Turn::partial(Speaker::Oracle, "ls"));
        bus.emit(Turn::partial(Speaker::Oracle, "ls -la"));
        bus.emit(Turn::done(Speaker::Oracle, "ls -la"));

        assert_eq!(rx.recv().await.unwrap().phase, Phase::Partial);
        assert_eq!(rx.recv().await.unwrap().phase, Phase::Partial);
        let last = rx.recv().await.unwrap();
        assert_eq!(last.phase, Phase::Done);
        assert_eq!(last.message, "ls -la");
    }
}
