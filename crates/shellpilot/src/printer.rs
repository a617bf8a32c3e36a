//! Terminal rendering of turns.

use pilot_events::{Outcome, Phase, Turn, TurnBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::trace;

/// Subscribe to the bus and print final turns until the bus closes.
///
/// Partial turns are superseded by the following done turn, so they are
/// traced rather than printed; a terminal has no good way to retract a
/// line.
pub fn spawn_printer(bus: &TurnBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(turn) => {
                    if turn.phase == Phase::Partial {
                        trace!(speaker = %turn.speaker, len = turn.message.len(), "partial");
                        continue;
                    }
                    println!("{}", format_turn(&turn));
                }
                Err(RecvError::Lagged(skipped)) => {
                    trace!(skipped, "printer lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// One line per final turn: `[speaker] message`, with a suffix marking
/// non-ok outcomes.
fn format_turn(turn: &Turn) -> String {
    let tag = match turn.outcome {
        Outcome::Ok => "",
        Outcome::Err => " err",
        Outcome::Warn => " warn",
        Outcome::Terminated => " killed",
    };
    format!("[{}{}] {}", turn.speaker, tag, turn.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_events::Speaker;

    #[test]
    fn test_format_ok_turn() {
        let turn = Turn::done(Speaker::Shell, "hello");
        assert_eq!(format_turn(&turn), "[shell] hello");
    }

    #[test]
    fn test_format_err_turn() {
        let turn = Turn::err(Speaker::Shell, "no such file");
        assert_eq!(format_turn(&turn), "[shell err] no such file");
    }

    #[test]
    fn test_format_warn_and_terminated() {
        let turn = Turn::warn(Speaker::Oracle, "rate limited");
        assert_eq!(format_turn(&turn), "[oracle warn] rate limited");

        let turn = Turn::terminated(Speaker::Oracle, "Killed: ls");
        assert_eq!(format_turn(&turn), "[oracle killed] Killed: ls");
    }

    #[tokio::test]
    async fn test_printer_exits_when_bus_closes() {
        let bus = TurnBus::default();
        let printer = spawn_printer(&bus);
        drop(bus);
        printer.await.unwrap();
    }
}
