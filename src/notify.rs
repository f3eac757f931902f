//! Change notification hooks for presentation layers.

use tracing::debug;

use crate::models::Tournament;

/// Receives the tournament after every successful mutating operation.
pub trait ChangeNotifier {
    fn notify_changed(&self, tournament: &Tournament);
}

/// Discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify_changed(&self, _tournament: &Tournament) {}
}

/// Logs each change at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ChangeNotifier for TracingNotifier {
    fn notify_changed(&self, tournament: &Tournament) {
        debug!(
            "Tournament {} changed: status={}, rounds={}, players={}",
            tournament.id,
            tournament.status,
            tournament.rounds.len(),
            tournament.players.len()
        );
    }
}

impl<F> ChangeNotifier for F
where
    F: Fn(&Tournament),
{
    fn notify_changed(&self, tournament: &Tournament) {
        self(tournament)
    }
}
