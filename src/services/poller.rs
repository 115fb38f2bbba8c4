//! Participant-side poller of the game-state record.

use std::time::Duration;

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
    dao::ids::GameId,
    error::ServiceError,
    services::sse_events::fold_and_broadcast_if,
    state::{SharedState, view::ViewTransition},
};

/// Running poll loop. Dropping the handle stops the loop at its next wake-up.
pub struct PollerHandle {
    game_id: GameId,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Ask the loop to exit. A read already in flight is discarded.
    pub fn stop(self) {
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Start polling `game_id` every `every`, folding new records into the view.
/// The loop ends on its own once the game has ended.
pub fn spawn(state: SharedState, game_id: GameId, every: Duration) -> PollerHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(game_id = %game_id, interval_ms = every.as_millis() as u64, "poller started");

        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match poll_tick(&state, game_id, Some(&stop_rx)).await {
                        Ok(Some(ViewTransition::Ended { .. })) => {
                            info!(game_id = %game_id, "game ended; poller exiting");
                            break;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(game_id = %game_id, error = %err, "game state poll failed; retrying next tick");
                        }
                    }
                }
            }
        }

        debug!(game_id = %game_id, "poller stopped");
    });

    PollerHandle {
        game_id,
        stop: stop_tx,
        task,
    }
}

/// One poll: read the game-state record and fold it into the view.
///
/// The result is dropped when the poller was stopped during the read or the
/// session moved on to another game meanwhile. Both are checked under the
/// session lock taken for the fold.
pub async fn poll_tick(
    state: &SharedState,
    game_id: GameId,
    stop: Option<&watch::Receiver<bool>>,
) -> Result<Option<ViewTransition>, ServiceError> {
    let record = state.records().get_game_state(game_id).await?;

    let transition = fold_and_broadcast_if(state, record.as_ref(), |session| {
        if stop.is_some_and(|stop| *stop.borrow()) {
            debug!(game_id = %game_id, "discarding poll result after stop");
            return false;
        }
        if session.game_id != Some(game_id) {
            debug!(game_id = %game_id, "discarding poll result for previous game");
            return false;
        }
        true
    })
    .await;
    Ok(transition)
}
