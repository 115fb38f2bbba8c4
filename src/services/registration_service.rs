//! Membership of a participant in the shared game record.
//!
//! The game record is the only record several sessions write to, and the store
//! has no compare-and-swap. Registration therefore writes the whole record,
//! waits, reads it back and starts over when a concurrent writer erased the
//! addition.

use time::OffsetDateTime;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        ids::{GameId, ParticipantId},
        records::Records,
    },
    error::ServiceError,
    services::retry::{Attempt, RetryOutcome, RetryPolicy, retry_with_backoff},
};

/// How a registration request ended. Exhaustion is a soft outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The participant was already listed; nothing was written.
    AlreadyRegistered,
    /// The participant was added and read back.
    Registered { attempts: u32 },
    /// Every attempt was overwritten or failed; the participant may be missing.
    Unverified { attempts: u32 },
}

impl RegistrationOutcome {
    pub fn is_verified(&self) -> bool {
        !matches!(self, RegistrationOutcome::Unverified { .. })
    }
}

/// Make sure `participant_id` appears in the registered participants of `game_id`.
///
/// Fails only on terminal conditions: the game does not exist, the credential
/// is missing, or the game record is malformed.
pub async fn ensure_registered(
    records: &Records,
    policy: &RetryPolicy,
    game_id: GameId,
    participant_id: ParticipantId,
) -> Result<RegistrationOutcome, ServiceError> {
    let outcome = retry_with_backoff(
        policy,
        "register participant",
        |attempt| register_once(records, policy, game_id, participant_id, attempt),
        ServiceError::is_retryable,
    )
    .await?;

    match outcome {
        RetryOutcome::Succeeded { value, .. } => Ok(value),
        RetryOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            warn!(
                game_id = %game_id,
                participant_id = %participant_id,
                attempts,
                last_error = last_error.as_ref().map(tracing::field::display),
                "registration could not be verified; continuing"
            );
            Ok(RegistrationOutcome::Unverified { attempts })
        }
    }
}

async fn register_once(
    records: &Records,
    policy: &RetryPolicy,
    game_id: GameId,
    participant_id: ParticipantId,
    attempt: u32,
) -> Result<Attempt<RegistrationOutcome>, ServiceError> {
    let mut game = records
        .get_game(game_id)
        .await?
        .ok_or(ServiceError::GameNotFound(game_id))?;

    if game.is_registered(participant_id) {
        return Ok(Attempt::Verified(if attempt == 1 {
            RegistrationOutcome::AlreadyRegistered
        } else {
            // A previous attempt landed after all.
            RegistrationOutcome::Registered { attempts: attempt }
        }));
    }

    game.register(participant_id, OffsetDateTime::now_utc());
    records.put_game(&game).await?;

    sleep(policy.settle_delay).await;

    let verified = records
        .get_game(game_id)
        .await?
        .ok_or(ServiceError::GameNotFound(game_id))?
        .is_registered(participant_id);

    if verified {
        info!(game_id = %game_id, participant_id = %participant_id, attempt, "participant registered");
        Ok(Attempt::Verified(RegistrationOutcome::Registered { attempts: attempt }))
    } else {
        debug!(game_id = %game_id, participant_id = %participant_id, attempt, "registration overwritten");
        Ok(Attempt::Unverified)
    }
}
