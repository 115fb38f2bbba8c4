/// Shard reads merged into entry lists and vote tallies.
pub mod aggregation_service;
/// Single dispatch point for UI commands.
pub mod commands;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game creation and joining.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Invite link building and parsing.
pub mod links;
/// Owner transitions publishing the game state.
pub mod owner_service;
/// Writes to the caller's own participant shard.
pub mod participant_service;
/// Game-state poll loop for participants.
pub mod poller;
/// Session-scoped reads and writes exposed to the UI.
pub mod public_service;
/// Membership registration with read-back verification.
pub mod registration_service;
/// Bounded retry with exponential backoff and jitter.
pub mod retry;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Record store health supervision and degraded mode.
pub mod storage_supervisor;
