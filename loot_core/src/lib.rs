//! Core crate for the Gravemark loot contention arbiter.
//!
//! Tracks per-session loot contests, runs the randomized-score election once
//! an admission window closes, and gates item/currency hand-out to the
//! elected winner. [`build_headless_app`] wires the arbiter and its intake
//! systems into a bevy [`App`]; one [`run_cycle`] processes every queued
//! request and override.

mod arbiter;
pub mod config;
mod handlers;
pub mod metrics;
pub mod notice;

use bevy::prelude::*;

pub use arbiter::{
    ActorId, AdmissionDecision, AdmissionRequest, Candidacy, ContestPhase, DiceScore, LootArbiter,
    LootSession, LootSessionId, OverrideSummary,
};
pub use config::{load_arbiter_config_from_env, ArbiterConfig};
pub use handlers::{
    GrantLog, OverrideLog, OverrideQueue, OverrideReport, QueuedTake, ServerClock, TakeReceipt,
    TakeRequestQueue, TransferGrant,
};
pub use loot_proto::{LootChannel, LootKind};
pub use metrics::ArbiterMetrics;
pub use notice::{notice_channel, start_notice_server, LootNotice, NoticeBus, NoticeSink};

/// Construct a bevy [`App`] configured with the loot-arbiter pipeline.
///
/// The notice receiver is parked in a [`NoticeSink`] resource; the hosting
/// server removes it and hands it to [`start_notice_server`], while tests
/// keep it to observe published notices.
pub fn build_headless_app() -> App {
    let mut app = App::new();

    let config = load_arbiter_config_from_env();
    let arbiter = LootArbiter::new(&config);
    let (bus, sink) = notice_channel();

    app.insert_resource(config)
        .insert_resource(arbiter)
        .insert_resource(bus)
        .insert_resource(sink)
        .insert_resource(ServerClock::default())
        .insert_resource(TakeRequestQueue::default())
        .insert_resource(OverrideQueue::default())
        .insert_resource(GrantLog::default())
        .insert_resource(OverrideLog::default())
        .insert_resource(ArbiterMetrics::default())
        .add_plugins(MinimalPlugins)
        .add_systems(
            Update,
            (
                handlers::process_overrides,
                handlers::process_take_requests,
                handlers::reap_expired_sessions,
                metrics::collect_metrics,
            )
                .chain(),
        );

    app
}

/// Process everything queued since the previous cycle.
pub fn run_cycle(app: &mut App) {
    app.update();
}
