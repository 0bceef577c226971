use bevy::prelude::{Res, ResMut, Resource};

use loot_proto::{LootChannel, LootKind};

use crate::arbiter::{
    ActorId, AdmissionDecision, AdmissionRequest, LootArbiter, LootSessionId, OverrideSummary,
};
use crate::config::ArbiterConfig;
use crate::metrics::ArbiterMetrics;
use crate::notice::{LootNotice, NoticeBus};

/// Coarse server time in milliseconds, stamped by the hosting loop before
/// each update. Systems never read the wall clock directly.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerClock(pub u64);

/// One take request plus the server time at which it arrived.
#[derive(Debug, Clone)]
pub struct QueuedTake {
    pub request: AdmissionRequest,
    pub received_at_ms: u64,
}

/// Inbound take requests, drained once per update.
#[derive(Resource, Debug, Default)]
pub struct TakeRequestQueue {
    pending: Vec<QueuedTake>,
}

impl TakeRequestQueue {
    pub fn push(&mut self, request: AdmissionRequest, received_at_ms: u64) {
        self.pending.push(QueuedTake {
            request,
            received_at_ms,
        });
    }

    pub fn drain(&mut self) -> Vec<QueuedTake> {
        std::mem::take(&mut self.pending)
    }
}

/// Inbound manager overrides, drained before the take requests so an okwin
/// issued in the same batch is honoured.
#[derive(Resource, Debug, Default)]
pub struct OverrideQueue {
    pending: Vec<ActorId>,
}

impl OverrideQueue {
    pub fn push(&mut self, manager: ActorId) {
        self.pending.push(manager);
    }

    pub fn drain(&mut self) -> Vec<ActorId> {
        std::mem::take(&mut self.pending)
    }
}

/// Authorisation for the inventory collaborator to hand the goods over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferGrant {
    pub actor: ActorId,
    pub session: LootSessionId,
    pub channel: LootChannel,
    pub currency: u64,
}

/// Per-request acknowledgment, including deferrals and denials, so the
/// hosting server can answer instead of dropping requests on the floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeReceipt {
    pub actor: ActorId,
    pub session: LootSessionId,
    pub channel: LootChannel,
    pub decision: AdmissionDecision,
}

#[derive(Resource, Debug, Default)]
pub struct GrantLog {
    grants: Vec<TransferGrant>,
    receipts: Vec<TakeReceipt>,
}

impl GrantLog {
    pub fn drain_grants(&mut self) -> Vec<TransferGrant> {
        std::mem::take(&mut self.grants)
    }

    pub fn drain_receipts(&mut self) -> Vec<TakeReceipt> {
        std::mem::take(&mut self.receipts)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideReport {
    pub manager: ActorId,
    pub summary: OverrideSummary,
}

#[derive(Resource, Debug, Default)]
pub struct OverrideLog {
    reports: Vec<OverrideReport>,
}

impl OverrideLog {
    pub fn drain(&mut self) -> Vec<OverrideReport> {
        std::mem::take(&mut self.reports)
    }
}

pub fn process_overrides(
    mut queue: ResMut<OverrideQueue>,
    mut arbiter: ResMut<LootArbiter>,
    bus: Res<NoticeBus>,
    mut log: ResMut<OverrideLog>,
    mut metrics: ResMut<ArbiterMetrics>,
) {
    for manager in queue.drain() {
        let summary = arbiter.force_override(manager);
        metrics.overrides_total += 1;
        tracing::info!(
            target: "gravemark::arbiter",
            manager = %manager,
            reopened = summary.reopened,
            forfeited = summary.forfeited,
            sessions = summary.sessions,
            "override.applied"
        );
        bus.publish(LootNotice::OverrideDone {
            actor: manager,
            touched: summary.touched(),
            sessions: summary.sessions,
        });
        log.reports.push(OverrideReport { manager, summary });
    }
}

pub fn process_take_requests(
    mut queue: ResMut<TakeRequestQueue>,
    mut arbiter: ResMut<LootArbiter>,
    bus: Res<NoticeBus>,
    mut log: ResMut<GrantLog>,
    mut metrics: ResMut<ArbiterMetrics>,
) {
    for queued in queue.drain() {
        let request = &queued.request;
        if request.kind == LootKind::Unknown {
            tracing::warn!(
                target: "gravemark::arbiter",
                actor = %request.actor,
                session = %request.session,
                "loot kind unclassified; contest closes immediately"
            );
        }
        let decision = arbiter.request_admission(request, queued.received_at_ms, &bus);
        metrics.requests_total += 1;
        match decision {
            AdmissionDecision::Admitted => {
                metrics.admissions_total += 1;
                log.grants.push(TransferGrant {
                    actor: request.actor,
                    session: request.session,
                    channel: request.channel,
                    currency: request.currency,
                });
            }
            AdmissionDecision::Deferred => metrics.deferrals_total += 1,
            AdmissionDecision::DeniedNotWinner => metrics.denials_total += 1,
        }
        log.receipts.push(TakeReceipt {
            actor: request.actor,
            session: request.session,
            channel: request.channel,
            decision,
        });
    }
}

pub fn reap_expired_sessions(
    config: Res<ArbiterConfig>,
    clock: Res<ServerClock>,
    mut arbiter: ResMut<LootArbiter>,
    mut metrics: ResMut<ArbiterMetrics>,
) {
    let reaped = arbiter.reap_expired(clock.0, config.resolved_ttl_ms, config.stale_ttl_ms);
    metrics.sessions_reaped_total += reaped as u64;
}
