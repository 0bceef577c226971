use std::fmt;

use ahash::AHashMap;
use bevy::prelude::Resource;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use loot_proto::{LootChannel, LootKind};

use crate::config::ArbiterConfig;
use crate::notice::{CoinSplit, LootNotice, NoticeBus};

/// Identifier for the entity controlled by a requesting connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque id for one open loot session, issued by the loot-session subsystem.
/// Creation time is tracked separately and used only for window arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LootSessionId(pub u64);

impl fmt::Display for LootSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidacy's dice state. Late arrivals are `Scored(0)`; an explicit
/// decline via the override command is `Forfeit`. Both count as zero in the
/// election but stay distinguishable in diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiceScore {
    #[default]
    Unscored,
    Scored(u32),
    Forfeit,
}

impl DiceScore {
    pub fn is_unscored(&self) -> bool {
        matches!(self, DiceScore::Unscored)
    }

    /// Election value; `None` until a score has been assigned.
    pub fn effective(&self) -> Option<u32> {
        match self {
            DiceScore::Unscored => None,
            DiceScore::Scored(value) => Some(*value),
            DiceScore::Forfeit => Some(0),
        }
    }
}

/// One actor's registered interest in a loot session.
#[derive(Debug, Clone, Default)]
pub struct Candidacy {
    pub requests: u32,
    pub score: DiceScore,
}

impl Candidacy {
    fn forfeited() -> Self {
        Self {
            requests: 1,
            score: DiceScore::Forfeit,
        }
    }
}

/// Contest phase of a session within the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestPhase {
    Open,
    Resolved,
}

/// One lootable object's open loot session and its contest state.
#[derive(Debug, Clone)]
pub struct LootSession {
    created_at_ms: u64,
    origin_name: Option<String>,
    currency: u64,
    candidates: AHashMap<ActorId, Candidacy>,
    winner: Option<ActorId>,
    override_fired: bool,
    item_notice_sent: bool,
    currency_notice_sent: bool,
    resolved_at_ms: Option<u64>,
}

impl LootSession {
    fn opened_at(now_ms: u64) -> Self {
        Self {
            created_at_ms: now_ms,
            origin_name: None,
            currency: 0,
            candidates: AHashMap::new(),
            winner: None,
            override_fired: false,
            item_notice_sent: false,
            currency_notice_sent: false,
            resolved_at_ms: None,
        }
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn winner(&self) -> Option<ActorId> {
        self.winner
    }

    pub fn override_fired(&self) -> bool {
        self.override_fired
    }

    pub fn currency(&self) -> u64 {
        self.currency
    }

    pub fn candidate(&self, actor: ActorId) -> Option<&Candidacy> {
        self.candidates.get(&actor)
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn phase(&self) -> ContestPhase {
        if self.winner.is_some() {
            ContestPhase::Resolved
        } else {
            ContestPhase::Open
        }
    }
}

/// Outcome of one take request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The requester is the winner; the caller may transfer the goods.
    Admitted,
    /// The contest is still collecting candidates; the caller must not
    /// transfer anything and the actor may retry.
    Deferred,
    /// A different actor won this epoch; transfer is permanently denied
    /// unless the winner runs the override command.
    DeniedNotWinner,
}

/// One take request as seen by the arbiter. Kind, group size, and origin
/// liveness are snapshots supplied by the calling handler.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    pub actor: ActorId,
    pub session: LootSessionId,
    pub kind: LootKind,
    pub channel: LootChannel,
    pub origin_name: Option<String>,
    pub group_size: u32,
    pub currency: u64,
}

/// Counts reported back from a manager override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideSummary {
    /// Sessions where the manager was the winner and the contest reopened.
    pub reopened: u32,
    /// Still-open sessions where the manager's claim was forced to forfeit.
    pub forfeited: u32,
    /// Total sessions inspected.
    pub sessions: u32,
}

impl OverrideSummary {
    pub fn touched(&self) -> u32 {
        self.reopened + self.forfeited
    }
}

/// Tracks loot contests and decides, per take request, whether the requester
/// may proceed. One exclusive-access domain: all mutation happens on the
/// world thread that owns this resource.
#[derive(Resource, Debug)]
pub struct LootArbiter {
    sessions: AHashMap<LootSessionId, LootSession>,
    admission_window_ms: u64,
    max_dice: u32,
    rng: SmallRng,
    resolved_total: u64,
}

impl LootArbiter {
    pub fn new(config: &ArbiterConfig) -> Self {
        let rng = if config.rng_seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(config.rng_seed ^ 0x1007_D1CE)
        };
        Self {
            sessions: AHashMap::new(),
            admission_window_ms: config.admission_window_ms,
            max_dice: config.max_dice.max(1),
            rng,
            resolved_total: 0,
        }
    }

    pub fn session(&self, id: LootSessionId) -> Option<&LootSession> {
        self.sessions.get(&id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn open_session_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|session| session.winner.is_none())
            .count()
    }

    pub fn resolved_session_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|session| session.winner.is_some())
            .count()
    }

    pub fn contests_resolved_total(&self) -> u64 {
        self.resolved_total
    }

    /// Decide whether `request.actor` may take from the session right now.
    ///
    /// First touch of an unknown session id creates it; there is no
    /// not-found path. Notices go out through `notices` as a side effect,
    /// gated so each candidate hears each channel's outcome at most once per
    /// epoch.
    pub fn request_admission(
        &mut self,
        request: &AdmissionRequest,
        now_ms: u64,
        notices: &NoticeBus,
    ) -> AdmissionDecision {
        let window_ms = self.admission_window_ms;
        let max_dice = self.max_dice;

        let session = self
            .sessions
            .entry(request.session)
            .or_insert_with(|| LootSession::opened_at(now_ms));
        session.origin_name = request.origin_name.clone();
        if request.currency > 0 {
            session.currency = request.currency;
        }
        let elapsed = now_ms.saturating_sub(session.created_at_ms);

        let candidacy = session.candidates.entry(request.actor).or_default();
        candidacy.requests += 1;

        if candidacy.score.is_unscored() {
            let drawn = self.rng.gen_range(1..=max_dice);
            // Late arrivals keep a candidacy but forfeit any priority.
            let late = elapsed >= window_ms;
            let assigned = if late { 0 } else { drawn };
            candidacy.score = DiceScore::Scored(assigned);
            tracing::debug!(
                target: "gravemark::arbiter",
                actor = %request.actor,
                session = %request.session,
                kind = request.kind.as_str(),
                score = assigned,
                late,
                "candidacy.scored"
            );
            if request.kind == LootKind::CorpseKill
                && request.group_size > 1
                && !session.override_fired
            {
                notices.publish(LootNotice::Claim {
                    actor: request.actor,
                    session: request.session,
                    score: assigned,
                });
            }
        }

        let contest_open = !session.override_fired
            && elapsed < window_ms
            && (session.candidates.len() as u32) < request.group_size
            && request.kind == LootKind::CorpseKill
            && session.winner.is_none();
        if contest_open {
            tracing::debug!(
                target: "gravemark::arbiter",
                actor = %request.actor,
                session = %request.session,
                elapsed,
                candidates = session.candidates.len(),
                group = request.group_size,
                "admission.deferred"
            );
            return AdmissionDecision::Deferred;
        }

        if session.winner.is_none() {
            // The upsert above makes the zero-candidate branch unreachable;
            // it survives as the default-winner fallback.
            let winner = elect_winner(&session.candidates).unwrap_or(request.actor);
            session.winner = Some(winner);
            session.resolved_at_ms = Some(now_ms);
            self.resolved_total += 1;
            tracing::info!(
                target: "gravemark::arbiter",
                session = %request.session,
                winner = %winner,
                candidates = session.candidates.len(),
                override_fired = session.override_fired,
                "contest.resolved"
            );
            if request.group_size > 1
                && (session.candidates.len() as u32) < request.group_size
                && request.kind == LootKind::CorpseKill
                && !session.override_fired
            {
                notices.publish(LootNotice::SoleClaim {
                    actor: winner,
                    session: request.session,
                    origin: session.origin_name.clone(),
                });
            }
        }

        let already_sent = match request.channel {
            LootChannel::Item => session.item_notice_sent,
            LootChannel::Currency => session.currency_notice_sent,
        };
        if !already_sent {
            if !session.override_fired
                && session.origin_name.is_some()
                && request.kind == LootKind::CorpseKill
            {
                if let Some(winner) = session.winner {
                    for (actor, candidacy) in &session.candidates {
                        let score = candidacy.score.effective().unwrap_or(0);
                        let notice = if *actor == winner {
                            LootNotice::ContestWon {
                                actor: *actor,
                                session: request.session,
                                channel: request.channel,
                                score,
                                coins: match request.channel {
                                    LootChannel::Currency => {
                                        Some(CoinSplit::from_copper(session.currency))
                                    }
                                    LootChannel::Item => None,
                                },
                            }
                        } else {
                            LootNotice::ContestLost {
                                actor: *actor,
                                session: request.session,
                                channel: request.channel,
                                score,
                            }
                        };
                        notices.publish(notice);
                    }
                }
            }
            match request.channel {
                LootChannel::Item => session.item_notice_sent = true,
                LootChannel::Currency => session.currency_notice_sent = true,
            }
        }

        if session.winner == Some(request.actor) {
            AdmissionDecision::Admitted
        } else {
            tracing::debug!(
                target: "gravemark::arbiter",
                actor = %request.actor,
                session = %request.session,
                winner = ?session.winner,
                "admission.denied"
            );
            AdmissionDecision::DeniedNotWinner
        }
    }

    /// Manager override: wherever `manager` already won, reopen the contest
    /// for everyone else; wherever a contest is still open, forfeit the
    /// manager's claim so the election no longer waits on them.
    pub fn force_override(&mut self, manager: ActorId) -> OverrideSummary {
        let mut summary = OverrideSummary::default();
        for (id, session) in self.sessions.iter_mut() {
            summary.sessions += 1;
            if session.winner == Some(manager) {
                session.winner = None;
                session.resolved_at_ms = None;
                session.candidates.clear();
                session.item_notice_sent = false;
                session.currency_notice_sent = false;
                session.override_fired = true;
                // Keep a forfeited candidacy so the re-election never waits
                // on the manager showing up again.
                session.candidates.insert(manager, Candidacy::forfeited());
                summary.reopened += 1;
                tracing::info!(
                    target: "gravemark::arbiter",
                    session = %id,
                    manager = %manager,
                    "override.reopened"
                );
            } else if session.winner.is_none() {
                let candidacy = session
                    .candidates
                    .entry(manager)
                    .or_insert_with(Candidacy::forfeited);
                candidacy.score = DiceScore::Forfeit;
                session.override_fired = true;
                summary.forfeited += 1;
            }
        }
        summary
    }

    /// Drop sessions past their TTL. Resolved sessions age from the moment
    /// the winner was recorded; never-resolved sessions from creation.
    pub fn reap_expired(
        &mut self,
        now_ms: u64,
        resolved_ttl_ms: u64,
        stale_ttl_ms: u64,
    ) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, session| {
            let keep = match session.resolved_at_ms {
                Some(resolved) => now_ms.saturating_sub(resolved) < resolved_ttl_ms,
                None => now_ms.saturating_sub(session.created_at_ms) < stale_ttl_ms,
            };
            if !keep {
                tracing::debug!(
                    target: "gravemark::arbiter",
                    session = %id,
                    resolved = session.resolved_at_ms.is_some(),
                    "session.reaped"
                );
            }
            keep
        });
        before - self.sessions.len()
    }
}

/// Winner = maximum effective score; ties go to the lowest actor id so
/// repeated elections over the same candidacies are stable.
fn elect_winner(candidates: &AHashMap<ActorId, Candidacy>) -> Option<ActorId> {
    let mut best: Option<(u32, ActorId)> = None;
    for (actor, candidacy) in candidates {
        let score = candidacy.score.effective().unwrap_or(0);
        let better = match best {
            None => true,
            Some((best_score, best_actor)) => {
                score > best_score || (score == best_score && *actor < best_actor)
            }
        };
        if better {
            best = Some((score, *actor));
        }
    }
    best.map(|(_, actor)| actor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{notice_channel, NoticeSink};
    use loot_proto::NoticeKind;

    const WINDOW_MS: u64 = 15_000;

    fn seeded_arbiter() -> LootArbiter {
        LootArbiter::new(&ArbiterConfig {
            rng_seed: 42,
            ..ArbiterConfig::default()
        })
    }

    fn corpse_request(actor: u64, session: u64, group: u32) -> AdmissionRequest {
        AdmissionRequest {
            actor: ActorId(actor),
            session: LootSessionId(session),
            kind: LootKind::CorpseKill,
            channel: LootChannel::Item,
            origin_name: Some("Rattlecage".to_string()),
            group_size: group,
            currency: 0,
        }
    }

    fn drain(sink: &NoticeSink) -> Vec<LootNotice> {
        let mut notices = Vec::new();
        while let Ok(notice) = sink.receiver.try_recv() {
            notices.push(notice);
        }
        notices
    }

    #[test]
    fn solo_corpse_request_is_admitted_immediately() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        let decision = arbiter.request_admission(&corpse_request(1, 10, 1), 0, &bus);
        assert_eq!(decision, AdmissionDecision::Admitted);
        let session = arbiter.session(LootSessionId(10)).expect("session exists");
        assert_eq!(session.winner(), Some(ActorId(1)));
        assert_eq!(session.phase(), ContestPhase::Resolved);
    }

    #[test]
    fn non_corpse_kinds_never_stay_open() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        let request = AdmissionRequest {
            kind: LootKind::GameObject,
            group_size: 5,
            ..corpse_request(3, 11, 5)
        };
        assert_eq!(
            arbiter.request_admission(&request, 0, &bus),
            AdmissionDecision::Admitted
        );
    }

    #[test]
    fn group_contest_defers_until_all_candidates_present() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        assert_eq!(
            arbiter.request_admission(&corpse_request(1, 20, 2), 0, &bus),
            AdmissionDecision::Deferred
        );
        // Second candidate fills the group; the contest resolves now.
        let second = arbiter.request_admission(&corpse_request(2, 20, 2), 500, &bus);
        let session = arbiter.session(LootSessionId(20)).expect("session exists");
        let winner = session.winner().expect("winner recorded");
        if winner == ActorId(2) {
            assert_eq!(second, AdmissionDecision::Admitted);
        } else {
            assert_eq!(second, AdmissionDecision::DeniedNotWinner);
        }
        let winner_score = session
            .candidate(winner)
            .and_then(|c| c.score.effective())
            .expect("winner scored");
        for loser in [ActorId(1), ActorId(2)] {
            if loser == winner {
                continue;
            }
            let loser_score = session
                .candidate(loser)
                .and_then(|c| c.score.effective())
                .expect("loser scored");
            assert!(winner_score >= loser_score);
        }
    }

    #[test]
    fn winner_is_exclusive_within_an_epoch() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        assert_eq!(
            arbiter.request_admission(&corpse_request(1, 30, 1), 0, &bus),
            AdmissionDecision::Admitted
        );
        assert_eq!(
            arbiter.request_admission(&corpse_request(2, 30, 1), 100, &bus),
            AdmissionDecision::DeniedNotWinner
        );
        assert_eq!(
            arbiter.request_admission(&corpse_request(1, 30, 1), 200, &bus),
            AdmissionDecision::Admitted
        );
    }

    #[test]
    fn scores_freeze_after_first_assignment() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        arbiter.request_admission(&corpse_request(1, 40, 3), 0, &bus);
        let first = arbiter
            .session(LootSessionId(40))
            .and_then(|s| s.candidate(ActorId(1)))
            .map(|c| (c.requests, c.score))
            .expect("candidacy exists");
        arbiter.request_admission(&corpse_request(1, 40, 3), 1_000, &bus);
        let second = arbiter
            .session(LootSessionId(40))
            .and_then(|s| s.candidate(ActorId(1)))
            .map(|c| (c.requests, c.score))
            .expect("candidacy exists");
        assert_eq!(first.0, 1);
        assert_eq!(second.0, 2);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn late_arrival_scores_zero_and_cannot_outrank_honest_candidate() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        assert_eq!(
            arbiter.request_admission(&corpse_request(1, 50, 3), 0, &bus),
            AdmissionDecision::Deferred
        );
        // Window expired: the latecomer draws, then forfeits to zero, and the
        // contest closes on this request.
        let late = arbiter.request_admission(&corpse_request(2, 50, 3), WINDOW_MS, &bus);
        assert_eq!(late, AdmissionDecision::DeniedNotWinner);
        let session = arbiter.session(LootSessionId(50)).expect("session exists");
        assert_eq!(session.winner(), Some(ActorId(1)));
        assert_eq!(
            session.candidate(ActorId(2)).map(|c| c.score),
            Some(DiceScore::Scored(0))
        );
        let honest = session
            .candidate(ActorId(1))
            .and_then(|c| c.score.effective())
            .expect("scored");
        assert!(honest >= 1);
    }

    #[test]
    fn window_expiry_resolves_on_wall_clock_not_candidate_count() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        assert_eq!(
            arbiter.request_admission(&corpse_request(1, 60, 2), 0, &bus),
            AdmissionDecision::Deferred
        );
        assert_eq!(
            arbiter.request_admission(&corpse_request(1, 60, 2), 500, &bus),
            AdmissionDecision::Deferred
        );
        let before = arbiter
            .session(LootSessionId(60))
            .and_then(|s| s.candidate(ActorId(1)))
            .map(|c| c.score)
            .expect("scored");
        // Nobody else ever shows up; the next request after the window closes
        // the contest with the frozen score intact.
        assert_eq!(
            arbiter.request_admission(&corpse_request(1, 60, 2), WINDOW_MS + 1, &bus),
            AdmissionDecision::Admitted
        );
        let session = arbiter.session(LootSessionId(60)).expect("session exists");
        assert_eq!(session.candidate(ActorId(1)).map(|c| c.score), Some(before));
        assert_eq!(session.candidate(ActorId(1)).map(|c| c.requests), Some(3));
    }

    #[test]
    fn override_reopens_won_sessions_and_forfeits_open_claims() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        // Session 70: manager wins outright.
        assert_eq!(
            arbiter.request_admission(&corpse_request(9, 70, 1), 0, &bus),
            AdmissionDecision::Admitted
        );
        // Session 71: still open, manager among the hopefuls.
        assert_eq!(
            arbiter.request_admission(&corpse_request(9, 71, 3), 0, &bus),
            AdmissionDecision::Deferred
        );

        let summary = arbiter.force_override(ActorId(9));
        assert_eq!(summary.reopened, 1);
        assert_eq!(summary.forfeited, 1);
        assert_eq!(summary.sessions, 2);

        let won = arbiter.session(LootSessionId(70)).expect("session exists");
        assert_eq!(won.winner(), None);
        assert!(won.override_fired());
        assert_eq!(won.candidate_count(), 1);
        assert_eq!(
            won.candidate(ActorId(9)).map(|c| c.score),
            Some(DiceScore::Forfeit)
        );

        let open = arbiter.session(LootSessionId(71)).expect("session exists");
        assert!(open.override_fired());
        assert_eq!(
            open.candidate(ActorId(9)).map(|c| c.score),
            Some(DiceScore::Forfeit)
        );
    }

    #[test]
    fn post_override_request_runs_a_fresh_election() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        arbiter.request_admission(&corpse_request(9, 80, 1), 0, &bus);
        arbiter.force_override(ActorId(9));
        // A loser from the previous epoch now wins against the forfeited
        // manager without waiting out the window.
        assert_eq!(
            arbiter.request_admission(&corpse_request(2, 80, 5), 100, &bus),
            AdmissionDecision::Admitted
        );
        let session = arbiter.session(LootSessionId(80)).expect("session exists");
        assert_eq!(session.winner(), Some(ActorId(2)));
    }

    #[test]
    fn result_notices_sent_once_per_channel() {
        let mut arbiter = seeded_arbiter();
        let (bus, sink) = notice_channel();
        arbiter.request_admission(&corpse_request(1, 90, 2), 0, &bus);
        arbiter.request_admission(&corpse_request(2, 90, 2), 100, &bus);
        let first_wave = drain(&sink);
        let outcome_count = first_wave
            .iter()
            .filter(|n| {
                matches!(
                    n.kind(),
                    NoticeKind::ContestWon | NoticeKind::ContestLost
                )
            })
            .count();
        assert_eq!(outcome_count, 2);

        // Retries stay silent on the item channel.
        arbiter.request_admission(&corpse_request(1, 90, 2), 200, &bus);
        arbiter.request_admission(&corpse_request(2, 90, 2), 300, &bus);
        assert!(drain(&sink)
            .iter()
            .all(|n| !matches!(n.kind(), NoticeKind::ContestWon | NoticeKind::ContestLost)));

        // The currency channel notifies independently.
        let money = AdmissionRequest {
            channel: LootChannel::Currency,
            currency: 12_345,
            ..corpse_request(2, 90, 2)
        };
        arbiter.request_admission(&money, 400, &bus);
        let money_wave = drain(&sink);
        assert_eq!(
            money_wave
                .iter()
                .filter(|n| matches!(n.kind(), NoticeKind::ContestWon | NoticeKind::ContestLost))
                .count(),
            2
        );
    }

    #[test]
    fn claim_notice_only_for_grouped_corpse_contests() {
        let mut arbiter = seeded_arbiter();
        let (bus, sink) = notice_channel();
        arbiter.request_admission(&corpse_request(1, 100, 1), 0, &bus);
        assert!(drain(&sink)
            .iter()
            .all(|n| !matches!(n.kind(), NoticeKind::Claim)));

        arbiter.request_admission(&corpse_request(2, 101, 4), 0, &bus);
        let notices = drain(&sink);
        assert!(notices.iter().any(|n| matches!(n.kind(), NoticeKind::Claim)));
    }

    #[test]
    fn sole_claim_broadcast_when_group_comes_up_short() {
        let mut arbiter = seeded_arbiter();
        let (bus, sink) = notice_channel();
        arbiter.request_admission(&corpse_request(1, 105, 3), 0, &bus);
        drain(&sink);
        // Window lapses with only one of three group members registered.
        arbiter.request_admission(&corpse_request(1, 105, 3), WINDOW_MS + 1, &bus);
        let notices = drain(&sink);
        let sole = notices
            .iter()
            .find(|n| matches!(n.kind(), NoticeKind::SoleClaim))
            .expect("sole claim broadcast");
        assert_eq!(sole.message(), "I win 'Rattlecage' unopposed!");
    }

    #[test]
    fn override_epochs_resolve_silently() {
        let mut arbiter = seeded_arbiter();
        let (bus, sink) = notice_channel();
        arbiter.request_admission(&corpse_request(9, 110, 1), 0, &bus);
        arbiter.force_override(ActorId(9));
        drain(&sink);
        arbiter.request_admission(&corpse_request(2, 110, 3), 100, &bus);
        assert!(drain(&sink).is_empty());
    }

    #[test]
    fn reaper_drops_resolved_and_stale_sessions() {
        let mut arbiter = seeded_arbiter();
        let (bus, _sink) = notice_channel();
        arbiter.request_admission(&corpse_request(1, 120, 1), 0, &bus);
        assert_eq!(
            arbiter.request_admission(&corpse_request(1, 121, 2), 0, &bus),
            AdmissionDecision::Deferred
        );
        assert_eq!(arbiter.reap_expired(1_000, 300_000, 3_600_000), 0);
        assert_eq!(arbiter.reap_expired(300_001, 300_000, 3_600_000), 1);
        assert_eq!(arbiter.session_count(), 1);
        assert_eq!(arbiter.reap_expired(3_600_001, 300_000, 3_600_000), 1);
        assert_eq!(arbiter.session_count(), 0);
    }

    #[test]
    fn election_tie_breaks_to_lowest_actor_id() {
        let mut candidates = AHashMap::new();
        candidates.insert(
            ActorId(5),
            Candidacy {
                requests: 1,
                score: DiceScore::Scored(700),
            },
        );
        candidates.insert(
            ActorId(3),
            Candidacy {
                requests: 1,
                score: DiceScore::Scored(700),
            },
        );
        candidates.insert(
            ActorId(8),
            Candidacy {
                requests: 1,
                score: DiceScore::Scored(200),
            },
        );
        assert_eq!(elect_winner(&candidates), Some(ActorId(3)));
    }

    #[test]
    fn forfeit_and_late_zero_share_election_value_but_stay_distinct() {
        assert_eq!(DiceScore::Forfeit.effective(), Some(0));
        assert_eq!(DiceScore::Scored(0).effective(), Some(0));
        assert_ne!(DiceScore::Forfeit, DiceScore::Scored(0));
        assert_eq!(DiceScore::Unscored.effective(), None);
    }
}
