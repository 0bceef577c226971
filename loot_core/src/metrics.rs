use bevy::prelude::{Res, ResMut, Resource};

use crate::arbiter::LootArbiter;

#[derive(Resource, Default, Debug, Clone)]
pub struct ArbiterMetrics {
    pub requests_total: u64,
    pub admissions_total: u64,
    pub deferrals_total: u64,
    pub denials_total: u64,
    pub contests_resolved_total: u64,
    pub overrides_total: u64,
    pub sessions_reaped_total: u64,
    pub sessions_open: usize,
    pub sessions_resolved: usize,
}

pub fn collect_metrics(arbiter: Res<LootArbiter>, mut metrics: ResMut<ArbiterMetrics>) {
    metrics.sessions_open = arbiter.open_session_count();
    metrics.sessions_resolved = arbiter.resolved_session_count();
    metrics.contests_resolved_total = arbiter.contests_resolved_total();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::{ActorId, AdmissionRequest, LootArbiter, LootSessionId};
    use crate::config::ArbiterConfig;
    use crate::notice::notice_channel;
    use bevy::prelude::World;
    use bevy_ecs::system::RunSystemOnce;
    use loot_proto::{LootChannel, LootKind};

    #[test]
    fn collect_refreshes_session_gauges() {
        let mut arbiter = LootArbiter::new(&ArbiterConfig {
            rng_seed: 3,
            ..ArbiterConfig::default()
        });
        let (bus, _sink) = notice_channel();
        // One resolved solo contest, one still waiting on its group.
        arbiter.request_admission(
            &AdmissionRequest {
                actor: ActorId(1),
                session: LootSessionId(1),
                kind: LootKind::CorpseKill,
                channel: LootChannel::Item,
                origin_name: None,
                group_size: 1,
                currency: 0,
            },
            0,
            &bus,
        );
        arbiter.request_admission(
            &AdmissionRequest {
                actor: ActorId(2),
                session: LootSessionId(2),
                kind: LootKind::CorpseKill,
                channel: LootChannel::Item,
                origin_name: None,
                group_size: 3,
                currency: 0,
            },
            0,
            &bus,
        );

        let mut world = World::default();
        world.insert_resource(arbiter);
        world.insert_resource(ArbiterMetrics::default());
        world.run_system_once(collect_metrics);

        let metrics = world.resource::<ArbiterMetrics>();
        assert_eq!(metrics.sessions_resolved, 1);
        assert_eq!(metrics.sessions_open, 1);
        assert_eq!(metrics.contests_resolved_total, 1);
    }
}
