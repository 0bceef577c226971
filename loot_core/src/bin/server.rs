use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{info, warn};

use loot_core::notice::coarse_now_ms;
use loot_core::{
    build_headless_app, run_cycle, ActorId, AdmissionRequest, ArbiterConfig, ArbiterMetrics,
    GrantLog, LootSessionId, NoticeSink, OverrideLog, OverrideQueue, ServerClock,
    TakeRequestQueue,
};
use loot_proto::{parse_command_line, CommandPayload};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut app = build_headless_app();
    let config = app.world.resource::<ArbiterConfig>().clone();

    let sink = app
        .world
        .remove_resource::<NoticeSink>()
        .expect("notice sink present at startup");
    let _notice_server = loot_core::start_notice_server(config.notice_bind, sink);
    let command_rx = spawn_command_listener(config.command_bind);

    info!(
        command_bind = %config.command_bind,
        notice_bind = %config.notice_bind,
        "Gravemark loot arbiter ready"
    );

    while let Ok(command) = command_rx.recv() {
        let now_ms = coarse_now_ms();
        app.world.resource_mut::<ServerClock>().0 = now_ms;
        match command {
            CommandPayload::Take {
                actor,
                session,
                kind,
                channel,
                group,
                currency,
                origin,
            } => {
                let request = AdmissionRequest {
                    actor: ActorId(actor),
                    session: LootSessionId(session),
                    kind,
                    channel,
                    origin_name: origin,
                    group_size: group.max(1),
                    currency,
                };
                app.world
                    .resource_mut::<TakeRequestQueue>()
                    .push(request, now_ms);
                run_cycle(&mut app);
                report_cycle(&mut app);
            }
            CommandPayload::Okwin { actor } => {
                app.world
                    .resource_mut::<OverrideQueue>()
                    .push(ActorId(actor));
                run_cycle(&mut app);
                report_cycle(&mut app);
            }
            CommandPayload::Tick => {
                run_cycle(&mut app);
                report_cycle(&mut app);
            }
            CommandPayload::Status => {
                let metrics = app.world.resource::<ArbiterMetrics>();
                info!(
                    target: "gravemark::server",
                    requests = metrics.requests_total,
                    admissions = metrics.admissions_total,
                    deferrals = metrics.deferrals_total,
                    denials = metrics.denials_total,
                    overrides = metrics.overrides_total,
                    open = metrics.sessions_open,
                    resolved = metrics.sessions_resolved,
                    reaped = metrics.sessions_reaped_total,
                    "status"
                );
            }
        }
    }
}

/// Log the batch's grants and receipts; the inventory collaborator picks the
/// grants up from here.
fn report_cycle(app: &mut bevy::prelude::App) {
    let (grants, receipts) = {
        let mut log = app.world.resource_mut::<GrantLog>();
        (log.drain_grants(), log.drain_receipts())
    };
    for grant in &grants {
        info!(
            target: "gravemark::server",
            actor = %grant.actor,
            session = %grant.session,
            channel = grant.channel.as_str(),
            currency = grant.currency,
            "transfer.granted"
        );
    }
    for receipt in &receipts {
        info!(
            target: "gravemark::server",
            actor = %receipt.actor,
            session = %receipt.session,
            channel = receipt.channel.as_str(),
            decision = ?receipt.decision,
            "take.acknowledged"
        );
    }
    for report in app.world.resource_mut::<OverrideLog>().drain() {
        info!(
            target: "gravemark::server",
            manager = %report.manager,
            touched = report.summary.touched(),
            sessions = report.summary.sessions,
            "override.reported"
        );
    }
}

fn spawn_command_listener(bind_addr: std::net::SocketAddr) -> Receiver<CommandPayload> {
    let listener = TcpListener::bind(bind_addr).expect("command listener bind failed");
    listener
        .set_nonblocking(true)
        .expect("set_nonblocking failed");

    let (sender, receiver) = unbounded::<CommandPayload>();
    thread::spawn(move || loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!("Command client connected: {}", addr);
                let sender = sender.clone();
                thread::spawn(move || handle_client(stream, sender));
            }
            Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(std::time::Duration::from_millis(50));
            }
            Err(err) => {
                warn!("Error accepting command client: {}", err);
                thread::sleep(std::time::Duration::from_millis(200));
            }
        }
    });

    receiver
}

fn handle_client(stream: std::net::TcpStream, sender: Sender<CommandPayload>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_command_line(trimmed) {
                    Ok(cmd) => {
                        if sender.send(cmd).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("Invalid command '{}': {}", trimmed, err),
                }
            }
            Err(err) => {
                warn!("Command read error: {}", err);
                break;
            }
        }
    }
}
