use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bevy::prelude::Resource;
use crossbeam_channel::{unbounded, Receiver, Sender};

use loot_proto::{encode_notice_frame, LootChannel, NoticeFrame, NoticeKind};

use crate::arbiter::{ActorId, LootSessionId};

/// A currency amount broken into display denominations (10 000 copper to the
/// gold, 100 to the silver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinSplit {
    pub gold: u64,
    pub silver: u64,
    pub copper: u64,
}

impl CoinSplit {
    pub fn from_copper(total: u64) -> Self {
        Self {
            gold: total / 10_000,
            silver: total % 10_000 / 100,
            copper: total % 100,
        }
    }
}

/// One player-visible message produced by the arbiter. Sends are
/// fire-and-forget; delivery is never required for correctness.
#[derive(Debug, Clone, PartialEq)]
pub enum LootNotice {
    /// A fresh candidacy announcing itself to the party.
    Claim {
        actor: ActorId,
        session: LootSessionId,
        score: u32,
    },
    /// The winner flagging that not every group member showed up.
    SoleClaim {
        actor: ActorId,
        session: LootSessionId,
        origin: Option<String>,
    },
    ContestWon {
        actor: ActorId,
        session: LootSessionId,
        channel: LootChannel,
        score: u32,
        coins: Option<CoinSplit>,
    },
    ContestLost {
        actor: ActorId,
        session: LootSessionId,
        channel: LootChannel,
        score: u32,
    },
    /// Reply to the manager who ran the override command.
    OverrideDone {
        actor: ActorId,
        touched: u32,
        sessions: u32,
    },
}

impl LootNotice {
    pub fn kind(&self) -> NoticeKind {
        match self {
            LootNotice::Claim { .. } => NoticeKind::Claim,
            LootNotice::SoleClaim { .. } => NoticeKind::SoleClaim,
            LootNotice::ContestWon { .. } => NoticeKind::ContestWon,
            LootNotice::ContestLost { .. } => NoticeKind::ContestLost,
            LootNotice::OverrideDone { .. } => NoticeKind::OverrideDone,
        }
    }

    pub fn recipient(&self) -> ActorId {
        match self {
            LootNotice::Claim { actor, .. }
            | LootNotice::SoleClaim { actor, .. }
            | LootNotice::ContestWon { actor, .. }
            | LootNotice::ContestLost { actor, .. }
            | LootNotice::OverrideDone { actor, .. } => *actor,
        }
    }

    pub fn session(&self) -> Option<LootSessionId> {
        match self {
            LootNotice::Claim { session, .. }
            | LootNotice::SoleClaim { session, .. }
            | LootNotice::ContestWon { session, .. }
            | LootNotice::ContestLost { session, .. } => Some(*session),
            LootNotice::OverrideDone { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LootNotice::Claim { score, .. } => format!("Me! {score}"),
            LootNotice::SoleClaim { origin, .. } => {
                format!("I win '{}' unopposed!", origin.as_deref().unwrap_or("????"))
            }
            LootNotice::ContestWon {
                channel: LootChannel::Item,
                score,
                ..
            } => format!("You win the loot (score={score})"),
            LootNotice::ContestWon {
                channel: LootChannel::Currency,
                score,
                coins,
                ..
            } => match coins {
                Some(split) => format!(
                    "You win the coins {}g {}s {}c (score={score})",
                    split.gold, split.silver, split.copper
                ),
                None => format!("You win the coins (score={score})"),
            },
            LootNotice::ContestLost {
                channel: LootChannel::Item,
                score,
                ..
            } => format!("You lose the loot (score={score})"),
            LootNotice::ContestLost {
                channel: LootChannel::Currency,
                score,
                ..
            } => format!("You lose the coins (score={score})"),
            LootNotice::OverrideDone {
                touched, sessions, ..
            } => format!("Cleared {touched} of {sessions} tracked loot claims"),
        }
    }

    fn to_frame(&self, timestamp_ms: u64) -> NoticeFrame {
        NoticeFrame {
            timestamp_ms,
            actor: self.recipient().0,
            session: self.session().map(|id| id.0).unwrap_or(0),
            kind: self.kind(),
            message: self.message(),
        }
    }
}

/// Sender half of the notice channel, cloned into every arbiter call site.
#[derive(Resource, Clone)]
pub struct NoticeBus {
    sender: Sender<LootNotice>,
}

/// Receiver half, handed to the broadcast thread (or held by tests).
#[derive(Resource)]
pub struct NoticeSink {
    pub receiver: Receiver<LootNotice>,
}

pub fn notice_channel() -> (NoticeBus, NoticeSink) {
    let (sender, receiver) = unbounded();
    (NoticeBus { sender }, NoticeSink { receiver })
}

impl NoticeBus {
    pub fn publish(&self, notice: LootNotice) {
        tracing::debug!(
            target: "gravemark::notice",
            recipient = %notice.recipient(),
            kind = ?notice.kind(),
            message = %notice.message(),
            "notice.publish"
        );
        let _ = self.sender.send(notice);
    }
}

pub fn coarse_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Start the notice fan-out: accepts observer connections and broadcasts each
/// notice as a length-prefixed bincode frame, dropping clients that fail to
/// take the write.
pub fn start_notice_server(
    bind_addr: SocketAddr,
    sink: NoticeSink,
) -> Option<thread::JoinHandle<()>> {
    let listener = match TcpListener::bind(bind_addr) {
        Ok(listener) => listener,
        Err(err) => {
            log::warn!(
                "Notice server bind failed at {}: {}. Broadcasting disabled.",
                bind_addr,
                err
            );
            return None;
        }
    };

    if let Err(err) = listener.set_nonblocking(true) {
        log::warn!("set_nonblocking failed for notice listener: {}", err);
        return None;
    }

    let clients: Arc<Mutex<Vec<TcpStream>>> = Arc::new(Mutex::new(Vec::new()));
    Some(thread::spawn(move || {
        run_notice_stream(listener, clients, sink.receiver)
    }))
}

fn run_notice_stream(
    listener: TcpListener,
    clients: Arc<Mutex<Vec<TcpStream>>>,
    receiver: Receiver<LootNotice>,
) {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(err) = stream.set_nodelay(true) {
                    log::warn!("Failed to set TCP_NODELAY for notice client {}: {}", addr, err);
                }
                clients
                    .lock()
                    .expect("notice clients mutex poisoned")
                    .push(stream);
                log::info!("Notice client connected: {}", addr);
            }
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => {
                log::error!("Error accepting notice client: {}", err);
                thread::sleep(Duration::from_millis(200));
            }
        }

        while let Ok(notice) = receiver.try_recv() {
            let frame = notice.to_frame(coarse_now_ms());
            match encode_notice_frame(&frame) {
                Ok(bytes) => broadcast_payload(&clients, &bytes),
                Err(err) => log::error!("Failed to encode notice frame: {}", err),
            }
        }

        thread::sleep(Duration::from_millis(16));
    }
}

fn broadcast_payload(clients: &Arc<Mutex<Vec<TcpStream>>>, payload: &[u8]) {
    let mut guard = clients.lock().expect("notice clients mutex poisoned");
    guard.retain_mut(|stream| {
        let len = payload.len() as u32;
        let mut buffer = Vec::with_capacity(4 + payload.len());
        buffer.extend_from_slice(&len.to_le_bytes());
        buffer.extend_from_slice(payload);
        match stream.write_all(&buffer) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("Dropping notice client: {}", err);
                false
            }
        }
    });
}
