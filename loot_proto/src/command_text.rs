use std::num::ParseIntError;

use thiserror::Error;

use crate::{LootChannel, LootKind};

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid integer '{value}' for {context}: {source}")]
    InvalidInteger {
        value: String,
        context: &'static str,
        source: ParseIntError,
    },
}

/// Decoded console command for the loot arbiter server.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
    Take {
        actor: u64,
        session: u64,
        kind: LootKind,
        channel: LootChannel,
        group: u32,
        currency: u64,
        origin: Option<String>,
    },
    Okwin {
        actor: u64,
    },
    /// Run one maintenance cycle (session reaping) without any take traffic.
    Tick,
    Status,
}

/// Parse one console line into a command payload.
///
/// Unrecognised loot-kind tokens map to [`LootKind::Unknown`] rather than an
/// error; the server logs them and lets the contest close immediately.
pub fn parse_command_line(input: &str) -> Result<CommandPayload, CommandParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandParseError::Empty);
    }

    let mut parts = trimmed.split_whitespace();
    let verb = parts
        .next()
        .map(|v| v.to_ascii_lowercase())
        .ok_or(CommandParseError::Empty)?;

    match verb.as_str() {
        "take" => {
            let actor_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("actor"))?;
            let session_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("session"))?;
            let actor = parse_u64(actor_str, "take actor")?;
            let session = parse_u64(session_str, "take session")?;
            let kind = parse_loot_kind(parts.next().unwrap_or("corpse"));
            let group = parse_u32(parts.next().unwrap_or("1"), "take group")?;
            let origin = parts.next().map(|name| name.to_string());
            Ok(CommandPayload::Take {
                actor,
                session,
                kind,
                channel: LootChannel::Item,
                group,
                currency: 0,
                origin,
            })
        }
        "money" => {
            let actor_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("actor"))?;
            let session_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("session"))?;
            let actor = parse_u64(actor_str, "money actor")?;
            let session = parse_u64(session_str, "money session")?;
            let currency = parse_u64(parts.next().unwrap_or("0"), "money amount")?;
            let kind = parse_loot_kind(parts.next().unwrap_or("corpse"));
            let group = parse_u32(parts.next().unwrap_or("1"), "money group")?;
            let origin = parts.next().map(|name| name.to_string());
            Ok(CommandPayload::Take {
                actor,
                session,
                kind,
                channel: LootChannel::Currency,
                group,
                currency,
                origin,
            })
        }
        "okwin" => {
            let actor_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("actor"))?;
            let actor = parse_u64(actor_str, "okwin actor")?;
            Ok(CommandPayload::Okwin { actor })
        }
        "tick" => Ok(CommandPayload::Tick),
        "status" => Ok(CommandPayload::Status),
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_loot_kind(token: &str) -> LootKind {
    match token.to_ascii_lowercase().as_str() {
        "corpse" | "kill" | "corpse_kill" => LootKind::CorpseKill,
        "skin" | "skinning" => LootKind::Skinning,
        "object" | "gameobject" | "game_object" | "go" => LootKind::GameObject,
        "item" | "disenchant" => LootKind::Item,
        _ => LootKind::Unknown,
    }
}

fn parse_u32(value: &str, context: &'static str) -> Result<u32, CommandParseError> {
    value
        .parse::<u32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_u64(value: &str, context: &'static str) -> Result<u64, CommandParseError> {
    value
        .parse::<u64>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}
