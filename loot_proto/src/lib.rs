//! Contract types shared between the Gravemark loot arbiter and the
//! collaborators that feed it: loot-kind classification, the console command
//! grammar, and the notice frames broadcast to connected observers.

mod command_text;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use command_text::{parse_command_line, CommandParseError, CommandPayload};

/// Classification of a loot session's source, derived by the caller from the
/// session's origin reference and its loot-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LootKind {
    CorpseKill,
    Skinning,
    GameObject,
    Item,
    Unknown,
}

impl LootKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LootKind::CorpseKill => "corpse_kill",
            LootKind::Skinning => "skinning",
            LootKind::GameObject => "game_object",
            LootKind::Item => "item",
            LootKind::Unknown => "unknown",
        }
    }
}

/// What the session's origin reference resolves to, as reported by the
/// object registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginClass {
    Creature,
    GameObject,
    Item,
    Unknown,
}

/// Loot-type tag carried by the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LootTypeTag {
    Corpse,
    Skinning,
    Other,
}

impl LootKind {
    /// Derive the kind from the origin class and the session's loot-type tag.
    ///
    /// Misclassified combinations (a creature origin with a non-corpse,
    /// non-skinning tag, or an unresolvable origin) map to [`LootKind::Unknown`];
    /// callers log those rather than rejecting the request.
    pub fn classify(origin: OriginClass, tag: LootTypeTag) -> LootKind {
        match (origin, tag) {
            (OriginClass::Creature, LootTypeTag::Skinning) => LootKind::Skinning,
            (OriginClass::Creature, LootTypeTag::Corpse) => LootKind::CorpseKill,
            (OriginClass::Creature, LootTypeTag::Other) => LootKind::Unknown,
            (OriginClass::GameObject, _) => LootKind::GameObject,
            (OriginClass::Item, _) => LootKind::Item,
            (OriginClass::Unknown, _) => LootKind::Unknown,
        }
    }
}

/// Which hand-out channel a take request targets. The arbiter tracks result
/// notices independently per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LootChannel {
    Item,
    Currency,
}

impl LootChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LootChannel::Item => "item",
            LootChannel::Currency => "currency",
        }
    }
}

/// Tag identifying a notice frame's variant on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Claim,
    SoleClaim,
    ContestWon,
    ContestLost,
    OverrideDone,
}

/// One notice as broadcast to connected observers: a recipient, the session
/// it concerns, and pre-rendered message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NoticeFrame {
    pub timestamp_ms: u64,
    pub actor: u64,
    pub session: u64,
    pub kind: NoticeKind,
    pub message: String,
}

/// Error produced when a notice frame fails to round-trip through bincode.
#[derive(Debug, Error)]
#[error("notice frame codec failed: {0}")]
pub struct NoticeCodecError(#[from] bincode::Error);

pub fn encode_notice_frame(frame: &NoticeFrame) -> Result<Vec<u8>, NoticeCodecError> {
    Ok(bincode::serialize(frame)?)
}

pub fn decode_notice_frame(bytes: &[u8]) -> Result<NoticeFrame, NoticeCodecError> {
    Ok(bincode::deserialize(bytes)?)
}

/// JSON rendering of a notice frame for text-oriented observers and logs.
pub fn notice_frame_json(frame: &NoticeFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_creature_corpse() {
        assert_eq!(
            LootKind::classify(OriginClass::Creature, LootTypeTag::Corpse),
            LootKind::CorpseKill
        );
        assert_eq!(
            LootKind::classify(OriginClass::Creature, LootTypeTag::Skinning),
            LootKind::Skinning
        );
    }

    #[test]
    fn classify_misfits_map_to_unknown() {
        assert_eq!(
            LootKind::classify(OriginClass::Creature, LootTypeTag::Other),
            LootKind::Unknown
        );
        assert_eq!(
            LootKind::classify(OriginClass::Unknown, LootTypeTag::Corpse),
            LootKind::Unknown
        );
    }

    #[test]
    fn classify_ignores_tag_for_non_creatures() {
        assert_eq!(
            LootKind::classify(OriginClass::GameObject, LootTypeTag::Skinning),
            LootKind::GameObject
        );
        assert_eq!(
            LootKind::classify(OriginClass::Item, LootTypeTag::Corpse),
            LootKind::Item
        );
    }

    #[test]
    fn notice_frame_json_uses_snake_case_kinds() {
        let frame = NoticeFrame {
            timestamp_ms: 0,
            actor: 1,
            session: 2,
            kind: NoticeKind::SoleClaim,
            message: "I win 'Rattlecage' unopposed!".to_string(),
        };
        let json = notice_frame_json(&frame).expect("serializes");
        assert!(json.contains("\"sole_claim\""));
    }

    #[test]
    fn notice_frame_round_trips() {
        let frame = NoticeFrame {
            timestamp_ms: 1_234,
            actor: 7,
            session: 99,
            kind: NoticeKind::ContestWon,
            message: "You win the loot (score=712)".to_string(),
        };
        let bytes = encode_notice_frame(&frame).expect("encode");
        let decoded = decode_notice_frame(&bytes).expect("decode");
        assert_eq!(decoded, frame);
    }
}
