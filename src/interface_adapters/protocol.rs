// Wire protocol DTOs and conversions for public arena messages.

use crate::domain::scoreboard::RankEntry;
use crate::domain::state::{Buttons, EntitySnapshot, PlayerInput, SnapshotPayload};
use crate::use_cases::{ServerState, WorldUpdate};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection.
    Identity { player_id: u64 },
    // Snapshot of the world for a given tick.
    WorldUpdate(WorldUpdateDto),
    // High-level server state transitions (lobby, match start).
    GameState(ServerStateDto),
    // Latency probe; the client echoes the nonce in a Pong.
    Ping { nonce: u64 },
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Asks for a ship; sent once after Identity.
    Join(JoinPayload),
    // Per-tick intent sent after a successful Join.
    Input(PlayerInputDto),
    Pong { nonce: u64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInputDto {
    #[serde(default)]
    pub horizontal: f32,
    #[serde(default)]
    pub vertical: f32,
    #[serde(default)]
    pub fire: bool,
}

impl From<PlayerInputDto> for PlayerInput {
    fn from(input: PlayerInputDto) -> Self {
        Self {
            horizontal: input.horizontal,
            vertical: input.vertical,
            buttons: if input.fire { Buttons::FIRE } else { Buttons::NONE },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub entities: Vec<EntityStateDto>,
    pub scoreboard: Vec<RankDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            entities: update.entities.iter().map(EntityStateDto::from).collect(),
            scoreboard: update.scoreboard.iter().map(RankDto::from).collect(),
        }
    }
}

/// Flattened entity state; `kind` selects which optional fields are present.
#[derive(Debug, Clone, Serialize)]
pub struct EntityStateDto {
    pub id: u64,
    pub alive: bool,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,
    #[serde(flatten)]
    pub kind: EntityKindDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKindDto {
    Player {
        display_name: String,
        score: u32,
        scale: f32,
    },
    Projectile {
        heading_x: f32,
        heading_y: f32,
    },
    Hazard {
        radius: f32,
    },
}

impl From<&EntitySnapshot> for EntityStateDto {
    fn from(entity: &EntitySnapshot) -> Self {
        let kind = match &entity.payload {
            SnapshotPayload::Player {
                display_name,
                score,
                scale,
            } => EntityKindDto::Player {
                display_name: display_name.clone(),
                score: *score,
                scale: *scale,
            },
            SnapshotPayload::Projectile { heading } => EntityKindDto::Projectile {
                heading_x: heading.x,
                heading_y: heading.y,
            },
            SnapshotPayload::Hazard { radius } => EntityKindDto::Hazard { radius: *radius },
        };

        Self {
            id: entity.id.0,
            alive: entity.alive,
            x: entity.position.x,
            y: entity.position.y,
            owner_id: entity.owner.map(|a| a.0),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankDto {
    pub player_id: u64,
    pub display_name: String,
    pub score: u32,
}

impl From<&RankEntry> for RankDto {
    fn from(entry: &RankEntry) -> Self {
        Self {
            player_id: entry.authority.0,
            display_name: entry.display_name.clone(),
            score: entry.score,
        }
    }
}

/// Server lifecycle state sent to clients for UI flow.
#[derive(Debug, Clone, Serialize)]
pub enum ServerStateDto {
    Lobby,
    MatchStarting { in_seconds: u32 },
    MatchRunning,
}

impl From<ServerState> for ServerStateDto {
    fn from(state: ServerState) -> Self {
        match state {
            ServerState::Lobby => ServerStateDto::Lobby,
            ServerState::MatchStarting { in_seconds } => {
                ServerStateDto::MatchStarting { in_seconds }
            }
            ServerState::MatchRunning => ServerStateDto::MatchRunning,
        }
    }
}
