//! Normalized view of one analyzed match.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ParticipantStats, Role};

/// Map id of the standard 5v5 map.
pub const SUMMONERS_RIFT_MAP_ID: u32 = 11;

/// Queues excluded from analysis (ARAM and the team-tactics modes).
pub const EXCLUDED_QUEUE_IDS: [u32; 7] = [450, 1090, 1100, 1110, 1130, 1150, 1200];

/// Label used for queue ids missing from the label table.
pub const GENERIC_QUEUE_LABEL: &str = "Summoner's Rift";

/// Display labels for the queues that can appear on the standard map.
const QUEUE_LABELS: &[(u32, &str)] = &[
    (0, "Custom Game"),
    (400, "Normal Draft"),
    (420, "Ranked Solo/Duo"),
    (430, "Normal Blind"),
    (440, "Ranked Flex"),
    (480, "Swiftplay"),
    (490, "Quickplay"),
    (700, "Clash"),
    (720, "ARAM Clash"),
    (830, "Co-op vs AI Intro"),
    (840, "Co-op vs AI Beginner"),
    (850, "Co-op vs AI Intermediate"),
    (870, "Co-op vs AI Intro"),
    (880, "Co-op vs AI Beginner"),
    (890, "Co-op vs AI Intermediate"),
];

/// Display label for a queue id, falling back to [`GENERIC_QUEUE_LABEL`].
pub fn queue_label(queue_id: u32) -> &'static str {
    QUEUE_LABELS
        .iter()
        .find(|(id, _)| *id == queue_id)
        .map(|(_, label)| *label)
        .unwrap_or(GENERIC_QUEUE_LABEL)
}

/// Whether a match with this map and queue is eligible for analysis.
pub fn is_analyzable(map_id: u32, queue_id: u32) -> bool {
    map_id == SUMMONERS_RIFT_MAP_ID && !EXCLUDED_QUEUE_IDS.contains(&queue_id)
}

/// Role lookup for one team, at most one participant per role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionMap(BTreeMap<Role, ParticipantStats>);

impl PositionMap {
    /// Index a team by role.
    ///
    /// The first participant holding a role wins the slot; later holders of the
    /// same role are left out of the map.
    pub fn from_team(team: &[ParticipantStats]) -> Self {
        let mut slots = BTreeMap::new();
        for role in Role::ALL {
            if let Some(p) = team.iter().find(|p| p.role == Some(role)) {
                slots.insert(role, p.clone());
            }
        }
        Self(slots)
    }

    pub fn get(&self, role: Role) -> Option<&ParticipantStats> {
        self.0.get(&role)
    }

    /// Number of filled role slots.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Filled slots in canonical role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &ParticipantStats)> {
        self.0.iter().map(|(role, p)| (*role, p))
    }
}

/// Allied and enemy occupants of one canonical role.
#[derive(Debug, Clone, Copy)]
pub struct LaneMatchup<'a> {
    pub role: Role,
    pub ally: Option<&'a ParticipantStats>,
    pub enemy: Option<&'a ParticipantStats>,
}

/// One analyzed match, as seen from the analyzed player's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: String,

    /// Game length in minutes
    pub duration_minutes: f64,

    /// Whether the analyzed player's team won
    pub win: bool,

    /// Display label derived from the queue id
    pub game_type: String,

    pub queue_id: u32,

    /// Upstream game mode string (e.g. "CLASSIC")
    pub game_mode: String,

    pub game_version: String,

    /// The analyzed player's own stats
    pub player: ParticipantStats,

    /// The analyzed player's team, player included
    pub allied_team: Vec<ParticipantStats>,

    pub enemy_team: Vec<ParticipantStats>,

    pub allied_by_position: PositionMap,

    pub enemy_by_position: PositionMap,
}

impl MatchSummary {
    /// Allied participants other than the analyzed player.
    pub fn allies(&self) -> impl Iterator<Item = &ParticipantStats> {
        self.allied_team
            .iter()
            .filter(move |p| p.player_id != self.player.player_id)
    }

    /// Role-by-role pairing of the two position maps.
    pub fn lane_matchups(&self) -> Vec<LaneMatchup<'_>> {
        Role::ALL
            .into_iter()
            .map(|role| LaneMatchup {
                role,
                ally: self.allied_by_position.get(role),
                enemy: self.enemy_by_position.get(role),
            })
            .collect()
    }

    pub fn result_label(&self) -> &'static str {
        if self.win {
            "Victory"
        } else {
            "Defeat"
        }
    }
}
