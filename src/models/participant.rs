//! Per-participant match statistics.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::calculate::kda;

/// Team id of the blue side.
pub const BLUE_TEAM: u16 = 100;

/// Team id of the red side.
pub const RED_TEAM: u16 = 200;

/// Canonical lane assignment.
///
/// Declaration order is the canonical position order used for sorting and
/// for iterating position maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jungle,
    Middle,
    Bottom,
    Utility,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Top,
        Role::Jungle,
        Role::Middle,
        Role::Bottom,
        Role::Utility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Top => "TOP",
            Role::Jungle => "JUNGLE",
            Role::Middle => "MIDDLE",
            Role::Bottom => "BOTTOM",
            Role::Utility => "UTILITY",
        }
    }

    /// Parse an upstream `teamPosition` value; blank or unrecognised yields `None`.
    pub fn from_position(position: &str) -> Option<Self> {
        position.parse().ok()
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stats of one participant, taken verbatim from a match payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantStats {
    /// Stable player identifier
    pub player_id: String,

    /// In-game name (Riot ID game name, or legacy summoner name)
    pub display_name: Option<String>,

    pub champion_name: String,

    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,

    /// 100 or 200
    pub team_id: u16,

    /// Assigned lane, absent when upstream left it blank
    pub role: Option<Role>,

    pub total_damage_dealt_to_champions: u64,

    pub win: bool,
}

impl ParticipantStats {
    /// Kill/death/assist ratio with deaths floored at one.
    pub fn kda(&self) -> f64 {
        kda(self.kills, self.deaths, self.assists)
    }

    /// Role label for display; "Unknown" when absent.
    pub fn role_label(&self) -> &'static str {
        self.role.map(|r| r.as_str()).unwrap_or("Unknown")
    }

    /// `kills/deaths/assists` score line.
    pub fn score_line(&self) -> String {
        format!("{}/{}/{}", self.kills, self.deaths, self.assists)
    }
}

/// Sort participants into canonical position order, unknown roles last.
///
/// The sort is stable, so participants sharing a role keep their payload order.
pub fn sort_by_position<'a, I>(players: I) -> Vec<&'a ParticipantStats>
where
    I: IntoIterator<Item = &'a ParticipantStats>,
{
    let mut sorted: Vec<&ParticipantStats> = players.into_iter().collect();
    sorted.sort_by_key(|p| p.role.map(|r| r as u8).unwrap_or(u8::MAX));
    sorted
}

#[cfg(test)]
pub(crate) fn participant(
    player_id: &str,
    team_id: u16,
    role: Option<Role>,
    (kills, deaths, assists): (u32, u32, u32),
) -> ParticipantStats {
    ParticipantStats {
        player_id: player_id.to_string(),
        display_name: Some(format!("{}-name", player_id)),
        champion_name: format!("{}-champ", player_id),
        kills,
        deaths,
        assists,
        team_id,
        role,
        total_damage_dealt_to_champions: 10_000,
        win: team_id == BLUE_TEAM,
    }
}
