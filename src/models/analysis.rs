//! Aggregated analysis output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MatchSummary;

/// Qualitative verdict on the analyzed player's teammates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamQuality {
    Amazing,
    Good,
    Average,
    BelowAverage,
    Bad,
}

impl TeamQuality {
    /// Classify a team-quality ratio. Lower bounds are inclusive.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 1.3 {
            TeamQuality::Amazing
        } else if ratio >= 1.1 {
            TeamQuality::Good
        } else if ratio >= 0.9 {
            TeamQuality::Average
        } else if ratio >= 0.7 {
            TeamQuality::BelowAverage
        } else {
            TeamQuality::Bad
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TeamQuality::Amazing => "AMAZING",
            TeamQuality::Good => "GOOD",
            TeamQuality::Average => "AVERAGE",
            TeamQuality::BelowAverage => "BELOW AVERAGE",
            TeamQuality::Bad => "BAD",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TeamQuality::Amazing => "You have exceptional teammates!",
            TeamQuality::Good => "Your teammates are performing well",
            TeamQuality::Average => "Your teammates are on par with enemies",
            TeamQuality::BelowAverage => "Your teammates are struggling a bit",
            TeamQuality::Bad => "Your teammates are significantly underperforming",
        }
    }
}

impl std::fmt::Display for TeamQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Analyzed matches, most recent first
    pub matches: Vec<MatchSummary>,

    pub wins: u32,

    /// Fraction of matches won (0.0 to 1.0)
    pub win_rate: f64,

    /// Combined KDA from the player's summed kills, deaths and assists
    pub player_kda: f64,

    /// Mean of the player's per-match KDA values
    pub mean_player_kda: f64,

    /// Mean KDA over every allied participant except the player
    pub avg_ally_kda: f64,

    /// Mean KDA over every enemy participant
    pub avg_enemy_kda: f64,

    /// avg_ally_kda / avg_enemy_kda, 0 when the enemy average is 0
    pub team_quality: f64,

    pub quality: TeamQuality,

    /// When the aggregate was computed
    pub computed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Display name of the analyzed player, taken from the most recent match.
    pub fn player_name(&self) -> Option<&str> {
        self.matches
            .first()
            .and_then(|m| m.player.display_name.as_deref())
    }
}
