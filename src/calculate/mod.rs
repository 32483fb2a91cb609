//! Statistics calculation engine.
//!
//! Computes derived metrics from analyzed matches:
//! - Per-participant KDA
//! - Player, ally and enemy averages
//! - Win rate and the team-quality ratio

use chrono::Utc;
use tracing::debug;

use crate::models::{AnalysisResult, MatchSummary, TeamQuality};

/// Calculate KDA as (kills + assists) / max(1, deaths).
pub fn kda(kills: u32, deaths: u32, assists: u32) -> f64 {
    (kills + assists) as f64 / deaths.max(1) as f64
}

/// Calculate win rate from wins and total matches.
pub fn calculate_win_rate(wins: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64
    }
}

/// Arithmetic mean; 0 for an empty collection.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Ratio of ally to enemy average KDA, 0 when the enemy average is 0.
pub fn calculate_team_quality(avg_ally_kda: f64, avg_enemy_kda: f64) -> f64 {
    if avg_enemy_kda > 0.0 {
        avg_ally_kda / avg_enemy_kda
    } else {
        0.0
    }
}

/// Aggregate a sequence of matches into an [`AnalysisResult`].
///
/// Match order is preserved in the result.
pub fn aggregate(matches: Vec<MatchSummary>) -> AnalysisResult {
    let total = matches.len() as u32;
    let wins = matches.iter().filter(|m| m.win).count() as u32;

    let (mut kills, mut deaths, mut assists) = (0u32, 0u32, 0u32);
    let mut player_kdas = Vec::with_capacity(matches.len());
    let mut ally_kdas = Vec::new();
    let mut enemy_kdas = Vec::new();

    for m in &matches {
        kills += m.player.kills;
        deaths += m.player.deaths;
        assists += m.player.assists;
        player_kdas.push(m.player.kda());

        ally_kdas.extend(m.allies().map(|p| p.kda()));
        enemy_kdas.extend(m.enemy_team.iter().map(|p| p.kda()));
    }

    let avg_ally_kda = mean(&ally_kdas);
    let avg_enemy_kda = mean(&enemy_kdas);
    let team_quality = calculate_team_quality(avg_ally_kda, avg_enemy_kda);

    debug!(
        "Aggregated {} matches: {} ally samples, {} enemy samples",
        total,
        ally_kdas.len(),
        enemy_kdas.len()
    );

    AnalysisResult {
        matches,
        wins,
        win_rate: calculate_win_rate(wins, total),
        player_kda: kda(kills, deaths, assists),
        mean_player_kda: mean(&player_kdas),
        avg_ally_kda,
        avg_enemy_kda,
        team_quality,
        quality: TeamQuality::from_ratio(team_quality),
        computed_at: Utc::now(),
    }
}
