//! Plain-text rendering of an analysis result.

use std::fmt::{self, Write};

use crate::models::{sort_by_position, AnalysisResult, MatchSummary, ParticipantStats};

/// Render the full report: summary, quality verdict, then per-match details.
pub fn render(result: &AnalysisResult, fallback_name: &str) -> String {
    let mut out = String::new();
    if result.matches.is_empty() {
        out.push_str("No matches found to analyze.\n");
        return out;
    }

    write_report(&mut out, result, fallback_name).ok();
    out
}

fn write_report(out: &mut String, result: &AnalysisResult, fallback_name: &str) -> fmt::Result {
    write_summary(out, result, fallback_name)?;
    writeln!(out, "Match Details:\n")?;
    for (i, m) in result.matches.iter().enumerate() {
        write_match(out, i + 1, m)?;
    }
    Ok(())
}

fn write_summary(out: &mut String, result: &AnalysisResult, fallback_name: &str) -> fmt::Result {
    let name = result.player_name().unwrap_or(fallback_name);
    let total = result.match_count();

    writeln!(out, "Analysis Results for {}\n", name)?;
    writeln!(out, "Analyzed {} recent matches\n", total)?;
    writeln!(
        out,
        "Win rate: {}/{} ({:.1}%)\n",
        result.wins,
        total,
        result.win_rate * 100.0
    )?;
    writeln!(out, "Your average KDA: {:.2}", result.mean_player_kda)?;
    writeln!(out, "Your overall KDA: {:.2}", result.player_kda)?;
    writeln!(out, "Your teammates' average KDA: {:.2}", result.avg_ally_kda)?;
    writeln!(out, "Enemy team average KDA: {:.2}\n", result.avg_enemy_kda)?;
    writeln!(out, "Team Quality Assessment:")?;
    writeln!(
        out,
        "{} - {} (Team performance ratio: {:.2})\n",
        result.quality.label(),
        result.quality.description(),
        result.team_quality
    )
}

fn write_match(out: &mut String, number: usize, m: &MatchSummary) -> fmt::Result {
    writeln!(
        out,
        "Match {}: {} - {} ({:.1} minutes)",
        number,
        m.game_type,
        m.result_label(),
        m.duration_minutes
    )?;
    writeln!(
        out,
        "   You: {} ({}) - {} (KDA: {:.2})",
        m.player.champion_name,
        m.player.role_label(),
        m.player.score_line(),
        m.player.kda()
    )?;

    writeln!(out, "   Your Team:")?;
    for ally in sort_by_position(m.allies()) {
        write_participant(out, ally)?;
    }

    writeln!(out, "   Enemy Team:")?;
    for enemy in sort_by_position(&m.enemy_team) {
        write_participant(out, enemy)?;
    }

    let lanes: Vec<String> = m
        .lane_matchups()
        .into_iter()
        .filter_map(|lane| match (lane.ally, lane.enemy) {
            (Some(a), Some(e)) => Some(format!(
                "{} {:.2} vs {:.2}",
                lane.role,
                a.kda(),
                e.kda()
            )),
            _ => None,
        })
        .collect();
    if !lanes.is_empty() {
        writeln!(out, "   Lanes: {}", lanes.join(", "))?;
    }

    writeln!(out)
}

fn write_participant(out: &mut String, p: &ParticipantStats) -> fmt::Result {
    writeln!(
        out,
        "   - {} ({}): {} (KDA: {:.2})",
        p.champion_name,
        p.role_label(),
        p.score_line(),
        p.kda()
    )
}
