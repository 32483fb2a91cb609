//! Turn raw match payloads into [`MatchSummary`] values.

use tracing::{debug, warn};

use super::dto::{MatchDto, ParticipantDto};
use crate::models::{
    is_analyzable, queue_label, MatchSummary, ParticipantStats, PositionMap, Role, BLUE_TEAM,
    RED_TEAM,
};

impl From<ParticipantDto> for ParticipantStats {
    fn from(dto: ParticipantDto) -> Self {
        let display_name = [dto.riot_id_game_name, dto.summoner_name]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty());

        Self {
            player_id: dto.puuid,
            display_name,
            champion_name: dto.champion_name,
            kills: dto.kills,
            deaths: dto.deaths,
            assists: dto.assists,
            team_id: dto.team_id,
            role: Role::from_position(&dto.team_position),
            total_damage_dealt_to_champions: dto.total_damage_dealt_to_champions,
            win: dto.win,
        }
    }
}

/// Build a summary of `payload` from `player_id`'s point of view.
///
/// Returns `None` when the match is off the standard map, in an excluded
/// queue, or does not list the player on either side.
pub fn summarize_match(payload: MatchDto, player_id: &str) -> Option<MatchSummary> {
    let MatchDto { metadata, info } = payload;

    if !is_analyzable(info.map_id, info.queue_id) {
        debug!(
            "Skipping {}: map {} queue {}",
            metadata.match_id, info.map_id, info.queue_id
        );
        return None;
    }

    let participants: Vec<ParticipantStats> =
        info.participants.into_iter().map(Into::into).collect();

    let (blue, red): (Vec<_>, Vec<_>) = participants
        .into_iter()
        .filter(|p| p.team_id == BLUE_TEAM || p.team_id == RED_TEAM)
        .partition(|p| p.team_id == BLUE_TEAM);

    let on_team = |team: &[ParticipantStats]| team.iter().any(|p| p.player_id == player_id);
    let (allied_team, enemy_team) = if on_team(&blue) {
        (blue, red)
    } else if on_team(&red) {
        (red, blue)
    } else {
        warn!(
            "Player not found among participants of {}, skipping",
            metadata.match_id
        );
        return None;
    };

    let player = allied_team
        .iter()
        .find(|p| p.player_id == player_id)
        .cloned()?;

    Some(MatchSummary {
        duration_minutes: info.game_duration as f64 / 60.0,
        win: player.win,
        game_type: queue_label(info.queue_id).to_string(),
        queue_id: info.queue_id,
        game_mode: info.game_mode,
        game_version: info.game_version,
        allied_by_position: PositionMap::from_team(&allied_team),
        enemy_by_position: PositionMap::from_team(&enemy_team),
        match_id: metadata.match_id,
        player,
        allied_team,
        enemy_team,
    })
}
