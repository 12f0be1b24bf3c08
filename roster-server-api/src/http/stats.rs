use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use roster_server_domain::{
    PlayerId, PlayerStatId, TournamentId,
    stat::{
        BatterLineupEntry, BatterStatLine, BulkStatsUpdate, BulkUpdateOutcome, LineupView,
        PitcherLineupEntry, PitcherStatLine, PlayerStat, SingleStatUpdate, TeamStatistics,
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    app::ApiError,
    http::{AppState, parse_body},
};

#[derive(Deserialize, Validate)]
pub struct BulkUpdateRequest {
    #[validate(nested)]
    batters: Vec<BatterEntry>,
    #[validate(nested)]
    pitchers: Vec<PitcherEntry>,
}

/// Counting stats are unsigned at the type level, so negative values are
/// rejected during deserialization.
#[derive(Deserialize, Validate)]
pub struct BatterEntry {
    id: PlayerId,
    #[validate(range(min = 1, max = 9))]
    order: Option<u32>,
    at_bats: u32,
    hits: u32,
    home_runs: u32,
    doubles: u32,
    triples: u32,
    rbi: u32,
}

#[derive(Deserialize, Validate)]
pub struct PitcherEntry {
    id: PlayerId,
    #[validate(range(min = 1, max = 12))]
    order: Option<u32>,
    wins: u32,
    losses: u32,
    saves: u32,
}

impl BulkUpdateRequest {
    fn into_update(self) -> BulkStatsUpdate {
        BulkStatsUpdate {
            batters: self
                .batters
                .into_iter()
                .map(|b| BatterStatLine {
                    player_id: b.id,
                    order: b.order,
                    at_bats: b.at_bats,
                    hits: b.hits,
                    doubles: b.doubles,
                    triples: b.triples,
                    home_runs: b.home_runs,
                    rbi: b.rbi,
                })
                .collect(),
            pitchers: self
                .pitchers
                .into_iter()
                .map(|p| PitcherStatLine {
                    player_id: p.id,
                    order: p.order,
                    wins: p.wins,
                    losses: p.losses,
                    saves: p.saves,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct UpdatedBatterResponse {
    pub player_id: PlayerId,
    pub stats_id: PlayerStatId,
    pub at_bats: u32,
    pub hits: u32,
}

#[derive(Serialize)]
pub struct UpdatedPitcherResponse {
    pub player_id: PlayerId,
    pub stats_id: PlayerStatId,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
}

#[derive(Serialize)]
pub struct BulkUpdateResponse {
    pub message: String,
    pub tournament_id: TournamentId,
    pub updated_batters: Vec<UpdatedBatterResponse>,
    pub updated_pitchers: Vec<UpdatedPitcherResponse>,
    pub updated_at: DateTime<Utc>,
}

impl From<BulkUpdateOutcome> for BulkUpdateResponse {
    fn from(outcome: BulkUpdateOutcome) -> Self {
        BulkUpdateResponse {
            message: "選手成績を一括更新しました".to_string(),
            tournament_id: outcome.tournament_id,
            updated_batters: outcome
                .updated_batters
                .into_iter()
                .map(|b| UpdatedBatterResponse {
                    player_id: b.player_id,
                    stats_id: b.stats_id,
                    at_bats: b.at_bats,
                    hits: b.hits,
                })
                .collect(),
            updated_pitchers: outcome
                .updated_pitchers
                .into_iter()
                .map(|p| UpdatedPitcherResponse {
                    player_id: p.player_id,
                    stats_id: p.stats_id,
                    wins: p.wins,
                    losses: p.losses,
                    saves: p.saves,
                })
                .collect(),
            updated_at: outcome.updated_at,
        }
    }
}

/// Wire shape of a stat row. Synthesized defaults have no id or timestamps,
/// and those keys are omitted rather than sent as null.
#[derive(Serialize)]
pub struct StatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PlayerStatId>,
    pub player_id: PlayerId,
    pub tournament_id: TournamentId,
    pub position_type: String,
    pub order: Option<u32>,
    pub is_bench: bool,
    pub at_bats: Option<u32>,
    pub hits: Option<u32>,
    pub doubles: Option<u32>,
    pub triples: Option<u32>,
    pub home_runs: Option<u32>,
    pub rbi: Option<u32>,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub saves: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PlayerStat> for StatResponse {
    fn from(stat: PlayerStat) -> Self {
        StatResponse {
            id: stat.id,
            player_id: stat.player_id,
            tournament_id: stat.tournament_id,
            position_type: stat.position_type.as_str().to_string(),
            order: stat.order,
            is_bench: stat.is_bench,
            at_bats: stat.at_bats,
            hits: stat.hits,
            doubles: stat.doubles,
            triples: stat.triples,
            home_runs: stat.home_runs,
            rbi: stat.rbi,
            wins: stat.wins,
            losses: stat.losses,
            saves: stat.saves,
            created_at: stat.created_at,
            updated_at: stat.updated_at,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct UpdatePlayerStatsRequest {
    #[validate(range(min = 1, max = 12))]
    order: Option<u32>,
    at_bats: Option<u32>,
    hits: Option<u32>,
    doubles: Option<u32>,
    triples: Option<u32>,
    home_runs: Option<u32>,
    rbi: Option<u32>,
    wins: Option<u32>,
    losses: Option<u32>,
    saves: Option<u32>,
}

#[derive(Serialize)]
pub struct BatterLineupResponse {
    pub player_id: PlayerId,
    pub name: String,
    pub position: String,
    pub order: Option<u32>,
    pub at_bats: u32,
    pub hits: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub rbi: u32,
    pub average: f64,
    pub slugging: f64,
    pub ops: f64,
}

#[derive(Serialize)]
pub struct PitcherLineupResponse {
    pub player_id: PlayerId,
    pub name: String,
    pub position: String,
    pub order: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
    pub win_rate: f64,
}

#[derive(Serialize)]
pub struct LineupResponse {
    pub batters: Vec<BatterLineupResponse>,
    pub pitchers: Vec<PitcherLineupResponse>,
}

impl From<LineupView> for LineupResponse {
    fn from(view: LineupView) -> Self {
        let batter = |b: BatterLineupEntry| BatterLineupResponse {
            player_id: b.player_id,
            name: b.name,
            position: b.position,
            order: b.order,
            at_bats: b.at_bats,
            hits: b.hits,
            doubles: b.doubles,
            triples: b.triples,
            home_runs: b.home_runs,
            rbi: b.rbi,
            average: b.average,
            slugging: b.slugging,
            ops: b.ops,
        };
        let pitcher = |p: PitcherLineupEntry| PitcherLineupResponse {
            player_id: p.player_id,
            name: p.name,
            position: p.position,
            order: p.order,
            wins: p.wins,
            losses: p.losses,
            saves: p.saves,
            win_rate: p.win_rate,
        };
        LineupResponse {
            batters: view.batters.into_iter().map(batter).collect(),
            pitchers: view.pitchers.into_iter().map(pitcher).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct TeamStatisticsResponse {
    pub tournament_id: TournamentId,
    pub at_bats: u32,
    pub hits: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub rbi: u32,
    pub average: f64,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
    pub win_rate: f64,
}

impl From<TeamStatistics> for TeamStatisticsResponse {
    fn from(summary: TeamStatistics) -> Self {
        TeamStatisticsResponse {
            tournament_id: summary.tournament_id,
            at_bats: summary.at_bats,
            hits: summary.hits,
            doubles: summary.doubles,
            triples: summary.triples,
            home_runs: summary.home_runs,
            rbi: summary.rbi,
            average: summary.average,
            wins: summary.wins,
            losses: summary.losses,
            saves: summary.saves,
            win_rate: summary.win_rate,
        }
    }
}

pub async fn bulk_update(
    State(app_state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<BulkUpdateResponse>, ApiError> {
    let request: BulkUpdateRequest = parse_body(body)?;
    let outcome = app_state.stats.bulk_update(id, request.into_update()).await?;
    Ok(Json(outcome.into()))
}

pub async fn get_all(
    State(app_state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> Result<Json<Vec<StatResponse>>, ApiError> {
    let stats = app_state.stats.stats_for_tournament(id).await?;
    Ok(Json(stats.into_iter().map(StatResponse::from).collect()))
}

pub async fn get_for_player(
    State(app_state): State<AppState>,
    Path((tournament_id, player_id)): Path<(TournamentId, PlayerId)>,
) -> Result<Json<StatResponse>, ApiError> {
    let stat = app_state.stats.player_stats(tournament_id, player_id).await?;
    Ok(Json(stat.into()))
}

pub async fn update_for_player(
    State(app_state): State<AppState>,
    Path((tournament_id, player_id)): Path<(TournamentId, PlayerId)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<StatResponse>, ApiError> {
    let request: UpdatePlayerStatsRequest = parse_body(body)?;
    let stat = app_state
        .stats
        .update_player_stats(
            tournament_id,
            player_id,
            SingleStatUpdate {
                order: request.order,
                at_bats: request.at_bats,
                hits: request.hits,
                doubles: request.doubles,
                triples: request.triples,
                home_runs: request.home_runs,
                rbi: request.rbi,
                wins: request.wins,
                losses: request.losses,
                saves: request.saves,
            },
        )
        .await?;
    Ok(Json(stat.into()))
}

pub async fn lineup(
    State(app_state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> Result<Json<LineupResponse>, ApiError> {
    let view = app_state.stats.lineup(id).await?;
    Ok(Json(view.into()))
}

pub async fn statistics(
    State(app_state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> Result<Json<TeamStatisticsResponse>, ApiError> {
    let summary = app_state.stats.team_statistics(id).await?;
    Ok(Json(summary.into()))
}
