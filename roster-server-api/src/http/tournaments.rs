use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use roster_server_domain::{
    TournamentId,
    tournament::{
        NewTournament, PlayerWithStats, Tournament, TournamentDetails, TournamentType,
        TournamentUpdate,
    },
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    app::ApiError,
    http::{AppState, parse_body, stats::StatResponse},
};

#[derive(Deserialize, Validate)]
#[validate(schema(function = validate_create_date_range))]
pub struct CreateTournamentRequest {
    #[validate(length(min = 1, max = 255))]
    name: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    #[validate(custom(function = validate_tournament_type))]
    tournament_type: String,
    #[validate(length(max = 1000))]
    description: Option<String>,
}

fn validate_create_date_range(request: &CreateTournamentRequest) -> Result<(), ValidationError> {
    validate_date_range(Some(request.start_date), request.end_date)
}

#[derive(Deserialize, Validate)]
#[validate(schema(function = validate_update_date_range))]
pub struct UpdateTournamentRequest {
    #[validate(length(min = 1, max = 255))]
    name: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    #[validate(custom(function = validate_tournament_type))]
    tournament_type: Option<String>,
    #[validate(length(max = 1000))]
    description: Option<String>,
}

fn validate_update_date_range(request: &UpdateTournamentRequest) -> Result<(), ValidationError> {
    validate_date_range(request.start_date, request.end_date)
}

fn validate_date_range(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start_date, end_date)
        && end <= start
    {
        return Err(ValidationError::new("end_date must be after start_date"));
    }
    Ok(())
}

fn validate_tournament_type(value: &str) -> Result<(), ValidationError> {
    TournamentType::parse(value).map(|_| ()).ok_or_else(|| {
        ValidationError::new("type must be one of 'rank_battle', 'cup' or 'league'")
    })
}

fn parse_tournament_type(value: &str) -> Result<TournamentType, ApiError> {
    TournamentType::parse(value).ok_or_else(|| {
        ApiError::bad_request("type must be one of 'rank_battle', 'cup' or 'league'")
    })
}

#[derive(Deserialize)]
pub struct TournamentListQuery {
    #[serde(rename = "type")]
    tournament_type: Option<String>,
}

#[derive(Serialize)]
pub struct TournamentResponse {
    pub id: TournamentId,
    pub name: String,
    #[serde(rename = "type")]
    pub tournament_type: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tournament> for TournamentResponse {
    fn from(tournament: Tournament) -> Self {
        TournamentResponse {
            id: tournament.id,
            name: tournament.name,
            tournament_type: tournament.tournament_type.as_str().to_string(),
            start_date: tournament.start_date,
            end_date: tournament.end_date,
            description: tournament.description,
            created_at: tournament.created_at,
            updated_at: tournament.updated_at,
        }
    }
}

/// The player summary embedded in the details view; deliberately narrower
/// than the full player resource.
#[derive(Serialize)]
pub struct PlayerSummaryResponse {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub spirit: i32,
    #[serde(rename = "type")]
    pub player_type: String,
}

#[derive(Serialize)]
pub struct PlayerWithStatsResponse {
    pub player: PlayerSummaryResponse,
    pub stats: StatResponse,
}

impl From<PlayerWithStats> for PlayerWithStatsResponse {
    fn from(pair: PlayerWithStats) -> Self {
        PlayerWithStatsResponse {
            player: PlayerSummaryResponse {
                id: pair.player.id,
                name: pair.player.name,
                position: pair.player.position,
                spirit: pair.player.spirit,
                player_type: pair.player.player_type.as_str().to_string(),
            },
            stats: pair.stats.into(),
        }
    }
}

#[derive(Serialize)]
pub struct TournamentDetailsResponse {
    pub tournament: TournamentResponse,
    #[serde(rename = "playersWithStats")]
    pub players_with_stats: Vec<PlayerWithStatsResponse>,
}

impl From<TournamentDetails> for TournamentDetailsResponse {
    fn from(details: TournamentDetails) -> Self {
        TournamentDetailsResponse {
            tournament: details.tournament.into(),
            players_with_stats: details
                .players_with_stats
                .into_iter()
                .map(PlayerWithStatsResponse::from)
                .collect(),
        }
    }
}

pub async fn get_all(
    State(app_state): State<AppState>,
    Query(query): Query<TournamentListQuery>,
) -> Result<Json<Vec<TournamentResponse>>, ApiError> {
    let tournament_type = query
        .tournament_type
        .as_deref()
        .map(parse_tournament_type)
        .transpose()?;
    let tournaments = app_state.tournaments.list_tournaments(tournament_type).await?;
    Ok(Json(
        tournaments.into_iter().map(TournamentResponse::from).collect(),
    ))
}

pub async fn get_by_id(
    State(app_state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> Result<Json<TournamentResponse>, ApiError> {
    let tournament = app_state.tournaments.fetch_tournament(id).await?;
    Ok(Json(tournament.into()))
}

pub async fn create(
    State(app_state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<TournamentResponse>), ApiError> {
    let request: CreateTournamentRequest = parse_body(body)?;
    let tournament_type = parse_tournament_type(&request.tournament_type)?;
    let created = app_state
        .tournaments
        .create_tournament(NewTournament {
            name: request.name,
            tournament_type,
            start_date: request.start_date,
            end_date: request.end_date,
            description: request.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update(
    State(app_state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TournamentResponse>, ApiError> {
    let request: UpdateTournamentRequest = parse_body(body)?;
    let tournament_type = request
        .tournament_type
        .as_deref()
        .map(parse_tournament_type)
        .transpose()?;
    let updated = app_state
        .tournaments
        .update_tournament(
            id,
            TournamentUpdate {
                name: request.name,
                tournament_type,
                start_date: request.start_date,
                end_date: request.end_date,
                description: request.description,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

pub async fn delete(
    State(app_state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    app_state.tournaments.delete_tournament(id).await?;
    Ok(Json(serde_json::json!({ "message": "大会が削除されました" })))
}

pub async fn details(
    State(app_state): State<AppState>,
    Path(id): Path<TournamentId>,
) -> Result<Json<TournamentDetailsResponse>, ApiError> {
    let details = app_state.tournaments.tournament_details(id).await?;
    Ok(Json(details.into()))
}
