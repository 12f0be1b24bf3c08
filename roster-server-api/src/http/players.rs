use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use roster_core::PlayerType;
use roster_server_domain::{
    PlayerId,
    player::{BatterRatings, NewPlayer, PitcherRatings, Player},
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    app::ApiError,
    http::{AppState, parse_body},
};

#[derive(Deserialize, Validate)]
pub struct CreatePlayerRequest {
    #[validate(length(min = 1))]
    name: String,
    #[validate(length(min = 1))]
    position: String,
    series: Option<String>,
    #[serde(rename = "type")]
    #[validate(custom(function = validate_player_type))]
    player_type: String,
    spirit: i32,
    #[validate(range(min = 0, max = 5))]
    limit_break: i32,
    skill1: Option<String>,
    skill2: Option<String>,
    skill3: Option<String>,
    // batter ratings
    average: Option<f64>,
    trajectory: Option<String>,
    meet: Option<i32>,
    power: Option<i32>,
    speed: Option<i32>,
    // pitcher ratings
    era: Option<f64>,
    velocity: Option<i32>,
    control: Option<i32>,
    stamina: Option<i32>,
}

fn validate_player_type(value: &str) -> Result<(), ValidationError> {
    PlayerType::parse(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("type must be 'batter' or 'pitcher'"))
}

impl CreatePlayerRequest {
    fn into_new_player(self) -> Result<NewPlayer, ApiError> {
        let player_type = PlayerType::parse(&self.player_type)
            .ok_or_else(|| ApiError::bad_request("type must be 'batter' or 'pitcher'"))?;
        let batting = (player_type == PlayerType::Batter).then(|| BatterRatings {
            average: self.average,
            trajectory: self.trajectory.clone(),
            meet: self.meet,
            power: self.power,
            speed: self.speed,
        });
        let pitching = (player_type == PlayerType::Pitcher).then(|| PitcherRatings {
            era: self.era,
            velocity: self.velocity,
            control: self.control,
            stamina: self.stamina,
        });
        Ok(NewPlayer {
            name: self.name,
            position: self.position,
            series: self.series,
            player_type,
            spirit: self.spirit,
            limit_break: self.limit_break,
            skill1: self.skill1,
            skill2: self.skill2,
            skill3: self.skill3,
            batting,
            pitching,
        })
    }
}

#[derive(Serialize)]
pub struct PlayerResponse {
    pub id: PlayerId,
    pub name: String,
    pub position: String,
    pub series: Option<String>,
    #[serde(rename = "type")]
    pub player_type: String,
    pub spirit: i32,
    pub limit_break: i32,
    pub skill1: Option<String>,
    pub skill2: Option<String>,
    pub skill3: Option<String>,
    pub average: Option<f64>,
    pub trajectory: Option<String>,
    pub meet: Option<i32>,
    pub power: Option<i32>,
    pub speed: Option<i32>,
    pub era: Option<f64>,
    pub velocity: Option<i32>,
    pub control: Option<i32>,
    pub stamina: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Player> for PlayerResponse {
    fn from(player: Player) -> Self {
        let batting = player.batting.unwrap_or_default();
        let pitching = player.pitching.unwrap_or_default();
        PlayerResponse {
            id: player.id,
            name: player.name,
            position: player.position,
            series: player.series,
            player_type: player.player_type.as_str().to_string(),
            spirit: player.spirit,
            limit_break: player.limit_break,
            skill1: player.skill1,
            skill2: player.skill2,
            skill3: player.skill3,
            average: batting.average,
            trajectory: batting.trajectory,
            meet: batting.meet,
            power: batting.power,
            speed: batting.speed,
            era: pitching.era,
            velocity: pitching.velocity,
            control: pitching.control,
            stamina: pitching.stamina,
            created_at: player.created_at,
            updated_at: player.updated_at,
        }
    }
}

pub async fn get_all(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<PlayerResponse>>, ApiError> {
    let players = app_state.players.list_players().await?;
    Ok(Json(players.into_iter().map(PlayerResponse::from).collect()))
}

pub async fn get_by_id(
    State(app_state): State<AppState>,
    Path(id): Path<PlayerId>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player = app_state.players.fetch_player(id).await?;
    Ok(Json(player.into()))
}

pub async fn create(
    State(app_state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<PlayerResponse>), ApiError> {
    let request: CreatePlayerRequest = parse_body(body)?;
    let new_player = request.into_new_player()?;
    let created = app_state.players.create_player(new_player).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}
