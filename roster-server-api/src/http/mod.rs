use axum::{
    Router,
    routing::{get, post},
};
use log::info;
use roster_server_domain::{
    player::ArcPlayerService, stat::ArcPlayerStatService, tournament::ArcTournamentService,
};
use tower_http::cors::CorsLayer;

use crate::app::ApiError;

mod players;
mod stats;
mod tournaments;

#[derive(Clone)]
pub struct AppState {
    pub players: ArcPlayerService,
    pub tournaments: ArcTournamentService,
    pub stats: ArcPlayerStatService,
}

pub async fn run(
    players: ArcPlayerService,
    tournaments: ArcTournamentService,
    stats: ArcPlayerStatService,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) {
    let router: Router<AppState> = Router::new()
        .route("/players", get(players::get_all))
        .route("/players/create", post(players::create))
        .route("/players/{id}", get(players::get_by_id))
        .route(
            "/tournaments",
            get(tournaments::get_all).post(tournaments::create),
        )
        .route(
            "/tournaments/{id}",
            get(tournaments::get_by_id)
                .put(tournaments::update)
                .delete(tournaments::delete),
        )
        .route("/tournaments/{id}/details", get(tournaments::details))
        .route("/tournaments/{id}/lineup", get(stats::lineup))
        .route("/tournaments/{id}/player-stats", get(stats::get_all))
        .route(
            "/tournaments/{id}/player-stats/bulk-update",
            post(stats::bulk_update),
        )
        .route("/tournaments/{id}/statistics", get(stats::statistics))
        .route(
            "/tournaments/{tournament_id}/players/{player_id}/stats",
            get(stats::get_for_player).put(stats::update_for_player),
        );

    let cors = match std::env::var("ROSTER_CORS_ORIGIN") {
        Ok(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .expect("ROSTER_CORS_ORIGIN must be a valid origin"),
            )
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
        Err(_) => CorsLayer::permissive(),
    };

    let port = std::env::var("ROSTER_HTTP_PORT")
        .expect("ROSTER_HTTP_PORT must be set")
        .parse::<u16>()
        .expect("ROSTER_HTTP_PORT must be a valid u16");

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .unwrap();

    info!("API server listening on port {}", port);
    axum::serve(
        listener,
        router
            .layer(cors)
            .with_state(AppState {
                players,
                tournaments,
                stats,
            }),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await
    .unwrap();

    info!("HTTP API shut down gracefully");
}

/// The single normalization pass applied to every request body before typed
/// deserialization: strings are trimmed and empty strings become null, at
/// any nesting depth.
pub(crate) fn normalize_body(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                *value = serde_json::Value::Null;
            } else if trimmed.len() != s.len() {
                *value = serde_json::Value::String(trimmed.to_string());
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                normalize_body(item);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values_mut() {
                normalize_body(item);
            }
        }
        _ => {}
    }
}

/// Normalizes, deserializes and schema-validates a request body.
pub(crate) fn parse_body<T>(mut body: serde_json::Value) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned + validator::Validate,
{
    normalize_body(&mut body);
    let parsed: T = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e)))?;
    parsed
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_body_empty_strings_to_null() {
        let mut body = serde_json::json!({
            "name": "  山田  ",
            "series": "",
            "nested": { "skill1": "", "skill2": "超広角打法" },
            "list": [{ "trajectory": "" }],
            "spirit": 3200,
        });
        normalize_body(&mut body);
        assert_eq!(body["name"], "山田");
        assert_eq!(body["series"], serde_json::Value::Null);
        assert_eq!(body["nested"]["skill1"], serde_json::Value::Null);
        assert_eq!(body["nested"]["skill2"], "超広角打法");
        assert_eq!(body["list"][0]["trajectory"], serde_json::Value::Null);
        assert_eq!(body["spirit"], 3200);
    }
}
