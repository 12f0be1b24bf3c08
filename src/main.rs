use std::sync::Arc;

use log::info;
use roster_persistence_sea_orm::{
    players::PlayerRepositoryImpl, stats::PlayerStatRepositoryImpl,
    tournaments::TournamentRepositoryImpl,
};
use roster_server_domain::{
    player::{ArcPlayerRepository, ArcPlayerService, PlayerServiceImpl},
    stat::{ArcPlayerStatRepository, ArcPlayerStatService, PlayerStatServiceImpl},
    tournament::{ArcTournamentRepository, ArcTournamentService, TournamentServiceImpl},
};

mod logs;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().expect("Failed to load .env file");

    logs::init_logger();

    let player_repo: ArcPlayerRepository = Arc::new(Box::new(PlayerRepositoryImpl::new().await));
    let tournament_repo: ArcTournamentRepository =
        Arc::new(Box::new(TournamentRepositoryImpl::new().await));
    let stat_repo: ArcPlayerStatRepository =
        Arc::new(Box::new(PlayerStatRepositoryImpl::new().await));

    let player_service: ArcPlayerService = Arc::new(Box::new(PlayerServiceImpl::new(
        player_repo.clone(),
        tournament_repo.clone(),
    )));
    let tournament_service: ArcTournamentService = Arc::new(Box::new(TournamentServiceImpl::new(
        tournament_repo.clone(),
        player_repo.clone(),
        stat_repo.clone(),
    )));
    let stat_service: ArcPlayerStatService = Arc::new(Box::new(PlayerStatServiceImpl::new(
        stat_repo,
        player_repo,
        tournament_repo,
    )));

    info!("Starting application");

    roster_server_api::http::run(
        player_service,
        tournament_service,
        stat_service,
        shutdown_signal(),
    )
    .await;
}
