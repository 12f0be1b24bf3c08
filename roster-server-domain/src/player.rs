use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use log::{error, info};
use roster_core::PlayerType;

use crate::{
    PlayerId, ServiceError, ServiceResult, TournamentId,
    stat::PlayerStat,
    tournament::ArcTournamentRepository,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: String,
    pub series: Option<String>,
    pub player_type: PlayerType,
    pub spirit: i32,
    pub limit_break: i32,
    pub skill1: Option<String>,
    pub skill2: Option<String>,
    pub skill3: Option<String>,
    pub batting: Option<BatterRatings>,
    pub pitching: Option<PitcherRatings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Static card ratings for a batter. Separate from the per-tournament
/// counting stats in `stat.rs`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatterRatings {
    pub average: Option<f64>,
    pub trajectory: Option<String>,
    pub meet: Option<i32>,
    pub power: Option<i32>,
    pub speed: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PitcherRatings {
    pub era: Option<f64>,
    pub velocity: Option<i32>,
    pub control: Option<i32>,
    pub stamina: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewPlayer {
    pub name: String,
    pub position: String,
    pub series: Option<String>,
    pub player_type: PlayerType,
    pub spirit: i32,
    pub limit_break: i32,
    pub skill1: Option<String>,
    pub skill2: Option<String>,
    pub skill3: Option<String>,
    pub batting: Option<BatterRatings>,
    pub pitching: Option<PitcherRatings>,
}

pub type ArcPlayerRepository = Arc<Box<dyn PlayerRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait PlayerRepository {
    async fn get_players(&self) -> ServiceResult<Vec<Player>>;
    async fn get_player_by_id(&self, id: PlayerId) -> ServiceResult<Option<Player>>;
    /// Inserts the player and one bench stat row per given tournament in a
    /// single transaction. Either everything lands or nothing does.
    async fn create_player_with_stats(
        &self,
        player: &NewPlayer,
        tournament_ids: &[TournamentId],
    ) -> ServiceResult<Player>;
}

pub type ArcPlayerService = Arc<Box<dyn PlayerService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait PlayerService {
    async fn list_players(&self) -> ServiceResult<Vec<Player>>;
    async fn fetch_player(&self, id: PlayerId) -> ServiceResult<Player>;
    /// Creates the player and fans out a default bench stat row for every
    /// tournament that exists at creation time. Tournaments created later do
    /// not pick up rows retroactively.
    async fn create_player(&self, player: NewPlayer) -> ServiceResult<Player>;
}

pub struct PlayerServiceImpl {
    player_repository: ArcPlayerRepository,
    tournament_repository: ArcTournamentRepository,
}

impl PlayerServiceImpl {
    pub fn new(
        player_repository: ArcPlayerRepository,
        tournament_repository: ArcTournamentRepository,
    ) -> Self {
        Self {
            player_repository,
            tournament_repository,
        }
    }
}

#[async_trait::async_trait]
impl PlayerService for PlayerServiceImpl {
    async fn list_players(&self) -> ServiceResult<Vec<Player>> {
        self.player_repository.get_players().await
    }

    async fn fetch_player(&self, id: PlayerId) -> ServiceResult<Player> {
        match self.player_repository.get_player_by_id(id).await? {
            Some(player) => Ok(player),
            None => ServiceError::not_found(format!("player {} does not exist", id)),
        }
    }

    async fn create_player(&self, player: NewPlayer) -> ServiceResult<Player> {
        let tournament_ids: Vec<TournamentId> = self
            .tournament_repository
            .get_tournaments(None)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        match self
            .player_repository
            .create_player_with_stats(&player, &tournament_ids)
            .await
        {
            Ok(created) => {
                info!(
                    "Created player '{}' (id {}) with {} initial stat rows",
                    created.name,
                    created.id,
                    tournament_ids.len()
                );
                Ok(created)
            }
            Err(e) => {
                error!("Failed to create player '{}': {}", player.name, e);
                Err(e)
            }
        }
    }
}

/// In-memory player store for tests. Also records the bench fan-out rows the
/// transactional create would write.
#[derive(Clone, Default)]
pub struct MockPlayerRepository {
    pub players: Arc<Mutex<Vec<Player>>>,
    pub created_stats: Arc<Mutex<Vec<PlayerStat>>>,
    pub fail_creates: Arc<Mutex<bool>>,
}

#[allow(unused)]
impl MockPlayerRepository {
    pub fn with_players(players: Vec<Player>) -> Self {
        Self {
            players: Arc::new(Mutex::new(players)),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl PlayerRepository for MockPlayerRepository {
    async fn get_players(&self) -> ServiceResult<Vec<Player>> {
        Ok(self.players.lock().unwrap().clone())
    }

    async fn get_player_by_id(&self, id: PlayerId) -> ServiceResult<Option<Player>> {
        Ok(self
            .players
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create_player_with_stats(
        &self,
        player: &NewPlayer,
        tournament_ids: &[TournamentId],
    ) -> ServiceResult<Player> {
        if *self.fail_creates.lock().unwrap() {
            return ServiceError::internal("stat row insert failed");
        }
        let mut players = self.players.lock().unwrap();
        let id = players.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let ts = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        let created = Player {
            id,
            name: player.name.clone(),
            position: player.position.clone(),
            series: player.series.clone(),
            player_type: player.player_type,
            spirit: player.spirit,
            limit_break: player.limit_break,
            skill1: player.skill1.clone(),
            skill2: player.skill2.clone(),
            skill3: player.skill3.clone(),
            batting: player.batting.clone(),
            pitching: player.pitching.clone(),
            created_at: ts,
            updated_at: ts,
        };
        players.push(created.clone());
        let mut stats = self.created_stats.lock().unwrap();
        for tournament_id in tournament_ids {
            stats.push(PlayerStat::bootstrap_row(
                id,
                *tournament_id,
                player.player_type,
            ));
        }
        Ok(created)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tournament::{
        MockTournamentRepository, NewTournament, TournamentRepository, TournamentType,
        tests::make_tournament,
    };

    pub fn make_player(id: PlayerId, player_type: PlayerType) -> Player {
        let ts = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        Player {
            id,
            name: format!("player{}", id),
            position: if player_type == PlayerType::Pitcher {
                "投手".to_string()
            } else {
                "二塁手".to_string()
            },
            series: None,
            player_type,
            spirit: 3500,
            limit_break: 5,
            skill1: None,
            skill2: None,
            skill3: None,
            batting: (player_type == PlayerType::Batter).then(BatterRatings::default),
            pitching: (player_type == PlayerType::Pitcher).then(PitcherRatings::default),
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn make_new_player(name: &str, player_type: PlayerType) -> NewPlayer {
        NewPlayer {
            name: name.to_string(),
            position: "二塁手".to_string(),
            series: Some("2025 Series1".to_string()),
            player_type,
            spirit: 3200,
            limit_break: 3,
            skill1: Some("超広角打法".to_string()),
            skill2: None,
            skill3: None,
            batting: (player_type == PlayerType::Batter).then(BatterRatings::default),
            pitching: (player_type == PlayerType::Pitcher).then(PitcherRatings::default),
        }
    }

    fn service_with(
        players: MockPlayerRepository,
        tournaments: MockTournamentRepository,
    ) -> PlayerServiceImpl {
        PlayerServiceImpl::new(Arc::new(Box::new(players)), Arc::new(Box::new(tournaments)))
    }

    #[tokio::test]
    async fn test_create_player_fans_out_to_existing_tournaments() {
        let tournaments = MockTournamentRepository::with_tournaments(vec![
            make_tournament(1, TournamentType::RankBattle),
            make_tournament(2, TournamentType::Cup),
            make_tournament(3, TournamentType::League),
        ]);
        let players = MockPlayerRepository::default();
        let service = service_with(players.clone(), tournaments);

        let created = service
            .create_player(make_new_player("山田", PlayerType::Batter))
            .await
            .unwrap();

        let stats = players.created_stats.lock().unwrap();
        assert_eq!(stats.len(), 3);
        for row in stats.iter() {
            assert_eq!(row.player_id, created.id);
            assert_eq!(row.position_type, PlayerType::Batter);
            assert_eq!(row.order, None);
            assert!(row.is_bench);
            assert_eq!(row.at_bats, None);
            assert_eq!(row.wins, None);
        }
        let tournament_ids: Vec<TournamentId> = stats.iter().map(|s| s.tournament_id).collect();
        assert_eq!(tournament_ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_create_player_with_no_tournaments_creates_no_stats() {
        let players = MockPlayerRepository::default();
        let service = service_with(players.clone(), MockTournamentRepository::default());

        service
            .create_player(make_new_player("今永", PlayerType::Pitcher))
            .await
            .unwrap();

        assert!(players.created_stats.lock().unwrap().is_empty());
        assert_eq!(players.players.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_player_surfaces_repo_failure() {
        let players = MockPlayerRepository::default();
        *players.fail_creates.lock().unwrap() = true;
        let service = service_with(players.clone(), MockTournamentRepository::default());

        let result = service
            .create_player(make_new_player("山田", PlayerType::Batter))
            .await;
        assert!(matches!(result, Err(ServiceError::Internal(_))));
        assert!(players.players.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_player_not_found() {
        let service = service_with(
            MockPlayerRepository::default(),
            MockTournamentRepository::default(),
        );
        assert!(matches!(
            service.fetch_player(42).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_new_tournament_does_not_backfill_existing_players() {
        // Asymmetry preserved from the source behavior: fan-out happens at
        // player creation only.
        let tournaments = MockTournamentRepository::default();
        let players = MockPlayerRepository::default();
        let service = service_with(players.clone(), tournaments.clone());

        service
            .create_player(make_new_player("山田", PlayerType::Batter))
            .await
            .unwrap();
        assert!(players.created_stats.lock().unwrap().is_empty());

        tournaments
            .create_tournament(&NewTournament {
                name: "リーグ戦".to_string(),
                tournament_type: TournamentType::League,
                start_date: chrono::NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                end_date: None,
                description: None,
            })
            .await
            .unwrap();

        assert!(players.created_stats.lock().unwrap().is_empty());
    }
}
