use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::info;

use crate::{
    ServiceError, ServiceResult, TournamentId,
    player::{ArcPlayerRepository, Player},
    stat::{ArcPlayerStatRepository, PlayerStat},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TournamentType {
    RankBattle,
    Cup,
    League,
}

impl TournamentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentType::RankBattle => "rank_battle",
            TournamentType::Cup => "cup",
            TournamentType::League => "league",
        }
    }

    pub fn parse(s: &str) -> Option<TournamentType> {
        match s {
            "rank_battle" => Some(TournamentType::RankBattle),
            "cup" => Some(TournamentType::Cup),
            "league" => Some(TournamentType::League),
            _ => None,
        }
    }
}

impl std::fmt::Display for TournamentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub tournament_type: TournamentType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTournament {
    pub name: String,
    pub tournament_type: TournamentType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct TournamentUpdate {
    pub name: Option<String>,
    pub tournament_type: Option<TournamentType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A player paired with its stat row for one tournament. The stats are either
/// the stored row or a synthesized bench default when no row exists.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerWithStats {
    pub player: Player,
    pub stats: PlayerStat,
}

#[derive(Clone, Debug)]
pub struct TournamentDetails {
    pub tournament: Tournament,
    pub players_with_stats: Vec<PlayerWithStats>,
}

pub type ArcTournamentRepository = Arc<Box<dyn TournamentRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait TournamentRepository {
    /// Lists tournaments newest-first, optionally restricted to one type.
    async fn get_tournaments(
        &self,
        tournament_type: Option<TournamentType>,
    ) -> ServiceResult<Vec<Tournament>>;
    async fn get_tournament_by_id(&self, id: TournamentId) -> ServiceResult<Option<Tournament>>;
    async fn create_tournament(&self, tournament: &NewTournament) -> ServiceResult<Tournament>;
    async fn update_tournament(
        &self,
        id: TournamentId,
        update: &TournamentUpdate,
    ) -> ServiceResult<Option<Tournament>>;
    /// Deletes the tournament and all of its stat rows. Returns false when
    /// the tournament did not exist.
    async fn delete_tournament(&self, id: TournamentId) -> ServiceResult<bool>;
}

pub type ArcTournamentService = Arc<Box<dyn TournamentService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait TournamentService {
    async fn list_tournaments(
        &self,
        tournament_type: Option<TournamentType>,
    ) -> ServiceResult<Vec<Tournament>>;
    async fn fetch_tournament(&self, id: TournamentId) -> ServiceResult<Tournament>;
    async fn create_tournament(&self, tournament: NewTournament) -> ServiceResult<Tournament>;
    async fn update_tournament(
        &self,
        id: TournamentId,
        update: TournamentUpdate,
    ) -> ServiceResult<Tournament>;
    async fn delete_tournament(&self, id: TournamentId) -> ServiceResult<()>;
    /// Every player in the system paired with its stat row for this
    /// tournament, participating or not. Missing rows are substituted with a
    /// zero-valued bench default that is never persisted.
    async fn tournament_details(&self, id: TournamentId) -> ServiceResult<TournamentDetails>;
}

pub struct TournamentServiceImpl {
    tournament_repository: ArcTournamentRepository,
    player_repository: ArcPlayerRepository,
    stat_repository: ArcPlayerStatRepository,
}

impl TournamentServiceImpl {
    pub fn new(
        tournament_repository: ArcTournamentRepository,
        player_repository: ArcPlayerRepository,
        stat_repository: ArcPlayerStatRepository,
    ) -> Self {
        Self {
            tournament_repository,
            player_repository,
            stat_repository,
        }
    }
}

#[async_trait::async_trait]
impl TournamentService for TournamentServiceImpl {
    async fn list_tournaments(
        &self,
        tournament_type: Option<TournamentType>,
    ) -> ServiceResult<Vec<Tournament>> {
        self.tournament_repository
            .get_tournaments(tournament_type)
            .await
    }

    async fn fetch_tournament(&self, id: TournamentId) -> ServiceResult<Tournament> {
        match self.tournament_repository.get_tournament_by_id(id).await? {
            Some(tournament) => Ok(tournament),
            None => ServiceError::not_found(format!("tournament {} does not exist", id)),
        }
    }

    async fn create_tournament(&self, tournament: NewTournament) -> ServiceResult<Tournament> {
        let created = self
            .tournament_repository
            .create_tournament(&tournament)
            .await?;
        info!(
            "Created tournament '{}' (id {}, type {})",
            created.name, created.id, created.tournament_type
        );
        Ok(created)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        update: TournamentUpdate,
    ) -> ServiceResult<Tournament> {
        match self
            .tournament_repository
            .update_tournament(id, &update)
            .await?
        {
            Some(tournament) => Ok(tournament),
            None => ServiceError::not_found(format!("tournament {} does not exist", id)),
        }
    }

    async fn delete_tournament(&self, id: TournamentId) -> ServiceResult<()> {
        if self.tournament_repository.delete_tournament(id).await? {
            info!("Deleted tournament {} and its stat rows", id);
            Ok(())
        } else {
            ServiceError::not_found(format!("tournament {} does not exist", id))
        }
    }

    async fn tournament_details(&self, id: TournamentId) -> ServiceResult<TournamentDetails> {
        let tournament = self.fetch_tournament(id).await?;
        let players = self.player_repository.get_players().await?;
        let stats = self.stat_repository.get_stats_for_tournament(id).await?;

        let players_with_stats = players
            .into_iter()
            .map(|player| {
                let stats = stats
                    .iter()
                    .find(|s| s.player_id == player.id)
                    .cloned()
                    .unwrap_or_else(|| {
                        PlayerStat::bench_default(player.id, id, player.player_type)
                    });
                PlayerWithStats { player, stats }
            })
            .collect();

        Ok(TournamentDetails {
            tournament,
            players_with_stats,
        })
    }
}

/// In-memory tournament store for tests. When `cascade_stats` is shared with
/// a stat mock, deletes take its rows with them like the real cascade.
#[derive(Clone, Default)]
pub struct MockTournamentRepository {
    pub tournaments: Arc<Mutex<Vec<Tournament>>>,
    pub cascade_stats: Arc<Mutex<Vec<PlayerStat>>>,
}

#[allow(unused)]
impl MockTournamentRepository {
    pub fn with_tournaments(tournaments: Vec<Tournament>) -> Self {
        Self {
            tournaments: Arc::new(Mutex::new(tournaments)),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl TournamentRepository for MockTournamentRepository {
    async fn get_tournaments(
        &self,
        tournament_type: Option<TournamentType>,
    ) -> ServiceResult<Vec<Tournament>> {
        let mut tournaments: Vec<Tournament> = self
            .tournaments
            .lock()
            .unwrap()
            .iter()
            .filter(|t| tournament_type.is_none_or(|ty| t.tournament_type == ty))
            .cloned()
            .collect();
        tournaments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tournaments)
    }

    async fn get_tournament_by_id(&self, id: TournamentId) -> ServiceResult<Option<Tournament>> {
        Ok(self
            .tournaments
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn create_tournament(&self, tournament: &NewTournament) -> ServiceResult<Tournament> {
        let mut tournaments = self.tournaments.lock().unwrap();
        let id = tournaments.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let ts = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        let created = Tournament {
            id,
            name: tournament.name.clone(),
            tournament_type: tournament.tournament_type,
            start_date: tournament.start_date,
            end_date: tournament.end_date,
            description: tournament.description.clone(),
            created_at: ts,
            updated_at: ts,
        };
        tournaments.push(created.clone());
        Ok(created)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        update: &TournamentUpdate,
    ) -> ServiceResult<Option<Tournament>> {
        let mut tournaments = self.tournaments.lock().unwrap();
        let Some(tournament) = tournaments.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            tournament.name = name.clone();
        }
        if let Some(ty) = update.tournament_type {
            tournament.tournament_type = ty;
        }
        if let Some(start_date) = update.start_date {
            tournament.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            tournament.end_date = Some(end_date);
        }
        if let Some(description) = &update.description {
            tournament.description = Some(description.clone());
        }
        Ok(Some(tournament.clone()))
    }

    async fn delete_tournament(&self, id: TournamentId) -> ServiceResult<bool> {
        let mut tournaments = self.tournaments.lock().unwrap();
        let before = tournaments.len();
        tournaments.retain(|t| t.id != id);
        if tournaments.len() == before {
            return Ok(false);
        }
        self.cascade_stats
            .lock()
            .unwrap()
            .retain(|s| s.tournament_id != id);
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use roster_core::PlayerType;

    use super::*;
    use crate::{
        PlayerId,
        player::{MockPlayerRepository, tests::make_player},
        stat::MockPlayerStatRepository,
    };

    pub fn make_tournament(id: TournamentId, tournament_type: TournamentType) -> Tournament {
        let ts = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap() + chrono::Duration::days(id);
        Tournament {
            id,
            name: format!("tournament{}", id),
            tournament_type,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            end_date: None,
            description: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn service_with(
        tournaments: MockTournamentRepository,
        players: MockPlayerRepository,
        stats: MockPlayerStatRepository,
    ) -> TournamentServiceImpl {
        TournamentServiceImpl::new(
            Arc::new(Box::new(tournaments)),
            Arc::new(Box::new(players)),
            Arc::new(Box::new(stats)),
        )
    }

    #[tokio::test]
    async fn test_list_tournaments_newest_first_with_type_filter() {
        let repo = MockTournamentRepository::with_tournaments(vec![
            make_tournament(1, TournamentType::Cup),
            make_tournament(2, TournamentType::RankBattle),
            make_tournament(3, TournamentType::Cup),
        ]);
        let service = service_with(
            repo,
            MockPlayerRepository::default(),
            MockPlayerStatRepository::default(),
        );

        let all = service.list_tournaments(None).await.unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let cups = service
            .list_tournaments(Some(TournamentType::Cup))
            .await
            .unwrap();
        assert_eq!(cups.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_update_tournament_partial() {
        let repo =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let service = service_with(
            repo,
            MockPlayerRepository::default(),
            MockPlayerStatRepository::default(),
        );

        let updated = service
            .update_tournament(
                1,
                TournamentUpdate {
                    name: Some("8月杯".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "8月杯");
        assert_eq!(updated.tournament_type, TournamentType::Cup);

        assert!(matches!(
            service
                .update_tournament(99, TournamentUpdate::default())
                .await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_tournament_cascades_stats_and_keeps_players() {
        let stats = MockPlayerStatRepository::default();
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        // share the stat rows so the mock delete can cascade
        let tournaments = MockTournamentRepository {
            cascade_stats: stats.stats.clone(),
            ..tournaments
        };
        let players =
            MockPlayerRepository::with_players(vec![make_player(1, PlayerType::Batter)]);
        stats.stats.lock().unwrap().push(PlayerStat::bootstrap_row(
            1,
            1,
            PlayerType::Batter,
        ));

        let service = service_with(tournaments, players.clone(), stats.clone());

        service.delete_tournament(1).await.unwrap();
        assert!(stats.stats.lock().unwrap().is_empty());
        assert_eq!(players.players.lock().unwrap().len(), 1);

        assert!(matches!(
            service.delete_tournament(1).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_details_contains_every_player() {
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(7, TournamentType::League)]);
        let players = MockPlayerRepository::with_players(vec![
            make_player(1, PlayerType::Batter),
            make_player(2, PlayerType::Pitcher),
            make_player(3, PlayerType::Batter),
        ]);
        let stats = MockPlayerStatRepository::default();
        // only player 2 has a stored row
        let mut stored = PlayerStat::bootstrap_row(2, 7, PlayerType::Pitcher);
        stored.wins = Some(4);
        stored.order = Some(1);
        stored.is_bench = false;
        stats.stats.lock().unwrap().push(stored);

        let service = service_with(tournaments, players, stats);
        let details = service.tournament_details(7).await.unwrap();

        assert_eq!(details.tournament.id, 7);
        assert_eq!(details.players_with_stats.len(), 3);

        let for_player = |id: PlayerId| {
            details
                .players_with_stats
                .iter()
                .find(|p| p.player.id == id)
                .unwrap()
        };
        assert_eq!(for_player(2).stats.wins, Some(4));
        // players without a row get the synthesized zero-valued bench default
        let synthesized = &for_player(1).stats;
        assert_eq!(synthesized.id, None);
        assert_eq!(synthesized.order, None);
        assert!(synthesized.is_bench);
        assert_eq!(synthesized.at_bats, Some(0));
        assert_eq!(synthesized.wins, Some(0));
    }

    #[tokio::test]
    async fn test_details_unknown_tournament() {
        let service = service_with(
            MockTournamentRepository::default(),
            MockPlayerRepository::default(),
            MockPlayerStatRepository::default(),
        );
        assert!(matches!(
            service.tournament_details(5).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_tournament_assigns_id() {
        let service = service_with(
            MockTournamentRepository::default(),
            MockPlayerRepository::default(),
            MockPlayerStatRepository::default(),
        );
        let created = service
            .create_tournament(NewTournament {
                name: "カップ戦".to_string(),
                tournament_type: TournamentType::Cup,
                start_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                end_date: Some(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()),
                description: Some("夏のカップ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.tournament_type, TournamentType::Cup);
    }

    #[test]
    fn test_tournament_type_round_trip() {
        for ty in [
            TournamentType::RankBattle,
            TournamentType::Cup,
            TournamentType::League,
        ] {
            assert_eq!(TournamentType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(TournamentType::parse("friendly"), None);
    }
}
