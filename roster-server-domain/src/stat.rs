use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{error, info};
use roster_core::{
    PlayerType, batting_average, batting_order_rank, ops, pitcher_slot_rank, slugging, win_rate,
};

use crate::{
    PlayerId, PlayerStatId, ServiceError, ServiceResult, TournamentId,
    player::ArcPlayerRepository, tournament::ArcTournamentRepository,
};

/// One stat row per (player, tournament) pair. Counting stats are nullable in
/// storage: bootstrap rows start out all-null, upserts fill them in. Derived
/// rates are never part of this record.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStat {
    /// None for synthesized defaults that were never persisted.
    pub id: Option<PlayerStatId>,
    pub player_id: PlayerId,
    pub tournament_id: TournamentId,
    pub position_type: PlayerType,
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
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PlayerStat {
    /// The row written for every existing tournament when a player is
    /// created: benched, no slot, no counting stats yet.
    pub fn bootstrap_row(
        player_id: PlayerId,
        tournament_id: TournamentId,
        position_type: PlayerType,
    ) -> PlayerStat {
        PlayerStat {
            id: None,
            player_id,
            tournament_id,
            position_type,
            order: None,
            is_bench: true,
            at_bats: None,
            hits: None,
            doubles: None,
            triples: None,
            home_runs: None,
            rbi: None,
            wins: None,
            losses: None,
            saves: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Zero-valued stand-in used on read paths when a player has no stored
    /// row for a tournament. Never persisted.
    pub fn bench_default(
        player_id: PlayerId,
        tournament_id: TournamentId,
        position_type: PlayerType,
    ) -> PlayerStat {
        PlayerStat {
            at_bats: Some(0),
            hits: Some(0),
            doubles: Some(0),
            triples: Some(0),
            home_runs: Some(0),
            rbi: Some(0),
            wins: Some(0),
            losses: Some(0),
            saves: Some(0),
            ..PlayerStat::bootstrap_row(player_id, tournament_id, position_type)
        }
    }
}

/// One batter entry of a bulk update.
#[derive(Clone, Debug, PartialEq)]
pub struct BatterStatLine {
    pub player_id: PlayerId,
    pub order: Option<u32>,
    pub at_bats: u32,
    pub hits: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub rbi: u32,
}

impl BatterStatLine {
    /// Writes this entry into a row. Pitching-only fields are forced to 0
    /// rather than left as they were.
    pub fn write_to(&self, row: &mut PlayerStat) {
        row.order = self.order;
        row.is_bench = self.order.is_none();
        row.at_bats = Some(self.at_bats);
        row.hits = Some(self.hits);
        row.doubles = Some(self.doubles);
        row.triples = Some(self.triples);
        row.home_runs = Some(self.home_runs);
        row.rbi = Some(self.rbi);
        row.wins = Some(0);
        row.losses = Some(0);
        row.saves = Some(0);
    }

    pub fn to_row(&self, tournament_id: TournamentId) -> PlayerStat {
        let mut row = PlayerStat::bootstrap_row(self.player_id, tournament_id, PlayerType::Batter);
        self.write_to(&mut row);
        row
    }
}

/// One pitcher entry of a bulk update.
#[derive(Clone, Debug, PartialEq)]
pub struct PitcherStatLine {
    pub player_id: PlayerId,
    pub order: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
}

impl PitcherStatLine {
    /// Writes this entry into a row, forcing batting-only fields to 0.
    pub fn write_to(&self, row: &mut PlayerStat) {
        row.order = self.order;
        row.is_bench = self.order.is_none();
        row.wins = Some(self.wins);
        row.losses = Some(self.losses);
        row.saves = Some(self.saves);
        row.at_bats = Some(0);
        row.hits = Some(0);
        row.doubles = Some(0);
        row.triples = Some(0);
        row.home_runs = Some(0);
        row.rbi = Some(0);
    }

    pub fn to_row(&self, tournament_id: TournamentId) -> PlayerStat {
        let mut row = PlayerStat::bootstrap_row(self.player_id, tournament_id, PlayerType::Pitcher);
        self.write_to(&mut row);
        row
    }
}

#[derive(Clone, Debug, Default)]
pub struct BulkStatsUpdate {
    pub batters: Vec<BatterStatLine>,
    pub pitchers: Vec<PitcherStatLine>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpsertedBatter {
    pub player_id: PlayerId,
    pub stats_id: PlayerStatId,
    pub at_bats: u32,
    pub hits: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpsertedPitcher {
    pub player_id: PlayerId,
    pub stats_id: PlayerStatId,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
}

#[derive(Clone, Debug)]
pub struct BulkUpdateOutcome {
    pub tournament_id: TournamentId,
    pub updated_batters: Vec<UpsertedBatter>,
    pub updated_pitchers: Vec<UpsertedPitcher>,
    pub updated_at: DateTime<Utc>,
}

/// Partial single-row update; the player's type decides which fields apply.
#[derive(Clone, Debug, Default)]
pub struct SingleStatUpdate {
    pub order: Option<u32>,
    pub at_bats: Option<u32>,
    pub hits: Option<u32>,
    pub doubles: Option<u32>,
    pub triples: Option<u32>,
    pub home_runs: Option<u32>,
    pub rbi: Option<u32>,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub saves: Option<u32>,
}

/// Display-ordered roster for one tournament, with derived rates computed
/// fresh from the counting stats.
#[derive(Clone, Debug)]
pub struct LineupView {
    pub batters: Vec<BatterLineupEntry>,
    pub pitchers: Vec<PitcherLineupEntry>,
}

#[derive(Clone, Debug)]
pub struct BatterLineupEntry {
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

#[derive(Clone, Debug)]
pub struct PitcherLineupEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub position: String,
    pub order: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
    pub win_rate: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TeamStatistics {
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

pub type ArcPlayerStatRepository = Arc<Box<dyn PlayerStatRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait PlayerStatRepository {
    async fn get_stats_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> ServiceResult<Vec<PlayerStat>>;
    async fn get_stat_by_pair(
        &self,
        player_id: PlayerId,
        tournament_id: TournamentId,
    ) -> ServiceResult<Option<PlayerStat>>;
    /// Upserts every entry in one transaction: insert where no
    /// (player, tournament) row exists, overwrite otherwise. Returns the
    /// written rows, batters then pitchers. Nothing is applied on failure.
    async fn bulk_upsert(
        &self,
        tournament_id: TournamentId,
        batters: &[BatterStatLine],
        pitchers: &[PitcherStatLine],
    ) -> ServiceResult<(Vec<PlayerStat>, Vec<PlayerStat>)>;
}

pub type ArcPlayerStatService = Arc<Box<dyn PlayerStatService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait PlayerStatService {
    /// Bulk upsert per tournament. Player existence is validated before the
    /// transaction opens; the whole batch is rejected if any id is unknown.
    async fn bulk_update(
        &self,
        tournament_id: TournamentId,
        update: BulkStatsUpdate,
    ) -> ServiceResult<BulkUpdateOutcome>;
    async fn stats_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> ServiceResult<Vec<PlayerStat>>;
    /// Stored row for the pair, or the synthesized bench default.
    async fn player_stats(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> ServiceResult<PlayerStat>;
    /// Single-row upsert through the same path as the bulk update.
    async fn update_player_stats(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        update: SingleStatUpdate,
    ) -> ServiceResult<PlayerStat>;
    async fn lineup(&self, tournament_id: TournamentId) -> ServiceResult<LineupView>;
    async fn team_statistics(&self, tournament_id: TournamentId) -> ServiceResult<TeamStatistics>;
}

pub struct PlayerStatServiceImpl {
    stat_repository: ArcPlayerStatRepository,
    player_repository: ArcPlayerRepository,
    tournament_repository: ArcTournamentRepository,
}

impl PlayerStatServiceImpl {
    pub fn new(
        stat_repository: ArcPlayerStatRepository,
        player_repository: ArcPlayerRepository,
        tournament_repository: ArcTournamentRepository,
    ) -> Self {
        Self {
            stat_repository,
            player_repository,
            tournament_repository,
        }
    }

    async fn require_tournament(&self, id: TournamentId) -> ServiceResult<()> {
        if self
            .tournament_repository
            .get_tournament_by_id(id)
            .await?
            .is_none()
        {
            return ServiceError::not_found(format!("tournament {} does not exist", id));
        }
        Ok(())
    }

    async fn require_players(&self, ids: impl Iterator<Item = PlayerId>) -> ServiceResult<()> {
        for id in ids {
            if self.player_repository.get_player_by_id(id).await?.is_none() {
                return ServiceError::bad_request(format!("player {} does not exist", id));
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PlayerStatService for PlayerStatServiceImpl {
    async fn bulk_update(
        &self,
        tournament_id: TournamentId,
        update: BulkStatsUpdate,
    ) -> ServiceResult<BulkUpdateOutcome> {
        self.require_tournament(tournament_id).await?;
        self.require_players(
            update
                .batters
                .iter()
                .map(|b| b.player_id)
                .chain(update.pitchers.iter().map(|p| p.player_id)),
        )
        .await?;

        let (batter_rows, pitcher_rows) = match self
            .stat_repository
            .bulk_upsert(tournament_id, &update.batters, &update.pitchers)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                error!(
                    "Bulk stats update for tournament {} failed: {}",
                    tournament_id, e
                );
                return Err(e);
            }
        };

        info!(
            "Bulk updated stats for tournament {}: {} batters, {} pitchers",
            tournament_id,
            batter_rows.len(),
            pitcher_rows.len()
        );

        let updated_batters = batter_rows
            .iter()
            .map(|row| UpsertedBatter {
                player_id: row.player_id,
                stats_id: row.id.unwrap_or_default(),
                at_bats: row.at_bats.unwrap_or(0),
                hits: row.hits.unwrap_or(0),
            })
            .collect();
        let updated_pitchers = pitcher_rows
            .iter()
            .map(|row| UpsertedPitcher {
                player_id: row.player_id,
                stats_id: row.id.unwrap_or_default(),
                wins: row.wins.unwrap_or(0),
                losses: row.losses.unwrap_or(0),
                saves: row.saves.unwrap_or(0),
            })
            .collect();

        Ok(BulkUpdateOutcome {
            tournament_id,
            updated_batters,
            updated_pitchers,
            updated_at: Utc::now(),
        })
    }

    async fn stats_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> ServiceResult<Vec<PlayerStat>> {
        self.require_tournament(tournament_id).await?;
        self.stat_repository
            .get_stats_for_tournament(tournament_id)
            .await
    }

    async fn player_stats(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> ServiceResult<PlayerStat> {
        self.require_tournament(tournament_id).await?;
        let Some(player) = self.player_repository.get_player_by_id(player_id).await? else {
            return ServiceError::not_found(format!("player {} does not exist", player_id));
        };
        Ok(self
            .stat_repository
            .get_stat_by_pair(player_id, tournament_id)
            .await?
            .unwrap_or_else(|| {
                PlayerStat::bench_default(player_id, tournament_id, player.player_type)
            }))
    }

    async fn update_player_stats(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        update: SingleStatUpdate,
    ) -> ServiceResult<PlayerStat> {
        self.require_tournament(tournament_id).await?;
        let Some(player) = self.player_repository.get_player_by_id(player_id).await? else {
            return ServiceError::not_found(format!("player {} does not exist", player_id));
        };

        let (batters, pitchers) = match player.player_type {
            PlayerType::Batter => (
                vec![BatterStatLine {
                    player_id,
                    order: update.order,
                    at_bats: update.at_bats.unwrap_or(0),
                    hits: update.hits.unwrap_or(0),
                    doubles: update.doubles.unwrap_or(0),
                    triples: update.triples.unwrap_or(0),
                    home_runs: update.home_runs.unwrap_or(0),
                    rbi: update.rbi.unwrap_or(0),
                }],
                Vec::new(),
            ),
            PlayerType::Pitcher => (
                Vec::new(),
                vec![PitcherStatLine {
                    player_id,
                    order: update.order,
                    wins: update.wins.unwrap_or(0),
                    losses: update.losses.unwrap_or(0),
                    saves: update.saves.unwrap_or(0),
                }],
            ),
        };

        let (mut batter_rows, mut pitcher_rows) = self
            .stat_repository
            .bulk_upsert(tournament_id, &batters, &pitchers)
            .await?;
        batter_rows
            .pop()
            .or_else(|| pitcher_rows.pop())
            .ok_or_else(|| ServiceError::Internal("upsert returned no row".to_string()))
    }

    async fn lineup(&self, tournament_id: TournamentId) -> ServiceResult<LineupView> {
        self.require_tournament(tournament_id).await?;
        let players = self.player_repository.get_players().await?;
        let stats = self
            .stat_repository
            .get_stats_for_tournament(tournament_id)
            .await?;

        let mut batters = Vec::new();
        let mut pitchers = Vec::new();
        for player in players {
            let row = stats
                .iter()
                .find(|s| s.player_id == player.id)
                .cloned()
                .unwrap_or_else(|| {
                    PlayerStat::bench_default(player.id, tournament_id, player.player_type)
                });
            match player.player_type {
                PlayerType::Batter => {
                    let (at_bats, hits, home_runs) = (
                        row.at_bats.unwrap_or(0),
                        row.hits.unwrap_or(0),
                        row.home_runs.unwrap_or(0),
                    );
                    batters.push(BatterLineupEntry {
                        player_id: player.id,
                        name: player.name,
                        position: player.position,
                        order: row.order,
                        at_bats,
                        hits,
                        doubles: row.doubles.unwrap_or(0),
                        triples: row.triples.unwrap_or(0),
                        home_runs,
                        rbi: row.rbi.unwrap_or(0),
                        average: batting_average(at_bats, hits),
                        slugging: slugging(at_bats, hits, home_runs),
                        ops: ops(at_bats, hits, home_runs),
                    });
                }
                PlayerType::Pitcher => {
                    let (wins, losses) = (row.wins.unwrap_or(0), row.losses.unwrap_or(0));
                    pitchers.push(PitcherLineupEntry {
                        player_id: player.id,
                        name: player.name,
                        position: player.position,
                        order: row.order,
                        wins,
                        losses,
                        saves: row.saves.unwrap_or(0),
                        win_rate: win_rate(wins, losses),
                    });
                }
            }
        }

        // stable sorts keep ties in source order
        batters.sort_by_key(|b| batting_order_rank(b.order));
        pitchers.sort_by_key(|p| pitcher_slot_rank(p.order));

        Ok(LineupView { batters, pitchers })
    }

    async fn team_statistics(&self, tournament_id: TournamentId) -> ServiceResult<TeamStatistics> {
        self.require_tournament(tournament_id).await?;
        let stats = self
            .stat_repository
            .get_stats_for_tournament(tournament_id)
            .await?;

        let sum = |f: fn(&PlayerStat) -> Option<u32>| -> u32 {
            stats.iter().filter_map(f).sum()
        };
        let (at_bats, hits) = (sum(|s| s.at_bats), sum(|s| s.hits));
        let (wins, losses) = (sum(|s| s.wins), sum(|s| s.losses));

        Ok(TeamStatistics {
            tournament_id,
            at_bats,
            hits,
            doubles: sum(|s| s.doubles),
            triples: sum(|s| s.triples),
            home_runs: sum(|s| s.home_runs),
            rbi: sum(|s| s.rbi),
            average: batting_average(at_bats, hits),
            wins,
            losses,
            saves: sum(|s| s.saves),
            win_rate: win_rate(wins, losses),
        })
    }
}

/// In-memory stat store for tests. `fail_bulk` makes every bulk upsert fail
/// without touching any row, like a rolled-back transaction.
#[derive(Clone, Default)]
pub struct MockPlayerStatRepository {
    pub stats: Arc<Mutex<Vec<PlayerStat>>>,
    pub fail_bulk: Arc<Mutex<bool>>,
    pub bulk_calls: Arc<Mutex<u32>>,
}

#[async_trait::async_trait]
impl PlayerStatRepository for MockPlayerStatRepository {
    async fn get_stats_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> ServiceResult<Vec<PlayerStat>> {
        Ok(self
            .stats
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn get_stat_by_pair(
        &self,
        player_id: PlayerId,
        tournament_id: TournamentId,
    ) -> ServiceResult<Option<PlayerStat>> {
        Ok(self
            .stats
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.player_id == player_id && s.tournament_id == tournament_id)
            .cloned())
    }

    async fn bulk_upsert(
        &self,
        tournament_id: TournamentId,
        batters: &[BatterStatLine],
        pitchers: &[PitcherStatLine],
    ) -> ServiceResult<(Vec<PlayerStat>, Vec<PlayerStat>)> {
        *self.bulk_calls.lock().unwrap() += 1;
        if *self.fail_bulk.lock().unwrap() {
            return ServiceError::internal("transaction rolled back");
        }
        let mut stats = self.stats.lock().unwrap();
        let mut upsert = |row_for: PlayerStat| -> PlayerStat {
            if let Some(existing) = stats
                .iter_mut()
                .find(|s| s.player_id == row_for.player_id && s.tournament_id == tournament_id)
            {
                let (id, position_type, created_at) =
                    (existing.id, existing.position_type, existing.created_at);
                *existing = PlayerStat {
                    id,
                    position_type,
                    created_at,
                    ..row_for
                };
                existing.clone()
            } else {
                let id = stats.iter().filter_map(|s| s.id).max().unwrap_or(0) + 1;
                let row = PlayerStat {
                    id: Some(id),
                    ..row_for
                };
                stats.push(row.clone());
                row
            }
        };
        let batter_rows = batters
            .iter()
            .map(|line| upsert(line.to_row(tournament_id)))
            .collect();
        let pitcher_rows = pitchers
            .iter()
            .map(|line| upsert(line.to_row(tournament_id)))
            .collect();
        Ok((batter_rows, pitcher_rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        player::{MockPlayerRepository, tests::make_player},
        tournament::{MockTournamentRepository, TournamentType, tests::make_tournament},
    };

    fn service_with(
        stats: MockPlayerStatRepository,
        players: MockPlayerRepository,
        tournaments: MockTournamentRepository,
    ) -> PlayerStatServiceImpl {
        PlayerStatServiceImpl::new(
            Arc::new(Box::new(stats)),
            Arc::new(Box::new(players)),
            Arc::new(Box::new(tournaments)),
        )
    }

    fn batter_line(player_id: PlayerId, order: Option<u32>) -> BatterStatLine {
        BatterStatLine {
            player_id,
            order,
            at_bats: 4,
            hits: 2,
            doubles: 0,
            triples: 0,
            home_runs: 1,
            rbi: 3,
        }
    }

    #[tokio::test]
    async fn test_bulk_update_scenario() {
        // T1 (cup) exists, then P1 (batter) is created: one bench row
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let players = MockPlayerRepository::with_players(vec![make_player(1, PlayerType::Batter)]);
        let stats = MockPlayerStatRepository::default();
        stats
            .stats
            .lock()
            .unwrap()
            .push(PlayerStat {
                id: Some(1),
                ..PlayerStat::bootstrap_row(1, 1, PlayerType::Batter)
            });

        let service = service_with(stats.clone(), players, tournaments);
        let outcome = service
            .bulk_update(
                1,
                BulkStatsUpdate {
                    batters: vec![batter_line(1, Some(3))],
                    pitchers: vec![],
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.updated_batters.len(), 1);
        assert_eq!(outcome.updated_batters[0].stats_id, 1);
        assert!(outcome.updated_pitchers.is_empty());

        let rows = stats.stats.lock().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.at_bats, Some(4));
        assert_eq!(row.hits, Some(2));
        assert_eq!(row.home_runs, Some(1));
        assert_eq!(row.rbi, Some(3));
        assert_eq!(row.order, Some(3));
        assert!(!row.is_bench);
        // pitching fields forced to zero on the batter branch
        assert_eq!(row.wins, Some(0));
        assert_eq!(row.saves, Some(0));
        // rates recomputed from the stored counts
        assert_eq!(batting_average(4, 2), 0.5);
        assert_eq!(ops(4, 2, 1), batting_average(4, 2) + slugging(4, 2, 1));
    }

    #[tokio::test]
    async fn test_bulk_update_is_idempotent() {
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let players = MockPlayerRepository::with_players(vec![
            make_player(1, PlayerType::Batter),
            make_player(2, PlayerType::Pitcher),
        ]);
        let stats = MockPlayerStatRepository::default();
        let service = service_with(stats.clone(), players, tournaments);

        let update = BulkStatsUpdate {
            batters: vec![batter_line(1, Some(4))],
            pitchers: vec![PitcherStatLine {
                player_id: 2,
                order: Some(12),
                wins: 3,
                losses: 1,
                saves: 0,
            }],
        };

        service.bulk_update(1, update.clone()).await.unwrap();
        let after_first = stats.stats.lock().unwrap().clone();
        service.bulk_update(1, update).await.unwrap();
        let after_second = stats.stats.lock().unwrap().clone();

        assert_eq!(after_first, after_second);
        assert_eq!(after_second.len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_update_rejects_unknown_player_before_transaction() {
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let players = MockPlayerRepository::with_players(vec![make_player(1, PlayerType::Batter)]);
        let stats = MockPlayerStatRepository::default();
        let service = service_with(stats.clone(), players, tournaments);

        let result = service
            .bulk_update(
                1,
                BulkStatsUpdate {
                    batters: vec![batter_line(1, None), batter_line(99, None)],
                    pitchers: vec![],
                },
            )
            .await;

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        // validation failed before the repository was ever touched
        assert_eq!(*stats.bulk_calls.lock().unwrap(), 0);
        assert!(stats.stats.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_update_unknown_tournament() {
        let service = service_with(
            MockPlayerStatRepository::default(),
            MockPlayerRepository::default(),
            MockTournamentRepository::default(),
        );
        assert!(matches!(
            service.bulk_update(9, BulkStatsUpdate::default()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_update_surfaces_rollback() {
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let players = MockPlayerRepository::with_players(vec![make_player(1, PlayerType::Batter)]);
        let stats = MockPlayerStatRepository::default();
        *stats.fail_bulk.lock().unwrap() = true;
        let service = service_with(stats.clone(), players, tournaments);

        let result = service
            .bulk_update(
                1,
                BulkStatsUpdate {
                    batters: vec![batter_line(1, None)],
                    pitchers: vec![],
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Internal(_))));
        assert!(stats.stats.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_update_goes_through_upsert_path() {
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let players = MockPlayerRepository::with_players(vec![make_player(2, PlayerType::Pitcher)]);
        let stats = MockPlayerStatRepository::default();
        let service = service_with(stats.clone(), players, tournaments);

        let row = service
            .update_player_stats(
                1,
                2,
                SingleStatUpdate {
                    order: Some(12),
                    wins: Some(5),
                    losses: Some(2),
                    saves: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(row.wins, Some(5));
        assert_eq!(row.order, Some(12));
        assert!(!row.is_bench);
        assert_eq!(row.at_bats, Some(0));
        assert_eq!(*stats.bulk_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_player_stats_falls_back_to_bench_default() {
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let players = MockPlayerRepository::with_players(vec![make_player(1, PlayerType::Batter)]);
        let service = service_with(
            MockPlayerStatRepository::default(),
            players,
            tournaments,
        );

        let row = service.player_stats(1, 1).await.unwrap();
        assert_eq!(row.id, None);
        assert!(row.is_bench);
        assert_eq!(row.at_bats, Some(0));

        assert!(matches!(
            service.player_stats(1, 99).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lineup_sorting_and_rates() {
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let players = MockPlayerRepository::with_players(vec![
            make_player(1, PlayerType::Batter),
            make_player(2, PlayerType::Batter),
            make_player(3, PlayerType::Batter),
            make_player(4, PlayerType::Pitcher),
            make_player(5, PlayerType::Pitcher),
            make_player(6, PlayerType::Pitcher),
            make_player(7, PlayerType::Pitcher),
        ]);
        let stats = MockPlayerStatRepository::default();
        let service = service_with(stats.clone(), players, tournaments);

        service
            .bulk_update(
                1,
                BulkStatsUpdate {
                    batters: vec![
                        batter_line(1, Some(5)),
                        // player 2 stays benched
                        BatterStatLine {
                            player_id: 2,
                            order: None,
                            at_bats: 0,
                            hits: 0,
                            doubles: 0,
                            triples: 0,
                            home_runs: 0,
                            rbi: 0,
                        },
                        batter_line(3, Some(1)),
                    ],
                    pitchers: vec![
                        PitcherStatLine {
                            player_id: 4,
                            order: Some(12),
                            wins: 1,
                            losses: 0,
                            saves: 8,
                        },
                        PitcherStatLine {
                            player_id: 5,
                            order: Some(8),
                            wins: 2,
                            losses: 2,
                            saves: 0,
                        },
                        PitcherStatLine {
                            player_id: 6,
                            order: Some(2),
                            wins: 6,
                            losses: 2,
                            saves: 0,
                        },
                        // out-of-band order ranks as bench
                        PitcherStatLine {
                            player_id: 7,
                            order: Some(45),
                            wins: 0,
                            losses: 0,
                            saves: 0,
                        },
                    ],
                },
            )
            .await
            .unwrap();

        let lineup = service.lineup(1).await.unwrap();

        let batter_ids: Vec<PlayerId> = lineup.batters.iter().map(|b| b.player_id).collect();
        assert_eq!(batter_ids, vec![3, 1, 2]);
        let pitcher_ids: Vec<PlayerId> = lineup.pitchers.iter().map(|p| p.player_id).collect();
        // starter, reliever, closer, bench
        assert_eq!(pitcher_ids, vec![6, 5, 4, 7]);

        let leadoff = &lineup.batters[0];
        assert_eq!(leadoff.average, 0.5);
        assert_eq!(leadoff.slugging, 0.75);
        assert_eq!(leadoff.ops, 1.25);
        let starter = &lineup.pitchers[0];
        assert_eq!(starter.win_rate, 0.75);
        // benched batter with no at-bats keeps a zero average
        assert_eq!(lineup.batters[2].average, 0.0);
    }

    #[tokio::test]
    async fn test_team_statistics_totals() {
        let tournaments =
            MockTournamentRepository::with_tournaments(vec![make_tournament(1, TournamentType::Cup)]);
        let players = MockPlayerRepository::with_players(vec![
            make_player(1, PlayerType::Batter),
            make_player(2, PlayerType::Batter),
            make_player(3, PlayerType::Pitcher),
        ]);
        let stats = MockPlayerStatRepository::default();
        let service = service_with(stats.clone(), players, tournaments);

        service
            .bulk_update(
                1,
                BulkStatsUpdate {
                    batters: vec![batter_line(1, Some(1)), batter_line(2, Some(2))],
                    pitchers: vec![PitcherStatLine {
                        player_id: 3,
                        order: Some(1),
                        wins: 3,
                        losses: 1,
                        saves: 2,
                    }],
                },
            )
            .await
            .unwrap();

        let summary = service.team_statistics(1).await.unwrap();
        assert_eq!(summary.at_bats, 8);
        assert_eq!(summary.hits, 4);
        assert_eq!(summary.home_runs, 2);
        assert_eq!(summary.rbi, 6);
        assert_eq!(summary.average, 0.5);
        assert_eq!(summary.wins, 3);
        assert_eq!(summary.losses, 1);
        assert_eq!(summary.saves, 2);
        assert_eq!(summary.win_rate, 0.75);
    }

    #[tokio::test]
    async fn test_stats_for_tournament_requires_tournament() {
        let service = service_with(
            MockPlayerStatRepository::default(),
            MockPlayerRepository::default(),
            MockTournamentRepository::default(),
        );
        assert!(matches!(
            service.stats_for_tournament(3).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
