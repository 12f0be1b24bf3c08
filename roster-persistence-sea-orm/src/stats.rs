use chrono::{DateTime, Utc};
use roster_core::PlayerType;
use roster_server_domain::{
    PlayerId, ServiceError, ServiceResult, TournamentId,
    stat::{BatterStatLine, PitcherStatLine, PlayerStat, PlayerStatRepository},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, TransactionError, TransactionTrait,
};

use crate::{create_db_pool, entity::player_stat};

pub struct PlayerStatRepositoryImpl {
    db: DatabaseConnection,
}

impl PlayerStatRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    fn model_to_stat(model: player_stat::Model) -> ServiceResult<PlayerStat> {
        let position_type = PlayerType::parse(&model.position_type).ok_or_else(|| {
            ServiceError::Internal(format!(
                "invalid position type '{}' for stat row {}",
                model.position_type, model.id
            ))
        })?;
        Ok(PlayerStat {
            id: Some(model.id),
            player_id: model.player_id,
            tournament_id: model.tournament_id,
            position_type,
            order: model.order.map(|v| v as u32),
            is_bench: model.is_bench,
            at_bats: model.at_bats.map(|v| v as u32),
            hits: model.hits.map(|v| v as u32),
            doubles: model.doubles.map(|v| v as u32),
            triples: model.triples.map(|v| v as u32),
            home_runs: model.home_runs.map(|v| v as u32),
            rbi: model.rbi.map(|v| v as u32),
            wins: model.wins.map(|v| v as u32),
            losses: model.losses.map(|v| v as u32),
            saves: model.saves.map(|v| v as u32),
            created_at: Some(model.created_at),
            updated_at: Some(model.updated_at),
        })
    }

    /// Find-else-insert keyed by (player_id, tournament_id). Updates leave
    /// `position_type` and `created_at` as they were.
    async fn upsert_row(
        c: &DatabaseTransaction,
        row: PlayerStat,
        now: DateTime<Utc>,
    ) -> Result<player_stat::Model, ServiceError> {
        let existing = player_stat::Entity::find()
            .filter(player_stat::Column::PlayerId.eq(row.player_id))
            .filter(player_stat::Column::TournamentId.eq(row.tournament_id))
            .one(c)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let model = match existing {
            Some(model) => {
                let mut model: player_stat::ActiveModel = model.into();
                model.order = Set(row.order.map(|v| v as i32));
                model.is_bench = Set(row.is_bench);
                model.at_bats = Set(row.at_bats.map(|v| v as i32));
                model.hits = Set(row.hits.map(|v| v as i32));
                model.doubles = Set(row.doubles.map(|v| v as i32));
                model.triples = Set(row.triples.map(|v| v as i32));
                model.home_runs = Set(row.home_runs.map(|v| v as i32));
                model.rbi = Set(row.rbi.map(|v| v as i32));
                model.wins = Set(row.wins.map(|v| v as i32));
                model.losses = Set(row.losses.map(|v| v as i32));
                model.saves = Set(row.saves.map(|v| v as i32));
                model.updated_at = Set(now);
                model
                    .update(c)
                    .await
                    .map_err(|e| ServiceError::Internal(e.to_string()))?
            }
            None => player_stat::ActiveModel {
                id: NotSet,
                player_id: Set(row.player_id),
                tournament_id: Set(row.tournament_id),
                position_type: Set(row.position_type.as_str().to_string()),
                order: Set(row.order.map(|v| v as i32)),
                is_bench: Set(row.is_bench),
                at_bats: Set(row.at_bats.map(|v| v as i32)),
                hits: Set(row.hits.map(|v| v as i32)),
                doubles: Set(row.doubles.map(|v| v as i32)),
                triples: Set(row.triples.map(|v| v as i32)),
                home_runs: Set(row.home_runs.map(|v| v as i32)),
                rbi: Set(row.rbi.map(|v| v as i32)),
                wins: Set(row.wins.map(|v| v as i32)),
                losses: Set(row.losses.map(|v| v as i32)),
                saves: Set(row.saves.map(|v| v as i32)),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(c)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?,
        };
        Ok(model)
    }
}

#[async_trait::async_trait]
impl PlayerStatRepository for PlayerStatRepositoryImpl {
    async fn get_stats_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> ServiceResult<Vec<PlayerStat>> {
        let models = player_stat::Entity::find()
            .filter(player_stat::Column::TournamentId.eq(tournament_id))
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        models.into_iter().map(Self::model_to_stat).collect()
    }

    async fn get_stat_by_pair(
        &self,
        player_id: PlayerId,
        tournament_id: TournamentId,
    ) -> ServiceResult<Option<PlayerStat>> {
        let model = player_stat::Entity::find()
            .filter(player_stat::Column::PlayerId.eq(player_id))
            .filter(player_stat::Column::TournamentId.eq(tournament_id))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        model.map(Self::model_to_stat).transpose()
    }

    async fn bulk_upsert(
        &self,
        tournament_id: TournamentId,
        batters: &[BatterStatLine],
        pitchers: &[PitcherStatLine],
    ) -> ServiceResult<(Vec<PlayerStat>, Vec<PlayerStat>)> {
        let batters = batters.to_vec();
        let pitchers = pitchers.to_vec();

        let res = self
            .db
            .transaction::<_, (Vec<player_stat::Model>, Vec<player_stat::Model>), ServiceError>(
                |c| {
                    Box::pin(async move {
                        let now = Utc::now();
                        let mut batter_models = Vec::with_capacity(batters.len());
                        for line in &batters {
                            batter_models
                                .push(Self::upsert_row(c, line.to_row(tournament_id), now).await?);
                        }
                        let mut pitcher_models = Vec::with_capacity(pitchers.len());
                        for line in &pitchers {
                            pitcher_models
                                .push(Self::upsert_row(c, line.to_row(tournament_id), now).await?);
                        }
                        Ok((batter_models, pitcher_models))
                    })
                },
            )
            .await;

        let (batter_models, pitcher_models) = match res {
            Ok(models) => models,
            Err(TransactionError::Transaction(e)) => return Err(e),
            Err(TransactionError::Connection(e)) => {
                return Err(ServiceError::Internal(e.to_string()));
            }
        };

        Ok((
            batter_models
                .into_iter()
                .map(Self::model_to_stat)
                .collect::<ServiceResult<Vec<_>>>()?,
            pitcher_models
                .into_iter()
                .map(Self::model_to_stat)
                .collect::<ServiceResult<Vec<_>>>()?,
        ))
    }
}
