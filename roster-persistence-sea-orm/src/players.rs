use chrono::{DateTime, Utc};
use roster_core::PlayerType;
use roster_server_domain::{
    PlayerId, ServiceError, ServiceResult, TournamentId,
    player::{BatterRatings, NewPlayer, PitcherRatings, Player, PlayerRepository},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, EntityTrait, Set, TransactionError,
    TransactionTrait,
};

use crate::{
    create_db_pool,
    entity::{player, player_stat},
};

pub struct PlayerRepositoryImpl {
    db: DatabaseConnection,
}

impl PlayerRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    fn model_to_player(model: player::Model) -> ServiceResult<Player> {
        let player_type = PlayerType::parse(&model.player_type).ok_or_else(|| {
            ServiceError::Internal(format!(
                "invalid player type '{}' for player {}",
                model.player_type, model.id
            ))
        })?;
        let batting = (player_type == PlayerType::Batter).then(|| BatterRatings {
            average: model.average,
            trajectory: model.trajectory.clone(),
            meet: model.meet,
            power: model.power,
            speed: model.speed,
        });
        let pitching = (player_type == PlayerType::Pitcher).then(|| PitcherRatings {
            era: model.era,
            velocity: model.velocity,
            control: model.control,
            stamina: model.stamina,
        });
        Ok(Player {
            id: model.id,
            name: model.name,
            position: model.position,
            series: model.series,
            player_type,
            spirit: model.spirit,
            limit_break: model.limit_break,
            skill1: model.skill1,
            skill2: model.skill2,
            skill3: model.skill3,
            batting,
            pitching,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    fn new_player_to_model(player: &NewPlayer, now: DateTime<Utc>) -> player::ActiveModel {
        let batting = player.batting.clone().unwrap_or_default();
        let pitching = player.pitching.clone().unwrap_or_default();
        player::ActiveModel {
            id: NotSet,
            name: Set(player.name.clone()),
            position: Set(player.position.clone()),
            series: Set(player.series.clone()),
            player_type: Set(player.player_type.as_str().to_string()),
            spirit: Set(player.spirit),
            limit_break: Set(player.limit_break),
            skill1: Set(player.skill1.clone()),
            skill2: Set(player.skill2.clone()),
            skill3: Set(player.skill3.clone()),
            average: Set(batting.average),
            trajectory: Set(batting.trajectory),
            meet: Set(batting.meet),
            power: Set(batting.power),
            speed: Set(batting.speed),
            era: Set(pitching.era),
            velocity: Set(pitching.velocity),
            control: Set(pitching.control),
            stamina: Set(pitching.stamina),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

#[async_trait::async_trait]
impl PlayerRepository for PlayerRepositoryImpl {
    async fn get_players(&self) -> ServiceResult<Vec<Player>> {
        let models = player::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        models.into_iter().map(Self::model_to_player).collect()
    }

    async fn get_player_by_id(&self, id: PlayerId) -> ServiceResult<Option<Player>> {
        let model = player::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        model.map(Self::model_to_player).transpose()
    }

    async fn create_player_with_stats(
        &self,
        new_player: &NewPlayer,
        tournament_ids: &[TournamentId],
    ) -> ServiceResult<Player> {
        let new_player = new_player.clone();
        let tournament_ids = tournament_ids.to_vec();
        let now = Utc::now();

        let res = self
            .db
            .transaction::<_, player::Model, ServiceError>(|c| {
                Box::pin(async move {
                    let inserted = Self::new_player_to_model(&new_player, now)
                        .insert(c)
                        .await
                        .map_err(|e| ServiceError::Internal(e.to_string()))?;

                    for tournament_id in tournament_ids {
                        player_stat::ActiveModel {
                            id: NotSet,
                            player_id: Set(inserted.id),
                            tournament_id: Set(tournament_id),
                            position_type: Set(new_player.player_type.as_str().to_string()),
                            order: Set(None),
                            is_bench: Set(true),
                            at_bats: Set(None),
                            hits: Set(None),
                            doubles: Set(None),
                            triples: Set(None),
                            home_runs: Set(None),
                            rbi: Set(None),
                            wins: Set(None),
                            losses: Set(None),
                            saves: Set(None),
                            created_at: Set(now),
                            updated_at: Set(now),
                        }
                        .insert(c)
                        .await
                        .map_err(|e| ServiceError::Internal(e.to_string()))?;
                    }

                    Ok(inserted)
                })
            })
            .await;

        match res {
            Ok(model) => Self::model_to_player(model),
            Err(TransactionError::Transaction(e)) => Err(e),
            Err(TransactionError::Connection(e)) => Err(ServiceError::Internal(e.to_string())),
        }
    }
}
