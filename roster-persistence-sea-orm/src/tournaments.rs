use chrono::Utc;
use roster_server_domain::{
    ServiceError, ServiceResult, TournamentId,
    tournament::{
        NewTournament, Tournament, TournamentRepository, TournamentType, TournamentUpdate,
    },
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};

use crate::{
    create_db_pool,
    entity::{player_stat, tournament},
};

pub struct TournamentRepositoryImpl {
    db: DatabaseConnection,
}

impl TournamentRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    fn model_to_tournament(model: tournament::Model) -> ServiceResult<Tournament> {
        let tournament_type = TournamentType::parse(&model.tournament_type).ok_or_else(|| {
            ServiceError::Internal(format!(
                "invalid tournament type '{}' for tournament {}",
                model.tournament_type, model.id
            ))
        })?;
        Ok(Tournament {
            id: model.id,
            name: model.name,
            tournament_type,
            start_date: model.start_date,
            end_date: model.end_date,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[async_trait::async_trait]
impl TournamentRepository for TournamentRepositoryImpl {
    async fn get_tournaments(
        &self,
        tournament_type: Option<TournamentType>,
    ) -> ServiceResult<Vec<Tournament>> {
        let mut query = tournament::Entity::find();
        if let Some(ty) = tournament_type {
            query = query.filter(tournament::Column::TournamentType.eq(ty.as_str()));
        }
        let models = query
            .order_by_desc(tournament::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        models.into_iter().map(Self::model_to_tournament).collect()
    }

    async fn get_tournament_by_id(&self, id: TournamentId) -> ServiceResult<Option<Tournament>> {
        let model = tournament::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        model.map(Self::model_to_tournament).transpose()
    }

    async fn create_tournament(&self, new_tournament: &NewTournament) -> ServiceResult<Tournament> {
        let now = Utc::now();
        let model = tournament::ActiveModel {
            id: NotSet,
            name: Set(new_tournament.name.clone()),
            tournament_type: Set(new_tournament.tournament_type.as_str().to_string()),
            start_date: Set(new_tournament.start_date),
            end_date: Set(new_tournament.end_date),
            description: Set(new_tournament.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Self::model_to_tournament(model)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        update: &TournamentUpdate,
    ) -> ServiceResult<Option<Tournament>> {
        let Some(model) = tournament::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut model: tournament::ActiveModel = model.into();
        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(ty) = update.tournament_type {
            model.tournament_type = Set(ty.as_str().to_string());
        }
        if let Some(start_date) = update.start_date {
            model.start_date = Set(start_date);
        }
        if let Some(end_date) = update.end_date {
            model.end_date = Set(Some(end_date));
        }
        if let Some(description) = &update.description {
            model.description = Set(Some(description.clone()));
        }
        model.updated_at = Set(Utc::now());

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Self::model_to_tournament(updated).map(Some)
    }

    async fn delete_tournament(&self, id: TournamentId) -> ServiceResult<bool> {
        let Some(model) = tournament::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?
        else {
            return Ok(false);
        };

        // stat rows go with the tournament, players stay
        let res = self
            .db
            .transaction::<_, (), ServiceError>(|c| {
                Box::pin(async move {
                    player_stat::Entity::delete_many()
                        .filter(player_stat::Column::TournamentId.eq(id))
                        .exec(c)
                        .await
                        .map_err(|e| ServiceError::Internal(e.to_string()))?;
                    model
                        .delete(c)
                        .await
                        .map_err(|e| ServiceError::Internal(e.to_string()))?;
                    Ok(())
                })
            })
            .await;

        match res {
            Ok(()) => Ok(true),
            Err(TransactionError::Transaction(e)) => Err(e),
            Err(TransactionError::Connection(e)) => Err(ServiceError::Internal(e.to_string())),
        }
    }
}
