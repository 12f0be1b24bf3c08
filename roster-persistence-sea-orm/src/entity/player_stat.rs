use sea_orm::entity::prelude::*;

/// At most one row per (player_id, tournament_id) pair; the repositories
/// only ever write through find-else-insert, which upholds the invariant.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "player_stats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub player_id: i64,
    pub tournament_id: i64,
    pub position_type: String,
    pub order: Option<i32>,
    pub is_bench: bool,
    pub at_bats: Option<i32>,
    pub hits: Option<i32>,
    pub doubles: Option<i32>,
    pub triples: Option<i32>,
    pub home_runs: Option<i32>,
    pub rbi: Option<i32>,
    pub wins: Option<i32>,
    pub losses: Option<i32>,
    pub saves: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
