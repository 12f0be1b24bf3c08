use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "players")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub position: String,
    pub series: Option<String>,
    #[sea_orm(column_name = "type")]
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
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
