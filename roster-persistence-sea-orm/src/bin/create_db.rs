use roster_persistence_sea_orm::{
    create_db_pool,
    entity::{player, player_stat, tournament},
};
use sea_orm::{ConnectionTrait, DatabaseBackend, Schema};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let pool = create_db_pool().await;

    let schema = Schema::new(DatabaseBackend::Sqlite);
    let player_table = schema.create_table_from_entity(player::Entity);
    let tournament_table = schema.create_table_from_entity(tournament::Entity);
    let player_stat_table = schema.create_table_from_entity(player_stat::Entity);

    pool.execute(&player_table)
        .await
        .expect("Failed to create players table");
    pool.execute(&tournament_table)
        .await
        .expect("Failed to create tournaments table");
    pool.execute(&player_stat_table)
        .await
        .expect("Failed to create player stats table");

    println!("Created database tables successfully");
}
