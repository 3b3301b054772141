use crate::{
    adapters::persistence::PostgresPersistence,
    infra::db::{init_db, run_migrations},
};

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod http_client;
pub mod paddle_client;
pub mod setup;

pub async fn postgres_persistence(database_url: &str) -> anyhow::Result<PostgresPersistence> {
    let pool = init_db(database_url).await?;
    run_migrations(&pool).await?;
    let persistence = PostgresPersistence::new(pool);
    Ok(persistence)
}
