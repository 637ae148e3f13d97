#![allow(dead_code)]

use migration::{migrate, MigrationCommand};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

/// Fresh in-memory database with every migration applied.
pub async fn migrated_db() -> Result<DatabaseConnection, Box<dyn std::error::Error>> {
    test_support::logging::init();
    let db = test_support::db::sqlite_memory().await?;
    migrate(&db, MigrationCommand::Up).await?;
    Ok(db)
}

pub async fn exec(db: &DatabaseConnection, sql: &str) -> Result<u64, sea_orm::DbErr> {
    let stmt = Statement::from_string(db.get_database_backend(), sql.to_string());
    Ok(db.execute(stmt).await?.rows_affected())
}

pub async fn insert_salon(db: &DatabaseConnection, slug: &str) -> Result<i64, sea_orm::DbErr> {
    exec(
        db,
        &format!("INSERT INTO salons (name, slug) VALUES ('Salon {slug}', '{slug}')"),
    )
    .await?;
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT id FROM salons WHERE slug = '{slug}'"),
        ))
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound(slug.to_string()))?;
    row.try_get::<i64>("", "id")
}
