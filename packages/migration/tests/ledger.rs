//! Ledger behaviour against a throwaway SQLite database.

use migration::{
    count_applied_migrations, get_latest_migration_version, migrate, ConnectionTrait,
    MigrationCommand, Migrator, MigratorTrait, SchemaManager,
};
use sea_orm::{DatabaseBackend, Statement};
use test_support::db::sqlite_memory;

#[tokio::test]
async fn up_applies_every_migration_and_records_them() {
    let db = sqlite_memory().await.expect("open sqlite");

    migrate(&db, MigrationCommand::Up).await.expect("up");

    let applied = count_applied_migrations(&db).await.expect("count");
    assert_eq!(applied, Migrator::migrations().len());
    assert_eq!(
        get_latest_migration_version(&db).await.expect("latest"),
        Some("m20250402_000003_message_channels".to_string())
    );

    let manager = SchemaManager::new(&db);
    for table in [
        "salons",
        "admins",
        "employees",
        "users",
        "schedules",
        "messages",
        "salon_translations",
    ] {
        assert!(manager.has_table(table).await.unwrap(), "{table} missing");
    }
    assert!(manager.has_column("salons", "working_hours").await.unwrap());
    assert!(manager.has_column("messages", "read_at").await.unwrap());
}

#[tokio::test]
async fn running_up_twice_is_a_no_op() {
    let db = sqlite_memory().await.expect("open sqlite");

    migrate(&db, MigrationCommand::Up).await.expect("first up");
    migrate(&db, MigrationCommand::Up).await.expect("second up");

    assert_eq!(
        count_applied_migrations(&db).await.unwrap(),
        Migrator::migrations().len()
    );
}

#[tokio::test]
async fn ledger_is_empty_before_first_run() {
    let db = sqlite_memory().await.expect("open sqlite");

    assert_eq!(count_applied_migrations(&db).await.unwrap(), 0);
    assert_eq!(get_latest_migration_version(&db).await.unwrap(), None);
}

#[tokio::test]
async fn reset_rolls_everything_back() {
    let db = sqlite_memory().await.expect("open sqlite");

    migrate(&db, MigrationCommand::Up).await.expect("up");
    migrate(&db, MigrationCommand::Reset).await.expect("reset");

    assert_eq!(count_applied_migrations(&db).await.unwrap(), 0);
    let manager = SchemaManager::new(&db);
    assert!(!manager.has_table("salons").await.unwrap());
}

#[tokio::test]
async fn settings_migration_backfills_rows_created_before_it() {
    let db = sqlite_memory().await.expect("open sqlite");

    // Bring the schema to the baseline only, then insert a legacy row.
    Migrator::up(&db, Some(1)).await.expect("baseline");
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "INSERT INTO salons (name, slug) VALUES ('Legacy', 'legacy')",
    ))
    .await
    .expect("insert legacy salon");

    Migrator::up(&db, None).await.expect("remaining");

    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT working_hours, booking_settings FROM salons WHERE slug = 'legacy'",
        ))
        .await
        .unwrap()
        .expect("legacy row");
    let hours: String = row.try_get("", "working_hours").unwrap();
    let booking: String = row.try_get("", "booking_settings").unwrap();
    assert!(hours.contains("\"monday\""));
    assert!(booking.contains("slot_minutes"));
}

#[tokio::test]
async fn column_added_out_of_band_does_not_break_the_ledger() {
    let db = sqlite_memory().await.expect("open sqlite");

    Migrator::up(&db, Some(2)).await.expect("first two");
    // Simulates a one-off script that already added the column by hand.
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "ALTER TABLE messages ADD COLUMN channel TEXT NOT NULL DEFAULT 'sms'",
    ))
    .await
    .expect("manual alter");

    Migrator::up(&db, None).await.expect("third migration tolerates it");
    assert_eq!(count_applied_migrations(&db).await.unwrap(), 3);
}
