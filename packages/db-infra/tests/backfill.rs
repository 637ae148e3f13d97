mod common;

use db_infra::infra::db::backfill::{backfill, BackfillSpec};
use db_infra::infra::db::inspect::run_select;

use crate::common::{exec, insert_salon, migrated_db};

#[tokio::test]
async fn second_backfill_touches_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let db = migrated_db().await?;
    insert_salon(&db, "north").await?;
    insert_salon(&db, "south").await?;
    insert_salon(&db, "east").await?;
    exec(&db, "UPDATE salons SET phone = NULL WHERE slug = 'north'").await?;
    exec(&db, "UPDATE salons SET phone = '' WHERE slug = 'south'").await?;
    exec(&db, "UPDATE salons SET phone = '555-0100' WHERE slug = 'east'").await?;

    let spec = BackfillSpec::new("salons", "phone", "'n/a'").or_equal_to("''");
    assert_eq!(backfill(&db, &spec).await?, 2);
    assert_eq!(backfill(&db, &spec).await?, 0);

    let rows = run_select(&db, "SELECT slug, phone FROM salons ORDER BY slug").await?;
    let phones: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r["slug"].as_str().unwrap(), r["phone"].as_str().unwrap()))
        .collect();
    assert_eq!(
        phones,
        vec![("east", "555-0100"), ("north", "n/a"), ("south", "n/a")]
    );
    Ok(())
}

#[tokio::test]
async fn null_only_backfill_leaves_empty_strings() -> Result<(), Box<dyn std::error::Error>> {
    let db = migrated_db().await?;
    insert_salon(&db, "west").await?;
    exec(&db, "UPDATE salons SET email = '' WHERE slug = 'west'").await?;

    let spec = BackfillSpec::new("salons", "email", "'front@salon.test'");
    assert_eq!(backfill(&db, &spec).await?, 0);
    Ok(())
}
