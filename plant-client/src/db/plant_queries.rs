use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::domain::{BoundingBox, PlantRecord};

/// Rows per multi-row `INSERT` when the caller does not choose.
const INSERT_CHUNK_ROWS: usize = 500;

/// Seven bound parameters per row must stay under SQLite's host-parameter limit.
const MAX_CHUNK_ROWS: usize = 32766 / 7;

async fn recreate_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("DROP TABLE IF EXISTS power_plants")
        .execute(&mut *conn)
        .await?;

    // No uniqueness constraint on plant_id: duplicates are a health-check
    // concern, and suspect data may still be loaded when that check is waived.
    sqlx::query(
        r#"
        CREATE TABLE power_plants (
            plant_id INTEGER NOT NULL,
            plant_name TEXT NOT NULL,
            state TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            annual_net_generation REAL NOT NULL,
            annual_net_generation_percentage REAL NOT NULL
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query("CREATE INDEX idx_power_plants_plant_id ON power_plants (plant_id)")
        .execute(&mut *conn)
        .await?;
    sqlx::query("CREATE INDEX idx_power_plants_state ON power_plants (state)")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn insert_chunks(
    conn: &mut SqliteConnection,
    records: &[PlantRecord],
    chunk_rows: usize,
) -> Result<u64> {
    let mut written = 0;

    for chunk in records.chunks(chunk_rows.clamp(1, MAX_CHUNK_ROWS)) {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO power_plants (plant_id, plant_name, state, latitude, longitude, annual_net_generation, annual_net_generation_percentage) ",
        );

        builder.push_values(chunk, |mut b, p| {
            b.push_bind(p.plant_id)
                .push_bind(&p.plant_name)
                .push_bind(&p.state)
                .push_bind(p.latitude)
                .push_bind(p.longitude)
                .push_bind(p.annual_net_generation)
                .push_bind(p.annual_net_generation_percentage);
        });

        written += builder.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(written)
}

/// Drop and recreate the `power_plants` table. Safe on a fresh database.
pub async fn reset(pool: &SqlitePool) -> Result<()> {
    let mut conn = pool.acquire().await?;
    recreate_table(&mut conn).await
}

/// Append `records` in a single transaction. Returns the number of rows written.
pub async fn insert_all(pool: &SqlitePool, records: &[PlantRecord]) -> Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let written = insert_chunks(&mut tx, records, INSERT_CHUNK_ROWS).await?;
    tx.commit().await?;
    Ok(written)
}

/// Recreate the table and load `records` in one transaction, `chunk_rows`
/// rows per `INSERT`. On any error the previous contents are left untouched.
pub async fn replace_all(
    pool: &SqlitePool,
    records: &[PlantRecord],
    chunk_rows: usize,
) -> Result<u64> {
    let mut tx = pool.begin().await?;
    recreate_table(&mut tx).await?;
    let written = insert_chunks(&mut tx, records, chunk_rows).await?;
    tx.commit().await?;
    Ok(written)
}

/// Look up a plant by id. When duplicates were loaded, the first inserted row wins.
pub async fn get_by_id(pool: &SqlitePool, plant_id: i64) -> Result<Option<PlantRecord>> {
    let row = sqlx::query_as::<_, PlantRecord>(
        r#"
        SELECT
            plant_id,
            plant_name,
            state,
            latitude,
            longitude,
            annual_net_generation,
            annual_net_generation_percentage
        FROM power_plants
        WHERE plant_id = ?
        ORDER BY rowid
        LIMIT 1
        "#,
    )
    .bind(plant_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Exact, case-sensitive match on the state code.
pub async fn get_by_state(pool: &SqlitePool, state: &str) -> Result<Vec<PlantRecord>> {
    let rows = sqlx::query_as::<_, PlantRecord>(
        r#"
        SELECT
            plant_id,
            plant_name,
            state,
            latitude,
            longitude,
            annual_net_generation,
            annual_net_generation_percentage
        FROM power_plants
        WHERE state = ?
        ORDER BY rowid
        "#,
    )
    .bind(state)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every plant whose coordinates fall inside `bbox` (edges inclusive).
pub async fn get_in_area(pool: &SqlitePool, bbox: &BoundingBox) -> Result<Vec<PlantRecord>> {
    let rows = sqlx::query_as::<_, PlantRecord>(
        r#"
        SELECT
            plant_id,
            plant_name,
            state,
            latitude,
            longitude,
            annual_net_generation,
            annual_net_generation_percentage
        FROM power_plants
        WHERE latitude BETWEEN ? AND ?
          AND longitude BETWEEN ? AND ?
        ORDER BY rowid
        "#,
    )
    .bind(bbox.min_latitude)
    .bind(bbox.max_latitude)
    .bind(bbox.min_longitude)
    .bind(bbox.max_longitude)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM power_plants")
        .fetch_one(pool)
        .await?;
    Ok(n)
}
