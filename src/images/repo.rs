use sqlx::{FromRow, PgExecutor};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub name: String,
    pub url: String,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    vehicle_id: Uuid,
    name: &str,
    url: &str,
) -> anyhow::Result<ImageRow> {
    let image = sqlx::query_as::<_, ImageRow>(
        r#"
        INSERT INTO images (vehicle_id, name, url)
        VALUES ($1, $2, $3)
        RETURNING id, vehicle_id, name, url, created_at
        "#,
    )
    .bind(vehicle_id)
    .bind(name)
    .bind(url)
    .fetch_one(db)
    .await?;
    Ok(image)
}

/// Delete scoped to the owning vehicle: an id belonging to another vehicle
/// affects zero rows, indistinguishable from a nonexistent image.
pub async fn delete_scoped(
    db: impl PgExecutor<'_>,
    image_id: Uuid,
    vehicle_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM images
        WHERE id = $1 AND vehicle_id = $2
        "#,
    )
    .bind(image_id)
    .bind(vehicle_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Batch variant for listings: one query for all vehicles on a page.
pub async fn list_by_vehicles(
    db: impl PgExecutor<'_>,
    vehicle_ids: &[Uuid],
) -> anyhow::Result<Vec<ImageRow>> {
    let rows = sqlx::query_as::<_, ImageRow>(
        r#"
        SELECT id, vehicle_id, name, url, created_at
        FROM images
        WHERE vehicle_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(vehicle_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_by_vehicle(
    db: impl PgExecutor<'_>,
    vehicle_id: Uuid,
) -> anyhow::Result<Vec<ImageRow>> {
    let rows = sqlx::query_as::<_, ImageRow>(
        r#"
        SELECT id, vehicle_id, name, url, created_at
        FROM images
        WHERE vehicle_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(vehicle_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
