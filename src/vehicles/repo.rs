use sqlx::{FromRow, PgExecutor};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{VehicleAttrs, VehicleFilter};

#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    owner_id: Uuid,
    attrs: &VehicleAttrs,
) -> anyhow::Result<VehicleRow> {
    let row = sqlx::query_as::<_, VehicleRow>(
        r#"
        INSERT INTO vehicles (owner_id, brand, model, year, price, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, owner_id, brand, model, year, price, description, created_at
        "#,
    )
    .bind(owner_id)
    .bind(&attrs.brand)
    .bind(&attrs.model)
    .bind(attrs.year)
    .bind(attrs.price)
    .bind(attrs.description.as_deref())
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Lookup scoped to `(vehicle_id, owner_id)`: a vehicle owned by someone
/// else is indistinguishable from a nonexistent one.
pub async fn find_owned(
    db: impl PgExecutor<'_>,
    vehicle_id: Uuid,
    owner_id: Uuid,
) -> anyhow::Result<Option<VehicleRow>> {
    let row = sqlx::query_as::<_, VehicleRow>(
        r#"
        SELECT id, owner_id, brand, model, year, price, description, created_at
        FROM vehicles
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(vehicle_id)
    .bind(owner_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Scalar-attribute update, owner-scoped. Returns the updated row or `None`
/// when the vehicle does not exist for this owner.
pub async fn update_scalars(
    db: impl PgExecutor<'_>,
    vehicle_id: Uuid,
    owner_id: Uuid,
    attrs: &VehicleAttrs,
) -> anyhow::Result<Option<VehicleRow>> {
    let row = sqlx::query_as::<_, VehicleRow>(
        r#"
        UPDATE vehicles
           SET brand = $3, model = $4, year = $5, price = $6, description = $7
         WHERE id = $1 AND owner_id = $2
        RETURNING id, owner_id, brand, model, year, price, description, created_at
        "#,
    )
    .bind(vehicle_id)
    .bind(owner_id)
    .bind(&attrs.brand)
    .bind(&attrs.model)
    .bind(attrs.year)
    .bind(attrs.price)
    .bind(attrs.description.as_deref())
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete_owned(
    db: impl PgExecutor<'_>,
    vehicle_id: Uuid,
    owner_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM vehicles
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(vehicle_id)
    .bind(owner_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

const LIST_WHERE: &str = r#"
        WHERE owner_id = $1
          AND ($2::text IS NULL OR brand ILIKE '%' || $2 || '%')
          AND ($3::text IS NULL OR model ILIKE '%' || $3 || '%')
          AND ($4::int4 IS NULL OR year >= $4)
          AND ($5::int4 IS NULL OR year <= $5)
          AND ($6::float8 IS NULL OR price >= $6)
          AND ($7::float8 IS NULL OR price <= $7)
          AND ($8::text IS NULL OR description ILIKE '%' || $8 || '%')
"#;

pub async fn list_owned(
    db: impl PgExecutor<'_>,
    owner_id: Uuid,
    filter: &VehicleFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<VehicleRow>> {
    let sql = format!(
        r#"
        SELECT id, owner_id, brand, model, year, price, description, created_at
        FROM vehicles
        {LIST_WHERE}
        ORDER BY price DESC
        LIMIT $9 OFFSET $10
        "#
    );
    let rows = sqlx::query_as::<_, VehicleRow>(&sql)
        .bind(owner_id)
        .bind(filter.brand.as_deref())
        .bind(filter.model.as_deref())
        .bind(filter.min_year)
        .bind(filter.max_year)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.keywords.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn count_owned(
    db: impl PgExecutor<'_>,
    owner_id: Uuid,
    filter: &VehicleFilter,
) -> anyhow::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM vehicles {LIST_WHERE}");
    let (total,): (i64,) = sqlx::query_as(&sql)
        .bind(owner_id)
        .bind(filter.brand.as_deref())
        .bind(filter.model.as_deref())
        .bind(filter.min_year)
        .bind(filter.max_year)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.keywords.as_deref())
        .fetch_one(db)
        .await?;
    Ok(total)
}
