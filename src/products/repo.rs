use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::products::{
    dto::{CreateProductRequest, UpdateProductRequest},
    query::ProductFilter,
};

const RETURNING_COLUMNS: &str =
    "id, name, description, category, price, rating, created_at, updated_at";

/// Product record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Product {
    pub async fn create(db: &PgPool, fields: &CreateProductRequest) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, category, price, rating)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, category, price, rating, created_at, updated_at
            "#,
        )
        .bind(fields.name.trim())
        .bind(fields.description.trim())
        .bind(fields.category.trim())
        .bind(fields.price)
        .bind(fields.rating)
        .fetch_one(db)
        .await?;
        Ok(product)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category, price, rating, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    pub async fn list(db: &PgPool, filter: &ProductFilter) -> anyhow::Result<Vec<Product>> {
        let rows = filter
            .select_page()
            .build_query_as::<Product>()
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    /// Apply only the supplied fields; `updated_at` is refreshed either way.
    /// Returns None when the id does not exist.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        patch: &UpdateProductRequest,
    ) -> anyhow::Result<Option<Product>> {
        let updated = update_query(id, patch)
            .build_query_as::<Product>()
            .fetch_optional(db)
            .await?;
        Ok(updated)
    }

    /// Returns false when the id does not exist.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn update_query(id: Uuid, patch: &UpdateProductRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE products SET updated_at = now()");
    if let Some(name) = &patch.name {
        qb.push(", name = ");
        qb.push_bind(name.trim().to_string());
    }
    if let Some(description) = &patch.description {
        qb.push(", description = ");
        qb.push_bind(description.trim().to_string());
    }
    if let Some(category) = &patch.category {
        qb.push(", category = ");
        qb.push_bind(category.trim().to_string());
    }
    if let Some(price) = patch.price {
        qb.push(", price = ");
        qb.push_bind(price);
    }
    if let Some(rating) = patch.rating {
        qb.push(", rating = ");
        qb.push_bind(rating);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING ");
    qb.push(RETURNING_COLUMNS);
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::dto::UpdateProductRequest;

    #[test]
    fn product_serializes_with_camel_case_timestamps() {
        let product = Product {
            id: Uuid::new_v4(),
            name: "Espresso grinder".into(),
            description: "Conical burr".into(),
            category: "Kitchen".into(),
            price: 199.0,
            rating: 4.8,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&product).unwrap();
        assert!(json.contains("createdAt"));
        assert!(json.contains("updatedAt"));
        assert!(!json.contains("created_at"));
    }

    #[test]
    fn update_query_includes_only_supplied_fields() {
        let patch = UpdateProductRequest {
            price: Some(12.5),
            ..Default::default()
        };
        let sql = update_query(Uuid::new_v4(), &patch).sql().to_string();
        assert!(sql.contains("updated_at = now()"));
        assert!(sql.contains("price = $1"));
        assert!(sql.contains("WHERE id = $2"));
        assert!(!sql.contains("name ="));
        assert!(!sql.contains("rating ="));
    }

    #[test]
    fn update_query_with_full_patch_binds_every_field() {
        let patch = UpdateProductRequest {
            name: Some("New name".into()),
            description: Some("New description".into()),
            category: Some("Books".into()),
            price: Some(1.0),
            rating: Some(5.0),
        };
        let sql = update_query(Uuid::new_v4(), &patch).sql().to_string();
        assert!(sql.contains("name = $1"));
        assert!(sql.contains("description = $2"));
        assert!(sql.contains("category = $3"));
        assert!(sql.contains("price = $4"));
        assert!(sql.contains("rating = $5"));
        assert!(sql.contains("WHERE id = $6"));
    }
}
