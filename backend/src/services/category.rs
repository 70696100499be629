//! Category service

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::Category;

use crate::error::{AppError, AppResult};
use crate::services::product::get_or_create_category;

/// Category service
#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

/// Input for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
}

/// Category with its live product count
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    product_count: i64,
}

impl CategoryRow {
    fn into_response(self) -> CategoryResponse {
        CategoryResponse {
            category: Category {
                id: self.id,
                name: self.name,
            },
            product_count: self.product_count,
        }
    }
}

impl CategoryService {
    /// Create a new CategoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All categories ordered by name, with product counts
    pub async fn list(&self) -> AppResult<Vec<CategoryResponse>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT c.id, c.name,
                   COUNT(p.id) FILTER (WHERE p.is_deleted = FALSE)::bigint AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(CategoryRow::into_response).collect())
    }

    /// Create a category. Categories are get-or-create by name, so posting
    /// an existing name returns the existing row.
    pub async fn create(&self, input: CreateCategoryInput) -> AppResult<CategoryResponse> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name cannot be empty".to_string(),
                message_th: "ต้องระบุชื่อหมวดหมู่".to_string(),
            });
        }

        let id = get_or_create_category(&self.db, name).await?;
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT c.id, c.name,
                   COUNT(p.id) FILTER (WHERE p.is_deleted = FALSE)::bigint AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            WHERE c.id = $1
            GROUP BY c.id, c.name
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into_response())
    }
}
