use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

const SELECT_COLUMNS: &str =
    "SELECT id, name, description, category, price, rating, created_at, updated_at FROM products";

/// Fields the listing can be sorted by. Serialized names match the query
/// parameter values (`sortBy=createdAt` etc.).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Price,
    Rating,
    Category,
    #[default]
    CreatedAt,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::Category => "category",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => " ASC",
            Self::Desc => " DESC",
        }
    }
}

/// Validated listing criteria. Each optional constraint maps to one SQL
/// predicate; supplied constraints are composed conjunctively. Sort and
/// pagination always carry explicit values (defaults applied upstream).
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            min_price: None,
            max_price: None,
            min_rating: None,
            max_rating: None,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: 10,
        }
    }
}

impl ProductFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Build the full SELECT for one page of results.
    pub fn select_page(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(SELECT_COLUMNS);
        let mut sep = " WHERE ";

        if let Some(category) = &self.category {
            qb.push(sep);
            sep = " AND ";
            qb.push("LOWER(category) = LOWER(");
            qb.push_bind(category.clone());
            qb.push(")");
        }
        if let Some(min) = self.min_price {
            qb.push(sep);
            sep = " AND ";
            qb.push("price >= ");
            qb.push_bind(min);
        }
        if let Some(max) = self.max_price {
            qb.push(sep);
            sep = " AND ";
            qb.push("price <= ");
            qb.push_bind(max);
        }
        if let Some(min) = self.min_rating {
            qb.push(sep);
            sep = " AND ";
            qb.push("rating >= ");
            qb.push_bind(min);
        }
        if let Some(max) = self.max_rating {
            qb.push(sep);
            sep = " AND ";
            qb.push("rating <= ");
            qb.push_bind(max);
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = format!("%{}%", escape_like(search));
            qb.push(sep);
            qb.push("(name ILIKE ");
            qb.push_bind(needle.clone());
            qb.push(" ESCAPE '\\' OR description ILIKE ");
            qb.push_bind(needle);
            qb.push(" ESCAPE '\\')");
        }

        qb.push(" ORDER BY ");
        qb.push(self.sort_by.column());
        qb.push(self.sort_order.keyword());
        qb.push(" LIMIT ");
        qb.push_bind(self.limit);
        qb.push(" OFFSET ");
        qb.push_bind(self.offset());
        qb
    }
}

/// Make LIKE wildcards in user input match literally.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
