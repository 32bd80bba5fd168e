use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::products::query::{ProductFilter, SortField, SortOrder};

/// Body for POST /products. All fields required; unknown fields rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        check_non_empty(&mut violations, "Name", &self.name);
        check_non_empty(&mut violations, "Description", &self.description);
        check_non_empty(&mut violations, "Category", &self.category);
        check_price(&mut violations, self.price);
        check_rating(&mut violations, self.rating);
        violations
    }
}

/// Body for PATCH /products/:id. Any subset of the create fields.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
}

impl UpdateProductRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.rating.is_none()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if let Some(name) = &self.name {
            check_non_empty(&mut violations, "Name", name);
        }
        if let Some(description) = &self.description {
            check_non_empty(&mut violations, "Description", description);
        }
        if let Some(category) = &self.category {
            check_non_empty(&mut violations, "Category", category);
        }
        if let Some(price) = self.price {
            check_price(&mut violations, price);
        }
        if let Some(rating) = self.rating {
            check_rating(&mut violations, rating);
        }
        violations
    }
}

/// Query parameters for GET /products.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ProductQuery {
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for (label, value) in [("minPrice", self.min_price), ("maxPrice", self.max_price)] {
            if let Some(v) = value {
                if !(v >= 0.0) {
                    violations.push(format!("{label} cannot be negative"));
                }
            }
        }
        for (label, value) in [("minRating", self.min_rating), ("maxRating", self.max_rating)] {
            if let Some(v) = value {
                if !(0.0..=5.0).contains(&v) {
                    violations.push(format!("{label} must be between 0 and 5"));
                }
            }
        }
        if let Some(page) = self.page {
            if page < 1 {
                violations.push("page must be 1 or greater".into());
            }
        }
        if let Some(limit) = self.limit {
            if limit < 1 {
                violations.push("limit must be 1 or greater".into());
            }
        }
        violations
    }

    /// Apply defaults and produce the typed filter. Call `validate` first.
    pub fn into_filter(self) -> ProductFilter {
        ProductFilter {
            category: self.category,
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            max_rating: self.max_rating,
            search: self.search,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(10),
        }
    }
}

/// Body returned by DELETE /products/:id.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    #[serde(rename = "_id")]
    pub id: Uuid,
}

fn check_non_empty(violations: &mut Vec<String>, label: &str, value: &str) {
    if value.trim().is_empty() {
        violations.push(format!("{label} cannot be empty"));
    }
}

fn check_price(violations: &mut Vec<String>, price: f64) {
    if !(price >= 0.0) {
        violations.push("Price cannot be negative".into());
    }
}

fn check_rating(violations: &mut Vec<String>, rating: f64) {
    if !(0.0..=5.0).contains(&rating) {
        violations.push("Rating must be between 0 and 5".into());
    }
}
