use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    products::{
        dto::{CreateProductRequest, DeleteResponse, ProductQuery, UpdateProductRequest},
        repo::Product,
    },
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let violations = payload.validate();
    if !violations.is_empty() {
        warn!(?violations, "create product validation failed");
        return Err(ApiError::Validation(violations));
    }

    let product = Product::create(&state.db, &payload).await?;
    info!(product_id = %product.id, %user_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let violations = query.validate();
    if !violations.is_empty() {
        warn!(?violations, "list products validation failed");
        return Err(ApiError::Validation(violations));
    }

    let products = Product::list(&state.db, &query.into_filter()).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(product))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let violations = payload.validate();
    if !violations.is_empty() {
        warn!(?violations, %id, "update product validation failed");
        return Err(ApiError::Validation(violations));
    }

    // An empty patch is a read: return the record as-is, 404 if absent.
    let product = if payload.is_empty() {
        Product::find_by_id(&state.db, id).await?
    } else {
        Product::update(&state.db, id, &payload).await?
    }
    .ok_or_else(|| not_found(id))?;

    info!(product_id = %id, %user_id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !Product::delete(&state.db, id).await? {
        return Err(not_found(id));
    }
    info!(product_id = %id, %user_id, "product deleted");
    Ok(Json(DeleteResponse { deleted: true, id }))
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::not_found(format!("Product with ID \"{id}\" not found"))
}
