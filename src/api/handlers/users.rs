//! Handlers for user profiles, balances and collections.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::pagination::PaginationParams;
use crate::api::dto::user::{
    CollectionItemDto, CollectionResponse, PaginationMeta, UpdateCurrencyRequest, UserDto,
};
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserDto>, AppError> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(user.into()))
}

/// Sets coin and/or gem balances.
///
/// # Endpoint
///
/// `PUT /api/users/{id}/currency`
///
/// # Request Body
///
/// ```json
/// { "coins": 5000, "gems": 20 }
/// ```
///
/// Either field may be omitted.
///
/// # Errors
///
/// - 400 if a balance is negative
/// - 404 if the user does not exist
pub async fn update_currency_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCurrencyRequest>,
) -> Result<Json<UserDto>, AppError> {
    payload.validate()?;

    let user = state
        .user_service
        .update_currency(id, payload.coins, payload.gems)
        .await?;
    Ok(Json(user.into()))
}

/// Lists owned cards, most recently obtained first.
///
/// # Endpoint
///
/// `GET /api/users/{id}/cards?page=1&page_size=20`
///
/// # Errors
///
/// - 400 if pagination parameters are out of range
/// - 404 if the user does not exist
pub async fn user_cards_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<CollectionResponse>, AppError> {
    let (offset, limit) = params
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let page = state.user_service.list_collection(id, offset, limit).await?;

    let page_size = params.page_size();
    let total_pages = ((page.total as f64) / (page_size as f64)).ceil() as u32;

    Ok(Json(CollectionResponse {
        pagination: PaginationMeta {
            page: params.page(),
            page_size,
            total_items: page.total,
            total_pages,
        },
        items: page
            .entries
            .into_iter()
            .map(CollectionItemDto::from)
            .collect(),
    }))
}
