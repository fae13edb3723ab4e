//! Handlers for pulls and published drop rates.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::dto::gacha::{CostEntry, PullQuery, PullResponse, RateEntry, RatesResponse};
use crate::domain::entities::Rarity;
use crate::domain::gacha::{DROP_RATES, PullType};
use crate::error::AppError;
use crate::state::AppState;

/// Draws one card.
///
/// # Endpoint
///
/// `POST /api/gacha/single/{user_id}?use_gems=false`
///
/// # Errors
///
/// - 400 `insufficient_funds` if the balance cannot cover 100 coins / 1 gem
/// - 404 if the user does not exist
pub async fn single_pull_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<PullQuery>,
) -> Result<Json<PullResponse>, AppError> {
    let result = state
        .gacha_service
        .perform_single_pull(user_id, query.use_gems)
        .await?;
    Ok(Json(result.into()))
}

/// Draws ten cards with a RARE-or-better guarantee.
///
/// # Endpoint
///
/// `POST /api/gacha/ten/{user_id}?use_gems=false`
///
/// # Errors
///
/// Same as [`single_pull_handler`], for a cost of 900 coins / 9 gems.
pub async fn ten_pull_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<PullQuery>,
) -> Result<Json<PullResponse>, AppError> {
    let result = state
        .gacha_service
        .perform_ten_pull(user_id, query.use_gems)
        .await?;
    Ok(Json(result.into()))
}

/// `GET /api/gacha/rates`
pub async fn rates_handler() -> Json<RatesResponse> {
    Json(RatesResponse {
        rates: DROP_RATES
            .iter()
            .map(|&(rarity, percent)| RateEntry { rarity, percent })
            .collect(),
        costs: PullType::ALL.into_iter().map(CostEntry::from).collect(),
        ten_pull_guarantee: Rarity::Rare,
    })
}
