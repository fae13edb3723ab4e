//! Handlers for the card catalog.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::dto::card::{CardDto, CardListQuery, CardListResponse};
use crate::domain::entities::{Element, Rarity, UnknownVariant};
use crate::error::AppError;
use crate::state::AppState;
use serde_json::json;

fn parse_filter<T>(raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = UnknownVariant>,
{
    raw.map(str::parse::<T>)
        .transpose()
        .map_err(|e| AppError::bad_request(e.to_string(), json!({ "field": e.kind, "value": e.value })))
}

/// Lists active cards ordered by name.
///
/// # Endpoint
///
/// `GET /api/cards?rarity=EPIC&element=FIRE`
///
/// # Errors
///
/// Returns 400 Bad Request for an unknown rarity or element.
pub async fn list_cards_handler(
    State(state): State<AppState>,
    Query(query): Query<CardListQuery>,
) -> Result<Json<CardListResponse>, AppError> {
    let rarity = parse_filter::<Rarity>(query.rarity.as_deref())?;
    let element = parse_filter::<Element>(query.element.as_deref())?;

    let cards = state.card_service.list_active(rarity, element).await?;
    let items: Vec<CardDto> = cards.into_iter().map(CardDto::from).collect();

    Ok(Json(CardListResponse {
        total: items.len(),
        items,
    }))
}

/// `GET /api/cards/{id}`. Inactive cards answer 404.
pub async fn get_card_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CardDto>, AppError> {
    let card = state.card_service.get_card(id).await?;
    Ok(Json(card.into()))
}
