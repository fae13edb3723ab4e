//! API route configuration.

use crate::api::handlers::{
    get_card_handler, get_user_handler, list_cards_handler, rates_handler, single_pull_handler,
    ten_pull_handler, update_currency_handler, user_cards_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Routes that move currency.
///
/// # Endpoints
///
/// - `POST /gacha/single/{user_id}` - Single pull
/// - `POST /gacha/ten/{user_id}`    - Ten-pull
/// - `PUT  /users/{id}/currency`    - Overwrite balances
pub fn pull_routes() -> Router<AppState> {
    Router::new()
        .route("/gacha/single/{user_id}", post(single_pull_handler))
        .route("/gacha/ten/{user_id}", post(ten_pull_handler))
        .route("/users/{id}/currency", put(update_currency_handler))
}

/// Read-only routes.
///
/// # Endpoints
///
/// - `GET /gacha/rates`      - Drop table and prices
/// - `GET /cards`            - Active catalog, optional `rarity` filter
/// - `GET /cards/{id}`       - One card
/// - `GET /users/{id}`       - Profile and balances
/// - `GET /users/{id}/cards` - Owned collection (paginated)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/gacha/rates", get(rates_handler))
        .route("/cards", get(list_cards_handler))
        .route("/cards/{id}", get(get_card_handler))
        .route("/users/{id}", get(get_user_handler))
        .route("/users/{id}/cards", get(user_cards_handler))
}
