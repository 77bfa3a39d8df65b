/**
 * Review Routes
 * CRUD API endpoints for reviews
 */
use axum::Router;

use super::resource;
use crate::db::models::Review;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    resource::router::<Review>()
}
