/**
 * Resource Routes
 * Generic JSON CRUD handlers shared by reviews and products
 */
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use super::{parse_id, require_fields, EntityResponse};
use crate::db::{Collection, Document, Resource};
use crate::error::AppError;
use crate::state::AppState;

fn payload<T: Resource>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(fields) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    require_fields(&fields)?;
    Ok(fields)
}

/// A missing document takes precedence over an invalid update body.
pub(crate) async fn missing_or<T: Resource>(
    collection: &Collection<T>,
    id: Uuid,
    invalid: AppError,
) -> AppError {
    match collection.get(id).await {
        Ok(Some(_)) => invalid,
        Ok(None) => AppError::NotFound(T::NAME),
        Err(e) => AppError::store(format!("Error updating {}", T::NAME), e),
    }
}

/// GET / - every document, in store order
pub async fn list<T: Resource>(
    State(state): State<AppState>,
) -> Result<Json<Vec<Document<T>>>, AppError> {
    let docs = state
        .collection::<T>()
        .list()
        .await
        .map_err(|e| AppError::store(format!("Error fetching {}", T::COLLECTION), e))?;
    Ok(Json(docs))
}

/// POST / - insert a new document
pub async fn create<T: Resource>(
    State(state): State<AppState>,
    body: Result<Json<T>, JsonRejection>,
) -> Result<Json<EntityResponse<T>>, AppError> {
    let fields = payload(body)?;
    let doc = state
        .collection::<T>()
        .create(&fields)
        .await
        .map_err(|e| AppError::store(format!("Error creating {}", T::NAME), e))?;

    tracing::info!(id = %doc.id, collection = T::COLLECTION, "document created");
    Ok(Json(EntityResponse::new("saved", doc)))
}

/// PUT /{id} - overwrite every field of a document
pub async fn update<T: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<T>, JsonRejection>,
) -> Result<Json<EntityResponse<T>>, AppError> {
    let id = parse_id::<T>(&id)?;
    let collection = state.collection::<T>();
    let fields = match payload(body) {
        Ok(fields) => fields,
        Err(invalid) => return Err(missing_or(&collection, id, invalid).await),
    };
    let doc = collection
        .update(id, &fields)
        .await
        .map_err(|e| AppError::store(format!("Error updating {}", T::NAME), e))?
        .ok_or(AppError::NotFound(T::NAME))?;

    tracing::info!(id = %doc.id, collection = T::COLLECTION, "document updated");
    Ok(Json(EntityResponse::new("updated", doc)))
}

/// DELETE /{id}
pub async fn delete<T: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntityResponse<T>>, AppError> {
    let id = parse_id::<T>(&id)?;
    let doc = state
        .collection::<T>()
        .delete(id)
        .await
        .map_err(|e| AppError::store(format!("Error deleting {}", T::NAME), e))?
        .ok_or(AppError::NotFound(T::NAME))?;

    tracing::info!(id = %doc.id, collection = T::COLLECTION, "document deleted");
    Ok(Json(EntityResponse::new("deleted", doc)))
}

/// `/` and `/{id}` for a JSON-only resource
pub fn router<T: Resource>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route("/{id}", put(update::<T>).delete(delete::<T>))
}
