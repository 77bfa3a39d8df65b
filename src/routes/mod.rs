/**
 * Routes Module
 * API route handlers
 */

pub mod blog;
pub mod health;
pub mod products;
pub mod resource;
pub mod reviews;

use serde::{ser::SerializeMap, Serialize, Serializer};
use uuid::Uuid;

use crate::db::{Document, Resource};
use crate::error::AppError;

pub use crate::error::ErrorResponse;

/// `{ "message": ..., "<resource name>": document }`
#[derive(Debug)]
pub struct EntityResponse<T> {
    pub message: String,
    pub entity: Document<T>,
}

impl<T: Resource> EntityResponse<T> {
    pub fn new(action: &str, entity: Document<T>) -> Self {
        Self {
            message: format!("{} {}", T::NAME, action),
            entity,
        }
    }
}

impl<T: Resource> Serialize for EntityResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("message", &self.message)?;
        map.serialize_entry(T::NAME, &self.entity)?;
        map.end()
    }
}

/// Ids that do not parse cannot match a document.
fn parse_id<T: Resource>(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(T::NAME))
}

fn require_fields<T: Resource>(fields: &T) -> Result<(), AppError> {
    let missing = fields.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Review;
    use chrono::Utc;

    #[test]
    fn test_entity_response_uses_resource_key() {
        let response = EntityResponse::new(
            "saved",
            Document {
                id: Uuid::nil(),
                fields: Review {
                    comment: "Nice".into(),
                    rating: 4,
                    name_reviewer: "Ana".into(),
                    id_client: None,
                },
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["message"], "review saved");
        assert_eq!(value["review"]["rating"], 4);
    }

    #[test]
    fn test_parse_id_rejects_garbage_as_not_found() {
        let err = parse_id::<Review>("not-an-id").unwrap_err();
        assert_eq!(err.to_string(), "review not found");
    }
}
