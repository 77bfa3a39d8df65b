/**
 * Product Routes
 * CRUD API endpoints for products
 */
use axum::Router;

use super::resource;
use crate::db::models::Product;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    resource::router::<Product>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::send_json;
    use crate::state::tests::test_state;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    fn app(state: AppState) -> Router {
        Router::new().nest("/api/products", router()).with_state(state)
    }

    #[tokio::test]
    async fn test_create_pen_grows_list() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (status, before) = send_json::<Vec<Value>>(app(state.clone()), "GET", "/api/products", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, created) = send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/products",
            Some(json!({ "name": "Pen", "price": 1.5, "stock": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["message"], "product saved");
        assert_eq!(created["product"]["price"], 1.5);
        assert_eq!(created["product"]["stock"], 10);

        let (_, after) = send_json::<Vec<Value>>(app(state), "GET", "/api/products", None).await;
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.last().unwrap()["_id"], created["product"]["_id"]);
        assert_eq!(after.last().unwrap()["name"], "Pen");
    }

    #[tokio::test]
    async fn test_update_overwrites_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (_, created) = send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/products",
            Some(json!({ "name": "Pen", "description": "Blue ink", "price": 1.5, "stock": 10 })),
        )
        .await;
        let id = created["product"]["_id"].as_str().unwrap().to_string();

        let (status, updated) = send_json::<Value>(
            app(state),
            "PUT",
            &format!("/api/products/{id}"),
            Some(json!({ "name": "Pencil", "price": 0.5, "stock": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["message"], "product updated");
        assert_eq!(updated["product"]["name"], "Pencil");
        assert!(updated["product"].get("description").is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_404_and_keeps_collection() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/products",
            Some(json!({ "name": "Pen", "price": 1.5, "stock": 10 })),
        )
        .await;

        let (status, body) = send_json::<Value>(
            app(state.clone()),
            "DELETE",
            &format!("/api/products/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "product not found" }));

        let (_, list) = send_json::<Vec<Value>>(app(state), "GET", "/api/products", None).await;
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_product() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (_, created) = send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/products",
            Some(json!({ "name": "Pen", "price": 1.5, "stock": 10 })),
        )
        .await;
        let id = created["product"]["_id"].as_str().unwrap();

        let (status, deleted) =
            send_json::<Value>(app(state.clone()), "DELETE", &format!("/api/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["message"], "product deleted");
        assert_eq!(deleted["product"]["_id"], id);

        let (_, list) = send_json::<Vec<Value>>(app(state), "GET", "/api/products", None).await;
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_missing_price_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let (status, body) = send_json::<Value>(
            app(state.clone()),
            "POST",
            "/api/products",
            Some(json!({ "name": "Pen", "stock": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("price"));

        let (_, list) = send_json::<Vec<Value>>(app(state), "GET", "/api/products", None).await;
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send_json::<Value>(
            app(test_state(dir.path())),
            "POST",
            "/api/products",
            Some(json!({ "name": " ", "price": 1.0, "stock": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing required fields: name");
    }

    #[tokio::test]
    async fn test_duplicate_creates_are_not_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let pen = json!({ "name": "Pen", "price": 1.5, "stock": 10 });
        for _ in 0..2 {
            let (status, _) =
                send_json::<Value>(app(state.clone()), "POST", "/api/products", Some(pen.clone())).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, list) = send_json::<Vec<Value>>(app(state), "GET", "/api/products", None).await;
        assert_eq!(list.len(), 2);
        assert_ne!(list[0]["_id"], list[1]["_id"]);
    }
}
