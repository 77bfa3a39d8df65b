//! Database Models - the three managed resources and how they are stored.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A resource kept in its own collection of the document store.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection holding every document of this resource
    const COLLECTION: &'static str;
    /// Singular name used in response keys and messages
    const NAME: &'static str;

    /// Required text fields that are blank. Numeric fields are enforced by
    /// deserialization.
    fn missing_fields(&self) -> Vec<&'static str>;
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub title: String,
    pub content: String,
    /// Image URL, empty when the post has none
    #[serde(default)]
    pub image: String,
}

impl Resource for BlogPost {
    const COLLECTION: &'static str = "blogs";
    const NAME: &'static str = "blog";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if blank(&self.title) {
            missing.push("title");
        }
        if blank(&self.content) {
            missing.push("content");
        }
        missing
    }
}

/// Review. `rating` is meant to be 1-5 but only the client enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub comment: String,
    pub rating: i64,
    pub name_reviewer: String,
    /// Unchecked reference to a client record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_client: Option<String>,
}

impl Resource for Review {
    const COLLECTION: &'static str = "reviews";
    const NAME: &'static str = "review";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if blank(&self.comment) {
            missing.push("comment");
        }
        if blank(&self.name_reviewer) {
            missing.push("nameReviewer");
        }
        missing
    }
}

/// Product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
}

impl Resource for Product {
    const COLLECTION: &'static str = "products";
    const NAME: &'static str = "product";

    fn missing_fields(&self) -> Vec<&'static str> {
        if blank(&self.name) {
            vec!["name"]
        } else {
            Vec::new()
        }
    }
}

/// Collections created at startup
pub const COLLECTIONS: &[&str] = &[
    BlogPost::COLLECTION,
    Review::COLLECTION,
    Product::COLLECTION,
];
