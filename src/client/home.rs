//! Home page summary: how many entries each collection holds.

use super::drafts::{BlogDraft, Draft, ProductDraft, ReviewDraft};
use super::ApiClient;
use crate::db::models::{BlogPost, Product, Review};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HomeSummary {
    pub blogs: usize,
    pub reviews: usize,
    pub products: usize,
}

impl HomeSummary {
    /// All counts fall back to zero when any list cannot be fetched.
    pub async fn load(client: &ApiClient) -> Self {
        let (blogs, reviews, products) = tokio::join!(
            client.list::<BlogPost>(BlogDraft::ENDPOINT),
            client.list::<Review>(ReviewDraft::ENDPOINT),
            client.list::<Product>(ProductDraft::ENDPOINT),
        );

        match (blogs, reviews, products) {
            (Ok(blogs), Ok(reviews), Ok(products)) => Self {
                blogs: blogs.len(),
                reviews: reviews.len(),
                products: products.len(),
            },
            (blogs, reviews, products) => {
                let error = [blogs.err(), reviews.err(), products.err()]
                    .into_iter()
                    .flatten()
                    .next();
                if let Some(e) = error {
                    tracing::error!(error = %e, "failed to load home summary");
                }
                Self::default()
            }
        }
    }
}
