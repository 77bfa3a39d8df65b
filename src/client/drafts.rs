//! Draft records: the editable form state of each resource page.

use reqwest::multipart::{Form, Part};

use super::{ClientError, Payload};
use crate::db::models::{BlogPost, Product, Review};
use crate::db::{Document, Resource};

pub const MISSING_FIELDS: &str = "Please fill in the required fields";

/// Form state of one resource, kept as strings until submitted.
pub trait Draft: Default + Send + Sync {
    type Entity: Resource;

    /// Path segment under `/api`
    const ENDPOINT: &'static str;
    /// Human-facing name used in notifications
    const LABEL: &'static str;

    fn from_document(doc: &Document<Self::Entity>) -> Self;

    /// Validates the draft and builds the request body.
    fn payload(&self) -> Result<Payload, ClientError>;
}

fn require(values: &[&str]) -> Result<(), ClientError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        Err(ClientError::Validation(MISSING_FIELDS.to_string()))
    } else {
        Ok(())
    }
}

fn parse_number<N: std::str::FromStr>(field: &str, raw: &str) -> Result<N, ClientError> {
    raw.trim()
        .parse()
        .map_err(|_| ClientError::Validation(format!("{field} must be a number")))
}

/// A file picked for upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogDraft {
    pub title: String,
    pub content: String,
    /// URL of the image already on the post
    pub image: String,
    /// Newly chosen file; replaces `image` when set
    pub image_file: Option<ImageFile>,
}

impl Draft for BlogDraft {
    type Entity = BlogPost;
    const ENDPOINT: &'static str = "blog";
    const LABEL: &'static str = "Blog";

    fn from_document(doc: &Document<BlogPost>) -> Self {
        Self {
            title: doc.fields.title.clone(),
            content: doc.fields.content.clone(),
            image: doc.fields.image.clone(),
            image_file: None,
        }
    }

    fn payload(&self) -> Result<Payload, ClientError> {
        require(&[&self.title, &self.content])?;

        let form = Form::new()
            .text("title", self.title.clone())
            .text("content", self.content.clone());
        let form = match &self.image_file {
            Some(file) => form.part(
                "image",
                Part::bytes(file.bytes.clone()).file_name(file.file_name.clone()),
            ),
            None if !self.image.is_empty() => form.text("image", self.image.clone()),
            None => form,
        };
        Ok(Payload::Multipart(form))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDraft {
    pub comment: String,
    /// Empty until a rating is picked
    pub rating: String,
    pub name_reviewer: String,
    pub id_client: String,
}

impl Draft for ReviewDraft {
    type Entity = Review;
    const ENDPOINT: &'static str = "reviews";
    const LABEL: &'static str = "Review";

    fn from_document(doc: &Document<Review>) -> Self {
        Self {
            comment: doc.fields.comment.clone(),
            rating: doc.fields.rating.to_string(),
            name_reviewer: doc.fields.name_reviewer.clone(),
            id_client: doc.fields.id_client.clone().unwrap_or_default(),
        }
    }

    fn payload(&self) -> Result<Payload, ClientError> {
        require(&[&self.comment, &self.rating, &self.name_reviewer])?;
        let rating: i64 = parse_number("rating", &self.rating)?;
        // The rating picker only offers 1 to 5
        if !(1..=5).contains(&rating) {
            return Err(ClientError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let review = Review {
            comment: self.comment.clone(),
            rating,
            name_reviewer: self.name_reviewer.clone(),
            id_client: Some(self.id_client.trim().to_string()).filter(|id| !id.is_empty()),
        };
        Ok(Payload::Json(serde_json::to_value(&review)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
}

impl Draft for ProductDraft {
    type Entity = Product;
    const ENDPOINT: &'static str = "products";
    const LABEL: &'static str = "Product";

    fn from_document(doc: &Document<Product>) -> Self {
        Self {
            name: doc.fields.name.clone(),
            description: doc.fields.description.clone().unwrap_or_default(),
            price: doc.fields.price.to_string(),
            stock: doc.fields.stock.to_string(),
        }
    }

    fn payload(&self) -> Result<Payload, ClientError> {
        require(&[&self.name, &self.price, &self.stock])?;

        let product = Product {
            name: self.name.clone(),
            description: Some(self.description.clone()).filter(|d| !d.trim().is_empty()),
            price: parse_number("price", &self.price)?,
            stock: parse_number("stock", &self.stock)?,
        };
        Ok(Payload::Json(serde_json::to_value(&product)?))
    }
}
