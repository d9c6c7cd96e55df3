//! Product document and its create/update inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// Errors raised when product input fails validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// Title is missing or blank.
    #[error("title is required")]
    EmptyTitle,
    /// An image entry is not an absolute http(s) URL.
    #[error("invalid image url: {0}")]
    InvalidImageUrl(String),
}

/// A catalog product as stored and returned by the admin API.
///
/// `id` is exposed as `_id` on the wire; `id` is also accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    /// Hosted image URLs, in display order.
    pub images: Vec<String>,
    pub category: Option<CategoryId>,
    /// Category-defined attributes, e.g. `{"color": "red"}`.
    pub properties: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a product.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductFields {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<String>,
    pub category: Option<CategoryId>,
    pub properties: BTreeMap<String, String>,
}

impl ProductFields {
    /// Create fields with the given title and defaults elsewhere.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Check the fields before they reach the store.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::EmptyTitle` for a blank title and
    /// `ProductError::InvalidImageUrl` for any image that is not an
    /// absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.title.trim().is_empty() {
            return Err(ProductError::EmptyTitle);
        }
        self.images.iter().try_for_each(|url| validate_image_url(url))
    }

    /// Build the stored document for these fields.
    #[must_use]
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            images: self.images,
            category: self.category,
            properties: self.properties,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update. `None` leaves the stored value untouched.
///
/// `category` is doubly optional: `Some(None)` clears the category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub images: Option<Vec<String>>,
    pub category: Option<Option<CategoryId>>,
    pub properties: Option<BTreeMap<String, String>>,
}

impl ProductUpdate {
    /// Check the provided fields.
    ///
    /// # Errors
    ///
    /// Same rules as [`ProductFields::validate`], applied only to the
    /// fields present in the update.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ProductError::EmptyTitle);
        }
        self.images
            .iter()
            .flatten()
            .try_for_each(|url| validate_image_url(url))
    }

    /// Apply the provided fields to a product in place.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            product.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(images) = &self.images {
            product.images.clone_from(images);
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(properties) = &self.properties {
            product.properties.clone_from(properties);
        }
        product.updated_at = now;
    }
}

/// Check that an image entry is an absolute `http` or `https` URL.
///
/// # Errors
///
/// Returns `ProductError::InvalidImageUrl` for relative paths, local file
/// paths, and other schemes.
pub fn validate_image_url(candidate: &str) -> Result<(), ProductError> {
    match url::Url::parse(candidate) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(ProductError::InvalidImageUrl(candidate.to_owned())),
    }
}
