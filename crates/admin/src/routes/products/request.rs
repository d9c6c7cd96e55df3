//! Decoding of product write requests.
//!
//! `POST` and `PUT` on `/products` accept either a JSON body or a
//! `multipart/form-data` body. [`ProductRequest`] negotiates on
//! `Content-Type` and turns both into one [`ProductForm`], so the handlers
//! never look at the wire format.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, multipart::Field},
    http::header,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use ecom_core::{
    CategoryId, Price, ProductError, ProductFields, ProductId, ProductUpdate, validate_image_url,
};

use crate::error::AppError;
use crate::media::StagedFile;
use crate::state::AppState;

// =============================================================================
// Parsed Representation
// =============================================================================

/// Where a write request's images come from.
#[derive(Debug, Default)]
pub enum ImageSource {
    /// No images supplied; leave them as they are (empty on create).
    #[default]
    Keep,
    /// Hosted URLs passed through as-is (JSON bodies).
    Urls(Vec<String>),
    /// Staged file parts awaiting upload (multipart bodies).
    Files(Vec<StagedFile>),
}

impl ImageSource {
    /// Remove staged files that will never be uploaded.
    pub async fn discard(&self) {
        if let Self::Files(files) = self {
            StagedFile::discard_all(files).await;
        }
    }
}

/// Product fields as supplied by the client. `None` means "not sent".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<CategoryId>>,
    pub properties: Option<BTreeMap<String, String>>,
}

impl ProductInput {
    /// Fields for a new product. Images are attached by the caller after
    /// upload.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::EmptyTitle` if no usable title was sent.
    pub fn into_fields(self) -> Result<ProductFields, ProductError> {
        let fields = ProductFields {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            price: self.price.unwrap_or(Price::ZERO),
            images: Vec::new(),
            category: self.category.flatten(),
            properties: self.properties.unwrap_or_default(),
        };
        fields.validate()?;
        Ok(fields)
    }

    /// A partial update carrying only the fields that were sent.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::EmptyTitle` if a blank title was sent.
    pub fn into_update(self) -> Result<ProductUpdate, ProductError> {
        let update = ProductUpdate {
            title: self.title,
            description: self.description,
            price: self.price,
            images: None,
            category: self.category,
            properties: self.properties,
        };
        update.validate()?;
        Ok(update)
    }
}

/// A decoded product write request.
#[derive(Debug, Default)]
pub struct ProductForm {
    /// Id carried in the body (`_id` or `id`).
    pub id: Option<ProductId>,
    pub input: ProductInput,
    pub images: ImageSource,
}

// =============================================================================
// Extractor
// =============================================================================

/// Extractor for product write bodies, JSON or multipart.
///
/// Multipart file parts named `images` (or `images[]`) are staged to disk
/// while the body is read. If decoding fails part-way, anything already
/// staged is removed before the rejection is returned.
#[derive(Debug)]
pub struct ProductRequest(pub ProductForm);

impl FromRequest<AppState> for ProductRequest {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Parse(e.body_text()))?;
            decode_multipart(multipart, state).await.map(Self)
        } else if is_json(&content_type) {
            let Json(body) = Json::<ProductJson>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            body.into_form().map(Self)
        } else {
            Err(AppError::UnsupportedMediaType(if content_type.is_empty() {
                "missing content type".to_string()
            } else {
                content_type
            }))
        }
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence == "application/json" || essence.ends_with("+json")
}

// =============================================================================
// JSON Bodies
// =============================================================================

/// JSON product body. Unknown fields (`createdAt`, `__v`, ...) are ignored
/// so clients can send back a document they fetched.
#[derive(Debug, Deserialize)]
struct ProductJson {
    #[serde(default, rename = "_id", alias = "id")]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<Price>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    category: Option<Value>,
    #[serde(default)]
    properties: Option<BTreeMap<String, Value>>,
}

/// Keep `null` distinct from "absent" for fields where null means clear.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl ProductJson {
    fn into_form(self) -> Result<ProductForm, AppError> {
        let id = self.id.as_deref().map(parse_product_id).transpose()?;

        let category = match self.category {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(parse_category(&s)?),
            Some(other) => {
                return Err(AppError::BadRequest(format!("invalid category: {other}")));
            }
        };

        let properties = self
            .properties
            .map(|map| {
                map.into_iter()
                    .map(|(k, v)| property_value(&k, v).map(|v| (k, v)))
                    .collect::<Result<BTreeMap<_, _>, _>>()
            })
            .transpose()?;

        let images = match self.images {
            Some(urls) => {
                for url in &urls {
                    validate_image_url(url).map_err(|e| AppError::BadRequest(e.to_string()))?;
                }
                ImageSource::Urls(urls)
            }
            None => ImageSource::Keep,
        };

        Ok(ProductForm {
            id,
            input: ProductInput {
                title: self.title,
                description: self.description,
                price: self.price,
                category,
                properties,
            },
            images,
        })
    }
}

/// Property values are stored as text; scalars are rendered as text.
fn property_value(name: &str, value: Value) -> Result<String, AppError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(AppError::BadRequest(format!(
            "property {name} must be a string, number, or boolean"
        ))),
    }
}

// =============================================================================
// Multipart Bodies
// =============================================================================

/// Multipart field names recognised for image files.
fn is_image_field(name: &str) -> bool {
    matches!(name, "images" | "images[]")
}

async fn decode_multipart(mut multipart: Multipart, state: &AppState) -> Result<ProductForm, AppError> {
    let mut form = ProductForm::default();
    let mut files = Vec::new();

    let decoded = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break Ok(()),
            Err(e) => break Err(AppError::Parse(e.body_text())),
        };
        if let Err(e) = apply_field(&mut form, &mut files, field, state).await {
            break Err(e);
        }
    };

    if let Err(e) = decoded {
        StagedFile::discard_all(&files).await;
        return Err(e);
    }

    if !files.is_empty() {
        form.images = ImageSource::Files(files);
    }
    Ok(form)
}

async fn apply_field(
    form: &mut ProductForm,
    files: &mut Vec<StagedFile>,
    field: Field<'_>,
    state: &AppState,
) -> Result<(), AppError> {
    let name = field.name().unwrap_or_default().to_string();

    if is_image_field(&name) {
        // Browsers send an empty part when no file was picked
        if field.file_name().is_some_and(|f| !f.is_empty()) {
            files.push(state.staging().stage_field(field).await?);
        } else {
            tracing::debug!(field = %name, "Ignoring non-file images part");
        }
        return Ok(());
    }

    if field.file_name().is_some() {
        tracing::debug!(field = %name, "Ignoring unexpected file part");
        return Ok(());
    }

    let value = field
        .text()
        .await
        .map_err(|e| AppError::Parse(e.body_text()))?;

    match name.as_str() {
        "_id" | "id" => {
            if !value.trim().is_empty() {
                form.id = Some(parse_product_id(&value)?);
            }
        }
        "title" => form.input.title = Some(value),
        "description" => form.input.description = Some(value),
        "price" => {
            if !value.trim().is_empty() {
                let price = Price::parse(&value).map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.input.price = Some(price);
            }
        }
        "category" => form.input.category = Some(parse_category(&value)?),
        "properties" => {
            let map: BTreeMap<String, Value> = serde_json::from_str(&value)
                .map_err(|e| AppError::BadRequest(format!("invalid properties: {e}")))?;
            let properties = form.input.properties.get_or_insert_with(BTreeMap::new);
            for (k, v) in map {
                let v = property_value(&k, v)?;
                properties.insert(k, v);
            }
        }
        other => {
            if let Some(key) = property_key(other) {
                form.input
                    .properties
                    .get_or_insert_with(BTreeMap::new)
                    .insert(key.to_string(), value);
            } else {
                tracing::debug!(field = %other, "Ignoring unknown form field");
            }
        }
    }
    Ok(())
}

/// `properties[Color]` -> `Color`.
fn property_key(name: &str) -> Option<&str> {
    name.strip_prefix("properties[")?
        .strip_suffix(']')
        .filter(|key| !key.is_empty())
}

// =============================================================================
// Shared Parsing
// =============================================================================

/// Parse a product id from a body field or query string.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the value is not a UUID.
pub fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id: {}", raw.trim())))
}

/// Empty or `null` clears the category.
fn parse_category(raw: &str) -> Result<Option<CategoryId>, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("invalid category: {trimmed}")))
}
