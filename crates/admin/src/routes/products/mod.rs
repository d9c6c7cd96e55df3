//! Product endpoint: `GET/POST/PUT/DELETE /products[?id=]`.
//!
//! Every method passes the admin gate before anything else runs. Any other
//! method gets a 405 without touching the store.

mod request;

pub use request::{ImageSource, ProductForm, ProductInput, ProductRequest, parse_product_id};

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{MethodRouter, get},
};
use serde::Deserialize;
use tracing::instrument;

use ecom_core::{Product, ProductId};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::media::{StagedFile, UploadOptions, upload_all};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Methods served by `/products`, as sent in `Allow`.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";

/// `?id=` on the product endpoint. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    fn product_id(&self) -> Result<Option<ProductId>, AppError> {
        self.id
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_product_id)
            .transpose()
    }
}

/// Method router for `/products`.
pub fn router() -> MethodRouter<AppState> {
    get(read)
        .post(create)
        .put(update)
        .delete(remove)
        .fallback(method_not_allowed)
}

/// `GET /products?id=` returns one product or `null`; without an id,
/// every product, newest first.
#[instrument(skip(state), fields(admin = %admin.id))]
async fn read(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Response, AppError> {
    match query.product_id()? {
        Some(id) => Ok(Json(state.store().find(id).await?).into_response()),
        None => Ok(Json(state.store().list().await?).into_response()),
    }
}

/// `POST /products` creates a product, uploading any image files first.
#[instrument(skip(state, form), fields(admin = %admin.id))]
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ProductRequest(form): ProductRequest,
) -> Result<Json<Product>, AppError> {
    let mut fields = match form.input.into_fields() {
        Ok(fields) => fields,
        Err(e) => {
            form.images.discard().await;
            return Err(AppError::BadRequest(e.to_string()));
        }
    };

    fields.images = match form.images {
        ImageSource::Keep => Vec::new(),
        ImageSource::Urls(urls) => urls,
        ImageSource::Files(files) => {
            let options = UploadOptions::product_images(state.product_folder());
            upload_all(state.media(), &files, &options).await?
        }
    };

    let product = state.store().create(fields).await?;
    tracing::info!(product_id = %product.id, images = product.images.len(), "Product created");
    Ok(Json(product))
}

/// `PUT /products` updates the product named by `?id=` or the body id.
///
/// Image files replace the product's images; without files the images are
/// left untouched unless a JSON body lists them.
#[instrument(skip(state, form), fields(admin = %admin.id))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    ProductRequest(form): ProductRequest,
) -> Result<Json<bool>, AppError> {
    let prepared = query
        .product_id()
        .and_then(|from_query| {
            from_query
                .or(form.id)
                .ok_or_else(|| AppError::BadRequest("product id is required".to_string()))
        })
        .and_then(|id| {
            form.input
                .into_update()
                .map(|update| (id, update))
                .map_err(|e| AppError::BadRequest(e.to_string()))
        });

    let (id, mut changes) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            form.images.discard().await;
            return Err(e);
        }
    };

    changes.images = match form.images {
        ImageSource::Keep => None,
        ImageSource::Urls(urls) => Some(urls),
        ImageSource::Files(files) => {
            // Nothing is sent to the media host for a product that does not exist
            if state.store().find(id).await?.is_none() {
                StagedFile::discard_all(&files).await;
                return Err(RepositoryError::NotFound.into());
            }
            let options = UploadOptions::product_images(state.product_folder());
            Some(upload_all(state.media(), &files, &options).await?)
        }
    };

    state.store().update(id, &changes).await?;
    tracing::info!(product_id = %id, "Product updated");
    Ok(Json(true))
}

/// `DELETE /products?id=` removes a product. Deleting an absent id is not
/// an error.
#[instrument(skip(state), fields(admin = %admin.id))]
async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<bool>, AppError> {
    let id = query
        .product_id()?
        .ok_or_else(|| AppError::BadRequest("product id is required".to_string()))?;

    let removed = state.store().delete(id).await?;
    tracing::info!(product_id = %id, removed, "Product deleted");
    Ok(Json(true))
}

/// Any other method: 405 with the supported methods listed in `Allow`.
async fn method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS))],
        format!("Method {method} Not Allowed"),
    )
        .into_response()
}
