//! Integration tests for the product endpoint.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};

use ecom_admin::db::ProductStore;
use ecom_admin::media::ResourceType;
use ecom_core::{Price, ProductFields, ProductId};
use ecom_integration_tests::{
    MultipartForm, TestApp, empty_request, json_request, multipart_request,
};

fn shirt_with_two_images() -> MultipartForm {
    MultipartForm::new()
        .text("title", "Shirt")
        .text("price", "20")
        .file("images", "front.jpg", "image/jpeg", b"front-bytes")
        .file("images", "back.jpg", "image/jpeg", b"back-bytes")
}

async fn seed(app: &TestApp, title: &str, images: &[&str]) -> ProductId {
    let mut fields = ProductFields::new(title);
    fields.price = Price::parse("10").unwrap();
    fields.images = images.iter().map(ToString::to_string).collect();
    app.store.create(fields).await.unwrap().id
}

// ============================================================================
// Admin Gate
// ============================================================================

#[tokio::test]
async fn test_every_method_requires_a_session() {
    let app = TestApp::new();

    for method in ["GET", "POST", "PUT", "DELETE"] {
        let resp = app.send(empty_request(method, "/products", None)).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{method}");
        assert_eq!(resp.json(), json!({"error": "Unauthorized"}));
    }
}

#[tokio::test]
async fn test_non_admin_cannot_mutate_or_upload() {
    let app = TestApp::new();
    let existing = seed(&app, "Keep me", &[]).await;
    let token = app.viewer_token();

    let create = app
        .send(multipart_request(
            "POST",
            "/products",
            Some(&token),
            shirt_with_two_images(),
        ))
        .await;
    let update = app
        .send(json_request(
            "PUT",
            &format!("/products?id={existing}"),
            Some(&token),
            &json!({"title": "Changed"}),
        ))
        .await;
    let delete = app
        .send(empty_request(
            "DELETE",
            &format!("/products?id={existing}"),
            Some(&token),
        ))
        .await;

    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
    assert_eq!(update.status, StatusCode::UNAUTHORIZED);
    assert_eq!(delete.status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.store.len().await, 1);
    let product = app.store.find(existing).await.unwrap().unwrap();
    assert_eq!(product.title, "Keep me");
    assert!(app.media.calls().is_empty());
    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let app = TestApp::new();
    let mut token = app.admin_token();
    token.push('x');

    let resp = app.send(empty_request("GET", "/products", Some(&token))).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Method Dispatch
// ============================================================================

#[tokio::test]
async fn test_patch_is_method_not_allowed() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .send(empty_request("PATCH", "/products", Some(&token)))
        .await;

    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.header("allow"), Some("GET, POST, PUT, DELETE"));
    assert_eq!(resp.text(), "Method PATCH Not Allowed");
}

#[tokio::test]
async fn test_method_not_allowed_without_session() {
    let app = TestApp::new();

    let resp = app.send(empty_request("OPTIONS", "/products", None)).await;

    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.header("allow"), Some("GET, POST, PUT, DELETE"));
    assert_eq!(resp.text(), "Method OPTIONS Not Allowed");
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/products")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.admin_token()))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("title=Shirt"))
        .unwrap();

    let resp = app.send(request).await;

    assert_eq!(resp.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(app.store.len().await, 0);
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_shirt_with_two_images() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .send(multipart_request(
            "POST",
            "/products",
            Some(&token),
            shirt_with_two_images(),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["title"], "Shirt");
    assert_eq!(body["price"], 20);
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert!(
        images
            .iter()
            .all(|url| url.as_str().unwrap().starts_with("https://media.example.test/products/"))
    );
    assert!(body["_id"].as_str().unwrap().parse::<ProductId>().is_ok());
}

#[tokio::test]
async fn test_create_uploads_to_product_folder_and_cleans_up() {
    let app = TestApp::new();
    let token = app.admin_token();

    app.send(multipart_request(
        "POST",
        "/products",
        Some(&token),
        shirt_with_two_images(),
    ))
    .await;

    let calls = app.media.calls();
    assert_eq!(calls.len(), 2);
    let mut uploaded: Vec<_> = calls.iter().map(|c| c.bytes.clone()).collect();
    uploaded.sort();
    assert_eq!(uploaded, [b"back-bytes".to_vec(), b"front-bytes".to_vec()]);
    for call in &calls {
        assert_eq!(call.options.folder.as_deref(), Some("products"));
        assert_eq!(call.options.resource_type, ResourceType::Image);
        assert!(!call.staged_path.exists());
    }
    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn test_create_images_index_paired_with_files() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .send(multipart_request(
            "POST",
            "/products",
            Some(&token),
            shirt_with_two_images(),
        ))
        .await;

    let images: Vec<String> = serde_json::from_value(resp.json()["images"].clone()).unwrap();
    assert!(images[0].ends_with("front.jpg"));
    assert!(images[1].ends_with("back.jpg"));
}

#[tokio::test]
async fn test_create_accepts_bracketed_field_names() {
    let app = TestApp::new();
    let token = app.admin_token();
    let form = MultipartForm::new()
        .text("title", "Mug")
        .text("properties[Color]", "blue")
        .file("images[]", "mug.png", "image/png", b"png");

    let resp = app
        .send(multipart_request("POST", "/products", Some(&token), form))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert_eq!(body["properties"]["Color"], "blue");
    assert_eq!(body["price"], 0);
}

#[tokio::test]
async fn test_create_without_files_has_no_images() {
    let app = TestApp::new();
    let token = app.admin_token();
    let form = MultipartForm::new()
        .text("title", "Plain")
        .text("description", "No pictures")
        .text("properties", r#"{"Size":"M"}"#);

    let resp = app
        .send(multipart_request("POST", "/products", Some(&token), form))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["images"], json!([]));
    assert_eq!(body["description"], "No pictures");
    assert_eq!(body["properties"], json!({"Size": "M"}));
    assert!(app.media.calls().is_empty());
}

#[tokio::test]
async fn test_create_from_json() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .send(json_request(
            "POST",
            "/products",
            Some(&token),
            &json!({
                "title": "Hat",
                "price": "19.99",
                "images": ["https://cdn.example.com/hat.jpg"]
            }),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["price"], 19.99);
    assert_eq!(body["images"], json!(["https://cdn.example.com/hat.jpg"]));
    assert!(app.media.calls().is_empty());
}

#[tokio::test]
async fn test_create_without_title_discards_staged_files() {
    let app = TestApp::new();
    let token = app.admin_token();
    let form = MultipartForm::new()
        .text("price", "20")
        .file("images", "front.jpg", "image/jpeg", b"front");

    let resp = app
        .send(multipart_request("POST", "/products", Some(&token), form))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json(), json!({"error": "title is required"}));
    assert!(app.media.calls().is_empty());
    assert_eq!(app.staged_file_count(), 0);
    assert_eq!(app.store.len().await, 0);
}

#[tokio::test]
async fn test_create_with_invalid_price() {
    let app = TestApp::new();
    let token = app.admin_token();
    let form = MultipartForm::new()
        .text("title", "Shirt")
        .text("price", "twenty");

    let resp = app
        .send(multipart_request("POST", "/products", Some(&token), form))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.len().await, 0);
}

#[tokio::test]
async fn test_create_with_negative_price() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .send(json_request(
            "POST",
            "/products",
            Some(&token),
            &json!({"title": "Shirt", "price": -1}),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_unstorable_price() {
    let app = TestApp::new();
    let token = app.admin_token();

    let too_precise = app
        .send(json_request(
            "POST",
            "/products",
            Some(&token),
            &json!({"title": "Shirt", "price": 19.999}),
        ))
        .await;
    let too_large = app
        .send(multipart_request(
            "POST",
            "/products",
            Some(&token),
            MultipartForm::new()
                .text("title", "Shirt")
                .text("price", "10000000000000"),
        ))
        .await;

    assert_eq!(too_precise.status, StatusCode::BAD_REQUEST);
    assert_eq!(too_large.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.len().await, 0);
}

#[tokio::test]
async fn test_malformed_multipart_is_form_parsing_error() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/products")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.admin_token()))
        .header(header::CONTENT_TYPE, "multipart/form-data")
        .body(Body::from("not a multipart body"))
        .unwrap();

    let resp = app.send(request).await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json(), json!({"error": "Form parsing error"}));
    assert_eq!(app.store.len().await, 0);
}

#[tokio::test]
async fn test_upload_failure_reports_details_and_keeps_temp_file() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.media.fail_with("Invalid image file");
    let form = MultipartForm::new()
        .text("title", "Shirt")
        .file("images", "broken.jpg", "image/jpeg", b"not-a-jpeg");

    let resp = app
        .send(multipart_request("POST", "/products", Some(&token), form))
        .await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = resp.json();
    assert_eq!(body["error"], "Upload error");
    assert!(body["details"].as_str().unwrap().contains("Invalid image file"));
    assert_eq!(app.store.len().await, 0);

    let calls = app.media.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].staged_path.exists());
}

#[tokio::test]
async fn test_one_failed_image_among_several_fails_create() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.media.fail_on("middle.jpg");
    let form = MultipartForm::new()
        .text("title", "Shirt")
        .file("images", "first.jpg", "image/jpeg", b"first")
        .file("images", "middle.jpg", "image/jpeg", b"middle")
        .file("images", "last.jpg", "image/jpeg", b"last");

    let resp = app
        .send(multipart_request("POST", "/products", Some(&token), form))
        .await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = resp.json();
    assert_eq!(body["error"], "Upload error");
    assert!(body["details"].as_str().unwrap().contains("Rejected middle.jpg"));
    assert_eq!(app.store.len().await, 0);

    let calls = app.media.calls();
    let failed = calls
        .iter()
        .find(|c| c.file_name.as_deref() == Some("middle.jpg"))
        .unwrap();
    assert!(failed.staged_path.exists());
}

// ============================================================================
// Read
// ============================================================================

#[tokio::test]
async fn test_get_by_id() {
    let app = TestApp::new();
    let id = seed(&app, "Shirt", &["https://cdn.example.com/a.jpg"]).await;

    let resp = app
        .send(empty_request(
            "GET",
            &format!("/products?id={id}"),
            Some(&app.admin_token()),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["_id"], id.to_string());
    assert_eq!(body["title"], "Shirt");
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_get_unknown_id_is_null() {
    let app = TestApp::new();

    let resp = app
        .send(empty_request(
            "GET",
            &format!("/products?id={}", ProductId::new()),
            Some(&app.admin_token()),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), Value::Null);
}

#[tokio::test]
async fn test_get_malformed_id_is_bad_request() {
    let app = TestApp::new();

    let resp = app
        .send(empty_request(
            "GET",
            "/products?id=not-an-id",
            Some(&app.admin_token()),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = TestApp::new();
    seed(&app, "First", &[]).await;
    seed(&app, "Second", &[]).await;

    let resp = app
        .send(empty_request("GET", "/products", Some(&app.admin_token())))
        .await;

    let titles: Vec<_> = resp
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Second", "First"]);
}

#[tokio::test]
async fn test_empty_id_query_lists_everything() {
    let app = TestApp::new();
    seed(&app, "Only", &[]).await;

    let resp = app
        .send(empty_request("GET", "/products?id=", Some(&app.admin_token())))
        .await;

    assert_eq!(resp.json().as_array().unwrap().len(), 1);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_json_images_pass_through_without_upload() {
    let app = TestApp::new();
    let id = seed(&app, "Shirt", &["https://cdn.example.com/old.jpg"]).await;
    let urls = [
        "https://cdn.example.com/new-1.jpg",
        "https://cdn.example.com/new-2.jpg",
    ];

    let resp = app
        .send(json_request(
            "PUT",
            "/products",
            Some(&app.admin_token()),
            &json!({"_id": id.to_string(), "title": "Shirt v2", "images": urls}),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), json!(true));
    let product = app.store.find(id).await.unwrap().unwrap();
    assert_eq!(product.images, urls);
    assert_eq!(product.title, "Shirt v2");
    assert!(app.media.calls().is_empty());
}

#[tokio::test]
async fn test_update_json_leaves_unsent_fields() {
    let app = TestApp::new();
    let id = seed(&app, "Shirt", &["https://cdn.example.com/a.jpg"]).await;

    app.send(json_request(
        "PUT",
        &format!("/products?id={id}"),
        Some(&app.admin_token()),
        &json!({"price": 25}),
    ))
    .await;

    let product = app.store.find(id).await.unwrap().unwrap();
    assert_eq!(product.title, "Shirt");
    assert_eq!(product.price, Price::parse("25").unwrap());
    assert_eq!(product.images, ["https://cdn.example.com/a.jpg"]);
}

#[tokio::test]
async fn test_update_json_rejects_local_image_paths() {
    let app = TestApp::new();
    let id = seed(&app, "Shirt", &[]).await;

    let resp = app
        .send(json_request(
            "PUT",
            &format!("/products?id={id}"),
            Some(&app.admin_token()),
            &json!({"images": ["/tmp/upload_1.jpg"]}),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(app.store.find(id).await.unwrap().unwrap().images.is_empty());
}

#[tokio::test]
async fn test_update_multipart_without_files_keeps_images() {
    let app = TestApp::new();
    let id = seed(&app, "Shirt", &["https://cdn.example.com/a.jpg"]).await;
    let form = MultipartForm::new()
        .text("_id", &id.to_string())
        .text("title", "Renamed");

    let resp = app
        .send(multipart_request("PUT", "/products", Some(&app.admin_token()), form))
        .await;

    assert_eq!(resp.json(), json!(true));
    let product = app.store.find(id).await.unwrap().unwrap();
    assert_eq!(product.title, "Renamed");
    assert_eq!(product.images, ["https://cdn.example.com/a.jpg"]);
    assert!(app.media.calls().is_empty());
}

#[tokio::test]
async fn test_update_multipart_with_files_replaces_images() {
    let app = TestApp::new();
    let id = seed(&app, "Shirt", &["https://cdn.example.com/a.jpg"]).await;
    let form = MultipartForm::new()
        .text("_id", &id.to_string())
        .file("images", "new.jpg", "image/jpeg", b"new");

    let resp = app
        .send(multipart_request("PUT", "/products", Some(&app.admin_token()), form))
        .await;

    assert_eq!(resp.json(), json!(true));
    let product = app.store.find(id).await.unwrap().unwrap();
    assert_eq!(product.images.len(), 1);
    assert!(product.images[0].ends_with("new.jpg"));
    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn test_update_query_id_wins_over_body_id() {
    let app = TestApp::new();
    let target = seed(&app, "Target", &[]).await;
    let other = seed(&app, "Other", &[]).await;

    app.send(json_request(
        "PUT",
        &format!("/products?id={target}"),
        Some(&app.admin_token()),
        &json!({"_id": other.to_string(), "title": "Updated"}),
    ))
    .await;

    assert_eq!(app.store.find(target).await.unwrap().unwrap().title, "Updated");
    assert_eq!(app.store.find(other).await.unwrap().unwrap().title, "Other");
}

#[tokio::test]
async fn test_update_without_id_is_bad_request() {
    let app = TestApp::new();
    seed(&app, "Shirt", &[]).await;
    let form = MultipartForm::new()
        .text("title", "No id")
        .file("images", "new.jpg", "image/jpeg", b"new");

    let resp = app
        .send(multipart_request("PUT", "/products", Some(&app.admin_token()), form))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(app.media.calls().is_empty());
    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let app = TestApp::new();

    let resp = app
        .send(json_request(
            "PUT",
            &format!("/products?id={}", ProductId::new()),
            Some(&app.admin_token()),
            &json!({"title": "Ghost"}),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.len().await, 0);
}

#[tokio::test]
async fn test_update_unknown_id_with_files_uploads_nothing() {
    let app = TestApp::new();
    let form = MultipartForm::new()
        .text("title", "Ghost")
        .file("images", "ghost.jpg", "image/jpeg", b"ghost");

    let resp = app
        .send(multipart_request(
            "PUT",
            &format!("/products?id={}", ProductId::new()),
            Some(&app.admin_token()),
            form,
        ))
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(app.media.calls().is_empty());
    assert_eq!(app.staged_file_count(), 0);
    assert_eq!(app.store.len().await, 0);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_then_get_is_null() {
    let app = TestApp::new();
    let id = seed(&app, "Shirt", &[]).await;
    let token = app.admin_token();

    let deleted = app
        .send(empty_request("DELETE", &format!("/products?id={id}"), Some(&token)))
        .await;
    let fetched = app
        .send(empty_request("GET", &format!("/products?id={id}"), Some(&token)))
        .await;

    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json(), json!(true));
    assert_eq!(fetched.json(), Value::Null);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .send(empty_request(
            "DELETE",
            &format!("/products?id={}", ProductId::new()),
            Some(&token),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), json!(true));
}

#[tokio::test]
async fn test_delete_without_id_is_bad_request() {
    let app = TestApp::new();
    seed(&app, "Shirt", &[]).await;

    let resp = app
        .send(empty_request("DELETE", "/products", Some(&app.admin_token())))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.len().await, 1);
}
