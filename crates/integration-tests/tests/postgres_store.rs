//! `PgProductStore` against a real `PostgreSQL`.
//!
//! Ignored by default. Run with:
//! `DATABASE_URL=postgres://... cargo test -p ecom-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use secrecy::SecretString;

use ecom_admin::db::{PgProductStore, ProductStore, RepositoryError, create_pool};
use ecom_core::{CategoryId, Price, ProductFields, ProductId, ProductUpdate};

async fn store() -> PgProductStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&SecretString::from(url)).await.unwrap();
    sqlx::migrate!("../admin/migrations").run(&pool).await.unwrap();
    PgProductStore::new(pool)
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_find_update_delete() {
    let store = store().await;

    let mut fields = ProductFields::new("Integration Shirt");
    fields.price = Price::parse("19.99").unwrap();
    fields.images = vec!["https://cdn.example.com/shirt.jpg".to_string()];
    fields.properties = BTreeMap::from([("Size".to_string(), "M".to_string())]);
    let created = store.create(fields).await.unwrap();

    let found = store.find(created.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Integration Shirt");
    assert_eq!(found.price, Price::parse("19.99").unwrap());
    assert_eq!(found.properties.get("Size").map(String::as_str), Some("M"));

    let category = CategoryId::new();
    let update = ProductUpdate {
        title: Some("Renamed".to_string()),
        category: Some(Some(category)),
        ..ProductUpdate::default()
    };
    let updated = store.update(created.id, &update).await.unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.category, Some(category));
    assert_eq!(updated.images, ["https://cdn.example.com/shirt.jpg"]);
    assert!(updated.updated_at >= created.updated_at);

    assert!(store.delete(created.id).await.unwrap());
    assert!(!store.delete(created.id).await.unwrap());
    assert!(store.find(created.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_missing_product() {
    let store = store().await;

    let update = ProductUpdate {
        title: Some("Ghost".to_string()),
        ..ProductUpdate::default()
    };
    let result = store.update(ProductId::new(), &update).await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_list_newest_first() {
    let store = store().await;

    let older = store.create(ProductFields::new("Older")).await.unwrap();
    let newer = store.create(ProductFields::new("Newer")).await.unwrap();

    let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|p| p.id).collect();
    let older_pos = ids.iter().position(|id| *id == older.id).unwrap();
    let newer_pos = ids.iter().position(|id| *id == newer.id).unwrap();
    assert!(newer_pos < older_pos);

    store.delete(older.id).await.unwrap();
    store.delete(newer.id).await.unwrap();
}
