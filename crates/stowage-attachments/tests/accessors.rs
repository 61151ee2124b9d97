mod helpers;

use helpers::{behavior, config, image_upload, save, MockStorage, Op, TestRecord};
use std::time::Duration;
use stowage_attachments::FilenameStrategy;
use stowage_core::{AppError, StoredFileReference, VariationSpec};
use tempfile::tempdir;

#[test]
fn test_urls_use_persisted_value() {
    let storage = MockStorage::new();
    let behavior = behavior(config(), &storage);
    let mut record = TestRecord::persisted(&[("id", "7"), ("avatar", "a b.png")]);
    record.set("avatar", "unsaved.png");

    assert_eq!(
        behavior.upload_key(&record).unwrap().as_deref(),
        Some("uploads/7/a b.png")
    );
    assert_eq!(
        behavior.upload_url(&record).unwrap().as_deref(),
        Some("https://media.example.test/uploads/7/a b.png")
    );
    assert_eq!(
        behavior.stored_file(&record).unwrap(),
        Some(StoredFileReference {
            bucket: "media".to_string(),
            key: "uploads/7/a b.png".to_string(),
        })
    );
}

#[test]
fn test_urls_without_file() {
    let storage = MockStorage::new();
    let behavior = behavior(config(), &storage);
    let record = TestRecord::persisted(&[("id", "7")]);

    assert_eq!(behavior.upload_url(&record).unwrap(), None);
    assert_eq!(behavior.upload_key(&record).unwrap(), None);
}

#[tokio::test]
async fn test_presigned_url_uses_configured_ttl() {
    let storage = MockStorage::new();
    let behavior = behavior(config(), &storage).with_presigned_ttl(Duration::from_secs(120));
    let record = TestRecord::persisted(&[("id", "7"), ("avatar", "a.png")]);

    let url = behavior.presigned_url(&record).await.unwrap().unwrap();
    assert_eq!(url, "https://media.example.test/uploads/7/a.png?expires=120");

    let empty = TestRecord::persisted(&[("id", "7")]);
    assert_eq!(behavior.presigned_url(&empty).await.unwrap(), None);
}

#[test]
fn test_variation_key_and_unknown_profile() {
    let storage = MockStorage::new();
    let behavior = behavior(
        config().with_variation("thumb", VariationSpec::new(Some(50), None)),
        &storage,
    );
    let record = TestRecord::persisted(&[("id", "7"), ("avatar", "a.png")]);

    assert_eq!(
        behavior.variation_key(&record, "thumb").unwrap().as_deref(),
        Some("uploads/7/a-thumb.png")
    );
    assert!(matches!(
        behavior.variation_key(&record, "poster"),
        Err(AppError::InvalidVariationSpec(_))
    ));
}

#[tokio::test]
async fn test_variation_created_on_first_access_only() {
    let dir = tempdir().unwrap();
    let storage = MockStorage::new();
    let mut config = config().with_variation("thumb", VariationSpec::new(Some(60), None));
    config.create_variations_on_access = true;
    let behavior = behavior(config, &storage);
    let mut record = TestRecord::new();
    record.set("id", "4");

    let report = save(
        &behavior,
        &mut record,
        Some(image_upload(dir.path(), "photo.png", 120, 80)),
    )
    .await
    .unwrap();
    assert!(report.variation_keys.is_empty());
    assert_eq!(storage.keys_for(Op::Put).len(), 1);

    let base_key = report.key.unwrap();
    let thumb_key = format!("{}-thumb.png", base_key.trim_end_matches(".png"));

    let url = behavior.variation_url(&record, "thumb").await.unwrap().unwrap();
    assert_eq!(url, format!("https://media.example.test/{}", thumb_key));
    assert_eq!(storage.keys_for(Op::Put), vec![base_key.clone(), thumb_key.clone()]);
    assert_eq!(storage.keys_for(Op::Download), vec![base_key]);

    let thumb = image::load_from_memory(&storage.object("media", &thumb_key).unwrap()).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (60, 40));

    // Second access reuses the stored variation
    behavior.variation_url(&record, "thumb").await.unwrap();
    assert_eq!(storage.keys_for(Op::Put).len(), 2);
}

#[tokio::test]
async fn test_variation_url_does_not_generate_by_default() {
    let storage = MockStorage::new();
    let behavior = behavior(
        config().with_variation("thumb", VariationSpec::new(Some(60), None)),
        &storage,
    );
    let record = TestRecord::persisted(&[("id", "4"), ("avatar", "a.png")]);

    let url = behavior.variation_url(&record, "thumb").await.unwrap();
    assert_eq!(
        url.as_deref(),
        Some("https://media.example.test/uploads/4/a-thumb.png")
    );
    assert!(storage.calls().is_empty());
}

#[tokio::test]
async fn test_exists_and_filename_uniqueness() {
    let storage = MockStorage::new();
    storage.insert("media", "uploads/7/a.png", b"a");
    let behavior = behavior(config(), &storage);
    let record = TestRecord::persisted(&[("id", "7"), ("avatar", "a.png")]);

    assert!(behavior.exists(&record).await.unwrap());
    assert!(!behavior.is_filename_unique(&record, "a.png").await.unwrap());
    assert!(behavior.is_filename_unique(&record, "b.png").await.unwrap());

    let empty = TestRecord::persisted(&[("id", "7")]);
    assert!(!behavior.exists(&empty).await.unwrap());
}

#[tokio::test]
async fn test_custom_filename_strategy() {
    let dir = tempdir().unwrap();
    let storage = MockStorage::new();
    let behavior = behavior(config(), &storage)
        .with_filename_strategy(FilenameStrategy::custom(|file| {
            format!("avatar.{}", file.extension)
        }));
    let mut record = TestRecord::new();
    record.set("id", "12");

    let report = save(
        &behavior,
        &mut record,
        Some(image_upload(dir.path(), "Me.PNG", 8, 8)),
    )
    .await
    .unwrap();

    assert_eq!(report.key.as_deref(), Some("uploads/12/avatar.png"));
    assert_eq!(
        behavior.upload_url(&record).unwrap().as_deref(),
        Some("https://media.example.test/uploads/12/avatar.png")
    );
}

#[test]
fn test_invalid_config_rejected_at_setup() {
    let storage = MockStorage::new();
    let result = stowage_attachments::AttachmentBehavior::new(
        stowage_core::AttachmentConfig::new("", "uploads", "avatar"),
        storage,
    );
    assert!(matches!(result, Err(AppError::Configuration(_))));
}
