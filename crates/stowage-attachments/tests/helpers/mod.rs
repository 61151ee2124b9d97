#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stowage_attachments::{AttachmentBehavior, Record};
use stowage_core::{AttachmentConfig, UploadedFile};
use stowage_storage::{ObjectMetadata, Storage, StorageBackend, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Put,
    Download,
    Delete,
    Exists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub bucket: String,
    pub key: String,
}

/// In-memory storage that records every call and fails on demand
#[derive(Default)]
pub struct MockStorage {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    metadata: Mutex<HashMap<(String, String), ObjectMetadata>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashSet<(Op, String)>>,
}

impl MockStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `op` fail with a transport error for `key` (`*` for any key)
    pub fn fail(&self, op: Op, key: &str) {
        self.failures.lock().unwrap().insert((op, key.to_string()));
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn object_metadata(&self, bucket: &str, key: &str) -> Option<ObjectMetadata> {
        self.metadata
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Keys passed to `op`, in call order
    pub fn keys_for(&self, op: Op) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.op == op)
            .map(|c| c.key)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, op: Op, bucket: &str, key: &str) -> StorageResult<()> {
        self.calls.lock().unwrap().push(Call {
            op,
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let failures = self.failures.lock().unwrap();
        if failures.contains(&(op, key.to_string())) || failures.contains(&(op, "*".to_string())) {
            return Err(StorageError::BackendError(format!(
                "simulated {:?} failure for {}",
                op, key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        self.record(Op::Put, bucket, key)?;
        let data = std::fs::read(source)?;
        self.insert(bucket, key, &data);
        self.metadata
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), metadata.clone());
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.record(Op::Download, bucket, key)?;
        self.object(bucket, key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.record(Op::Delete, bucket, key)?;
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        self.record(Op::Exists, bucket, key)?;
        Ok(self.contains(bucket, key))
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "{}?expires={}",
            self.public_url(bucket, key),
            expires_in.as_secs()
        ))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://{}.example.test/{}", bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// A record kept in memory; `commit` plays the role of a successful write.
#[derive(Debug, Default, Clone)]
pub struct TestRecord {
    current: HashMap<String, String>,
    old: HashMap<String, String>,
    new_record: bool,
}

impl TestRecord {
    pub fn new() -> Self {
        Self {
            new_record: true,
            ..Default::default()
        }
    }

    /// A record already stored with `attributes`
    pub fn persisted(attributes: &[(&str, &str)]) -> Self {
        let mut record = Self::new();
        for (name, value) in attributes {
            record.set(name, value);
        }
        record.commit();
        record
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.current.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.current.get(name).cloned()
    }

    pub fn commit(&mut self) {
        self.old = self.current.clone();
        self.new_record = false;
    }
}

impl Record for TestRecord {
    fn attribute(&self, name: &str) -> Option<String> {
        self.current.get(name).cloned()
    }

    fn old_attribute(&self, name: &str) -> Option<String> {
        self.old.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: Option<String>) {
        match value {
            Some(value) => self.current.insert(name.to_string(), value),
            None => self.current.remove(name),
        };
    }

    fn is_new_record(&self) -> bool {
        self.new_record
    }
}

pub fn config() -> AttachmentConfig {
    AttachmentConfig::new("media", "uploads/{id}", "avatar")
}

pub fn behavior(config: AttachmentConfig, storage: &Arc<MockStorage>) -> AttachmentBehavior {
    AttachmentBehavior::new(config, storage.clone()).unwrap()
}

/// Write a solid PNG of the given size and wrap it as an upload
pub fn image_upload(dir: &Path, name: &str, width: u32, height: u32) -> UploadedFile {
    let path = dir.join(format!("upload-{}", name));
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([30, 144, 255, 255])))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    UploadedFile::new(path, name)
}

pub fn text_upload(dir: &Path, name: &str, contents: &str) -> UploadedFile {
    let path: PathBuf = dir.join(format!("upload-{}", name));
    std::fs::write(&path, contents).unwrap();
    UploadedFile::new(path, name)
}

/// Run a complete save cycle, committing the record between the hooks
pub async fn save(
    behavior: &AttachmentBehavior,
    record: &mut TestRecord,
    file: Option<UploadedFile>,
) -> stowage_core::AppResult<stowage_attachments::SaveReport> {
    let mut lifecycle = behavior.coordinator();
    lifecycle.before_validate(record, file)?;
    lifecycle.before_save(record)?;
    record.commit();
    lifecycle.after_save(record).await
}
