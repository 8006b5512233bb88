use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::config::MediaConfig;

/// Fixed transform for profile photos, recorded as object metadata so the
/// fronting image proxy serves them at display size.
pub const PHOTO_WIDTH: u32 = 150;
pub const PHOTO_CROP: &str = "scale";

#[derive(Debug, Clone, Serialize)]
pub struct StoredPhoto {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload_photo(&self, body: Bytes, content_type: &str) -> anyhow::Result<StoredPhoto>;
    async fn delete_photo(&self, id: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct S3MediaStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3MediaStore {
    pub async fn new(cfg: &MediaConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_base_url: cfg.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload_photo(&self, body: Bytes, content_type: &str) -> anyhow::Result<StoredPhoto> {
        let key = photo_key(content_type);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .metadata("width", PHOTO_WIDTH.to_string())
            .metadata("crop", PHOTO_CROP)
            .send()
            .await
            .with_context(|| format!("s3 put_object {}", key))?;

        let url = format!("{}/{}", self.public_base_url, key);
        Ok(StoredPhoto { id: key, url })
    }

    async fn delete_photo(&self, id: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(id)
            .send()
            .await
            .with_context(|| format!("s3 delete_object {}", id))?;
        Ok(())
    }
}

pub(crate) fn photo_key(content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("users/{}.{}", Uuid::new_v4(), ext)
}

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }

    #[test]
    fn photo_keys_live_under_users_prefix() {
        let key = photo_key("image/png");
        assert!(key.starts_with("users/"));
        assert!(key.ends_with(".png"));
        assert_ne!(photo_key("image/png"), key);
    }

    #[tokio::test]
    async fn fake_store_round_trip() {
        let state = AppState::fake();

        let photo = state
            .media
            .upload_photo(Bytes::from_static(b"img-bytes"), "image/jpeg")
            .await
            .unwrap();
        assert!(photo.id.starts_with("users/"));
        assert!(photo.id.ends_with(".jpg"));
        assert!(photo.url.contains(&photo.id));

        state.media.delete_photo(&photo.id).await.unwrap();
    }
}
