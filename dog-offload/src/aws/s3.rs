use std::env;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ObjectCannedAcl, StorageClass};
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::{ObjectStore, ObjectWriteParams, OffloadError, OffloadResult};

/// S3 connection settings read from the environment
#[derive(Debug)]
struct S3Config {
    region: String,
    access_key_id: String,
    secret_access_key: String,
    endpoint_url: Option<String>,
}

impl S3Config {
    fn from_env() -> OffloadResult<Self> {
        fn get_env(key: &str) -> OffloadResult<String> {
            env::var(key)
                .map_err(|_| OffloadError::invalid(format!("{} environment variable required", key)))
        }

        Ok(Self {
            region: get_env("DOG_OFFLOAD_S3_REGION")?,
            access_key_id: get_env("DOG_OFFLOAD_S3_ACCESS_KEY_ID")?,
            secret_access_key: get_env("DOG_OFFLOAD_S3_SECRET_ACCESS_KEY")?,
            endpoint_url: env::var("DOG_OFFLOAD_S3_ENDPOINT_URL").ok(),
        })
    }
}

/// Object store backed by S3 or an S3-compatible service
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build from an already loaded SDK configuration
    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }

    /// Build from `DOG_OFFLOAD_S3_*` variables. Setting
    /// `DOG_OFFLOAD_S3_ENDPOINT_URL` targets an S3-compatible service and
    /// switches to path-style addressing.
    pub async fn from_env() -> OffloadResult<Self> {
        let config = S3Config::from_env()?;
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "dog-offload",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(config.endpoint_url.is_some())
                .build(),
        );
        Ok(Self::new(client))
    }

    fn map_aws_error<E>(bucket: &str, err: E) -> OffloadError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        match err.code() {
            Some("NoSuchBucket") => OffloadError::bucket_not_found(bucket),
            _ => OffloadError::object_store(err),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        params: &ObjectWriteParams,
    ) -> OffloadResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body));

        if let Some(acl) = &params.acl {
            request = request.acl(ObjectCannedAcl::from(acl.as_str()));
        }
        if let Some(storage_class) = &params.storage_class {
            request = request.storage_class(StorageClass::from(storage_class.as_str()));
        }
        if let Some(content_type) = &params.content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|e| Self::map_aws_error(bucket, e))?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> OffloadResult<Bytes> {
        let result = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::map_aws_error(bucket, e))?;

        let body = result.body.collect().await.map_err(OffloadError::object_store)?;
        Ok(body.into_bytes())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> OffloadResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::map_aws_error(bucket, e))?;
        Ok(())
    }
}
