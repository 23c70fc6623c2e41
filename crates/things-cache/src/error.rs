//! Cache-layer error type.

use things_core::error::ThingsError;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Invalid cached value under {key}: {detail}")]
    Decode { key: String, detail: String },
}

impl CacheError {
    pub(crate) fn decode(key: &str, detail: impl ToString) -> Self {
        CacheError::Decode {
            key: key.into(),
            detail: detail.to_string(),
        }
    }
}

impl From<CacheError> for ThingsError {
    fn from(err: CacheError) -> Self {
        ThingsError::Cache(err.to_string())
    }
}

pub(crate) fn parse_uuid(key: &str, value: &str) -> Result<uuid::Uuid, CacheError> {
    uuid::Uuid::parse_str(value).map_err(|e| CacheError::decode(key, e))
}
