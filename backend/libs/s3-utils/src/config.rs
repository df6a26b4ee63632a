/// Object storage configuration (S3 API, MinIO-compatible)
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Endpoint URL, e.g. `http://minio:9000`
    pub endpoint: String,
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Path-style URLs (`endpoint/bucket/key`); MinIO requires this
    pub path_style: bool,
}

impl S3Config {
    /// Load from `MINIO_*` variables
    pub fn from_env() -> Self {
        let host = std::env::var("MINIO_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port: u16 = std::env::var("MINIO_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9000);
        let scheme = match std::env::var("MINIO_USE_TLS").as_deref() {
            Ok("true") | Ok("1") => "https",
            _ => "http",
        };

        Self {
            endpoint: format!("{scheme}://{host}:{port}"),
            access_key: std::env::var("MINIO_ROOT_USER").unwrap_or_else(|_| "minioadmin".to_string()),
            secret_key: std::env::var("MINIO_ROOT_PASSWORD")
                .unwrap_or_else(|_| "minioadmin".to_string()),
            bucket: std::env::var("MINIO_STORAGE").unwrap_or_else(|_| "movies-storage".to_string()),
            region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            path_style: true,
        }
    }

    /// Public URL of an object
    pub fn object_url(&self, key: &str) -> String {
        let endpoint = self.endpoint.trim_end_matches('/');
        if self.path_style {
            format!("{}/{}/{}", endpoint, self.bucket, key)
        } else {
            match endpoint.split_once("://") {
                Some((scheme, host)) => format!("{scheme}://{}.{host}/{key}", self.bucket),
                None => format!("{}.{}/{}", self.bucket, endpoint, key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(path_style: bool) -> S3Config {
        S3Config {
            endpoint: "http://minio:9000/".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
            bucket: "movies-storage".to_string(),
            region: "us-east-1".to_string(),
            path_style,
        }
    }

    #[test]
    fn test_object_url_path_style() {
        assert_eq!(
            config(true).object_url("avatars/1_me.png"),
            "http://minio:9000/movies-storage/avatars/1_me.png"
        );
    }

    #[test]
    fn test_object_url_virtual_hosted_style() {
        assert_eq!(
            config(false).object_url("avatars/1_me.png"),
            "http://movies-storage.minio:9000/avatars/1_me.png"
        );
    }
}
