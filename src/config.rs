use std::env;
use std::path::PathBuf;
use url::Url;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_DATA_FILE: &str = "data/tracking.json";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,

    /// JSON document holding every tracking record
    pub data_file: PathBuf,

    /// Directory receiving uploaded PDFs
    pub upload_dir: PathBuf,

    /// Origin used for shareable links; falls back to the request Host header
    pub public_base_url: Option<Url>,

    pub max_upload_bytes: usize,

    /// SHA3-256 hex digest of the admin API key. Admin routes are open when unset.
    pub encrypted_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            public_base_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            encrypted_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparseable numbers fall back to defaults; a malformed base URL is an error.
    pub fn from_env() -> Result<Self, url::ParseError> {
        let default = Self::default();

        let public_base_url = match non_empty_var("PUBLIC_BASE_URL") {
            Some(value) => Some(Url::parse(&value)?),
            None => None,
        };

        Ok(Self {
            server_address: non_empty_var("SERVER_ADDRESS").unwrap_or(default.server_address),

            data_file: non_empty_var("DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.data_file),

            upload_dir: non_empty_var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            public_base_url,

            max_upload_bytes: non_empty_var("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_bytes),

            encrypted_api_key: non_empty_var("ENCRYPTED_API_KEY").map(|v| v.to_lowercase()),
        })
    }

    /// Configuration rooted in a scratch directory, used by tests.
    pub fn for_directory(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            data_file: dir.join("tracking.json"),
            upload_dir: dir.join("uploads"),
            ..Self::default()
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server_address, "0.0.0.0:3000");
        assert_eq!(config.data_file, PathBuf::from("data/tracking.json"));
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert!(config.public_base_url.is_none());
        assert!(config.encrypted_api_key.is_none());
    }

    #[test]
    fn test_malformed_base_url_is_rejected() {
        env::set_var("PUBLIC_BASE_URL", "not a url");
        let result = Config::from_env();
        env::remove_var("PUBLIC_BASE_URL");

        assert!(result.is_err());
    }

    #[test]
    fn test_directory_config() {
        let config = Config::for_directory("/tmp/tracker");
        assert_eq!(config.data_file, PathBuf::from("/tmp/tracker/tracking.json"));
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/tracker/uploads"));
    }
}
