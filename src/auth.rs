use crate::error::AppError;
use crate::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::IntoResponse;
use sha3::{Digest, Sha3_256};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Guards admin routes when an API key digest is configured; passes everything through otherwise.
pub async fn auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let Some(expected) = state.config.encrypted_api_key.as_deref() else {
        return Ok(next.run(request).await);
    };
    let api_key_bytes = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| value.to_str().unwrap_or_default())
        .ok_or_else(|| {
            tracing::warn!("Unauthorized call to {}", request.uri());
            AppError::Unauthorized
        })?
        .as_bytes();

    if expected != hash_api_key(api_key_bytes) {
        tracing::warn!("Invalid api key for {}", request.uri());
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

pub fn hash_api_key(api_key: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(api_key);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex() {
        let digest = hash_api_key(b"secret");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(digest, hash_api_key(b"secret"));
        assert_ne!(digest, hash_api_key(b"Secret"));
    }
}
