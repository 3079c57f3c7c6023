use crate::model::Requester;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, StatusCode};
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::error::Error;
use std::net::SocketAddr;
use url::Url;

pub const SHORT_ID_LENGTH: usize = 8;
const TRACKING_ID_BYTES: usize = 16;
const UNKNOWN: &str = "unknown";

pub fn internal_error<E>(err: E) -> (StatusCode, String)
where
    E: Error,
{
    tracing::error!("{}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}

pub fn get_header(name: &str, headers: &HeaderMap) -> Option<String> {
    headers
        .get(name)
        .map(|value| value.to_str().unwrap_or_default().to_string())
}

pub fn generate_tracking_id() -> String {
    let mut bytes = [0u8; TRACKING_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

pub fn short_id_of(tracking_id: &str) -> String {
    tracking_id.chars().take(SHORT_ID_LENGTH).collect()
}

pub fn stored_filename(tracking_id: &str) -> String {
    format!("{}-{}.pdf", chrono::Utc::now().timestamp_millis(), tracking_id)
}

/// First hop of `X-Forwarded-For` when present, otherwise the peer address.
pub fn requester(headers: &HeaderMap, peer: Option<ConnectInfo<SocketAddr>>) -> Requester {
    let forwarded = get_header("X-Forwarded-For", headers).and_then(|value| {
        value
            .split(',')
            .next()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(String::from)
    });
    let ip = forwarded
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN.into());
    let user_agent = get_header(header::USER_AGENT.as_str(), headers)
        .filter(|agent| !agent.is_empty())
        .unwrap_or_else(|| UNKNOWN.into());
    Requester { ip, user_agent }
}

/// Origin for generated links: the configured base URL, else the Host header.
pub fn base_url(configured: Option<&Url>, headers: &HeaderMap) -> String {
    match configured {
        Some(url) => url.as_str().trim_end_matches('/').to_string(),
        None => {
            let host = get_header(header::HOST.as_str(), headers)
                .unwrap_or_else(|| "localhost".into());
            format!("http://{host}")
        }
    }
}
