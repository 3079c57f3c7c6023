use crate::dao::Records;
use crate::error::{AppError, Result};
use crate::model::{
    DownloadSpecification, PageViewSpecification, SessionSpecification, SuccessResponse,
    TrackingRecord, UploadResponse,
};
use crate::pages::{INDEX_PAGE, NOT_FOUND_PAGE};
use crate::utils::{
    base_url, generate_tracking_id, internal_error, requester, short_id_of, stored_filename,
};
use crate::AppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use std::io;
use std::net::SocketAddr;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const UPLOAD_FIELD: &str = "pdf";
const DEFAULT_ORIGINAL_NAME: &str = "document.pdf";

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            tracing::debug!("Rejected upload with content type {:?}", field.content_type());
            return Err(AppError::InvalidContentType);
        }
        let original_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_ORIGINAL_NAME)
            .to_string();
        let contents = field.bytes().await?;
        upload = Some((original_name, contents));
        break;
    }
    let (original_name, contents) = upload.ok_or(AppError::MissingFile)?;

    let tracking_id = generate_tracking_id();
    let short_id = short_id_of(&tracking_id);
    if state.store.find_by_short_id(&short_id).await?.is_some() {
        tracing::warn!(
            "Short id {} is already in use; the new link may resolve to another document",
            short_id
        );
    }

    let filename = stored_filename(&tracking_id);
    state.files.save(&filename, &contents).await?;
    let record = TrackingRecord::new(
        tracking_id.clone(),
        short_id.clone(),
        original_name,
        filename,
    );
    state.store.put(record).await?;
    tracing::info!("Stored upload {} ({} bytes)", tracking_id, contents.len());

    let base = base_url(state.config.public_base_url.as_ref(), &headers);
    Ok(Json(UploadResponse {
        success: true,
        shareable_link: format!("{base}/v/{short_id}"),
        stats_url: format!("{base}/api/stats/{tracking_id}"),
        tracking_id,
        short_id,
    }))
}

pub async fn view_document(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> std::result::Result<Response, (StatusCode, String)> {
    let Some(mut record) = state
        .store
        .find_by_short_id(&short_id)
        .await
        .map_err(internal_error)?
    else {
        return Ok((StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response());
    };

    record.record_view(&requester(&headers, peer));
    let page = state.pages.viewer(&record).map_err(internal_error)?;
    let tracking_id = record.tracking_id.clone();
    match state.store.put(record).await {
        Err(err) => tracing::error!("Saving view of {} failed: {}", tracking_id, err),
        Ok(()) => tracing::debug!("View of {} persisted", tracking_id),
    }
    Ok(Html(page).into_response())
}

pub async fn get_pdf(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> std::result::Result<Response, (StatusCode, String)> {
    let record = find_document(&state, &tracking_id).await?;
    serve_pdf(&state, &record, "inline").await
}

/// Serves the file only; downloads are counted by `log_download`.
pub async fn download_pdf(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> std::result::Result<Response, (StatusCode, String)> {
    let record = find_document(&state, &tracking_id).await?;
    if !record.allow_download {
        return Err((
            StatusCode::FORBIDDEN,
            "Downloads are disabled for this document".into(),
        ));
    }
    serve_pdf(&state, &record, "attachment").await
}

pub async fn log_download(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    payload: std::result::Result<Json<DownloadSpecification>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let Json(specification) = payload?;
    let mut record = find_record(&state, &specification.tracking_id).await?;
    record.record_download(&requester(&headers, peer));
    state.store.put(record).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn track_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    payload: std::result::Result<Json<PageViewSpecification>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let Json(specification) = payload?;
    let mut record = find_record(&state, &specification.tracking_id).await?;
    record.record_page_view(specification.page, &requester(&headers, peer));
    state.store.put(record).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn track_session(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SessionSpecification>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let Json(specification) = payload?;
    let mut record = find_record(&state, &specification.tracking_id).await?;
    if record.attach_session_summary(&specification.summary) {
        state.store.put(record).await?;
    } else {
        tracing::debug!(
            "Session summary for {} has no view entry to attach to",
            specification.tracking_id
        );
    }
    Ok(Json(SuccessResponse::ok()))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<Json<TrackingRecord>> {
    Ok(Json(find_record(&state, &tracking_id).await?))
}

pub async fn get_all_stats(State(state): State<AppState>) -> Result<Json<Records>> {
    Ok(Json(state.store.list().await?))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let record = state
        .store
        .delete(&tracking_id)
        .await?
        .ok_or(AppError::NotFound)?;
    match state.files.remove(&record.filename).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(
            "Backing file {} of {} was already missing",
            record.filename,
            tracking_id
        ),
        Err(err) => {
            tracing::error!(
                "Record {} deleted but file {} is orphaned: {}",
                tracking_id,
                record.filename,
                err
            );
            return Err(err.into());
        }
    }
    tracing::info!("Deleted document {}", tracking_id);
    Ok(Json(SuccessResponse::ok()))
}

async fn find_record(state: &AppState, tracking_id: &str) -> Result<TrackingRecord> {
    state.store.get(tracking_id).await?.ok_or(AppError::NotFound)
}

async fn find_document(
    state: &AppState,
    tracking_id: &str,
) -> std::result::Result<TrackingRecord, (StatusCode, String)> {
    state
        .store
        .get(tracking_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Document not found".into()))
}

async fn serve_pdf(
    state: &AppState,
    record: &TrackingRecord,
    disposition: &str,
) -> std::result::Result<Response, (StatusCode, String)> {
    let contents = state.files.read(&record.filename).await.map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            (StatusCode::NOT_FOUND, "File not found".to_string())
        } else {
            internal_error(err)
        }
    })?;
    let headers = [
        (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "{disposition}; filename=\"{}\"",
                header_safe_filename(&record.original_name)
            ),
        ),
    ];
    Ok((headers, contents).into_response())
}

fn header_safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
