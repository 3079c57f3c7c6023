use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    pub tracking_id: String,
    pub short_id: String,
    pub original_name: String,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub views: u64,
    pub downloads: u64,
    pub access_log: Vec<AccessLogEntry>,
    pub allow_download: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    View,
    Download,
    PageView,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AccessAction,
    pub ip: String,
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_viewed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<u32>,
}

/// Who performed an access, taken from the request headers.
#[derive(Clone, Debug)]
pub struct Requester {
    pub ip: String,
    pub user_agent: String,
}

/// Reading-session data reported by the viewer page when it is closed.
#[derive(Deserialize, Clone, Copy, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub time_spent: u64,
    pub pages_viewed: u32,
    pub total_pages: u32,
}

impl SessionSummary {
    /// Percentage of pages seen, rounded. Zero for documents with no pages.
    pub fn completion_rate(&self) -> u32 {
        if self.total_pages == 0 {
            return 0;
        }
        (f64::from(self.pages_viewed) * 100.0 / f64::from(self.total_pages)).round() as u32
    }
}

impl AccessLogEntry {
    pub fn new(action: AccessAction, requester: &Requester) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            ip: requester.ip.clone(),
            user_agent: requester.user_agent.clone(),
            page: None,
            time_spent: None,
            pages_viewed: None,
            total_pages: None,
            completion_rate: None,
        }
    }
}

impl TrackingRecord {
    pub fn new(
        tracking_id: String,
        short_id: String,
        original_name: String,
        filename: String,
    ) -> Self {
        Self {
            tracking_id,
            short_id,
            original_name,
            filename,
            upload_date: Utc::now(),
            views: 0,
            downloads: 0,
            access_log: Vec::new(),
            allow_download: true,
        }
    }

    pub fn record_view(&mut self, requester: &Requester) {
        self.views += 1;
        self.access_log.push(AccessLogEntry::new(AccessAction::View, requester));
    }

    pub fn record_download(&mut self, requester: &Requester) {
        self.downloads += 1;
        self.access_log
            .push(AccessLogEntry::new(AccessAction::Download, requester));
    }

    /// Appends unconditionally; repeated pages are deduplicated by the viewer, not here.
    pub fn record_page_view(&mut self, page: u32, requester: &Requester) {
        let mut entry = AccessLogEntry::new(AccessAction::PageView, requester);
        entry.page = Some(page);
        self.access_log.push(entry);
    }

    /// Overwrites the summary fields of the most recent view entry in place.
    ///
    /// Returns `false` when the log holds no view entry, in which case nothing
    /// changes. A repeated summary for the same view replaces the earlier one.
    pub fn attach_session_summary(&mut self, summary: &SessionSummary) -> bool {
        let Some(entry) = self
            .access_log
            .iter_mut()
            .rev()
            .find(|entry| entry.action == AccessAction::View)
        else {
            return false;
        };
        entry.time_spent = Some(summary.time_spent);
        entry.pages_viewed = Some(summary.pages_viewed);
        entry.total_pages = Some(summary.total_pages);
        entry.completion_rate = Some(summary.completion_rate());
        true
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub tracking_id: String,
    pub short_id: String,
    pub shareable_link: String,
    pub stats_url: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSpecification {
    pub tracking_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewSpecification {
    pub tracking_id: String,
    pub page: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSpecification {
    pub tracking_id: String,
    #[serde(flatten)]
    pub summary: SessionSummary,
}
