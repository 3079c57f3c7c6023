//! HTML pages served to browsers.
//!
//! The viewer page is rendered with `MiniJinja`; auto-escaping applies because
//! the template name ends in `.html`.

use crate::model::TrackingRecord;
use minijinja::{context, Environment};

pub const INDEX_PAGE: &str = include_str!("../templates/index.html");
pub const NOT_FOUND_PAGE: &str = include_str!("../templates/not_found.html");

const VIEWER_TEMPLATE: &str = "viewer.html";

pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(VIEWER_TEMPLATE, include_str!("../templates/viewer.html"))?;
        Ok(Self { env })
    }

    pub fn viewer(&self, record: &TrackingRecord) -> Result<String, minijinja::Error> {
        self.env.get_template(VIEWER_TEMPLATE)?.render(context! {
            tracking_id => &record.tracking_id,
            original_name => &record.original_name,
            allow_download => record.allow_download,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_escapes_filename_and_embeds_tracking_id() {
        let pages = Pages::new().unwrap();
        let record = TrackingRecord::new(
            "tracking123".into(),
            "tracking".into(),
            "<script>alert(1)</script>.pdf".into(),
            "1-tracking123.pdf".into(),
        );

        let html = pages.viewer(&record).unwrap();

        assert!(html.contains(r#"data-tracking-id="tracking123""#));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains(r#"id="download""#));
    }

    #[test]
    fn viewer_hides_download_when_disabled() {
        let pages = Pages::new().unwrap();
        let mut record = TrackingRecord::new(
            "tracking123".into(),
            "tracking".into(),
            "doc.pdf".into(),
            "1-tracking123.pdf".into(),
        );
        record.allow_download = false;

        let html = pages.viewer(&record).unwrap();

        assert!(!html.contains(r#"id="download""#));
    }
}
