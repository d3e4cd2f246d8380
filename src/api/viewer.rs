//! Public filing viewer (dart.fss.or.kr): URL construction and page parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Cell, Table};

const VIEWER_MAIN_URL: &str = "https://dart.fss.or.kr/dsaf001/main.do";

/// Viewer URL for a receipt number. No network call, no validation.
pub fn build_url(rcp_no: &str) -> String {
    format!("{}?rcpNo={}", VIEWER_MAIN_URL, rcp_no)
}

static ATTACHMENT_OPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<option\s+value=["'](rcpNo=\d+[^"']*)["'][^>]*>([^<]*)</option>"#)
        .expect("attachment pattern is valid")
});

static SUB_DOC_NODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"node\d+\['text'\]\s*=\s*"([^"]*)";[\s\S]*?"#,
        r#"node\d+\['rcpNo'\]\s*=\s*"(\d+)";\s*"#,
        r#"node\d+\['dcmNo'\]\s*=\s*"(\d+)";\s*"#,
        r#"node\d+\['eleId'\]\s*=\s*"(\d+)";\s*"#,
        r#"node\d+\['offset'\]\s*=\s*"(\d+)";\s*"#,
        r#"node\d+\['length'\]\s*=\s*"(\d+)";\s*"#,
        r#"node\d+\['dtd'\]\s*=\s*"([^"]*)";"#,
    ))
    .expect("sub-document pattern is valid")
});

/// Attached documents listed in the viewer page's attachment selector
pub fn parse_attachments(html: &str, viewer_base: &str) -> Table {
    let mut table = Table::new(["title", "url"]);
    for caps in ATTACHMENT_OPTION.captures_iter(html) {
        let title = caps[2].trim();
        let url = format!("{}/dsaf001/main.do?{}", viewer_base, &caps[1]);
        table.push_row(vec![Cell::from(title), Cell::from(url)]);
    }
    table
}

/// Sub-documents from the viewer page's table-of-contents script
pub fn parse_sub_docs(html: &str, viewer_base: &str) -> Table {
    let mut table = Table::new(["title", "url"]);
    for caps in SUB_DOC_NODE.captures_iter(html) {
        let url = format!(
            "{}/report/viewer.do?rcpNo={}&dcmNo={}&eleId={}&offset={}&length={}&dtd={}",
            viewer_base, &caps[2], &caps[3], &caps[4], &caps[5], &caps[6], &caps[7]
        );
        table.push_row(vec![Cell::from(caps[1].trim()), Cell::from(url)]);
    }
    table
}
