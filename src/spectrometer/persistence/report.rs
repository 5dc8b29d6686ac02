//! Per-experiment HTML report and the running log index.
//!
//! Reports are produced by substituting `%%key%%` placeholders in a template.
//! Placeholders without a value are left as they are. The log index is only
//! ever extended: each entry goes right after the entry marker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::spectrometer::common::escape_markup;

pub const ENTRY_MARKER: &str = "<!--%%entry%%-->";

pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Experiment %%measurementTaken%%</title></head>
<body>
<h2>Experiment %%measurementTaken%%</h2>
<table>
<tr><td>Scientist</td><td>%%scientistName%%</td></tr>
<tr><td>Light source</td><td>%%lightSource%%</td></tr>
<tr><td>Transmission sample</td><td>%%transmissionSample%%</td></tr>
<tr><td>Shutter (us)</td><td>%%shutter%%</td></tr>
</table>
<p>%%experimentNotes%%</p>
<img src="images/spectrum-%%measurementTaken%%.svg">
<img src="images/processed-%%measurementTaken%%.tiff">
<p><a href="data/spectrum-%%measurementTaken%%.csv">Spectrum data (CSV)</a></p>
</body>
</html>
"#;

pub const DEFAULT_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Spectrometer log book</title></head>
<body>
<h2>Log book</h2>
<table>
<!--%%entry%%-->
</table>
</body>
</html>
"#;

/// Free-text description of an experiment as entered by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentMetadata {
    pub scientist: String,
    pub light_source: String,
    pub sample: String,
    pub notes: String,
}

impl Default for ExperimentMetadata {
    fn default() -> Self {
        Self {
            scientist: String::new(),
            light_source: String::new(),
            sample: "None".to_string(),
            notes: String::new(),
        }
    }
}

pub fn report_values(metadata: &ExperimentMetadata, stamp: &str, shutter_us: u32) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("lightSource", metadata.light_source.clone()),
        ("measurementTaken", stamp.to_string()),
        ("scientistName", metadata.scientist.clone()),
        ("transmissionSample", metadata.sample.clone()),
        ("shutter", shutter_us.to_string()),
        ("experimentNotes", metadata.notes.clone()),
    ])
}

/// Substitutes placeholders in one pass over `template`. Inserted values are
/// never scanned again, so operator text containing `%%key%%` stays literal.
pub fn fill_template(template: &str, values: &BTreeMap<&str, String>) -> String {
    let mut page = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("%%") {
        page.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("%%") else {
            rest = &rest[open..];
            break;
        };
        match values.get(&after[..close]) {
            Some(value) => {
                page.push_str(&escape_markup(value));
                rest = &after[close + 2..];
            }
            None => {
                // unknown key: keep the opening marker, the closing one may start a real placeholder
                page.push_str("%%");
                rest = after;
            }
        }
    }
    page.push_str(rest);
    page
}

#[derive(Debug, Clone, Copy)]
pub struct LogEntry<'a> {
    pub stamp: &'a str,
    pub scientist: &'a str,
    pub light_source: &'a str,
    pub sample: &'a str,
}

impl<'a> LogEntry<'a> {
    pub fn new(stamp: &'a str, metadata: &'a ExperimentMetadata) -> Self {
        Self {
            stamp,
            scientist: &metadata.scientist,
            light_source: &metadata.light_source,
            sample: &metadata.sample,
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<tr><td><img src="images/processed-{stamp}.tiff" align="right">
    Scientist: <strong>{}</strong><br>
    Light source: <strong>{}</strong><br>
    Transmission sample: <strong>{}</strong><br>
    Date and time: <strong>{stamp}</strong><br>
    <a href="experiment-{stamp}.html" target="_blank"><button>Details</button></a></td></tr>"#,
            escape_markup(self.scientist),
            escape_markup(self.light_source),
            escape_markup(self.sample),
            stamp = escape_markup(self.stamp),
        )
    }
}

/// Returns `index` with `entry` placed right after the first entry marker.
/// Without a marker the marker and entry are appended at the end.
pub fn insert_log_entry(index: &str, entry: &LogEntry<'_>) -> String {
    let block = format!("{}\n{}", ENTRY_MARKER, entry.to_html());
    match index.find(ENTRY_MARKER) {
        Some(at) => {
            let mut out = String::with_capacity(index.len() + block.len());
            out.push_str(&index[..at]);
            out.push_str(&block);
            out.push_str(&index[at + ENTRY_MARKER.len()..]);
            out
        }
        None => format!("{}\n{}\n", index.trim_end(), block),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ExperimentMetadata {
        ExperimentMetadata {
            scientist: "Ada".to_string(),
            light_source: "NeoPixel - #ffffff".to_string(),
            sample: "Red <filter>".to_string(),
            notes: "first run".to_string(),
        }
    }

    #[test]
    fn test_fill_template_leaves_unknown_placeholders() {
        let values = report_values(&metadata(), "20240101-120000", 200_000);
        let page = fill_template("%%scientistName%% %%shutter%% %%unknown%% %%transmissionSample%%", &values);
        assert_eq!(page, "Ada 200000 %%unknown%% Red &lt;filter&gt;");
    }

    #[test]
    fn test_placeholders_in_operator_text_stay_literal() {
        let meta = ExperimentMetadata {
            notes: "literal %%scientistName%% and %%shutter%%".to_string(),
            ..metadata()
        };
        let values = report_values(&meta, "20240101-120000", 1);
        let page = fill_template("<p>%%experimentNotes%%</p> by %%scientistName%%", &values);
        assert_eq!(page, "<p>literal %%scientistName%% and %%shutter%%</p> by Ada");
    }

    #[test]
    fn test_unclosed_and_adjacent_markers() {
        let values = report_values(&metadata(), "20240101-120000", 5);
        assert_eq!(fill_template("%%%%shutter%% 50%% off", &values), "%%5 50%% off");
        assert_eq!(fill_template("<!--%%entry%%-->", &values), "<!--%%entry%%-->");
    }

    #[test]
    fn test_default_template_fully_filled() {
        let values = report_values(&metadata(), "20240101-120000", 200_000);
        let page = fill_template(DEFAULT_TEMPLATE, &values);
        assert!(!page.contains("%%"));
        assert!(page.contains("spectrum-20240101-120000.csv"));
    }

    #[test]
    fn test_entries_accumulate_newest_first() {
        let meta = metadata();
        let once = insert_log_entry(DEFAULT_INDEX, &LogEntry::new("20240101-120000", &meta));
        let twice = insert_log_entry(&once, &LogEntry::new("20240102-080000", &meta));

        assert_eq!(twice.matches(ENTRY_MARKER).count(), 1);
        let newer = twice.find("experiment-20240102-080000.html").unwrap();
        let older = twice.find("experiment-20240101-120000.html").unwrap();
        assert!(newer < older);
        // nothing from the previous page is lost
        assert!(twice.contains("<h2>Log book</h2>"));
        assert!(twice.ends_with("</html>\n"));
    }

    #[test]
    fn test_index_without_marker_is_extended() {
        let meta = metadata();
        let page = insert_log_entry("<p>old</p>", &LogEntry::new("1", &meta));
        assert!(page.starts_with("<p>old</p>\n"));
        assert!(page.contains(ENTRY_MARKER));
        assert!(page.contains("experiment-1.html"));
    }

    #[test]
    fn test_metadata_defaults() {
        let meta: ExperimentMetadata = serde_json::from_str(r#"{"scientist": "Bo"}"#).unwrap();
        assert_eq!(meta.scientist, "Bo");
        assert_eq!(meta.sample, "None");
    }
}
