//! Display formatting for journal records.
//!
//! Journal values are strings; a handful get rewritten for display when a
//! cycle's records are assembled for listing. Classification is explicit:
//! each value is first tagged as a date, a duration or raw text, then
//! rendered by tag. Only the field literally named `duration` is eligible
//! for duration rewriting; everything that is neither parses as a date nor a
//! duration passes through unchanged.

use crate::journal::JournalRecord;
use chrono::NaiveDateTime;
use serde_json::{json, Value};

/// Journal field that holds an elapsed-seconds count.
const DURATION_FIELD: &str = "duration";

/// ISO-8601 layout used by journal timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A journal value tagged for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// An ISO-8601 timestamp.
    Date(NaiveDateTime),
    /// Whole seconds from the `duration` field.
    Duration(u64),
    /// Anything else; rendered verbatim.
    Raw(String),
}

/// Tag a journal value by field name and content.
pub fn classify(field: &str, value: &str) -> FieldValue {
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return FieldValue::Date(timestamp);
    }
    if field == DURATION_FIELD {
        if let Ok(seconds) = value.parse::<u64>() {
            return FieldValue::Duration(seconds);
        }
    }
    FieldValue::Raw(value.to_string())
}

/// Render a tagged value relative to `now`.
///
/// Dates on the current calendar day become `Today at: HH:MM:SS`, the
/// previous day `Yesterday at: HH:MM:SS`, anything else
/// `DD/MM/YYYY HH:MM:SS`. Durations render as zero-padded `HH:MM:SS` with
/// hours widening past two digits as needed.
pub fn render(value: &FieldValue, now: NaiveDateTime) -> String {
    match value {
        FieldValue::Date(timestamp) => {
            let date = timestamp.date();
            if date == now.date() {
                format!("Today at: {}", timestamp.format("%H:%M:%S"))
            } else if Some(date) == now.date().pred_opt() {
                format!("Yesterday at: {}", timestamp.format("%H:%M:%S"))
            } else {
                timestamp.format("%d/%m/%Y %H:%M:%S").to_string()
            }
        }
        FieldValue::Duration(seconds) => {
            let hours = seconds / 3600;
            let minutes = (seconds % 3600) / 60;
            format!("{hours:02}:{minutes:02}:{:02}", seconds % 60)
        }
        FieldValue::Raw(text) => text.clone(),
    }
}

/// Classify-then-render one field value.
pub fn format_field(field: &str, value: &str, now: NaiveDateTime) -> String {
    render(&classify(field, value), now)
}

/// A record as a display-formatted JSON object, field order preserved.
/// Null values stay null.
pub fn format_record(record: &JournalRecord, now: NaiveDateTime) -> Value {
    let mut object = serde_json::Map::new();
    for (field, value) in record.iter() {
        let rendered = match value {
            Some(text) => json!(format_field(field, text, now)),
            None => Value::Null,
        };
        object.insert(field.to_string(), rendered);
    }
    Value::Object(object)
}
