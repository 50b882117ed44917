//! Result payloads returned by the search backend, and the schema check
//! applied to them before they are cached or shown.
//!
//! ```json
//! { "results": [ { "object": "car", "timestamp": "35.2" } ] }
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::fingerprint::SearchKind;
use crate::error::{RelayError, Result};

lazy_static! {
    static ref SECONDS: Regex = Regex::new(r"^\d+(\.\d+)?s?$").unwrap();
    static ref TIMECODE: Regex = Regex::new(r"^(\d{1,2}:)?\d{1,2}:\d{2}(\.\d+)?$").unwrap();
}

/// A position in the video, as the backend chose to encode it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(f64),
    Text(String),
}

impl Timestamp {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Timestamp::Seconds(s) if s.is_finite() && *s >= 0.0 => Some(*s),
            Timestamp::Seconds(_) => None,
            Timestamp::Text(text) => parse_timestamp(text),
        }
    }
}

/// Parse `"35.2"`, `"35.2s"`, `"MM:SS"` or `"HH:MM:SS"` into seconds.
pub fn parse_timestamp(text: &str) -> Option<f64> {
    let text = text.trim();
    if SECONDS.is_match(text) {
        return text.trim_end_matches('s').parse().ok();
    }
    if !TIMECODE.is_match(text) {
        return None;
    }
    let parts: Vec<f64> = text
        .split(':')
        .map(|p| p.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [m, s] => Some(m * 60.0 + s),
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptHit {
    pub text: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectHit {
    pub object: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TocEntry {
    pub object: String,
    pub timestamps: Vec<Timestamp>,
}

#[derive(Debug, Deserialize)]
struct Results<T> {
    results: Vec<T>,
}

/// One row ready for display: a label and where to seek.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub label: String,
    pub seconds: f64,
}

fn parse<T: for<'de> Deserialize<'de>>(payload: &Value) -> Result<Vec<T>> {
    let parsed: Results<T> = serde_json::from_value(payload.clone())?;
    Ok(parsed.results)
}

fn check_label(label: &str, index: usize) -> Result<()> {
    if label.trim().is_empty() {
        return Err(RelayError::MalformedResponse(format!(
            "result {} has an empty label",
            index
        )));
    }
    Ok(())
}

fn check_timestamp(ts: &Timestamp, index: usize) -> Result<f64> {
    ts.seconds().ok_or_else(|| {
        RelayError::MalformedResponse(format!("result {} has an invalid timestamp {:?}", index, ts))
    })
}

/// Verify a payload has the shape expected for `kind`.
pub fn validate(kind: SearchKind, payload: &Value) -> Result<()> {
    hits(kind, payload).map(|_| ())
}

/// Flatten a payload into display rows. Fails exactly when [`validate`] does.
pub fn hits(kind: SearchKind, payload: &Value) -> Result<Vec<Hit>> {
    let mut rows = Vec::new();
    match kind {
        SearchKind::Transcript => {
            for (i, hit) in parse::<TranscriptHit>(payload)?.into_iter().enumerate() {
                check_label(&hit.text, i)?;
                let seconds = check_timestamp(&hit.timestamp, i)?;
                rows.push(Hit { label: hit.text, seconds });
            }
        }
        SearchKind::Object => {
            for (i, hit) in parse::<ObjectHit>(payload)?.into_iter().enumerate() {
                check_label(&hit.object, i)?;
                let seconds = check_timestamp(&hit.timestamp, i)?;
                rows.push(Hit { label: hit.object, seconds });
            }
        }
        SearchKind::Toc => {
            for (i, entry) in parse::<TocEntry>(payload)?.into_iter().enumerate() {
                check_label(&entry.object, i)?;
                for ts in &entry.timestamps {
                    let seconds = check_timestamp(ts, i)?;
                    rows.push(Hit {
                        label: entry.object.clone(),
                        seconds,
                    });
                }
            }
        }
    }
    Ok(rows)
}

/// Number of entries under `results`, whatever their shape.
pub fn result_count(payload: &Value) -> usize {
    payload
        .get("results")
        .and_then(|r| r.as_array())
        .map(|r| r.len())
        .unwrap_or(0)
}
