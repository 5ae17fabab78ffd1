//! Dashboard chart definitions and their recovery from raw model text.
//!
//! The model is asked for a bare JSON object but frequently wraps it in a
//! markdown fence, adds prose around it, or appends commentary after a valid
//! value. [`extract_dashboard_spec`] runs a short ordered pipeline:
//!
//! fence-strip -> brace bounds -> parse -> narrow on trailing data -> `charts` check
//!
//! Each stage either hands a value to the next one or fails with a specific
//! [`DashboardExtractError`] that carries the original text.

use std::{borrow::Cow, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

const FENCE: &str = "```";

/// Reasons the model output could not be turned into a dashboard spec.
#[derive(Debug, Error)]
pub enum DashboardExtractError {
    /// No `{ ... }` region in the output.
    #[error("model output does not contain a JSON object")]
    UnrecognizableOutput { raw: String },

    /// A `{ ... }` region exists but is not valid JSON.
    #[error("model returned malformed JSON: {detail}")]
    MalformedModelJson { detail: String, raw: String },

    /// Valid JSON, but not an object with a `charts` array.
    #[error("model JSON has no `charts` array")]
    MissingChartsField { raw: String },
}

impl DashboardExtractError {
    /// Untouched model output, for diagnostics.
    pub fn raw_output(&self) -> &str {
        match self {
            Self::UnrecognizableOutput { raw }
            | Self::MalformedModelJson { raw, .. }
            | Self::MissingChartsField { raw } => raw,
        }
    }
}

/// Recovers a `{ "charts": [...] }` object from free-form model output.
pub fn extract_dashboard_spec(raw: &str) -> Result<DashboardSpec, DashboardExtractError> {
    let text = strip_code_fence(raw.trim());

    let candidate =
        json_candidate(&text).ok_or_else(|| DashboardExtractError::UnrecognizableOutput {
            raw: raw.to_string(),
        })?;

    let value =
        parse_candidate(candidate).map_err(|detail| DashboardExtractError::MalformedModelJson {
            detail,
            raw: raw.to_string(),
        })?;

    require_charts(value).ok_or_else(|| DashboardExtractError::MissingChartsField {
        raw: raw.to_string(),
    })
}

/// Drops the opening fence line (with its optional language tag) and every
/// remaining fence marker. Text that does not start with a fence is kept.
fn strip_code_fence(text: &str) -> Cow<'_, str> {
    if !text.starts_with(FENCE) {
        return Cow::Borrowed(text);
    }
    let body = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    Cow::Owned(body.replace(FENCE, ""))
}

/// First `{` through last `}` inclusive.
fn json_candidate(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parses the candidate; only a "complete value followed by extra content"
/// failure is retried, on the prefix that ends where the extra content starts.
fn parse_candidate(candidate: &str) -> Result<Value, String> {
    let err = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let Some(offset) = trailing_content_offset(candidate) else {
        return Err(err.to_string());
    };

    debug!(offset, "model JSON has trailing content; parsing the leading value only");
    serde_json::from_str::<Value>(&candidate[..offset]).map_err(|e| e.to_string())
}

/// Byte offset where non-whitespace content follows a complete leading JSON
/// value, or `None` when the leading value itself is invalid.
fn trailing_content_offset(candidate: &str) -> Option<usize> {
    let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<IgnoredAny>();
    match stream.next() {
        Some(Ok(_)) => {
            let offset = stream.byte_offset();
            (!candidate[offset..].trim().is_empty()).then_some(offset)
        }
        _ => None,
    }
}

fn require_charts(value: Value) -> Option<DashboardSpec> {
    match value {
        Value::Object(map) if map.get("charts").is_some_and(Value::is_array) => {
            Some(DashboardSpec(map))
        }
        _ => None,
    }
}

/// A recovered dashboard specification.
///
/// Holds the object exactly as the model produced it (extra keys included);
/// the only guarantee is that `charts` is an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DashboardSpec(Map<String, Value>);

impl DashboardSpec {
    /// Raw chart entries.
    pub fn charts(&self) -> &[Value] {
        self.0
            .get("charts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Chart entries that deserialize as [`ChartSpec`]; the rest are skipped.
    pub fn chart_specs(&self) -> Vec<ChartSpec> {
        self.charts()
            .iter()
            .filter_map(|c| ChartSpec::deserialize(c).ok())
            .collect()
    }

    /// Column names referenced by `x`/`y` that are not in `columns`.
    pub fn unknown_columns(&self, columns: &[String]) -> Vec<String> {
        let mut unknown = Vec::new();
        for chart in self.chart_specs() {
            for name in [chart.x, chart.y].into_iter().flatten() {
                if !columns.contains(&name) && !unknown.contains(&name) {
                    unknown.push(name);
                }
            }
        }
        unknown
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Chart kinds the frontend can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
}

impl FromStr for ChartType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// How `y` values are combined per `x` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
    Count,
}

impl FromStr for Aggregation {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" | "total" => Ok(Self::Sum),
            "mean" | "avg" | "average" => Ok(Self::Mean),
            "count" => Ok(Self::Count),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct UnknownVariant(String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant `{}`", self.0)
    }
}

/// One chart entry. Every field is optional because model output is not
/// trusted; unknown `type`/`agg` strings read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_enum")]
    pub chart_type: Option<ChartType>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub x: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub y: Option<String>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub agg: Option<Aggregation>,
}

fn lenient_enum<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

fn blank_as_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
