//! Data-side helpers for the Tableau AI relay.
//!
//! Everything here is pure and synchronous:
//! - [`Table`]: rows of scalar cells keyed by column name
//! - [`coerce_numeric_columns`]: upgrade "mostly numeric" text columns
//! - [`extract_dashboard_spec`]: recover `{ "charts": [...] }` from raw model text
//! - [`prompt`]: chat / dashboard prompt builders
//! - [`build_series`]: aggregate chart series for a dashboard spec

pub mod coercion;
pub mod dashboard;
pub mod prompt;
pub mod series;
pub mod table;

pub use coercion::{NUMERIC_COERCION_THRESHOLD, coerce_numeric_columns};
pub use dashboard::{
    Aggregation, ChartSpec, ChartType, DashboardExtractError, DashboardSpec,
    extract_dashboard_spec,
};
pub use prompt::{build_chat_prompt, build_dashboard_prompt};
pub use series::{ChartSeries, build_series};
pub use table::{ColumnKind, Row, Table};
