use serde::{Deserialize, Serialize};
use table_insights::{ChartSeries, ChartSpec, Row};

/// Request payload for /ai-dashboard.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AiDashboardRequest {
    pub data: Vec<Row>,
}

/// Request payload for /dashboard/series.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SeriesRequest {
    pub data: Vec<Row>,
    /// Usually the `charts` array returned by /ai-dashboard.
    pub charts: Vec<ChartSpec>,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub series: Vec<ChartSeries>,
}
