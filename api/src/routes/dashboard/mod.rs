pub mod ai_dashboard_route;
pub mod dashboard_request;
pub mod series_route;
