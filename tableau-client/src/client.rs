//! Tableau REST client (XML over HTTP).
//!
//! Endpoints used:
//!   * POST /api/:version/auth/signin
//!   * GET  /api/:version/sites/:site_id/workbooks?pageSize=1000
//!   * GET  /api/:version/sites/:site_id/workbooks/:workbook_id/views
//!   * GET  /api/:version/sites/:site_id/views/:view_id/data

use std::time::Duration;

use quick_xml::escape::escape;
use reqwest::{Client, header};
use table_insights::{Table, coerce_numeric_columns};
use tracing::{debug, info, instrument};

use crate::{
    errors::{TableauConfigError, TableauResult},
    parser::{parse_sign_in, parse_view_csv, parse_views, parse_workbooks},
    types::{Credentials, Session, SiteAuth, View, Workbook},
};

/// Header carrying the session token on every call after sign-in.
pub const AUTH_HEADER: &str = "X-Tableau-Auth";

const DEFAULT_SERVER_URL: &str = "https://prod-ch-a.online.tableau.com";
const DEFAULT_API_VERSION: &str = "3.25";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for [`TableauClient`].
#[derive(Debug, Clone)]
pub struct TableauConfig {
    /// Server root, e.g. "https://prod-ch-a.online.tableau.com".
    pub server_url: String,
    /// REST API version, e.g. "3.25".
    pub api_version: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for TableauConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TableauConfig {
    /// Reads `TABLEAU_SERVER_URL`, `TABLEAU_API_VERSION` and
    /// `TABLEAU_TIMEOUT_SECS`, falling back to defaults when unset.
    pub fn from_env() -> TableauResult<Self> {
        let mut cfg = Self::default();

        if let Some(url) = non_empty_env("TABLEAU_SERVER_URL") {
            cfg.server_url = url;
        }
        if let Some(version) = non_empty_env("TABLEAU_API_VERSION") {
            cfg.api_version = version;
        }
        if let Some(secs) = non_empty_env("TABLEAU_TIMEOUT_SECS") {
            cfg.timeout_secs = secs
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(TableauConfigError::InvalidNumber {
                    var: "TABLEAU_TIMEOUT_SECS",
                    reason: "expected a positive integer (seconds)",
                })?;
        }

        Ok(cfg)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Tableau HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct TableauClient {
    http: Client,
    base_api: String, // e.g. "https://prod-ch-a.online.tableau.com/api/3.25"
}

impl TableauClient {
    /// Builds the client; the HTTP instance is shared by every call.
    pub fn new(cfg: TableauConfig) -> TableauResult<Self> {
        let server = cfg.server_url.trim().trim_end_matches('/');
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            return Err(TableauConfigError::InvalidBaseUrl(cfg.server_url).into());
        }

        let http = Client::builder()
            .user_agent("tableau-ai-backend/0.1")
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        let base_api = format!("{}/api/{}", server, cfg.api_version.trim());
        debug!("Creating TableauClient with base_api={}", base_api);

        Ok(Self { http, base_api })
    }

    pub fn base_api(&self) -> &str {
        &self.base_api
    }

    /// Exchanges credentials for a session token.
    #[instrument(skip_all, fields(user = %creds.username, site = %creds.site_content_url))]
    pub async fn sign_in(&self, creds: &Credentials) -> TableauResult<Session> {
        let url = format!("{}/auth/signin", self.base_api);
        let body = format!(
            r#"<tsRequest><credentials name="{}" password="{}"><site contentUrl="{}" /></credentials></tsRequest>"#,
            escape(creds.username.as_str()),
            escape(creds.password.as_str()),
            escape(creds.site_content_url.as_str()),
        );
        debug!("Tableau sign_in: {}", url);

        let text = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/xml")
            .header(header::ACCEPT, "application/xml")
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let session = parse_sign_in(&text)?;
        info!(site_id = %session.site_id, "signed in to tableau");
        Ok(session)
    }

    /// Lists workbooks on the site (first 1000).
    #[instrument(skip_all, fields(site_id = %auth.site_id))]
    pub async fn list_workbooks(&self, auth: &SiteAuth) -> TableauResult<Vec<Workbook>> {
        let url = format!(
            "{}/sites/{}/workbooks?pageSize=1000",
            self.base_api,
            urlencoding::encode(&auth.site_id)
        );
        let text = self.get_text(&url, auth).await?;
        let workbooks = parse_workbooks(&text)?;
        debug!(count = workbooks.len(), "workbooks listed");
        Ok(workbooks)
    }

    /// Lists the views of one workbook.
    #[instrument(skip_all, fields(site_id = %auth.site_id, workbook_id = %workbook_id))]
    pub async fn list_views(&self, auth: &SiteAuth, workbook_id: &str) -> TableauResult<Vec<View>> {
        let url = format!(
            "{}/sites/{}/workbooks/{}/views",
            self.base_api,
            urlencoding::encode(&auth.site_id),
            urlencoding::encode(workbook_id)
        );
        let text = self.get_text(&url, auth).await?;
        let views = parse_views(&text)?;
        debug!(count = views.len(), "views listed");
        Ok(views)
    }

    /// Downloads a view's underlying data and returns it as a typed table
    /// (mostly-numeric columns are coerced to numbers).
    #[instrument(skip_all, fields(site_id = %auth.site_id, view_id = %view_id))]
    pub async fn fetch_view_data(&self, auth: &SiteAuth, view_id: &str) -> TableauResult<Table> {
        let url = format!(
            "{}/sites/{}/views/{}/data",
            self.base_api,
            urlencoding::encode(&auth.site_id),
            urlencoding::encode(view_id)
        );
        let text = self.get_text(&url, auth).await?;

        let mut table = parse_view_csv(&text)?;
        let coerced = coerce_numeric_columns(&mut table);
        debug!(
            rows = table.len(),
            columns = table.columns().len(),
            coerced = coerced.len(),
            "view data parsed"
        );
        Ok(table)
    }

    async fn get_text(&self, url: &str, auth: &SiteAuth) -> TableauResult<String> {
        debug!("Tableau GET {}", url);
        let text = self
            .http
            .get(url)
            .header(AUTH_HEADER, &auth.token)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{TableauError, TableauParseError, TableauProviderError};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> TableauClient {
        TableauClient::new(TableauConfig {
            server_url: server.base_url(),
            api_version: "3.25".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn auth() -> SiteAuth {
        SiteAuth {
            token: "tok".into(),
            site_id: "site-1".into(),
        }
    }

    #[test]
    fn rejects_non_http_server_url() {
        let err = TableauClient::new(TableauConfig {
            server_url: "ftp://example.com".into(),
            ..TableauConfig::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            TableauError::Config(TableauConfigError::InvalidBaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn sign_in_escapes_credentials() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/3.25/auth/signin")
                    .header("content-type", "application/xml")
                    .body(
                        r#"<tsRequest><credentials name="a&lt;b" password="p&amp;w"><site contentUrl="" /></credentials></tsRequest>"#,
                    );
                then.status(200).body(
                    r#"<tsResponse><credentials token="T"><site id="S"/><user id="U"/></credentials></tsResponse>"#,
                );
            })
            .await;

        let session = client_for(&server)
            .sign_in(&Credentials {
                username: "a<b".into(),
                password: "p&w".into(),
                site_content_url: String::new(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(session.token, "T");
        assert_eq!(session.site_id, "S");
        assert_eq!(session.user_name, None);
    }

    #[tokio::test]
    async fn sign_in_401_is_unauthorized() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/3.25/auth/signin");
                then.status(401).body("<error/>");
            })
            .await;

        let err = client_for(&server)
            .sign_in(&Credentials {
                username: "u".into(),
                password: "bad".into(),
                site_content_url: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TableauError::Provider(TableauProviderError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn sign_in_200_without_token_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/3.25/auth/signin");
                then.status(200).body("<tsResponse><credentials/></tsResponse>");
            })
            .await;

        let err = client_for(&server)
            .sign_in(&Credentials {
                username: "u".into(),
                password: "p".into(),
                site_content_url: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TableauError::Parse(TableauParseError::MissingAttribute { .. })
        ));
    }

    #[tokio::test]
    async fn workbooks_send_token_and_page_size() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/3.25/sites/site-1/workbooks")
                    .query_param("pageSize", "1000")
                    .header(AUTH_HEADER, "tok");
                then.status(200).body(
                    r#"<tsResponse><workbooks><workbook id="w1" name="One"/></workbooks></tsResponse>"#,
                );
            })
            .await;

        let wbs = client_for(&server).list_workbooks(&auth()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(wbs.len(), 1);
        assert_eq!(wbs[0].id, "w1");
    }

    #[tokio::test]
    async fn views_404_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/3.25/sites/site-1/workbooks/missing/views");
                then.status(404);
            })
            .await;

        let err = client_for(&server)
            .list_views(&auth(), "missing")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TableauError::Provider(TableauProviderError::NotFound)
        ));
    }

    #[tokio::test]
    async fn view_data_is_coerced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/3.25/sites/site-1/views/v1/data")
                    .header(AUTH_HEADER, "tok");
                then.status(200)
                    .body("Region,Sales\nEast,\"1,200\"\nWest,300\nNorth,450\n");
            })
            .await;

        let table = client_for(&server)
            .fetch_view_data(&auth(), "v1")
            .await
            .unwrap();
        assert_eq!(table.rows()[0]["Sales"], json!(1200));
        assert_eq!(table.rows()[0]["Region"], json!("East"));
    }
}
