use serde::Deserialize;
use tableau_client::{Credentials, SiteAuth};

use crate::error_handler::{AppResult, require_text};

/// Request payload for /tableau/signin.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
    /// Empty (or absent) selects the default site.
    pub site_content_url: Option<String>,
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .field("site_content_url", &self.site_content_url)
            .finish()
    }
}

impl SignInRequest {
    pub fn credentials(self) -> AppResult<Credentials> {
        let username = require_text("username", &self.username)?.to_string();
        require_text("password", &self.password)?;
        Ok(Credentials {
            username,
            password: self.password,
            site_content_url: self
                .site_content_url
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        })
    }
}

/// Token + site pair sent back by the client after sign-in.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AuthFields {
    pub token: String,
    pub site_id: String,
}

impl AuthFields {
    pub fn site_auth(&self) -> AppResult<SiteAuth> {
        Ok(SiteAuth {
            token: require_text("token", &self.token)?.to_string(),
            site_id: require_text("site_id", &self.site_id)?.to_string(),
        })
    }
}

/// Request payload for /tableau/workbooks.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct WorkbooksRequest {
    #[serde(flatten)]
    pub auth: AuthFields,
}

/// Request payload for /tableau/views.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ViewsRequest {
    #[serde(flatten)]
    pub auth: AuthFields,
    pub workbook_id: String,
}

/// Request payload for /tableau/view-data.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ViewDataRequest {
    #[serde(flatten)]
    pub auth: AuthFields,
    pub view_id: String,
}
