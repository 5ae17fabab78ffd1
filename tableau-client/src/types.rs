//! Provider-agnostic shapes returned by the Tableau client.

use serde::Serialize;

/// Sign-in credentials. `site_content_url` is empty for the default site.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub site_content_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("site_content_url", &self.site_content_url)
            .finish()
    }
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub site_id: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
}

/// Token + site pair passed through by the caller on every data call.
#[derive(Clone)]
pub struct SiteAuth {
    pub token: String,
    pub site_id: String,
}

impl std::fmt::Debug for SiteAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteAuth")
            .field("token", &"***")
            .field("site_id", &self.site_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    pub id: String,
    pub name: String,
    pub content_url: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub id: String,
    pub name: String,
    pub content_url: Option<String>,
}
