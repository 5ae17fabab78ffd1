//! Thin Tableau REST client used by the relay API.
//!
//! Sign-in returns a session token that callers pass back on every data
//! call; nothing is cached or refreshed here.

mod client;
mod errors;
mod parser;
pub mod types;

pub use client::{AUTH_HEADER, TableauClient, TableauConfig};
pub use errors::{
    TableauConfigError, TableauError, TableauParseError, TableauProviderError, TableauResult,
};
pub use types::{Credentials, Session, SiteAuth, View, Workbook};
