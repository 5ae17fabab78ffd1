//! Parsers for Tableau REST payloads: `tsResponse` XML and view-data CSV.
//!
//! Element and attribute names are matched by local name, so the default
//! `xmlns="http://tableau.com/api"` namespace (or a prefix) does not matter.

use std::collections::HashMap;

use quick_xml::{Reader, events::BytesStart, events::Event};
use serde_json::Value;
use table_insights::{Row, Table};
use tracing::debug;

use crate::{
    errors::TableauParseError,
    types::{Session, View, Workbook},
};

/// One element of interest with its unescaped attributes.
#[derive(Debug)]
struct XmlElement {
    name: String,
    parent: Option<String>,
    attrs: HashMap<String, String>,
}

impl XmlElement {
    /// Attribute value, `None` when absent or blank.
    fn attr(&self, key: &str) -> Option<String> {
        self.attrs
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}

/// Walks the document and collects every element whose local name is in
/// `wanted`, recording the local name of its enclosing element.
fn collect_elements(xml: &str, wanted: &[&str]) -> Result<Vec<XmlElement>, TableauParseError> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<String> = Vec::new();
    let mut out = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e)?;
                if wanted.contains(&name.as_str()) {
                    out.push(read_element(&e, name.clone(), open.last().cloned())?);
                }
                open.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e)?;
                if wanted.contains(&name.as_str()) {
                    out.push(read_element(&e, name, open.last().cloned())?);
                }
            }
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(TableauParseError::Xml(e.to_string())),
        }
    }

    if out.is_empty() && !xml.contains('<') {
        return Err(TableauParseError::Xml("response body is not XML".into()));
    }
    Ok(out)
}

fn local_name(e: &BytesStart<'_>) -> Result<String, TableauParseError> {
    let local = e.local_name();
    std::str::from_utf8(local.as_ref())
        .map(str::to_string)
        .map_err(|err| TableauParseError::Xml(err.to_string()))
}

fn read_element(
    e: &BytesStart<'_>,
    name: String,
    parent: Option<String>,
) -> Result<XmlElement, TableauParseError> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| TableauParseError::Xml(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.local_name().as_ref())
            .map_err(|err| TableauParseError::Xml(err.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| TableauParseError::Xml(err.to_string()))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(XmlElement {
        name,
        parent,
        attrs,
    })
}

/// Parses the `auth/signin` response.
///
/// Requires `<credentials token>` and `<site id>`; the user element is
/// optional (`name` is not always returned).
pub(crate) fn parse_sign_in(xml: &str) -> Result<Session, TableauParseError> {
    let elements = collect_elements(xml, &["credentials", "site", "user"])?;

    let creds = elements
        .iter()
        .find(|e| e.name == "credentials")
        .ok_or(TableauParseError::MissingElement("credentials"))?;

    let token = creds
        .attr("token")
        .ok_or(TableauParseError::MissingAttribute {
            element: "credentials",
            attribute: "token",
        })?;

    let site_id = elements
        .iter()
        .find(|e| e.name == "site")
        .and_then(|e| e.attr("id"))
        .ok_or(TableauParseError::MissingAttribute {
            element: "site",
            attribute: "id",
        })?;

    let user = elements.iter().find(|e| e.name == "user");

    Ok(Session {
        token,
        site_id,
        user_id: user.and_then(|u| u.attr("id")),
        user_name: user.and_then(|u| u.attr("name")),
    })
}

/// Parses a `workbooks` listing. The owning project's name is taken from a
/// `<project>` child of each `<workbook>`.
pub(crate) fn parse_workbooks(xml: &str) -> Result<Vec<Workbook>, TableauParseError> {
    let elements = collect_elements(xml, &["workbook", "project"])?;
    let mut workbooks: Vec<Workbook> = Vec::new();

    for el in elements {
        match el.name.as_str() {
            "workbook" => {
                let Some(id) = el.attr("id") else {
                    debug!("skipping <workbook> without id");
                    continue;
                };
                workbooks.push(Workbook {
                    id,
                    name: el.attr("name").unwrap_or_default(),
                    content_url: el.attr("contentUrl"),
                    project_name: None,
                });
            }
            "project" if el.parent.as_deref() == Some("workbook") => {
                if let Some(last) = workbooks.last_mut() {
                    last.project_name = el.attr("name");
                }
            }
            _ => {}
        }
    }

    Ok(workbooks)
}

/// Parses a workbook's `views` listing.
pub(crate) fn parse_views(xml: &str) -> Result<Vec<View>, TableauParseError> {
    let elements = collect_elements(xml, &["view"])?;
    let views = elements
        .into_iter()
        .filter_map(|el| {
            let id = el.attr("id")?;
            Some(View {
                id,
                name: el.attr("name").unwrap_or_default(),
                content_url: el.attr("contentUrl"),
            })
        })
        .collect();
    Ok(views)
}

/// Parses view-data CSV into a [`Table`].
///
/// The header row names the columns; blank lines are skipped, a leading BOM
/// is dropped and empty cells become `null`. Values stay strings here.
pub(crate) fn parse_view_csv(csv_text: &str) -> Result<Table, TableauParseError> {
    let text = csv_text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut row = Row::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = record
                .get(i)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map_or(Value::Null, |c| Value::String(c.to_string()));
            row.insert(header.clone(), cell);
        }
        rows.push(row);
    }

    Ok(Table::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGN_IN: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<tsResponse xmlns="http://tableau.com/api" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <credentials token="tok&amp;123" estimatedTimeToExpiration="365:23:59">
    <site id="site-42" contentUrl="sales"/>
    <user id="user-7" name="alice"/>
  </credentials>
</tsResponse>"#;

    #[test]
    fn sign_in_reads_token_site_and_user() {
        let s = parse_sign_in(SIGN_IN).unwrap();
        assert_eq!(s.token, "tok&123");
        assert_eq!(s.site_id, "site-42");
        assert_eq!(s.user_id.as_deref(), Some("user-7"));
        assert_eq!(s.user_name.as_deref(), Some("alice"));
    }

    #[test]
    fn sign_in_without_token_is_a_parse_error() {
        let xml = r#"<tsResponse><credentials><site id="s"/></credentials></tsResponse>"#;
        let err = parse_sign_in(xml).unwrap_err();
        assert!(matches!(
            err,
            TableauParseError::MissingAttribute {
                element: "credentials",
                attribute: "token"
            }
        ));
    }

    #[test]
    fn sign_in_without_credentials_element() {
        let err = parse_sign_in("<tsResponse/>").unwrap_err();
        assert!(matches!(err, TableauParseError::MissingElement("credentials")));
    }

    #[test]
    fn plain_text_is_not_xml() {
        let err = parse_sign_in("Service Unavailable").unwrap_err();
        assert!(matches!(err, TableauParseError::Xml(_)));
    }

    #[test]
    fn workbooks_with_projects() {
        let xml = r#"<tsResponse xmlns="http://tableau.com/api">
  <pagination pageNumber="1" pageSize="1000" totalAvailable="2"/>
  <workbooks>
    <workbook id="wb-1" name="Superstore" contentUrl="Superstore">
      <project id="p-1" name="Samples"/>
      <owner id="u-1"/>
      <tags/>
    </workbook>
    <workbook id="wb-2" name="Finance">
      <project id="p-2" name="Default"/>
    </workbook>
  </workbooks>
</tsResponse>"#;
        let wbs = parse_workbooks(xml).unwrap();
        assert_eq!(wbs.len(), 2);
        assert_eq!(wbs[0].name, "Superstore");
        assert_eq!(wbs[0].project_name.as_deref(), Some("Samples"));
        assert_eq!(wbs[1].content_url, None);
        assert_eq!(wbs[1].project_name.as_deref(), Some("Default"));
    }

    #[test]
    fn views_ignore_nested_workbook_refs() {
        let xml = r#"<tsResponse xmlns="http://tableau.com/api"><views>
  <view id="v-1" name="Overview" contentUrl="Superstore/sheets/Overview">
    <workbook id="wb-1"/><owner id="u-1"/>
  </view>
  <view id="v-2" name="Product"/>
</views></tsResponse>"#;
        let views = parse_views(xml).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, "v-1");
        assert_eq!(views[1].name, "Product");
    }

    #[test]
    fn csv_with_bom_blank_lines_and_quotes() {
        let csv = "\u{feff}Region,Sales,Note\nEast,\"1,200\",ok\n\nWest,300,\n";
        let t = parse_view_csv(csv).unwrap();
        assert_eq!(t.columns(), ["Region", "Sales", "Note"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[0]["Sales"], Value::String("1,200".into()));
        assert_eq!(t.rows()[1]["Note"], Value::Null);
    }

    #[test]
    fn header_only_csv_keeps_columns() {
        let t = parse_view_csv("A,B\n").unwrap();
        assert_eq!(t.columns(), ["A", "B"]);
        assert!(t.is_empty());
    }
}
