use serde::Serialize;
use table_insights::{ColumnKind, Row, Table};
use tableau_client::{View, Workbook};

#[derive(Debug, Serialize)]
pub struct WorkbooksResponse {
    pub workbooks: Vec<Workbook>,
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub views: Vec<View>,
}

#[derive(Debug, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

/// Typed view data: columns in header order, their kinds, and coerced rows.
#[derive(Debug, Serialize)]
pub struct ViewDataResponse {
    pub columns: Vec<String>,
    pub column_kinds: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
}

impl From<Table> for ViewDataResponse {
    fn from(table: Table) -> Self {
        let column_kinds = table
            .column_kinds()
            .into_iter()
            .map(|(name, kind)| ColumnInfo { name, kind })
            .collect();
        let columns = table.columns().to_vec();
        Self {
            columns,
            column_kinds,
            rows: table.into_rows(),
        }
    }
}
