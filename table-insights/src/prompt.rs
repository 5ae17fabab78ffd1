//! Prompt builders for the chat and dashboard paths.
//!
//! Both prompts embed the column schema and the full rows as JSON; the model
//! has no other way to see the data.

use std::fmt::Write;

use crate::table::Table;

/// Builds the prompt that answers a free-form question about `table`.
pub fn build_chat_prompt(table: &Table, question: &str) -> String {
    let mut s = String::with_capacity(2048);

    writeln!(
        s,
        "You are a data analyst assistant embedded in a Tableau dashboard. \
Answer the user's question using ONLY the data below."
    )
    .ok();
    writeln!(
        s,
        "If the data is insufficient to answer, say so plainly instead of guessing. \
Be concise; include the numbers you used."
    )
    .ok();

    write_schema(&mut s, table);
    write_rows(&mut s, table);

    writeln!(s, "\nQuestion:\n{}", question.trim()).ok();
    s
}

/// Builds the prompt that asks for a `{ "charts": [...] }` dashboard spec.
pub fn build_dashboard_prompt(table: &Table) -> String {
    let mut s = String::with_capacity(2048);

    writeln!(
        s,
        "You design small dashboards for a Tableau extension. \
Look at the table below and propose between 2 and 4 useful charts."
    )
    .ok();

    writeln!(
        s,
        "\nOUTPUT FORMAT (MANDATORY): Return ONLY one JSON object, no markdown, no prose, \
shaped exactly like:"
    )
    .ok();
    writeln!(
        s,
        r#"{{"charts":[{{"title":"...","type":"bar","x":"<column>","y":"<column or null>","agg":"sum"}}]}}"#
    )
    .ok();

    writeln!(s, "\nRules:").ok();
    writeln!(s, "- `charts` holds 2 to 4 entries.").ok();
    writeln!(s, "- `type` is one of: bar, line, pie.").ok();
    writeln!(s, "- `agg` is one of: sum, mean, count. Use count when `y` is null.").ok();
    writeln!(
        s,
        "- `x` and `y` MUST be column names copied exactly from the column list below."
    )
    .ok();
    writeln!(s, "- Prefer numeric columns for `y` and categorical columns for `x`.").ok();

    write_schema(&mut s, table);
    write_rows(&mut s, table);
    s
}

fn write_schema(s: &mut String, table: &Table) {
    writeln!(s, "\nColumns ({}):", table.columns().len()).ok();
    for (name, kind) in table.column_kinds() {
        writeln!(s, "- {name}: {}", kind.as_str()).ok();
    }
}

fn write_rows(s: &mut String, table: &Table) {
    let rows = serde_json::to_string(table.rows()).unwrap_or_else(|_| "[]".to_string());
    writeln!(s, "\nRows ({}), as JSON:\n{rows}", table.len()).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> Table {
        Table::from_rows(vec![
            json!({"Region": "East", "Sales": 10}).as_object().cloned().unwrap(),
        ])
    }

    #[test]
    fn chat_prompt_carries_schema_rows_and_question() {
        let p = build_chat_prompt(&table(), "  Which region sells most?  ");
        assert!(p.contains("- Region: text"));
        assert!(p.contains("- Sales: numeric"));
        assert!(p.contains(r#"[{"Region":"East","Sales":10}]"#));
        assert!(p.ends_with("Which region sells most?\n"));
    }

    #[test]
    fn dashboard_prompt_lists_allowed_values() {
        let p = build_dashboard_prompt(&table());
        assert!(p.contains("bar, line, pie"));
        assert!(p.contains("sum, mean, count"));
        assert!(p.contains(r#"{"charts":[{"title":"...""#));
        assert!(p.contains("Rows (1)"));
    }
}
