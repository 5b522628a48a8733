//! Table rendering for the shell: query result rows and admin listings.

use crate::{PropertyBag, ResultRow, RowValue};
use tabled::{builder::Builder, settings::Style};

/// Render query result rows into a human-friendly table string, one line
/// per row with the entity summarized in query syntax.
pub fn render_rows(rows: &[ResultRow]) -> String {
    if rows.is_empty() {
        return "<no rows>".into();
    }

    let mut builder = Builder::default();
    builder.push_record(["variable", "entity", "details"]);

    for row in rows {
        let (entity, details) = describe(&row.value);
        builder.push_record([row.variable.clone(), entity, details]);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}

/// Render arbitrary string rows. Used by the REPL for admin listings such
/// as SHOW DATABASES and DESCRIBE DATABASE.
pub fn render_string_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}

fn describe(value: &RowValue) -> (String, String) {
    match value {
        RowValue::Node {
            id,
            labels,
            properties,
        } => {
            let labels = labels
                .iter()
                .map(|l| format!(":{l}"))
                .collect::<Vec<_>>()
                .join("");
            (format!("node({id})"), format!("{labels} {}", props(properties)))
        }
        RowValue::Edge {
            id,
            ty,
            source,
            target,
            properties,
        } => (
            format!("edge({id})"),
            format!(":{ty} {source}->{target} {}", props(properties)),
        ),
    }
}

fn props(bag: &PropertyBag) -> String {
    let inner = bag
        .0
        .iter()
        .map(|p| format!("{}: {}", p.key, p.value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{inner}}}")
}
