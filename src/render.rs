//! HTML documentation renderer.
//!
//! Produces one document per table plus a front page. Schema-derived text is
//! escaped; annotation values are trusted markup and are inserted verbatim.

use crate::annotations::{AnnotationKey, Annotations};
use crate::refs::{DanglingReference, ReverseIndex, dangling_references};
use crate::schema::{Column, ColumnRef, Index, Schema, Table};
use crate::sink::{DocumentId, DocumentSink, SinkError, column_anchor};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fallback for a table summary on the front page.
pub const NO_SUMMARY: &str = "no summary available";
/// Fallback for empty description and default cells.
pub const PLACEHOLDER: &str = "&nbsp;";
/// Front page title when `schema.name` is not annotated.
pub const DEFAULT_TITLE: &str = "Table index";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no such table in schema: {0}")]
    UnknownTable(String),
    #[error("tables {first} and {second} would both be written to {file}")]
    FileNameClash {
        first: String,
        second: String,
        file: String,
    },
    #[error("{first} ({count} dangling reference(s) in total)")]
    DanglingReference {
        first: DanglingReference,
        count: usize,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("Failed to format document: {0}")]
    Format(#[from] fmt::Error),
}

/// What to do with a foreign key whose target does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingPolicy {
    /// Fail before anything is written.
    #[default]
    Reject,
    /// Render the column without a link.
    Unlinked,
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub dangling: DanglingPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub tables: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render `subset` (every table when `None`) and then the front page.
    ///
    /// The subset and, under [`DanglingPolicy::Reject`], every foreign key
    /// are validated before the first document reaches `sink`.
    pub fn render(
        &self,
        schema: &Schema,
        annotations: &Annotations,
        index: &ReverseIndex,
        subset: Option<&[String]>,
        sink: &mut dyn DocumentSink,
    ) -> Result<RenderSummary, RenderError> {
        let tables = select_tables(schema, subset)?;
        check_file_names(&tables)?;
        self.check_references(schema)?;

        let page = Page {
            schema,
            annotations,
            index,
            rendered: tables.iter().map(|t| t.name.as_str()).collect(),
        };
        debug!(schema = %schema.name, tables = tables.len(), "rendering documents");

        for table in &tables {
            let id = DocumentId::table(&table.name);
            let document = page.table_document(table)?;
            sink.write_document(&id, &document)?;
            info!(document = %id, "wrote table document");
        }

        let document = page.front_document(&tables)?;
        sink.write_document(&DocumentId::Front, &document)?;
        info!(document = %DocumentId::Front, "wrote front document");

        Ok(RenderSummary {
            tables: tables.len(),
        })
    }

    fn check_references(&self, schema: &Schema) -> Result<(), RenderError> {
        let dangling = dangling_references(schema);
        match self.options.dangling {
            DanglingPolicy::Reject => match dangling.first() {
                Some(first) => Err(RenderError::DanglingReference {
                    first: first.clone(),
                    count: dangling.len(),
                }),
                None => Ok(()),
            },
            DanglingPolicy::Unlinked => {
                for reference in &dangling {
                    warn!(%reference, "rendering dangling foreign key without a link");
                }
                Ok(())
            }
        }
    }
}

/// Resolves the subset against the schema; duplicates keep their first position.
fn select_tables<'a>(schema: &'a Schema, subset: Option<&[String]>) -> Result<Vec<&'a Table>, RenderError> {
    let Some(names) = subset else {
        return Ok(schema.tables().iter().collect());
    };
    let mut seen = HashSet::new();
    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let table = schema
            .table(name)
            .ok_or_else(|| RenderError::UnknownTable(name.clone()))?;
        if seen.insert(name.as_str()) {
            tables.push(table);
        } else {
            debug!(table = %name, "table listed twice, keeping first position");
        }
    }
    Ok(tables)
}

/// File names must stay distinct on case-insensitive file systems too.
fn check_file_names(tables: &[&Table]) -> Result<(), RenderError> {
    let mut taken: HashMap<String, &str> = HashMap::with_capacity(tables.len());
    for table in tables {
        let file = DocumentId::table(&table.name).file_name();
        if let Some(first) = taken.insert(file.to_ascii_lowercase(), &table.name) {
            return Err(RenderError::FileNameClash {
                first: first.to_string(),
                second: table.name.clone(),
                file,
            });
        }
    }
    Ok(())
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Everything one render pass shares between documents.
struct Page<'a> {
    schema: &'a Schema,
    annotations: &'a Annotations,
    index: &'a ReverseIndex,
    rendered: HashSet<&'a str>,
}

impl Page<'_> {
    fn header(&self, out: &mut String, title: &str) -> fmt::Result {
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(
            out,
            "<html><head><meta charset=\"utf-8\"><title>{} ({})</title></head>",
            title,
            escape(&self.schema.name)
        )?;
        writeln!(out, "<body>")
    }

    fn footer(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "<hr>")?;
        writeln!(
            out,
            "<small>Generated by dbdoc {}</small>",
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(out, "</body></html>")
    }

    /// `label` linked to `table`'s document, or bare when that document is
    /// not part of this render.
    fn table_link(&self, table: &str, anchor: Option<&str>, label: &str) -> String {
        if !self.rendered.contains(table) {
            return label.to_string();
        }
        let href = DocumentId::table(table).file_name();
        match anchor {
            Some(column) => format!("<a href=\"{}#{}\">{}</a>", href, column_anchor(column), label),
            None => format!("<a href=\"{}\">{}</a>", href, label),
        }
    }

    fn reference_link(&self, target: &ColumnRef, label: &str) -> String {
        match self.schema.table(&target.table) {
            Some(table) if table.column(&target.column).is_some() => {
                self.table_link(&target.table, Some(&target.column), label)
            }
            Some(_) => self.table_link(&target.table, None, label),
            None => label.to_string(),
        }
    }

    fn table_document(&self, table: &Table) -> Result<String, fmt::Error> {
        let name = escape(&table.name);
        let mut out = String::new();

        self.header(&mut out, &name)?;
        writeln!(out, "<small><a href=\"index.html\">index</a> | {}</small>", name)?;
        writeln!(out, "<h1>Table {}</h1>", name)?;
        writeln!(out, "<hr>")?;

        if let Some(shortdesc) = self.annotations.section(&AnnotationKey::TableShortDesc(&table.name)) {
            writeln!(out, "<p>{}</p>", shortdesc)?;
        }
        if let Some(notes) = self.annotations.section(&AnnotationKey::TableNotes(&table.name)) {
            writeln!(out, "<h2>Notes</h2>")?;
            writeln!(out, "{}", notes)?;
        }

        writeln!(out, "<h2>Columns</h2>")?;
        writeln!(out, "<table border=\"1\">")?;
        writeln!(
            out,
            "<tr><th>Column</th><th>Type</th><th>Nullable</th><th>Default</th><th>Description</th></tr>"
        )?;
        for column in table.columns() {
            self.column_row(&mut out, table, column)?;
        }
        writeln!(out, "</table>")?;
        if table.primary_key_name.is_some() {
            writeln!(out, "<p>(primary key column name in <strong>bold</strong>)</p>")?;
        }

        self.referenced_by(&mut out, table)?;
        self.indexes(&mut out, table)?;

        self.footer(&mut out)?;
        Ok(out)
    }

    fn column_row(&self, out: &mut String, table: &Table, column: &Column) -> fmt::Result {
        let name = escape(&column.name);
        let label = if table.is_primary_key(&column.name) {
            format!("<strong>{}</strong>", name)
        } else {
            name.to_string()
        };
        let name_cell = match &column.references {
            Some(target) => self.reference_link(target, &label),
            None => label,
        };
        let typ = match &column.length {
            Some(length) => format!("{} ({})", escape(&column.typ), escape(length)),
            None => escape(&column.typ).into_owned(),
        };
        let default = column
            .default_value
            .as_deref()
            .map(escape)
            .unwrap_or(Cow::Borrowed(PLACEHOLDER));
        let description = self.annotations.lookup(
            &AnnotationKey::ColumnShortDesc {
                table: &table.name,
                column: &column.name,
            },
            PLACEHOLDER,
        );

        writeln!(
            out,
            "<tr id=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            column_anchor(&column.name),
            name_cell,
            typ,
            yes_no(column.nullable),
            default,
            description
        )
    }

    fn referenced_by(&self, out: &mut String, table: &Table) -> fmt::Result {
        writeln!(out, "<h2>Referenced by</h2>")?;
        let referrers = self.index.referrers(&table.name);
        if referrers.is_empty() {
            return writeln!(out, "<p>None.</p>");
        }

        writeln!(out, "<table border=\"1\">")?;
        writeln!(out, "<tr><th>Table</th><th>Column</th><th>Description</th></tr>")?;
        for referrer in referrers {
            let description = self.annotations.lookup(
                &AnnotationKey::ColumnShortDesc {
                    table: &referrer.table,
                    column: &referrer.column,
                },
                PLACEHOLDER,
            );
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                self.table_link(&referrer.table, None, &escape(&referrer.table)),
                escape(&referrer.column),
                description
            )?;
        }
        writeln!(out, "</table>")
    }

    fn indexes(&self, out: &mut String, table: &Table) -> fmt::Result {
        writeln!(out, "<h2>Indexes</h2>")?;
        if table.indexes().is_empty() {
            return writeln!(out, "<p>None.</p>");
        }

        writeln!(out, "<table border=\"1\">")?;
        writeln!(
            out,
            "<tr><th>Index name</th><th>Unique</th><th>Columns</th><th>Description</th></tr>"
        )?;
        for index in table.indexes() {
            self.index_row(out, table, index)?;
        }
        writeln!(out, "</table>")
    }

    fn index_row(&self, out: &mut String, table: &Table, index: &Index) -> fmt::Result {
        let description = self.annotations.lookup(
            &AnnotationKey::IndexShortDesc {
                table: &table.name,
                index: &index.name,
            },
            PLACEHOLDER,
        );
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&index.name),
            yes_no(index.unique),
            escape(&index.columns.join(", ")),
            description
        )
    }

    fn front_document(&self, tables: &[&Table]) -> Result<String, fmt::Error> {
        let title = self
            .annotations
            .section(&AnnotationKey::SchemaName)
            .unwrap_or(DEFAULT_TITLE);
        let mut out = String::new();

        self.header(&mut out, title)?;
        writeln!(out, "<h1>{}</h1>", title)?;
        writeln!(out, "<hr>")?;
        if let Some(notes) = self.annotations.section(&AnnotationKey::SchemaNotes) {
            writeln!(out, "<h2>Notes</h2>")?;
            writeln!(out, "{}", notes)?;
        }

        writeln!(out, "<h2>Tables</h2>")?;
        writeln!(out, "<table border=\"1\">")?;
        writeln!(out, "<tr><th>Table</th><th>Summary</th></tr>")?;
        for table in tables {
            let summary = self
                .annotations
                .lookup(&AnnotationKey::TableShortDesc(&table.name), NO_SUMMARY);
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td></tr>",
                self.table_link(&table.name, None, &escape(&table.name)),
                summary
            )?;
        }
        writeln!(out, "</table>")?;

        self.footer(&mut out)?;
        Ok(out)
    }
}
