//! Reverse foreign-key lookup: which columns elsewhere point at a table.

use crate::schema::Schema;
use std::collections::HashMap;
use std::fmt;

/// A column that references some table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referrer {
    pub table: String,
    pub column: String,
}

/// Table name to the columns referencing it, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseIndex {
    by_target: HashMap<String, Vec<Referrer>>,
}

impl ReverseIndex {
    /// Inverts every `references` edge in `schema`.
    ///
    /// Always built from the whole schema, independent of which tables end up
    /// rendered. Dangling targets are indexed like any other.
    pub fn build(schema: &Schema) -> Self {
        let mut by_target: HashMap<String, Vec<Referrer>> = HashMap::new();
        for table in schema.tables() {
            for column in table.columns() {
                if let Some(target) = &column.references {
                    by_target.entry(target.table.clone()).or_default().push(Referrer {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
            }
        }
        Self { by_target }
    }

    pub fn referrers(&self, table: &str) -> &[Referrer] {
        self.by_target.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Referenced table names, sorted.
    pub fn targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_target.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Total number of referencing columns.
    pub fn len(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

/// A foreign key whose target table or column does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub table: String,
    pub column: String,
    pub target_table: String,
    pub target_column: String,
    pub missing_table: bool,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing_table {
            write!(
                f,
                "{}.{} references unknown table {}",
                self.table, self.column, self.target_table
            )
        } else {
            write!(
                f,
                "{}.{} references unknown column {}.{}",
                self.table, self.column, self.target_table, self.target_column
            )
        }
    }
}

/// Every unresolvable `references` target, in schema order.
pub fn dangling_references(schema: &Schema) -> Vec<DanglingReference> {
    let mut dangling = Vec::new();
    for table in schema.tables() {
        for column in table.columns() {
            let Some(target) = &column.references else {
                continue;
            };
            let resolved = schema.table(&target.table).map(|t| t.column(&target.column).is_some());
            if resolved != Some(true) {
                dangling.push(DanglingReference {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    target_table: target.table.clone(),
                    target_column: target.column.clone(),
                    missing_table: resolved.is_none(),
                });
            }
        }
    }
    dangling
}
