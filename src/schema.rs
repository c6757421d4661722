//! Read-only schema model: tables, columns, indexes and foreign-key targets.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("Duplicate table: {0}")]
    DuplicateTable(String),
    #[error("Duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub primary_key_name: Option<String>,
    columns: Vec<Column>,
    indexes: Vec<Index>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub typ: String,
    /// Display-only size/precision, e.g. `255` or `10,2`.
    pub length: Option<String>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub references: Option<ColumnRef>,
}

/// Target of a foreign key: `table(column)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    /// Like [`Schema::table`], falling back to a case-insensitive match the
    /// way unquoted SQL identifiers resolve.
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.table(name)
            .or_else(|| self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name)))
    }

    pub fn find_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        let position = self
            .tables
            .iter()
            .position(|t| t.name == name)
            .or_else(|| self.tables.iter().position(|t| t.name.eq_ignore_ascii_case(name)))?;
        self.tables.get_mut(position)
    }

    pub fn add_table(&mut self, table: Table) -> Result<(), SchemaError> {
        if self.table(&table.name).is_some() {
            return Err(SchemaError::DuplicateTable(table.name));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Builder form of [`Schema::add_table`].
    pub fn with_table(mut self, table: Table) -> Result<Self, SchemaError> {
        self.add_table(table)?;
        Ok(self)
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key_name: None,
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Case-insensitive fallback of [`Table::column`].
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.column(name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn find_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        let position = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| self.columns.iter().position(|c| c.name.eq_ignore_ascii_case(name)))?;
        self.columns.get_mut(position)
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key_name.as_deref() == Some(column)
    }

    pub fn add_column(&mut self, column: Column) -> Result<(), SchemaError> {
        if self.column(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Indexes are keyed by name; a second index with the same name is dropped.
    pub fn add_index(&mut self, index: Index) -> bool {
        if self.index(&index.name).is_some() {
            return false;
        }
        self.indexes.push(index);
        true
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key_name = Some(column.into());
        self
    }

    pub fn with_column(mut self, column: Column) -> Result<Self, SchemaError> {
        self.add_column(column)?;
        Ok(self)
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.add_index(index);
        self
    }
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            length: None,
            nullable: true,
            default_value: None,
            references: None,
        }
    }

    pub fn length(mut self, length: impl Into<String>) -> Self {
        self.length = Some(length.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ColumnRef {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

impl Index {
    pub fn new<I, S>(name: impl Into<String>, unique: bool, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            unique,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_keep_insertion_order() {
        let schema = Schema::new("shop")
            .with_table(Table::new("orders"))
            .unwrap()
            .with_table(Table::new("customers"))
            .unwrap();

        let names: Vec<&str> = schema.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "customers"]);
        assert!(schema.table("customers").is_some());
        assert!(schema.table("products").is_none());
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut schema = Schema::new("shop");
        schema.add_table(Table::new("orders")).unwrap();
        let err = schema.add_table(Table::new("orders")).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateTable("orders".to_string()));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let table = Table::new("orders")
            .with_column(Column::new("id", "int"))
            .unwrap();
        let err = table.with_column(Column::new("id", "bigint")).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_column_lookup_and_primary_key() {
        let table = Table::new("orders")
            .with_primary_key("id")
            .with_column(Column::new("id", "int").not_null())
            .unwrap()
            .with_column(Column::new("customer_id", "int").references("customers", "id"))
            .unwrap();

        assert!(table.is_primary_key("id"));
        assert!(!table.is_primary_key("customer_id"));
        let fk = table.column("customer_id").unwrap();
        assert_eq!(
            fk.references,
            Some(ColumnRef {
                table: "customers".to_string(),
                column: "id".to_string()
            })
        );
        assert!(fk.nullable);
        assert!(!table.column("id").unwrap().nullable);
    }

    #[test]
    fn test_duplicate_index_name_ignored() {
        let mut table = Table::new("orders");
        assert!(table.add_index(Index::new("orders_idx", false, ["id"])));
        assert!(!table.add_index(Index::new("orders_idx", true, ["other"])));
        assert_eq!(table.indexes().len(), 1);
        assert!(!table.indexes()[0].unique);
    }

    #[test]
    fn test_find_falls_back_to_case_insensitive_match() {
        let mut schema = Schema::new("shop")
            .with_table(
                Table::new("Customers")
                    .with_column(Column::new("ID", "int"))
                    .unwrap(),
            )
            .unwrap();

        assert!(schema.table("customers").is_none());
        let table = schema.find_table("customers").unwrap();
        assert_eq!(table.name, "Customers");
        assert_eq!(table.find_column("id").unwrap().name, "ID");
        assert!(table.find_column("name").is_none());

        schema
            .find_table_mut("CUSTOMERS")
            .and_then(|t| t.find_column_mut("Id"))
            .unwrap()
            .nullable = false;
        assert!(!schema.tables()[0].columns()[0].nullable);
    }
}
