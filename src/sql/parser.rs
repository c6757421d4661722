//! Parser for the DDL subset that describes tables: `CREATE TABLE`,
//! `CREATE [UNIQUE] INDEX` and `ALTER TABLE ... ADD`.

use super::dialect::Dialect;
use super::lexer::{Lexer, Spanned, Token};
use super::types::split_type;
use crate::schema::{Column, ColumnRef, Index, Schema, SchemaError, Table};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SqlParseError {
    #[error("line {line}: expected {expected}, found {found:?}")]
    Expected {
        expected: &'static str,
        found: Token,
        line: usize,
    },
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Parse a SQL dump into a [`Schema`] named `schema_name`.
pub fn parse_sql(input: &str, dialect: Dialect, schema_name: &str) -> Result<Schema, SqlParseError> {
    let dialect = dialect.resolve(input);
    debug!(%dialect, "parsing SQL dump");
    let tokens = Lexer::new(input, dialect).tokenize();
    Parser::new(tokens).parse(schema_name)
}

/// Words that end a column's type and start its options.
const TYPE_TERMINATORS: &[&str] = &[
    "AUTO_INCREMENT",
    "AUTOINCREMENT",
    "COLLATE",
    "COMMENT",
    "GENERATED",
    "IDENTITY",
    "CHARSET",
];

/// Words that may sit between `CREATE` and `TABLE`/`INDEX`.
const CREATE_MODIFIERS: &[&str] = &["OR", "REPLACE", "TEMPORARY", "TEMP", "UNLOGGED", "GLOBAL", "LOCAL"];

enum TableConstraint {
    PrimaryKey(Option<String>, Vec<String>),
    Index {
        name: Option<String>,
        unique: bool,
        columns: Vec<String>,
    },
    ForeignKey(ForeignKey),
}

struct ForeignKey {
    columns: Vec<String>,
    target: String,
    target_columns: Vec<String>,
}

/// Foreign key waiting for every table to be known.
struct PendingFk {
    table: String,
    fk: ForeignKey,
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    pending_fks: Vec<PendingFk>,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            pending_fks: Vec::new(),
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).map(|s| &s.token).unwrap_or(&Token::Eof)
    }

    fn peek_next(&self) -> &Token {
        self.tokens.get(self.pos + 1).map(|s| &s.token).unwrap_or(&Token::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.current().is_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expected(&self, expected: &'static str) -> SqlParseError {
        match self.current() {
            Token::Eof => SqlParseError::UnexpectedEof,
            found => SqlParseError::Expected {
                expected,
                found: found.clone(),
                line: self.line(),
            },
        }
    }

    fn ident(&mut self) -> Option<String> {
        match self.current() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    /// `name` or `schema.name`; the last part is kept.
    fn qualified_name(&mut self) -> Option<String> {
        let mut name = self.ident()?;
        while self.current() == &Token::Dot {
            self.advance();
            match self.ident() {
                Some(part) => name = part,
                None => break,
            }
        }
        Some(name)
    }

    fn skip_if_exists(&mut self) {
        if self.eat(&Token::If) {
            self.eat(&Token::Not);
            self.eat(&Token::Exists);
        }
    }

    fn parse(mut self, schema_name: &str) -> Result<Schema, SqlParseError> {
        let mut schema = Schema::new(schema_name);

        while self.current() != &Token::Eof {
            match self.current() {
                Token::Create => {
                    self.advance();
                    while CREATE_MODIFIERS.iter().any(|w| self.current().is_word(w)) {
                        self.advance();
                    }
                    match self.current() {
                        Token::Table => {
                            self.advance();
                            if let Some(table) = self.parse_create_table()? {
                                debug!(table = %table.name, columns = table.columns().len(), "parsed table");
                                schema.add_table(table)?;
                            }
                        }
                        Token::Unique if self.peek_next() == &Token::Index => {
                            self.advance();
                            self.advance();
                            self.parse_create_index(&mut schema, true);
                        }
                        Token::Index => {
                            self.advance();
                            self.parse_create_index(&mut schema, false);
                        }
                        // Views, sequences, functions and the like.
                        _ => self.skip_statement(),
                    }
                }
                Token::Alter => {
                    self.advance();
                    self.parse_alter_table(&mut schema)?;
                }
                _ => self.advance(),
            }
        }

        self.resolve_foreign_keys(&mut schema);
        Ok(schema)
    }

    fn parse_create_table(&mut self) -> Result<Option<Table>, SqlParseError> {
        self.skip_if_exists();
        let Some(name) = self.qualified_name() else {
            self.skip_statement();
            return Ok(None);
        };
        if !self.eat(&Token::LParen) {
            // CREATE TABLE ... AS SELECT, LIKE, PARTITION OF
            self.skip_statement();
            return Ok(None);
        }

        let mut table = Table::new(name);
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(SqlParseError::UnexpectedEof),
                Token::Comma => self.advance(),
                Token::Ident(word)
                    if (word.eq_ignore_ascii_case("FULLTEXT") || word.eq_ignore_ascii_case("SPATIAL"))
                        && matches!(self.peek_next(), Token::Key | Token::Index) =>
                {
                    self.advance();
                    if let Some(constraint) = self.parse_table_constraint(None)? {
                        self.apply_constraint(&mut table, constraint);
                    }
                }
                Token::Ident(name) => {
                    let name = name.clone();
                    self.advance();
                    self.parse_column(&mut table, name)?;
                }
                Token::Key | Token::Index if self.keyword_column_ahead() => {
                    let name = if self.current() == &Token::Key { "key" } else { "index" };
                    self.advance();
                    self.parse_column(&mut table, name.to_string())?;
                }
                Token::Constraint => {
                    self.advance();
                    let name = self.ident();
                    if let Some(constraint) = self.parse_table_constraint(name)? {
                        self.apply_constraint(&mut table, constraint);
                    }
                }
                _ => match self.parse_table_constraint(None)? {
                    Some(constraint) => self.apply_constraint(&mut table, constraint),
                    None => self.skip_until(&[Token::Comma, Token::RParen]),
                },
            }
        }

        // Table options (ENGINE=, PARTITION BY, ...)
        self.skip_statement();
        Ok(Some(table))
    }

    /// A column literally named `key` or `index`, e.g. `key TEXT NOT NULL`.
    fn keyword_column_ahead(&self) -> bool {
        let after = self.tokens.get(self.pos + 2).map(|s| &s.token);
        matches!(self.peek_next(), Token::Ident(_)) && !matches!(after, Some(Token::LParen | Token::Using))
    }

    fn parse_column(&mut self, table: &mut Table, name: String) -> Result<(), SqlParseError> {
        let mut raw_type = String::new();
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::Ident(word) if depth == 0 => {
                    let stop = TYPE_TERMINATORS.iter().any(|t| word.eq_ignore_ascii_case(t))
                        || (!raw_type.is_empty()
                            && (word.eq_ignore_ascii_case("CHARACTER") && self.peek_next().is_word("SET")));
                    if stop {
                        break;
                    }
                    if !raw_type.is_empty() && !raw_type.ends_with('(') && word != "[]" {
                        raw_type.push(' ');
                    }
                    raw_type.push_str(word);
                }
                Token::Ident(word) | Token::Num(word) => raw_type.push_str(word),
                Token::LParen => {
                    depth += 1;
                    raw_type.push('(');
                }
                Token::RParen if depth > 0 => {
                    depth -= 1;
                    raw_type.push(')');
                }
                Token::Comma if depth > 0 => raw_type.push(','),
                Token::Str(s) if depth > 0 => {
                    raw_type.push('\'');
                    raw_type.push_str(s);
                    raw_type.push('\'');
                }
                _ => break,
            }
            self.advance();
        }

        let (typ, length) = split_type(&raw_type);
        let mut column = Column::new(name.clone(), typ);
        column.length = length;

        let mut is_pk = false;
        loop {
            match self.current() {
                Token::Comma | Token::RParen | Token::Eof => break,
                Token::Primary => {
                    self.advance();
                    self.eat(&Token::Key);
                    is_pk = true;
                }
                Token::Not => {
                    self.advance();
                    if self.eat(&Token::Null) {
                        column.nullable = false;
                    }
                }
                Token::Unique => {
                    self.advance();
                    self.eat(&Token::Key);
                    table.add_index(Index::new(
                        format!("{}_{}_key", table.name, name),
                        true,
                        [name.clone()],
                    ));
                }
                Token::Default => {
                    self.advance();
                    column.default_value = Some(self.parse_default_value());
                }
                Token::References => {
                    self.advance();
                    let (target, target_columns) = self.parse_reference()?;
                    self.pending_fks.push(PendingFk {
                        table: table.name.clone(),
                        fk: ForeignKey {
                            columns: vec![name.clone()],
                            target,
                            target_columns,
                        },
                    });
                }
                Token::On => self.skip_on_actions(),
                Token::Constraint => {
                    self.advance();
                    self.ident();
                }
                Token::Check | Token::LParen => self.skip_parenthesized(),
                _ => self.advance(),
            }
        }

        if is_pk {
            column.nullable = false;
            table.primary_key_name = Some(name);
        }
        table.add_column(column)?;
        Ok(())
    }

    fn parse_default_value(&mut self) -> String {
        let value = match self.current() {
            Token::Str(s) => format!("'{}'", s),
            Token::Num(n) => n.clone(),
            Token::Null => "NULL".to_string(),
            Token::Ident(s) => {
                let mut value = s.clone();
                if self.peek_next() == &Token::LParen {
                    self.advance();
                    self.advance();
                    value.push('(');
                    value.push_str(&self.collect_until_paren());
                    value.push(')');
                    return value;
                }
                value
            }
            Token::LParen => {
                self.advance();
                return format!("({})", self.collect_until_paren());
            }
            _ => return String::new(),
        };
        self.advance();
        value
    }

    /// Collects tokens up to the matching `)` and consumes it.
    fn collect_until_paren(&mut self) -> String {
        let mut out = String::new();
        let mut depth = 1;
        loop {
            let piece = match self.current() {
                Token::LParen => {
                    depth += 1;
                    "(".to_string()
                }
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        break;
                    }
                    ")".to_string()
                }
                Token::Ident(s) | Token::Num(s) => s.clone(),
                Token::Str(s) => format!("'{}'", s),
                Token::Comma => ",".to_string(),
                Token::Null => "NULL".to_string(),
                Token::Eof => break,
                _ => String::new(),
            };
            let glue = !out.is_empty()
                && !out.ends_with('(')
                && !matches!(piece.as_str(), ")" | "," | "(" | "");
            if glue {
                out.push(' ');
            }
            out.push_str(&piece);
            self.advance();
        }
        out
    }

    /// `table [(col, ...)]` after REFERENCES.
    fn parse_reference(&mut self) -> Result<(String, Vec<String>), SqlParseError> {
        let Some(target) = self.qualified_name() else {
            return Err(self.expected("referenced table"));
        };
        let columns = self.parse_column_list();
        self.skip_on_actions();
        Ok((target, columns))
    }

    /// Parses PRIMARY KEY, UNIQUE, INDEX/KEY and FOREIGN KEY clauses.
    fn parse_table_constraint(
        &mut self,
        name: Option<String>,
    ) -> Result<Option<TableConstraint>, SqlParseError> {
        let constraint = match self.current() {
            Token::Primary => {
                self.advance();
                self.eat(&Token::Key);
                self.skip_index_method();
                TableConstraint::PrimaryKey(name, self.parse_index_columns())
            }
            Token::Unique => {
                self.advance();
                if !self.eat(&Token::Key) {
                    self.eat(&Token::Index);
                }
                let name = name.or_else(|| self.ident());
                self.skip_index_method();
                TableConstraint::Index {
                    name,
                    unique: true,
                    columns: self.parse_index_columns(),
                }
            }
            Token::Index | Token::Key => {
                self.advance();
                let name = name.or_else(|| self.ident());
                self.skip_index_method();
                TableConstraint::Index {
                    name,
                    unique: false,
                    columns: self.parse_index_columns(),
                }
            }
            Token::Foreign => {
                self.advance();
                self.eat(&Token::Key);
                // MySQL allows an index name here
                self.ident();
                let columns = self.parse_column_list();
                if !self.eat(&Token::References) {
                    return Err(self.expected("REFERENCES"));
                }
                let (target, target_columns) = self.parse_reference()?;
                TableConstraint::ForeignKey(ForeignKey {
                    columns,
                    target,
                    target_columns,
                })
            }
            Token::Check => {
                self.advance();
                self.skip_parenthesized();
                return Ok(None);
            }
            _ => return Ok(None),
        };
        // Trailing options such as USING INDEX TABLESPACE or DEFERRABLE.
        self.skip_until(&[Token::Comma, Token::RParen, Token::Semicolon]);
        Ok(Some(constraint))
    }

    fn apply_constraint(&mut self, table: &mut Table, constraint: TableConstraint) {
        match constraint {
            TableConstraint::PrimaryKey(_, columns) if columns.is_empty() => {}
            TableConstraint::PrimaryKey(_, columns) if columns.len() == 1 => {
                let pk = match table.find_column_mut(&columns[0]) {
                    Some(column) => {
                        column.nullable = false;
                        column.name.clone()
                    }
                    None => columns[0].clone(),
                };
                table.primary_key_name = Some(pk);
            }
            TableConstraint::PrimaryKey(name, columns) => {
                let name = name.unwrap_or_else(|| format!("{}_pkey", table.name));
                table.add_index(Index::new(name, true, columns));
            }
            TableConstraint::Index {
                name,
                unique,
                columns,
            } => {
                let suffix = if unique { "key" } else { "idx" };
                let name = name.unwrap_or_else(|| format!("{}_{}_{}", table.name, columns.join("_"), suffix));
                table.add_index(Index::new(name, unique, columns));
            }
            TableConstraint::ForeignKey(fk) => self.pending_fks.push(PendingFk {
                table: table.name.clone(),
                fk,
            }),
        }
    }

    /// `CREATE [UNIQUE] INDEX [CONCURRENTLY] [IF NOT EXISTS] [name] ON table ...`
    fn parse_create_index(&mut self, schema: &mut Schema, unique: bool) {
        self.eat_word("CONCURRENTLY");
        self.skip_if_exists();
        let name = if self.current() == &Token::On {
            None
        } else {
            self.qualified_name()
        };
        if !self.eat(&Token::On) {
            self.skip_statement();
            return;
        }
        self.eat(&Token::Only);
        let Some(table_name) = self.qualified_name() else {
            self.skip_statement();
            return;
        };
        self.skip_index_method();
        let columns = self.parse_index_columns();
        self.skip_statement();

        match schema.find_table_mut(&table_name) {
            Some(table) => {
                let name = name.unwrap_or_else(|| format!("{}_{}_idx", table.name, columns.join("_")));
                table.add_index(Index::new(name, unique, columns));
            }
            None => warn!(table = %table_name, "index on unknown table ignored"),
        }
    }

    /// `ALTER TABLE [IF EXISTS] [ONLY] name ADD [CONSTRAINT c] ..., ...`
    fn parse_alter_table(&mut self, schema: &mut Schema) -> Result<(), SqlParseError> {
        if !self.eat(&Token::Table) {
            self.skip_statement();
            return Ok(());
        }
        self.skip_if_exists();
        self.eat(&Token::Only);
        let Some(table_name) = self.qualified_name() else {
            self.skip_statement();
            return Ok(());
        };

        loop {
            match self.current() {
                Token::Semicolon | Token::Eof => break,
                Token::Add => {
                    self.advance();
                    let name = if self.eat(&Token::Constraint) { self.ident() } else { None };
                    let Some(constraint) = self.parse_table_constraint(name)? else {
                        self.skip_until(&[Token::Comma, Token::Semicolon]);
                        continue;
                    };
                    match schema.find_table_mut(&table_name) {
                        Some(table) => self.apply_constraint(table, constraint),
                        None => warn!(table = %table_name, "ALTER TABLE on unknown table ignored"),
                    }
                }
                Token::Comma => self.advance(),
                _ => self.skip_until(&[Token::Comma, Token::Semicolon]),
            }
        }
        self.eat(&Token::Semicolon);
        Ok(())
    }

    /// Targets resolve the way unquoted identifiers do, ignoring case, and
    /// are stored with the spelling their CREATE TABLE used.
    fn resolve_foreign_keys(&mut self, schema: &mut Schema) {
        for PendingFk { table, fk } in std::mem::take(&mut self.pending_fks) {
            let target_table = schema.find_table(&fk.target);
            let target_columns: Vec<String> = if fk.target_columns.is_empty() {
                let pk = target_table
                    .and_then(|t| t.primary_key_name.clone())
                    .unwrap_or_else(|| "id".to_string());
                vec![pk]
            } else {
                fk.target_columns
                    .iter()
                    .map(|name| {
                        target_table
                            .and_then(|t| t.find_column(name))
                            .map_or_else(|| name.clone(), |c| c.name.clone())
                    })
                    .collect()
            };
            let target = target_table.map_or_else(|| fk.target.clone(), |t| t.name.clone());
            if target_columns.len() != fk.columns.len() {
                warn!(
                    table = %table,
                    target = %target,
                    "foreign key column counts differ, pairing what lines up"
                );
            }

            let Some(source) = schema.find_table_mut(&table) else {
                warn!(table = %table, "foreign key on unknown table ignored");
                continue;
            };
            for (local, target_column) in fk.columns.iter().zip(target_columns) {
                match source.find_column_mut(local) {
                    Some(column) if column.references.is_none() => {
                        column.references = Some(ColumnRef {
                            table: target.clone(),
                            column: target_column,
                        });
                    }
                    Some(_) => warn!(
                        table = %table,
                        column = %local,
                        "column already references a table, extra foreign key ignored"
                    ),
                    None => warn!(table = %table, column = %local, "foreign key on unknown column ignored"),
                }
            }
        }
    }

    /// Plain `(a, b, c)` identifier list; returns empty when no list follows.
    fn parse_column_list(&mut self) -> Vec<String> {
        let mut columns = Vec::new();
        if !self.eat(&Token::LParen) {
            return columns;
        }
        loop {
            match self.current() {
                Token::Ident(name) => {
                    columns.push(name.clone());
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                _ => self.advance(),
            }
        }
        columns
    }

    /// Index element list: `(a, b DESC, name(10), lower(email))`.
    ///
    /// Sort order and prefix lengths are dropped; expressions are kept as text.
    fn parse_index_columns(&mut self) -> Vec<String> {
        let mut columns = Vec::new();
        if !self.eat(&Token::LParen) {
            return columns;
        }
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                Token::Comma => self.advance(),
                Token::Ident(name) => {
                    let name = name.clone();
                    self.advance();
                    if self.eat(&Token::LParen) {
                        let inner = self.collect_until_paren();
                        let is_prefix = !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit());
                        columns.push(if is_prefix { name } else { format!("{}({})", name, inner) });
                    } else {
                        columns.push(name);
                    }
                    self.skip_until(&[Token::Comma, Token::RParen]);
                }
                Token::LParen => {
                    self.advance();
                    columns.push(format!("({})", self.collect_until_paren()));
                    self.skip_until(&[Token::Comma, Token::RParen]);
                }
                _ => self.skip_until(&[Token::Comma, Token::RParen]),
            }
        }
        columns
    }

    /// `USING btree` as written by PostgreSQL and MySQL.
    fn skip_index_method(&mut self) {
        if self.eat(&Token::Using) {
            self.ident();
        }
    }

    fn skip_on_actions(&mut self) {
        while self.current() == &Token::On {
            self.advance();
            // DELETE / UPDATE
            self.advance();
            if self.eat_word("SET") || self.eat_word("NO") {
                // SET NULL, SET DEFAULT, NO ACTION
                self.advance();
            } else {
                // CASCADE, RESTRICT
                self.advance();
            }
        }
    }

    fn skip_parenthesized(&mut self) {
        if !self.eat(&Token::LParen) {
            self.advance();
            return;
        }
        let mut depth = 1;
        while depth > 0 {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eof => break,
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_statement(&mut self) {
        while !matches!(self.current(), Token::Semicolon | Token::Eof) {
            self.advance();
        }
        self.eat(&Token::Semicolon);
    }

    fn skip_until(&mut self, tokens: &[Token]) {
        while !tokens.contains(self.current()) && self.current() != &Token::Eof {
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            } else {
                self.advance();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Schema {
        parse_sql(sql, Dialect::Generic, "test").unwrap()
    }

    #[test]
    fn test_parse_simple_table() {
        let schema = parse(
            r#"
            CREATE TABLE users (
                id INT PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                status TEXT DEFAULT 'active'
            );
        "#,
        );
        assert_eq!(schema.name, "test");
        assert_eq!(schema.tables().len(), 1);

        let users = &schema.tables()[0];
        assert_eq!(users.name, "users");
        assert_eq!(users.primary_key_name.as_deref(), Some("id"));
        assert_eq!(users.columns().len(), 3);

        let id = users.column("id").unwrap();
        assert!(!id.nullable);

        let email = users.column("email").unwrap();
        assert_eq!(email.typ, "varchar");
        assert_eq!(email.length.as_deref(), Some("255"));
        assert!(!email.nullable);

        let status = users.column("status").unwrap();
        assert!(status.nullable);
        assert_eq!(status.default_value.as_deref(), Some("'active'"));

        let index = users.index("users_email_key").unwrap();
        assert!(index.unique);
        assert_eq!(index.columns, vec!["email"]);
    }

    #[test]
    fn test_parse_inline_and_table_level_foreign_keys() {
        let schema = parse(
            r#"
            CREATE TABLE customers (id INT PRIMARY KEY, name TEXT);
            CREATE TABLE orders (
                id INT PRIMARY KEY,
                customer_id INT REFERENCES customers(id) ON DELETE CASCADE,
                billing_id INT,
                shipping_id INT,
                FOREIGN KEY (billing_id) REFERENCES customers ON DELETE SET NULL,
                CONSTRAINT orders_ship_fk FOREIGN KEY (shipping_id) REFERENCES public.customers (id)
            );
        "#,
        );

        let orders = schema.table("orders").unwrap();
        for col in ["customer_id", "billing_id", "shipping_id"] {
            let target = orders.column(col).unwrap().references.as_ref().unwrap();
            assert_eq!(target.table, "customers");
            assert_eq!(target.column, "id");
        }
        assert!(orders.column("id").unwrap().references.is_none());
    }

    #[test]
    fn test_parse_composite_primary_key_becomes_index() {
        let schema = parse(
            r#"
            CREATE TABLE order_items (
                order_id INT NOT NULL,
                line_no INT NOT NULL,
                PRIMARY KEY (order_id, line_no)
            );
        "#,
        );

        let items = schema.table("order_items").unwrap();
        assert!(items.primary_key_name.is_none());
        let pkey = items.index("order_items_pkey").unwrap();
        assert!(pkey.unique);
        assert_eq!(pkey.columns, vec!["order_id", "line_no"]);
    }

    #[test]
    fn test_parse_postgres_dump_with_alter_table() {
        let sql = r#"
            -- PostgreSQL database dump
            CREATE TABLE public.customers (
                id integer NOT NULL,
                created_at timestamp with time zone DEFAULT now()
            );
            CREATE TABLE public.orders (
                id integer NOT NULL,
                customer_id integer,
                tags text[],
                total numeric(10,2)
            );
            ALTER TABLE ONLY public.customers
                ADD CONSTRAINT customers_pkey PRIMARY KEY (id);
            ALTER TABLE ONLY public.orders
                ADD CONSTRAINT orders_customer_fk FOREIGN KEY (customer_id) REFERENCES public.customers(id);
            CREATE INDEX orders_customer_idx ON public.orders USING btree (customer_id);
            CREATE UNIQUE INDEX customers_lower_idx ON public.customers (lower(id::text));
        "#;
        let schema = parse_sql(sql, Dialect::Auto, "shop").unwrap();

        let customers = schema.table("customers").unwrap();
        assert_eq!(customers.primary_key_name.as_deref(), Some("id"));
        assert_eq!(customers.column("created_at").unwrap().typ, "timestamp with time zone");
        assert_eq!(customers.column("created_at").unwrap().default_value.as_deref(), Some("now()"));
        assert_eq!(customers.index("customers_lower_idx").unwrap().columns, vec!["lower(id text)"]);

        let orders = schema.table("orders").unwrap();
        assert_eq!(orders.column("tags").unwrap().typ, "text[]");
        assert_eq!(orders.column("total").unwrap().typ, "numeric");
        assert_eq!(orders.column("total").unwrap().length.as_deref(), Some("10,2"));
        assert_eq!(
            orders.column("customer_id").unwrap().references,
            Some(ColumnRef {
                table: "customers".to_string(),
                column: "id".to_string()
            })
        );
        let index = orders.index("orders_customer_idx").unwrap();
        assert!(!index.unique);
        assert_eq!(index.columns, vec!["customer_id"]);
    }

    #[test]
    fn test_parse_mysql_keys() {
        let sql = r#"
            CREATE TABLE `users` (
                `id` int(11) NOT NULL AUTO_INCREMENT,
                `name` varchar(64) CHARACTER SET utf8 NOT NULL COMMENT 'display name',
                `bio` text,
                PRIMARY KEY (`id`),
                UNIQUE KEY `uniq_name` (`name`(20)),
                KEY `idx_name_bio` (`name`, `bio`(100)),
                FULLTEXT KEY `ft_bio` (`bio`)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8;
        "#;
        let schema = parse_sql(sql, Dialect::MySQL, "app").unwrap();

        let users = schema.table("users").unwrap();
        assert_eq!(users.primary_key_name.as_deref(), Some("id"));
        let name = users.column("name").unwrap();
        assert_eq!(name.typ, "varchar");
        assert!(!name.nullable);

        let names: Vec<&str> = users.indexes().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["uniq_name", "idx_name_bio", "ft_bio"]);
        assert!(users.index("uniq_name").unwrap().unique);
        assert_eq!(users.index("uniq_name").unwrap().columns, vec!["name"]);
        assert_eq!(users.index("idx_name_bio").unwrap().columns, vec!["name", "bio"]);
    }

    #[test]
    fn test_first_reference_wins() {
        let schema = parse(
            r#"
            CREATE TABLE a (id INT PRIMARY KEY);
            CREATE TABLE b (id INT PRIMARY KEY);
            CREATE TABLE c (x INT REFERENCES a(id), FOREIGN KEY (x) REFERENCES b(id));
        "#,
        );
        let x = schema.table("c").unwrap().column("x").unwrap();
        assert_eq!(x.references.as_ref().unwrap().table, "a");
    }

    #[test]
    fn test_references_resolve_ignoring_case() {
        let schema = parse(
            r#"
            CREATE TABLE Customers (ID INT NOT NULL, Name TEXT);
            CREATE TABLE orders (
                id INT,
                customer_id INT REFERENCES customers(id),
                buyer INT REFERENCES CUSTOMERS
            );
            ALTER TABLE customers ADD PRIMARY KEY (id);
            CREATE INDEX customers_name_idx ON CUSTOMERS (name);
        "#,
        );

        let customers = schema.table("Customers").unwrap();
        assert_eq!(customers.primary_key_name.as_deref(), Some("ID"));
        assert!(customers.index("customers_name_idx").is_some());

        let orders = schema.table("orders").unwrap();
        let expected = Some(ColumnRef {
            table: "Customers".to_string(),
            column: "ID".to_string(),
        });
        assert_eq!(orders.column("customer_id").unwrap().references, expected);
        assert_eq!(orders.column("buyer").unwrap().references, expected);
        assert!(crate::refs::dangling_references(&schema).is_empty());
    }

    #[test]
    fn test_mysql_double_quoted_default() {
        let schema = parse_sql(
            r#"CREATE TABLE t (status varchar(8) DEFAULT "active");"#,
            Dialect::MySQL,
            "app",
        )
        .unwrap();
        let status = schema.table("t").unwrap().column("status").unwrap();
        assert_eq!(status.default_value.as_deref(), Some("'active'"));
    }

    #[test]
    fn test_column_named_key() {
        let schema = parse(
            r#"
            CREATE TABLE knowledge_keys (
                workspace TEXT NOT NULL,
                key TEXT NOT NULL,
                PRIMARY KEY (workspace, key)
            );
        "#,
        );
        let table = schema.table("knowledge_keys").unwrap();
        assert_eq!(table.column("key").unwrap().typ, "text");
        assert_eq!(table.index("knowledge_keys_pkey").unwrap().columns, vec!["workspace", "key"]);
    }

    #[test]
    fn test_duplicate_table_is_an_error() {
        let err = parse_sql(
            "CREATE TABLE a (id INT); CREATE TABLE a (id INT);",
            Dialect::Generic,
            "dup",
        )
        .unwrap_err();
        assert!(matches!(err, SqlParseError::Schema(SchemaError::DuplicateTable(_))));
    }

    #[test]
    fn test_missing_reference_target_reports_line() {
        let err = parse_sql("CREATE TABLE a (\n  x INT REFERENCES ,\n);", Dialect::Generic, "bad").unwrap_err();
        match err {
            SqlParseError::Expected { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_other_statements_skipped() {
        let schema = parse(
            r#"
            SET statement_timeout = 0;
            CREATE SEQUENCE seq START 1;
            CREATE VIEW v AS SELECT 1;
            CREATE TEMPORARY TABLE IF NOT EXISTS t (id INT);
            INSERT INTO t VALUES (1);
        "#,
        );
        assert_eq!(schema.tables().len(), 1);
        assert_eq!(schema.tables()[0].name, "t");
    }
}
