//! SQL dialect selection and detection.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Detect from dump content
    #[default]
    Auto,
    Generic,
    PostgreSQL,
    MySQL,
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "generic" => Ok(Self::Generic),
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSQL),
            "mysql" | "mariadb" => Ok(Self::MySQL),
            other => Err(format!(
                "unknown dialect '{}' (expected auto, generic, postgres or mysql)",
                other
            )),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Generic => "generic",
            Self::PostgreSQL => "postgres",
            Self::MySQL => "mysql",
        })
    }
}

impl Dialect {
    /// Guess the dialect from dump headers first, then from telltale keywords.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();
        let any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if any(&["postgresql database dump", "pg_dump", "-- postgres"]) {
            return Self::PostgreSQL;
        }
        if any(&["mysql dump", "mysqldump", "-- mysql", "mariadb dump"]) {
            return Self::MySQL;
        }
        if any(&["serial", "text[]", "::text", "timestamptz", "jsonb"]) {
            return Self::PostgreSQL;
        }
        if any(&["auto_increment", "tinyint", "engine=", "unsigned"]) {
            return Self::MySQL;
        }
        Self::Generic
    }

    pub fn resolve(self, content: &str) -> Self {
        match self {
            Self::Auto => Self::detect(content),
            other => other,
        }
    }
}
