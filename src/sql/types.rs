//! Column type cleanup.
//!
//! A declared type such as `VARCHAR(255)` is split into its base name
//! (`varchar`) and its parenthesised length (`255`). The name is otherwise
//! kept as declared, so `timestamp with time zone` and `serial` survive.

/// Split a raw declared type into `(type, length)`.
pub fn split_type(raw: &str) -> (String, Option<String>) {
    let lower = raw.trim().to_lowercase();
    let (base, rest) = match lower.find('(') {
        Some(open) => (&lower[..open], &lower[open + 1..]),
        None => (lower.as_str(), ""),
    };

    let close = rest.find(')');
    let length = close
        .map(|close| rest[..close].split_whitespace().collect::<String>())
        .filter(|len| !len.is_empty());

    // Array suffix and trailing modifiers (`unsigned`) live after the parens.
    let suffix = close.map(|close| &rest[close + 1..]).unwrap_or("");
    let mut typ = collapse_whitespace(base);
    let suffix = collapse_whitespace(suffix);
    if !suffix.is_empty() {
        if !suffix.starts_with("[]") {
            typ.push(' ');
        }
        typ.push_str(&suffix);
    }

    (typ, length)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_split_off() {
        assert_eq!(split_type("VARCHAR(255)"), ("varchar".to_string(), Some("255".to_string())));
        assert_eq!(
            split_type("NUMERIC(10, 2)"),
            ("numeric".to_string(), Some("10,2".to_string()))
        );
        assert_eq!(split_type("text"), ("text".to_string(), None));
        assert_eq!(split_type("varchar()"), ("varchar".to_string(), None));
    }

    #[test]
    fn test_declared_names_kept() {
        assert_eq!(split_type("TIMESTAMP  WITH\tTIME ZONE").0, "timestamp with time zone");
        assert_eq!(split_type("SERIAL").0, "serial");
        assert_eq!(split_type("timestamptz").0, "timestamptz");
        assert_eq!(split_type("JSONB").0, "jsonb");
        assert_eq!(split_type("character varying(40)").0, "character varying");
        assert_eq!(split_type("TINYINT(1)"), ("tinyint".to_string(), Some("1".to_string())));
        assert_eq!(split_type("DATETIME").0, "datetime");
    }

    #[test]
    fn test_suffixes_after_length() {
        assert_eq!(
            split_type("int(10) unsigned"),
            ("int unsigned".to_string(), Some("10".to_string()))
        );
        assert_eq!(
            split_type("varchar(20)[]"),
            ("varchar[]".to_string(), Some("20".to_string()))
        );
        assert_eq!(split_type("int4[]").0, "int4[]");
    }
}
