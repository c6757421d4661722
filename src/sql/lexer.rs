//! Tokenizer for SQL DDL dumps.

use super::Dialect;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Constraint,
    Index,
    If,
    Exists,
    Check,
    Using,

    // Identifiers and literals
    Ident(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,

    Eof,
}

impl Token {
    /// True for bare words, including keywords, that may name a column type.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(word))
    }
}

/// A token together with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current: Option<char>,
    line: usize,
    dialect: Dialect,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, dialect: Dialect) -> Self {
        let mut chars = input.chars().peekable();
        let current = chars.next();
        Self {
            chars,
            current,
            line: 1,
            dialect,
        }
    }

    fn bump(&mut self) {
        if self.current == Some('\n') {
            self.line += 1;
        }
        self.current = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current {
            self.bump();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        // Positioned on the '*' of "/*".
        self.bump();
        while let Some(c) = self.current {
            self.bump();
            if c == '*' && self.current == Some('/') {
                self.bump();
                break;
            }
        }
    }

    fn read_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.current.filter(|c| pred(*c)) {
            out.push(c);
            self.bump();
        }
        out
    }

    /// Reads a quoted run where a doubled closing quote stands for itself.
    fn read_quoted(&mut self, close: char, backslash_escapes: bool) -> String {
        self.bump();
        let mut out = String::new();
        while let Some(c) = self.current {
            if c == close {
                if self.peek() == Some(&close) {
                    out.push(c);
                    self.bump();
                    self.bump();
                    continue;
                }
                self.bump();
                break;
            }
            if c == '\\' && backslash_escapes {
                self.bump();
                if let Some(escaped) = self.current {
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                    self.bump();
                }
                continue;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        if self.current == Some('-') {
            num.push('-');
            self.bump();
        }
        let mut seen_dot = false;
        num.push_str(&self.read_while(|c| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                return true;
            }
            c.is_ascii_digit()
        }));
        num
    }

    fn keyword(word: String) -> Token {
        match word.to_ascii_uppercase().as_str() {
            "CREATE" => Token::Create,
            "ALTER" => Token::Alter,
            "ADD" => Token::Add,
            "TABLE" => Token::Table,
            "ONLY" => Token::Only,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "FOREIGN" => Token::Foreign,
            "REFERENCES" => Token::References,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "UNIQUE" => Token::Unique,
            "DEFAULT" => Token::Default,
            "ON" => Token::On,
            "CONSTRAINT" => Token::Constraint,
            "INDEX" => Token::Index,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "CHECK" => Token::Check,
            "USING" => Token::Using,
            _ => Token::Ident(word),
        }
    }

    fn next_token(&mut self) -> Spanned {
        loop {
            let line = self.line;
            let Some(c) = self.current else {
                return Spanned {
                    token: Token::Eof,
                    line,
                };
            };
            let at = |token| Spanned { token, line };
            let symbol = match c {
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '-' if self.peek() == Some(&'-') => {
                    self.skip_line_comment();
                    continue;
                }
                '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    return at(Token::Num(self.read_number()));
                }
                '/' if self.peek() == Some(&'*') => {
                    self.bump();
                    self.skip_block_comment();
                    continue;
                }
                '#' => {
                    self.skip_line_comment();
                    continue;
                }
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '.' => Token::Dot,
                // MySQL reads double quotes as strings unless ANSI_QUOTES is set.
                '"' if self.dialect == Dialect::MySQL => return at(Token::Str(self.read_quoted('"', true))),
                '"' => return at(Token::Ident(self.read_quoted('"', false))),
                '`' => return at(Token::Ident(self.read_quoted('`', false))),
                '[' if self.peek() == Some(&']') => {
                    self.bump();
                    Token::Ident("[]".to_string())
                }
                '[' => return at(Token::Ident(self.read_quoted(']', false))),
                '\'' => return at(Token::Str(self.read_quoted('\'', true))),
                c if c.is_ascii_digit() => return at(Token::Num(self.read_number())),
                c if c.is_alphabetic() || c == '_' => {
                    let word = self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
                    return at(Self::keyword(word));
                }
                _ => {
                    // Operators and casts (`::`, `=`, `+`) carry nothing for DDL structure.
                    self.bump();
                    continue;
                }
            };
            self.bump();
            return at(symbol);
        }
    }

    pub fn tokenize(mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token();
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Lexer::new(sql, Dialect::Generic).tokenize().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_simple_create_table() {
        let toks = tokens("CREATE TABLE users (id INT);");

        assert_eq!(toks[0], Token::Create);
        assert_eq!(toks[1], Token::Table);
        assert_eq!(toks[2], Token::Ident("users".to_string()));
        assert_eq!(toks[3], Token::LParen);
        assert_eq!(toks[4], Token::Ident("id".to_string()));
        assert_eq!(toks[5], Token::Ident("INT".to_string()));
        assert_eq!(toks[6], Token::RParen);
        assert_eq!(toks[7], Token::Semicolon);
        assert_eq!(toks[8], Token::Eof);
    }

    #[test]
    fn test_quoted_identifiers() {
        let toks = tokens(r#"CREATE TABLE "User Table" (`column name` INT, [x] INT);"#);

        assert_eq!(toks[2], Token::Ident("User Table".to_string()));
        assert_eq!(toks[4], Token::Ident("column name".to_string()));
        assert_eq!(toks[7], Token::Ident("x".to_string()));
    }

    #[test]
    fn test_array_suffix() {
        let toks = tokens("tags text[]");
        assert_eq!(toks[1], Token::Ident("text".to_string()));
        assert_eq!(toks[2], Token::Ident("[]".to_string()));
    }

    #[test]
    fn test_comments_and_lines() {
        let spanned = Lexer::new("-- comment\nCREATE /* block\n */ TABLE t (id INT);", Dialect::Generic).tokenize();

        assert_eq!(spanned[0].token, Token::Create);
        assert_eq!(spanned[0].line, 2);
        assert_eq!(spanned[1].token, Token::Table);
        assert_eq!(spanned[1].line, 3);
    }

    #[test]
    fn test_string_and_numbers() {
        let toks = tokens("DEFAULT 'it''s' -1.5 42");

        assert_eq!(toks[0], Token::Default);
        assert_eq!(toks[1], Token::Str("it's".to_string()));
        assert_eq!(toks[2], Token::Num("-1.5".to_string()));
        assert_eq!(toks[3], Token::Num("42".to_string()));
    }

    #[test]
    fn test_mysql_double_quotes_are_strings() {
        let toks: Vec<Token> = Lexer::new(r#"DEFAULT "a\"b""#, Dialect::MySQL)
            .tokenize()
            .into_iter()
            .map(|s| s.token)
            .collect();
        assert_eq!(toks[1], Token::Str("a\"b".to_string()));

        assert_eq!(tokens(r#""a""#)[0], Token::Ident("a".to_string()));
    }

    #[test]
    fn test_is_word() {
        assert!(Token::Ident("desc".to_string()).is_word("DESC"));
        assert!(!Token::Key.is_word("KEY"));
    }
}
