//! Text VDF (KeyValues) codec.
//!
//! The format is a sequence of `"key" "value"` pairs and `"key" { ... }`
//! blocks. Quoted strings support `\\`, `\"`, `\n` and `\t` escapes; bare
//! (unquoted) tokens, `//` comments and `[$PLATFORM]` conditionals are
//! accepted on input and never written.
//!
//! A key that appears twice in the same block keeps the position of its
//! first occurrence and the value of its last.

use std::iter::Peekable;
use std::str::Chars;

use crate::node::{Node, Table, list_to_table};

/// A syntax error with the position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Parses text VDF into a table.
pub fn parse(input: &str) -> Result<Table, ParseError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lexer = Lexer::new(input);
    parse_block(&mut lexer, None)
}

/// Serializes a table to text VDF.
///
/// With `pretty`, nested blocks are indented with tabs and keys are
/// separated from values by two tabs, which is how the Steam client writes
/// its own files. Otherwise nothing is indented and a single space is used.
pub fn serialize(table: &Table, pretty: bool) -> String {
    let mut out = String::new();
    write_block(&mut out, table, 0, pretty);
    out
}

fn parse_block(lexer: &mut Lexer<'_>, opened_at: Option<(usize, usize)>) -> Result<Table, ParseError> {
    let mut table = Table::new();

    loop {
        let Some(token) = lexer.next_token()? else {
            return match opened_at {
                Some((line, column)) => Err(lexer.error(format!(
                    "unexpected end of input, '{{' opened at line {line}, column {column} is never closed"
                ))),
                None => Ok(table),
            };
        };

        let Token { kind, line, column } = token;
        match kind {
            TokenKind::Close => {
                return if opened_at.is_some() {
                    Ok(table)
                } else {
                    Err(error_at(line, column, "unexpected '}'"))
                };
            }
            TokenKind::Open => return Err(error_at(line, column, "expected a key, found '{'")),
            TokenKind::Str(key) => {
                let value = match lexer.next_token()? {
                    Some(Token {
                        kind: TokenKind::Str(value),
                        ..
                    }) => Node::String(value),
                    Some(Token {
                        kind: TokenKind::Open,
                        line,
                        column,
                    }) => Node::Table(parse_block(lexer, Some((line, column)))?),
                    Some(other) => {
                        return Err(error_at(
                            other.line,
                            other.column,
                            &format!("key '{key}' has no value"),
                        ));
                    }
                    None => {
                        return Err(lexer.error(format!("key '{key}' has no value")));
                    }
                };
                table.insert(key, value);
            }
        }
    }
}

fn write_block(out: &mut String, table: &Table, depth: usize, pretty: bool) {
    for (key, node) in table {
        write_entry(out, key, node, depth, pretty);
    }
}

fn write_entry(out: &mut String, key: &str, node: &Node, depth: usize, pretty: bool) {
    let indent = if pretty { "\t".repeat(depth) } else { String::new() };

    match node {
        Node::Table(child) => {
            write_open(out, &indent, key);
            write_block(out, child, depth + 1, pretty);
            write_close(out, &indent);
        }
        Node::List(items) => {
            write_open(out, &indent, key);
            write_block(out, &list_to_table(items), depth + 1, pretty);
            write_close(out, &indent);
        }
        scalar => {
            out.push_str(&indent);
            push_quoted(out, key);
            out.push_str(if pretty { "\t\t" } else { " " });
            push_quoted(out, &scalar.scalar_text().unwrap_or_default());
            out.push('\n');
        }
    }
}

fn write_open(out: &mut String, indent: &str, key: &str) {
    out.push_str(indent);
    push_quoted(out, key);
    out.push('\n');
    out.push_str(indent);
    out.push_str("{\n");
}

fn write_close(out: &mut String, indent: &str) {
    out.push_str(indent);
    out.push_str("}\n");
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum TokenKind {
    Str(String),
    Open,
    Close,
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

fn error_at(line: usize, column: usize, message: &str) -> ParseError {
    ParseError {
        line,
        column,
        message: message.to_string(),
    }
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            message,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skips whitespace, `//` comments and `[...]` conditionals.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&'/') {
                        return Ok(());
                    }
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('[') => {
                    let (line, column) = (self.line, self.column);
                    loop {
                        match self.bump() {
                            Some(']') => break,
                            Some(_) => {}
                            None => {
                                return Err(error_at(line, column, "unterminated conditional"));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_trivia()?;

        let (line, column) = (self.line, self.column);
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        let kind = match c {
            '{' => {
                self.bump();
                TokenKind::Open
            }
            '}' => {
                self.bump();
                TokenKind::Close
            }
            '"' => {
                self.bump();
                TokenKind::Str(self.quoted(line, column)?)
            }
            _ => TokenKind::Str(self.bare()),
        };

        Ok(Some(Token { kind, line, column }))
    }

    fn quoted(&mut self, line: usize, column: usize) -> Result<String, ParseError> {
        let mut s = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(error_at(line, column, "unterminated string"));
                }
                Some('"') => return Ok(s),
                Some('\\') => match self.chars.peek() {
                    Some('\\') => {
                        self.bump();
                        s.push('\\');
                    }
                    Some('"') => {
                        self.bump();
                        s.push('"');
                    }
                    Some('n') => {
                        self.bump();
                        s.push('\n');
                    }
                    Some('t') => {
                        self.bump();
                        s.push('\t');
                    }
                    _ => s.push('\\'),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                break;
            }
            s.push(c);
            self.bump();
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_USERS: &str = concat!(
        "\"users\"\n",
        "{\n",
        "\t\"76561198067577712\"\n",
        "\t{\n",
        "\t\t\"AccountName\"\t\t\"someone\"\n",
        "\t\t\"PersonaName\"\t\t\"Some One\"\n",
        "\t\t\"RememberPassword\"\t\t\"1\"\n",
        "\t\t\"mostrecent\"\t\t\"1\"\n",
        "\t\t\"Timestamp\"\t\t\"1520000000\"\n",
        "\t}\n",
        "}\n",
    );

    #[test]
    fn parse_nested_blocks() {
        let table = parse(LOGIN_USERS).unwrap();
        let user = table["users"].get("76561198067577712").unwrap();
        assert_eq!(user.get("AccountName").unwrap().as_str(), Some("someone"));
        assert_eq!(user.get("PersonaName").unwrap().as_str(), Some("Some One"));
    }

    #[test]
    fn pretty_output_is_byte_identical() {
        let table = parse(LOGIN_USERS).unwrap();
        assert_eq!(serialize(&table, true), LOGIN_USERS);
    }

    #[test]
    fn reparse_of_compact_output_is_identical() {
        let table = parse(LOGIN_USERS).unwrap();
        let compact = serialize(&table, false);
        assert!(!compact.contains('\t'));
        assert_eq!(parse(&compact).unwrap(), table);
    }

    #[test]
    fn key_order_is_preserved() {
        let table = parse("\"b\" \"1\"\n\"a\" \"2\"\n\"c\" { }\n").unwrap();
        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn escapes_round_trip() {
        let src = "\"LibraryFolders\"\n{\n\t\"1\"\t\t\"D:\\\\Steam \\\"Games\\\"\"\n}\n";
        let table = parse(src).unwrap();
        assert_eq!(
            table["LibraryFolders"].get("1").unwrap().as_str(),
            Some("D:\\Steam \"Games\"")
        );
        assert_eq!(serialize(&table, true), src);
    }

    #[test]
    fn unknown_escape_is_kept_literally() {
        let table = parse(r#""k" "a\qb""#).unwrap();
        assert_eq!(table["k"].as_str(), Some("a\\qb"));
        let again = parse(&serialize(&table, true)).unwrap();
        assert_eq!(again, table);
    }

    #[test]
    fn dotted_keys_stay_literal() {
        let table = parse("\"root\" { \"CSettingsPanelGameController.Timeout\" \"0\" }").unwrap();
        assert!(
            table["root"]
                .as_table()
                .unwrap()
                .contains_key("CSettingsPanelGameController.Timeout")
        );
    }

    #[test]
    fn duplicate_keys_last_value_first_position() {
        let table = parse("\"a\" \"1\"\n\"b\" \"2\"\n\"a\" \"3\"\n").unwrap();
        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(table["a"].as_str(), Some("3"));
    }

    #[test]
    fn comments_conditionals_and_bare_tokens() {
        let src = concat!(
            "// leading comment\n",
            "root\n",
            "{\n",
            "\tbare value // trailing comment\n",
            "\t\"win\" \"yes\" [$WIN32]\n",
            "\t\"url\" \"http://example.com/a\"\n",
            "}\n",
        );
        let table = parse(src).unwrap();
        let root = table["root"].as_table().unwrap();
        assert_eq!(root["bare"].as_str(), Some("value"));
        assert_eq!(root["win"].as_str(), Some("yes"));
        assert_eq!(root["url"].as_str(), Some("http://example.com/a"));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let table = parse("\u{feff}\"a\" \"1\"").unwrap();
        assert_eq!(table["a"].as_str(), Some("1"));
    }

    #[test]
    fn empty_input_is_empty_table() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  \n// nothing\n").unwrap().is_empty());
    }

    #[test]
    fn serialize_scalars_and_lists() {
        let mut inner = Table::new();
        inner.insert("n".into(), Node::Int32(-3));
        inner.insert("big".into(), Node::UInt64(76561198067577712));
        inner.insert("flag".into(), Node::Bool(true));
        inner.insert("tags".into(), Node::List(vec![Node::from("x")]));
        let mut root = Table::new();
        root.insert("root".into(), Node::Table(inner));

        let text = serialize(&root, true);
        assert_eq!(
            text,
            concat!(
                "\"root\"\n{\n",
                "\t\"n\"\t\t\"-3\"\n",
                "\t\"big\"\t\t\"76561198067577712\"\n",
                "\t\"flag\"\t\t\"1\"\n",
                "\t\"tags\"\n\t{\n\t\t\"0\"\t\t\"x\"\n\t}\n",
                "}\n",
            )
        );
    }

    #[test]
    fn error_unclosed_block() {
        let err = parse("\"a\"\n{\n\t\"b\" \"c\"\n").unwrap_err();
        assert!(err.message.contains("never closed"), "{err}");
        assert!(err.message.contains("line 2"), "{err}");
    }

    #[test]
    fn error_stray_close() {
        let err = parse("\"a\" \"b\"\n}\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn error_key_without_value() {
        let err = parse("\"a\" { \"b\" }").unwrap_err();
        assert!(err.message.contains("'b' has no value"), "{err}");
        assert!(parse("\"lonely\"").is_err());
    }

    #[test]
    fn error_open_without_key() {
        assert!(parse("{ }").is_err());
    }

    #[test]
    fn error_unterminated_string() {
        let err = parse("\"a\" \"never ends").unwrap_err();
        assert_eq!(err.column, 5);
        assert!(err.message.contains("unterminated string"));
    }
}
