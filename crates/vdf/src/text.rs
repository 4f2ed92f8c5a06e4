//! Text KeyValues: `"key" "value"` pairs and `"key" { ... }` sections.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::VdfError;
use crate::node::{Node, Scalar, Section};

#[derive(Debug, PartialEq)]
enum Token {
    Str(String),
    Open,
    Close,
    /// Platform conditional such as `[$WIN32]`; carries no data we model.
    Conditional,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> VdfError {
        VdfError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skips whitespace and `//` comments.
    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '/' {
                let mut ahead = self.chars.clone();
                ahead.next();
                if ahead.peek() != Some(&'/') {
                    return;
                }
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                return;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, VdfError> {
        self.skip_trivia();
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };
        match c {
            '{' => {
                self.bump();
                Ok(Some(Token::Open))
            }
            '}' => {
                self.bump();
                Ok(Some(Token::Close))
            }
            '"' => {
                self.bump();
                self.quoted().map(|s| Some(Token::Str(s)))
            }
            '[' => {
                while let Some(c) = self.bump() {
                    if c == ']' {
                        return Ok(Some(Token::Conditional));
                    }
                }
                Err(self.error("unterminated conditional"))
            }
            _ => Ok(Some(Token::Str(self.bare()))),
        }
    }

    fn quoted(&mut self) -> Result<String, VdfError> {
        let start_line = self.line;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(VdfError::Syntax {
                        line: start_line,
                        message: "unterminated quoted string".into(),
                    });
                }
                Some('"') => return Ok(out),
                Some('\\') => match self.chars.peek() {
                    Some('"') => {
                        self.bump();
                        out.push('"');
                    }
                    Some('\\') => {
                        self.bump();
                        out.push('\\');
                    }
                    Some('n') => {
                        self.bump();
                        out.push('\n');
                    }
                    Some('t') => {
                        self.bump();
                        out.push('\t');
                    }
                    // Unknown escapes stay literal: unescaped Windows paths
                    // show up in hand-edited files.
                    _ => out.push('\\'),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// Next token that is not a platform conditional.
    fn next_significant(&mut self) -> Result<Option<Token>, VdfError> {
        loop {
            match self.next_token()? {
                Some(Token::Conditional) => continue,
                other => return Ok(other),
            }
        }
    }
}

/// Parses text VDF bytes. Invalid UTF-8 is replaced rather than rejected.
pub fn parse(input: &[u8]) -> Result<Section, VdfError> {
    parse_str(&String::from_utf8_lossy(input))
}

/// Parses text VDF into its root section.
///
/// Reading stops once the first top-level section closes; trailing content
/// is ignored. Nesting uses an explicit stack, so depth is not limited by the
/// call stack.
pub fn parse_str(input: &str) -> Result<Section, VdfError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lexer = Lexer::new(input);
    let mut stack: Vec<(String, Section)> = Vec::new();
    let mut current = Section::new();

    loop {
        match lexer.next_significant()? {
            None => {
                if stack.is_empty() {
                    return Ok(current);
                }
                return Err(lexer.error("unexpected end of input inside a section"));
            }
            Some(Token::Close) => {
                let Some((key, mut parent)) = stack.pop() else {
                    return Err(lexer.error("unmatched '}'"));
                };
                parent.insert(key, std::mem::take(&mut current));
                current = parent;
                if stack.is_empty() {
                    return Ok(current);
                }
            }
            Some(Token::Open) => return Err(lexer.error("'{' without a key")),
            Some(Token::Str(key)) => match lexer.next_significant()? {
                Some(Token::Str(value)) => {
                    current.insert(key, Scalar::String(value));
                }
                Some(Token::Open) => {
                    stack.push((key, std::mem::take(&mut current)));
                }
                Some(Token::Close) | None => {
                    return Err(lexer.error(format!("key '{key}' has no value")));
                }
                Some(Token::Conditional) => unreachable!("filtered by next_significant"),
            },
            Some(Token::Conditional) => unreachable!("filtered by next_significant"),
        }
    }
}

/// Reads and parses a text VDF file.
pub fn load(path: &Path) -> Result<Section, VdfError> {
    let data = fs::read(path)?;
    parse(&data)
}

/// Serializes a section in Steam's layout: tab indentation, quoted keys.
///
/// With `quote_numbers` unset, numeric scalars are written bare. Either way
/// the output parses back to the same tree, provided `section` holds a single
/// top-level entry: [`parse_str`] stops after the first top-level section.
pub fn stringify(section: &Section, quote_numbers: bool) -> String {
    let mut out = String::new();
    write_section(&mut out, section, 0, quote_numbers);
    out
}

/// Writes `section` to `path` as text VDF with every value quoted.
///
/// Every entry is written, but reading the file back only returns entries up
/// to the end of the first top-level section. Steam files have exactly one
/// root; keep additional data inside it.
pub fn save(path: &Path, section: &Section) -> Result<(), VdfError> {
    fs::write(path, stringify(section, true))?;
    Ok(())
}

fn write_section(out: &mut String, section: &Section, depth: usize, quote_numbers: bool) {
    for (key, node) in section.iter() {
        write_entry(out, key, node, depth, quote_numbers);
    }
}

fn write_entry(out: &mut String, key: &str, node: &Node, depth: usize, quote_numbers: bool) {
    indent(out, depth);
    let _ = write!(out, "\"{}\"", escape(key));
    match node {
        Node::Scalar(scalar) => {
            if scalar.is_numeric() && !quote_numbers {
                let _ = writeln!(out, "\t\t{scalar}");
            } else {
                let _ = writeln!(out, "\t\t\"{}\"", escape(&scalar.to_string()));
            }
        }
        Node::Section(child) => {
            open(out, depth);
            write_section(out, child, depth + 1, quote_numbers);
            close(out, depth);
        }
        Node::List(items) => {
            open(out, depth);
            for (i, item) in items.iter().enumerate() {
                write_entry(out, &i.to_string(), item, depth + 1, quote_numbers);
            }
            close(out, depth);
        }
    }
}

fn open(out: &mut String, depth: usize) {
    out.push('\n');
    indent(out, depth);
    out.push_str("{\n");
}

fn close(out: &mut String, depth: usize) {
    indent(out, depth);
    out.push_str("}\n");
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}
