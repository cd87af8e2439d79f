//! Payload Decoder
//!
//! The switch serves its state as small script files made of assignment
//! statements (`var speed = new Array("1000","0",...);`). They were written for
//! the switch's own web UI, not as a data format, and they come from a device we
//! do not control. Nothing here executes them: a dedicated parser accepts only
//! the literal grammar the firmware emits and rejects everything else.
//!
//! # Accepted grammar
//!
//! ```text
//! program     := (statement | ';')*
//! statement   := ("var" | "let" | "const")? declarator ("," declarator)* terminator
//! declarator  := ident "=" value
//! value       := number | string | "true" | "false" | array
//! array       := "[" (value ("," value)* ","?)? "]"
//!              | "new" "Array" "(" (value ("," value)*)? ")"
//! terminator  := ";" | line break | end of input
//! ```
//!
//! `//` and `/* */` comments are skipped. Numbers may be signed decimals,
//! decimals with a fraction or exponent, or `0x` hexadecimal.

use crate::error::{ExporterError, Result};
use crate::gs1200::types::Endpoint;
use std::collections::HashMap;

const MAX_DEPTH: usize = 32;

/// A decoded literal
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Array(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Array(_) => "array",
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Variables decoded from one endpoint, restricted to the names that endpoint declares.
#[derive(Debug, Clone)]
pub struct Payload {
    endpoint: Endpoint,
    values: HashMap<String, Value>,
}

impl Payload {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Returns true when the switch answered with a rendered page instead of data.
///
/// The firmware serves its login page in place of the script when the session
/// cookie is missing or another user holds the session.
pub fn is_html_page(text: &str) -> bool {
    text.to_ascii_lowercase().contains("</html>")
}

/// Decode the raw text served for `endpoint`.
pub fn decode(endpoint: Endpoint, text: &str) -> Result<Payload> {
    if is_html_page(text) {
        return Err(ExporterError::SessionInvalid {
            endpoint: endpoint.to_string(),
        });
    }

    let declarations =
        Parser::new(text)
            .parse_program()
            .map_err(|reason| ExporterError::MalformedPayload {
                endpoint: endpoint.to_string(),
                reason,
            })?;

    let wanted = endpoint.variables();
    let mut values = HashMap::with_capacity(wanted.len());
    for (name, value) in declarations {
        if wanted.contains(&name.as_str()) {
            // Later assignments shadow earlier ones
            values.insert(name, value);
        }
    }

    if values.is_empty() {
        return Err(ExporterError::MalformedPayload {
            endpoint: endpoint.to_string(),
            reason: format!("none of {} declared", wanted.join(", ")),
        });
    }

    Ok(Payload { endpoint, values })
}

type ParseResult<T> = std::result::Result<T, String>;

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(format!("{} at offset {}", message.into(), self.pos))
    }

    fn expect(&mut self, wanted: char) -> ParseResult<()> {
        self.skip_trivia()?;
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => self.error(format!("expected '{}', found '{}'", wanted, c)),
            None => self.error(format!("expected '{}', found end of input", wanted)),
        }
    }

    /// Skip whitespace and comments. Returns whether a line break was crossed.
    fn skip_trivia(&mut self) -> ParseResult<bool> {
        let mut newline = false;
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some('\n'), _) => {
                    newline = true;
                    self.pos += 1;
                }
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(c), _) => {
                                newline |= c == '\n';
                                self.pos += 1;
                            }
                            (None, _) => return self.error("unterminated comment"),
                        }
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    fn parse_program(&mut self) -> ParseResult<Vec<(String, Value)>> {
        let mut declarations = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Ok(declarations),
                Some(';') => self.pos += 1,
                Some(_) => self.parse_statement(&mut declarations)?,
            }
        }
    }

    fn parse_statement(&mut self, out: &mut Vec<(String, Value)>) -> ParseResult<()> {
        let mut name = self.parse_identifier()?;
        if matches!(name.as_str(), "var" | "let" | "const") {
            self.skip_trivia()?;
            name = self.parse_identifier()?;
        }

        loop {
            self.expect('=')?;
            let value = self.parse_value()?;
            out.push((name, value));

            let crossed_newline = self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_trivia()?;
                    name = self.parse_identifier()?;
                }
                Some(';') => {
                    self.pos += 1;
                    return Ok(());
                }
                None => return Ok(()),
                Some(_) if crossed_newline => return Ok(()),
                Some(c) => return self.error(format!("unexpected '{}' after value", c)),
            }
        }
    }

    fn parse_identifier(&mut self) -> ParseResult<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.pos += 1,
            Some(c) => return self.error(format!("expected identifier, found '{}'", c)),
            None => return self.error("expected identifier, found end of input"),
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        self.skip_trivia()?;
        match self.peek() {
            Some('[') => {
                self.pos += 1;
                self.parse_elements(']').map(Value::Array)
            }
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_string(q).map(Value::Str)
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.parse_identifier()?;
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "new" => {
                        self.skip_trivia()?;
                        let class = self.parse_identifier()?;
                        if class != "Array" {
                            return self.error(format!("unsupported constructor '{}'", class));
                        }
                        self.expect('(')?;
                        self.parse_elements(')').map(Value::Array)
                    }
                    other => self.error(format!("unsupported expression '{}'", other)),
                }
            }
            Some(c) => self.error(format!("unexpected '{}'", c)),
            None => self.error("expected value, found end of input"),
        }
    }

    /// Parse a comma-separated list up to `close`; the opener is already consumed.
    fn parse_elements(&mut self, close: char) -> ParseResult<Vec<Value>> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return self.error("arrays nested too deeply");
        }

        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(close) {
                self.pos += 1;
                break;
            }
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => break,
                Some(c) => {
                    self.pos -= 1;
                    return self.error(format!("expected ',' or '{}', found '{}'", close, c));
                }
                None => return self.error(format!("unterminated list, expected '{}'", close)),
            }
        }

        self.depth -= 1;
        Ok(items)
    }

    /// Parse a quoted string; the opening quote is already consumed.
    fn parse_string(&mut self, quote: char) -> ParseResult<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return self.error("unterminated string"),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('x') => self.parse_hex_escape(2)?,
                        Some('u') => self.parse_hex_escape(4)?,
                        Some(other) => other,
                        None => return self.error("unterminated string"),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_hex_escape(&mut self, digits: usize) -> ParseResult<char> {
        let end = self.pos + digits;
        if end > self.chars.len() {
            return self.error("truncated escape sequence");
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map_or_else(|| self.error(format!("invalid escape '{}'", hex)), Ok)
    }

    fn parse_number(&mut self) -> ParseResult<Value> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.pos += 1;
                true
            }
            Some('+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits: String = self.chars[digits_start..self.pos].iter().collect();
            let magnitude = i64::from_str_radix(&digits, 16)
                .or_else(|_| self.error(format!("invalid hex literal '0x{}'", digits)))?;
            return Ok(Value::Integer(if negative { -magnitude } else { magnitude }));
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => self.pos += 1,
                '.' => {
                    is_float = true;
                    self.pos += 1;
                }
                'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }

        let literal: String = self.chars[start..self.pos].iter().collect();
        if !is_float {
            if let Ok(n) = literal.parse::<i64>() {
                return Ok(Value::Integer(n));
            }
        }
        match literal.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Float(n)),
            _ => self.error(format!("invalid number '{}'", literal)),
        }
    }
}
