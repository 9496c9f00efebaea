// src/core/script.rs

//! # Mutation Script Parser
//!
//! Module tools asked for `python` output print a short list of statements meant
//! to be executed against `os.environ`:
//!
//! ```text
//! os.environ['PATH'] = '/opt/gcc/7.3.0/bin:/usr/bin'
//! del os.environ['GCC_OLD_ROOT']
//! _mlstatus = True
//! ```
//!
//! Instead of executing that text, this module recognises the handful of statement
//! shapes the tools actually emit and turns them into [`Statement`] values. Anything
//! else is reported as malformed so a surprising payload can never be mistaken for
//! success.

use crate::constants::MLSTATUS_VAR;
use crate::models::MlStatus;
use lazy_static::lazy_static;
use regex::Regex;
use std::str::Chars;
use thiserror::Error;

lazy_static! {
    static ref SETENV_RE: Regex =
        Regex::new(r"^os\.environ\[(?P<key>.+?)\]\s*=\s*(?P<value>.+)$").expect("valid regex");
    static ref DEL_RE: Regex = Regex::new(r"^del\s+os\.environ\[(?P<key>.+)\]$").expect("valid regex");
    static ref POP_RE: Regex =
        Regex::new(r"^os\.environ\.pop\(\s*(?P<key>.+?)\s*(?:,\s*None\s*)?\)$").expect("valid regex");
    static ref RAISE_RE: Regex =
        Regex::new(r"^raise\s+(?P<kind>[A-Za-z_][\w.]*)\s*(?:\((?P<args>.*)\))?$").expect("valid regex");
    static ref ASSIGN_RE: Regex =
        Regex::new(r"^(?P<name>[A-Za-z_]\w*)\s*=\s*(?P<value>.+)$").expect("valid regex");
    static ref IMPORT_RE: Regex =
        Regex::new(r"^(?:import\s+[\w.]+(?:\s*,\s*[\w.]+)*|from\s+[\w.]+\s+import\s+[\w.*]+(?:\s*,\s*[\w.]+)*)$")
            .expect("valid regex");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unrecognised statement `{statement}`")]
    Malformed { line: usize, statement: String },
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },
}

/// A python literal appearing on the right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyLiteral {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
}

/// One recognised statement of a mutation script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `os.environ['NAME'] = 'value'`
    SetEnv { name: String, value: String },
    /// `del os.environ['NAME']` or `os.environ.pop('NAME', None)`
    UnsetEnv { name: String },
    /// A local python variable such as `_mlstatus = True`. Has no effect on the environment.
    Assign { name: String, value: PyLiteral },
    /// `raise TypeError('message')`: the tool reporting its own failure.
    Raise { kind: String, message: String },
}

/// A parsed mutation script, statements in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    statements: Vec<Statement>,
}

impl Script {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// The value of the last boolean `_mlstatus` assignment, if any.
    /// `_mlstatus = None` counts as absent.
    pub fn ml_status(&self) -> MlStatus {
        self.statements
            .iter()
            .rev()
            .find_map(|statement| match statement {
                Statement::Assign { name, value } if name == MLSTATUS_VAR => Some(value),
                _ => None,
            })
            .map_or(MlStatus::Absent, |value| match value {
                PyLiteral::Bool(b) => MlStatus::from(*b),
                _ => MlStatus::Absent,
            })
    }
}

/// Parses the stdout of a module tool run in python mode.
pub fn parse(source: &str) -> Result<Script, ScriptError> {
    let mut statements = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        for raw in split_statements(line, line_no)? {
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') || IMPORT_RE.is_match(text) {
                continue;
            }
            let statement = parse_statement(text).ok_or_else(|| ScriptError::Malformed {
                line: line_no,
                statement: text.to_string(),
            })?;
            statements.push(statement);
        }
    }

    log::trace!("Parsed {} statement(s) from module output.", statements.len());
    Ok(Script { statements })
}

fn parse_statement(text: &str) -> Option<Statement> {
    // Order matters: `os.environ[...] = ...` would also match the generic assignment.
    if let Some(caps) = SETENV_RE.captures(text) {
        let name = parse_env_name(&caps["key"])?;
        let value = parse_string(&caps["value"]).filter(|v| !v.contains('\0'))?;
        return Some(Statement::SetEnv { name, value });
    }
    if let Some(caps) = DEL_RE.captures(text) {
        return Some(Statement::UnsetEnv {
            name: parse_env_name(&caps["key"])?,
        });
    }
    if let Some(caps) = POP_RE.captures(text) {
        return Some(Statement::UnsetEnv {
            name: parse_env_name(&caps["key"])?,
        });
    }
    if let Some(caps) = RAISE_RE.captures(text) {
        let kind = caps["kind"].to_string();
        let message = match caps.name("args").map(|m| m.as_str().trim()) {
            None | Some("") => String::new(),
            Some(args) => parse_string(args).unwrap_or_else(|| args.to_string()),
        };
        return Some(Statement::Raise { kind, message });
    }
    if let Some(caps) = ASSIGN_RE.captures(text) {
        return Some(Statement::Assign {
            name: caps["name"].to_string(),
            value: parse_literal(&caps["value"])?,
        });
    }
    None
}

/// Variable names the platform accepts: non-empty, no `=`, no NUL.
fn parse_env_name(text: &str) -> Option<String> {
    parse_string(text).filter(|name| !name.is_empty() && !name.contains(['=', '\0']))
}

/// Splits one source line on `;` separators that are not inside a string literal.
/// A `#` outside quotes ends the line.
fn split_statements(line: &str, line_no: usize) -> Result<Vec<&str>, ScriptError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut end = line.len();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (pos, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '#' => {
                end = pos;
                break;
            }
            ';' => {
                parts.push(line.get(start..pos).unwrap_or_default());
                start = pos + 1;
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(ScriptError::UnterminatedString { line: line_no });
    }
    parts.push(line.get(start..end).unwrap_or_default());
    Ok(parts)
}

/// Parses a python literal that must span the whole of `text`.
fn parse_literal(text: &str) -> Option<PyLiteral> {
    let text = text.trim();
    match text {
        "True" => return Some(PyLiteral::Bool(true)),
        "False" => return Some(PyLiteral::Bool(false)),
        "None" => return Some(PyLiteral::None),
        _ => {}
    }
    if let Ok(number) = text.parse::<i64>() {
        return Some(PyLiteral::Int(number));
    }
    parse_string(text).map(PyLiteral::Str)
}

/// Parses a single- or double-quoted python string literal spanning the whole of `text`,
/// resolving backslash escapes. An optional `r` prefix disables escape processing.
fn parse_string(text: &str) -> Option<String> {
    let text = text.trim();
    let (raw, body) = match text.strip_prefix(['r', 'R']) {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix(['u', 'U']).unwrap_or(text)),
    };

    let mut chars = body.chars();
    let quote = chars.next().filter(|c| *c == '\'' || *c == '"')?;
    let mut value = String::new();

    while let Some(c) = chars.next() {
        if c == quote {
            // The closing quote must end the literal.
            return chars.as_str().is_empty().then_some(value);
        }
        if c != '\\' {
            value.push(c);
            continue;
        }
        let next = chars.next()?;
        if raw {
            value.push('\\');
            value.push(next);
            continue;
        }
        match next {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'a' => value.push('\u{07}'),
            'b' => value.push('\u{08}'),
            'f' => value.push('\u{0C}'),
            'v' => value.push('\u{0B}'),
            'x' => value.push(read_hex(&mut chars, 2)?),
            'u' => value.push(read_hex(&mut chars, 4)?),
            'U' => value.push(read_hex(&mut chars, 8)?),
            '0'..='7' => value.push(read_octal(next, &mut chars)?),
            // Named escapes cannot be resolved here.
            'N' => return None,
            '\\' | '\'' | '"' => value.push(next),
            other => {
                value.push('\\');
                value.push(other);
            }
        }
    }
    None
}

/// Reads exactly `digits` hex digits as a code point.
fn read_hex(chars: &mut Chars<'_>, digits: usize) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.chars().count() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

/// Reads up to three octal digits, the first of which is `first`.
fn read_octal(first: char, chars: &mut Chars<'_>) -> Option<char> {
    let mut code = first.to_digit(8)?;
    for _ in 0..2 {
        match chars.clone().next().and_then(|c| c.to_digit(8)) {
            Some(digit) => {
                code = code * 8 + digit;
                chars.next();
            }
            None => break,
        }
    }
    char::from_u32(code)
}
