//! Content line lexer (RFC 5545 §3.1).

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{ContentLine, Parameter};

/// ## Summary
/// Splits input into logical content lines, undoing line folding.
///
/// Accepts CRLF or bare LF endings. A line starting with SPACE or HTAB
/// continues the previous one with that single whitespace character
/// removed. Blank lines are dropped. Each line is paired with the 1-based
/// physical line it started on.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (idx, raw) in input.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.is_empty() {
            continue;
        }

        match (line.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(continuation), Some((_, prev))) => prev.push_str(continuation),
            (Some(continuation), None) => lines.push((idx + 1, continuation.to_string())),
            (None, _) => lines.push((idx + 1, line.to_string())),
        }
    }

    lines
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Name,
    ParamName,
    ParamValue,
    Quoted,
}

/// ## Summary
/// Tokenizes one unfolded content line: `name *(";" param) ":" value`.
///
/// Quoted parameter values may contain `:`, `;` and `,`. RFC 6868 caret
/// escapes (`^^`, `^n`, `^'`) are decoded inside parameter values.
///
/// ## Errors
/// Returns an error when the name is missing or malformed, a quote is left
/// open, or no `:` separates the value.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let err = |kind, col: usize| ParseError::new(kind, line_num, col + 1);

    let mut state = State::Name;
    let mut name = String::new();
    let mut params: Vec<Parameter> = Vec::new();
    let mut param_name = String::new();
    let mut param_values: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut quote_start = 0;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match state {
            State::Name => match c {
                ';' | ':' if name.is_empty() => {
                    return Err(err(ParseErrorKind::MissingPropertyName, i));
                }
                ';' => state = State::ParamName,
                ':' => {
                    return Ok(ContentLine {
                        name: name.to_ascii_uppercase(),
                        params,
                        raw_value: line[i + 1..].to_string(),
                        line: line_num,
                    });
                }
                c if c.is_ascii_alphanumeric() || c == '-' => name.push(c),
                _ => return Err(err(ParseErrorKind::InvalidPropertyName, i)),
            },
            State::ParamName => match c {
                '=' if !param_name.is_empty() => state = State::ParamValue,
                c if c.is_ascii_alphanumeric() || c == '-' => param_name.push(c),
                _ => return Err(err(ParseErrorKind::InvalidParameter, i)),
            },
            State::ParamValue => match c {
                '"' if current.is_empty() => {
                    quote_start = i;
                    state = State::Quoted;
                }
                ',' => param_values.push(std::mem::take(&mut current)),
                ';' | ':' => {
                    param_values.push(std::mem::take(&mut current));
                    params.push(Parameter::with_values(
                        std::mem::take(&mut param_name),
                        std::mem::take(&mut param_values),
                    ));
                    if c == ':' {
                        return Ok(ContentLine {
                            name: name.to_ascii_uppercase(),
                            params,
                            raw_value: line[i + 1..].to_string(),
                            line: line_num,
                        });
                    }
                    state = State::ParamName;
                }
                _ => current.push(c),
            },
            State::Quoted => match c {
                '"' => state = State::ParamValue,
                '^' => match chars.peek().map(|(_, next)| *next) {
                    Some('^') => {
                        current.push('^');
                        chars.next();
                    }
                    Some('n' | 'N') => {
                        current.push('\n');
                        chars.next();
                    }
                    Some('\'') => {
                        current.push('"');
                        chars.next();
                    }
                    _ => current.push('^'),
                },
                _ => current.push(c),
            },
        }
    }

    match state {
        State::Quoted => Err(err(ParseErrorKind::UnclosedQuote, quote_start)),
        State::Name if name.is_empty() => Err(err(ParseErrorKind::MissingPropertyName, 0)),
        _ => Err(err(ParseErrorKind::MissingColon, line.len())),
    }
}
