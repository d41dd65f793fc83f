//! iCalendar reader error types.

use std::fmt;

pub type ParseResult<T> = Result<T, ParseError>;

/// A reader error with its 1-based position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub context: Option<String>,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.kind, self.line, self.column)?;
        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    MissingPropertyName,
    InvalidPropertyName,
    MissingColon,
    InvalidParameter,
    UnclosedQuote,
    InvalidDate,
    InvalidDateTime,
    InvalidDuration,
    InvalidPeriod,
    InvalidRRule,
    InvalidValue,
    MissingBegin,
    MissingEnd,
    MismatchedComponent,
    /// UNTIL and COUNT are mutually exclusive.
    UntilCountConflict,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MissingPropertyName => "missing property name",
            Self::InvalidPropertyName => "invalid property name",
            Self::MissingColon => "missing colon separator",
            Self::InvalidParameter => "invalid parameter format",
            Self::UnclosedQuote => "unclosed quoted string",
            Self::InvalidDate => "invalid date format",
            Self::InvalidDateTime => "invalid date-time format",
            Self::InvalidDuration => "invalid duration format",
            Self::InvalidPeriod => "invalid period format",
            Self::InvalidRRule => "invalid recurrence rule",
            Self::InvalidValue => "invalid property value",
            Self::MissingBegin => "missing BEGIN line",
            Self::MissingEnd => "missing END line",
            Self::MismatchedComponent => "mismatched BEGIN/END",
            Self::UntilCountConflict => "UNTIL and COUNT are mutually exclusive",
        };
        f.write_str(msg)
    }
}
