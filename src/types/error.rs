use thiserror::Error;

/// Why a rule failed to compile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileErrorKind {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("empty rule")]
    Empty,

    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: String },

    #[error("'{owner}' has no member '{name}'")]
    UnknownMember { owner: String, name: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("'{name}' is not callable")]
    NotCallable { name: String },

    #[error("'{name}' is a method and must be called")]
    MissingCall { name: String },

    #[error("'{name}' expects {expected} argument(s), found {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("rule must be a boolean expression, found {found}")]
    NotBoolean { found: String },

    #[error("'{name}' needs a lambda argument like `x => ...`")]
    ExpectedLambda { name: String },

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),
}

/// A rule that could not be parsed or bound against the record schema.
///
/// Carries the offending rule text and, when known, the byte offset into
/// that text where compilation failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}{}", at_offset(.offset))]
pub struct CompileError {
    kind: CompileErrorKind,
    offset: Option<usize>,
    text: String,
}

fn at_offset(offset: &Option<usize>) -> String {
    offset.map_or_else(String::new, |o| format!(" at offset {o}"))
}

impl CompileError {
    pub(crate) fn new(kind: CompileErrorKind, offset: Option<usize>, text: &str) -> Self {
        Self {
            kind,
            offset,
            text: text.to_owned(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &CompileErrorKind {
        &self.kind
    }

    /// Byte offset into [`text()`](Self::text) where compilation failed.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// The rule text that failed to compile.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A fault raised while evaluating one compiled rule against one record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("'{member}' is absent on this record")]
    Absent { member: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("unexpected {found} value where {expected} was required")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },

    #[error("record error: {0}")]
    Record(String),

    #[error("rule panicked: {0}")]
    Panicked(String),
}
