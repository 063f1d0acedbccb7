mod error;
mod grammar;

pub use error::ParseError;

use crate::Expr;

/// Parse one rule's text into an [`Expr`].
///
/// The whole input must be a single expression; surrounding whitespace and
/// newlines are ignored.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid expression.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    use winnow::Parser;
    grammar::rule_expr
        .parse(grammar::new_input(input))
        .map_err(|e| ParseError::new(describe(e.inner()), e.offset()))
}

fn describe(err: &winnow::error::ContextError) -> String {
    let message = err.to_string();
    if message.is_empty() {
        "unexpected input".to_owned()
    } else {
        message.replace('\n', "; ")
    }
}
