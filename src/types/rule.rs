use super::error::{CompileError, EvalError};
use super::expr::CompiledExpr;
use super::record::Record;
use super::schema::Schema;

/// A rule compiled to an executable boolean expression.
///
/// Produced by [`compile`](crate::compile()) and bound to the schema it was
/// compiled against; test it only with records of that schema.
#[derive(Debug, Clone)]
pub struct Predicate {
    expr: CompiledExpr,
}

impl Predicate {
    pub(crate) fn new(expr: CompiledExpr) -> Self {
        Self { expr }
    }

    pub(crate) fn expr(&self) -> &CompiledExpr {
        &self.expr
    }

    /// Evaluate against one record, without catching panics.
    ///
    /// # Errors
    ///
    /// Returns the [`EvalError`] raised while reading the record or
    /// computing the expression.
    pub fn test(&self, record: &dyn Record) -> Result<bool, EvalError> {
        crate::evaluate::test(&self.expr, record)
    }
}

/// One rule of a [`RuleSet`](super::RuleSet): its text, where it came from,
/// and either its predicate or the reason it failed to compile.
///
/// A failed rule is kept so it stays visible to diagnostics. It never
/// matches.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    source_text: String,
    raw_text: String,
    predicate: Result<Predicate, CompileError>,
    start_line: usize,
}

impl CompiledRule {
    pub(crate) fn compile(
        schema: &'static Schema,
        source_text: String,
        raw_text: String,
        start_line: usize,
    ) -> Self {
        let predicate = crate::compile::compile_with(schema, &source_text);
        Self {
            source_text,
            raw_text,
            predicate,
            start_line,
        }
    }

    /// Text handed to the compiler, with comments removed.
    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Text exactly as written in the source.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// 1-based line of the source where the rule starts.
    #[must_use]
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        self.predicate.is_err()
    }

    #[must_use]
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref().ok()
    }

    #[must_use]
    pub fn error(&self) -> Option<&CompileError> {
        self.predicate.as_ref().err()
    }

    /// Evaluate against one record inside the failure boundary.
    ///
    /// A failed rule returns `Ok(false)` without touching the record.
    ///
    /// # Errors
    ///
    /// Returns the [`EvalError`] raised by the predicate, including
    /// [`EvalError::Panicked`] if the record implementation panicked.
    pub fn evaluate(&self, record: &dyn Record) -> Result<bool, EvalError> {
        match &self.predicate {
            Ok(predicate) => crate::evaluate::guarded(|| predicate.test(record)),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::{CompileErrorKind, Record};

    fn rule(text: &str) -> CompiledRule {
        CompiledRule::compile(Item::schema(), text.to_owned(), text.to_owned(), 1)
    }

    #[test]
    fn compiled_rule_accessors() {
        let r = CompiledRule::compile(
            Item::schema(),
            "quality > 5 \n".to_owned(),
            "quality > 5 // good".to_owned(),
            7,
        );
        assert!(!r.failed());
        assert!(r.predicate().is_some());
        assert!(r.error().is_none());
        assert_eq!(r.start_line(), 7);
        assert_eq!(r.raw_text(), "quality > 5 // good");
        assert_eq!(r.source_text(), "quality > 5 \n");
    }

    #[test]
    fn failed_rule_is_inert() {
        let r = rule("!!!broken!!!");
        assert!(r.failed());
        assert!(r.predicate().is_none());
        assert!(matches!(
            r.error().map(CompileError::kind),
            Some(CompileErrorKind::Syntax(_))
        ));
        assert_eq!(r.evaluate(&Item::new("Anything")), Ok(false));
    }

    #[test]
    fn evaluate_reports_faults() {
        let r = rule("weapon.dps() > 1");
        assert!(matches!(
            r.evaluate(&Item::new("Leather Belt")),
            Err(EvalError::Absent { .. })
        ));
    }
}
