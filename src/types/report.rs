use std::fmt;
use std::time::Duration;

/// Detailed result of matching one record, returned by
/// [`RuleSet::evaluate_detailed()`](super::RuleSet::evaluate_detailed).
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct MatchReport {
    matched_line: Option<usize>,
    evaluated: usize,
    failures: Vec<usize>,
    duration: Duration,
}

impl MatchReport {
    pub(crate) fn new(
        matched_line: Option<usize>,
        evaluated: usize,
        failures: Vec<usize>,
        duration: Duration,
    ) -> Self {
        Self {
            matched_line,
            evaluated,
            failures,
            duration,
        }
    }

    /// Whether any rule matched; same as [`RuleSet::matches()`](super::RuleSet::matches).
    #[must_use]
    pub fn matched(&self) -> bool {
        self.matched_line.is_some()
    }

    /// Start line of the rule that matched.
    #[must_use]
    pub fn matched_line(&self) -> Option<usize> {
        self.matched_line
    }

    /// Number of compiled rules whose predicate ran, including the match.
    #[must_use]
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    /// Start lines of rules that raised an evaluation error for this record.
    #[must_use]
    pub fn failures(&self) -> &[usize] {
        &self.failures
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.matched_line {
            Some(line) => write!(f, "matched: line {line}")?,
            None => write!(f, "matched: none")?,
        }
        write!(f, ", evaluated: {}", self.evaluated)?;
        if !self.failures.is_empty() {
            let lines: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
            write!(f, ", failed: [{}]", lines.join(", "))?;
        }
        write!(f, ", duration: {:?}", self.duration)
    }
}
