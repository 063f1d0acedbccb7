use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::record::Record;
use super::report::MatchReport;
use super::rule::CompiledRule;
use crate::diagnostics::{priority, Diagnostics, TracingDiagnostics};
use crate::evaluate::{evaluate_rule, Outcome};
use crate::sections::{normalize_newlines, split_sections};
use crate::LoadError;

/// Load-time configuration for building a [`RuleSet`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use itemrule::{Item, Loader, MemoryDiagnostics, RuleSet};
///
/// let sink = Arc::new(MemoryDiagnostics::new());
/// let rules: RuleSet<Item> = Loader::new()
///     .diagnostics(sink.clone())
///     .label("inline")
///     .load_string("quality >= 20\n\nrarity == \"Unique\"");
///
/// assert_eq!(rules.len(), 2);
/// assert_eq!(sink.infos().len(), 1);
/// ```
#[derive(Clone)]
pub struct Loader {
    diagnostics: Arc<dyn Diagnostics>,
    label: Option<String>,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            diagnostics: Arc::new(TracingDiagnostics),
            label: None,
        }
    }
}

impl Loader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send load summaries, failures and match traces to `sink`.
    #[must_use]
    pub fn diagnostics<D: Diagnostics + 'static>(mut self, sink: D) -> Self {
        self.diagnostics = Arc::new(sink);
        self
    }

    /// Name the rule source in diagnostics. Defaults to the file path for
    /// [`load_path`](Self::load_path), `<list>` and `<string>` otherwise.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Read a rule file and compile each blank-line-delimited block.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read. Rules that fail
    /// to compile are not errors.
    pub fn load_path<R: Record>(&self, path: impl AsRef<Path>) -> Result<RuleSet<R>, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.load_blocks(label, &text))
    }

    /// Compile each string as its own single-line rule, numbered from 1.
    /// Strings are neither split nor stripped of comments.
    pub fn load_list<R, I, S>(&self, lines: I) -> RuleSet<R>
    where
        R: Record,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                let line = line.as_ref();
                CompiledRule::compile(R::schema(), line.to_owned(), line.to_owned(), index + 1)
            })
            .collect();
        self.finish(self.label_or("<list>"), rules)
    }

    /// Compile rule text the same way as a file's contents.
    pub fn load_string<R: Record>(&self, text: &str) -> RuleSet<R> {
        self.load_blocks(self.label_or("<string>"), text)
    }

    fn label_or(&self, default: &str) -> String {
        self.label.clone().unwrap_or_else(|| default.to_owned())
    }

    fn load_blocks<R: Record>(&self, label: String, text: &str) -> RuleSet<R> {
        let text = normalize_newlines(text);
        let rules = split_sections(text.lines())
            .into_iter()
            .map(|section| {
                CompiledRule::compile(
                    R::schema(),
                    section.text,
                    section.raw_text,
                    section.start_line,
                )
            })
            .collect();
        self.finish(label, rules)
    }

    fn finish<R: Record>(&self, label: String, rules: Vec<CompiledRule>) -> RuleSet<R> {
        let mut failed = 0;
        for rule in &rules {
            if let Some(err) = rule.error() {
                failed += 1;
                self.diagnostics.log_error(
                    &format!(
                        "{label}:{} rule failed to compile: {err}\n  rule: {}",
                        rule.start_line(),
                        rule.raw_text()
                    ),
                    priority::FAILURE,
                );
            }
        }
        self.diagnostics.log_info(
            &format!("{label}: processed {} rules, {failed} failed", rules.len()),
            priority::SUMMARY,
        );
        RuleSet {
            label,
            rules,
            diagnostics: Arc::clone(&self.diagnostics),
            _record: PhantomData,
        }
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// An ordered list of compiled rules over records of type `R`.
///
/// Immutable once loaded, `Send + Sync`, and meant to be shared behind `Arc`.
/// Rule order is match priority: the first rule that holds for a record
/// wins.
pub struct RuleSet<R> {
    label: String,
    rules: Vec<CompiledRule>,
    diagnostics: Arc<dyn Diagnostics>,
    _record: PhantomData<fn(&R)>,
}

impl<R: Record> RuleSet<R> {
    /// Load a rule file with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Loader::new().load_path(path)
    }

    /// Compile each string as its own rule, reporting against `label`.
    pub fn load_from_list<I, S>(label: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Loader::new().label(label).load_list(lines)
    }

    /// Compile rule text with default settings.
    #[must_use]
    pub fn load_from_string(text: &str) -> Self {
        Loader::new().load_string(text)
    }

    /// Whether any rule holds for `record`. Rules after the first match are
    /// not evaluated. With `debug`, the match is traced to the diagnostics
    /// sink.
    #[must_use]
    pub fn matches(&self, record: &R, debug: bool) -> bool {
        self.find_match(record, debug).is_some()
    }

    /// The first rule that holds for `record`.
    #[must_use]
    pub fn find_match(&self, record: &R, debug: bool) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| {
            evaluate_rule(rule, record, &self.label, self.diagnostics.as_ref(), debug)
                == Outcome::Match
        })
    }

    /// Evaluate one rule of this set against `record`, reporting faults and
    /// (with `debug`) a match trace to the diagnostics sink.
    #[must_use]
    pub fn evaluate(&self, rule: &CompiledRule, record: &R, debug: bool) -> bool {
        evaluate_rule(rule, record, &self.label, self.diagnostics.as_ref(), debug)
            == Outcome::Match
    }

    /// Match `record` and report which rule matched, how many rules ran and
    /// which of them faulted.
    pub fn evaluate_detailed(&self, record: &R) -> MatchReport {
        let start = Instant::now();
        let mut evaluated = 0;
        let mut failures = Vec::new();
        let mut matched_line = None;
        for rule in &self.rules {
            match evaluate_rule(rule, record, &self.label, self.diagnostics.as_ref(), false) {
                Outcome::Inert => continue,
                Outcome::Miss => {}
                Outcome::Fault => failures.push(rule.start_line()),
                Outcome::Match => {
                    evaluated += 1;
                    matched_line = Some(rule.start_line());
                    break;
                }
            }
            evaluated += 1;
        }
        MatchReport::new(matched_line, evaluated, failures, start.elapsed())
    }
}

impl<R> RuleSet<R> {
    /// Rules in load order, including failed ones.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules that failed to compile.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.rules.iter().filter(|r| r.failed()).count()
    }

    /// Name of the source the rules were loaded from.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<R> fmt::Debug for RuleSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("label", &self.label)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<R> fmt::Display for RuleSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({}: {} rules, {} failed)",
            self.label,
            self.rules.len(),
            self.failed_count(),
        )
    }
}
