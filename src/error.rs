use std::path::PathBuf;

use thiserror::Error;

/// A rule source that could not be read.
///
/// Rules that fail to compile do not produce a `LoadError`; they are kept in
/// the [`RuleSet`](crate::RuleSet) as failed rules.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read rule file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
