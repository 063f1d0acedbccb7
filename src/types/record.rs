use std::borrow::Cow;

use super::error::EvalError;
use super::schema::{MemberId, Schema};
use super::value::Value;

/// A structured value rules are evaluated against.
///
/// Rules are bound to the record's [`Schema`] when they are compiled; at
/// evaluation time the engine only asks for members by [`MemberId`]. Nested
/// records (list elements, optional components) implement this trait too.
///
/// Implementations must be read-only: `get` may memoise derived values
/// inside the record, but it must not observe or mutate anything shared
/// with other records.
pub trait Record {
    /// The schema rules are bound against when this type is the root record.
    fn schema() -> &'static Schema
    where
        Self: Sized;

    /// Read a field, or call a method with already-evaluated arguments.
    ///
    /// Argument count and types have been checked against the schema at
    /// compile time.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Absent`] when the member is an optional component
    /// this record does not carry, or any other [`EvalError`] the record
    /// wants to surface for this one evaluation.
    fn get(&self, member: MemberId, args: &[Value<'_>]) -> Result<Value<'_>, EvalError>;

    /// Human-readable identifier used in diagnostics.
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed("<record>")
    }
}
