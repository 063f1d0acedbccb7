mod error;
mod expr;
mod record;
mod report;
mod rule;
mod ruleset;
mod schema;
mod value;

pub use error::{CompileError, CompileErrorKind, EvalError};
pub(crate) use expr::{Builtin, CompiledExpr, Quantifier};
pub use expr::{ArithOp, CompareOp, Expr, ExprKind, Literal, Span};
pub use record::Record;
pub use report::MatchReport;
pub use rule::{CompiledRule, Predicate};
pub use ruleset::{Loader, RuleSet};
pub use schema::{Member, MemberId, MemberKind, Schema, Type};
pub use value::Value;
