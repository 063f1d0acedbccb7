//! Compiled, fault-isolated item rules.
//!
//! Rules are boolean expressions over an item record, written one per
//! blank-line-delimited block:
//!
//! ```text
//! // uniques worth picking up
//! rarity == "Unique" and links >= 5
//!
//! class in ["Rings", "Amulets"]
//!   and mods.count(m => m.tier <= 2) >= 2
//! ```
//!
//! Each block is compiled once against the record [`Schema`] when the
//! [`RuleSet`] is loaded. A rule that fails to compile is kept, reported,
//! and never matches; a rule that faults on one record is reported and
//! treated as a miss for that record only.
//!
//! ```
//! use itemrule::{Item, Rarity, RuleSet};
//!
//! let rules: RuleSet<Item> = RuleSet::load_from_string(
//!     "rarity == \"Unique\"\n\nquality >= 20 // gems and flasks",
//! );
//! let item = Item::new("Divine Life Flask").with_quality(20);
//! assert!(rules.matches(&item, false));
//! assert!(!rules.matches(&Item::new("Iron Ring"), false));
//! ```

mod compile;
pub mod diagnostics;
mod error;
mod evaluate;
pub mod item;
pub mod parse;
pub mod sections;
mod types;

pub use compile::{compile, compile_with};
pub use diagnostics::{priority, Diagnostics, MemoryDiagnostics, TracingDiagnostics};
pub use error::LoadError;
pub use item::{Armour, Item, Modifier, Rarity, Socket, Weapon};
pub use parse::ParseError;
pub use sections::{split_sections, RawSection};
pub use types::{
    ArithOp, CompareOp, CompileError, CompileErrorKind, CompiledRule, EvalError, Expr, ExprKind,
    Literal, Loader, MatchReport, Member, MemberId, MemberKind, Predicate, Record, RuleSet,
    Schema, Span, Type, Value,
};
