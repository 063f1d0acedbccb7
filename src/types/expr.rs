use std::fmt;

use regex::Regex;

use super::schema::MemberId;

/// Comparison operators supported in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Arithmetic operators supported in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Byte range of an expression inside the rule text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// A constant written in the rule text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Parsed rule expression. Identifiers are still plain names; they are
/// bound to schema members by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    height: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// A bare name: a lambda parameter or a member of the root record.
    Ident(String),
    /// `target.name`
    Member { target: Box<Expr>, name: String },
    /// `name(args)` or `target.name(args)`
    Call {
        target: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },
    /// `param => body`, only valid as the argument of a quantifier.
    Lambda { param: String, body: Box<Expr> },
    Not(Box<Expr>),
    Neg(Box<Expr>),
    /// Two or more operands, evaluated left to right.
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `needle in [a, b, ...]`
    In { needle: Box<Expr>, set: Vec<Expr> },
}

impl Expr {
    pub(crate) fn new(kind: ExprKind, span: impl Into<Span>) -> Self {
        let height = 1 + kind.child_height();
        Self {
            kind,
            span: span.into(),
            height,
        }
    }

    /// Number of nodes on the longest path from this node to a leaf.
    pub(crate) fn height(&self) -> usize {
        self.height
    }
}

impl ExprKind {
    fn child_height(&self) -> usize {
        fn tallest<'e>(exprs: impl IntoIterator<Item = &'e Expr>) -> usize {
            exprs.into_iter().map(Expr::height).max().unwrap_or(0)
        }
        match self {
            ExprKind::Literal(_) | ExprKind::Ident(_) => 0,
            ExprKind::Member { target, .. } => target.height,
            ExprKind::Call { target, args, .. } => {
                tallest(target.as_deref().into_iter().chain(args))
            }
            ExprKind::Lambda { body: inner, .. } | ExprKind::Not(inner) | ExprKind::Neg(inner) => {
                inner.height
            }
            ExprKind::And(operands) | ExprKind::Or(operands) => tallest(operands),
            ExprKind::Compare { lhs, rhs, .. } | ExprKind::Arith { lhs, rhs, .. } => {
                lhs.height.max(rhs.height)
            }
            ExprKind::In { needle, set } => needle.height.max(tallest(set)),
        }
    }
}

/// Collection quantifiers: `any`, `all` and `count` over a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantifier {
    Any,
    All,
    Count,
}

/// Built-in functions and value methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Len,
    Lower,
    Upper,
    Contains,
    StartsWith,
    EndsWith,
    Abs,
    Min,
    Max,
}

/// Compiled expression with every identifier resolved to a schema member
/// or a lambda parameter slot.
#[derive(Debug, Clone)]
pub(crate) enum CompiledExpr {
    Const(Literal),
    /// The record the rule is evaluated against.
    Root,
    /// Lambda parameter, by nesting depth.
    Param(usize),
    Get {
        target: Box<CompiledExpr>,
        member: MemberId,
        args: Vec<CompiledExpr>,
    },
    Not(Box<CompiledExpr>),
    Neg(Box<CompiledExpr>),
    And(Vec<CompiledExpr>),
    Or(Vec<CompiledExpr>),
    Compare {
        op: CompareOp,
        lhs: Box<CompiledExpr>,
        rhs: Box<CompiledExpr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<CompiledExpr>,
        rhs: Box<CompiledExpr>,
    },
    In {
        needle: Box<CompiledExpr>,
        set: Vec<CompiledExpr>,
    },
    Quantify {
        quantifier: Quantifier,
        source: Box<CompiledExpr>,
        body: Box<CompiledExpr>,
    },
    Has(Box<CompiledExpr>),
    Builtin {
        func: Builtin,
        args: Vec<CompiledExpr>,
    },
    Matches {
        target: Box<CompiledExpr>,
        regex: Regex,
    },
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "+"),
            ArithOp::Sub => write!(f, "-"),
            ArithOp::Mul => write!(f, "*"),
            ArithOp::Div => write!(f, "/"),
            ArithOp::Rem => write!(f, "%"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// Renders the expression fully parenthesised; spans are not shown.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(lit) => write!(f, "{lit}"),
            ExprKind::Ident(name) => write!(f, "{name}"),
            ExprKind::Member { target, name } => write!(f, "{target}.{name}"),
            ExprKind::Call { target, name, args } => {
                if let Some(target) = target {
                    write!(f, "{target}.")?;
                }
                write!(f, "{name}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            ExprKind::Lambda { param, body } => write!(f, "{param} => {body}"),
            ExprKind::Not(inner) => write!(f, "(NOT {inner})"),
            ExprKind::Neg(inner) => write!(f, "(-{inner})"),
            ExprKind::And(operands) => write_joined(f, operands, " AND "),
            ExprKind::Or(operands) => write_joined(f, operands, " OR "),
            ExprKind::Compare { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            ExprKind::Arith { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            ExprKind::In { needle, set } => {
                write!(f, "({needle} IN [")?;
                write_list(f, set)?;
                write!(f, "])")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[Expr], separator: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{operand}")?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::new(ExprKind::Ident(name.to_owned()), 0..name.len())
    }

    fn int(v: i64) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Int(v)), Span::default())
    }

    #[test]
    fn display_compare() {
        let expr = Expr::new(
            ExprKind::Compare {
                op: CompareOp::Gte,
                lhs: Box::new(ident("item_level")),
                rhs: Box::new(int(75)),
            },
            0..15,
        );
        assert_eq!(expr.to_string(), "(item_level >= 75)");
    }

    #[test]
    fn display_call_and_member() {
        let weapon = ident("weapon");
        let dps = Expr::new(
            ExprKind::Member {
                target: Box::new(weapon),
                name: "dps".to_owned(),
            },
            0..10,
        );
        let call = Expr::new(
            ExprKind::Call {
                target: None,
                name: "has_tag".to_owned(),
                args: vec![Expr::new(
                    ExprKind::Literal(Literal::Str("rare".to_owned())),
                    Span::default(),
                )],
            },
            0..15,
        );
        assert_eq!(dps.to_string(), "weapon.dps");
        assert_eq!(call.to_string(), "has_tag(\"rare\")");
    }

    #[test]
    fn display_in_and_logic() {
        let expr = Expr::new(
            ExprKind::And(vec![
                Expr::new(
                    ExprKind::In {
                        needle: Box::new(ident("x")),
                        set: vec![int(1), int(2)],
                    },
                    Span::default(),
                ),
                Expr::new(
                    ExprKind::Not(Box::new(ident("corrupted"))),
                    Span::default(),
                ),
                ident("identified"),
            ]),
            Span::default(),
        );
        assert_eq!(
            expr.to_string(),
            "((x IN [1, 2]) AND (NOT corrupted) AND identified)"
        );
    }

    #[test]
    fn height_counts_longest_path() {
        assert_eq!(ident("x").height(), 1);
        let not = Expr::new(ExprKind::Not(Box::new(ident("x"))), Span::default());
        let or = Expr::new(ExprKind::Or(vec![ident("a"), not, ident("b")]), Span::default());
        assert_eq!(or.height(), 3);
    }

    #[test]
    fn span_from_range() {
        assert_eq!(Span::from(3..9), Span { start: 3, end: 9 });
    }

    #[test]
    fn float_literal_keeps_decimal_point() {
        assert_eq!(Literal::Float(2.0).to_string(), "2.0");
    }
}
