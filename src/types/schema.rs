use std::fmt;

/// Identifier of a record member, interpreted by the [`Record`](super::Record)
/// implementation that declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub u16);

/// Static type of a value produced by a rule expression or a record member.
#[derive(Clone, Copy)]
pub enum Type {
    Bool,
    Int,
    Float,
    Str,
    /// A nested record described by its own schema.
    Object(&'static Schema),
    /// A homogeneous list of the given element type.
    List(&'static Type),
}

impl Type {
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float | Type::Str)
    }

    /// Whether values of `self` and `other` can be tested for equality.
    #[must_use]
    pub fn comparable_with(&self, other: &Type) -> bool {
        (self.is_numeric() && other.is_numeric())
            || matches!(
                (self, other),
                (Type::Bool, Type::Bool) | (Type::Str, Type::Str)
            )
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Bool, Type::Bool)
            | (Type::Int, Type::Int)
            | (Type::Float, Type::Float)
            | (Type::Str, Type::Str) => true,
            (Type::Object(a), Type::Object(b)) => std::ptr::eq(*a, *b),
            (Type::List(a), Type::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Str => write!(f, "string"),
            Type::Object(schema) => write!(f, "{}", schema.name),
            Type::List(elem) => write!(f, "list<{elem}>"),
        }
    }
}

/// What a member is: a plain field or a method taking arguments.
#[derive(Debug, Clone, Copy)]
pub enum MemberKind {
    Field(Type),
    Method {
        params: &'static [Type],
        returns: Type,
    },
}

/// One named member of a [`Schema`].
#[derive(Debug, Clone, Copy)]
pub struct Member {
    pub name: &'static str,
    pub id: MemberId,
    pub kind: MemberKind,
}

/// Static description of the members a record exposes to rules.
///
/// Schemas are declared as `static` items so that nested records can refer
/// to each other through [`Type::Object`] and [`Type::List`].
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub members: &'static [Member],
}

impl Schema {
    /// Look up a member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&'static Member> {
        self.members.iter().find(|m| m.name == name)
    }
}
