use regex::Regex;

use crate::types::{
    Builtin, CompileError, CompileErrorKind, CompiledExpr, Expr, ExprKind, Literal, MemberKind,
    Predicate, Quantifier, Record, Schema, Span, Type,
};
use crate::CompareOp;

/// Compile one rule's text against the schema of record type `R`.
///
/// # Errors
///
/// Returns [`CompileError`] if the text does not parse, references a member
/// the schema does not declare, or is not a well-typed boolean expression.
pub fn compile<R: Record>(text: &str) -> Result<Predicate, CompileError> {
    compile_with(R::schema(), text)
}

/// Compile one rule's text against an explicit root schema.
///
/// # Errors
///
/// See [`compile`].
pub fn compile_with(schema: &'static Schema, text: &str) -> Result<Predicate, CompileError> {
    if text.trim().is_empty() {
        return Err(CompileError::new(CompileErrorKind::Empty, None, text));
    }
    let ast = crate::parse::parse(text).map_err(|e| {
        CompileError::new(
            CompileErrorKind::Syntax(e.message().to_owned()),
            Some(e.offset()),
            text,
        )
    })?;
    let mut binder = Binder {
        root: schema,
        params: Vec::new(),
        text,
    };
    let bound = binder.bind(&ast)?;
    if bound.ty != Type::Bool {
        return Err(binder.error(
            CompileErrorKind::NotBoolean {
                found: bound.ty.to_string(),
            },
            ast.span,
        ));
    }
    Ok(Predicate::new(bound.expr))
}

struct Typed {
    expr: CompiledExpr,
    ty: Type,
}

impl Typed {
    fn new(expr: CompiledExpr, ty: Type) -> Self {
        Self { expr, ty }
    }
}

struct Binder<'a> {
    root: &'static Schema,
    /// Lambda parameters in scope, outermost first.
    params: Vec<(&'a str, Type)>,
    text: &'a str,
}

impl<'a> Binder<'a> {
    fn error(&self, kind: CompileErrorKind, span: Span) -> CompileError {
        CompileError::new(kind, Some(span.start), self.text)
    }

    fn mismatch(&self, context: &str, expected: &str, found: &Type, span: Span) -> CompileError {
        self.error(
            CompileErrorKind::TypeMismatch {
                context: context.to_owned(),
                expected: expected.to_owned(),
                found: found.to_string(),
            },
            span,
        )
    }

    fn expect(
        &self,
        typed: &Typed,
        want: Type,
        context: &str,
        span: Span,
    ) -> Result<(), CompileError> {
        if typed.ty == want {
            Ok(())
        } else {
            Err(self.mismatch(context, &want.to_string(), &typed.ty, span))
        }
    }

    fn expect_numeric(&self, typed: &Typed, context: &str, span: Span) -> Result<(), CompileError> {
        if typed.ty.is_numeric() {
            Ok(())
        } else {
            Err(self.mismatch(context, "number", &typed.ty, span))
        }
    }

    fn bind(&mut self, expr: &'a Expr) -> Result<Typed, CompileError> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(bind_literal(lit)),
            ExprKind::Ident(name) => self.bind_ident(name, expr.span),
            ExprKind::Member { target, name } => {
                let target = self.bind(target)?;
                self.bind_member(target, name, expr.span)
            }
            ExprKind::Call { target, name, args } => match target {
                Some(target) => {
                    let target = self.bind(target)?;
                    self.bind_method(target, name, args, expr.span)
                }
                None => self.bind_function(name, args, expr.span),
            },
            ExprKind::Lambda { .. } => Err(self.error(
                CompileErrorKind::Syntax(
                    "a lambda is only allowed as the argument of any, all or count".to_owned(),
                ),
                expr.span,
            )),
            ExprKind::Not(inner) => {
                let inner_bound = self.bind(inner)?;
                self.expect(&inner_bound, Type::Bool, "negation", inner.span)?;
                Ok(Typed::new(
                    CompiledExpr::Not(Box::new(inner_bound.expr)),
                    Type::Bool,
                ))
            }
            ExprKind::Neg(inner) => {
                let inner_bound = self.bind(inner)?;
                self.expect_numeric(&inner_bound, "negation", inner.span)?;
                Ok(negate(inner_bound))
            }
            ExprKind::And(operands) | ExprKind::Or(operands) => {
                let mut bound = Vec::with_capacity(operands.len());
                for operand in operands {
                    let typed = self.bind(operand)?;
                    self.expect(&typed, Type::Bool, "logical operator", operand.span)?;
                    bound.push(typed.expr);
                }
                let combined = if matches!(expr.kind, ExprKind::And(_)) {
                    CompiledExpr::And(bound)
                } else {
                    CompiledExpr::Or(bound)
                };
                Ok(Typed::new(combined, Type::Bool))
            }
            ExprKind::Compare { op, lhs, rhs } => {
                let l = self.bind(lhs)?;
                let r = self.bind(rhs)?;
                let ordered = !matches!(op, CompareOp::Eq | CompareOp::Neq);
                let valid = if ordered {
                    (l.ty.is_numeric() && r.ty.is_numeric())
                        || (l.ty == Type::Str && r.ty == Type::Str)
                } else {
                    l.ty.comparable_with(&r.ty)
                };
                if !valid {
                    return Err(self.mismatch("comparison", &l.ty.to_string(), &r.ty, rhs.span));
                }
                Ok(Typed::new(
                    CompiledExpr::Compare {
                        op: *op,
                        lhs: Box::new(l.expr),
                        rhs: Box::new(r.expr),
                    },
                    Type::Bool,
                ))
            }
            ExprKind::Arith { op, lhs, rhs } => {
                let l = self.bind(lhs)?;
                self.expect_numeric(&l, "arithmetic", lhs.span)?;
                let r = self.bind(rhs)?;
                self.expect_numeric(&r, "arithmetic", rhs.span)?;
                let ty = numeric_result(&l.ty, &r.ty);
                Ok(Typed::new(
                    CompiledExpr::Arith {
                        op: *op,
                        lhs: Box::new(l.expr),
                        rhs: Box::new(r.expr),
                    },
                    ty,
                ))
            }
            ExprKind::In { needle, set } => {
                let n = self.bind(needle)?;
                if !n.ty.is_scalar() {
                    return Err(self.mismatch("in", "scalar", &n.ty, needle.span));
                }
                let mut members = Vec::with_capacity(set.len());
                for item in set {
                    let bound = self.bind(item)?;
                    if !n.ty.comparable_with(&bound.ty) {
                        return Err(self.mismatch("in", &n.ty.to_string(), &bound.ty, item.span));
                    }
                    members.push(bound.expr);
                }
                Ok(Typed::new(
                    CompiledExpr::In {
                        needle: Box::new(n.expr),
                        set: members,
                    },
                    Type::Bool,
                ))
            }
        }
    }

    fn bind_ident(&self, name: &str, span: Span) -> Result<Typed, CompileError> {
        if let Some(slot) = self.params.iter().rposition(|(p, _)| *p == name) {
            return Ok(Typed::new(CompiledExpr::Param(slot), self.params[slot].1));
        }
        match self.root.member(name) {
            Some(member) => match member.kind {
                MemberKind::Field(ty) => Ok(Typed::new(
                    CompiledExpr::Get {
                        target: Box::new(CompiledExpr::Root),
                        member: member.id,
                        args: Vec::new(),
                    },
                    ty,
                )),
                MemberKind::Method { .. } => Err(self.error(
                    CompileErrorKind::MissingCall {
                        name: name.to_owned(),
                    },
                    span,
                )),
            },
            None => Err(self.error(
                CompileErrorKind::UnknownIdentifier {
                    name: name.to_owned(),
                },
                span,
            )),
        }
    }

    fn bind_member(&self, target: Typed, name: &str, span: Span) -> Result<Typed, CompileError> {
        let Type::Object(schema) = target.ty else {
            return Err(self.unknown_member(&target.ty, name, span));
        };
        let Some(member) = schema.member(name) else {
            return Err(self.unknown_member(&target.ty, name, span));
        };
        match member.kind {
            MemberKind::Field(ty) => Ok(Typed::new(
                CompiledExpr::Get {
                    target: Box::new(target.expr),
                    member: member.id,
                    args: Vec::new(),
                },
                ty,
            )),
            MemberKind::Method { .. } => Err(self.error(
                CompileErrorKind::MissingCall {
                    name: name.to_owned(),
                },
                span,
            )),
        }
    }

    fn unknown_member(&self, owner: &Type, name: &str, span: Span) -> CompileError {
        self.error(
            CompileErrorKind::UnknownMember {
                owner: owner.to_string(),
                name: name.to_owned(),
            },
            span,
        )
    }

    /// Bind a schema method call on `target` (the root record for free calls).
    fn bind_schema_call(
        &mut self,
        target: CompiledExpr,
        schema: &'static Schema,
        name: &str,
        args: &'a [Expr],
        span: Span,
    ) -> Result<Option<Typed>, CompileError> {
        let Some(member) = schema.member(name) else {
            return Ok(None);
        };
        let MemberKind::Method { params, returns } = member.kind else {
            return Err(self.error(
                CompileErrorKind::NotCallable {
                    name: name.to_owned(),
                },
                span,
            ));
        };
        self.check_arity(name, params.len(), args, span)?;
        let mut bound_args = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(params) {
            let bound = self.bind(arg)?;
            let accepted = bound.ty == *param || (*param == Type::Float && bound.ty == Type::Int);
            if !accepted {
                return Err(self.mismatch(
                    &format!("argument of '{name}'"),
                    &param.to_string(),
                    &bound.ty,
                    arg.span,
                ));
            }
            bound_args.push(bound.expr);
        }
        Ok(Some(Typed::new(
            CompiledExpr::Get {
                target: Box::new(target),
                member: member.id,
                args: bound_args,
            },
            returns,
        )))
    }

    fn check_arity(
        &self,
        name: &str,
        expected: usize,
        args: &[Expr],
        span: Span,
    ) -> Result<(), CompileError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(self.error(
                CompileErrorKind::ArgumentCount {
                    name: name.to_owned(),
                    expected,
                    found: args.len(),
                },
                span,
            ))
        }
    }

    fn bind_function(
        &mut self,
        name: &str,
        args: &'a [Expr],
        span: Span,
    ) -> Result<Typed, CompileError> {
        if let Some(bound) =
            self.bind_schema_call(CompiledExpr::Root, self.root, name, args, span)?
        {
            return Ok(bound);
        }
        match name {
            "has" => {
                self.check_arity(name, 1, args, span)?;
                let arg = &args[0];
                if !matches!(
                    arg.kind,
                    ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Call { .. }
                ) {
                    return Err(self.error(
                        CompileErrorKind::TypeMismatch {
                            context: "has".to_owned(),
                            expected: "member access".to_owned(),
                            found: arg.to_string(),
                        },
                        arg.span,
                    ));
                }
                let inner = self.bind(arg)?;
                Ok(Typed::new(CompiledExpr::Has(Box::new(inner.expr)), Type::Bool))
            }
            "abs" => {
                self.check_arity(name, 1, args, span)?;
                let inner = self.bind(&args[0])?;
                self.expect_numeric(&inner, "abs", args[0].span)?;
                let ty = inner.ty;
                Ok(Typed::new(
                    CompiledExpr::Builtin {
                        func: Builtin::Abs,
                        args: vec![inner.expr],
                    },
                    ty,
                ))
            }
            "min" | "max" => {
                self.check_arity(name, 2, args, span)?;
                let a = self.bind(&args[0])?;
                self.expect_numeric(&a, name, args[0].span)?;
                let b = self.bind(&args[1])?;
                self.expect_numeric(&b, name, args[1].span)?;
                let ty = numeric_result(&a.ty, &b.ty);
                let func = if name == "min" { Builtin::Min } else { Builtin::Max };
                Ok(Typed::new(
                    CompiledExpr::Builtin {
                        func,
                        args: vec![a.expr, b.expr],
                    },
                    ty,
                ))
            }
            _ => Err(self.error(
                CompileErrorKind::UnknownFunction {
                    name: name.to_owned(),
                },
                span,
            )),
        }
    }

    fn bind_method(
        &mut self,
        target: Typed,
        name: &str,
        args: &'a [Expr],
        span: Span,
    ) -> Result<Typed, CompileError> {
        match target.ty {
            Type::Object(schema) => {
                let owner = target.ty;
                match self.bind_schema_call(target.expr, schema, name, args, span)? {
                    Some(bound) => Ok(bound),
                    None => Err(self.unknown_member(&owner, name, span)),
                }
            }
            Type::Str => self.bind_string_method(target, name, args, span),
            Type::List(elem) => self.bind_list_method(target, *elem, name, args, span),
            _ => Err(self.unknown_member(&target.ty, name, span)),
        }
    }

    fn bind_string_method(
        &mut self,
        target: Typed,
        name: &str,
        args: &'a [Expr],
        span: Span,
    ) -> Result<Typed, CompileError> {
        let (func, returns) = match name {
            "len" => (Builtin::Len, Type::Int),
            "lower" => (Builtin::Lower, Type::Str),
            "upper" => (Builtin::Upper, Type::Str),
            "contains" => (Builtin::Contains, Type::Bool),
            "starts_with" => (Builtin::StartsWith, Type::Bool),
            "ends_with" => (Builtin::EndsWith, Type::Bool),
            "matches" => {
                self.check_arity(name, 1, args, span)?;
                let ExprKind::Literal(Literal::Str(pattern)) = &args[0].kind else {
                    return Err(self.error(
                        CompileErrorKind::TypeMismatch {
                            context: "matches".to_owned(),
                            expected: "string literal".to_owned(),
                            found: args[0].to_string(),
                        },
                        args[0].span,
                    ));
                };
                let regex = Regex::new(pattern).map_err(|e| {
                    self.error(CompileErrorKind::InvalidRegex(e.to_string()), args[0].span)
                })?;
                return Ok(Typed::new(
                    CompiledExpr::Matches {
                        target: Box::new(target.expr),
                        regex,
                    },
                    Type::Bool,
                ));
            }
            _ => return Err(self.unknown_member(&Type::Str, name, span)),
        };
        let takes_argument = returns == Type::Bool;
        self.check_arity(name, usize::from(takes_argument), args, span)?;
        let mut bound_args = vec![target.expr];
        if takes_argument {
            let arg = self.bind(&args[0])?;
            self.expect(&arg, Type::Str, &format!("argument of '{name}'"), args[0].span)?;
            bound_args.push(arg.expr);
        }
        Ok(Typed::new(
            CompiledExpr::Builtin {
                func,
                args: bound_args,
            },
            returns,
        ))
    }

    fn bind_list_method(
        &mut self,
        target: Typed,
        elem: Type,
        name: &str,
        args: &'a [Expr],
        span: Span,
    ) -> Result<Typed, CompileError> {
        let quantifier = match name {
            "any" => Quantifier::Any,
            "all" => Quantifier::All,
            "count" => Quantifier::Count,
            "len" => {
                self.check_arity(name, 0, args, span)?;
                return Ok(Typed::new(
                    CompiledExpr::Builtin {
                        func: Builtin::Len,
                        args: vec![target.expr],
                    },
                    Type::Int,
                ));
            }
            "contains" => {
                self.check_arity(name, 1, args, span)?;
                let needle = self.bind(&args[0])?;
                if !elem.is_scalar() || !elem.comparable_with(&needle.ty) {
                    return Err(self.mismatch(
                        "argument of 'contains'",
                        &elem.to_string(),
                        &needle.ty,
                        args[0].span,
                    ));
                }
                return Ok(Typed::new(
                    CompiledExpr::Builtin {
                        func: Builtin::Contains,
                        args: vec![target.expr, needle.expr],
                    },
                    Type::Bool,
                ));
            }
            _ => return Err(self.unknown_member(&target.ty, name, span)),
        };
        let lambda = match args {
            [Expr {
                kind: ExprKind::Lambda { param, body },
                ..
            }] => Some((param.as_str(), body.as_ref())),
            _ => None,
        };
        let Some((param, body)) = lambda else {
            return Err(self.error(
                CompileErrorKind::ExpectedLambda {
                    name: name.to_owned(),
                },
                span,
            ));
        };
        self.params.push((param, elem));
        let bound_body = self.bind(body);
        self.params.pop();
        let bound_body = bound_body?;
        self.expect(&bound_body, Type::Bool, &format!("body of '{name}'"), body.span)?;
        let ty = if quantifier == Quantifier::Count {
            Type::Int
        } else {
            Type::Bool
        };
        Ok(Typed::new(
            CompiledExpr::Quantify {
                quantifier,
                source: Box::new(target.expr),
                body: Box::new(bound_body.expr),
            },
            ty,
        ))
    }
}

fn bind_literal(lit: &Literal) -> Typed {
    let ty = match lit {
        Literal::Bool(_) => Type::Bool,
        Literal::Int(_) => Type::Int,
        Literal::Float(_) => Type::Float,
        Literal::Str(_) => Type::Str,
    };
    Typed::new(CompiledExpr::Const(lit.clone()), ty)
}

/// Negation, folded into the constant for numeric literals.
fn negate(inner: Typed) -> Typed {
    let ty = inner.ty;
    let expr = match inner.expr {
        CompiledExpr::Const(Literal::Int(v)) if v != i64::MIN => {
            CompiledExpr::Const(Literal::Int(-v))
        }
        CompiledExpr::Const(Literal::Float(v)) => CompiledExpr::Const(Literal::Float(-v)),
        other => CompiledExpr::Neg(Box::new(other)),
    };
    Typed::new(expr, ty)
}

fn numeric_result(a: &Type, b: &Type) -> Type {
    if *a == Type::Int && *b == Type::Int {
        Type::Int
    } else {
        Type::Float
    }
}
