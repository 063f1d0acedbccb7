use winnow::combinator::{alt, cut_err, delimited, eof, fail, not, opt, preceded, repeat, separated};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::{LocatingSlice, Stateful};
use winnow::token::{any, one_of, take_while};

use crate::types::{ArithOp, CompareOp, Expr, ExprKind, Literal, Span};

pub(crate) type Input<'i> = Stateful<LocatingSlice<&'i str>, Nesting>;

/// Parenthesised groups, prefix operators, call arguments and lambda bodies
/// open at the current position.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Nesting(usize);

const MAX_NESTING: usize = 64;
/// Longest root-to-leaf path allowed in a parsed expression. Compiling and
/// evaluating both walk the tree recursively.
const MAX_HEIGHT: usize = 128;

pub(crate) fn new_input(text: &str) -> Input<'_> {
    Stateful {
        input: LocatingSlice::new(text),
        state: Nesting::default(),
    }
}

const RESERVED: &[&str] = &["and", "AND", "or", "OR", "not", "NOT", "in", "IN"];

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

fn joined(lhs: &Expr, rhs: &Expr) -> Span {
    Span {
        start: lhs.span.start,
        end: rhs.span.end,
    }
}

fn too_deep<O>(input: &mut Input<'_>, limit: &'static str) -> ModalResult<O> {
    cut_err(fail::<_, O, _>)
        .context(expected(limit))
        .parse_next(input)
}

/// Run `inner` one nesting level deeper, failing once the limit is reached.
fn nested<'i, O>(
    input: &mut Input<'i>,
    inner: impl FnOnce(&mut Input<'i>) -> ModalResult<O>,
) -> ModalResult<O> {
    if input.state.0 >= MAX_NESTING {
        return too_deep(input, "at most 64 levels of nesting");
    }
    input.state.0 += 1;
    let result = inner(input);
    input.state.0 -= 1;
    result
}

fn bounded(input: &mut Input<'_>, expr: Expr) -> ModalResult<Expr> {
    if expr.height() > MAX_HEIGHT {
        return too_deep(input, "a shallower expression (at most 128 levels)");
    }
    Ok(expr)
}

// -- Whitespace & words -----------------------------------------------------

fn ws(input: &mut Input<'_>) -> ModalResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    (
        take_while(1, is_ident_start),
        take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

/// A keyword that is not the prefix of a longer identifier.
fn keyword<'i>(word: &'static str) -> impl Parser<Input<'i>, (), ErrMode<ContextError>> {
    (word, not(one_of(is_ident_char))).void()
}

// -- Literals ---------------------------------------------------------------

fn string_literal(input: &mut Input<'_>) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(StrContext::Expected(StrContextValue::CharLiteral('"')))
            .parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = cut_err(any).parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn number(input: &mut Input<'_>) -> ModalResult<Literal> {
    let text = (
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
    )
        .take()
        .parse_next(input)?;
    if text.contains('.') {
        text.parse::<f64>()
            .map(Literal::Float)
            .map_err(|_| ErrMode::from_input(input).cut())
    } else {
        text.parse::<i64>()
            .map(Literal::Int)
            .map_err(|_| ErrMode::from_input(input).cut())
    }
}

// -- Operators --------------------------------------------------------------

fn compare_op(input: &mut Input<'_>) -> ModalResult<CompareOp> {
    alt((
        ">=".value(CompareOp::Gte),
        ">".value(CompareOp::Gt),
        "<=".value(CompareOp::Lte),
        "<".value(CompareOp::Lt),
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Neq),
    ))
    .parse_next(input)
}

fn additive_op(input: &mut Input<'_>) -> ModalResult<ArithOp> {
    alt(('+'.value(ArithOp::Add), '-'.value(ArithOp::Sub))).parse_next(input)
}

fn multiplicative_op(input: &mut Input<'_>) -> ModalResult<ArithOp> {
    alt((
        '*'.value(ArithOp::Mul),
        '/'.value(ArithOp::Div),
        '%'.value(ArithOp::Rem),
    ))
    .parse_next(input)
}

// -- Primaries & postfix chains ---------------------------------------------

fn lambda(input: &mut Input<'_>) -> ModalResult<Expr> {
    let ((param, body), span) = (
        preceded(ws, ident),
        preceded((ws, "=>"), cut_err(expr).context(expected("lambda body"))),
    )
        .with_span()
        .parse_next(input)?;
    Ok(Expr::new(
        ExprKind::Lambda {
            param: param.to_owned(),
            body: Box::new(body),
        },
        span,
    ))
}

fn call_args(input: &mut Input<'_>) -> ModalResult<Vec<Expr>> {
    '('.parse_next(input)?;
    ws.parse_next(input)?;
    if opt(')').parse_next(input)?.is_some() {
        return Ok(Vec::new());
    }
    let args: Vec<Expr> = cut_err(alt((
        lambda.map(|l| vec![l]),
        separated(1.., expr, (ws, ',')),
    )))
    .context(expected("arguments"))
    .parse_next(input)?;
    (ws, cut_err(')').context(StrContext::Expected(StrContextValue::CharLiteral(')'))))
        .parse_next(input)?;
    Ok(args)
}

fn name_or_call(input: &mut Input<'_>) -> ModalResult<Expr> {
    let checkpoint = input.checkpoint();
    let (name, span) = ident.with_span().parse_next(input)?;
    match name {
        "true" => return Ok(Expr::new(ExprKind::Literal(Literal::Bool(true)), span)),
        "false" => return Ok(Expr::new(ExprKind::Literal(Literal::Bool(false)), span)),
        _ if RESERVED.contains(&name) => {
            input.reset(&checkpoint);
            return Err(ErrMode::from_input(input));
        }
        _ => {}
    }
    match opt(preceded(ws, call_args).with_span()).parse_next(input)? {
        Some((args, args_span)) => Ok(Expr::new(
            ExprKind::Call {
                target: None,
                name: name.to_owned(),
                args,
            },
            span.start..args_span.end,
        )),
        None => Ok(Expr::new(ExprKind::Ident(name.to_owned()), span)),
    }
}

fn primary(input: &mut Input<'_>) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    alt((
        delimited(
            '(',
            expr,
            (
                ws,
                cut_err(')').context(StrContext::Expected(StrContextValue::CharLiteral(')'))),
            ),
        ),
        string_literal
            .with_span()
            .map(|(s, span)| Expr::new(ExprKind::Literal(Literal::Str(s)), span)),
        number
            .with_span()
            .map(|(lit, span)| Expr::new(ExprKind::Literal(lit), span)),
        name_or_call,
    ))
    .context(expected("expression"))
    .parse_next(input)
}

fn postfix(input: &mut Input<'_>) -> ModalResult<Expr> {
    let mut node = primary(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws.parse_next(input)?;
        if opt('.').parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            return Ok(node);
        }
        ws.parse_next(input)?;
        let ((name, args), span) = (
            cut_err(ident).context(expected("member name")),
            opt(preceded(ws, call_args)),
        )
            .with_span()
            .parse_next(input)?;
        let span = Span {
            start: node.span.start,
            end: span.end,
        };
        let kind = match args {
            Some(args) => ExprKind::Call {
                target: Some(Box::new(node)),
                name: name.to_owned(),
                args,
            },
            None => ExprKind::Member {
                target: Box::new(node),
                name: name.to_owned(),
            },
        };
        node = bounded(input, Expr::new(kind, span))?;
    }
}

// -- Expressions (precedence: OR < AND < NOT < compare < sum < product) -----

fn negate(input: &mut Input<'_>) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    let minus = preceded('-', cut_err(|i: &mut Input<'_>| nested(i, negate)));
    if let Some((inner, span)) = opt(minus.with_span()).parse_next(input)? {
        return Ok(Expr::new(ExprKind::Neg(Box::new(inner)), span));
    }
    postfix(input)
}

fn fold_arith(
    input: &mut Input<'_>,
    first: Expr,
    rest: Vec<(ArithOp, Expr)>,
) -> ModalResult<Expr> {
    let mut lhs = first;
    for (op, rhs) in rest {
        let span = joined(&lhs, &rhs);
        let node = Expr::new(
            ExprKind::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
        lhs = bounded(input, node)?;
    }
    Ok(lhs)
}

fn product(input: &mut Input<'_>) -> ModalResult<Expr> {
    let first = negate(input)?;
    let rest: Vec<(ArithOp, Expr)> =
        repeat(0.., (preceded(ws, multiplicative_op), cut_err(negate))).parse_next(input)?;
    fold_arith(input, first, rest)
}

fn sum(input: &mut Input<'_>) -> ModalResult<Expr> {
    let first = product(input)?;
    let rest: Vec<(ArithOp, Expr)> =
        repeat(0.., (preceded(ws, additive_op), cut_err(product))).parse_next(input)?;
    fold_arith(input, first, rest)
}

fn comparison(input: &mut Input<'_>) -> ModalResult<Expr> {
    let lhs = sum(input)?;
    let checkpoint = input.checkpoint();
    ws.parse_next(input)?;
    if let Some(op) = opt(compare_op).parse_next(input)? {
        let rhs = cut_err(sum).context(expected("value")).parse_next(input)?;
        let span = joined(&lhs, &rhs);
        return Ok(Expr::new(
            ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        ));
    }
    if opt(alt((keyword("in"), keyword("IN"))))
        .parse_next(input)?
        .is_some()
    {
        let (set, set_span): (Vec<Expr>, _) = cut_err(delimited(
            (ws, '['),
            separated(1.., expr, (ws, ',')),
            (ws, ']'),
        ))
        .context(expected("list like [a, b]"))
        .with_span()
        .parse_next(input)?;
        let span = Span {
            start: lhs.span.start,
            end: set_span.end,
        };
        return Ok(Expr::new(
            ExprKind::In {
                needle: Box::new(lhs),
                set,
            },
            span,
        ));
    }
    input.reset(&checkpoint);
    Ok(lhs)
}

fn unary(input: &mut Input<'_>) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    let negation = preceded(
        alt(('!'.void(), keyword("not"), keyword("NOT"))),
        cut_err(|i: &mut Input<'_>| nested(i, unary)),
    );
    if let Some((inner, span)) = opt(negation.with_span()).parse_next(input)? {
        return Ok(Expr::new(ExprKind::Not(Box::new(inner)), span));
    }
    comparison(input)
}

/// Chains of `and` / `or` become one flat node rather than a nested tree.
fn connective(first: Expr, rest: Vec<Expr>, kind: fn(Vec<Expr>) -> ExprKind) -> Expr {
    let Some(last) = rest.last() else {
        return first;
    };
    let span = joined(&first, last);
    let mut operands = Vec::with_capacity(rest.len() + 1);
    operands.push(first);
    operands.extend(rest);
    Expr::new(kind(operands), span)
}

fn and_expr(input: &mut Input<'_>) -> ModalResult<Expr> {
    let first = unary(input)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded(
            (ws, alt(("&&".void(), keyword("and"), keyword("AND")))),
            cut_err(unary),
        ),
    )
    .parse_next(input)?;
    Ok(connective(first, rest, ExprKind::And))
}

fn or_expr(input: &mut Input<'_>) -> ModalResult<Expr> {
    let first = and_expr(input)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded(
            (ws, alt(("||".void(), keyword("or"), keyword("OR")))),
            cut_err(and_expr),
        ),
    )
    .parse_next(input)?;
    Ok(connective(first, rest, ExprKind::Or))
}

/// Every parenthesised group, call argument and `in` element re-enters
/// here, so this is where nesting is counted.
fn expr(input: &mut Input<'_>) -> ModalResult<Expr> {
    nested(input, |input| {
        ws.parse_next(input)?;
        let parsed = or_expr(input)?;
        bounded(input, parsed)
    })
}

// -- Top-level parser -------------------------------------------------------

pub(crate) fn rule_expr(input: &mut Input<'_>) -> ModalResult<Expr> {
    let parsed = expr(input)?;
    ws.parse_next(input)?;
    cut_err(eof)
        .context(expected("operator or end of rule"))
        .parse_next(input)?;
    Ok(parsed)
}
