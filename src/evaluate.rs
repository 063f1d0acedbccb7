use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use crate::diagnostics::{priority, Diagnostics};
use crate::types::{
    ArithOp, Builtin, CompareOp, CompiledExpr, CompiledRule, EvalError, Literal, Quantifier,
    Record, Value,
};

/// Result of running one rule against one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The rule failed to compile and was skipped.
    Inert,
    Miss,
    Match,
    /// The predicate raised an error or panicked; counted as a miss.
    Fault,
}

/// Run `rule` against `record` inside the failure boundary, reporting
/// faults and (with `debug`) matches to `sink`.
pub(crate) fn evaluate_rule(
    rule: &CompiledRule,
    record: &dyn Record,
    source: &str,
    sink: &dyn Diagnostics,
    debug: bool,
) -> Outcome {
    let Some(predicate) = rule.predicate() else {
        return Outcome::Inert;
    };
    match guarded(|| test(predicate.expr(), record)) {
        Ok(true) => {
            if debug {
                sink.log_info(
                    &format!(
                        "{source}:{} matched {}: {}",
                        rule.start_line(),
                        record.label(),
                        rule.raw_text()
                    ),
                    priority::TRACE,
                );
            }
            Outcome::Match
        }
        Ok(false) => Outcome::Miss,
        Err(err) => {
            sink.log_error(
                &format!(
                    "{source}:{} evaluation failed for {}: {err}\n  rule: {}\n  compiled from: {}",
                    rule.start_line(),
                    record.label(),
                    rule.raw_text(),
                    rule.source_text().trim_end()
                ),
                priority::FAILURE,
            );
            Outcome::Fault
        }
    }
}

/// Call `f`, turning a panic into [`EvalError::Panicked`].
pub(crate) fn guarded<F>(f: F) -> Result<bool, EvalError>
where
    F: FnOnce() -> Result<bool, EvalError>,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(EvalError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Evaluate a compiled boolean expression against `record`.
pub(crate) fn test(expr: &CompiledExpr, record: &dyn Record) -> Result<bool, EvalError> {
    let mut frame = Frame {
        root: record,
        params: Vec::new(),
    };
    expect_bool(eval(expr, &mut frame)?)
}

struct Frame<'r> {
    root: &'r dyn Record,
    /// Values bound to enclosing lambda parameters, outermost first.
    params: Vec<Value<'r>>,
}

fn eval<'r>(expr: &'r CompiledExpr, frame: &mut Frame<'r>) -> Result<Value<'r>, EvalError> {
    match expr {
        CompiledExpr::Const(lit) => Ok(match lit {
            Literal::Bool(v) => Value::Bool(*v),
            Literal::Int(v) => Value::Int(*v),
            Literal::Float(v) => Value::Float(*v),
            Literal::Str(v) => Value::Str(Cow::Borrowed(v.as_str())),
        }),
        CompiledExpr::Root => Ok(Value::Object(frame.root)),
        CompiledExpr::Param(slot) => frame
            .params
            .get(*slot)
            .cloned()
            .ok_or_else(|| EvalError::Record(format!("unbound lambda parameter {slot}"))),
        CompiledExpr::Get {
            target,
            member,
            args,
        } => {
            let object = match eval(target, frame)? {
                Value::Object(object) => object,
                other => return Err(unexpected("object", &other)),
            };
            let args = args
                .iter()
                .map(|a| eval(a, frame))
                .collect::<Result<Vec<_>, _>>()?;
            object.get(*member, &args)
        }
        CompiledExpr::Not(inner) => Ok(Value::Bool(!expect_bool(eval(inner, frame)?)?)),
        CompiledExpr::Neg(inner) => match eval(inner, frame)? {
            Value::Int(v) => v.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
            Value::Float(v) => Ok(Value::Float(-v)),
            other => Err(unexpected("number", &other)),
        },
        CompiledExpr::And(operands) => {
            for operand in operands {
                if !expect_bool(eval(operand, frame)?)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        CompiledExpr::Or(operands) => {
            for operand in operands {
                if expect_bool(eval(operand, frame)?)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        CompiledExpr::Compare { op, lhs, rhs } => {
            let l = eval(lhs, frame)?;
            let r = eval(rhs, frame)?;
            Ok(Value::Bool(compare(*op, &l, &r)?))
        }
        CompiledExpr::Arith { op, lhs, rhs } => {
            let l = eval(lhs, frame)?;
            let r = eval(rhs, frame)?;
            arith(*op, &l, &r)
        }
        CompiledExpr::In { needle, set } => {
            let needle = eval(needle, frame)?;
            for candidate in set {
                let candidate = eval(candidate, frame)?;
                if compare(CompareOp::Eq, &needle, &candidate)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        CompiledExpr::Quantify {
            quantifier,
            source,
            body,
        } => quantify(*quantifier, source, body, frame),
        CompiledExpr::Has(inner) => match eval(inner, frame) {
            Ok(_) => Ok(Value::Bool(true)),
            Err(EvalError::Absent { .. }) => Ok(Value::Bool(false)),
            Err(err) => Err(err),
        },
        CompiledExpr::Builtin { func, args } => {
            let args = args
                .iter()
                .map(|a| eval(a, frame))
                .collect::<Result<Vec<_>, _>>()?;
            builtin(*func, args)
        }
        CompiledExpr::Matches { target, regex } => match eval(target, frame)? {
            Value::Str(s) => Ok(Value::Bool(regex.is_match(&s))),
            other => Err(unexpected("string", &other)),
        },
    }
}

fn quantify<'r>(
    quantifier: Quantifier,
    source: &'r CompiledExpr,
    body: &'r CompiledExpr,
    frame: &mut Frame<'r>,
) -> Result<Value<'r>, EvalError> {
    let items = match eval(source, frame)? {
        Value::List(items) => items,
        other => return Err(unexpected("list", &other)),
    };
    let mut count = 0_i64;
    for item in items {
        frame.params.push(item);
        let result = eval(body, frame);
        frame.params.pop();
        let hit = expect_bool(result?)?;
        match quantifier {
            Quantifier::Any if hit => return Ok(Value::Bool(true)),
            Quantifier::All if !hit => return Ok(Value::Bool(false)),
            Quantifier::Count if hit => count += 1,
            _ => {}
        }
    }
    Ok(match quantifier {
        Quantifier::Any => Value::Bool(false),
        Quantifier::All => Value::Bool(true),
        Quantifier::Count => Value::Int(count),
    })
}

/// Comparison of two values whose types were checked at compile time.
/// Unordered floats (NaN) compare false.
fn compare(op: CompareOp, lhs: &Value<'_>, rhs: &Value<'_>) -> Result<bool, EvalError> {
    match (lhs, rhs) {
        (Value::Object(_) | Value::List(_), _) => Err(unexpected("scalar", lhs)),
        (_, Value::Object(_) | Value::List(_)) => Err(unexpected("scalar", rhs)),
        _ => Ok(lhs.compare(op, rhs).unwrap_or(false)),
    }
}

fn arith<'r>(op: ArithOp, lhs: &Value<'_>, rhs: &Value<'_>) -> Result<Value<'r>, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let (a, b) = (*a, *b);
        let result = match op {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div | ArithOp::Rem if b == 0 => return Err(EvalError::DivisionByZero),
            ArithOp::Div => a.checked_div(b),
            ArithOp::Rem => a.checked_rem(b),
        };
        return result.map(Value::Int).ok_or(EvalError::Overflow);
    }
    let a = lhs.as_f64().ok_or_else(|| unexpected("number", lhs))?;
    let b = rhs.as_f64().ok_or_else(|| unexpected("number", rhs))?;
    Ok(Value::Float(match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
    }))
}

fn builtin<'r>(func: Builtin, args: Vec<Value<'r>>) -> Result<Value<'r>, EvalError> {
    let mut args = args.into_iter();
    let first = args
        .next()
        .ok_or_else(|| EvalError::Record("builtin called without arguments".to_owned()))?;
    let mut second = || {
        args.next()
            .ok_or_else(|| EvalError::Record("missing argument".to_owned()))
    };

    match func {
        Builtin::Len => match &first {
            Value::Str(s) => Ok(Value::Int(to_int(s.chars().count()))),
            Value::List(items) => Ok(Value::Int(to_int(items.len()))),
            other => Err(unexpected("string or list", other)),
        },
        Builtin::Lower => Ok(Value::Str(Cow::Owned(expect_str(&first)?.to_lowercase()))),
        Builtin::Upper => Ok(Value::Str(Cow::Owned(expect_str(&first)?.to_uppercase()))),
        Builtin::Contains => {
            let needle = second()?;
            match &first {
                Value::Str(s) => Ok(Value::Bool(s.contains(expect_str(&needle)?))),
                Value::List(items) => {
                    for item in items {
                        if compare(CompareOp::Eq, item, &needle)? {
                            return Ok(Value::Bool(true));
                        }
                    }
                    Ok(Value::Bool(false))
                }
                other => Err(unexpected("string or list", other)),
            }
        }
        Builtin::StartsWith => {
            let prefix = second()?;
            Ok(Value::Bool(expect_str(&first)?.starts_with(expect_str(&prefix)?)))
        }
        Builtin::EndsWith => {
            let suffix = second()?;
            Ok(Value::Bool(expect_str(&first)?.ends_with(expect_str(&suffix)?)))
        }
        Builtin::Abs => match first {
            Value::Int(v) => v.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
            Value::Float(v) => Ok(Value::Float(v.abs())),
            other => Err(unexpected("number", &other)),
        },
        Builtin::Min | Builtin::Max => {
            let other = second()?;
            let pick_min = func == Builtin::Min;
            if let (Value::Int(a), Value::Int(b)) = (&first, &other) {
                return Ok(Value::Int(if pick_min { *a.min(b) } else { *a.max(b) }));
            }
            let a = first.as_f64().ok_or_else(|| unexpected("number", &first))?;
            let b = other.as_f64().ok_or_else(|| unexpected("number", &other))?;
            Ok(Value::Float(if pick_min { a.min(b) } else { a.max(b) }))
        }
    }
}

fn to_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn expect_bool(value: Value<'_>) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(unexpected("bool", &other)),
    }
}

fn expect_str<'v>(value: &'v Value<'_>) -> Result<&'v str, EvalError> {
    value.as_str().ok_or_else(|| unexpected("string", value))
}

fn unexpected(expected: &'static str, found: &Value<'_>) -> EvalError {
    EvalError::UnexpectedValue {
        expected,
        found: found.kind(),
    }
}
