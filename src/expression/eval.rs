use crate::expression::ast::{BinaryOp, Expr, Lit, UnaryOp};
use crate::expression::error::ExprError;
use crate::expression::parser::parse_expr;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// A parsed boolean expression over scene state.
///
/// Only state lookups and a handful of pure functions (`abs`, `min`, `max`, `len`) are available;
/// there is no access to engine internals.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Condition {
    src: String,
    expr: Expr,
}

impl Condition {
    pub(crate) fn parse(src: &str) -> Result<Self, ExprError> {
        let expr = parse_expr(src).map_err(|e| e.in_condition(src))?;
        Ok(Self {
            src: src.to_owned(),
            expr,
        })
    }

    pub(crate) fn source(&self) -> &str {
        &self.src
    }

    pub(crate) fn evaluate(&self, state: &Map<String, Value>) -> Result<bool, ExprError> {
        let v = eval(&self.expr, state).map_err(|e| e.in_condition(&self.src))?;
        Ok(truthy(&v))
    }
}

pub(crate) fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub(crate) fn eval(expr: &Expr, state: &Map<String, Value>) -> Result<Value, ExprError> {
    match expr {
        Expr::Lit(Lit::F64(v)) => number(*v),
        Expr::Lit(Lit::Bool(b)) => Ok(Value::Bool(*b)),
        Expr::Lit(Lit::Str(s)) => Ok(Value::String(s.clone())),
        Expr::Lit(Lit::Null) => Ok(Value::Null),
        Expr::Path(path) => Ok(lookup(state, path)),
        Expr::Unary { op, expr } => {
            let v = eval(expr, state)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&v))),
                UnaryOp::Neg => number(-as_f64(&v, "-")?),
            }
        }
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            let l = eval(left, state)?;
            if !truthy(&l) {
                return Ok(l);
            }
            eval(right, state)
        }
        Expr::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => {
            let l = eval(left, state)?;
            if truthy(&l) {
                return Ok(l);
            }
            eval(right, state)
        }
        Expr::Binary { op, left, right } => {
            let l = eval(left, state)?;
            let r = eval(right, state)?;
            binary(*op, &l, &r)
        }
        Expr::Call { func, args } => {
            let args = args
                .iter()
                .map(|a| eval(a, state))
                .collect::<Result<Vec<_>, _>>()?;
            call(func, &args)
        }
    }
}

fn lookup(state: &Map<String, Value>, path: &[String]) -> Value {
    let Some((first, rest)) = path.split_first() else {
        return Value::Null;
    };
    let mut cur = match state.get(first) {
        Some(v) => v,
        None => return Value::Null,
    };
    for seg in rest {
        let next = match cur {
            Value::Object(o) => o.get(seg),
            Value::Array(a) => seg.parse::<usize>().ok().and_then(|i| a.get(i)),
            _ => None,
        };
        match next {
            Some(v) => cur = v,
            None => return Value::Null,
        }
    }
    cur.clone()
}

fn number(v: f64) -> Result<Value, ExprError> {
    Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| ExprError::new(0, format!("non-finite numeric result {v}")))
}

fn as_f64(v: &Value, op: &str) -> Result<f64, ExprError> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ExprError::new(0, "number out of range")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(ExprError::new(
            0,
            format!("operator '{op}' expects numbers, got {}", type_name(other)),
        )),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => l == r,
    }
}

fn compare(l: &Value, r: &Value) -> Result<Ordering, ExprError> {
    match (l, r) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Number(_) | Value::Bool(_), Value::Number(_) | Value::Bool(_)) => {
            let (a, b) = (as_f64(l, "<")?, as_f64(r, "<")?);
            a.partial_cmp(&b)
                .ok_or_else(|| ExprError::new(0, "cannot order NaN"))
        }
        _ => Err(ExprError::new(
            0,
            format!("cannot compare {} with {}", type_name(l), type_name(r)),
        )),
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ExprError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(l, r))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(l, r))),
        BinaryOp::Lt => Ok(Value::Bool(compare(l, r)? == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(compare(l, r)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare(l, r)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(compare(l, r)? != Ordering::Less)),
        BinaryOp::Add => match (l, r) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => number(as_f64(l, "+")? + as_f64(r, "+")?),
        },
        BinaryOp::Sub => number(as_f64(l, "-")? - as_f64(r, "-")?),
        BinaryOp::Mul => number(as_f64(l, "*")? * as_f64(r, "*")?),
        BinaryOp::Div => {
            let d = as_f64(r, "/")?;
            if d == 0.0 {
                return Err(ExprError::new(0, "division by zero"));
            }
            number(as_f64(l, "/")? / d)
        }
        BinaryOp::Mod => {
            let d = as_f64(r, "%")?;
            if d == 0.0 {
                return Err(ExprError::new(0, "modulo by zero"));
            }
            number(as_f64(l, "%")? % d)
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators are handled in eval"),
    }
}

fn call(func: &str, args: &[Value]) -> Result<Value, ExprError> {
    match (func, args) {
        ("abs", [v]) => number(as_f64(v, "abs")?.abs()),
        ("min", [a, b]) => number(as_f64(a, "min")?.min(as_f64(b, "min")?)),
        ("max", [a, b]) => number(as_f64(a, "max")?.max(as_f64(b, "max")?)),
        ("len", [Value::String(s)]) => number(s.chars().count() as f64),
        ("len", [Value::Array(a)]) => number(a.len() as f64),
        ("len", [Value::Object(o)]) => number(o.len() as f64),
        ("len", [Value::Null]) => number(0.0),
        _ => Err(ExprError::new(
            0,
            format!("unknown function {func}/{}", args.len()),
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/eval.rs"]
mod tests;
