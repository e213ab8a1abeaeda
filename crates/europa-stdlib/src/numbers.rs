use europa_value::object::NativeContext;
use europa_value::{ErrorObj, Value};

use crate::helpers::{arity_error, bad_argument, define_native};

#[derive(Clone, Copy)]
enum Num {
    Fixnum(i64),
    Real(f64),
}

impl Num {
    fn to_f64(self) -> f64 {
        match self {
            Num::Fixnum(n) => n as f64,
            Num::Real(r) => r,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Num::Fixnum(n) => Value::Fixnum(n),
            Num::Real(r) => Value::Real(r),
        }
    }
}

fn as_num(v: Value, name: &str) -> Result<Num, ErrorObj> {
    match v {
        Value::Fixnum(n) => Ok(Num::Fixnum(n)),
        Value::Real(r) => Ok(Num::Real(r)),
        _ => Err(bad_argument(format!("{name}: not a number"))),
    }
}

fn add_pair(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Fixnum(x), Num::Fixnum(y)) => Num::Fixnum(x.wrapping_add(y)),
        _ => Num::Real(a.to_f64() + b.to_f64()),
    }
}

fn sub_pair(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Fixnum(x), Num::Fixnum(y)) => Num::Fixnum(x.wrapping_sub(y)),
        _ => Num::Real(a.to_f64() - b.to_f64()),
    }
}

fn mul_pair(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Fixnum(x), Num::Fixnum(y)) => Num::Fixnum(x.wrapping_mul(y)),
        _ => Num::Real(a.to_f64() * b.to_f64()),
    }
}

fn div_pair(a: Num, b: Num, name: &str) -> Result<Num, ErrorObj> {
    match (a, b) {
        (Num::Fixnum(_), Num::Fixnum(0)) => Err(bad_argument(format!("{name}: division by zero"))),
        (Num::Fixnum(x), Num::Fixnum(y)) if x % y == 0 => Ok(Num::Fixnum(x / y)),
        _ => {
            if b.to_f64() == 0.0 {
                Err(bad_argument(format!("{name}: division by zero")))
            } else {
                Ok(Num::Real(a.to_f64() / b.to_f64()))
            }
        }
    }
}

fn nums(args: &[Value], name: &str) -> Result<Vec<Num>, ErrorObj> {
    args.iter().map(|v| as_num(*v, name)).collect()
}

fn add(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let ns = nums(args, "+")?;
    Ok(ns.into_iter().fold(Num::Fixnum(0), add_pair).to_value())
}

fn sub(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let ns = nums(args, "-")?;
    match ns.split_first() {
        None => Err(arity_error("-", "at least 1", 0)),
        Some((&first, [])) => Ok(sub_pair(Num::Fixnum(0), first).to_value()),
        Some((&first, rest)) => Ok(rest.iter().fold(first, |acc, &n| sub_pair(acc, n)).to_value()),
    }
}

fn mul(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let ns = nums(args, "*")?;
    Ok(ns.into_iter().fold(Num::Fixnum(1), mul_pair).to_value())
}

fn div(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let ns = nums(args, "/")?;
    match ns.split_first() {
        None => Err(arity_error("/", "at least 1", 0)),
        Some((&first, [])) => div_pair(Num::Fixnum(1), first, "/").map(Num::to_value),
        Some((&first, rest)) => {
            let mut acc = first;
            for &n in rest {
                acc = div_pair(acc, n, "/")?;
            }
            Ok(acc.to_value())
        }
    }
}

fn compare(args: &[Value], name: &str, ok: impl Fn(f64, f64) -> bool) -> Result<Value, ErrorObj> {
    let ns = nums(args, name)?;
    for pair in ns.windows(2) {
        if !ok(pair[0].to_f64(), pair[1].to_f64()) {
            return Ok(Value::FALSE);
        }
    }
    Ok(Value::TRUE)
}

fn num_eq(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    compare(args, "=", |a, b| a == b)
}

fn num_lt(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    compare(args, "<", |a, b| a < b)
}

fn num_gt(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    compare(args, ">", |a, b| a > b)
}

fn num_le(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    compare(args, "<=", |a, b| a <= b)
}

fn num_ge(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    compare(args, ">=", |a, b| a >= b)
}

fn zero_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(as_num(*v, "zero?")?.to_f64() == 0.0)),
        _ => Err(arity_error("zero?", "1", args.len())),
    }
}

fn number_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(matches!(v, Value::Fixnum(_) | Value::Real(_)))),
        _ => Err(arity_error("number?", "1", args.len())),
    }
}

fn abs(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(match as_num(*v, "abs")? {
            Num::Fixnum(n) => Value::Fixnum(n.abs()),
            Num::Real(r) => Value::Real(r.abs()),
        }),
        _ => Err(arity_error("abs", "1", args.len())),
    }
}

/// `complex?` and `real?` are just `number?` under another name: this
/// number tower has no representation that is one but not the other.
fn complex_p(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    number_p(ctx, args)
}

/// No rational type exists either; every number here is as rational as
/// `number?` already says.
fn rational_p(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    number_p(ctx, args)
}

fn integer_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [Value::Fixnum(_)] => Ok(Value::TRUE),
        [Value::Real(r)] => Ok(Value::Boolean(r.fract() == 0.0)),
        [_] => Ok(Value::FALSE),
        _ => Err(arity_error("integer?", "1", args.len())),
    }
}

/// `exact?` and `exact-integer?` coincide: the only exact numbers this
/// tower has are fixnums, which are already integers.
fn exact_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(matches!(v, Value::Fixnum(_)))),
        _ => Err(arity_error("exact?", "1", args.len())),
    }
}

fn inexact_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(matches!(v, Value::Real(_)))),
        _ => Err(arity_error("inexact?", "1", args.len())),
    }
}

fn positive_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(as_num(*v, "positive?")?.to_f64() > 0.0)),
        _ => Err(arity_error("positive?", "1", args.len())),
    }
}

fn negative_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(as_num(*v, "negative?")?.to_f64() < 0.0)),
        _ => Err(arity_error("negative?", "1", args.len())),
    }
}

/// `None` for a non-integral real, mirroring the original's treatment of
/// `odd?`/`even?` on such a value as neither.
fn integer_parity(v: Value, name: &str) -> Result<Option<i64>, ErrorObj> {
    match as_num(v, name)? {
        Num::Fixnum(n) => Ok(Some(n)),
        Num::Real(r) if r.fract() == 0.0 => Ok(Some(r as i64)),
        Num::Real(_) => Ok(None),
    }
}

fn odd_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(
            integer_parity(*v, "odd?")?.is_some_and(|n| n % 2 != 0),
        )),
        _ => Err(arity_error("odd?", "1", args.len())),
    }
}

fn even_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(
            integer_parity(*v, "even?")?.is_some_and(|n| n % 2 == 0),
        )),
        _ => Err(arity_error("even?", "1", args.len())),
    }
}

fn min(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let ns = nums(args, "min")?;
    match ns.split_first() {
        None => Err(arity_error("min", "at least 1", 0)),
        Some((&first, rest)) => Ok(rest
            .iter()
            .fold(first, |acc, &n| if n.to_f64() < acc.to_f64() { n } else { acc })
            .to_value()),
    }
}

fn max(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let ns = nums(args, "max")?;
    match ns.split_first() {
        None => Err(arity_error("max", "at least 1", 0)),
        Some((&first, rest)) => Ok(rest
            .iter()
            .fold(first, |acc, &n| if n.to_f64() > acc.to_f64() { n } else { acc })
            .to_value()),
    }
}

pub fn register(
    heap: &mut europa_value::object::Heap,
    symbols: &mut europa_value::SymbolTable,
    env: &mut europa_value::Environment,
) {
    define_native(heap, symbols, env, "+", add);
    define_native(heap, symbols, env, "-", sub);
    define_native(heap, symbols, env, "*", mul);
    define_native(heap, symbols, env, "/", div);
    define_native(heap, symbols, env, "=", num_eq);
    define_native(heap, symbols, env, "<", num_lt);
    define_native(heap, symbols, env, ">", num_gt);
    define_native(heap, symbols, env, "<=", num_le);
    define_native(heap, symbols, env, ">=", num_ge);
    define_native(heap, symbols, env, "zero?", zero_p);
    define_native(heap, symbols, env, "number?", number_p);
    define_native(heap, symbols, env, "abs", abs);
    define_native(heap, symbols, env, "complex?", complex_p);
    define_native(heap, symbols, env, "real?", complex_p);
    define_native(heap, symbols, env, "rational?", rational_p);
    define_native(heap, symbols, env, "integer?", integer_p);
    define_native(heap, symbols, env, "exact-integer?", exact_p);
    define_native(heap, symbols, env, "exact?", exact_p);
    define_native(heap, symbols, env, "inexact?", inexact_p);
    define_native(heap, symbols, env, "positive?", positive_p);
    define_native(heap, symbols, env, "negative?", negative_p);
    define_native(heap, symbols, env, "odd?", odd_p);
    define_native(heap, symbols, env, "even?", even_p);
    define_native(heap, symbols, env, "min", min);
    define_native(heap, symbols, env, "max", max);
}
