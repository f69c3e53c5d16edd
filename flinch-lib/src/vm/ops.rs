//! The binary operators. All of them take two numbers, `a` being the one that was pushed
//! first. Integers stay integers unless a real is involved.

use std::cmp::Ordering;

use crate::core::{Operator, Value};
use crate::vm::{bail, type_mismatch, Fault, Result};

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Real(f64),
}

impl Num {
    fn of(op: &'static str, v: &Value) -> Result<Num> {
        match v {
            Value::Integer(i) => Ok(Num::Int(*i)),
            Value::Real(x) => Ok(Num::Real(*x)),
            other => Err(type_mismatch(op, "a number", other)),
        }
    }

    fn real(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Real(x) => x,
        }
    }

    fn is_truthy(self) -> bool {
        match self {
            Num::Int(i) => i != 0,
            Num::Real(x) => x != 0.0,
        }
    }
}

const OVERFLOW: Fault = Fault::Arithmetic("integer overflow");

/// applies `op` to `a` and `b`
pub fn binary(op: Operator, a: &Value, b: &Value) -> Result<Value> {
    use Operator::*;
    let name = op.as_str();
    let (x, y) = (Num::of(name, a)?, Num::of(name, b)?);
    let ord = || order(x, y);
    let ints = || match (x, y) {
        (Num::Int(p), Num::Int(q)) => Ok((p, q)),
        (Num::Int(_), _) => Err(type_mismatch(name, "an integer", b)),
        _ => Err(type_mismatch(name, "an integer", a)),
    };
    match op {
        Add => arith(x, y, i64::checked_add, |p, q| p + q),
        Sub => arith(x, y, i64::checked_sub, |p, q| p - q),
        Mul => arith(x, y, i64::checked_mul, |p, q| p * q),
        Div => divide(x, y),
        Mod => modulo(x, y),
        Eq => Ok((ord() == Some(Ordering::Equal)).into()),
        Ne => Ok((ord() != Some(Ordering::Equal)).into()),
        Le => Ok(matches!(ord(), Some(Ordering::Less | Ordering::Equal)).into()),
        Ge => Ok(matches!(ord(), Some(Ordering::Greater | Ordering::Equal)).into()),
        Lt => Ok((ord() == Some(Ordering::Less)).into()),
        Gt => Ok((ord() == Some(Ordering::Greater)).into()),
        BitAnd => ints().map(|(p, q)| Value::Integer(p & q)),
        BitOr => ints().map(|(p, q)| Value::Integer(p | q)),
        BitXor => ints().map(|(p, q)| Value::Integer(p ^ q)),
        Shl => {
            let (p, q) = ints()?;
            Ok(Value::Integer(p << shift_amount(q)?))
        }
        Shr => {
            let (p, q) = ints()?;
            Ok(Value::Integer(p >> shift_amount(q)?))
        }
        And => Ok((x.is_truthy() && y.is_truthy()).into()),
        Or => Ok((x.is_truthy() || y.is_truthy()).into()),
    }
}

fn arith(
    x: Num,
    y: Num,
    int_op: fn(i64, i64) -> Option<i64>,
    real_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (x, y) {
        (Num::Int(p), Num::Int(q)) => int_op(p, q).map(Value::Integer).ok_or(OVERFLOW),
        _ => Ok(Value::Real(real_op(x.real(), y.real()))),
    }
}

/// floor division for integers, true division otherwise
fn divide(x: Num, y: Num) -> Result<Value> {
    match (x, y) {
        (Num::Int(_), Num::Int(0)) => bail!(Arithmetic("division by zero")),
        (Num::Int(p), Num::Int(q)) => {
            let quot = p.checked_div(q).ok_or(OVERFLOW)?;
            if p % q != 0 && (p < 0) != (q < 0) {
                Ok(Value::Integer(quot - 1))
            } else {
                Ok(Value::Integer(quot))
            }
        }
        _ if y.real() == 0.0 => bail!(Arithmetic("division by zero")),
        _ => Ok(Value::Real(x.real() / y.real())),
    }
}

/// the result takes the sign of the divisor
fn modulo(x: Num, y: Num) -> Result<Value> {
    match (x, y) {
        (Num::Int(_), Num::Int(0)) => bail!(Arithmetic("modulo by zero")),
        (Num::Int(p), Num::Int(q)) => {
            let rem = p.wrapping_rem(q);
            if rem != 0 && (rem < 0) != (q < 0) {
                Ok(Value::Integer(rem + q))
            } else {
                Ok(Value::Integer(rem))
            }
        }
        _ if y.real() == 0.0 => bail!(Arithmetic("modulo by zero")),
        _ => {
            let (p, q) = (x.real(), y.real());
            let rem = p % q;
            if rem != 0.0 && (rem < 0.0) != (q < 0.0) {
                Ok(Value::Real(rem + q))
            } else {
                Ok(Value::Real(rem))
            }
        }
    }
}

/// None if a NaN is involved. Integers are compared with reals exactly, not through a
/// lossy cast of the integer.
fn order(x: Num, y: Num) -> Option<Ordering> {
    match (x, y) {
        (Num::Int(p), Num::Int(q)) => Some(p.cmp(&q)),
        (Num::Int(p), Num::Real(q)) => order_int_real(p, q),
        (Num::Real(p), Num::Int(q)) => order_int_real(q, p).map(Ordering::reverse),
        (Num::Real(p), Num::Real(q)) => p.partial_cmp(&q),
    }
}

fn order_int_real(i: i64, x: f64) -> Option<Ordering> {
    // 2^63, the first real above every i64
    const LIMIT: f64 = 9223372036854775808.0;
    if x.is_nan() {
        None
    } else if x >= LIMIT {
        Some(Ordering::Less)
    } else if x < -LIMIT {
        Some(Ordering::Greater)
    } else {
        // x is now in i64 range, its integral part converts without loss
        let whole = x.trunc();
        match i.cmp(&(whole as i64)) {
            Ordering::Equal => 0.0f64.partial_cmp(&(x - whole)),
            other => Some(other),
        }
    }
}

fn shift_amount(q: i64) -> Result<u32> {
    u32::try_from(q)
        .ok()
        .filter(|s| *s < 64)
        .ok_or(Fault::Arithmetic("shift amount out of range"))
}
