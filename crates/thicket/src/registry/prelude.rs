//! Standard prelude with built-in functions

use super::{Arity, BuiltinFn, CallSite, FunctionRegistry};
use crate::error::type_name;
use crate::value::Value;

impl FunctionRegistry {
    /// Create a registry holding the standard builtins.
    pub fn with_prelude() -> Self {
        let registry = Self::new();
        registry.load_prelude();
        registry
    }

    /// Load the standard prelude into this registry.
    pub fn load_prelude(&self) {
        // Arithmetic
        self.register(
            BuiltinFn::new("add", Arity::AtLeast(1), builtin_add)
                .pure()
                .with_docs("number {a, [b...]} Adds all the arguments together."),
        );
        self.register(
            BuiltinFn::new("subtract", Arity::AtLeast(2), builtin_subtract)
                .pure()
                .with_docs("number {a, b, [c...]} Subtracts each following argument from the first."),
        );
        self.register(
            BuiltinFn::new("multiply", Arity::AtLeast(1), builtin_multiply)
                .pure()
                .with_docs("number {a, [b...]} Multiplies all the arguments together."),
        );
        self.register(
            BuiltinFn::new("divide", Arity::AtLeast(2), builtin_divide)
                .pure()
                .with_docs("number {a, b, [c...]} Divides the first argument by each following one."),
        );
        self.register(
            BuiltinFn::new("modulo", Arity::Exact(2), builtin_modulo)
                .pure()
                .with_docs("int {a, b} Returns the remainder of a divided by b."),
        );

        // Strings and comparison
        self.register(
            BuiltinFn::new("concat", Arity::AtLeast(0), builtin_concat)
                .pure()
                .with_docs("string {[values...]} Joins the text of every argument."),
        );
        self.register(
            BuiltinFn::new("equals", Arity::Exact(2), builtin_equals)
                .pure()
                .with_docs("boolean {a, b} Loosely compares two values; numeric strings equal their numbers."),
        );
        self.register(
            BuiltinFn::new("lt", Arity::Exact(2), |args, _| compare(args, |a, b| a < b))
                .pure()
                .with_docs("boolean {a, b} Returns whether a is less than b."),
        );
        self.register(
            BuiltinFn::new("gt", Arity::Exact(2), |args, _| compare(args, |a, b| a > b))
                .pure()
                .with_docs("boolean {a, b} Returns whether a is greater than b."),
        );
        self.register(
            BuiltinFn::new("not", Arity::Exact(1), |args, _| {
                Ok(Value::Bool(!args[0].is_truthy()))
            })
            .pure()
            .with_docs("boolean {value} Returns the opposite truthiness of value."),
        );

        // Arrays. Each `array(...)` call builds a new array, so it is never
        // folded into a literal or inlined.
        self.register(
            BuiltinFn::new("array", Arity::AtLeast(0), |args, _| {
                Ok(Value::array(args.to_vec()))
            })
            .with_docs("array {[values...]} Creates an array holding the arguments."),
        );
        self.register(
            BuiltinFn::new("array_get", Arity::Exact(2), builtin_array_get)
                .pure()
                .with_docs("mixed {array, index} Returns the element at index; negative indexes count from the end."),
        );
        self.register(
            BuiltinFn::new("array_size", Arity::Exact(1), |args, _| {
                let items = expect_array(&args[0])?;
                Ok(Value::Int(items.len() as i64))
            })
            .pure()
            .with_docs("int {array} Returns the number of elements in the array."),
        );

        // Type inspection
        self.register(
            BuiltinFn::new("typeof", Arity::Exact(1), |args, _| {
                Ok(Value::string(type_name(&args[0])))
            })
            .pure()
            .with_docs("string {value} Returns the type name of value."),
        );

        // Side effects
        self.register(
            BuiltinFn::new("msg", Arity::AtLeast(0), builtin_msg)
                .with_docs("void {[values...]} Writes the arguments to the script's output."),
        );
        self.register(
            BuiltinFn::new("dyn", Arity::Range(0, 1), |args, _| {
                Ok(args.first().cloned().unwrap_or(Value::Void))
            })
            .with_docs("mixed {[value]} Returns value unchanged; the optimizer never folds it."),
        );

        super::reflection::register(self);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Numeric Helpers
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Double(f64),
}

impl Number {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Double(n) => Ok(Number::Double(*n)),
            Value::String(s) => {
                let text = s.trim();
                if let Ok(n) = text.parse::<i64>() {
                    Ok(Number::Int(n))
                } else if let Ok(n) = text.parse::<f64>() {
                    Ok(Number::Double(n))
                } else {
                    Err(format!("Expecting a number, but received '{}' instead", s))
                }
            }
            other => Err(format!(
                "Expecting a number, but received a {} instead",
                type_name(other)
            )),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Double(n) => n,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(n) => Value::Int(n),
            Number::Double(n) => Value::Double(n),
        }
    }
}

fn overflow(op: &str) -> String {
    format!("Integer overflow in {}", op)
}

fn fold_numbers(
    args: &[Value],
    op: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    double_op: fn(f64, f64) -> f64,
) -> Result<Value, String> {
    let mut numbers = args.iter().map(Number::from_value);
    let first = match numbers.next() {
        Some(n) => n?,
        None => return Err(format!("{} needs at least one argument", op)),
    };
    let mut acc = first;
    for next in numbers {
        acc = match (acc, next?) {
            (Number::Int(a), Number::Int(b)) => {
                Number::Int(int_op(a, b).ok_or_else(|| overflow(op))?)
            }
            (a, b) => Number::Double(double_op(a.as_f64(), b.as_f64())),
        };
    }
    Ok(acc.into_value())
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Function Implementations
// ═══════════════════════════════════════════════════════════════════════

fn builtin_add(args: &[Value], _: &CallSite<'_>) -> Result<Value, String> {
    fold_numbers(args, "add", i64::checked_add, |a, b| a + b)
}

fn builtin_subtract(args: &[Value], _: &CallSite<'_>) -> Result<Value, String> {
    fold_numbers(args, "subtract", i64::checked_sub, |a, b| a - b)
}

fn builtin_multiply(args: &[Value], _: &CallSite<'_>) -> Result<Value, String> {
    fold_numbers(args, "multiply", i64::checked_mul, |a, b| a * b)
}

fn builtin_divide(args: &[Value], _: &CallSite<'_>) -> Result<Value, String> {
    let mut numbers = args.iter().map(Number::from_value);
    let mut acc = match numbers.next() {
        Some(n) => n?,
        None => return Err("divide needs at least two arguments".to_string()),
    };
    for next in numbers {
        let divisor = next?;
        if divisor.as_f64() == 0.0 {
            return Err("Division by 0!".to_string());
        }
        acc = match (acc, divisor) {
            (Number::Int(a), Number::Int(b)) => match a.checked_rem(b) {
                Some(0) => Number::Int(a.checked_div(b).ok_or_else(|| overflow("divide"))?),
                Some(_) => Number::Double(a as f64 / b as f64),
                // i64::MIN / -1
                None => return Err(overflow("divide")),
            },
            (a, b) => Number::Double(a.as_f64() / b.as_f64()),
        };
    }
    Ok(acc.into_value())
}

fn builtin_modulo(args: &[Value], _: &CallSite<'_>) -> Result<Value, String> {
    let a = Number::from_value(&args[0])?;
    let b = Number::from_value(&args[1])?;
    match (a, b) {
        (Number::Int(_), Number::Int(0)) => Err("Division by 0!".to_string()),
        (Number::Int(a), Number::Int(b)) => a
            .checked_rem(b)
            .map(Value::Int)
            .ok_or_else(|| overflow("modulo")),
        (a, b) => {
            if b.as_f64() == 0.0 {
                Err("Division by 0!".to_string())
            } else {
                Ok(Value::Double(a.as_f64() % b.as_f64()))
            }
        }
    }
}

fn builtin_concat(args: &[Value], _: &CallSite<'_>) -> Result<Value, String> {
    let text: String = args.iter().map(|v| v.to_string()).collect();
    Ok(Value::string(text))
}

fn builtin_equals(args: &[Value], _: &CallSite<'_>) -> Result<Value, String> {
    let (a, b) = (&args[0], &args[1]);
    let equal = match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
        (Value::Array(_), _) | (_, Value::Array(_)) => a == b,
        (Value::Closure(_), _)
        | (_, Value::Closure(_))
        | (Value::Resource(_), _)
        | (_, Value::Resource(_)) => a == b,
        _ => match (Number::from_value(a), Number::from_value(b)) {
            (Ok(x), Ok(y)) => x.as_f64() == y.as_f64(),
            _ => a.to_string() == b.to_string(),
        },
    };
    Ok(Value::Bool(equal))
}

fn compare(args: &[Value], cmp: fn(f64, f64) -> bool) -> Result<Value, String> {
    let a = Number::from_value(&args[0])?;
    let b = Number::from_value(&args[1])?;
    Ok(Value::Bool(cmp(a.as_f64(), b.as_f64())))
}

fn expect_array(value: &Value) -> Result<&[Value], String> {
    value.as_array().ok_or_else(|| {
        format!(
            "Expecting an array, but received a {} instead",
            type_name(value)
        )
    })
}

fn builtin_array_get(args: &[Value], _: &CallSite<'_>) -> Result<Value, String> {
    let items = expect_array(&args[0])?;
    let index = args[1]
        .as_i64()
        .ok_or_else(|| format!("Expecting an integer index, got {}", type_name(&args[1])))?;
    let len = items.len() as i64;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        Ok(items[resolved as usize].clone())
    } else {
        Err(format!(
            "The element at index {} does not exist (array has {} elements)",
            index, len
        ))
    }
}

fn builtin_msg(args: &[Value], site: &CallSite<'_>) -> Result<Value, String> {
    let env = site.env()?;
    let text: String = args.iter().map(|v| v.to_string()).collect();
    env.emit(&text);
    Ok(Value::Void)
}
