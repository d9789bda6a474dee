//! Built-in methods and globals available to expressions.
//!
//! The set is closed: anything not matched here is an
//! [`EvalError::UnknownMethod`].

use std::cmp::Ordering;

use formwork_core::{format_number, EvalError, Value};
use serde::Serialize;

use crate::interpreter::{
    check_length, strict_equals, Arg, Function, Interpreter, MAX_STRING_LENGTH,
};

/// Global objects whose members can be called (`Math.max(…)`).
pub(crate) fn is_namespace(name: &str) -> bool {
    matches!(name, "Object" | "JSON" | "Math" | "Array")
}

/// Global functions callable directly (`String(…)`).
pub(crate) fn is_global_function(name: &str) -> bool {
    matches!(name, "String" | "Number" | "Boolean")
}

/// Positional call arguments with the name of the callee, for errors.
struct Args<'e> {
    callee: String,
    items: Vec<Arg<'e>>,
}

impl<'e> Args<'e> {
    fn new(callee: String, items: Vec<Arg<'e>>) -> Self {
        Self { callee, items }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn invalid(&self, reason: impl Into<String>) -> EvalError {
        EvalError::InvalidArgument {
            function: self.callee.clone(),
            reason: reason.into(),
        }
    }

    /// Argument `i` as a value; missing arguments are `undefined`.
    fn value(&self, i: usize) -> Result<Value, EvalError> {
        match self.items.get(i) {
            None => Ok(Value::Undefined),
            Some(Arg::Value(value)) => Ok(value.clone()),
            Some(Arg::Function(_)) => Err(self.invalid(format!("argument {} must not be a function", i + 1))),
        }
    }

    fn values(&self) -> Result<Vec<Value>, EvalError> {
        (0..self.len()).map(|i| self.value(i)).collect()
    }

    fn function(&self, i: usize) -> Result<Function<'e>, EvalError> {
        match self.items.get(i) {
            Some(Arg::Function(function)) => Ok(*function),
            _ => Err(self.invalid(format!("argument {} must be an arrow function", i + 1))),
        }
    }

    fn string(&self, i: usize) -> Result<String, EvalError> {
        Ok(self.value(i)?.to_display_string())
    }

    /// Integer argument (`ToIntegerOrInfinity`), or `default` when missing.
    fn integer(&self, i: usize, default: f64) -> Result<f64, EvalError> {
        let value = self.value(i)?;
        if matches!(value, Value::Undefined) {
            return Ok(default);
        }
        let n = value.to_number();
        Ok(if n.is_nan() { 0.0 } else { n.trunc() })
    }
}

/// Call `namespace.name(args)`.
pub(crate) fn call_global(namespace: &str, name: &str, args: Vec<Arg<'_>>) -> Result<Value, EvalError> {
    let args = Args::new(format!("{}.{}", namespace, name), args);

    match (namespace, name) {
        ("Object", "keys" | "values" | "entries") => {
            let target = args.value(0)?;
            let entries = own_entries(&target).ok_or_else(|| {
                args.invalid("Cannot convert undefined or null to object")
            })?;
            Ok(Value::Array(
                entries
                    .into_iter()
                    .map(|(key, value)| match name {
                        "keys" => Value::String(key),
                        "values" => value,
                        _ => Value::Array(vec![Value::String(key), value]),
                    })
                    .collect(),
            ))
        }

        ("JSON", "stringify") => json_stringify(&args),
        ("JSON", "parse") => {
            let text = args.string(0)?;
            serde_json::from_str::<serde_json::Value>(&text)
                .map(Value::from)
                .map_err(|e| args.invalid(e.to_string()))
        }

        ("Math", "min" | "max") => {
            let numbers = args
                .values()?
                .iter()
                .map(Value::to_number)
                .collect::<Vec<_>>();
            if numbers.iter().any(|n| n.is_nan()) {
                return Ok(Value::Number(f64::NAN));
            }
            Ok(Value::Number(if name == "min" {
                numbers.into_iter().fold(f64::INFINITY, f64::min)
            } else {
                numbers.into_iter().fold(f64::NEG_INFINITY, f64::max)
            }))
        }
        ("Math", "round" | "floor" | "ceil" | "abs") => {
            let n = args.value(0)?.to_number();
            Ok(Value::Number(match name {
                "round" => (n + 0.5).floor(),
                "floor" => n.floor(),
                "ceil" => n.ceil(),
                _ => n.abs(),
            }))
        }

        ("Array", "isArray") => Ok(Value::Bool(matches!(args.value(0)?, Value::Array(_)))),

        _ => Err(EvalError::UnknownMethod {
            type_name: namespace.to_string(),
            method: name.to_string(),
        }),
    }
}

/// Call `String(x)`, `Number(x)` or `Boolean(x)`.
pub(crate) fn call_global_function(name: &str, args: Vec<Arg<'_>>) -> Result<Value, EvalError> {
    let args = Args::new(name.to_string(), args);
    let missing = args.len() == 0;
    let value = args.value(0)?;

    match name {
        "String" if missing => Ok(Value::empty_string()),
        "String" => Ok(Value::String(value.to_display_string())),
        "Number" if missing => Ok(Value::Number(0.0)),
        "Number" => Ok(Value::Number(value.to_number())),
        "Boolean" => Ok(Value::Bool(value.is_truthy())),
        _ => Err(EvalError::NotCallable {
            callee: name.to_string(),
        }),
    }
}

/// Call `target.method(args)`.
pub(crate) fn call_method(
    interpreter: &mut Interpreter,
    target: &Value,
    method: &str,
    args: Vec<Arg<'_>>,
) -> Result<Value, EvalError> {
    let args = Args::new(method.to_string(), args);

    let result = match target {
        Value::Undefined | Value::Null => {
            return Err(EvalError::PropertyOfNothing {
                target: target.to_display_string(),
                property: method.to_string(),
            })
        }
        Value::String(s) => string_method(interpreter, s, method, &args)?,
        Value::Array(items) => array_method(interpreter, items, method, &args)?,
        Value::Number(n) => number_method(*n, method, &args)?,
        Value::Bool(b) if method == "toString" => Some(Value::String(b.to_string())),
        Value::Bool(_) | Value::Object(_) => None,
    };

    result.ok_or_else(|| EvalError::UnknownMethod {
        type_name: owner_name(target).to_string(),
        method: method.to_string(),
    })
}

fn too_long() -> EvalError {
    EvalError::StringTooLong {
        limit: MAX_STRING_LENGTH,
    }
}

fn owner_name(target: &Value) -> &'static str {
    match target {
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Number(_) => "Number",
        Value::Bool(_) => "Boolean",
        Value::Object(_) => "Object",
        Value::Undefined | Value::Null => "undefined",
    }
}

fn string_method(
    interpreter: &mut Interpreter,
    s: &str,
    method: &str,
    args: &Args<'_>,
) -> Result<Option<Value>, EvalError> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let substring = |start: usize, end: usize| -> String {
        if start >= end {
            String::new()
        } else {
            chars[start..end].iter().collect()
        }
    };

    let value = match method {
        "toLowerCase" => Value::String(s.to_lowercase()),
        "toUpperCase" => Value::String(s.to_uppercase()),
        "trim" => Value::string(s.trim()),
        "trimStart" => Value::string(s.trim_start()),
        "trimEnd" => Value::string(s.trim_end()),
        "toString" => Value::string(s),

        "includes" => {
            let from = clamp_index(args.integer(1, 0.0)?, len);
            Value::Bool(substring(from, len).contains(&args.string(0)?))
        }
        "startsWith" => {
            let from = clamp_index(args.integer(1, 0.0)?, len);
            Value::Bool(substring(from, len).starts_with(&args.string(0)?))
        }
        "endsWith" => {
            let end = clamp_index(args.integer(1, len as f64)?, len);
            Value::Bool(substring(0, end).ends_with(&args.string(0)?))
        }
        "indexOf" => {
            let from = clamp_index(args.integer(1, 0.0)?, len);
            let rest = substring(from, len);
            let found = rest
                .find(&args.string(0)?)
                .map(|byte| (from + rest[..byte].chars().count()) as f64);
            Value::Number(found.unwrap_or(-1.0))
        }

        "replace" => Value::String(replace(interpreter, s, args, false)?),
        "replaceAll" => Value::String(replace(interpreter, s, args, true)?),

        "split" => {
            let separator = args.value(0)?;
            let limit = match args.value(1)? {
                Value::Undefined => usize::MAX,
                other => other.to_number().max(0.0) as usize,
            };
            let parts: Vec<Value> = match separator {
                Value::Undefined => vec![Value::string(s)],
                other => {
                    let separator = other.to_display_string();
                    if separator.is_empty() {
                        chars.iter().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::string).collect()
                    }
                }
            };
            Value::Array(parts.into_iter().take(limit).collect())
        }

        "slice" => {
            let start = relative_index(args.integer(0, 0.0)?, len);
            let end = relative_index(args.integer(1, len as f64)?, len);
            Value::String(substring(start, end))
        }
        "substring" => {
            let a = clamp_index(args.integer(0, 0.0)?, len);
            let b = clamp_index(args.integer(1, len as f64)?, len);
            Value::String(substring(a.min(b), a.max(b)))
        }

        "padStart" | "padEnd" => {
            let target = args.integer(0, 0.0)?;
            let fill = match args.value(1)? {
                Value::Undefined => " ".to_string(),
                other => other.to_display_string(),
            };
            if target <= len as f64 || fill.is_empty() {
                Value::string(s)
            } else {
                if target > MAX_STRING_LENGTH as f64 {
                    return Err(too_long());
                }
                let padding: String = fill.chars().cycle().take(target as usize - len).collect();
                check_length(padding.len() + s.len())?;
                Value::String(if method == "padStart" {
                    padding + s
                } else {
                    s.to_string() + &padding
                })
            }
        }

        "charAt" => {
            let index = args.integer(0, 0.0)?;
            Value::String(
                position(index, len)
                    .map(|i| chars[i].to_string())
                    .unwrap_or_default(),
            )
        }
        "at" => {
            let index = args.integer(0, 0.0)?;
            let index = if index < 0.0 { index + len as f64 } else { index };
            position(index, len)
                .map(|i| Value::String(chars[i].to_string()))
                .unwrap_or_default()
        }

        "repeat" => {
            let count = args.integer(0, 0.0)?;
            if count < 0.0 || count.is_infinite() {
                return Err(args.invalid(format!("Invalid count value: {}", format_number(count))));
            }
            if s.is_empty() || count == 0.0 {
                Value::empty_string()
            } else {
                if count * s.len() as f64 > MAX_STRING_LENGTH as f64 {
                    return Err(too_long());
                }
                Value::String(s.repeat(count as usize))
            }
        }

        "concat" => {
            let mut out = s.to_string();
            for value in args.values()? {
                let part = value.to_display_string();
                check_length(out.len() + part.len())?;
                out.push_str(&part);
            }
            Value::String(out)
        }

        _ => return Ok(None),
    };

    Ok(Some(value))
}

/// `replace` / `replaceAll` with a string pattern and a string or arrow
/// function replacement.
fn replace(
    interpreter: &mut Interpreter,
    s: &str,
    args: &Args<'_>,
    all: bool,
) -> Result<String, EvalError> {
    let pattern = args.string(0)?;
    let replacement = args.items.get(1);

    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for (byte, matched) in s.match_indices(pattern.as_str()) {
        out.push_str(&s[last..byte]);
        let text = match replacement {
            Some(Arg::Function(function)) => {
                let offset = s[..byte].chars().count() as f64;
                interpreter
                    .invoke(*function, &[Value::string(matched), Value::Number(offset)])?
                    .to_display_string()
            }
            Some(Arg::Value(value)) => value.to_display_string(),
            None => "undefined".to_string(),
        };
        check_length(out.len() + text.len())?;
        out.push_str(&text);
        last = byte + matched.len();
        if !all {
            break;
        }
    }
    out.push_str(&s[last..]);
    Ok(out)
}

fn array_method(
    interpreter: &mut Interpreter,
    items: &[Value],
    method: &str,
    args: &Args<'_>,
) -> Result<Option<Value>, EvalError> {
    let len = items.len();

    let value = match method {
        "map" => {
            let function = args.function(0)?;
            let mut mapped = Vec::with_capacity(len);
            for (i, item) in items.iter().enumerate() {
                mapped.push(interpreter.invoke(function, &[item.clone(), Value::Number(i as f64)])?);
            }
            Value::Array(mapped)
        }
        "filter" => {
            let function = args.function(0)?;
            let mut kept = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if interpreter
                    .invoke(function, &[item.clone(), Value::Number(i as f64)])?
                    .is_truthy()
                {
                    kept.push(item.clone());
                }
            }
            Value::Array(kept)
        }
        "find" | "some" | "every" => {
            let function = args.function(0)?;
            let mut found = None;
            for (i, item) in items.iter().enumerate() {
                let matched = interpreter
                    .invoke(function, &[item.clone(), Value::Number(i as f64)])?
                    .is_truthy();
                if matched != (method == "every") {
                    found = Some(item.clone());
                    break;
                }
            }
            match method {
                "find" => found.unwrap_or_default(),
                "some" => Value::Bool(found.is_some()),
                _ => Value::Bool(found.is_none()),
            }
        }

        "includes" => {
            let needle = args.value(0)?;
            Value::Bool(items.iter().any(|item| same_value_zero(item, &needle)))
        }
        "indexOf" => {
            let needle = args.value(0)?;
            let index = items.iter().position(|item| strict_equals(item, &needle));
            Value::Number(index.map(|i| i as f64).unwrap_or(-1.0))
        }
        "join" => {
            let separator = match args.value(0)? {
                Value::Undefined => ",".to_string(),
                other => other.to_display_string(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_display_string()
                    }
                })
                .collect();
            let total = parts
                .iter()
                .map(String::len)
                .sum::<usize>()
                .saturating_add(separator.len().saturating_mul(parts.len().saturating_sub(1)));
            check_length(total)?;
            Value::String(parts.join(&separator))
        }
        "toString" => Value::String(Value::Array(items.to_vec()).to_display_string()),

        "slice" => {
            let start = relative_index(args.integer(0, 0.0)?, len);
            let end = relative_index(args.integer(1, len as f64)?, len);
            Value::Array(if start < end { items[start..end].to_vec() } else { Vec::new() })
        }
        "concat" => {
            let mut out = items.to_vec();
            for value in args.values()? {
                match value {
                    Value::Array(more) => out.extend(more),
                    other => out.push(other),
                }
            }
            Value::Array(out)
        }
        "at" => {
            let index = args.integer(0, 0.0)?;
            let index = if index < 0.0 { index + len as f64 } else { index };
            position(index, len)
                .map(|i| items[i].clone())
                .unwrap_or_default()
        }
        "reverse" => Value::Array(items.iter().rev().cloned().collect()),
        "flat" => {
            let depth = args.integer(0, 1.0)?;
            let mut out = Vec::new();
            flatten_into(items, depth, &mut out);
            Value::Array(out)
        }

        "sort" => {
            let sorted = match args.items.first() {
                Some(Arg::Function(function)) => {
                    let function = *function;
                    insertion_sort(items, |a, b| {
                        let n = interpreter
                            .invoke(function, &[a.clone(), b.clone()])?
                            .to_number();
                        Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
                    })?
                }
                Some(Arg::Value(Value::Undefined)) | None => {
                    insertion_sort(items, |a, b| Ok(default_order(a, b)))?
                }
                Some(Arg::Value(_)) => {
                    return Err(args.invalid("The comparison function must be either a function or undefined"))
                }
            };
            Value::Array(sorted)
        }

        _ => return Ok(None),
    };

    Ok(Some(value))
}

fn number_method(n: f64, method: &str, args: &Args<'_>) -> Result<Option<Value>, EvalError> {
    let value = match method {
        "toFixed" => {
            let digits = args.integer(0, 0.0)?;
            if !(0.0..=100.0).contains(&digits) {
                return Err(args.invalid("toFixed() digits argument must be between 0 and 100"));
            }
            if !n.is_finite() {
                Value::String(format_number(n))
            } else {
                let n = if n == 0.0 { 0.0 } else { n };
                Value::String(format!("{:.*}", digits as usize, n))
            }
        }
        "toString" => {
            let radix = args.integer(0, 10.0)?;
            if !(2.0..=36.0).contains(&radix) {
                return Err(args.invalid("toString() radix must be between 2 and 36"));
            }
            Value::String(to_radix(n, radix as u32).ok_or_else(|| {
                args.invalid("only integers can be printed in a radix other than 10")
            })?)
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn to_radix(n: f64, radix: u32) -> Option<String> {
    if radix == 10 || !n.is_finite() {
        return Some(format_number(n));
    }
    if n.fract() != 0.0 || n.abs() > u64::MAX as f64 {
        return None;
    }
    let mut magnitude = n.abs() as u64;
    let mut digits = Vec::new();
    loop {
        digits.push(std::char::from_digit((magnitude % radix as u64) as u32, radix)?);
        magnitude /= radix as u64;
        if magnitude == 0 {
            break;
        }
    }
    if n < 0.0 {
        digits.push('-');
    }
    Some(digits.into_iter().rev().collect())
}

/// Keys and values in property order, or `None` for `null`/`undefined`.
fn own_entries(target: &Value) -> Option<Vec<(String, Value)>> {
    match target {
        Value::Undefined | Value::Null => None,
        Value::Object(map) => Some(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
        ),
        Value::String(s) => Some(
            s.chars()
                .enumerate()
                .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
                .collect(),
        ),
        Value::Bool(_) | Value::Number(_) => Some(Vec::new()),
    }
}

fn json_stringify(args: &Args<'_>) -> Result<Value, EvalError> {
    let value = args.value(0)?;
    if matches!(value, Value::Undefined) {
        return Ok(Value::Undefined);
    }
    let json = value.to_json();

    let indent = match args.value(2)? {
        Value::Number(n) => " ".repeat(n.clamp(0.0, 10.0) as usize),
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    if indent.is_empty() {
        return Ok(Value::String(json.to_string()));
    }

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    json.serialize(&mut serializer)
        .map_err(|e| args.invalid(e.to_string()))?;
    String::from_utf8(out)
        .map(Value::String)
        .map_err(|e| args.invalid(e.to_string()))
}

/// Like `===`, except NaN equals NaN.
fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equals(a, b),
    }
}

/// Default array order: by string form, `undefined` last.
fn default_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => Ordering::Equal,
        (Value::Undefined, _) => Ordering::Greater,
        (_, Value::Undefined) => Ordering::Less,
        _ => a.to_display_string().cmp(&b.to_display_string()),
    }
}

/// Stable sort that tolerates inconsistent comparators and stops at the
/// first comparator error.
fn insertion_sort(
    items: &[Value],
    mut compare: impl FnMut(&Value, &Value) -> Result<Ordering, EvalError>,
) -> Result<Vec<Value>, EvalError> {
    let mut sorted: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        let mut at = sorted.len();
        while at > 0 && compare(&sorted[at - 1], item)? == Ordering::Greater {
            at -= 1;
        }
        sorted.insert(at, item.clone());
    }
    Ok(sorted)
}

fn flatten_into(items: &[Value], depth: f64, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth >= 1.0 => flatten_into(inner, depth - 1.0, out),
            other => out.push(other.clone()),
        }
    }
}

/// Resolve a possibly negative index against `len`, clamped to `0..=len`.
fn relative_index(index: f64, len: usize) -> usize {
    if index < 0.0 {
        (len as f64 + index).max(0.0) as usize
    } else {
        index.min(len as f64) as usize
    }
}

/// Clamp an index to `0..=len`.
fn clamp_index(index: f64, len: usize) -> usize {
    index.clamp(0.0, len as f64) as usize
}

/// An in-range index, or `None`.
fn position(index: f64, len: usize) -> Option<usize> {
    (index >= 0.0 && index < len as f64).then_some(index as usize)
}

#[cfg(test)]
mod tests {
    use crate::interpreter::{execute, MAX_STRING_LENGTH};
    use formwork_core::{EvalError, Value};
    use formwork_parser::parse;

    fn eval(source: &str) -> Value {
        execute(&parse(source).unwrap()).unwrap()
    }

    fn strings(items: &[&str]) -> Value {
        Value::from(items.iter().map(|s| Value::from(*s)).collect::<Vec<_>>())
    }

    #[test]
    fn test_class_name_from_field_name() {
        assert_eq!(
            eval("'field-' + 'My Field Name'.toLowerCase().replaceAll(' ', '-')"),
            Value::from("field-my-field-name")
        );
    }

    #[test]
    fn test_string_search_methods() {
        assert_eq!(eval("'range'.includes('ng')"), Value::Bool(true));
        assert_eq!(eval("'expenses/2024'.startsWith('expenses/')"), Value::Bool(true));
        assert_eq!(eval("'note.md'.endsWith('.md')"), Value::Bool(true));
        assert_eq!(eval("'héllo'.indexOf('l')"), Value::Number(2.0));
        assert_eq!(eval("'abc'.indexOf('z')"), Value::Number(-1.0));
    }

    #[test]
    fn test_string_slicing() {
        assert_eq!(eval("'abcdef'.slice(-2)"), Value::from("ef"));
        assert_eq!(eval("'abcdef'.slice(1, -1)"), Value::from("bcde"));
        assert_eq!(eval("'abcdef'.substring(4, 1)"), Value::from("bcd"));
        assert_eq!(eval("'abc'.charAt(5)"), Value::from(""));
        assert_eq!(eval("'abc'.at(-1)"), Value::from("c"));
    }

    #[test]
    fn test_string_padding_and_repeat() {
        assert_eq!(eval("'7'.padStart(3, '0')"), Value::from("007"));
        assert_eq!(eval("'ab'.padEnd(5, 'xy')"), Value::from("abxyx"));
        assert_eq!(eval("'ab'.repeat(3)"), Value::from("ababab"));
        assert!(matches!(
            execute(&parse("'ab'.repeat(-1)").unwrap()),
            Err(EvalError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_split() {
        assert_eq!(eval("'a,b,c'.split(',')"), strings(&["a", "b", "c"]));
        assert_eq!(eval("'abc'.split('')"), strings(&["a", "b", "c"]));
        assert_eq!(eval("'a,b,c'.split(',', 2)"), strings(&["a", "b"]));
    }

    #[test]
    fn test_replace_first_only() {
        assert_eq!(eval("'a-b-c'.replace('-', '+')"), Value::from("a+b-c"));
        assert_eq!(
            eval("'a-b'.replaceAll('-', m => '[' + m + ']')"),
            Value::from("a[-]b")
        );
    }

    #[test]
    fn test_array_callbacks() {
        assert_eq!(
            eval("['x', 'y'].map(i => i.toUpperCase())"),
            strings(&["X", "Y"])
        );
        assert_eq!(eval("[1, 2, 3, 4].filter(n => n % 2 === 0).length"), Value::Number(2.0));
        assert_eq!(eval("[1, 2, 3].find(n => n > 1)"), Value::Number(2.0));
        assert_eq!(eval("[1, 2, 3].find(n => n > 5)"), Value::Undefined);
        assert_eq!(eval("[1, 2].some(n => n > 1)"), Value::Bool(true));
        assert_eq!(eval("[1, 2].every(n => n > 1)"), Value::Bool(false));
        assert_eq!(eval("[].every(n => false)"), Value::Bool(true));
        assert_eq!(eval("['a', 'b'].map((v, i) => v + i).join('')"), Value::from("a0b1"));
    }

    #[test]
    fn test_array_includes_for_visibility() {
        assert_eq!(eval("['dropdown','range'].includes('range')"), Value::Bool(true));
        assert_eq!(eval("['toggle','range'].includes('text') ? 'false' : 'true'"), Value::from("true"));
    }

    #[test]
    fn test_array_shaping() {
        assert_eq!(eval("[3, 1, 2].sort()"), Value::from(vec![1.0, 2.0, 3.0]));
        assert_eq!(eval("[10, 9, 1].sort()"), Value::from(vec![1.0, 10.0, 9.0]));
        assert_eq!(eval("[10, 9, 1].sort((a, b) => a - b)"), Value::from(vec![1.0, 9.0, 10.0]));
        assert_eq!(eval("[1, [2, [3]]].flat()").to_display_string(), "1,2,3");
        assert_eq!(eval("[1, [2, [3]]].flat().length"), Value::Number(3.0));
        assert_eq!(eval("[1, 2].concat([3], 4).reverse()"), Value::from(vec![4.0, 3.0, 2.0, 1.0]));
        assert_eq!(eval("[1, 2, 3].slice(-2)"), Value::from(vec![2.0, 3.0]));
        assert_eq!(eval("[NaN].includes(NaN)"), Value::Bool(true));
        assert_eq!(eval("[NaN].indexOf(NaN)"), Value::Number(-1.0));
    }

    #[test]
    fn test_number_methods() {
        assert_eq!(eval("(3.14159).toFixed(2)"), Value::from("3.14"));
        assert_eq!(eval("(2).toFixed(2)"), Value::from("2.00"));
        assert_eq!(eval("(255).toString(16)"), Value::from("ff"));
        assert_eq!(eval("(-5).toString(2)"), Value::from("-101"));
    }

    #[test]
    fn test_object_globals() {
        assert_eq!(eval("Object.keys({a: 1, b: 2})"), strings(&["a", "b"]));
        assert_eq!(
            eval("Object.values({a: 'x', b: 'y'}).map(i => i.toUpperCase())"),
            strings(&["X", "Y"])
        );
        assert_eq!(eval("Object.entries({a: 1})[0][0]"), Value::from("a"));
        assert!(execute(&parse("Object.keys(null)").unwrap()).is_err());
    }

    #[test]
    fn test_json_globals() {
        assert_eq!(eval("JSON.stringify({a: [1, 'x']})"), Value::from(r#"{"a":[1,"x"]}"#));
        assert_eq!(eval("JSON.stringify([1], null, 2)"), Value::from("[\n  1\n]"));
        assert_eq!(eval("JSON.parse('[1, 2]').length"), Value::Number(2.0));
        assert!(execute(&parse("JSON.parse('{')").unwrap()).is_err());
    }

    #[test]
    fn test_math_and_conversions() {
        assert_eq!(eval("Math.max(1, '3', 2)"), Value::Number(3.0));
        assert_eq!(eval("Math.min()"), Value::Number(f64::INFINITY));
        assert_eq!(eval("Math.round(-2.5)"), Value::Number(-2.0));
        assert_eq!(eval("Math.abs(-4) + Math.floor(1.7) + Math.ceil(0.2)"), Value::Number(6.0));
        assert_eq!(eval("String(12) + Number('3')"), Value::from("123"));
        assert_eq!(eval("Boolean('')"), Value::Bool(false));
        assert_eq!(eval("Array.isArray([])"), Value::Bool(true));
    }

    #[test]
    fn test_unknown_methods() {
        assert!(matches!(
            execute(&parse("'a'.big()").unwrap()),
            Err(EvalError::UnknownMethod { type_name, method }) if type_name == "String" && method == "big"
        ));
        assert!(matches!(
            execute(&parse("Math.random()").unwrap()),
            Err(EvalError::UnknownMethod { .. })
        ));
        assert!(matches!(
            execute(&parse("({}).keys()").unwrap()),
            Err(EvalError::UnknownMethod { .. })
        ));
    }

    fn too_long(source: &str) -> bool {
        matches!(
            execute(&parse(source).unwrap()),
            Err(EvalError::StringTooLong { limit }) if limit == MAX_STRING_LENGTH
        )
    }

    #[test]
    fn test_string_length_is_bounded() {
        assert!(too_long("'x'.repeat(1e12)"));
        assert!(too_long("'x'.repeat(1e5).repeat(1e5)"));
        assert!(too_long("'x'.padStart(1e12)"));
        assert!(too_long("'x'.padEnd(1e9, 'ab')"));
        assert!(too_long("'x'.repeat(1e7).concat('x'.repeat(1e7))"));
        assert!(too_long("[1, 2, 3].join('x'.repeat(1e7))"));
        assert!(too_long("'aaa'.replaceAll('a', 'x'.repeat(1e7))"));
        assert!(too_long("'x'.repeat(1e7) + 'x'.repeat(1e7)"));
    }

    #[test]
    fn test_empty_repeat_is_empty() {
        assert_eq!(eval("''.repeat(1e12)"), Value::from(""));
        assert_eq!(eval("'ab'.repeat(0)"), Value::from(""));
        assert_eq!(eval("'ab'.repeat(1e3).length"), Value::Number(2000.0));
    }

    #[test]
    fn test_method_on_undefined() {
        assert!(matches!(
            execute(&parse("undefined.toString()").unwrap()),
            Err(EvalError::PropertyOfNothing { .. })
        ));
    }
}
