//! Tree-walking interpreter for parsed expression bodies.
//!
//! Evaluation is restricted to the closed set of operators, methods and
//! globals in [`crate::methods`]. There is no assignment and no access to
//! anything outside the expression.

use formwork_core::{
    ast::{BinaryOp, Expr, Literal, LogicalOp, Program, UnaryOp},
    EvalError, Value,
};
use indexmap::IndexMap;

use crate::methods;

/// Default number of evaluation steps before giving up.
pub const DEFAULT_STEP_LIMIT: usize = 100_000;

/// Longest string, in bytes, an expression may build.
pub const MAX_STRING_LENGTH: usize = 1 << 24;

/// Fails with [`EvalError::StringTooLong`] when `len` exceeds
/// [`MAX_STRING_LENGTH`].
pub(crate) fn check_length(len: usize) -> Result<(), EvalError> {
    if len > MAX_STRING_LENGTH {
        return Err(EvalError::StringTooLong {
            limit: MAX_STRING_LENGTH,
        });
    }
    Ok(())
}

/// An arrow function passed as a call argument.
#[derive(Debug, Clone, Copy)]
pub struct Function<'e> {
    pub params: &'e [String],
    pub body: &'e Expr,
}

/// An evaluated call argument.
#[derive(Debug, Clone)]
pub enum Arg<'e> {
    Value(Value),
    Function(Function<'e>),
}

/// Run a program with the default step limit.
pub fn execute(program: &Program) -> Result<Value, EvalError> {
    Interpreter::new().run(program)
}

/// Evaluates expressions. Holds the scope stack of arrow-function
/// parameters and the step counter.
#[derive(Debug)]
pub struct Interpreter {
    scopes: Vec<IndexMap<String, Value>>,
    steps: usize,
    step_limit: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_step_limit(DEFAULT_STEP_LIMIT)
    }

    pub fn with_step_limit(step_limit: usize) -> Self {
        Self {
            scopes: Vec::new(),
            steps: 0,
            step_limit,
        }
    }

    /// Run a whole program. The step counter restarts for every run.
    pub fn run(&mut self, program: &Program) -> Result<Value, EvalError> {
        self.steps = 0;
        self.scopes.clear();
        self.eval(&program.body)
    }

    fn tick(&mut self) -> Result<(), EvalError> {
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(EvalError::StepLimit {
                limit: self.step_limit,
            });
        }
        Ok(())
    }

    fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.scopes.iter().rev().find_map(|scope| scope.get(name)) {
            return Ok(value.clone());
        }
        match name {
            "NaN" => Ok(Value::Number(f64::NAN)),
            "Infinity" => Ok(Value::Number(f64::INFINITY)),
            _ => Err(EvalError::UndefinedVariable {
                name: name.to_string(),
            }),
        }
    }

    /// Call an arrow function with positional arguments. Missing arguments
    /// are `undefined`, extra ones are ignored.
    pub fn invoke(&mut self, function: Function<'_>, args: &[Value]) -> Result<Value, EvalError> {
        self.tick()?;
        let scope = function
            .params
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), args.get(i).cloned().unwrap_or_default()))
            .collect();
        self.scopes.push(scope);
        let result = self.eval(function.body);
        self.scopes.pop();
        result
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        self.tick()?;

        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
                Literal::Undefined => Value::Undefined,
            }),

            Expr::Ident(name) => self.lookup(name),

            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(values))
            }

            Expr::Object(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = self.eval(value)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(map))
            }

            Expr::Member { object, property } => {
                let target = self.eval(object)?;
                get_property(&target, property)
            }

            Expr::Index { object, index } => {
                let target = self.eval(object)?;
                let key = self.eval(index)?;
                get_index(&target, &key)
            }

            Expr::Call { callee, args } => self.call(callee, args),

            Expr::Unary { op, operand } => self.eval_unary(*op, operand),

            Expr::Binary { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                let value = binary(*op, &left, &right);
                if let Value::String(s) = &value {
                    check_length(s.len())?;
                }
                Ok(value)
            }

            Expr::Logical { left, op, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }

            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }

            Expr::Arrow { .. } => Err(EvalError::UnexpectedArrow),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<Value, EvalError> {
        if op == UnaryOp::TypeOf {
            if let Expr::Ident(name) = operand {
                if self.lookup(name).is_err() {
                    return Ok(Value::string("undefined"));
                }
            }
        }

        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::string(value.type_name()),
        })
    }

    fn call<'e>(&mut self, callee: &'e Expr, args: &'e [Expr]) -> Result<Value, EvalError> {
        match callee {
            Expr::Member { object, property } => {
                if let Expr::Ident(namespace) = object.as_ref() {
                    if !self.is_bound(namespace) && methods::is_namespace(namespace) {
                        let args = self.eval_args(args)?;
                        return methods::call_global(namespace, property, args);
                    }
                }
                let target = self.eval(object)?;
                let args = self.eval_args(args)?;
                methods::call_method(self, &target, property, args)
            }
            Expr::Ident(name) if !self.is_bound(name) && methods::is_global_function(name) => {
                let args = self.eval_args(args)?;
                methods::call_global_function(name, args)
            }
            Expr::Ident(name) => {
                self.lookup(name)?;
                Err(EvalError::NotCallable {
                    callee: name.clone(),
                })
            }
            other => {
                let value = self.eval(other)?;
                Err(EvalError::NotCallable {
                    callee: value.to_display_string(),
                })
            }
        }
    }

    fn eval_args<'e>(&mut self, args: &'e [Expr]) -> Result<Vec<Arg<'e>>, EvalError> {
        args.iter()
            .map(|arg| match arg {
                Expr::Arrow { params, body } => Ok(Arg::Function(Function {
                    params: params.as_slice(),
                    body: body.as_ref(),
                })),
                other => self.eval(other).map(Arg::Value),
            })
            .collect()
    }
}

/// Read a named property.
pub fn get_property(target: &Value, property: &str) -> Result<Value, EvalError> {
    match target {
        Value::Undefined | Value::Null => Err(EvalError::PropertyOfNothing {
            target: target.to_display_string(),
            property: property.to_string(),
        }),
        Value::String(s) if property == "length" => Ok(Value::Number(s.chars().count() as f64)),
        Value::Array(items) if property == "length" => Ok(Value::Number(items.len() as f64)),
        Value::String(_) | Value::Array(_) => match property.parse::<usize>() {
            Ok(index) => Ok(element_at(target, index)),
            Err(_) => Ok(Value::Undefined),
        },
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or_default()),
        Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
    }
}

/// Read a computed property (`target[key]`).
pub fn get_index(target: &Value, key: &Value) -> Result<Value, EvalError> {
    if let (Value::String(_) | Value::Array(_), Value::Number(n)) = (target, key) {
        if n.fract() == 0.0 && *n >= 0.0 {
            return Ok(element_at(target, *n as usize));
        }
        return Ok(Value::Undefined);
    }
    get_property(target, &key.to_display_string())
}

fn element_at(target: &Value, index: usize) -> Value {
    match target {
        Value::Array(items) => items.get(index).cloned().unwrap_or_default(),
        Value::String(s) => s
            .chars()
            .nth(index)
            .map(|c| Value::String(c.to_string()))
            .unwrap_or_default(),
        _ => Value::Undefined,
    }
}

/// Apply a non-short-circuiting binary operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let left = to_primitive(left);
            let right = to_primitive(right);
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                Value::String(format!(
                    "{}{}",
                    left.to_display_string(),
                    right.to_display_string()
                ))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNe => Value::Bool(!strict_equals(left, right)),
        BinaryOp::LooseEq => Value::Bool(loose_equals(left, right)),
        BinaryOp::LooseNe => Value::Bool(!loose_equals(left, right)),
        BinaryOp::Lt => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::Le => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::Gt => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::Ge => Value::Bool(compare(left, right, |o| o.is_ge())),
    }
}

/// Arrays and objects convert to their string form; everything else is
/// already primitive.
fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_display_string()),
        other => other.clone(),
    }
}

/// `===`. Arrays and objects compare structurally.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| strict_equals(v, other)))
        }
        _ => left == right,
    }
}

/// `==`.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (Value::Bool(_), _) => loose_equals(&Value::Number(left.to_number()), right),
        (_, Value::Bool(_)) => loose_equals(left, &Value::Number(right.to_number())),
        (Value::Number(a), Value::String(_)) => *a == right.to_number(),
        (Value::String(_), Value::Number(b)) => left.to_number() == *b,
        (Value::Array(_) | Value::Object(_), Value::String(_) | Value::Number(_)) => {
            loose_equals(&to_primitive(left), right)
        }
        (Value::String(_) | Value::Number(_), Value::Array(_) | Value::Object(_)) => {
            loose_equals(left, &to_primitive(right))
        }
        _ => strict_equals(left, right),
    }
}

/// Relational comparison: lexicographic for two strings, numeric otherwise.
/// Any comparison involving NaN is false.
fn compare(left: &Value, right: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    let left = to_primitive(left);
    let right = to_primitive(right);
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return test(a.cmp(b));
    }
    left.to_number()
        .partial_cmp(&right.to_number())
        .is_some_and(test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_parser::parse;

    fn eval(source: &str) -> Value {
        execute(&parse(source).unwrap()).unwrap()
    }

    fn eval_err(source: &str) -> EvalError {
        execute(&parse(source).unwrap()).unwrap_err()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 1"), Value::Number(2.0));
        assert_eq!(eval("7 % 4 * 2 - 1"), Value::Number(5.0));
        assert_eq!(eval("-'3' + +'2'"), Value::Number(-1.0));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval("'hello' + ' world'"), Value::from("hello world"));
        assert_eq!(eval("'n' + 1 + 2"), Value::from("n12"));
        assert_eq!(eval("1 + 2 + 'n'"), Value::from("3n"));
        assert_eq!(eval("[1, 2] + ''"), Value::from("1,2"));
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval("'1' === 1"), Value::Bool(false));
        assert_eq!(eval("'1' == 1"), Value::Bool(true));
        assert_eq!(eval("null == undefined"), Value::Bool(true));
        assert_eq!(eval("null === undefined"), Value::Bool(false));
        assert_eq!(eval("[1, 'a'] === [1, 'a']"), Value::Bool(true));
        assert_eq!(eval("NaN === NaN"), Value::Bool(false));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("'b' > 'a'"), Value::Bool(true));
        assert_eq!(eval("'10' < '9'"), Value::Bool(true));
        assert_eq!(eval("'10' < 9"), Value::Bool(false));
        assert_eq!(eval("undefined < 1"), Value::Bool(false));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(eval("'' || 'fallback'"), Value::from("fallback"));
        assert_eq!(eval("0 ?? 5"), Value::Number(0.0));
        assert_eq!(eval("null ?? 5"), Value::Number(5.0));
        assert_eq!(eval("'a' && 'b'"), Value::from("b"));
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        assert_eq!(eval("false && missing.x"), Value::Bool(false));
    }

    #[test]
    fn test_member_and_index_access() {
        assert_eq!(eval("{a: {b: [10, 20]}}.a.b[1]"), Value::Number(20.0));
        assert_eq!(eval("'abc'.length"), Value::Number(3.0));
        assert_eq!(eval("'abc'[1]"), Value::from("b"));
        assert_eq!(eval("{a: 1}['a']"), Value::Number(1.0));
        assert_eq!(eval("{a: 1}.missing"), Value::Undefined);
    }

    #[test]
    fn test_property_of_undefined_is_error() {
        assert!(matches!(
            eval_err("{}.a.b"),
            EvalError::PropertyOfNothing { property, .. } if property == "b"
        ));
    }

    #[test]
    fn test_typeof() {
        assert_eq!(eval("typeof 'x'"), Value::from("string"));
        assert_eq!(eval("typeof nothing"), Value::from("undefined"));
        assert_eq!(eval("typeof null"), Value::from("object"));
    }

    #[test]
    fn test_undefined_variable() {
        assert!(matches!(
            eval_err("foo + 1"),
            EvalError::UndefinedVariable { name } if name == "foo"
        ));
    }

    #[test]
    fn test_bare_arrow_rejected() {
        assert!(matches!(eval_err("x => x"), EvalError::UnexpectedArrow));
    }

    #[test]
    fn test_step_limit() {
        let program = parse("[1, 2, 3].map(x => x * 2)").unwrap();
        let err = Interpreter::with_step_limit(5).run(&program).unwrap_err();
        assert!(matches!(err, EvalError::StepLimit { limit: 5 }));
    }

    #[test]
    fn test_interpreter_is_reusable() {
        let mut interpreter = Interpreter::with_step_limit(50);
        let program = parse("[1, 2, 3].map(x => x + 1)").unwrap();
        let first = interpreter.run(&program).unwrap();
        let second = interpreter.run(&program).unwrap();
        assert_eq!(first, second);
    }
}
