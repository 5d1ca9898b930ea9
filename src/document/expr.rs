//! Pipeline expressions and group accumulators
//!
//! Expressions are evaluated against one document and always yield a value;
//! a missing path evaluates to null. Arithmetic keeps integers integral where
//! the result is exact, so `floor(1994 / 10) * 10` yields the integer 1990.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::filters::compare_same_kind;
use super::get_path;
use super::sorter::compare_values;

/// An expression over the current document
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Dotted field path
    Field(String),
    /// Constant
    Literal(Value),
    /// The whole current document
    Root,
    Add(Vec<Expr>),
    Multiply(Vec<Expr>),
    /// Division, null on a zero divisor
    Divide(Box<Expr>, Box<Expr>),
    /// Floor toward negative infinity, as an integer
    Floor(Box<Expr>),
    /// Array length
    Size(Box<Expr>),
    /// First `n` array elements
    Slice(Box<Expr>, usize),
    /// `if cond then a else b`
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
    /// Both sides non-null and `a >= b`
    Gte(Box<Expr>, Box<Expr>),
    /// Both sides non-null and `a < b`
    Lt(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(path.into())
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn divide(a: Expr, b: Expr) -> Self {
        Expr::Divide(Box::new(a), Box::new(b))
    }

    pub fn floor(a: Expr) -> Self {
        Expr::Floor(Box::new(a))
    }

    pub fn size(a: Expr) -> Self {
        Expr::Size(Box::new(a))
    }

    pub fn slice(a: Expr, n: usize) -> Self {
        Expr::Slice(Box::new(a), n)
    }

    pub fn cond(test: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Cond(Box::new(test), Box::new(then), Box::new(otherwise))
    }

    pub fn gte(a: Expr, b: Expr) -> Self {
        Expr::Gte(Box::new(a), Box::new(b))
    }

    pub fn lt(a: Expr, b: Expr) -> Self {
        Expr::Lt(Box::new(a), Box::new(b))
    }

    /// Evaluates the expression against a document
    pub fn eval(&self, doc: &Value) -> Value {
        match self {
            Expr::Field(path) => get_path(doc, path).cloned().unwrap_or(Value::Null),
            Expr::Literal(v) => v.clone(),
            Expr::Root => doc.clone(),
            Expr::Add(terms) => fold_numbers(terms, doc, 0, |a, b| a.checked_add(b), |a, b| a + b),
            Expr::Multiply(terms) => {
                fold_numbers(terms, doc, 1, |a, b| a.checked_mul(b), |a, b| a * b)
            }
            Expr::Divide(a, b) => match (as_f64(&a.eval(doc)), as_f64(&b.eval(doc))) {
                (Some(x), Some(y)) if y != 0.0 => float_value(x / y),
                _ => Value::Null,
            },
            Expr::Floor(a) => match a.eval(doc) {
                Value::Number(n) if n.is_i64() => Value::Number(n),
                other => match as_f64(&other) {
                    Some(x) if x.is_finite() => Value::from(x.floor() as i64),
                    _ => Value::Null,
                },
            },
            Expr::Size(a) => match a.eval(doc) {
                Value::Array(items) => Value::from(items.len() as i64),
                _ => Value::Null,
            },
            Expr::Slice(a, n) => match a.eval(doc) {
                Value::Array(mut items) => {
                    items.truncate(*n);
                    Value::Array(items)
                }
                _ => Value::Null,
            },
            Expr::Cond(test, then, otherwise) => {
                if truthy(&test.eval(doc)) {
                    then.eval(doc)
                } else {
                    otherwise.eval(doc)
                }
            }
            Expr::Gte(a, b) => Value::Bool(matches!(
                compare_non_null(&a.eval(doc), &b.eval(doc)),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            Expr::Lt(a, b) => Value::Bool(
                compare_non_null(&a.eval(doc), &b.eval(doc)) == Some(Ordering::Less),
            ),
        }
    }
}

/// Returns true for boolean true and non-zero numbers
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::Null => false,
        _ => true,
    }
}

fn compare_non_null(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }
    compare_same_kind(a, b)
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

fn fold_numbers(
    terms: &[Expr],
    doc: &Value,
    identity: i64,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Value {
    let mut int_acc = Some(identity);
    let mut float_acc = identity as f64;
    for term in terms {
        let value = term.eval(doc);
        let Value::Number(n) = value else {
            return Value::Null;
        };
        int_acc = match (int_acc, n.as_i64()) {
            (Some(acc), Some(i)) => int_op(acc, i),
            _ => None,
        };
        float_acc = float_op(float_acc, n.as_f64().unwrap_or(f64::NAN));
    }
    match int_acc {
        Some(i) => Value::from(i),
        None => float_value(float_acc),
    }
}

/// Group accumulators
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Sum of numeric values; non-numbers are ignored
    Sum(Expr),
    /// Mean of numeric values; null when there are none
    Avg(Expr),
    /// Smallest non-null value
    Min(Expr),
    /// Largest non-null value
    Max(Expr),
    /// All values in input order
    Push(Expr),
    /// Distinct non-null values in first-seen order
    AddToSet(Expr),
}

impl Accumulator {
    /// `$sum: 1`
    pub fn count() -> Self {
        Accumulator::Sum(Expr::lit(1))
    }

    /// Fresh running state for this accumulator
    pub fn start(&self) -> AccumulatorState {
        match self {
            Accumulator::Sum(_) => AccumulatorState::Sum { int: Some(0), float: 0.0 },
            Accumulator::Avg(_) => AccumulatorState::Avg { total: 0.0, count: 0 },
            Accumulator::Min(_) | Accumulator::Max(_) => AccumulatorState::Extreme(None),
            Accumulator::Push(_) | Accumulator::AddToSet(_) => AccumulatorState::Items(Vec::new()),
        }
    }

    /// Folds one document into the running state
    pub fn fold(&self, state: &mut AccumulatorState, doc: &Value) {
        match (self, state) {
            (Accumulator::Sum(expr), AccumulatorState::Sum { int, float }) => {
                if let Value::Number(n) = expr.eval(doc) {
                    *int = match (*int, n.as_i64()) {
                        (Some(acc), Some(i)) => acc.checked_add(i),
                        _ => None,
                    };
                    *float += n.as_f64().unwrap_or(0.0);
                }
            }
            (Accumulator::Avg(expr), AccumulatorState::Avg { total, count }) => {
                if let Some(f) = expr.eval(doc).as_f64() {
                    *total += f;
                    *count += 1;
                }
            }
            (Accumulator::Min(expr), AccumulatorState::Extreme(current)) => {
                keep_extreme(current, expr.eval(doc), Ordering::Less)
            }
            (Accumulator::Max(expr), AccumulatorState::Extreme(current)) => {
                keep_extreme(current, expr.eval(doc), Ordering::Greater)
            }
            (Accumulator::Push(expr), AccumulatorState::Items(items)) => items.push(expr.eval(doc)),
            (Accumulator::AddToSet(expr), AccumulatorState::Items(items)) => {
                let value = expr.eval(doc);
                if !value.is_null() && !items.iter().any(|v| super::filters::values_equal(v, &value)) {
                    items.push(value);
                }
            }
            _ => {}
        }
    }
}

fn keep_extreme(current: &mut Option<Value>, candidate: Value, wanted: Ordering) {
    if candidate.is_null() {
        return;
    }
    let replace = match current {
        None => true,
        Some(existing) => compare_values(Some(&candidate), Some(existing)) == wanted,
    };
    if replace {
        *current = Some(candidate);
    }
}

/// Running state of one accumulator within one group
#[derive(Debug, Clone)]
pub enum AccumulatorState {
    Sum { int: Option<i64>, float: f64 },
    Avg { total: f64, count: u64 },
    Extreme(Option<Value>),
    Items(Vec<Value>),
}

impl AccumulatorState {
    /// Final value of the accumulator
    pub fn finish(self) -> Value {
        match self {
            AccumulatorState::Sum { int: Some(i), .. } => Value::from(i),
            AccumulatorState::Sum { int: None, float } => float_value(float),
            AccumulatorState::Avg { count: 0, .. } => Value::Null,
            AccumulatorState::Avg { total, count } => float_value(total / count as f64),
            AccumulatorState::Extreme(v) => v.unwrap_or(Value::Null),
            AccumulatorState::Items(items) => Value::Array(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decade_bucketing_stays_integral() {
        let doc = json!({"m": {"start_year": 1994}});
        let decade = Expr::Multiply(vec![
            Expr::floor(Expr::divide(Expr::field("m.start_year"), Expr::lit(10))),
            Expr::lit(10),
        ]);
        assert_eq!(decade.eval(&doc), json!(1990));
    }

    #[test]
    fn test_missing_field_is_null() {
        let doc = json!({"a": 1});
        assert_eq!(Expr::field("b.c").eval(&doc), Value::Null);
        assert_eq!(Expr::Add(vec![Expr::field("a"), Expr::field("b")]).eval(&doc), Value::Null);
    }

    #[test]
    fn test_divide_by_zero_is_null() {
        let doc = json!({});
        assert_eq!(Expr::divide(Expr::lit(1), Expr::lit(0)).eval(&doc), Value::Null);
    }

    #[test]
    fn test_comparisons_reject_null() {
        let doc = json!({"low": null, "high": 2010});
        assert_eq!(Expr::lt(Expr::field("low"), Expr::field("high")).eval(&doc), json!(false));
        assert_eq!(Expr::lt(Expr::lit(2001), Expr::field("high")).eval(&doc), json!(true));
        assert_eq!(Expr::gte(Expr::field("high"), Expr::lit(2010)).eval(&doc), json!(true));
    }

    #[test]
    fn test_cond_and_slice() {
        let doc = json!({"votes": 300000, "top": [1, 2, 3, 4]});
        let high = Expr::cond(
            Expr::gte(Expr::field("votes"), Expr::lit(200000)),
            Expr::lit(1),
            Expr::lit(0),
        );
        assert_eq!(high.eval(&doc), json!(1));
        assert_eq!(Expr::slice(Expr::field("top"), 3).eval(&doc), json!([1, 2, 3]));
        assert_eq!(Expr::size(Expr::field("top")).eval(&doc), json!(4));
    }

    fn run(acc: &Accumulator, docs: &[Value]) -> Value {
        let mut state = acc.start();
        for doc in docs {
            acc.fold(&mut state, doc);
        }
        state.finish()
    }

    #[test]
    fn test_avg_ignores_null_and_empty_is_null() {
        let docs = vec![json!({"r": 8.0}), json!({"r": null}), json!({"r": 6.0})];
        assert_eq!(run(&Accumulator::Avg(Expr::field("r")), &docs), json!(7.0));

        let docs = vec![json!({"r": null})];
        assert_eq!(run(&Accumulator::Avg(Expr::field("r")), &docs), Value::Null);
    }

    #[test]
    fn test_sum_count_is_integer() {
        let docs = vec![json!({}), json!({}), json!({})];
        assert_eq!(run(&Accumulator::count(), &docs), json!(3));
    }

    #[test]
    fn test_min_max_skip_null() {
        let docs = vec![json!({"y": 2015}), json!({"y": null}), json!({"y": 2001})];
        assert_eq!(run(&Accumulator::Min(Expr::field("y")), &docs), json!(2001));
        assert_eq!(run(&Accumulator::Max(Expr::field("y")), &docs), json!(2015));
        assert_eq!(run(&Accumulator::Max(Expr::field("z")), &docs), Value::Null);
    }

    #[test]
    fn test_add_to_set_counts_distinct() {
        let docs = vec![json!({"c": "A"}), json!({"c": "A"}), json!({"c": "B"})];
        let set = run(&Accumulator::AddToSet(Expr::field("c")), &docs);
        assert_eq!(set, json!(["A", "B"]));
    }

    #[test]
    fn test_push_keeps_input_order() {
        let docs = vec![json!({"t": "b"}), json!({"t": "a"})];
        assert_eq!(run(&Accumulator::Push(Expr::field("t")), &docs), json!(["b", "a"]));
    }
}
