// The dynamic value domain.
//
// Every runtime value is one of the variants below, with the usual
// PHP-family coercion, truthiness, arithmetic and comparison rules
// layered on top.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{RunError, RunResult};

/// A mutable string buffer shared by reference, matching the source
/// language's `+=`/`.=`-style in-place append semantics: every clone of
/// the `Rc` observes the same buffer, so `append` through one handle is
/// visible through all of them.
pub type SharedString = Rc<RefCell<String>>;

/// Ordered `Value -> Value` map backing `Value::Array`. Keyed by
/// [`ArrayKey`], whose `Hash`/`Eq` canonicalize to the value's string form
/// so that cross-type-but-equal keys (e.g. the int `1` and the string
/// `"1"`) collide the same bucket.
pub type ArrayData = IndexMap<ArrayKey, Value>;

#[derive(Clone, Debug)]
pub struct FunctionData {
    pub name: String,
    pub body: Rc<crate::bytecode::Bytecode>,
    pub captures: Option<Rc<RefCell<HashMap<String, Value>>>>,
}

#[derive(Clone, Debug)]
pub struct IteratorState {
    /// Reverse-insertion-order snapshot; `next()` decrements `cursor`,
    /// which nets out to forward order when fully consumed. See
    /// DESIGN.md Open Question 3.
    pairs: Vec<(Value, Value)>,
    cursor: usize,
}

impl IteratorState {
    pub fn empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn next(&mut self) -> Option<(Value, Value)> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.pairs[self.cursor].clone())
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SharedString),
    Array(Rc<RefCell<ArrayData>>),
    List(Rc<Vec<Value>>),
    Iterator(Rc<RefCell<IteratorState>>),
    Function(Rc<FunctionData>),
}

/// Wraps a [`Value`] for use as an `Array` key. `Hash`/`Eq` canonicalize to
/// the value's string form (`Value::str`), matching the cross-type
/// equality rule comparison falls back to when neither operand is a
/// number: comparing their string forms.
#[derive(Clone, Debug)]
pub struct ArrayKey(pub Value);

impl PartialEq for ArrayKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.str() == other.0.str()
    }
}

impl Eq for ArrayKey {}

impl Hash for ArrayKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.str().hash(state);
    }
}

impl Value {
    pub fn str_value(s: impl Into<String>) -> Value {
        Value::Str(Rc::new(RefCell::new(s.into())))
    }

    pub fn array_from_values(values: Vec<Value>) -> Value {
        let mut data = ArrayData::new();
        for (i, v) in values.into_iter().enumerate() {
            data.insert(ArrayKey(Value::Int(i as i64)), v);
        }
        Value::Array(Rc::new(RefCell::new(data)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Iterator(_) => "iterator",
            Value::Function(_) => "function",
        }
    }

    /// Truthiness: false for `Null`, `false`, numeric zero, and the empty
    /// string; true for everything else.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.borrow().is_empty(),
            Value::Array(a) => !a.borrow().is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Iterator(_) | Value::Function(_) => true,
        }
    }

    /// Coercion to number: Null->0; Bool->0/1; Int/Float->themselves;
    /// Str->parsed leading numeric prefix, 0 if none; everything else->0.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Str(s) => parse_leading_number(&s.borrow()),
            Value::Array(_) | Value::List(_) | Value::Iterator(_) | Value::Function(_) => 0.0,
        }
    }

    fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    fn get_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            other => other.to_number() as i64,
        }
    }

    /// Short string form, used by `print`, string coercion, and as the
    /// canonical form for array-key hashing/equality.
    pub fn str(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => {
                if *b {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.borrow().clone(),
            Value::Array(a) => {
                let iter = to_iterator(a);
                let mut state = match &iter {
                    Value::Iterator(it) => it.borrow_mut(),
                    _ => unreachable!(),
                };
                let mut parts = Vec::new();
                while let Some((k, v)) = state.next() {
                    parts.push(format!("{}: {}", k.str(), v.str()));
                }
                format!("[{}]", parts.join(", "))
            }
            Value::List(values) => {
                let parts: Vec<String> = values.iter().map(Value::str).collect();
                format!("({})", parts.join(", "))
            }
            Value::Iterator(_) => "Iterator".to_string(),
            Value::Function(f) => format!("Function({})", f.name),
        }
    }

    /// Appends `s` to a `Str` buffer in place. No-op on any other variant.
    pub fn append(&self, s: &str) {
        if let Value::Str(buf) = self {
            buf.borrow_mut().push_str(s);
        }
    }

    pub fn get(&self, key: &Value) -> RunResult<Value> {
        match self {
            Value::Array(a) => {
                let data = a.borrow();
                data.get(&ArrayKey(key.clone()))
                    .cloned()
                    .ok_or_else(|| RunError::MissingKey {
                        key: key.str(),
                        container: "Array",
                    })
            }
            Value::Str(s) => {
                let idx = key.get_int();
                let borrowed = s.borrow();
                let ch = borrowed
                    .as_bytes()
                    .get(idx as usize)
                    .copied()
                    .ok_or_else(|| RunError::MissingKey {
                        key: key.str(),
                        container: "String",
                    })?;
                Ok(Value::str_value((ch as char).to_string()))
            }
            Value::List(values) => {
                let idx = key.get_int();
                values
                    .get(idx as usize)
                    .cloned()
                    .ok_or_else(|| RunError::MissingKey {
                        key: key.str(),
                        container: "List",
                    })
            }
            _ => Err(RunError::MissingKey {
                key: key.str(),
                container: "Value",
            }),
        }
    }

    pub fn put(&self, key: Value, value: Value) -> RunResult<()> {
        match self {
            Value::Array(a) => {
                a.borrow_mut().insert(ArrayKey(key), value);
                Ok(())
            }
            _ => Err(RunError::MissingKey {
                key: key.str(),
                container: "Value",
            }),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

/// Parses the leading numeric prefix of `s` as a float, returning 0.0 if
/// there is no such prefix (permissive string-to-number coercion:
/// `"12abc"` -> `12`, `""` / `"abc"` -> `0`).
fn parse_leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let mut saw_digit = false;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        saw_digit = true;
        end = i;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        let mut saw_frac_digit = false;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
            saw_frac_digit = true;
        }
        if saw_frac_digit {
            end = j;
        }
    }
    if !saw_digit {
        return 0.0;
    }
    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// Builds a snapshot iterator over `array`'s current contents. Mutating
/// the array afterward does not affect the snapshot.
pub fn to_iterator(array: &Rc<RefCell<ArrayData>>) -> Value {
    let mut pairs: Vec<(Value, Value)> = array
        .borrow()
        .iter()
        .map(|(k, v)| (k.0.clone(), v.clone()))
        .collect();
    pairs.reverse();
    let cursor = pairs.len();
    Value::Iterator(Rc::new(RefCell::new(IteratorState { pairs, cursor })))
}

// ---------------------------------------------------------------------
// Arithmetic.
// ---------------------------------------------------------------------

/// `+`. If either operand is a string, coerces the right operand to its
/// string form and appends it to the left operand's buffer in place,
/// returning the (mutated) left operand. Otherwise Int+Int with overflow
/// promotion to Float, else Float addition on coerced numbers.
pub fn plus(left: &Value, right: &Value) -> Value {
    if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
        let appended = right.str();
        left.append(&appended);
        return left.clone();
    }
    if left.is_int() && right.is_int() {
        let (l, r) = (left.get_int(), right.get_int());
        return match l.checked_add(r) {
            Some(sum) => Value::Int(sum),
            None => Value::Float(l as f64 + r as f64),
        };
    }
    Value::Float(left.to_number() + right.to_number())
}

pub fn sub(left: &Value, right: &Value) -> Value {
    if left.is_int() && right.is_int() {
        let (l, r) = (left.get_int(), right.get_int());
        return match l.checked_sub(r) {
            Some(diff) => Value::Int(diff),
            None => Value::Float(l as f64 - r as f64),
        };
    }
    Value::Float(left.to_number() - right.to_number())
}

pub fn mult(left: &Value, right: &Value) -> Value {
    if left.is_int() && right.is_int() {
        let (l, r) = (left.get_int(), right.get_int());
        return match l.checked_mul(r) {
            Some(prod) => Value::Int(prod),
            None => Value::Float(l as f64 * r as f64),
        };
    }
    Value::Float(left.to_number() * right.to_number())
}

/// `/`. Always float division on coerced numbers; returns Int if the
/// result is exactly integral, else Float.
pub fn division(left: &Value, right: &Value) -> Value {
    let result = left.to_number() / right.to_number();
    if result.is_finite() && result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
        Value::Int(result as i64)
    } else {
        Value::Float(result)
    }
}

/// `%`. If the left operand is zero, returns the left operand unchanged.
/// Division by zero on the right raises (see DESIGN.md Open Question 1).
pub fn modulo(left: &Value, right: &Value) -> RunResult<Value> {
    let l = left.get_int();
    if l == 0 {
        return Ok(left.clone());
    }
    let r = right.get_int();
    if r == 0 {
        return Err(RunError::DivisionByZero);
    }
    if r == -1 {
        // l.checked_rem(-1) is always Some(0), but i64::MIN.checked_rem(-1)
        // would overflow in the underlying division; shortcut it.
        return Ok(Value::Int(0));
    }
    Ok(Value::Int(l % r))
}

pub fn increment(left: &Value, by: i64) -> Value {
    if left.is_int() {
        return match left.get_int().checked_add(by) {
            Some(v) => Value::Int(v),
            None => Value::Float(left.get_int() as f64 + by as f64),
        };
    }
    plus(left, &Value::Int(by))
}

pub fn decrement(left: &Value, by: i64) -> Value {
    if left.is_int() {
        return match left.get_int().checked_sub(by) {
            Some(v) => Value::Int(v),
            None => Value::Float(left.get_int() as f64 - by as f64),
        };
    }
    sub(left, &Value::Int(by))
}

// ---------------------------------------------------------------------
// Comparison.
// ---------------------------------------------------------------------

use std::cmp::Ordering;

fn base_compare(x: &Value, y: &Value) -> Ordering {
    if x.is_int() && y.is_int() {
        return x.get_int().cmp(&y.get_int());
    }
    if x.is_number() && y.is_number() {
        return x
            .to_number()
            .partial_cmp(&y.to_number())
            .unwrap_or(Ordering::Equal);
    }
    x.str().cmp(&y.str())
}

pub fn compare_gt(x: &Value, y: &Value) -> bool {
    base_compare(x, y) == Ordering::Greater
}

pub fn compare_ge(x: &Value, y: &Value) -> bool {
    base_compare(x, y) != Ordering::Less
}

pub fn compare_lt(x: &Value, y: &Value) -> bool {
    compare_gt(y, x)
}

pub fn compare_le(x: &Value, y: &Value) -> bool {
    compare_ge(y, x)
}

pub fn compare_eq(x: &Value, y: &Value) -> bool {
    base_compare(x, y) == Ordering::Equal
}

pub fn compare_neq(x: &Value, y: &Value) -> bool {
    !compare_eq(x, y)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        compare_eq(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.str())
    }
}
