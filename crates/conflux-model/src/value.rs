//! The value algebra — spec §3 "Value", §4.B.
//!
//! [`Value`] is the bounded-lattice element that conjuncts evaluate to.
//! [`unify`] is the meet operator: commutative, associative, idempotent,
//! with [`Value::Bottom`] absorbing and [`Value::Top`] as identity.
//!
//! Conjuncts that can't be resolved down to a single concrete value yet
//! (a bare `int`, an unattached `>0`, a builtin validator) accumulate in
//! [`Value::Conjunction`] until a concrete scalar arrives to collapse them
//! or a later conjunct proves them contradictory.

use crate::error::Bottom;
use crate::kind::Kind;
use std::cmp::Ordering;

/// A scalar literal. `Int` and `Float` are kept distinct (rather than one
/// `f64`) so that `3` and `3.0` remain different kinds under unification.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Literal {
    pub fn kind(&self) -> Kind {
        match self {
            Literal::Null => Kind::NULL,
            Literal::Bool(_) => Kind::BOOL,
            Literal::Int(_) => Kind::INT,
            Literal::Float(_) => Kind::FLOAT,
            Literal::Str(_) => Kind::STRING,
            Literal::Bytes(_) => Kind::BYTES,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Ordering used by bound simplification and comparison operators.
    /// `None` when the two literals aren't order-comparable (different
    /// non-numeric kinds, or NaN involved).
    fn partial_compare(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::Str(a), Literal::Str(b)) => Some(a.cmp(b)),
            (Literal::Bytes(a), Literal::Bytes(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

/// Open or closed list marker, §3 "Non-scalar variants".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ListOpenness {
    Open,
    Closed,
}

/// A relational bound operator, §3 "bound(op, value)".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelOp {
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    Match,
    NotMatch,
}

/// A builtin validator. The language-level name (`strings.MinRunes`, ...)
/// is resolved to one of these concrete variants upstream of CORE; by the
/// time a `Value::Validator` exists here it's already fully applied to
/// its static arguments and only needs a candidate scalar to check.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuiltinValidator {
    MinLen(i64),
    MaxLen(i64),
    Regexp(String),
    Contains(String),
}

impl BuiltinValidator {
    fn accepts(&self, lit: &Literal) -> bool {
        match (self, lit) {
            (BuiltinValidator::MinLen(n), Literal::Str(s)) => s.chars().count() as i64 >= *n,
            (BuiltinValidator::MinLen(n), Literal::Bytes(b)) => b.len() as i64 >= *n,
            (BuiltinValidator::MaxLen(n), Literal::Str(s)) => s.chars().count() as i64 <= *n,
            (BuiltinValidator::MaxLen(n), Literal::Bytes(b)) => b.len() as i64 <= *n,
            (BuiltinValidator::Regexp(pat), Literal::Str(s)) => naive_glob_match(pat, s),
            (BuiltinValidator::Contains(needle), Literal::Str(s)) => s.contains(needle.as_str()),
            _ => false,
        }
    }
}

/// Crude substring/pattern check standing in for a real regex engine — the
/// regex crate itself is an external-interface concern (§6), not part of
/// the value algebra. Supports only a literal match or a trailing `*`.
fn naive_glob_match(pattern: &str, s: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => s.starts_with(prefix),
        None => s == pattern,
    }
}

/// The value lattice element. See spec §3 "Value".
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The least element; absorbs everything.
    Bottom(Bottom),
    /// The greatest element; identity for unification.
    Top,
    /// An unconstrained basic type, e.g. bare `int` or `string`.
    BasicType(Kind),
    /// A concrete scalar.
    Scalar(Literal),
    /// The unconstrained struct type; field contents live on the vertex's
    /// arcs, not in the value itself.
    StructMarker,
    /// The unconstrained list type; element contents live on the vertex's
    /// integer-labeled arcs.
    ListMarker(ListOpenness),
    /// A relational bound, e.g. `>0` or `=~"^a"`.
    Bound(RelOp, Box<Value>),
    /// A builtin validator pending a scalar to check.
    Validator(BuiltinValidator),
    /// An unresolved accumulation of non-scalar constraints (bounds,
    /// basic types, validators) still waiting for a concrete scalar, or
    /// proven mutually compatible but not reducible to one variant.
    Conjunction(Vec<Value>),
    /// `values[..num_defaults]` are the default branches; the rest are
    /// plain. See §4.G.
    Disjunction(Vec<Value>, usize),
}

impl Value {
    pub fn int(n: i64) -> Value {
        Value::Scalar(Literal::Int(n))
    }

    pub fn float(f: f64) -> Value {
        Value::Scalar(Literal::Float(f))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::Scalar(Literal::Str(s.into()))
    }

    pub fn bool(b: bool) -> Value {
        Value::Scalar(Literal::Bool(b))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Bottom(_) => Kind::BOTTOM,
            Value::Top => Kind::TOP,
            Value::BasicType(k) => *k,
            Value::Scalar(lit) => lit.kind(),
            Value::StructMarker => Kind::STRUCT,
            Value::ListMarker(_) => Kind::LIST,
            Value::Bound(_, inner) => inner.kind(),
            Value::Validator(_) => Kind::STRING | Kind::BYTES,
            Value::Conjunction(parts) => parts
                .iter()
                .fold(Kind::TOP, |acc, p| acc.meet(p.kind())),
            Value::Disjunction(parts, _) => parts
                .iter()
                .fold(Kind::BOTTOM, |acc, p| acc.join(p.kind())),
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Value::Bottom(_))
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Value::Scalar(_) | Value::StructMarker | Value::ListMarker(_))
    }
}

/// The meet operator. Commutative, associative, idempotent; `Bottom`
/// absorbs, `Top` is identity.
pub fn unify(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Bottom(x), Value::Bottom(y)) => Value::Bottom(x.clone().merge(y.clone())),
        (Value::Bottom(_), _) => a.clone(),
        (_, Value::Bottom(_)) => b.clone(),
        (Value::Top, _) => b.clone(),
        (_, Value::Top) => a.clone(),
        (Value::Disjunction(parts, defaults), other) => unify_disjunction(parts, *defaults, other),
        (other, Value::Disjunction(parts, defaults)) => unify_disjunction(parts, *defaults, other),
        _ => {
            let mut pieces = flatten(a.clone());
            pieces.extend(flatten(b.clone()));
            reduce_pieces(pieces)
        }
    }
}

fn flatten(v: Value) -> Vec<Value> {
    match v {
        Value::Conjunction(parts) => parts.into_iter().flat_map(flatten).collect(),
        other => vec![other],
    }
}

fn unify_disjunction(parts: &[Value], num_defaults: usize, other: &Value) -> Value {
    // U1, §4.G: unification distributes over a disjunction's branches.
    // The branch's default-ness is preserved positionally, but a branch
    // that collapses to bottom is dropped rather than carried along —
    // otherwise a later conjunct folding against this result would see a
    // dead branch sitting in the default slot.
    let mut defaults = Vec::new();
    let mut plain = Vec::new();
    for (i, p) in parts.iter().enumerate() {
        let merged = unify(p, other);
        if merged.is_bottom() {
            continue;
        }
        if i < num_defaults {
            defaults.push(merged);
        } else {
            plain.push(merged);
        }
    }
    if defaults.is_empty() && plain.is_empty() {
        return Value::Bottom(Bottom::eval_error(
            "all disjunction branches conflict with the unified value",
        ));
    }
    if defaults.len() == 1 && plain.is_empty() {
        return defaults.into_iter().next().unwrap();
    }
    if defaults.is_empty() && plain.len() == 1 {
        return plain.into_iter().next().unwrap();
    }
    let num_defaults = defaults.len();
    defaults.extend(plain);
    Value::Disjunction(defaults, num_defaults)
}

/// Repeatedly tries to fold pairs of pieces together until no pair
/// simplifies further, then collapses the result.
fn reduce_pieces(mut pieces: Vec<Value>) -> Value {
    loop {
        let mut simplified = None;
        'search: for i in 0..pieces.len() {
            for j in (i + 1)..pieces.len() {
                if let Some(result) = pairwise_simplify(&pieces[i], &pieces[j]) {
                    simplified = Some((i, j, result));
                    break 'search;
                }
            }
        }
        match simplified {
            Some((i, j, result)) => {
                // Remove the higher index first so the lower index stays valid.
                pieces.remove(j);
                pieces.remove(i);
                pieces.extend(flatten(result));
            }
            None => break,
        }
    }

    if let Some(bottom) = pieces.iter().find_map(|p| match p {
        Value::Bottom(b) => Some(b.clone()),
        _ => None,
    }) {
        return Value::Bottom(bottom);
    }

    match pieces.len() {
        0 => Value::Top,
        1 => pieces.into_iter().next().unwrap(),
        _ => Value::Conjunction(dedup(pieces)),
    }
}

fn dedup(pieces: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(pieces.len());
    for p in pieces {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/// Try to combine two non-conjunction pieces into one. `None` means they
/// should remain as separate, unresolved conjuncts.
fn pairwise_simplify(x: &Value, y: &Value) -> Option<Value> {
    use Value::*;
    match (x, y) {
        (Bound(op1, v1), Bound(op2, v2)) => Some(simplify_bounds(*op1, v1, *op2, v2)),
        (Bound(op, bound_val), Scalar(lit)) | (Scalar(lit), Bound(op, bound_val)) => {
            Some(validate_bound(*op, bound_val, lit))
        }
        (BasicType(k1), BasicType(k2)) => {
            let m = k1.meet(*k2);
            Some(if m.is_bottom() {
                Value::Bottom(Bottom::eval_error(format!(
                    "conflicting basic types: {:?} and {:?}",
                    k1, k2
                )))
            } else {
                Value::BasicType(m)
            })
        }
        (BasicType(k), Scalar(lit)) | (Scalar(lit), BasicType(k)) => {
            Some(if k.intersects(lit.kind()) {
                Value::Scalar(lit.clone())
            } else {
                Value::Bottom(Bottom::eval_error(format!(
                    "{:?} is not a member of {:?}",
                    lit, k
                )))
            })
        }
        (BasicType(k), Bound(_, bound_val)) | (Bound(_, bound_val), BasicType(k)) => {
            if k.intersects(bound_val.kind()) {
                None
            } else {
                Some(Value::Bottom(Bottom::eval_error(
                    "bound's operand kind is incompatible with the basic type",
                )))
            }
        }
        (Scalar(l1), Scalar(l2)) => Some(if l1 == l2 {
            Value::Scalar(l1.clone())
        } else {
            Value::Bottom(Bottom::eval_error(format!(
                "incompatible values: {:?} and {:?}",
                l1, l2
            )))
        }),
        (StructMarker, StructMarker) => Some(Value::StructMarker),
        (ListMarker(a), ListMarker(b)) => Some(Value::ListMarker(match (a, b) {
            (ListOpenness::Closed, _) | (_, ListOpenness::Closed) => ListOpenness::Closed,
            (ListOpenness::Open, ListOpenness::Open) => ListOpenness::Open,
        })),
        (Validator(v), Scalar(lit)) | (Scalar(lit), Validator(v)) => Some(if v.accepts(lit) {
            Value::Scalar(lit.clone())
        } else {
            Value::Bottom(Bottom::user_error(format!(
                "{:?} rejects value {:?}",
                v, lit
            )))
        }),
        // Kind-incompatible non-scalar markers conflict outright.
        (StructMarker | ListMarker(_), other) | (other, StructMarker | ListMarker(_))
            if matches!(other, Scalar(_) | BasicType(_)) && !x.kind().intersects(y.kind()) =>
        {
            Some(Value::Bottom(Bottom::eval_error(
                "conflicting struct/list and scalar kinds",
            )))
        }
        _ => None,
    }
}

/// validate(bound, scalar): bottom if rejected, the scalar if accepted.
fn validate_bound(op: RelOp, bound_operand: &Value, lit: &Literal) -> Value {
    let Value::Scalar(bound_lit) = bound_operand else {
        // An unevaluated bound operand; nothing to check yet.
        return Value::Conjunction(vec![Value::Bound(op, Box::new(bound_operand.clone())), Value::Scalar(lit.clone())]);
    };
    let ok = match op {
        RelOp::Match => match (bound_lit, lit) {
            (Literal::Str(pat), Literal::Str(s)) => naive_glob_match(pat, s),
            _ => false,
        },
        RelOp::NotMatch => match (bound_lit, lit) {
            (Literal::Str(pat), Literal::Str(s)) => !naive_glob_match(pat, s),
            _ => false,
        },
        RelOp::Ne => lit != bound_lit,
        _ => match lit.partial_compare(bound_lit) {
            Some(ord) => match op {
                RelOp::Lt => ord == Ordering::Less,
                RelOp::Le => ord != Ordering::Greater,
                RelOp::Gt => ord == Ordering::Greater,
                RelOp::Ge => ord != Ordering::Less,
                RelOp::Ne | RelOp::Match | RelOp::NotMatch => unreachable!(),
            },
            None => false,
        },
    };
    if ok {
        Value::Scalar(lit.clone())
    } else {
        Value::Bottom(Bottom::eval_error(format!(
            "{:?} does not satisfy bound {:?} {:?}",
            lit, op, bound_lit
        )))
    }
}

/// simplify_bounds: the ordering rules from §4.B. Falls back to keeping
/// both bounds as a pending conjunction when no rule applies.
fn simplify_bounds(op1: RelOp, v1: &Value, op2: RelOp, v2: &Value) -> Value {
    let (Value::Scalar(a), Value::Scalar(b)) = (v1, v2) else {
        return Value::Conjunction(vec![
            Value::Bound(op1, Box::new(v1.clone())),
            Value::Bound(op2, Box::new(v2.clone())),
        ]);
    };
    let Some(ord) = a.partial_compare(b) else {
        return Value::Conjunction(vec![
            Value::Bound(op1, Box::new(v1.clone())),
            Value::Bound(op2, Box::new(v2.clone())),
        ]);
    };

    let keep = |op: RelOp, lit: &Literal| Value::Bound(op, Box::new(Value::Scalar(lit.clone())));

    match (op1, op2) {
        // Two upper bounds: tighter threshold wins; equal threshold, Lt wins.
        (RelOp::Lt | RelOp::Le, RelOp::Lt | RelOp::Le) => match ord {
            Ordering::Less => keep(op1, a),
            Ordering::Greater => keep(op2, b),
            Ordering::Equal => keep(
                if op1 == RelOp::Lt || op2 == RelOp::Lt {
                    RelOp::Lt
                } else {
                    RelOp::Le
                },
                a,
            ),
        },
        // Two lower bounds: tighter (larger) threshold wins; equal, Gt wins.
        (RelOp::Gt | RelOp::Ge, RelOp::Gt | RelOp::Ge) => match ord {
            Ordering::Greater => keep(op1, a),
            Ordering::Less => keep(op2, b),
            Ordering::Equal => keep(
                if op1 == RelOp::Gt || op2 == RelOp::Gt {
                    RelOp::Gt
                } else {
                    RelOp::Ge
                },
                a,
            ),
        },
        // A lower and an upper bound that pin down a single point collapse
        // to an exact scalar; disjoint ranges conflict outright.
        (RelOp::Ge, RelOp::Le) | (RelOp::Le, RelOp::Ge) if ord == Ordering::Equal => {
            Value::Scalar(a.clone())
        }
        (RelOp::Lt | RelOp::Le, RelOp::Gt | RelOp::Ge)
        | (RelOp::Gt | RelOp::Ge, RelOp::Lt | RelOp::Le) => {
            let (lower_op, lower, upper_op, upper) = if matches!(op1, RelOp::Gt | RelOp::Ge) {
                (op1, a, op2, b)
            } else {
                (op2, b, op1, a)
            };
            let lower_excl = lower_op == RelOp::Gt;
            let upper_excl = upper_op == RelOp::Lt;
            let lo_cmp_hi = lower.partial_compare(upper).unwrap();
            let disjoint = match lo_cmp_hi {
                Ordering::Greater => true,
                Ordering::Equal => lower_excl || upper_excl,
                Ordering::Less => false,
            };
            if disjoint {
                Value::Bottom(Bottom::eval_error("disjoint bounds"))
            } else {
                Value::Conjunction(vec![
                    Value::Bound(op1, Box::new(Value::Scalar(a.clone()))),
                    Value::Bound(op2, Box::new(Value::Scalar(b.clone()))),
                ])
            }
        }
        // `!=a & <=a` => `<a`; `!=a & >=a` => `>a` (equality excluded twice).
        (RelOp::Ne, RelOp::Le) | (RelOp::Le, RelOp::Ne) if ord == Ordering::Equal => {
            keep(RelOp::Lt, a)
        }
        (RelOp::Ne, RelOp::Ge) | (RelOp::Ge, RelOp::Ne) if ord == Ordering::Equal => {
            keep(RelOp::Gt, a)
        }
        // `!=a & >a` / `!=a & <a`: the strict bound already excludes a.
        (RelOp::Ne, RelOp::Gt) | (RelOp::Gt, RelOp::Ne) if ord == Ordering::Equal => {
            keep(RelOp::Gt, a)
        }
        (RelOp::Ne, RelOp::Lt) | (RelOp::Lt, RelOp::Ne) if ord == Ordering::Equal => {
            keep(RelOp::Lt, a)
        }
        // `!=x & >=y` with x<y: every value >=y is already != x.
        (RelOp::Ne, RelOp::Ge) => {
            let (x, y, keep_op, keep_val) = (a, b, op2, b);
            if x.partial_compare(y) == Some(Ordering::Less) {
                keep(keep_op, keep_val)
            } else {
                Value::Conjunction(vec![
                    Value::Bound(op1, Box::new(v1.clone())),
                    Value::Bound(op2, Box::new(v2.clone())),
                ])
            }
        }
        (RelOp::Ge, RelOp::Ne) => simplify_bounds(op2, v2, op1, v1),
        (RelOp::Ne, RelOp::Ne) if a == b => keep(RelOp::Ne, a),
        _ => Value::Conjunction(vec![
            Value::Bound(op1, Box::new(v1.clone())),
            Value::Bound(op2, Box::new(v2.clone())),
        ]),
    }
}

/// Classical arithmetic/comparison operators for expr evaluation, §4.B.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// binop(op, x, y): returns `bottom(incomplete)` if either operand is not
/// yet a concrete scalar.
pub fn binop(op: ArithOp, x: &Value, y: &Value) -> Value {
    let (Value::Scalar(lx), Value::Scalar(ly)) = (x, y) else {
        return Value::Bottom(Bottom::incomplete(
            "binary operation on a non-concrete operand",
        ));
    };
    use ArithOp::*;
    match op {
        Eq => return Value::bool(lx == ly),
        Ne => return Value::bool(lx != ly),
        Lt | Le | Gt | Ge => {
            return match lx.partial_compare(ly) {
                Some(ord) => Value::bool(match op {
                    Lt => ord == Ordering::Less,
                    Le => ord != Ordering::Greater,
                    Gt => ord == Ordering::Greater,
                    Ge => ord != Ordering::Less,
                    _ => unreachable!(),
                }),
                None => Value::Bottom(Bottom::eval_error("operands are not comparable")),
            };
        }
        _ => {}
    }
    match (lx, ly) {
        (Literal::Str(a), Literal::Str(b)) if op == Add => Value::string(format!("{a}{b}")),
        (Literal::Int(a), Literal::Int(b)) => match op {
            Add => Value::int(a.wrapping_add(*b)),
            Sub => Value::int(a.wrapping_sub(*b)),
            Mul => Value::int(a.wrapping_mul(*b)),
            Div if *b != 0 => Value::int(a / b),
            Mod if *b != 0 => Value::int(a % b),
            Div | Mod => Value::Bottom(Bottom::eval_error("division by zero")),
            _ => unreachable!(),
        },
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => match op {
                Add => Value::float(a + b),
                Sub => Value::float(a - b),
                Mul => Value::float(a * b),
                Div if b != 0.0 => Value::float(a / b),
                Div => Value::Bottom(Bottom::eval_error("division by zero")),
                Mod => Value::float(a % b),
                _ => unreachable!(),
            },
            _ => Value::Bottom(Bottom::eval_error(format!(
                "operator {op:?} is not defined for {lx:?} and {ly:?}"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unify_is_commutative_for_scalars() {
        let a = Value::int(3);
        let b = Value::int(3);
        assert_eq!(unify(&a, &b), unify(&b, &a));
    }

    #[test]
    fn unify_is_idempotent() {
        let a = Value::BasicType(Kind::INT);
        assert_eq!(unify(&a, &a), a);
    }

    #[test]
    fn top_is_identity() {
        let a = Value::int(5);
        assert_eq!(unify(&a, &Value::Top), a);
        assert_eq!(unify(&Value::Top, &a), a);
    }

    #[test]
    fn bottom_absorbs() {
        let b = Value::Bottom(Bottom::eval_error("boom"));
        assert!(unify(&b, &Value::int(1)).is_bottom());
    }

    #[test]
    fn basic_type_and_bound_and_scalar_collapse_to_scalar() {
        // a: int, a: >0, a: 3 -> 3
        let int_ty = Value::BasicType(Kind::INT);
        let bound = Value::Bound(RelOp::Gt, Box::new(Value::int(0)));
        let three = Value::int(3);

        let step1 = unify(&int_ty, &bound);
        let step2 = unify(&step1, &three);
        assert_eq!(step2, Value::int(3));

        // Order independence.
        let alt = unify(&unify(&bound, &three), &int_ty);
        assert_eq!(alt, Value::int(3));
    }

    #[test]
    fn bound_rejects_out_of_range_scalar() {
        let bound = Value::Bound(RelOp::Gt, Box::new(Value::int(0)));
        let result = unify(&bound, &Value::int(-1));
        assert!(result.is_bottom());
    }

    #[test]
    fn conflicting_scalars_are_eval_error() {
        let result = unify(&Value::int(2), &Value::int(3));
        match result {
            Value::Bottom(b) => assert_eq!(b.code, crate::error::BottomCode::EvalError),
            other => panic!("expected bottom, got {other:?}"),
        }
    }

    #[test]
    fn two_upper_bounds_keep_tighter() {
        let lt5 = Value::Bound(RelOp::Lt, Box::new(Value::int(5)));
        let le3 = Value::Bound(RelOp::Le, Box::new(Value::int(3)));
        assert_eq!(unify(&lt5, &le3), le3);
    }

    #[test]
    fn ne_and_le_same_value_tightens_to_lt() {
        let ne = Value::Bound(RelOp::Ne, Box::new(Value::int(5)));
        let le = Value::Bound(RelOp::Le, Box::new(Value::int(5)));
        assert_eq!(unify(&ne, &le), Value::Bound(RelOp::Lt, Box::new(Value::int(5))));
    }

    #[test]
    fn disjoint_bounds_conflict() {
        let gt5 = Value::Bound(RelOp::Gt, Box::new(Value::int(5)));
        let lt3 = Value::Bound(RelOp::Lt, Box::new(Value::int(3)));
        assert!(unify(&gt5, &lt3).is_bottom());
    }

    #[test]
    fn ge_and_le_pin_to_equality() {
        let ge = Value::Bound(RelOp::Ge, Box::new(Value::int(3)));
        let le = Value::Bound(RelOp::Le, Box::new(Value::int(3)));
        assert_eq!(unify(&ge, &le), Value::int(3));
    }

    #[test]
    fn disjunction_distributes_over_unify() {
        let d = Value::Disjunction(vec![Value::int(1), Value::int(2), Value::int(3)], 1);
        let result = unify(&d, &Value::BasicType(Kind::INT));
        match result {
            Value::Disjunction(parts, defaults) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(defaults, 1);
            }
            other => panic!("expected disjunction, got {other:?}"),
        }
    }

    #[test]
    fn binop_arithmetic() {
        assert_eq!(binop(ArithOp::Add, &Value::int(2), &Value::int(3)), Value::int(5));
        assert!(binop(ArithOp::Div, &Value::int(1), &Value::int(0)).is_bottom());
    }

    #[test]
    fn binop_on_non_concrete_is_incomplete() {
        let pending = Value::BasicType(Kind::INT);
        let result = binop(ArithOp::Add, &pending, &Value::int(1));
        match result {
            Value::Bottom(b) => assert_eq!(b.code, crate::error::BottomCode::Incomplete),
            other => panic!("expected incomplete bottom, got {other:?}"),
        }
    }

    #[test]
    fn validator_rejects_short_string() {
        let v = Value::Validator(BuiltinValidator::MinLen(3));
        assert!(unify(&v, &Value::string("ab")).is_bottom());
        assert_eq!(unify(&v, &Value::string("abc")), Value::string("abc"));
    }
}
