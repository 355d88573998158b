//! The expression tree — spec §6 node-kind list.
//!
//! CORE never builds these trees itself (the parser/compiler that would
//! is out of scope, §1); it only walks ones handed to it. Every node
//! carries a [`Position`] so bottoms and diagnostics can point back at
//! source. Subtrees are `Rc`-shared rather than owned, since the same
//! expression commonly appears as a conjunct in many environments (a
//! referenced definition unified at several call sites, a comprehension
//! body evaluated once per iteration).

use crate::value::{ArithOp, BuiltinValidator, RelOp};
use conflux_core::{Feature, Position, Symbol};
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpPart {
    Lit(String),
    Expr(Rc<Expr>),
}

/// One field declaration inside a [`Expr::StructLit`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldDecl {
    /// `foo: v` or, with `optional`, `foo?: v`.
    Field {
        label: Feature,
        optional: bool,
        value: Rc<Expr>,
        pos: Position,
    },
    /// `[pattern]: v` — a bulk optional field.
    BulkOptional {
        pattern: Rc<Expr>,
        value: Rc<Expr>,
        pos: Position,
    },
    /// `(expr): v` — a dynamic field whose label is itself computed.
    Dynamic {
        label_expr: Rc<Expr>,
        value: Rc<Expr>,
        pos: Position,
    },
    /// An embedded expression spliced directly into the struct.
    Embedding { expr: Rc<Expr>, pos: Position },
    /// `let x = v` scoped to the remainder of the struct.
    Let {
        name: Symbol,
        value: Rc<Expr>,
        pos: Position,
    },
}

impl FieldDecl {
    pub fn pos(&self) -> Position {
        match self {
            FieldDecl::Field { pos, .. }
            | FieldDecl::BulkOptional { pos, .. }
            | FieldDecl::Dynamic { pos, .. }
            | FieldDecl::Embedding { pos, .. }
            | FieldDecl::Let { pos, .. } => *pos,
        }
    }
}

/// An expression-tree node.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    Null(Position),
    Bool(bool, Position),
    Int(i64, Position),
    Float(f64, Position),
    Str(String, Position),
    Bytes(Vec<u8>, Position),
    /// A bare basic type, e.g. `int` or `string`.
    BasicType(crate::kind::Kind, Position),
    Top(Position),
    /// An explicit `_|_` literal in source.
    BottomLit(Position),

    StructLit {
        fields: Vec<FieldDecl>,
        ellipsis: bool,
        /// Whether this literal is a definition body (the value side of
        /// a `#Foo: {...}` declaration) rather than an ordinary struct.
        /// Only definition bodies — and structs that embed one — close
        /// themselves off to their declared fields; see §4.E.
        is_definition: bool,
        pos: Position,
    },
    ListLit {
        elems: Vec<Rc<Expr>>,
        ellipsis: bool,
        pos: Position,
    },

    Binary {
        op: ArithOp,
        lhs: Rc<Expr>,
        rhs: Rc<Expr>,
        pos: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Rc<Expr>,
        pos: Position,
    },
    Bound {
        op: RelOp,
        operand: Rc<Expr>,
        pos: Position,
    },
    Call {
        builtin: BuiltinValidator,
        pos: Position,
    },
    Interpolation {
        parts: Vec<InterpPart>,
        pos: Position,
    },

    /// An unqualified reference, resolved lexically via the environment
    /// chain (§4.D).
    FieldRef { name: Feature, pos: Position },
    /// `base.field`.
    Selector {
        base: Rc<Expr>,
        field: Feature,
        pos: Position,
    },
    /// `base[index]`.
    Index {
        base: Rc<Expr>,
        index: Rc<Expr>,
        pos: Position,
    },

    Let {
        name: Symbol,
        value: Rc<Expr>,
        body: Rc<Expr>,
        pos: Position,
    },
    If {
        cond: Rc<Expr>,
        body: Rc<Expr>,
        pos: Position,
    },
    /// `for k, v in source { body }`; `key` is absent for `for v in source`.
    For {
        key: Option<Symbol>,
        value: Symbol,
        source: Rc<Expr>,
        body: Rc<Expr>,
        pos: Position,
    },

    Disjunction {
        terms: Vec<Rc<Expr>>,
        num_defaults: usize,
        pos: Position,
    },
    /// A standalone embedding at statement position (distinct from
    /// [`FieldDecl::Embedding`], which is scoped to one struct).
    Embedding { expr: Rc<Expr>, pos: Position },
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Null(p)
            | Expr::Bool(_, p)
            | Expr::Int(_, p)
            | Expr::Float(_, p)
            | Expr::Str(_, p)
            | Expr::Bytes(_, p)
            | Expr::BasicType(_, p)
            | Expr::Top(p)
            | Expr::BottomLit(p)
            | Expr::StructLit { pos: p, .. }
            | Expr::ListLit { pos: p, .. }
            | Expr::Binary { pos: p, .. }
            | Expr::Unary { pos: p, .. }
            | Expr::Bound { pos: p, .. }
            | Expr::Call { pos: p, .. }
            | Expr::Interpolation { pos: p, .. }
            | Expr::FieldRef { pos: p, .. }
            | Expr::Selector { pos: p, .. }
            | Expr::Index { pos: p, .. }
            | Expr::Let { pos: p, .. }
            | Expr::If { pos: p, .. }
            | Expr::For { pos: p, .. }
            | Expr::Disjunction { pos: p, .. }
            | Expr::Embedding { pos: p, .. } => *p,
        }
    }
}
