use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

/// Stable identity for expressions the resolver binds to a scope depth.
///
/// Two structurally identical `Variable` nodes can resolve to different
/// depths, so the depth side-table is keyed by identity rather than content.
/// Ids come from a process-wide counter so that nodes parsed on later REPL
/// lines never collide with ones still alive inside closures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub enum Expr {
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    Get {
        object: Box<Expr>,
        name: Token,
    },

    Grouping(Box<Expr>),

    // Carries the literal token itself; the interpreter reads the payload.
    Literal(Token),

    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },
}
