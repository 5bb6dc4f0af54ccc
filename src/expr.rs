//! The expression AST. A plain tagged union matched directly by the
//! resolver and interpreter — spec.md §9 recommends this over a visitor
//! indirection for a host language with sum types.

use crate::token::{Literal, Token};

/// Identifies one `Expr` node for the resolver's scope-distance side table.
/// Assigned once, at parse time; stable for the node's lifetime.
pub type ExprId = u32;

#[derive(Debug, Clone)]
pub enum Expr {
    Literal { id: ExprId, value: Literal },
    Unary { id: ExprId, operator: Token, right: Box<Expr> },
    Binary { id: ExprId, left: Box<Expr>, operator: Token, right: Box<Expr> },
    Logical { id: ExprId, left: Box<Expr>, operator: Token, right: Box<Expr> },
    Grouping { id: ExprId, expr: Box<Expr> },
    Variable { id: ExprId, name: Token },
    Assign { id: ExprId, name: Token, value: Box<Expr> },
    Call { id: ExprId, callee: Box<Expr>, paren: Token, arguments: Vec<Expr> },
    Get { id: ExprId, object: Box<Expr>, name: Token },
    Set { id: ExprId, object: Box<Expr>, name: Token, value: Box<Expr> },
    This { id: ExprId, keyword: Token },
    Super { id: ExprId, keyword: Token, method: Token },
}

impl Expr {
    pub fn id(&self) -> ExprId {
        match self {
            Expr::Literal { id, .. }
            | Expr::Unary { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Logical { id, .. }
            | Expr::Grouping { id, .. }
            | Expr::Variable { id, .. }
            | Expr::Assign { id, .. }
            | Expr::Call { id, .. }
            | Expr::Get { id, .. }
            | Expr::Set { id, .. }
            | Expr::This { id, .. }
            | Expr::Super { id, .. } => *id,
        }
    }
}
