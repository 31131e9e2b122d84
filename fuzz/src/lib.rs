use arbitrary::Arbitrary;
use xgettext_go::syntax;

/// Wrapper enum for generating arbitrary `Expr`s.
#[derive(Arbitrary, Debug)]
pub enum Expr {
    Literal(String),
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Other { kind: String, text: String },
}

impl From<Expr> for syntax::Expr {
    fn from(other: Expr) -> syntax::Expr {
        match other {
            Expr::Literal(raw) => syntax::Expr::Literal(raw),
            Expr::Binary { op, left, right } => syntax::Expr::Binary {
                op,
                left: Box::new((*left).into()),
                right: Box::new((*right).into()),
            },
            Expr::Other { kind, text } => syntax::Expr::Other { kind, text },
        }
    }
}
