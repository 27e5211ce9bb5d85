//! The low-level tree synthesized by the builder.
//!
//! Every node built through the package carries one of these as its
//! representation. The tree is plain data: types are already rendered to
//! text, names are already resolved, and nothing here refers back to the
//! type universe, so an emission backend can serialize it on its own.
//!
//! [`Expr`] implements `Display` in host notation; diagnostics use it to name
//! the offending construct.

use std::fmt;

use stagegen_core::{BinaryOp, ConstValue, UnaryOp};

// ============================================================================
// Expressions
// ============================================================================

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    BasicLit(ConstValue),
    /// A type in operand position (`make([]int, n)`).
    TypeName(String),
    Unary {
        op: UnaryOp,
        x: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        /// The last argument is spread (`f(xs...)`).
        ellipsis: bool,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    /// `x[low:high]` or, with `max`, `x[low:high:max]`.
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    Star(Box<Expr>),
    Selector {
        x: Box<Expr>,
        sel: String,
    },
    FuncLit(Box<FuncLit>),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    /// The called function's expression, for call nodes.
    pub fn callee(&self) -> Option<&Expr> {
        match self {
            Expr::Call { fun, .. } => Some(fun),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } | Expr::Star(_) => 6,
            _ => 7,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

fn fmt_opt(f: &mut fmt::Formatter<'_>, e: &Option<Box<Expr>>) -> fmt::Result {
    match e {
        Some(e) => write!(f, "{e}"),
        None => Ok(()),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::BasicLit(value) => write!(f, "{value}"),
            Expr::TypeName(name) => f.write_str(name),
            Expr::Unary { op, x } => {
                f.write_str(op.as_str())?;
                x.fmt_operand(f, 6)
            }
            Expr::Binary { op, x, y } => {
                let p = op.precedence();
                x.fmt_operand(f, p)?;
                write!(f, " {op} ")?;
                y.fmt_operand(f, p + 1)
            }
            Expr::Call {
                fun,
                args,
                ellipsis,
            } => {
                fun.fmt_operand(f, 7)?;
                f.write_str("(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                if *ellipsis {
                    f.write_str("...")?;
                }
                f.write_str(")")
            }
            Expr::Index { x, index } => {
                x.fmt_operand(f, 7)?;
                write!(f, "[{index}]")
            }
            Expr::Slice { x, low, high, max } => {
                x.fmt_operand(f, 7)?;
                f.write_str("[")?;
                fmt_opt(f, low)?;
                f.write_str(":")?;
                fmt_opt(f, high)?;
                if max.is_some() {
                    f.write_str(":")?;
                    fmt_opt(f, max)?;
                }
                f.write_str("]")
            }
            Expr::Star(x) => {
                f.write_str("*")?;
                x.fmt_operand(f, 6)
            }
            Expr::Selector { x, sel } => {
                x.fmt_operand(f, 7)?;
                write!(f, ".{sel}")
            }
            Expr::FuncLit(lit) => write!(f, "({} literal)", lit.typ),
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

/// `=` or `:=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTok {
    Assign,
    Define,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        lhs: Vec<Expr>,
        tok: AssignTok,
        rhs: Vec<Expr>,
    },
    /// `var name T = value`
    VarDecl {
        name: String,
        typ: Option<String>,
        value: Option<Expr>,
    },
    Expr(Expr),
    IncDec {
        x: Expr,
        inc: bool,
    },
    Block(Block),
    If(Box<IfStmt>),
    For(Box<ForStmt>),
    Range(Box<RangeStmt>),
    Return(Vec<Expr>),
}

/// A braced statement list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub init: Option<Stmt>,
    pub cond: Expr,
    pub body: Block,
    /// Either another `If` or a `Block`.
    pub else_branch: Option<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Stmt>,
    pub cond: Option<Expr>,
    pub post: Option<Stmt>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeStmt {
    pub key: Option<String>,
    pub value: Option<String>,
    pub tok: AssignTok,
    pub x: Expr,
    pub body: Block,
}

// ============================================================================
// Declarations
// ============================================================================

/// A named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub typ: String,
}

/// A function type with parameter names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<String>,
    pub variadic: bool,
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("func(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if !p.name.is_empty() {
                write!(f, "{} ", p.name)?;
            }
            f.write_str(&p.typ)?;
        }
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [one] => write!(f, " {one}"),
            many => write!(f, " ({})", many.join(", ")),
        }
    }
}

/// A top-level function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub doc: Option<String>,
    pub name: String,
    pub typ: FuncType,
    pub body: Block,
    pub operator: bool,
    pub shadow: bool,
    pub is_class: bool,
}

/// An anonymous function.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub typ: FuncType,
    pub body: Block,
}

/// The output of a package: everything an emission backend needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    pub package: String,
    pub imports: Vec<String>,
    pub decls: Vec<FuncDecl>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: i128) -> Box<Expr> {
        Box::new(Expr::BasicLit(ConstValue::Int(v)))
    }

    #[test]
    fn binary_parenthesizes_lower_precedence() {
        let sum = Expr::Binary {
            op: BinaryOp::Add,
            x: lit(1),
            y: lit(2),
        };
        let product = Expr::Binary {
            op: BinaryOp::Mul,
            x: Box::new(sum),
            y: lit(3),
        };
        assert_eq!(product.to_string(), "(1 + 2) * 3");
    }

    #[test]
    fn slice_forms() {
        let s = Expr::Slice {
            x: Box::new(Expr::ident("s")),
            low: Some(lit(1)),
            high: Some(lit(2)),
            max: Some(lit(3)),
        };
        assert_eq!(s.to_string(), "s[1:2:3]");
        let open = Expr::Slice {
            x: Box::new(Expr::ident("s")),
            low: None,
            high: Some(lit(2)),
            max: None,
        };
        assert_eq!(open.to_string(), "s[:2]");
    }

    #[test]
    fn call_with_selector() {
        let call = Expr::Call {
            fun: Box::new(Expr::Selector {
                x: Box::new(Expr::ident("log")),
                sel: "Panicf".into(),
            }),
            args: vec![
                Expr::BasicLit(ConstValue::String("%d".into())),
                Expr::ident("n"),
            ],
            ellipsis: false,
        };
        assert_eq!(call.to_string(), "log.Panicf(\"%d\", n)");
        assert_eq!(
            call.callee().map(ToString::to_string),
            Some("log.Panicf".into())
        );
    }

    #[test]
    fn func_type_display() {
        let typ = FuncType {
            params: vec![Param {
                name: "n".into(),
                typ: "int".into(),
            }],
            results: vec!["int".into(), "error".into()],
            variadic: false,
        };
        assert_eq!(typ.to_string(), "func(n int) (int, error)");
    }
}
