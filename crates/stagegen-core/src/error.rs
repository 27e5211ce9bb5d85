//! Construction errors.
//!
//! Building a program fragment fails in one of two ways:
//!
//! - **Hard errors** abort the builder call and surface as `Err(BuildError)`.
//! - **Soft degradation** keeps the construction going with an Invalid-typed
//!   node; the diagnostic is still a [`BuildError`], but it is recorded by the
//!   package instead of returned.
//!
//! Every variant carries the [`Span`] of the node it was raised for, and
//! messages render as `at line:col: ...`.

use thiserror::Error;

use crate::Span;

/// Errors raised while constructing expressions, statements and functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Left and right arity differ.
    #[error("at {span}: assignment mismatch: {lhs} variables but {rhs} values")]
    AssignMismatch { lhs: usize, rhs: usize, span: Span },

    /// Left arity differs from the result count of a multi-valued call.
    #[error("at {span}: assignment mismatch: {lhs} variables but {caller} returns {rhs} values")]
    CallAssignMismatch {
        lhs: usize,
        caller: String,
        rhs: usize,
        span: Span,
    },

    /// An assignment target is not a reference.
    #[error("at {span}: lhs expression {expr} is unassignable")]
    Unassignable { expr: String, span: Span },

    /// A value cannot be assigned to a target type.
    #[error("at {span}: assignment mismatch: can't assign type {from} to {to}")]
    CannotAssign {
        from: String,
        to: String,
        span: Span,
    },

    /// An operation is structurally invalid for its operands.
    #[error("at {span}: invalid operation {expr} ({reason})")]
    InvalidOperation {
        expr: String,
        reason: String,
        span: Span,
    },

    /// Slicing an operand whose kind has no slice form.
    #[error("at {span}: cannot slice {expr} (type {typ})")]
    CannotSlice {
        expr: String,
        typ: String,
        span: Span,
    },

    /// A construct the builder deliberately does not handle yet.
    #[error("at {span}: {what} is not supported")]
    NotSupported { what: String, span: Span },

    /// A package-level symbol was registered twice.
    #[error("at {span}: duplicate definition '{name}'")]
    DuplicateDefinition { name: String, span: Span },

    /// A variable was declared twice in the same scope.
    #[error("at {new_span}: variable '{name}' redeclared (originally declared at {original_span})")]
    VariableRedeclaration {
        name: String,
        original_span: Span,
        new_span: Span,
    },

    /// A required part of a construct was never supplied.
    #[error("at {span}: missing {part} in {construct}")]
    MissingPart {
        part: &'static str,
        construct: &'static str,
        span: Span,
    },

    /// A condition is not boolean-typed.
    #[error("at {span}: non-boolean condition {expr} (type {typ}) in {construct}")]
    NonBoolean {
        expr: String,
        typ: String,
        construct: &'static str,
        span: Span,
    },

    /// An expression cannot be used as an operand (Invalid type, no value,
    /// multiple values, a reference or a type).
    #[error("at {span}: {expr} {reason}")]
    InvalidOperand {
        expr: String,
        reason: &'static str,
        span: Span,
    },

    /// Operand types do not agree.
    #[error("at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    /// No operator applies to the operand type.
    #[error("at {span}: operator {op} not defined on {expr} (type {typ})")]
    NoOperator {
        op: String,
        expr: String,
        typ: String,
        span: Span,
    },

    /// Wrong number of arguments in a call.
    #[error("at {span}: {what} arguments in call to {name}: have {got}, want {expected}")]
    ArgumentCountMismatch {
        what: &'static str,
        name: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    /// Calling something that is not a function.
    #[error("at {span}: invalid operation: cannot call non-function {expr} (type {typ})")]
    NotCallable {
        expr: String,
        typ: String,
        span: Span,
    },

    /// A selector names no field of the operand.
    #[error("at {span}: {expr} undefined (type {typ} has no field {field})")]
    UnknownField {
        expr: String,
        typ: String,
        field: String,
        span: Span,
    },

    /// A name did not resolve in the scope chain.
    #[error("at {span}: undefined: {name}")]
    UndefinedIdentifier { name: String, span: Span },

    /// Constant integer division by zero.
    #[error("at {span}: invalid operation: division by zero")]
    DivisionByZero { span: Span },

    /// A constant does not fit its target type.
    #[error("at {span}: constant {value} overflows {typ}")]
    ConstantOverflow {
        value: String,
        typ: String,
        span: Span,
    },

    /// Anything else.
    #[error("at {span}: {message}")]
    Other { message: String, span: Span },
}

impl BuildError {
    /// The origin this error was raised for.
    pub fn span(&self) -> Span {
        match self {
            BuildError::AssignMismatch { span, .. }
            | BuildError::CallAssignMismatch { span, .. }
            | BuildError::Unassignable { span, .. }
            | BuildError::CannotAssign { span, .. }
            | BuildError::InvalidOperation { span, .. }
            | BuildError::CannotSlice { span, .. }
            | BuildError::NotSupported { span, .. }
            | BuildError::DuplicateDefinition { span, .. }
            | BuildError::MissingPart { span, .. }
            | BuildError::NonBoolean { span, .. }
            | BuildError::InvalidOperand { span, .. }
            | BuildError::TypeMismatch { span, .. }
            | BuildError::NoOperator { span, .. }
            | BuildError::ArgumentCountMismatch { span, .. }
            | BuildError::NotCallable { span, .. }
            | BuildError::UnknownField { span, .. }
            | BuildError::UndefinedIdentifier { span, .. }
            | BuildError::DivisionByZero { span }
            | BuildError::ConstantOverflow { span, .. }
            | BuildError::Other { span, .. } => *span,
            BuildError::VariableRedeclaration { new_span, .. } => *new_span,
        }
    }

    /// Whether this error reports a tuple arity mismatch.
    pub fn is_arity_mismatch(&self) -> bool {
        matches!(
            self,
            BuildError::AssignMismatch { .. } | BuildError::CallAssignMismatch { .. }
        )
    }
}
