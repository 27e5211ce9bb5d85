//! The capability set shared by both staging modes.
//!
//! A staged operation is written once against [`Effects`]. The
//! [`Interpreter`](crate::Interpreter) performs each capability on live
//! values as it is invoked; the [`Generator`](crate::Generator) turns each
//! one into builder calls and accumulates the statements. Every capability
//! validates its inputs the same way in both modes.

use stagegen_core::{BinaryOp, Kind};

use crate::error::Result;

/// Functions provided by the target runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runtime {
    /// `log.Panicf(format string, args ...any)`
    Panicf,
    /// `sql.ValParams(n int, rows int) string`: `rows` comma-separated
    /// groups of `n` placeholders.
    ValParams,
    /// `sql.Exec(query string, args []any) int`: runs a statement and
    /// returns the number of affected rows.
    Exec,
}

impl Runtime {
    pub fn name(self) -> &'static str {
        match self {
            Runtime::Panicf => "Panicf",
            Runtime::ValParams => "ValParams",
            Runtime::Exec => "Exec",
        }
    }

    /// Whether the call is made for its effect only.
    pub fn is_void(self) -> bool {
        matches!(self, Runtime::Panicf)
    }
}

/// Definitions, conditionals, loops and calls over some value domain.
pub trait Effects {
    /// A value (live) or an expression (generated).
    type Val: Clone;
    /// A growable list being filled by [`Effects::push`].
    type List;

    // ------------------------------------------------------------------------
    // Constants and inspection
    // ------------------------------------------------------------------------

    fn int(&mut self, n: i64) -> Self::Val;

    fn text(&mut self, s: &str) -> Self::Val;

    /// Structural kind of `v`.
    fn kind(&self, v: &Self::Val) -> Kind;

    /// The text of a constant string.
    fn text_of(&self, v: &Self::Val) -> Option<String>;

    // ------------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------------

    /// `name := v`; returns a read of the new variable.
    fn define(&mut self, name: &str, v: Self::Val) -> Result<Self::Val>;

    /// `name := v`, or `name = v` when the current scope already defines
    /// `name`; returns a read of the variable.
    fn redefine(&mut self, name: &str, v: Self::Val) -> Result<Self::Val>;

    /// A read of the innermost variable called `name`.
    fn get(&self, name: &str) -> Result<Self::Val>;

    /// `name = v` on an existing variable.
    fn assign(&mut self, name: &str, v: Self::Val) -> Result<()>;

    /// Runs `f` in a nested definition scope.
    fn block<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R>;

    // ------------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------------

    fn len(&mut self, v: &Self::Val) -> Result<Self::Val>;

    fn index(&mut self, v: &Self::Val, i: &Self::Val) -> Result<Self::Val>;

    fn deref(&mut self, v: &Self::Val) -> Result<Self::Val>;

    /// Field values of a record, in declaration order.
    fn columns(&mut self, rec: &Self::Val) -> Result<Vec<Self::Val>>;

    /// Column names of a record.
    fn column_names(&self, rec: &Self::Val) -> Result<Vec<String>>;

    /// An empty list named `name` with room for `cap` elements.
    fn new_list(&mut self, name: &str, cap: Self::Val) -> Result<Self::List>;

    fn push(&mut self, list: &Self::List, v: Self::Val) -> Result<()>;

    /// The list as a value.
    fn list_val(&self, list: &Self::List) -> Self::Val;

    // ------------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------------

    fn binary(&mut self, x: Self::Val, op: BinaryOp, y: Self::Val) -> Result<Self::Val>;

    /// Runs `then` when `cond` holds.
    fn when(&mut self, cond: Self::Val, then: impl FnOnce(&mut Self) -> Result<()>) -> Result<()>;

    /// Runs `body` `n` times with the counter `name` bound to 0, 1, ...
    fn times(
        &mut self,
        n: Self::Val,
        name: &str,
        body: impl FnMut(&mut Self, Self::Val) -> Result<()>,
    ) -> Result<()>;

    /// Calls a runtime function.
    fn call(&mut self, f: Runtime, args: Vec<Self::Val>) -> Result<Self::Val>;
}
