//! Predeclared functions.
//!
//! Builtins live in the package root scope like any other symbol, but their
//! typing depends on their arguments, so calls to them are checked by
//! [`Package::call`](crate::Package::call) case by case rather than through a
//! signature.

/// A predeclared function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Len,
    Cap,
    Append,
    Make,
    New,
    Print,
    Println,
    Panic,
    Delete,
}

impl Builtin {
    pub const ALL: [Builtin; 9] = [
        Builtin::Len,
        Builtin::Cap,
        Builtin::Append,
        Builtin::Make,
        Builtin::New,
        Builtin::Print,
        Builtin::Println,
        Builtin::Panic,
        Builtin::Delete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Cap => "cap",
            Builtin::Append => "append",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Panic => "panic",
            Builtin::Delete => "delete",
        }
    }

    /// Accepted argument counts as `(min, max)`; `None` means unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Builtin::Len | Builtin::Cap | Builtin::New | Builtin::Panic => (1, Some(1)),
            Builtin::Append => (1, None),
            Builtin::Make => (1, Some(3)),
            Builtin::Print | Builtin::Println => (0, None),
            Builtin::Delete => (2, Some(2)),
        }
    }

    /// Builtins whose call yields no value.
    pub fn is_void(self) -> bool {
        matches!(
            self,
            Builtin::Print | Builtin::Println | Builtin::Panic | Builtin::Delete
        )
    }
}
