//! Live mode: every capability runs immediately.

use ordered_float::OrderedFloat;
use stagegen_core::{BinaryOp, BuildError, ConstValue, Kind, Span};

use crate::effects::{Effects, Runtime};
use crate::error::{Result, StagedError};
use crate::insert::val_params;
use crate::value::Value;

/// Environment variable enabling statement tracing.
pub const DEBUG_EXEC_ENV: &str = "STAGEGEN_DEBUG_EXEC";

/// Interpreter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecConfig {
    /// Log every executed statement with its arguments.
    pub debug_exec: bool,
}

impl ExecConfig {
    /// Reads `STAGEGEN_DEBUG_EXEC`; any value other than empty, `0` or
    /// `false` enables tracing.
    pub fn from_env() -> Self {
        let debug_exec = std::env::var(DEBUG_EXEC_ENV)
            .map(|v| !matches!(v.trim(), "" | "0" | "false"))
            .unwrap_or(false);
        Self { debug_exec }
    }
}

/// Runs statements against a data store.
pub trait Executor {
    /// Executes `query` with positional `args`; returns the affected row
    /// count.
    fn exec(&mut self, query: &str, args: &[Value]) -> Result<i64>;
}

/// An executor that records what it is asked to run.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    pub statements: Vec<(String, Vec<Value>)>,
}

impl Executor for RecordingExecutor {
    /// Reports one affected row per placeholder group.
    fn exec(&mut self, query: &str, args: &[Value]) -> Result<i64> {
        self.statements.push((query.to_owned(), args.to_vec()));
        Ok(query.matches("(?").count() as i64)
    }
}

/// Executes capabilities over live [`Value`]s.
#[derive(Debug)]
pub struct Interpreter<X: Executor> {
    executor: X,
    config: ExecConfig,
    scopes: Vec<Vec<(String, Value)>>,
    lists: Vec<Vec<Value>>,
}

impl<X: Executor> Interpreter<X> {
    pub fn new(executor: X) -> Self {
        Self::with_config(executor, ExecConfig::from_env())
    }

    pub fn with_config(executor: X, config: ExecConfig) -> Self {
        Self {
            executor,
            config,
            scopes: vec![Vec::new()],
            lists: Vec::new(),
        }
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn into_executor(self) -> X {
        self.executor
    }

    #[cfg(test)]
    pub(crate) fn bindings(&self) -> usize {
        self.scopes.iter().map(Vec::len).sum()
    }

    #[cfg(test)]
    pub(crate) fn live_lists(&self) -> usize {
        self.lists.len()
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.iter_mut().rev().find(|(n, _)| n == name))
            .map(|(_, v)| v)
    }

    fn list_mut(&mut self, list: usize) -> Result<&mut Vec<Value>> {
        self.lists
            .get_mut(list)
            .ok_or_else(|| StagedError::usage(format!("unknown list #{list}")))
    }
}

fn to_const(v: &Value) -> Option<ConstValue> {
    match v {
        Value::Bool(b) => Some(ConstValue::Bool(*b)),
        Value::Int(n) => Some(ConstValue::Int(*n as i128)),
        Value::Float(x) => Some(ConstValue::float(x.0)),
        Value::Str(s) => Some(ConstValue::String(s.clone())),
        _ => None,
    }
}

fn from_const(c: ConstValue) -> Result<Value> {
    Ok(match c {
        ConstValue::Bool(b) => Value::Bool(b),
        ConstValue::Int(n) => match i64::try_from(n) {
            Ok(n) => Value::Int(n),
            Err(_) => return Err(StagedError::Panic(format!("integer overflow: {n}"))),
        },
        ConstValue::Float(x) => Value::Float(OrderedFloat(x.0)),
        ConstValue::String(s) => Value::Str(s),
    })
}

/// Formats `%d`, `%s` and `%v` verbs in order; `%%` is a literal percent.
pub(crate) fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(verb) => match args.next() {
                Some(arg) => out.push_str(&arg.to_string()),
                None => out.push_str(&format!("%!{verb}(MISSING)")),
            },
            None => out.push_str("%!(NOVERB)"),
        }
    }
    out
}

fn int_arg(args: &[Value], i: usize, f: Runtime) -> Result<i64> {
    args.get(i)
        .and_then(Value::as_int)
        .ok_or_else(|| StagedError::usage(format!("{}: argument {i} must be an int", f.name())))
}

impl<X: Executor> Effects for Interpreter<X> {
    type Val = Value;
    type List = usize;

    fn int(&mut self, n: i64) -> Value {
        Value::Int(n)
    }

    fn text(&mut self, s: &str) -> Value {
        Value::Str(s.to_owned())
    }

    fn kind(&self, v: &Value) -> Kind {
        v.kind()
    }

    fn text_of(&self, v: &Value) -> Option<String> {
        v.as_str().map(str::to_owned)
    }

    fn define(&mut self, name: &str, v: Value) -> Result<Value> {
        tracing::trace!(name, value = %v, "define");
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name.to_owned(), v.clone()));
        }
        Ok(v)
    }

    fn redefine(&mut self, name: &str, v: Value) -> Result<Value> {
        let existing = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.iter_mut().rev().find(|(n, _)| n == name));
        match existing {
            Some((_, slot)) => {
                tracing::trace!(name, value = %v, "redefine");
                *slot = v.clone();
                Ok(v)
            }
            None => self.define(name, v),
        }
    }

    fn get(&self, name: &str) -> Result<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.iter().rev().find(|(n, _)| n == name))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| StagedError::usage(format!("undefined: {name}")))
    }

    fn assign(&mut self, name: &str, v: Value) -> Result<()> {
        tracing::trace!(name, value = %v, "assign");
        match self.lookup_mut(name) {
            Some(slot) => {
                *slot = v;
                Ok(())
            }
            None => Err(StagedError::usage(format!("undefined: {name}"))),
        }
    }

    /// Lists created inside the block are released when it exits.
    fn block<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let lists = self.lists.len();
        self.scopes.push(Vec::new());
        let out = f(self);
        self.scopes.pop();
        self.lists.truncate(lists);
        out
    }

    fn len(&mut self, v: &Value) -> Result<Value> {
        match v {
            Value::List(items) => Ok(Value::Int(items.len() as i64)),
            Value::Str(s) => Ok(Value::Int(s.len() as i64)),
            other => Err(StagedError::usage(format!(
                "invalid argument: {other} (type {}) for len",
                other.type_name()
            ))),
        }
    }

    fn index(&mut self, v: &Value, i: &Value) -> Result<Value> {
        let Some(i) = i.as_int() else {
            return Err(StagedError::usage(format!(
                "invalid index {i} (type {})",
                i.type_name()
            )));
        };
        let len = match v {
            Value::List(items) => {
                if let Some(item) = usize::try_from(i).ok().and_then(|i| items.get(i)) {
                    return Ok(item.clone());
                }
                items.len()
            }
            Value::Str(s) => {
                if let Some(b) = usize::try_from(i).ok().and_then(|i| s.as_bytes().get(i)) {
                    return Ok(Value::Int(*b as i64));
                }
                s.len()
            }
            other => {
                return Err(StagedError::usage(format!(
                    "cannot index {other} (type {})",
                    other.type_name()
                )));
            }
        };
        Err(StagedError::Panic(format!(
            "runtime error: index out of range [{i}] with length {len}"
        )))
    }

    fn deref(&mut self, v: &Value) -> Result<Value> {
        match v {
            Value::Pointer(inner) => Ok((**inner).clone()),
            Value::Nil => Err(StagedError::Panic(
                "runtime error: invalid memory address or nil pointer dereference".into(),
            )),
            other => Err(StagedError::usage(format!(
                "invalid indirect of {other} (type {})",
                other.type_name()
            ))),
        }
    }

    fn columns(&mut self, rec: &Value) -> Result<Vec<Value>> {
        match rec {
            Value::Record(fields) => Ok(fields.iter().map(|(_, v)| v.clone()).collect()),
            other => Err(StagedError::usage(format!(
                "{other} (type {}) is not a record",
                other.type_name()
            ))),
        }
    }

    fn column_names(&self, rec: &Value) -> Result<Vec<String>> {
        match rec {
            Value::Record(fields) => Ok(fields.iter().map(|(n, _)| n.clone()).collect()),
            other => Err(StagedError::usage(format!(
                "{other} (type {}) is not a record",
                other.type_name()
            ))),
        }
    }

    fn new_list(&mut self, name: &str, cap: Value) -> Result<usize> {
        let Some(size) = cap.as_int().and_then(|c| usize::try_from(c).ok()) else {
            return Err(StagedError::Panic(format!(
                "runtime error: makeslice: cap out of range ({cap})"
            )));
        };
        tracing::trace!(name, cap = size, "new list");
        self.lists.push(Vec::with_capacity(size));
        Ok(self.lists.len() - 1)
    }

    fn push(&mut self, list: &usize, v: Value) -> Result<()> {
        self.list_mut(*list)?.push(v);
        Ok(())
    }

    fn list_val(&self, list: &usize) -> Value {
        match self.lists.get(*list) {
            Some(items) => Value::List(items.clone()),
            None => Value::default(),
        }
    }

    fn binary(&mut self, x: Value, op: BinaryOp, y: Value) -> Result<Value> {
        let (Some(cx), Some(cy)) = (to_const(&x), to_const(&y)) else {
            return Err(StagedError::usage(format!(
                "operator {op} not defined on {x} (type {}) and {y} (type {})",
                x.type_name(),
                y.type_name()
            )));
        };
        match cx.fold_binary(op, &cy, Span::NONE) {
            Ok(Some(c)) => from_const(c),
            Ok(None) => Err(StagedError::usage(format!(
                "operator {op} not defined on {x} (type {}) and {y} (type {})",
                x.type_name(),
                y.type_name()
            ))),
            Err(BuildError::DivisionByZero { .. }) => Err(StagedError::Panic(
                "runtime error: integer divide by zero".into(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    fn when(&mut self, cond: Value, then: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        match cond {
            Value::Bool(true) => then(self),
            Value::Bool(false) => Ok(()),
            other => Err(StagedError::usage(format!(
                "non-boolean condition {other} (type {})",
                other.type_name()
            ))),
        }
    }

    fn times(
        &mut self,
        n: Value,
        name: &str,
        mut body: impl FnMut(&mut Self, Value) -> Result<()>,
    ) -> Result<()> {
        let Some(n) = n.as_int() else {
            return Err(StagedError::usage(format!("loop count {n} is not an int")));
        };
        for i in 0..n {
            self.block(|me| {
                let i = me.define(name, Value::Int(i))?;
                body(me, i)
            })?;
        }
        Ok(())
    }

    fn call(&mut self, f: Runtime, args: Vec<Value>) -> Result<Value> {
        match f {
            Runtime::Panicf => {
                let Some((format, rest)) = args.split_first() else {
                    return Err(StagedError::usage("Panicf: missing format"));
                };
                let format = format.as_str().unwrap_or_default();
                Err(StagedError::Panic(sprintf(format, rest)))
            }
            Runtime::ValParams => {
                let n = int_arg(&args, 0, f)?;
                let rows = int_arg(&args, 1, f)?;
                let (n, rows) = (n.max(0) as usize, rows.max(0) as usize);
                Ok(Value::Str(val_params(n, rows)))
            }
            Runtime::Exec => {
                let (query, vals) = match (args.first(), args.get(1)) {
                    (Some(Value::Str(q)), Some(Value::List(v))) => (q, v),
                    _ => {
                        let msg = "Exec: expected a query and an argument list";
                        return Err(StagedError::usage(msg));
                    }
                };
                if self.config.debug_exec {
                    tracing::debug!("==> {query} {vals:?}");
                }
                self.executor.exec(query, vals).map(Value::Int)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interp() -> Interpreter<RecordingExecutor> {
        Interpreter::with_config(RecordingExecutor::default(), ExecConfig::default())
    }

    #[test]
    fn scoped_definitions() {
        let mut it = interp();
        it.define("x", Value::Int(1)).unwrap();
        it.block(|it| {
            it.define("x", Value::Int(2))?;
            assert_eq!(it.get("x")?, Value::Int(2));
            it.assign("x", Value::Int(3))
        })
        .unwrap();
        assert_eq!(it.get("x").unwrap(), Value::Int(1));
        it.assign("x", Value::Int(5)).unwrap();
        assert_eq!(it.get("x").unwrap(), Value::Int(5));
        assert!(it.get("y").is_err());
    }

    #[test]
    fn redefine_reuses_the_current_scope() {
        let mut it = interp();
        it.redefine("n", Value::Int(1)).unwrap();
        it.redefine("n", Value::Int(2)).unwrap();
        assert_eq!(it.bindings(), 1);
        assert_eq!(it.get("n").unwrap(), Value::Int(2));
        it.block(|it| {
            it.redefine("n", Value::Int(3))?;
            assert_eq!(it.bindings(), 2);
            Ok(())
        })
        .unwrap();
        assert_eq!(it.get("n").unwrap(), Value::Int(2));
    }

    #[test]
    fn block_releases_its_lists() {
        let mut it = interp();
        let outer = it.new_list("outer", Value::Int(1)).unwrap();
        it.block(|it| {
            let inner = it.new_list("inner", Value::Int(1))?;
            it.push(&inner, Value::Int(1))?;
            it.push(&outer, Value::Int(2))
        })
        .unwrap();
        assert_eq!(it.live_lists(), 1);
        assert_eq!(it.list_val(&outer), Value::list([Value::Int(2)]));
    }

    #[test]
    fn binary_uses_constant_semantics() {
        let mut it = interp();
        let product = it.binary(Value::Int(6), BinaryOp::Mul, Value::Int(7));
        assert_eq!(product.unwrap(), Value::Int(42));
        assert_eq!(
            it.binary("a".into(), BinaryOp::Add, "b".into()).unwrap(),
            Value::from("ab")
        );
        let equal = it.binary(Value::Int(0), BinaryOp::Equal, Value::Int(0));
        assert_eq!(equal.unwrap(), Value::Bool(true));
        assert!(matches!(
            it.binary(Value::Int(1), BinaryOp::Div, Value::Int(0)),
            Err(StagedError::Panic(_))
        ));
        assert!(matches!(
            it.binary(Value::Nil, BinaryOp::Add, Value::Int(0)),
            Err(StagedError::Usage(_))
        ));
    }

    #[test]
    fn times_runs_n_iterations() {
        let mut it = interp();
        let list = it.new_list("seen", Value::Int(3)).unwrap();
        let three = Value::Int(3);
        it.times(three, "i", |it, i| it.push(&list, i)).unwrap();
        assert_eq!(
            it.list_val(&list),
            Value::list([Value::Int(0), Value::Int(1), Value::Int(2)])
        );
        let skipped = it.times(Value::Int(0), "i", |_, _| {
            Err(StagedError::usage("unreachable"))
        });
        assert!(skipped.is_ok());
        assert!(it.get("i").is_err());
    }

    #[test]
    fn panicf_formats() {
        let mut it = interp();
        let args = vec!["got %d, expected %d".into(), Value::Int(1), Value::Int(2)];
        let err = it.call(Runtime::Panicf, args).unwrap_err();
        assert_eq!(err, StagedError::Panic("got 1, expected 2".into()));
        assert_eq!(sprintf("100%% %d", &[]), "100% %!d(MISSING)");
    }

    #[test]
    fn index_bounds() {
        let mut it = interp();
        let xs = Value::list([Value::Int(7)]);
        assert_eq!(it.index(&xs, &Value::Int(0)).unwrap(), Value::Int(7));
        assert_eq!(
            it.index(&xs, &Value::Int(1)).unwrap_err(),
            StagedError::Panic("runtime error: index out of range [1] with length 1".into())
        );
        assert!(matches!(it.deref(&Value::Nil), Err(StagedError::Panic(_))));
    }

    #[test]
    fn exec_goes_to_executor() {
        let mut it = interp();
        let query = "INSERT INTO t (a) VALUES (?),(?)";
        let vals = Value::list([Value::Int(1), Value::Int(2)]);
        let n = it.call(Runtime::Exec, vec![query.into(), vals]).unwrap();
        assert_eq!(n, Value::Int(2));
        assert_eq!(it.executor().statements.len(), 1);
        let sizes = vec![Value::Int(2), Value::Int(2)];
        let params = it.call(Runtime::ValParams, sizes).unwrap();
        assert_eq!(params, Value::from("(?,?),(?,?)"));
    }

    #[test]
    fn config_from_env_defaults_off() {
        if std::env::var_os(DEBUG_EXEC_ENV).is_none() {
            assert!(!ExecConfig::from_env().debug_exec);
        }
    }
}
