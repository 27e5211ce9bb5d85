//! Batch insert.
//!
//! ```text
//! insert <record>                          one row
//! insert <recordOrPtrList>                 one row per element
//! insert <col1>, <val1>, <col2>, <val2>    one row
//! insert <col1>, <list1>, <col2>, <val2>   one row per element of list1
//! insert <col1>, <list1>, <col2>, <list2>  lists zipped row-wise
//! ```
//!
//! The algorithm is written once against [`Effects`]. Arguments whose shape
//! is known up front (argument counts, column names, kinds) are checked
//! immediately and reported as usage errors; row counts are only known at
//! run time, so their checks are staged as conditional panics.

use stagegen_core::{BinaryOp, Kind};

use crate::effects::{Effects, Runtime};
use crate::error::{Result, StagedError};

const USAGE_PAIRS: &str = "usage: insert <colName1>, <val1>, <colName2>, <val2>, ...";
const USAGE_RECORD: &str = "usage: insert <structValOrPtr>";
const USAGE_RECORDS: &str = "usage: insert <structOrPtrSlice>";

/// Name of the variable receiving the affected row count.
pub const AFFECTED: &str = "affected";

/// `(?,?,...)` with `n` placeholders.
pub fn val_param(n: usize) -> String {
    let mut s = String::with_capacity(2 * n + 1);
    s.push('(');
    for i in 0..n {
        if i > 0 {
            s.push(',');
        }
        s.push('?');
    }
    s.push(')');
    s
}

/// `rows` copies of [`val_param`]`(n)`, comma-separated.
pub fn val_params(n: usize, rows: usize) -> String {
    vec![val_param(n); rows].join(",")
}

/// `INSERT INTO tbl (a,b) VALUES `.
pub fn insert_prefix(tbl: &str, names: &[String]) -> String {
    format!("INSERT INTO {tbl} ({}) VALUES ", names.join(","))
}

/// A table-bound class of operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Class {
    tbl: Option<String>,
}

impl Class {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the class to `tbl`.
    pub fn use_table(&mut self, tbl: impl Into<String>) -> &mut Self {
        self.tbl = Some(tbl.into());
        self
    }

    pub fn table(&self) -> Option<&str> {
        self.tbl.as_deref()
    }

    /// Inserts rows into the current table.
    ///
    /// Returns the affected row count: a live count when interpreting, a read
    /// of the [`AFFECTED`] variable when generating.
    pub fn insert<E: Effects>(&self, fx: &mut E, args: &[E::Val]) -> Result<E::Val> {
        let Some(tbl) = self.tbl.as_deref() else {
            return Err(StagedError::usage(
                "please call `use <tableName>` to specify the current table",
            ));
        };
        tracing::debug!(tbl, args = args.len(), "insert");
        let zero = fx.int(0);
        fx.redefine(AFFECTED, zero)?;
        fx.block(|fx| match args {
            [arg] => insert_records(fx, tbl, arg),
            pairs => insert_pairs(fx, tbl, pairs),
        })?;
        fx.get(AFFECTED)
    }
}

// ============================================================================
// Records
// ============================================================================

fn insert_records<E: Effects>(fx: &mut E, tbl: &str, arg: &E::Val) -> Result<()> {
    match fx.kind(arg) {
        Kind::Sequence => insert_record_rows(fx, tbl, arg),
        Kind::Pointer => {
            let rec = fx.deref(arg)?;
            insert_record_row(fx, tbl, &rec)
        }
        _ => insert_record_row(fx, tbl, arg),
    }
}

fn insert_record_row<E: Effects>(fx: &mut E, tbl: &str, rec: &E::Val) -> Result<()> {
    if fx.kind(rec) != Kind::Record {
        return Err(StagedError::usage(USAGE_RECORD));
    }
    let names = fx.column_names(rec)?;
    if names.is_empty() {
        return Err(StagedError::usage("insert: nothing to insert"));
    }
    let cap = fx.int(names.len() as i64);
    let vals = fx.new_list("vals", cap)?;
    for col in fx.columns(rec)? {
        fx.push(&vals, col)?;
    }
    let query = insert_prefix(tbl, &names) + &val_param(names.len());
    let query = fx.text(&query);
    exec(fx, query, &vals)
}

/// An empty list is a no-op that leaves [`AFFECTED`] at zero.
fn insert_record_rows<E: Effects>(fx: &mut E, tbl: &str, list: &E::Val) -> Result<()> {
    let n = fx.len(list)?;
    let rows = fx.define("rows", n)?;
    let zero = fx.int(0);
    let nonempty = fx.binary(rows.clone(), BinaryOp::NotEqual, zero.clone())?;
    fx.when(nonempty, |fx| {
        let first = fx.index(list, &zero)?;
        let by_ptr = fx.kind(&first) == Kind::Pointer;
        let first = if by_ptr { fx.deref(&first)? } else { first };
        if fx.kind(&first) != Kind::Record {
            return Err(StagedError::usage(USAGE_RECORDS));
        }
        let names = fx.column_names(&first)?;
        if names.is_empty() {
            return Err(StagedError::usage("insert: nothing to insert"));
        }

        let vals = new_vals(fx, names.len(), &rows)?;
        fx.times(rows.clone(), "i", |fx, i| {
            let elem = fx.index(list, &i)?;
            let rec = if by_ptr { fx.deref(&elem)? } else { elem };
            for col in fx.columns(&rec)? {
                fx.push(&vals, col)?;
            }
            Ok(())
        })?;
        exec_rows(fx, tbl, &names, &vals, rows.clone())
    })
}

// ============================================================================
// Name/value pairs
// ============================================================================

fn insert_pairs<E: Effects>(fx: &mut E, tbl: &str, pairs: &[E::Val]) -> Result<()> {
    if pairs.len() < 2 || pairs.len() % 2 != 0 {
        return Err(StagedError::usage(USAGE_PAIRS));
    }
    let mut names = Vec::with_capacity(pairs.len() / 2);
    let mut vals = Vec::with_capacity(pairs.len() / 2);
    let mut lists = Vec::new();
    for (i, pair) in pairs.chunks_exact(2).enumerate() {
        let Some(name) = fx.text_of(&pair[0]) else {
            return Err(StagedError::usage(USAGE_PAIRS));
        };
        if fx.kind(&pair[1]) == Kind::Sequence {
            lists.push(i);
        }
        names.push(name);
        vals.push(pair[1].clone());
    }

    match lists.as_slice() {
        [] => insert_row(fx, tbl, &names, vals),
        [one] => insert_multi(fx, tbl, &names, *one, &vals),
        _ if lists.len() == vals.len() => insert_zip(fx, tbl, &names, &vals),
        _ => Err(StagedError::usage(
            "insert: can't mix multiple slice arguments and normal value",
        )),
    }
}

fn insert_row<E: Effects>(
    fx: &mut E,
    tbl: &str,
    names: &[String],
    vals: Vec<E::Val>,
) -> Result<()> {
    let cap = fx.int(names.len() as i64);
    let list = fx.new_list("vals", cap)?;
    for v in vals {
        fx.push(&list, v)?;
    }
    let query = insert_prefix(tbl, names) + &val_param(names.len());
    let query = fx.text(&query);
    exec(fx, query, &list)
}

/// One list among scalars: the scalars repeat on every row.
fn insert_multi<E: Effects>(
    fx: &mut E,
    tbl: &str,
    names: &[String],
    at: usize,
    vals: &[E::Val],
) -> Result<()> {
    let n = fx.len(&vals[at])?;
    let rows = fx.define("rows", n)?;
    check_rows(fx, &rows)?;
    let list = new_vals(fx, names.len(), &rows)?;
    fx.times(rows.clone(), "i", |fx, i| {
        for (j, v) in vals.iter().enumerate() {
            let v = if j == at { fx.index(v, &i)? } else { v.clone() };
            fx.push(&list, v)?;
        }
        Ok(())
    })?;
    exec_rows(fx, tbl, names, &list, rows)
}

/// All lists: rows are zipped and every list must have the first one's
/// length.
fn insert_zip<E: Effects>(fx: &mut E, tbl: &str, names: &[String], vals: &[E::Val]) -> Result<()> {
    let n = fx.len(&vals[0])?;
    let rows = fx.define("rows", n)?;
    for v in &vals[1..] {
        let vlen = fx.len(v)?;
        let differs = fx.binary(rows.clone(), BinaryOp::NotEqual, vlen.clone())?;
        fx.when(differs, |fx| {
            let format = fx.text("insert: unexpected slice length. got %d, expected %d");
            let args = vec![format, vlen, rows.clone()];
            fx.call(Runtime::Panicf, args).map(drop)
        })?;
    }
    check_rows(fx, &rows)?;
    let list = new_vals(fx, names.len(), &rows)?;
    fx.times(rows.clone(), "i", |fx, i| {
        for v in vals {
            let elem = fx.index(v, &i)?;
            fx.push(&list, elem)?;
        }
        Ok(())
    })?;
    exec_rows(fx, tbl, names, &list, rows)
}

// ============================================================================
// Shared steps
// ============================================================================

/// Panics at run time when there are no rows.
fn check_rows<E: Effects>(fx: &mut E, rows: &E::Val) -> Result<()> {
    let zero = fx.int(0);
    let empty = fx.binary(rows.clone(), BinaryOp::Equal, zero)?;
    fx.when(empty, |fx| {
        let msg = fx.text("insert: nothing to insert");
        fx.call(Runtime::Panicf, vec![msg]).map(drop)
    })
}

/// `vals := make([]any, 0, n*rows)`
fn new_vals<E: Effects>(fx: &mut E, n: usize, rows: &E::Val) -> Result<E::List> {
    let n = fx.int(n as i64);
    let cap = fx.binary(n, BinaryOp::Mul, rows.clone())?;
    fx.new_list("vals", cap)
}

fn exec_rows<E: Effects>(
    fx: &mut E,
    tbl: &str,
    names: &[String],
    vals: &E::List,
    rows: E::Val,
) -> Result<()> {
    let prefix = fx.text(&insert_prefix(tbl, names));
    let n = fx.int(names.len() as i64);
    let params = fx.call(Runtime::ValParams, vec![n, rows])?;
    let query = fx.binary(prefix, BinaryOp::Add, params)?;
    exec(fx, query, vals)
}

fn exec<E: Effects>(fx: &mut E, query: E::Val, vals: &E::List) -> Result<()> {
    let vals = fx.list_val(vals);
    let affected = fx.call(Runtime::Exec, vec![query, vals])?;
    fx.assign(AFFECTED, affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{ExecConfig, Interpreter, RecordingExecutor};
    use crate::value::Value;

    fn interp() -> Interpreter<RecordingExecutor> {
        Interpreter::with_config(RecordingExecutor::default(), ExecConfig::default())
    }

    fn users() -> Class {
        let mut class = Class::new();
        class.use_table("users");
        class
    }

    fn user(id: i64, name: &str) -> Value {
        Value::record([("id", Value::Int(id)), ("name", Value::from(name))])
    }

    #[test]
    fn placeholders() {
        assert_eq!(val_param(3), "(?,?,?)");
        assert_eq!(val_params(2, 3), "(?,?),(?,?),(?,?)");
        assert_eq!(val_params(2, 0), "");
        assert_eq!(
            insert_prefix("t", &["a".into(), "b".into()]),
            "INSERT INTO t (a,b) VALUES "
        );
    }

    #[test]
    fn table_is_required() {
        let mut it = interp();
        let err = Class::new().insert(&mut it, &[user(1, "a")]).unwrap_err();
        let StagedError::Usage(msg) = err else {
            panic!("expected a usage error");
        };
        assert!(msg.contains("use <tableName>"));
    }

    #[test]
    fn single_record() {
        let mut it = interp();
        let one = Value::ptr(user(1, "ann"));
        let n = users().insert(&mut it, &[one]).unwrap();
        assert_eq!(n, Value::Int(1));
        let (query, args) = &it.executor().statements[0];
        assert_eq!(query, "INSERT INTO users (id,name) VALUES (?,?)");
        assert_eq!(args, &vec![Value::Int(1), Value::from("ann")]);
    }

    #[test]
    fn record_list() {
        let mut it = interp();
        let rows = Value::list([Value::ptr(user(1, "a")), Value::ptr(user(2, "b"))]);
        let n = users().insert(&mut it, &[rows]).unwrap();
        assert_eq!(n, Value::Int(2));
        let (query, args) = &it.executor().statements[0];
        assert_eq!(query, "INSERT INTO users (id,name) VALUES (?,?),(?,?)");
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn empty_record_list_is_a_no_op() {
        let mut it = interp();
        let n = users().insert(&mut it, &[Value::list([])]).unwrap();
        assert_eq!(n, Value::Int(0));
        assert!(it.executor().statements.is_empty());
    }

    #[test]
    fn empty_column_list_panics() {
        let mut it = interp();
        let ids = Value::list([]);
        let names = Value::list([]);
        let err = users()
            .insert(&mut it, &["id".into(), ids, "name".into(), names])
            .unwrap_err();
        assert_eq!(err, StagedError::Panic("insert: nothing to insert".into()));
    }

    #[test]
    fn repeated_inserts_share_one_counter() {
        let mut it = interp();
        let first = users().insert(&mut it, &[user(1, "a")]).unwrap();
        let rows = Value::list([user(2, "b"), user(3, "c")]);
        let second = users().insert(&mut it, &[rows]).unwrap();
        assert_eq!((first, second), (Value::Int(1), Value::Int(2)));
        assert_eq!(it.executor().statements.len(), 2);
        assert_eq!(it.bindings(), 1);
        assert_eq!(it.live_lists(), 0);
    }

    #[test]
    fn non_record_argument() {
        let mut it = interp();
        let err = users().insert(&mut it, &[Value::Int(3)]).unwrap_err();
        assert_eq!(err, StagedError::Usage(USAGE_RECORD.into()));
        let ints = Value::list([Value::Int(3)]);
        let err = users().insert(&mut it, &[ints]).unwrap_err();
        assert_eq!(err, StagedError::Usage(USAGE_RECORDS.into()));
    }

    #[test]
    fn scalar_pairs() {
        let mut it = interp();
        let pairs = ["id".into(), Value::Int(7), "name".into(), "x".into()];
        users().insert(&mut it, &pairs).unwrap();
        let (query, args) = &it.executor().statements[0];
        assert_eq!(query, "INSERT INTO users (id,name) VALUES (?,?)");
        assert_eq!(args, &vec![Value::Int(7), Value::from("x")]);
    }

    #[test]
    fn one_list_repeats_scalars() {
        let mut it = interp();
        let ids = Value::list([Value::Int(1), Value::Int(2)]);
        let pairs = ["id".into(), ids, "name".into(), "same".into()];
        users().insert(&mut it, &pairs).unwrap();
        let (query, args) = &it.executor().statements[0];
        assert_eq!(query, "INSERT INTO users (id,name) VALUES (?,?),(?,?)");
        let (one, two, same) = (Value::Int(1), Value::Int(2), Value::from("same"));
        assert_eq!(args, &vec![one, same.clone(), two, same]);
    }

    #[test]
    fn lists_zip_row_wise() {
        let mut it = interp();
        let ids = Value::list([Value::Int(1), Value::Int(2)]);
        let names = Value::list([Value::from("a"), Value::from("b")]);
        let pairs = ["id".into(), ids, "name".into(), names];
        let n = users().insert(&mut it, &pairs).unwrap();
        assert_eq!(n, Value::Int(2));
        let (_, args) = &it.executor().statements[0];
        let (a, b) = (Value::from("a"), Value::from("b"));
        assert_eq!(args, &vec![Value::Int(1), a, Value::Int(2), b]);
    }

    #[test]
    fn zip_length_mismatch() {
        let mut it = interp();
        let ids = Value::list([Value::Int(1), Value::Int(2)]);
        let names = Value::list([Value::from("a")]);
        let pairs = ["id".into(), ids, "name".into(), names];
        let err = users().insert(&mut it, &pairs).unwrap_err();
        assert_eq!(
            err,
            StagedError::Panic("insert: unexpected slice length. got 1, expected 2".into())
        );
    }

    #[test]
    fn pair_usage_errors() {
        let mut it = interp();
        let odd = users().insert(&mut it, &["id".into(), Value::Int(1), "name".into()]);
        assert_eq!(odd.unwrap_err(), StagedError::Usage(USAGE_PAIRS.into()));
        let unnamed = users().insert(&mut it, &[Value::Int(1), Value::Int(1)]);
        assert_eq!(unnamed.unwrap_err(), StagedError::Usage(USAGE_PAIRS.into()));
        let (l, zero) = (Value::list([Value::Int(1)]), Value::Int(0));
        let pairs = ["a".into(), l.clone(), "b".into(), l, "c".into(), zero];
        let StagedError::Usage(msg) = users().insert(&mut it, &pairs).unwrap_err() else {
            panic!("expected a usage error");
        };
        assert!(msg.contains("can't mix"));
        assert!(users().insert(&mut it, &[]).is_err());
    }
}
