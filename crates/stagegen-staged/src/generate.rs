//! Generating mode: every capability becomes builder calls.
//!
//! Statements accumulate in a stack of frames. Opening a block, a
//! conditional or a loop pushes a frame; closing it pops the frame into the
//! corresponding statement in the enclosing one.

use stagegen_builder::{BlockStmt, Callee, Expr, Operand, Package, PkgRef, Stmt, Var};
use stagegen_core::{BinaryOp, Kind, Span};

use crate::effects::{Effects, Runtime};
use crate::error::{Result, StagedError};

#[derive(Debug, Default)]
struct Frame {
    stmts: Vec<Stmt>,
    vars: Vec<Var>,
}

/// Emits the statements of a staged operation into a [`Package`].
#[derive(Debug)]
pub struct Generator<'p> {
    pkg: &'p mut Package,
    frames: Vec<Frame>,
    log: PkgRef,
    sql: PkgRef,
}

impl<'p> Generator<'p> {
    /// Imports the runtime packages and declares their members.
    pub fn new(pkg: &'p mut Package) -> Self {
        let log = pkg.import("log");
        let sql = pkg.import("sql");

        let types = pkg.types_mut();
        let string = types.string();
        let int = types.int();
        let any = types.any();
        let anys = types.slice(any);
        let panicf = types.signature(vec![string, anys], vec![], true);
        let val_params = types.signature(vec![int, int], vec![string], false);
        let exec = types.signature(vec![string, anys], vec![int], false);

        pkg.declare_member(log, Runtime::Panicf.name(), panicf);
        pkg.declare_member(sql, Runtime::ValParams.name(), val_params);
        pkg.declare_member(sql, Runtime::Exec.name(), exec);

        Self {
            pkg,
            frames: vec![Frame::default()],
            log,
            sql,
        }
    }

    pub fn package(&mut self) -> &mut Package {
        &mut *self.pkg
    }

    /// The generated top-level statements.
    pub fn finish(mut self) -> Vec<Stmt> {
        self.frames.truncate(1);
        self.frames.pop().map(|f| f.stmts).unwrap_or_default()
    }

    fn frame(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::default());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn emit(&mut self, stmt: impl Into<Stmt>) {
        self.frame().stmts.push(stmt.into());
    }

    fn var(&self, name: &str) -> Result<&Var> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.vars.iter().rev().find(|v| v.name() == name))
            .ok_or_else(|| StagedError::usage(format!("undefined: {name}")))
    }

    /// Runs `f` in a fresh frame and returns what it emitted.
    fn nested<R>(
        &mut self,
        vars: Vec<Var>,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<(R, Vec<Stmt>)> {
        self.frames.push(Frame {
            stmts: Vec::new(),
            vars,
        });
        let out = f(self);
        let frame = self.frames.pop().unwrap_or_default();
        out.map(|r| (r, frame.stmts))
    }

    /// Column selector paths and names, with embedded structs flattened.
    fn fields(&self, rec: &Expr) -> Result<Vec<(Vec<String>, String)>> {
        let types = self.pkg.types();
        let fields = types.flat_fields(rec.typ()).ok_or_else(|| {
            let typ = types.type_string(rec.typ());
            StagedError::usage(format!("{rec} (type {typ}) is not a record"))
        })?;
        Ok(fields
            .into_iter()
            .map(|(path, f)| {
                let name = f.tag.clone().unwrap_or_else(|| f.name.clone());
                (path, name)
            })
            .collect())
    }
}

impl Effects for Generator<'_> {
    type Val = Expr;
    type List = Var;

    fn int(&mut self, n: i64) -> Expr {
        self.pkg.new_expr(n)
    }

    fn text(&mut self, s: &str) -> Expr {
        self.pkg.new_expr(s)
    }

    fn kind(&self, v: &Expr) -> Kind {
        v.kind(self.pkg.types())
    }

    fn text_of(&self, v: &Expr) -> Option<String> {
        v.const_text().map(str::to_owned)
    }

    fn define(&mut self, name: &str, v: Expr) -> Result<Expr> {
        let var = self.pkg.define_var(name, v, true, Span::NONE)?;
        let val = var.val();
        self.frame().vars.push(var.clone());
        self.emit(var);
        Ok(val)
    }

    fn redefine(&mut self, name: &str, v: Expr) -> Result<Expr> {
        let frame = self.frame();
        let existing = frame.vars.iter().rev().find(|v| v.name() == name).cloned();
        match existing {
            Some(var) => {
                let target = var.reference();
                let stmt = self.pkg.assign(Span::NONE).lhs(vec![target]).rhs(vec![v]);
                self.emit(stmt);
                Ok(var.val())
            }
            None => self.define(name, v),
        }
    }

    fn get(&self, name: &str) -> Result<Expr> {
        self.var(name).map(Var::val)
    }

    fn assign(&mut self, name: &str, v: Expr) -> Result<()> {
        let target = self.var(name)?.reference();
        let stmt = self.pkg.assign(Span::NONE).lhs(vec![target]).rhs(vec![v]);
        self.emit(stmt);
        Ok(())
    }

    fn block<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let (out, stmts) = self.nested(Vec::new(), f)?;
        self.emit(BlockStmt::new(stmts));
        Ok(out)
    }

    fn len(&mut self, v: &Expr) -> Result<Expr> {
        Ok(self.pkg.call("len", vec![v.into()], false, Span::NONE)?)
    }

    fn index(&mut self, v: &Expr, i: &Expr) -> Result<Expr> {
        Ok(self.pkg.index(false, v, vec![i.into()], Span::NONE)?)
    }

    fn deref(&mut self, v: &Expr) -> Result<Expr> {
        Ok(self.pkg.elem(v, Span::NONE)?)
    }

    fn columns(&mut self, rec: &Expr) -> Result<Vec<Expr>> {
        let mut cols = Vec::new();
        for (path, _) in self.fields(rec)? {
            let mut col = rec.clone();
            for name in &path {
                col = self.pkg.select(&col, name, Span::NONE)?;
            }
            cols.push(col);
        }
        Ok(cols)
    }

    /// The tag of each field when it has one, its name otherwise.
    fn column_names(&self, rec: &Expr) -> Result<Vec<String>> {
        let fields = self.fields(rec)?;
        Ok(fields.into_iter().map(|(_, name)| name).collect())
    }

    fn new_list(&mut self, name: &str, cap: Expr) -> Result<Var> {
        let types = self.pkg.types_mut();
        let any = types.any();
        let anys = types.slice(any);
        let made = self.pkg.make_cap(anys, 0, cap, Span::NONE)?;
        let var = self.pkg.define_var(name, made, true, Span::NONE)?;
        self.frame().vars.push(var.clone());
        self.emit(var.clone());
        Ok(var)
    }

    fn push(&mut self, list: &Var, v: Expr) -> Result<()> {
        let stmt = self.pkg.append_to(list, v, Span::NONE)?;
        self.emit(stmt);
        Ok(())
    }

    fn list_val(&self, list: &Var) -> Expr {
        list.val()
    }

    fn binary(&mut self, x: Expr, op: BinaryOp, y: Expr) -> Result<Expr> {
        Ok(self.pkg.binary_op(x, op, y, Span::NONE)?)
    }

    fn when(&mut self, cond: Expr, then: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let ((), stmts) = self.nested(Vec::new(), then)?;
        let stmt = self.pkg.if_stmt(Span::NONE).cond(cond).body(stmts);
        self.emit(stmt);
        Ok(())
    }

    fn times(
        &mut self,
        n: Expr,
        name: &str,
        mut body: impl FnMut(&mut Self, Expr) -> Result<()>,
    ) -> Result<()> {
        let (stmt, counter) = self.pkg.times(n, name, Span::NONE)?;
        let i = counter.val();
        let ((), stmts) = self.nested(vec![counter], |me| body(me, i))?;
        self.emit(stmt.body(stmts));
        Ok(())
    }

    fn call(&mut self, f: Runtime, args: Vec<Expr>) -> Result<Expr> {
        let pkg = match f {
            Runtime::Panicf => self.log,
            Runtime::ValParams | Runtime::Exec => self.sql,
        };
        let fun = self.pkg.member(pkg, f.name(), Span::NONE)?;
        let args = args.into_iter().map(Operand::from).collect();
        let call = self.pkg.call(Callee::Expr(fun), args, false, Span::NONE)?;
        if f.is_void() {
            self.emit(call.clone());
        }
        Ok(call)
    }
}
