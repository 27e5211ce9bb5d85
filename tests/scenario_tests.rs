//! End-to-end construction scenarios.
//!
//! Each test assembles a complete fragment through the public builder API
//! and checks either the finalized tree or the diagnostic it fails with.

use stagegen::builder::{ScopeTree, Symbol};
use stagegen::core::Result;
use stagegen::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs a subscriber filtered by `STAGEGEN_LOG`, once per process.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("STAGEGEN_LOG"))
        .with_test_writer()
        .try_init();
}

fn empty_func(pkg: &mut Package, name: &str) -> Result<Func> {
    let sig = pkg.new_signature(vec![], vec![], false)?;
    pkg.new_func(name, &sig, FuncFlags::empty(), Span::point(1, 1))
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn if_with_init_in_function_body() -> Result<()> {
    init_tracing();
    let mut pkg = Package::default();
    let mut func = empty_func(&mut pkg, "main")?;

    let v = pkg.define_var("v", 10, true, Span::point(2, 4))?;
    let cond = pkg.binary_op(v.val(), BinaryOp::Less, 50, Span::point(2, 13))?;
    let args = vec!["Hello, world!".into()];
    let hello = pkg.call("println", args, false, Span::point(3, 2))?;
    func.body_add(pkg.if_stmt(Span::point(2, 1)).init(v).cond(cond).add(hello));

    let decl = func.decl(&mut pkg)?;
    assert_eq!(decl.name, "main");
    assert_eq!(decl.body.stmts.len(), 1);
    let ast::Stmt::If(stmt) = &decl.body.stmts[0] else {
        panic!("expected an if statement, got {:?}", decl.body.stmts[0]);
    };
    let Some(ast::Stmt::Assign { tok, lhs, .. }) = &stmt.init else {
        panic!("expected an assignment, got {:?}", stmt.init);
    };
    assert_eq!(*tok, ast::AssignTok::Define);
    assert_eq!(lhs[0].to_string(), "v");
    assert_eq!(stmt.cond.to_string(), "v < 50");
    assert_eq!(stmt.body.stmts.len(), 1);
    assert!(matches!(
        &stmt.body.stmts[0],
        ast::Stmt::Expr(call) if call.to_string() == "println(\"Hello, world!\")"
    ));
    assert!(stmt.else_branch.is_none());

    pkg.emit(decl);
    let file = pkg.into_file();
    assert_eq!(file.decls.len(), 1);
    Ok(())
}

#[test]
fn counted_loop_appends_in_body() -> Result<()> {
    init_tracing();
    let mut pkg = Package::default();
    let int = pkg.types().int();
    let ints = pkg.types_mut().slice(int);
    let sig = pkg.new_signature(vec![("n", int)], vec![ints], false)?;
    let mut func = pkg.new_func("upto", &sig, FuncFlags::empty(), Span::NONE)?;

    let n = func.param_val(&pkg, "n")?;
    let made = pkg.make_cap(ints, 0, &n, Span::NONE)?;
    let out = pkg.define_var("out", made, true, Span::NONE)?;
    let (lp, i) = pkg.times(&n, "i", Span::NONE)?;
    let grow = pkg.append_to(&out, &i, Span::NONE)?;
    let ret = pkg.return_stmt(vec![out.val()], Span::NONE);
    func.body(vec![out.into(), lp.add(grow).into(), ret.into()]);

    let decl = func.decl(&mut pkg)?;
    assert_eq!(decl.typ.to_string(), "func(n int) []int");
    let ast::Stmt::For(lp) = &decl.body.stmts[1] else {
        panic!("expected a loop");
    };
    let cond = lp.cond.as_ref().map(ToString::to_string);
    assert_eq!(cond.as_deref(), Some("i < n"));
    let ast::Stmt::Assign { rhs, .. } = &lp.body.stmts[0] else {
        panic!("expected an assignment");
    };
    assert_eq!(rhs[0].to_string(), "append(out, i)");
    Ok(())
}

// =============================================================================
// Assignability
// =============================================================================

#[test]
fn multi_value_call_arity_mismatch_names_call() -> Result<()> {
    init_tracing();
    let mut pkg = Package::default();
    let (int, string, error) = (pkg.types().int(), pkg.types().string(), pkg.types().error());
    let sig = pkg.new_signature(vec![], vec![int, string, error], false)?;
    pkg.new_func("triple", &sig, FuncFlags::empty(), Span::NONE)?;

    let call = pkg.call("triple", vec![], false, Span::point(5, 9))?;
    let a = pkg.define_var("a", 0, true, Span::NONE)?;
    let b = pkg.define_var("b", "", true, Span::NONE)?;
    let stmt = pkg
        .assign(Span::point(5, 1))
        .lhs(vec![a.reference(), b.reference()])
        .rhs(vec![call]);

    let root = pkg.root();
    let mut ctx = BlockCtx::new(&mut pkg, root);
    let err = Stmt::from(stmt).build(&mut ctx).unwrap_err();
    assert!(err.is_arity_mismatch());
    assert_eq!(
        err.to_string(),
        "at 5:1: assignment mismatch: 2 variables but triple returns 3 values"
    );
    Ok(())
}

#[test]
fn arity_is_reported_before_assignability() -> Result<()> {
    let mut pkg = Package::default();
    let a = pkg.define_var("a", 0, true, Span::NONE)?;
    let stmt = pkg
        .assign(Span::point(2, 1))
        .lhs(vec![a.reference(), a.val()])
        .rhs(vec![pkg.new_expr("x")]);
    let root = pkg.root();
    let mut ctx = BlockCtx::new(&mut pkg, root);
    let err = Stmt::from(stmt).build(&mut ctx).unwrap_err();
    let want = "at 2:1: assignment mismatch: 2 variables but 1 values";
    assert_eq!(err.to_string(), want);
    Ok(())
}

// =============================================================================
// Containers
// =============================================================================

#[test]
fn comma_ok_map_index_is_a_pair() -> Result<()> {
    let mut pkg = Package::default();
    let (string, int) = (pkg.types().string(), pkg.types().int());
    let map = pkg.types_mut().map(string, int);
    let m = pkg.new_var("m", Some(map), None, false, Span::NONE)?;

    let got = pkg.index(true, &m.val(), vec!["k".into()], Span::NONE)?;
    let bool_t = pkg.types().bool();
    assert_eq!(pkg.types().tuple_elems(got.typ()), Some(&[int, bool_t][..]));
    assert_eq!(got.to_string(), "m[\"k\"]");

    let plain = pkg.index(false, &m.val(), vec!["k".into()], Span::NONE)?;
    assert_eq!(plain.typ(), int);
    assert_eq!(plain.kind(pkg.types()), Kind::Basic);
    Ok(())
}

#[test]
fn index_key_mismatch_degrades() -> Result<()> {
    let mut pkg = Package::default();
    let (string, int) = (pkg.types().string(), pkg.types().int());
    let map = pkg.types_mut().map(string, int);
    let m = pkg.new_var("m", Some(map), None, false, Span::NONE)?;

    let got = pkg.index(false, &m.val(), vec![1.into()], Span::point(9, 2))?;
    assert!(got.is_invalid(pkg.types()));
    assert_eq!(pkg.diagnostics().len(), 1);

    // Any further use of the degraded node is a hard error.
    assert!(pkg.binary_op(&got, BinaryOp::Add, 1, Span::NONE).is_err());
    assert_eq!(pkg.take_diagnostics().len(), 1);
    assert!(pkg.diagnostics().is_empty());
    Ok(())
}

#[test]
fn three_index_string_slice_is_rejected() -> Result<()> {
    let mut pkg = Package::default();
    let string = pkg.types().string();
    let s = pkg.new_var("s", Some(string), None, false, Span::NONE)?;

    let (lo, hi, max) = (Some(0.into()), Some(1.into()), Some(2.into()));
    let at = Span::point(7, 3);
    let err = pkg.slice(&s.val(), lo, hi, max, at).unwrap_err();
    let want = "at 7:3: invalid operation s[0:1:2] (3-index slice of string)";
    assert_eq!(err.to_string(), want);

    let (lo, hi) = (Some(0.into()), Some(1.into()));
    let two = pkg.slice(&s.val(), lo, hi, None, Span::NONE)?;
    assert_eq!(two.typ(), string);
    Ok(())
}

#[test]
fn array_reslices_to_sequence() -> Result<()> {
    let mut pkg = Package::default();
    let int = pkg.types().int();
    let arr = pkg.types_mut().array(int, 4);
    let ptr = pkg.types_mut().pointer(arr);
    let p = pkg.new_var("p", Some(ptr), None, false, Span::NONE)?;
    let got = pkg.slice(&p.val(), None, Some(2.into()), None, Span::NONE)?;
    assert_eq!(got.kind(pkg.types()), Kind::Sequence);
    assert_eq!(got.to_string(), "p[:2]");
    Ok(())
}

// =============================================================================
// Scopes
// =============================================================================

#[test]
fn child_shadows_parent_and_siblings_are_isolated() {
    let mut tree = ScopeTree::new("package");
    let universe = TypeUniverse::new();
    let (int, string) = (universe.int(), universe.string());
    let root = tree.root();
    let left = tree.new_child(root, Span::NONE, "left");
    let right = tree.new_child(root, Span::NONE, "right");
    let var = |typ| Symbol::Var {
        typ,
        span: Span::NONE,
    };
    tree.insert(root, "x", var(int));
    tree.insert(left, "x", var(string));

    let (found, sym) = tree.lookup(left, "x").unwrap();
    assert_eq!(found, left);
    assert_eq!(sym, &var(string));

    let (found, _) = tree.lookup(right, "x").unwrap();
    assert_eq!(found, root);
    assert_eq!(tree.depth(left), 1);
}
