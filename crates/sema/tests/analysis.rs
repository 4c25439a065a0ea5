#![allow(unused_crate_dependencies)]

use kiln_ast::{
    BodyBuilder,
    ast::*,
    pretty::{body_to_string, expr_to_string},
};
use kiln_config::{Opts, Pass};
use kiln_interface::{
    diagnostics::{DiagCtxt, Level},
    error_code,
};
use kiln_sema::{
    BodyAnalysis, CalleeEffects, EffectSet, Effects, LiveSet, NoSignatures, SignatureTable,
    analyze_bodies, analyze_body,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn analyze(body: &mut Body, opts: &Opts, callees: &dyn CalleeEffects) -> BodyAnalysis {
    init_tracing();
    let dcx = DiagCtxt::with_silent_emitter();
    let analysis = analyze_body(body, opts, callees, &dcx).unwrap();
    assert_eq!(dcx.err_count(), 0);
    analysis
}

fn only(pass: Pass) -> Opts {
    Opts { passes: vec![pass], ..Default::default() }
}

#[test]
fn folds_constants_and_keeps_unknowns() {
    // long y = 1 + 2L; boolean n = null == null; int z = u + 1; return z * 0;
    let mut b = BodyBuilder::new("f");
    let u = b.param("u", TypeName::INT);
    let y = b.local("y", TypeName::LONG);
    let n = b.local("n", TypeName::BOOLEAN);
    let z = b.local("z", TypeName::INT);
    let (one, two) = (b.int(1), b.long(2));
    let sum = b.binary(one, BinOpKind::Add, two);
    b.decl(y, Some(sum));
    let (l, r) = (b.null(), b.null());
    let eq = b.binary(l, BinOpKind::Eq, r);
    b.decl(n, Some(eq));
    let (ru, one) = (b.ident(u), b.int(1));
    let sum = b.binary(ru, BinOpKind::Add, one);
    b.decl(z, Some(sum));
    let (rz, zero) = (b.ident(z), b.int(0));
    let prod = b.binary(rz, BinOpKind::Mul, zero);
    b.return_stmt(Some(prod));
    let mut body = b.finish();

    let analysis = analyze(&mut body, &only(Pass::Fold), &NoSignatures);
    assert_eq!(
        body_to_string(&body),
        "{\n    long y = 3L;\n    boolean n = true;\n    int z = u + 1;\n    return z * 0;\n}"
    );
    let stats = analysis.fold.unwrap();
    assert!(stats.reached_fixpoint);
    assert_eq!(stats.rewrites, 2);

    // A second run has nothing left to do.
    let again = analyze(&mut body, &only(Pass::Fold), &NoSignatures).fold.unwrap();
    assert_eq!((again.iterations, again.rewrites), (1, 0));
}

#[test]
fn string_identity_comparison_warns() {
    // boolean s = "a" == "a";
    let mut b = BodyBuilder::new("f");
    let s = b.local("s", TypeName::BOOLEAN);
    let (l, r) = (b.str("a"), b.str("a"));
    let eq = b.binary(l, BinOpKind::Eq, r);
    b.decl(s, Some(eq));
    let mut body = b.finish();

    let (dcx, buffer) = DiagCtxt::with_buffer_emitter();
    analyze_body(&mut body, &Opts::default(), &NoSignatures, &dcx).unwrap();
    assert_eq!(body_to_string(&body), "{\n    boolean s = false;\n}");

    let diags = buffer.read();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].level(), Level::Warning);
    assert!(diags[0].label().contains("identity"));
    assert!(diags[0].children.iter().any(|c| c.level == Level::Help));
}

#[test]
fn modeling_errors_are_reported_per_body() {
    let mut bodies = ["a", "b", "c", "d"].map(|name| {
        // return x / d; with d = 0 in `b`.
        let mut b = BodyBuilder::new(name);
        let x = b.local("x", TypeName::INT);
        let d = b.local("d", TypeName::INT);
        let ten = b.int(10);
        b.decl(x, Some(ten));
        let divisor = b.int(if name == "b" { 0 } else { 5 });
        b.decl(d, Some(divisor));
        let (rx, rd) = (b.ident(x), b.ident(d));
        let div = b.binary(rx, BinOpKind::Div, rd);
        b.return_stmt(Some(div));
        b.finish()
    });

    init_tracing();
    let (dcx, buffer) = DiagCtxt::with_buffer_emitter();
    let opts = Opts { threads: "4".parse().unwrap(), ..Default::default() };
    let results = analyze_bodies(&mut bodies, &opts, &NoSignatures, &dcx);
    let failed: Vec<_> = results.iter().map(Result::is_err).collect();
    assert_eq!(failed, [false, true, false, false]);

    let diags = buffer.read();
    assert_eq!(diags.len(), 1);
    assert!(diags[0].is_error());
    assert_eq!(diags[0].code, Some(error_code!(E0201)));
    assert!(body_to_string(&bodies[0]).ends_with("return 2;\n}"));
}

#[test]
fn effects_of_analyzed_callees() {
    // void g() { T.count = T.count + 1; }
    let mut b = BodyBuilder::new("g");
    let (target, read) = (b.static_field("count"), b.static_field("count"));
    let one = b.int(1);
    let sum = b.binary(read, BinOpKind::Add, one);
    let assign = b.assign(target, sum);
    b.expr_stmt(assign);
    let mut g = b.finish();

    // void h(int k) { int j = k; g(); }
    let mut b = BodyBuilder::new("h");
    let k = b.param("k", TypeName::INT);
    let j = b.local("j", TypeName::INT);
    let rk = b.ident(k);
    let decl = b.decl(j, Some(rk));
    let call = b.call(None, Callee::new("T", "g", 0), vec![]);
    let call_stmt = b.expr_stmt(call);
    let h = b.finish();

    let summary = analyze(&mut g, &only(Pass::Effects), &NoSignatures).effects.unwrap().summary();
    assert_eq!(summary, EffectSet::READ_GLOBAL | EffectSet::WRITE_GLOBAL);

    let table: SignatureTable = [(Callee::new("T", "g", 0), summary)].into_iter().collect();
    let effects = analyze(&mut h.clone(), &only(Pass::Effects), &table).effects.unwrap();
    assert_eq!(effects.stmt(decl), EffectSet::READ_LOCAL | EffectSet::WRITE_LOCAL);
    assert_eq!(effects.stmt(call_stmt), summary);
    assert!(!effects.body().contains(EffectSet::EXCEPTION));
    assert_monotonic(&h, &effects);

    let unknown = analyze(&mut h.clone(), &only(Pass::Effects), &NoSignatures).effects.unwrap();
    assert_eq!(unknown.expr(call), EffectSet::ALL);
    assert!(unknown.body().contains(effects.body()));
}

fn assert_monotonic(body: &Body, effects: &Effects) {
    for &stmt in &body.block {
        body.walk_stmt_exprs(stmt, &mut |e| {
            for child in body.expr(e).kind.children() {
                assert!(effects.expr(e).contains(effects.expr(child)));
            }
        });
    }
}

#[test]
fn liveness_through_a_sequence() {
    // int a = p; int b = a + 1; return b;
    let mut b = BodyBuilder::new("f");
    let p = b.param("p", TypeName::INT);
    let a = b.local("a", TypeName::INT);
    let bv = b.local("b", TypeName::INT);
    let rp = b.ident(p);
    let s1 = b.decl(a, Some(rp));
    let (ra, one) = (b.ident(a), b.int(1));
    let sum = b.binary(ra, BinOpKind::Add, one);
    let s2 = b.decl(bv, Some(sum));
    let rb = b.ident(bv);
    let s3 = b.return_stmt(Some(rb));
    let mut body = b.finish();

    let info = analyze(&mut body, &only(Pass::Liveness), &NoSignatures).liveness.unwrap();
    let set = |vars: &[VarId]| vars.iter().copied().collect::<LiveSet>();
    assert_eq!(info.live_in(s1), &set(&[p]));
    assert_eq!(info.live_out(s1), &set(&[a]));
    assert_eq!(info.live_in(s2), &set(&[a]));
    assert_eq!(info.live_in(s3), &set(&[bv]));
    assert!(info.live_out(s3).is_empty());
    assert_eq!(info.kills(s1), &set(&[a]));
    assert_eq!(info.ever_live(), &set(&[p, a, bv]));
}

#[test]
fn loop_invariants_are_deduplicated() {
    // int s = 0; for (int i = 0; i < n; i++) { s += k * 2; s += k * 2; } return s;
    let mut b = BodyBuilder::new("f");
    let n = b.param("n", TypeName::INT);
    let k = b.param("k", TypeName::INT);
    let s = b.local("s", TypeName::INT);
    let i = b.local("i", TypeName::INT);
    let zero = b.int(0);
    b.decl(s, Some(zero));
    let init = b.stmts(|b| {
        let zero = b.int(0);
        b.decl(i, Some(zero));
    });
    let (ri, rn) = (b.ident(i), b.ident(n));
    let cond = b.binary(ri, BinOpKind::Lt, rn);
    let ti = b.ident(i);
    let update = b.unary(UnOpKind::PostInc, ti);
    let stmt = b.block(|b| {
        for _ in 0..2 {
            let (t, rk, two) = (b.ident(s), b.ident(k), b.int(2));
            let prod = b.binary(rk, BinOpKind::Mul, two);
            let e = b.assign_op(t, BinOpKind::Add, prod);
            b.expr_stmt(e);
        }
    });
    let for_ = b.for_stmt(init, Some(cond), vec![update], stmt);
    let rs = b.ident(s);
    b.return_stmt(Some(rs));
    let mut body = b.finish();

    let analysis = analyze(&mut body, &Opts::default(), &NoSignatures);
    assert_eq!(analysis.invariants.len(), 1);
    let found = &analysis.invariants[0];
    assert_eq!(found.loop_stmt, for_);
    assert_eq!(found.candidates.len(), 1);
    let candidate = &found.candidates[0];
    assert_eq!(candidate.occurrences.len(), 2);
    assert_eq!(candidate.occurrences[0], candidate.representative);
    assert_eq!(expr_to_string(&body, candidate.representative), "k * 2");
}
