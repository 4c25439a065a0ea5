//! Per-body analysis pipeline.

use crate::{
    effect_propagation::Effects,
    effects::CalleeEffects,
    fold::{ConstantFolder, FoldStats},
    invariants::{InvariantFinder, LoopInvariants},
    liveness::{Liveness, LivenessInfo},
};
use kiln_ast::ast::Body;
use kiln_config::{ErrorFormat, Opts, Pass};
use kiln_interface::{Result, diagnostics::DiagCtxt, error_code};
use rayon::prelude::*;

/// The results of analyzing one body.
///
/// Results of passes that did not run are `None`.
#[derive(Debug, Default)]
pub struct BodyAnalysis {
    pub fold: Option<FoldStats>,
    pub effects: Option<Effects>,
    pub liveness: Option<LivenessInfo>,
    pub invariants: Vec<LoopInvariants>,
}

/// Creates the diagnostics context described by the options.
pub fn diag_ctxt(opts: &Opts) -> DiagCtxt {
    let dcx = match opts.error_format {
        ErrorFormat::Human => DiagCtxt::with_stderr_emitter(),
        ErrorFormat::Silent => DiagCtxt::with_silent_emitter(),
    };
    if opts.no_warnings { dcx.disable_warnings() } else { dcx }
}

/// Runs the enabled passes over `body`: folding to a fixed point, then effects, liveness and
/// loop invariants of the folded tree.
///
/// An error emitted while analyzing the body aborts its remaining passes.
#[instrument(name = "analyze_body", level = "debug", skip_all, fields(body = %body.name))]
pub fn analyze_body(
    body: &mut Body,
    opts: &Opts,
    callees: &dyn CalleeEffects,
    dcx: &DiagCtxt,
) -> Result<BodyAnalysis> {
    if let Err(err) = body.validate() {
        let span = if err.span.is_dummy() { body.span } else { err.span };
        return Err(dcx.err(err.to_string()).span(span).code(error_code!(E0101)).emit());
    }

    let mut analysis = BodyAnalysis::default();
    if opts.runs(Pass::Fold) {
        let folder = ConstantFolder::new(dcx, callees);
        analysis.fold = Some(folder.fold_to_fixpoint(body, opts.max_fold_iterations)?);
    }
    let body = &*body;
    if opts.needs(Pass::Effects) {
        analysis.effects = Some(Effects::compute(body, callees));
    }
    if opts.needs(Pass::Liveness) {
        analysis.liveness = Some(Liveness::compute(body));
    }
    if opts.runs(Pass::Invariants)
        && let (Some(effects), Some(liveness)) = (&analysis.effects, &analysis.liveness)
    {
        analysis.invariants = InvariantFinder::find(body, effects, liveness);
        debug!(loops = analysis.invariants.len(), "found loop invariants");
    }
    Ok(analysis)
}

/// Analyzes independent bodies in parallel, on up to [`Opts::threads`] threads.
///
/// Returns one result per body, in order. An error in one body does not affect the others.
#[instrument(name = "analyze_bodies", level = "debug", skip_all, fields(bodies = bodies.len()))]
pub fn analyze_bodies(
    bodies: &mut [Body],
    opts: &Opts,
    callees: &(dyn CalleeEffects + Sync),
    dcx: &DiagCtxt,
) -> Vec<Result<BodyAnalysis>> {
    let analyze = |body: &mut Body| analyze_body(body, opts, callees, dcx);
    let threads = opts.threads().get();
    if threads == 1 || bodies.len() <= 1 {
        return bodies.iter_mut().map(analyze).collect();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(|| bodies.par_iter_mut().map(analyze).collect()),
        Err(err) => {
            warn!(%err, "failed to build thread pool; analyzing sequentially");
            bodies.iter_mut().map(analyze).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::NoSignatures;
    use kiln_ast::{BodyBuilder, ast::*, pretty::body_to_string};

    fn silent() -> DiagCtxt {
        DiagCtxt::with_silent_emitter()
    }

    #[test]
    fn passes_follow_options() {
        let mut b = BodyBuilder::new("f");
        let x = b.local("x", TypeName::INT);
        let (one, two) = (b.int(1), b.int(2));
        let sum = b.binary(one, BinOpKind::Add, two);
        b.decl(x, Some(sum));
        let body = b.finish();

        let dcx = silent();
        let opts = Opts { passes: vec![Pass::Liveness], ..Default::default() };
        let mut unfolded = body.clone();
        let analysis = analyze_body(&mut unfolded, &opts, &NoSignatures, &dcx).unwrap();
        assert!(analysis.fold.is_none() && analysis.effects.is_none());
        assert!(analysis.liveness.is_some());
        assert_eq!(body_to_string(&unfolded), body_to_string(&body));

        let mut folded = body.clone();
        let analysis = analyze_body(&mut folded, &Opts::default(), &NoSignatures, &dcx).unwrap();
        assert!(analysis.fold.is_some_and(|stats| stats.reached_fixpoint));
        assert!(analysis.effects.is_some() && analysis.liveness.is_some());
        assert_eq!(body_to_string(&folded), "{\n    int x = 3;\n}");
    }

    #[test]
    fn malformed_trees_are_errors() {
        // int x = 1; 1; with one literal node in both statements.
        let mut b = BodyBuilder::new("f");
        let x = b.local("x", TypeName::INT);
        let one = b.int(1);
        b.decl(x, Some(one));
        b.expr_stmt(one);
        let mut body = b.finish();

        let dcx = silent();
        assert!(analyze_body(&mut body, &Opts::default(), &NoSignatures, &dcx).is_err());
        assert_eq!(dcx.err_count(), 1);
    }

    #[test]
    fn bodies_fail_independently() {
        let good = |name: &str| {
            let mut b = BodyBuilder::new(name);
            let (one, two) = (b.int(1), b.int(2));
            let sum = b.binary(one, BinOpKind::Mul, two);
            b.return_stmt(Some(sum));
            b.finish()
        };
        let bad = {
            let mut b = BodyBuilder::new("bad");
            let (one, zero) = (b.int(1), b.int(0));
            let rem = b.binary(one, BinOpKind::Rem, zero);
            b.return_stmt(Some(rem));
            b.finish()
        };
        let mut bodies = vec![good("a"), bad, good("c")];

        let dcx = silent();
        let opts = Opts { threads: "2".parse().unwrap(), ..Default::default() };
        let results = analyze_bodies(&mut bodies, &opts, &NoSignatures, &dcx);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok() && results[1].is_err() && results[2].is_ok());
        assert_eq!(dcx.err_count(), 1);
        assert_eq!(body_to_string(&bodies[0]), "{\n    return 2;\n}");
        assert_eq!(body_to_string(&bodies[2]), "{\n    return 2;\n}");
    }
}
