#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(test, allow(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

// Convenience re-exports.
pub use kiln_ast::ast;
pub use kiln_interface as interface;

pub mod value;
pub use value::{Value, ValueKind};

pub mod eval;
pub use eval::{ConstantEvaluator, EvalContext, EvalError, EvalErrorKind};

pub mod fold;
pub use fold::{ConstantFolder, FoldStats};

pub mod effects;
pub use effects::{CalleeEffects, EffectKind, EffectSet, NoSignatures, SignatureTable};

pub mod effect_propagation;
pub use effect_propagation::Effects;

pub mod liveness;
pub use liveness::{LiveSet, Liveness, LivenessInfo};

pub mod invariants;
pub use invariants::{InvariantCandidate, InvariantFinder, LoopInvariants};

mod writes;

pub mod driver;
pub use driver::{BodyAnalysis, analyze_bodies, analyze_body, diag_ctxt};
