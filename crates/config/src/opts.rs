//! Analysis options.

use crate::{ErrorFormat, Pass, Threads};
use std::num::NonZeroUsize;

#[cfg(feature = "clap")]
use clap::Parser;

/// The default bound on constant-folding rounds per body.
pub const DEFAULT_MAX_FOLD_ITERATIONS: usize = 16;

/// Options for analyzing method bodies.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "clap", derive(Parser))]
#[cfg_attr(feature = "clap", command(name = "kiln", no_binary_name = true))]
#[allow(clippy::manual_non_exhaustive)]
pub struct Opts {
    /// Comma separated list of passes to run. Runs every pass if empty.
    #[cfg_attr(feature = "clap", arg(long, value_enum, value_delimiter = ','))]
    pub passes: Vec<Pass>,

    /// Maximum number of constant-folding rounds per body.
    ///
    /// Folding stops early once a round makes no change.
    #[cfg_attr(feature = "clap", arg(long, default_value_t = DEFAULT_MAX_FOLD_ITERATIONS))]
    pub max_fold_iterations: usize,

    /// Number of threads to use. Zero specifies the number of logical cores.
    #[cfg_attr(feature = "clap", arg(long, short = 'j', visible_alias = "jobs", default_value_t))]
    pub threads: Threads,

    /// How errors and other messages are produced.
    #[cfg_attr(
        feature = "clap",
        arg(help_heading = "Display options", long, value_enum, default_value_t)
    )]
    pub error_format: ErrorFormat,
    /// Whether to disable warnings.
    #[cfg_attr(feature = "clap", arg(help_heading = "Display options", long))]
    pub no_warnings: bool,

    // Allows `Opts { x: y, ..Default::default() }`.
    #[doc(hidden)]
    #[cfg_attr(feature = "clap", arg(skip))]
    pub _non_exhaustive: (),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            passes: Vec::new(),
            max_fold_iterations: DEFAULT_MAX_FOLD_ITERATIONS,
            threads: Threads::default(),
            error_format: ErrorFormat::default(),
            no_warnings: false,
            _non_exhaustive: (),
        }
    }
}

impl Opts {
    /// Returns the number of threads to use.
    #[inline]
    pub fn threads(&self) -> NonZeroUsize {
        self.threads.0
    }

    /// Returns `true` if `pass` was requested.
    pub fn runs(&self, pass: Pass) -> bool {
        self.passes.is_empty() || self.passes.contains(&pass)
    }

    /// Returns `true` if `pass` has to run, either because it was requested or because a
    /// requested pass consumes its results.
    pub fn needs(&self, pass: Pass) -> bool {
        match pass {
            Pass::Fold | Pass::Invariants => self.runs(pass),
            Pass::Effects | Pass::Liveness => self.runs(pass) || self.runs(Pass::Invariants),
        }
    }
}
