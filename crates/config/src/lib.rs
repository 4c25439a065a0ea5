#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(test, allow(unused_crate_dependencies))]

use std::num::NonZeroUsize;

#[macro_use]
mod macros;

mod opts;
pub use opts::{DEFAULT_MAX_FOLD_ITERATIONS, Opts};

#[cfg(feature = "serde")]
mod utils;

str_enum! {
    /// An analysis pass over a single method body.
    ///
    /// Passes always run in declaration order. The invariant finder consumes the results of the
    /// effect and liveness passes, which run on demand when it is requested.
    #[derive(strum::EnumIs)]
    #[strum(serialize_all = "kebab-case")]
    pub enum Pass {
        /// Constant folding, repeated until the tree no longer changes.
        Fold,
        /// Effect propagation.
        Effects,
        /// Backward live-variable analysis.
        Liveness,
        /// Loop-invariant expression discovery.
        Invariants,
    }
}

str_enum! {
    /// How errors and other messages are produced.
    #[derive(Default)]
    #[strum(serialize_all = "kebab-case")]
    pub enum ErrorFormat {
        /// Human-readable output on stderr.
        #[default]
        Human,
        /// Diagnostics are counted but not printed.
        Silent,
    }
}

/// Wrapper to implement a custom `Default` value for the number of threads.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Threads(pub NonZeroUsize);

impl From<Threads> for NonZeroUsize {
    fn from(threads: Threads) -> Self {
        threads.0
    }
}

impl From<NonZeroUsize> for Threads {
    fn from(n: NonZeroUsize) -> Self {
        Self(n)
    }
}

impl Default for Threads {
    fn default() -> Self {
        Self(NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN))
    }
}

impl std::str::FromStr for Threads {
    type Err = <NonZeroUsize as std::str::FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<usize>().map(|n| {
            Self(
                NonZeroUsize::new(n)
                    .or_else(|| std::thread::available_parallelism().ok())
                    .unwrap_or(NonZeroUsize::MIN),
            )
        })
    }
}

impl std::fmt::Display for Threads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for Threads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn string_enum() {
        for value in Pass::iter() {
            let s = value.to_str();
            assert_eq!(value.to_string(), s);
            assert_eq!(value, s.parse().unwrap());

            #[cfg(feature = "serde")]
            {
                let json_s = format!("\"{value}\"");
                assert_eq!(serde_json::to_string(&value).unwrap(), json_s);
                assert_eq!(serde_json::from_str::<Pass>(&json_s).unwrap(), value);
            }
        }
        assert_eq!(ErrorFormat::default().to_str(), "human");
        assert!("folding".parse::<Pass>().is_err());
    }

    #[test]
    fn threads() {
        assert_eq!("3".parse::<Threads>().unwrap().0.get(), 3);
        assert!("0".parse::<Threads>().unwrap().0.get() >= 1);
        assert!("many".parse::<Threads>().is_err());
        assert_eq!(Threads::default().to_string(), "8");
    }
}
