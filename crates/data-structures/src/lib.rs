//! Common data structures shared by the `kiln` crates.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod index;
pub mod map;
pub mod sync;

mod never;
pub use never::Never;

pub use smallvec;
