//! Synchronization primitives.
//!
//! Diagnostics are shared between analysis workers, everything else is owned by a single pass.

pub use parking_lot::{Mutex as Lock, RwLock};

pub use std::sync::Arc as Lrc;
