use super::Diag;
use std::any::Any;

mod human;
pub use human::HumanEmitter;

mod mem;
pub use mem::InMemoryEmitter;

/// Dynamic diagnostic emitter. See [`Emitter`].
pub type DynEmitter = dyn Emitter + Send;

/// Diagnostic emitter.
pub trait Emitter: Any {
    /// Emits a diagnostic.
    fn emit_diagnostic(&mut self, diagnostic: &Diag);

    /// Returns `true` if we can use colors in the current output stream.
    #[inline]
    fn supports_color(&self) -> bool {
        false
    }
}

/// Diagnostic emitter that drops every diagnostic.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentEmitter(());

impl SilentEmitter {
    /// Creates a new `SilentEmitter`.
    pub fn new() -> Self {
        Self(())
    }
}

impl Emitter for SilentEmitter {
    #[inline]
    fn emit_diagnostic(&mut self, _diagnostic: &Diag) {}
}

#[cold]
#[inline(never)]
fn io_panic(error: std::io::Error) -> ! {
    panic!("failed to emit diagnostic: {error}");
}
