use crate::diagnostics::{Diag, Emitter};
use kiln_data_structures::sync::{Lrc, RwLock};

/// An in-memory diagnostics emitter.
///
/// Diagnostics are pushed to a shared buffer as-is.
///
/// # Warning
///
/// Do **NOT** hold a read lock on the buffer across analysis passes as this will prevent the
/// passes from pushing diagnostics.
pub struct InMemoryEmitter {
    buffer: Lrc<RwLock<Vec<Diag>>>,
}

impl InMemoryEmitter {
    /// Creates a new emitter, returning the emitter itself and the buffer.
    pub fn new() -> (Self, Lrc<RwLock<Vec<Diag>>>) {
        let buffer = Lrc::<RwLock<Vec<Diag>>>::default();
        (Self { buffer: Lrc::clone(&buffer) }, buffer)
    }
}

impl Emitter for InMemoryEmitter {
    fn emit_diagnostic(&mut self, diagnostic: &Diag) {
        self.buffer.write().push(diagnostic.clone());
    }
}
