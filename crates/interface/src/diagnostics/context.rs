use super::{
    Diag, DiagBuilder, DiagMsg, DynEmitter, EmissionGuarantee, ErrorGuaranteed, HumanEmitter,
    InMemoryEmitter, Level, SilentEmitter,
};
use kiln_data_structures::{
    map::{FxHashSet, rustc_hash::FxBuildHasher},
    sync::{Lock, Lrc, RwLock},
};
use std::hash::BuildHasher;

/// A handler deals with errors and other analyzer output.
///
/// Diagnostics are deduplicated and counted before being handed to the emitter.
pub struct DiagCtxt {
    inner: Lock<DiagCtxtInner>,
}

struct DiagCtxtInner {
    emitter: Box<DynEmitter>,

    /// The number of errors that have been emitted, including duplicates.
    err_count: usize,
    deduplicated_err_count: usize,
    warn_count: usize,
    deduplicated_warn_count: usize,

    /// This set contains a hash of every diagnostic that has been emitted by this `DiagCtxt`.
    /// These hashes are used to avoid emitting the same diagnostic twice.
    emitted_diagnostics: FxHashSet<u64>,

    can_emit_warnings: bool,
}

impl DiagCtxt {
    /// Creates a new `DiagCtxt` with the given diagnostics emitter.
    pub fn new(emitter: Box<DynEmitter>) -> Self {
        Self {
            inner: Lock::new(DiagCtxtInner {
                emitter,
                err_count: 0,
                deduplicated_err_count: 0,
                warn_count: 0,
                deduplicated_warn_count: 0,
                emitted_diagnostics: FxHashSet::default(),
                can_emit_warnings: true,
            }),
        }
    }

    /// Creates a new `DiagCtxt` that renders to stderr.
    pub fn with_stderr_emitter() -> Self {
        Self::new(Box::new(HumanEmitter::stderr(anstream::ColorChoice::Auto)))
    }

    /// Creates a new `DiagCtxt` that stores every emitted diagnostic in the returned buffer.
    pub fn with_buffer_emitter() -> (Self, Lrc<RwLock<Vec<Diag>>>) {
        let (emitter, buffer) = InMemoryEmitter::new();
        (Self::new(Box::new(emitter)), buffer)
    }

    /// Creates a new `DiagCtxt` that does not emit anything. Diagnostics are still counted.
    pub fn with_silent_emitter() -> Self {
        Self::new(Box::new(SilentEmitter::new()))
    }

    /// Disables emitting warnings.
    pub fn disable_warnings(mut self) -> Self {
        self.inner.get_mut().can_emit_warnings = false;
        self
    }

    /// Sets whether warnings are emitted.
    pub fn set_emit_warnings(&self, yes: bool) {
        self.inner.lock().can_emit_warnings = yes;
    }

    /// Emits the given diagnostic with this context.
    #[inline]
    pub fn emit_diagnostic(&self, mut diagnostic: Diag) -> Option<ErrorGuaranteed> {
        self.emit_diagnostic_without_consuming(&mut diagnostic)
    }

    /// Emits the given diagnostic with this context, without consuming the diagnostic.
    ///
    /// **Note:** This function is intended to be used only internally in `DiagBuilder`.
    /// Use [`emit_diagnostic`](Self::emit_diagnostic) instead.
    pub(super) fn emit_diagnostic_without_consuming(
        &self,
        diagnostic: &mut Diag,
    ) -> Option<ErrorGuaranteed> {
        self.inner.lock().emit_diagnostic_without_consuming(diagnostic)
    }

    /// Returns the number of errors that have been emitted, including duplicates.
    #[inline]
    pub fn err_count(&self) -> usize {
        self.inner.lock().err_count
    }

    /// Returns the number of warnings that have been emitted, including duplicates.
    #[inline]
    pub fn warn_count(&self) -> usize {
        self.inner.lock().warn_count
    }

    /// Returns the number of errors and warnings that reached the emitter.
    pub fn deduplicated_counts(&self) -> (usize, usize) {
        let inner = self.inner.lock();
        (inner.deduplicated_err_count, inner.deduplicated_warn_count)
    }

    /// Returns `Err` if any errors have been emitted.
    pub fn has_errors(&self) -> Result<(), ErrorGuaranteed> {
        if self.inner.lock().err_count > 0 {
            Err(ErrorGuaranteed::new_unchecked())
        } else {
            Ok(())
        }
    }
}

/// Diagnostic constructors.
///
/// Note that methods returning a [`DiagBuilder`] must also marked with `#[track_caller]`.
impl DiagCtxt {
    /// Creates a builder at the given `level` with the given `msg`.
    #[track_caller]
    pub fn diag<G: EmissionGuarantee>(
        &self,
        level: Level,
        msg: impl Into<DiagMsg>,
    ) -> DiagBuilder<'_, G> {
        DiagBuilder::new(self, level, msg)
    }

    /// Creates a builder at the `Error` level with the given `msg`.
    #[track_caller]
    pub fn err(&self, msg: impl Into<DiagMsg>) -> DiagBuilder<'_, ErrorGuaranteed> {
        self.diag(Level::Error, msg)
    }

    /// Creates a builder at the `Warning` level with the given `msg`.
    ///
    /// Attempting to `.emit()` the builder will only emit if `can_emit_warnings` is `true`.
    #[track_caller]
    pub fn warn(&self, msg: impl Into<DiagMsg>) -> DiagBuilder<'_, ()> {
        self.diag(Level::Warning, msg)
    }

    /// Creates a builder at the `Help` level with the given `msg`.
    #[track_caller]
    pub fn help(&self, msg: impl Into<DiagMsg>) -> DiagBuilder<'_, ()> {
        self.diag(Level::Help, msg)
    }

    /// Creates a builder at the `Note` level with the given `msg`.
    #[track_caller]
    pub fn note(&self, msg: impl Into<DiagMsg>) -> DiagBuilder<'_, ()> {
        self.diag(Level::Note, msg)
    }
}

impl DiagCtxtInner {
    fn emit_diagnostic_without_consuming(
        &mut self,
        diagnostic: &mut Diag,
    ) -> Option<ErrorGuaranteed> {
        if diagnostic.level == Level::Warning && !self.can_emit_warnings {
            return None;
        }

        if diagnostic.level == Level::Allow {
            return None;
        }

        let already_emitted = self.insert_diagnostic(diagnostic);
        if !already_emitted {
            // Remove duplicate `Once*` subdiagnostics.
            diagnostic.children.retain(|sub| {
                if !matches!(sub.level, Level::OnceNote | Level::OnceHelp) {
                    return true;
                }
                let sub_already_emitted = self.insert_diagnostic(sub);
                !sub_already_emitted
            });

            trace!(level = %diagnostic.level, msg = %diagnostic.label(), "emitting diagnostic");
            self.emitter.emit_diagnostic(diagnostic);
            if diagnostic.is_error() {
                self.deduplicated_err_count += 1;
            } else if diagnostic.level == Level::Warning {
                self.deduplicated_warn_count += 1;
            }
        }

        if diagnostic.is_error() {
            self.err_count += 1;
            Some(ErrorGuaranteed::new_unchecked())
        } else {
            if diagnostic.level == Level::Warning {
                self.warn_count += 1;
            }
            None
        }
    }

    /// Inserts the given diagnostic into the set of emitted diagnostics.
    /// Returns `true` if the diagnostic was already emitted.
    fn insert_diagnostic<H: std::hash::Hash>(&mut self, diag: &H) -> bool {
        let hash = FxBuildHasher.hash_one(diag);
        !self.emitted_diagnostics.insert(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Span, error_code};

    #[test]
    fn dedup_and_counts() {
        let (dcx, buffer) = DiagCtxt::with_buffer_emitter();
        let span = Span::from_range(1..4);
        let _ = dcx.err("division by zero").code(error_code!(E0101)).span(span).emit();
        let _ = dcx.err("division by zero").code(error_code!(E0101)).span(span).emit();
        dcx.warn("suspicious comparison").emit();

        assert_eq!(dcx.err_count(), 2);
        assert_eq!(dcx.warn_count(), 1);
        assert_eq!(dcx.deduplicated_counts(), (1, 1));
        assert!(dcx.has_errors().is_err());
        assert_eq!(buffer.read().len(), 2);
    }

    #[test]
    fn warnings_disabled() {
        let (dcx, buffer) = DiagCtxt::with_buffer_emitter();
        let dcx = dcx.disable_warnings();
        dcx.warn("ignored").emit();
        assert_eq!(dcx.warn_count(), 0);
        assert!(buffer.read().is_empty());
        assert!(dcx.has_errors().is_ok());
    }

    #[test]
    fn once_notes() {
        let (dcx, buffer) = DiagCtxt::with_buffer_emitter();
        dcx.warn("first").note_once("shown once").emit();
        dcx.warn("second").note_once("shown once").emit();
        let diags = buffer.read();
        assert_eq!(diags[0].children.len(), 1);
        assert!(diags[1].children.is_empty());
    }

    #[test]
    #[should_panic = "diagnostic was constructed but not emitted"]
    fn unemitted_panics() {
        let dcx = DiagCtxt::with_silent_emitter();
        let _diag = dcx.err("never emitted");
    }
}
