//! Diagnostics implementation.
//!
//! Errors are reported through a [`DiagCtxt`] which forwards them to an [`Emitter`]. Emitting an
//! error yields an [`ErrorGuaranteed`] token that analysis passes return to signal that the user
//! has already been told about the failure.

use std::{fmt, panic::Location};

mod builder;
pub use builder::{DiagBuilder, EmissionGuarantee};

mod context;
pub use context::DiagCtxt;

mod emitter;
pub use emitter::{DynEmitter, Emitter, HumanEmitter, InMemoryEmitter, SilentEmitter};

mod message;
pub use message::{DiagMsg, MultiSpan, SpanLabel};

/// Useful type to use with [`Result`] indicate that an error has already been reported to the user,
/// so no need to continue checking.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    /// Creates a new `ErrorGuaranteed`.
    ///
    /// Use of this method is discouraged; emit an error through a [`DiagCtxt`] instead.
    #[doc(hidden)]
    #[inline]
    pub const fn new_unchecked() -> Self {
        Self(())
    }
}

impl fmt::Display for ErrorGuaranteed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an error has already been emitted")
    }
}

impl std::error::Error for ErrorGuaranteed {}

/// Diagnostic ID.
///
/// Use [`error_code!`](crate::error_code) to create an error code diagnostic ID.
///
/// # Examples
///
/// ```
/// # use kiln_interface::error_code;
/// assert_eq!(error_code!(E0102).id(), 102);
/// assert_eq!(error_code!(E0102).to_string(), "E0102");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiagId {
    id: u32,
}

impl DiagId {
    /// Creates an error code diagnostic ID.
    ///
    /// Use [`error_code!`](crate::error_code) instead.
    #[doc(hidden)]
    #[track_caller]
    pub const fn new_from_macro(s: &'static str) -> Self {
        let [b'E', bytes @ ..] = s.as_bytes() else { panic!("error codes must start with 'E'") };
        assert!(bytes.len() == 4, "error codes must be exactly 4 digits long");

        let mut bytes = bytes;
        let mut id = 0;
        while let &[byte, ref rest @ ..] = bytes {
            assert!(byte.is_ascii_digit(), "error codes must be decimal");
            id = id * 10 + (byte - b'0') as u32;
            bytes = rest;
        }
        Self { id }
    }

    /// Returns the internal ID.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for DiagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.id)
    }
}

/// Used for creating an error code.
#[macro_export]
macro_rules! error_code {
    ($id:ident) => {{
        const $id: $crate::diagnostics::DiagId =
            $crate::diagnostics::DiagId::new_from_macro(stringify!($id));
        $id
    }};
}

/// Diagnostic level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// An error in the analyzed body which aborts the analysis of that body.
    ///
    /// Its `EmissionGuarantee` is `ErrorGuaranteed`.
    Error,

    /// A warning about the analyzed code. Does not abort the analysis.
    ///
    /// Its `EmissionGuarantee` is `()`.
    Warning,

    /// A message giving additional context.
    ///
    /// Its `EmissionGuarantee` is `()`.
    Note,

    /// A note that is only emitted once.
    OnceNote,

    /// A message suggesting how to fix something.
    ///
    /// Its `EmissionGuarantee` is `()`.
    Help,

    /// A help that is only emitted once.
    OnceHelp,

    /// Diagnostics at this level are never emitted.
    Allow,
}

impl Level {
    /// Returns the string representation of the level.
    pub fn to_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note | Self::OnceNote => "note",
            Self::Help | Self::OnceHelp => "help",
            Self::Allow => "allow",
        }
    }

    /// Returns whether this level is an error.
    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Returns the style of this level.
    pub const fn style(self) -> anstyle::Style {
        anstyle::Style::new().fg_color(self.color()).bold()
    }

    /// Returns the color of this level.
    pub const fn color(self) -> Option<anstyle::Color> {
        let color = match self {
            Self::Error => anstyle::AnsiColor::BrightRed,
            Self::Warning => anstyle::AnsiColor::BrightYellow,
            Self::Note | Self::OnceNote => anstyle::AnsiColor::BrightGreen,
            Self::Help | Self::OnceHelp => anstyle::AnsiColor::BrightCyan,
            Self::Allow => return None,
        };
        Some(anstyle::Color::Ansi(color))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A diagnostic: a message, its level, optional code, spans and attached sub-diagnostics.
#[must_use]
#[derive(Clone, Debug)]
pub struct Diag {
    pub(crate) level: Level,

    pub messages: Vec<DiagMsg>,
    pub span: MultiSpan,
    pub children: Vec<SubDiagnostic>,
    pub code: Option<DiagId>,

    /// Where in the analyzer the diagnostic was created.
    pub created_at: &'static Location<'static>,
}

/// A "sub"-diagnostic attached to a parent diagnostic.
/// For example, a note attached to an error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubDiagnostic {
    pub level: Level,
    pub messages: Vec<DiagMsg>,
    pub span: MultiSpan,
}

impl SubDiagnostic {
    /// Formats the messages into a single string.
    pub fn label(&self) -> String {
        self.messages.iter().map(DiagMsg::as_str).collect()
    }
}

impl PartialEq for Diag {
    fn eq(&self, other: &Self) -> bool {
        self.keys() == other.keys()
    }
}

impl std::hash::Hash for Diag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.keys().hash(state);
    }
}

impl Diag {
    /// Creates a new `Diag` with a single message.
    #[track_caller]
    pub fn new<M: Into<DiagMsg>>(level: Level, msg: M) -> Self {
        Self::new_with_messages(level, vec![msg.into()])
    }

    /// Creates a new `Diag` with multiple messages.
    #[track_caller]
    pub fn new_with_messages(level: Level, messages: Vec<DiagMsg>) -> Self {
        Self {
            level,
            messages,
            code: None,
            span: MultiSpan::new(),
            children: vec![],
            created_at: Location::caller(),
        }
    }

    /// Returns whether this diagnostic is an error.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.level.is_error()
    }

    /// Returns the messages of this diagnostic.
    pub fn messages(&self) -> &[DiagMsg] {
        &self.messages
    }

    /// Formats the messages into a single string.
    pub fn label(&self) -> String {
        self.messages.iter().map(DiagMsg::as_str).collect()
    }

    /// Returns the level of this diagnostic.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Fields used for `PartialEq` and `Hash` implementations.
    fn keys(&self) -> impl PartialEq + std::hash::Hash + '_ {
        (&self.level, &self.messages, &self.code, &self.span, &self.children)
    }
}

impl Diag {
    /// Sets the span of this diagnostic.
    pub fn span(&mut self, span: impl Into<MultiSpan>) -> &mut Self {
        self.span = span.into();
        self
    }

    /// Sets the code of this diagnostic.
    pub fn code(&mut self, code: impl Into<DiagId>) -> &mut Self {
        self.code = Some(code.into());
        self
    }

    /// Adds a span label to this diagnostic.
    pub fn span_label(&mut self, span: crate::Span, label: impl Into<DiagMsg>) -> &mut Self {
        self.span.push_span_label(span, label);
        self
    }
}

/// Sub-diagnostics.
impl Diag {
    /// Add a warning attached to this diagnostic.
    pub fn warn(&mut self, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::Warning, msg, MultiSpan::new())
    }

    /// Add a note to this diagnostic.
    pub fn note(&mut self, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::Note, msg, MultiSpan::new())
    }

    /// Prints the span with a note above it.
    /// This is like [`Diag::note()`], but it gets its own span.
    pub fn span_note(&mut self, span: impl Into<MultiSpan>, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::Note, msg, span)
    }

    /// Like [`Diag::note()`], but it gets emitted only once per [`DiagCtxt`].
    pub fn note_once(&mut self, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::OnceNote, msg, MultiSpan::new())
    }

    /// Add a help message attached to this diagnostic.
    pub fn help(&mut self, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::Help, msg, MultiSpan::new())
    }

    /// Like [`Diag::help()`], but it gets emitted only once per [`DiagCtxt`].
    pub fn help_once(&mut self, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::OnceHelp, msg, MultiSpan::new())
    }

    /// Prints the span with some help above it.
    pub fn span_help(&mut self, span: impl Into<MultiSpan>, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::Help, msg, span)
    }

    fn sub(
        &mut self,
        level: Level,
        msg: impl Into<DiagMsg>,
        span: impl Into<MultiSpan>,
    ) -> &mut Self {
        self.children.push(SubDiagnostic { level, messages: vec![msg.into()], span: span.into() });
        self
    }
}
