use crate::Span;
use std::{borrow::Cow, fmt};

/// A diagnostic message.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiagMsg {
    inner: Cow<'static, str>,
}

impl From<&'static str> for DiagMsg {
    fn from(value: &'static str) -> Self {
        Self { inner: Cow::Borrowed(value) }
    }
}

impl From<String> for DiagMsg {
    fn from(value: String) -> Self {
        Self { inner: Cow::Owned(value) }
    }
}

impl From<Cow<'static, str>> for DiagMsg {
    fn from(value: Cow<'static, str>) -> Self {
        Self { inner: value }
    }
}

impl fmt::Display for DiagMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl DiagMsg {
    /// Returns the message as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

/// A span together with some additional data.
#[derive(Clone, Debug)]
pub struct SpanLabel {
    /// The span we are going to include in the final snippet.
    pub span: Span,

    /// Is this a primary span? This is the "locus" of the message.
    pub is_primary: bool,

    /// What label should we attach to this span (if any)?
    pub label: Option<DiagMsg>,
}

/// A collection of `Span`s.
///
/// Spans can be *primary spans*, the locus of the diagnostic, and they can carry a *label*
/// rendered next to them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MultiSpan {
    primary_spans: Vec<Span>,
    span_labels: Vec<(Span, DiagMsg)>,
}

impl MultiSpan {
    #[inline]
    pub fn new() -> Self {
        Self { primary_spans: vec![], span_labels: vec![] }
    }

    pub fn from_span(primary_span: Span) -> Self {
        Self { primary_spans: vec![primary_span], span_labels: vec![] }
    }

    pub fn from_spans(mut vec: Vec<Span>) -> Self {
        vec.sort();
        Self { primary_spans: vec, span_labels: vec![] }
    }

    pub fn push_span_label(&mut self, span: Span, label: impl Into<DiagMsg>) {
        self.span_labels.push((span, label.into()));
    }

    /// Selects the first primary span (if any).
    pub fn primary_span(&self) -> Option<Span> {
        self.primary_spans.first().copied()
    }

    /// Returns all primary spans.
    pub fn primary_spans(&self) -> &[Span] {
        &self.primary_spans
    }

    /// Returns `true` if this contains only dummy primary spans.
    pub fn is_dummy(&self) -> bool {
        self.primary_spans.iter().all(|sp| sp.is_dummy())
    }

    /// Returns the spans to highlight, making sure each primary span has an entry.
    pub fn span_labels(&self) -> Vec<SpanLabel> {
        let is_primary = |span| self.primary_spans.contains(&span);

        let mut span_labels = self
            .span_labels
            .iter()
            .map(|&(span, ref label)| SpanLabel {
                span,
                is_primary: is_primary(span),
                label: Some(label.clone()),
            })
            .collect::<Vec<_>>();

        for &span in &self.primary_spans {
            if !span_labels.iter().any(|sl| sl.span == span) {
                span_labels.push(SpanLabel { span, is_primary: true, label: None });
            }
        }

        span_labels
    }
}

impl From<Span> for MultiSpan {
    fn from(span: Span) -> Self {
        Self::from_span(span)
    }
}

impl From<Vec<Span>> for MultiSpan {
    fn from(spans: Vec<Span>) -> Self {
        Self::from_spans(spans)
    }
}
