use super::{Emitter, io_panic};
use crate::diagnostics::{Diag, Level, MultiSpan, SubDiagnostic};
use anstream::{AutoStream, ColorChoice};
use std::io::{self, Write};

type Writer = dyn Write + Send + 'static;

/// Diagnostic emitter that emits to an arbitrary [`io::Write`] writer in human-readable format.
///
/// ```text
/// error[E0101]: division by zero in constant expression
///   --> 14..19
///    = note: the divisor evaluates to `0`
/// ```
pub struct HumanEmitter {
    writer: AutoStream<Box<Writer>>,
}

impl Emitter for HumanEmitter {
    fn emit_diagnostic(&mut self, diagnostic: &Diag) {
        if let Err(e) = self.render(diagnostic) {
            io_panic(e);
        }
    }

    fn supports_color(&self) -> bool {
        match self.writer.current_choice() {
            ColorChoice::AlwaysAnsi | ColorChoice::Always => true,
            ColorChoice::Auto | ColorChoice::Never => false,
        }
    }
}

impl HumanEmitter {
    /// Creates a new `HumanEmitter` that writes to given writer.
    pub fn new(writer: Box<Writer>, color: ColorChoice) -> Self {
        Self { writer: AutoStream::new(writer, color) }
    }

    /// Creates a new `HumanEmitter` that writes to stderr.
    pub fn stderr(color: ColorChoice) -> Self {
        Self::new(Box::new(io::stderr()), color)
    }

    fn render(&mut self, diagnostic: &Diag) -> io::Result<()> {
        let style = diagnostic.level.style();
        let bold = anstyle::Style::new().bold();
        let w = &mut self.writer;

        write!(w, "{style}{}", diagnostic.level)?;
        if let Some(code) = diagnostic.code {
            write!(w, "[{code}]")?;
        }
        writeln!(w, "{style:#}{bold}: {}{bold:#}", diagnostic.label())?;
        render_spans(w, &diagnostic.span)?;

        for child in &diagnostic.children {
            render_child(w, child)?;
        }
        writeln!(w)?;
        w.flush()
    }
}

fn render_spans(w: &mut impl Write, span: &MultiSpan) -> io::Result<()> {
    let arrow = Level::Note.style();
    for label in span.span_labels() {
        if label.span.is_dummy() {
            continue;
        }
        let marker = if label.is_primary { "-->" } else { ":::" };
        write!(w, "  {arrow}{marker}{arrow:#} {}", label.span)?;
        if let Some(msg) = &label.label {
            write!(w, " {msg}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn render_child(w: &mut impl Write, child: &SubDiagnostic) -> io::Result<()> {
    let style = child.level.style();
    write!(w, "   = {style}{}{style:#}: {}", child.level, child.label())?;
    if let Some(span) = child.span.primary_span()
        && !span.is_dummy()
    {
        write!(w, " ({span})")?;
    }
    writeln!(w)
}
