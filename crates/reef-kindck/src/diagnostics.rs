//! Ariadne-based diagnostic rendering for kind errors.
//!
//! Renders `KindError` variants into formatted, labeled error messages
//! using the ariadne library. Output is terse, with labels at the
//! provenance spans of the colliding facts and a note derived from the
//! store snapshot showing which variables were unified together.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use reef_common::Span;

use crate::error::KindError;
use crate::kind::KindVar;

/// Rendering options for diagnostics.
#[derive(Clone, Debug)]
pub struct DiagnosticOptions {
    /// Whether to emit ANSI colors.
    pub color: bool,
}

impl DiagnosticOptions {
    /// Colorless options for deterministic test output.
    pub fn colorless() -> Self {
        DiagnosticOptions { color: false }
    }
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions { color: true }
    }
}

/// Assign a unique error code to each KindError variant.
fn error_code(error: &KindError) -> &'static str {
    match error {
        KindError::ConstraintConflict { .. } => "K0001",
        KindError::CycleDetected { .. } => "K0002",
    }
}

fn span_to_range(span: Span) -> Range<usize> {
    span.start as usize..span.end as usize
}

/// Describe a variable's equivalence class from a snapshot, if it was
/// merged with anything worth mentioning.
fn class_note(error: &KindError, var: KindVar) -> Option<String> {
    let snapshot = match error {
        KindError::ConstraintConflict { snapshot, .. }
        | KindError::CycleDetected { snapshot, .. } => snapshot,
    };
    let class = snapshot.class_of(var)?;
    if class.members.len() < 2 {
        return None;
    }
    let members: Vec<String> = class.members.iter().map(|m| m.to_string()).collect();
    Some(format!(
        "`{}` was unified with {}",
        var,
        members.join(", ")
    ))
}

/// Render a kind error into a formatted diagnostic string.
///
/// Each diagnostic includes an error code, a terse message, labeled source
/// spans for the provenances involved, and a note about the equivalence
/// class when unification chained several variables together.
pub fn render_diagnostic(error: &KindError, source: &str, options: &DiagnosticOptions) -> String {
    let config = Config::default().with_color(options.color);
    let source_len = source.len();

    // Clamp a range to be valid within source bounds; ariadne needs at
    // least a 1-char span where possible.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let code = error_code(error);

    let report = match error {
        KindError::ConstraintConflict {
            applied,
            existing,
            var_source,
            ..
        } => {
            let msg = error.to_string();
            let span = applied
                .provenance()
                .span()
                .map(span_to_range)
                .unwrap_or(0..source_len.max(1).min(source_len));
            let span = clamp(span);

            let mut builder = Report::build(ReportKind::Error, span.clone())
                .with_code(code)
                .with_message(&msg)
                .with_config(config)
                .with_label(
                    Label::new(span)
                        .with_message(format!("required to be {} here", applied.shape()))
                        .with_color(Color::Red),
                );

            if let Some(existing_span) = existing.provenance().span() {
                builder.add_label(
                    Label::new(clamp(span_to_range(existing_span)))
                        .with_message(format!("already {} from here", existing))
                        .with_color(Color::Blue),
                );
            }
            if let Some(source) = var_source {
                builder.add_label(
                    Label::new(clamp(span_to_range(source.span)))
                        .with_message(format!("`{}` introduced here", source.name))
                        .with_color(Color::Yellow),
                );
            }
            if let Some(note) = class_note(error, applied.subject()) {
                builder.set_note(note);
            }

            builder.finish()
        }

        KindError::CycleDetected {
            span,
            var,
            var_source,
            ..
        } => {
            let msg = error.to_string();
            let range = span
                .map(span_to_range)
                .unwrap_or(0..source_len.max(1).min(source_len));
            let range = clamp(range);

            let mut builder = Report::build(ReportKind::Error, range.clone())
                .with_code(code)
                .with_message(&msg)
                .with_config(config)
                .with_label(
                    Label::new(range)
                        .with_message("this arrow kind is recursive")
                        .with_color(Color::Red),
                )
                .with_help("a type constructor's kind cannot refer to itself");

            if let Some(source) = var_source {
                builder.add_label(
                    Label::new(clamp(span_to_range(source.span)))
                        .with_message(format!("`{}` introduced here", source.name))
                        .with_color(Color::Yellow),
                );
            }
            if let Some(note) = class_note(error, *var) {
                builder.set_note(note);
            }

            builder.finish()
        }
    };

    // Render to buffer.
    let mut buf = Vec::new();
    let cache = Source::from(source);
    report.write(cache, &mut buf).expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

/// Render every error in order.
pub fn render_all(errors: &[KindError], source: &str, options: &DiagnosticOptions) -> Vec<String> {
    errors
        .iter()
        .map(|error| render_diagnostic(error, source, options))
        .collect()
}
