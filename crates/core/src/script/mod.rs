//! Generated scene script processing.
//!
//! Raw generator output flows through [`sanitize`], [`validate`] and
//! [`repair`] before [`scene`] picks the entry point for the renderer.
//! [`prepare`] runs the first three as one pass.

pub mod builtins;
pub mod lexer;
pub mod repair;
pub mod sanitize;
pub mod scene;
pub mod symbols;
pub mod validate;

use serde::Serialize;

use sanitize::Anchor;
use validate::Issue;

/// Result of one sanitize, validate and repair pass.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedScript {
    pub script: String,
    pub anchor: Anchor,
    /// Issues found before repair.
    pub issues: Vec<Issue>,
    pub fixes: usize,
    pub residual: Vec<Issue>,
}

/// Sanitize, validate and repair raw generator output.
pub fn prepare(raw: &str, avoid_latex: bool) -> PreparedScript {
    prepare_with_runtime_hints(raw, avoid_latex, &[])
}

/// Like [`prepare`], additionally treating `undefined_at_runtime` (names the
/// interpreter rejected) as undefined at their first use.
pub fn prepare_with_runtime_hints(
    raw: &str,
    avoid_latex: bool,
    undefined_at_runtime: &[&str],
) -> PreparedScript {
    let sanitized = sanitize::sanitize(raw);
    if sanitized.is_noop() {
        tracing::debug!("No script anchor found, passing generator output through");
    }
    let text = if avoid_latex {
        sanitize::strip_latex(&sanitized.text)
    } else {
        sanitized.text
    };

    let mut report = validate::validate(&text);
    for name in undefined_at_runtime {
        report.mark_undefined(name);
    }
    let issues = report.issues.clone();
    let outcome = repair::repair(&text, report);

    tracing::debug!(
        issues = issues.len(),
        fixes = outcome.fixes,
        residual = outcome.residual.len(),
        "Script prepared",
    );

    PreparedScript {
        script: outcome.script,
        anchor: sanitized.anchor,
        issues,
        fixes: outcome.fixes,
        residual: outcome.residual,
    }
}
