//! Heuristic repair of validation issues.
//!
//! Undefined names get a default definition inserted right before the
//! statement that first uses them; renamed APIs are rewritten token by
//! token. One pass only: the output is not re-validated here.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::builtins;
use super::lexer::{self, LogicalLine};
use super::symbols::{ScopeId, SymbolTable};
use super::validate::{Issue, IssueKind, ValidationReport};

const NUMPY_IMPORT: &str = "import numpy as np";

#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    pub script: String,
    pub fixes: usize,
    /// Issues left untouched.
    pub residual: Vec<Issue>,
}

/// Repair `source` according to `report`.
///
/// A report with a syntax error, or with no issues at all, returns the
/// input unchanged.
pub fn repair(source: &str, mut report: ValidationReport) -> RepairOutcome {
    let unchanged = |issues: Vec<Issue>| RepairOutcome {
        script: source.to_string(),
        fixes: 0,
        residual: issues,
    };
    if report.issues.is_empty() || report.has_syntax_error() {
        return unchanged(report.issues);
    }
    let Ok(lines) = lexer::scan(source) else {
        return unchanged(report.issues);
    };
    let physical: Vec<&str> = source.split_inclusive('\n').collect();

    let mut fixes = 0;
    let mut residual = Vec::new();
    let mut fixed: HashSet<(ScopeId, String)> = HashSet::new();
    let mut insertions: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    for issue in &report.issues {
        match (issue.kind, issue.symbol.as_deref()) {
            (IssueKind::DeprecatedApi, Some(_)) => fixes += 1,
            (IssueKind::UndefinedSymbol, Some(name)) => {
                let covered = report
                    .symbols
                    .lookup_chain(issue.scope)
                    .into_iter()
                    .any(|scope| fixed.contains(&(scope, name.to_string())));
                if covered {
                    continue;
                }

                let (at, text, scope) = if name == "np" {
                    (
                        after_last_import(&lines, issue.line),
                        NUMPY_IMPORT.to_string(),
                        SymbolTable::MODULE,
                    )
                } else {
                    let Some(anchor) = anchor_line(&lines, issue.line) else {
                        residual.push(issue.clone());
                        continue;
                    };
                    let indent = physical
                        .get(anchor.line - 1)
                        .map(|l| leading_whitespace(l))
                        .unwrap_or("");
                    (
                        anchor.line - 1,
                        format!("{indent}{}", default_definition(name)),
                        issue.scope,
                    )
                };

                insertions.entry(at).or_default().push(text);
                report.symbols.define(scope, name, at + 1, 0);
                fixed.insert((scope, name.to_string()));
                fixes += 1;
            }
            _ => residual.push(issue.clone()),
        }
    }

    let rewritten = rewrite_deprecated(source, &lines);
    RepairOutcome {
        script: splice(&rewritten, &insertions),
        fixes,
        residual,
    }
}

/// Default definition for an undefined name, chosen by naming convention.
pub fn default_definition(name: &str) -> String {
    if name == "title" {
        return "title = Title(\"Default Title\")".to_string();
    }
    let constructor = if name.ends_with("_text") || name.ends_with("Text") {
        "Text(\"Default Text\")"
    } else if name.ends_with("_circle") || name.ends_with("Circle") {
        "Circle()"
    } else if name.ends_with("_arrow") || name.ends_with("Arrow") {
        "Arrow(ORIGIN, RIGHT)"
    } else if name.ends_with("_dot") || name.ends_with("Dot") {
        "Dot()"
    } else {
        return format!("{name} = 1  # auto-inserted placeholder, replace with the intended value");
    };
    format!("{name} = {constructor}")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The statement a definition must precede: the logical line containing
/// `line`, moved up past `elif`/`else`/`except`/`finally` clauses and
/// decorators so the insertion never splits a compound statement.
fn anchor_line(lines: &[LogicalLine], line: usize) -> Option<&LogicalLine> {
    let mut idx = lines
        .iter()
        .position(|l| l.line <= line && line <= l.end_line)?;

    loop {
        let current = &lines[idx];
        if matches!(current.first_text(), "elif" | "else" | "except" | "finally") {
            match (0..idx).rev().find(|&j| lines[j].indent <= current.indent) {
                Some(j) if lines[j].indent == current.indent => {
                    idx = j;
                    continue;
                }
                _ => break,
            }
        }
        if idx > 0
            && lines[idx - 1].indent == current.indent
            && lines[idx - 1].first_text() == "@"
        {
            idx -= 1;
            continue;
        }
        break;
    }
    Some(&lines[idx])
}

/// Insertion point (0-based physical line) just after the last top-level
/// import preceding `before_line`, or the top of the file.
fn after_last_import(lines: &[LogicalLine], before_line: usize) -> usize {
    lines
        .iter()
        .filter(|l| l.indent == 0 && l.line < before_line)
        .filter(|l| matches!(l.first_text(), "import" | "from"))
        .last()
        .map(|l| l.end_line)
        .unwrap_or(0)
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Replace every identifier token naming a renamed API.
fn rewrite_deprecated(source: &str, lines: &[LogicalLine]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for token in lines.iter().flat_map(|l| l.tokens.iter()) {
        if !token.is_identifier() {
            continue;
        }
        if let Some(replacement) = builtins::replacement_for(&token.text) {
            out.push_str(&source[last..token.start]);
            out.push_str(replacement);
            last = token.end;
        }
    }
    out.push_str(&source[last..]);
    out
}

/// Insert lines before the given 0-based physical line indices.
fn splice(text: &str, insertions: &BTreeMap<usize, Vec<String>>) -> String {
    if insertions.is_empty() {
        return text.to_string();
    }
    let physical: Vec<&str> = text.split_inclusive('\n').collect();
    let mut out = String::with_capacity(text.len() + insertions.len() * 32);

    for (i, line) in physical.iter().enumerate() {
        if let Some(lines) = insertions.get(&i) {
            for inserted in lines {
                out.push_str(inserted);
                out.push('\n');
            }
        }
        out.push_str(line);
    }
    for lines in insertions.range(physical.len()..).map(|(_, v)| v) {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for inserted in lines {
            out.push_str(inserted);
            out.push('\n');
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
