//! Isolate the executable script body from generator prose and markup.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static IMPORT_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*from\s+manim\s+import\b").expect("valid regex"));

static ANIMATION_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bself\.(?:play|wait)\s*\(").expect("valid regex"));

/// `MathTex(r"...")` / `Tex("...")` whose only positional argument is one
/// string literal.
static TEX_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?:MathTex|Tex)\(\s*(r?"(?:[^"\\\n]|\\.)*"|r?'(?:[^'\\\n]|\\.)*')\s*(\)|,\s*[A-Za-z_]\w*\s*=)"#,
    )
    .expect("valid regex")
});

const FENCE: &str = "```";

/// What the sanitizer keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Content of the first fenced block.
    Fence,
    /// Everything from the first `from manim import`.
    Import,
    /// Nothing recognizable; the text passed through untouched.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    pub anchor: Anchor,
}

impl Sanitized {
    /// Nothing was extracted; the caller got its input back.
    pub fn is_noop(&self) -> bool {
        self.anchor == Anchor::None
    }
}

/// Extract the script body from raw generator output.
pub fn sanitize(raw: &str) -> Sanitized {
    let (body, anchor) = if let Some(fenced) = first_fenced_block(raw) {
        (fenced, Anchor::Fence)
    } else if let Some(found) = IMPORT_ANCHOR_RE.find(raw) {
        let line_start = raw[..found.start()].rfind('\n').map_or(0, |i| i + 1);
        (trim_after_last_animation(&raw[line_start..]), Anchor::Import)
    } else {
        return Sanitized {
            text: raw.to_string(),
            anchor: Anchor::None,
        };
    };

    let mut text: String = body
        .lines()
        .filter(|line| line.is_ascii())
        .collect::<Vec<_>>()
        .join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    Sanitized { text, anchor }
}

/// Rewrite TeX-backed text constructors with a single string literal to
/// plain `Text`, so scripts render on hosts without a TeX toolchain.
pub fn strip_latex(script: &str) -> String {
    TEX_CALL_RE
        .replace_all(script, "Text(${1}${2}")
        .into_owned()
}

fn first_fenced_block(raw: &str) -> Option<String> {
    let mut lines = raw.lines();
    lines.find(|line| line.trim_start().starts_with(FENCE))?;
    let body: Vec<&str> = lines
        .take_while(|line| !line.trim_start().starts_with(FENCE))
        .collect();
    Some(body.join("\n"))
}

/// Keep everything up to the last `self.play(`/`self.wait(` call and its
/// continuation lines; cut at the first blank, comment or unindented line
/// after it.
fn trim_after_last_animation(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(last_call) = lines
        .iter()
        .rposition(|line| ANIMATION_CALL_RE.is_match(line))
    else {
        return text.to_string();
    };

    let mut balance = paren_balance(lines[last_call]);
    let mut end = last_call + 1;
    while end < lines.len() {
        let line = lines[end];
        if balance <= 0 {
            let trimmed = line.trim_start();
            let unindented = trimmed.len() == line.len();
            if trimmed.is_empty() || trimmed.starts_with('#') || unindented {
                break;
            }
        }
        balance += paren_balance(line);
        end += 1;
    }
    lines[..end].join("\n")
}

fn paren_balance(line: &str) -> i32 {
    line.chars().fold(0, |acc, c| match c {
        '(' | '[' | '{' => acc + 1,
        ')' | ']' | '}' => acc - 1,
        _ => acc,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
