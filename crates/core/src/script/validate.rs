//! Static validation of sanitized scene scripts.
//!
//! A single forward walk over logical lines records every binding in the
//! scope that owns it and every bare-name use, then resolves the uses once
//! the whole script is known (function bodies may reference module names
//! defined further down). The result is an ordered issue list the repairer
//! consumes.

use std::collections::HashSet;

use serde::Serialize;

use super::builtins;
use super::lexer::{self, LogicalLine, Token};
use super::symbols::{ScopeId, ScopeKind, SymbolTable};

/// Augmented assignment operators.
const AUGMENTED_OPS: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "**=", "@=", "&=", "|=", "^=", ">>=", "<<=",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UndefinedSymbol,
    DeprecatedApi,
    SyntaxError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// 1-based line of the offending token.
    pub line: usize,
    pub detail: String,
    /// Identifier the issue is about; `None` for syntax errors.
    pub symbol: Option<String>,
    /// Scope the offending use belongs to.
    #[serde(skip)]
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
struct UseSite {
    name: String,
    line: usize,
    scope: ScopeId,
    order: usize,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<Issue>,
    pub symbols: SymbolTable,
    uses: Vec<UseSite>,
}

impl ValidationReport {
    pub fn has_syntax_error(&self) -> bool {
        self.issues.iter().any(|i| i.kind == IssueKind::SyntaxError)
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Flag the first use of `name` as undefined even though static
    /// resolution accepted it (the interpreter reported it at run time).
    ///
    /// Returns `false` when the name is already flagged or never used.
    pub fn mark_undefined(&mut self, name: &str) -> bool {
        if self
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::UndefinedSymbol && i.symbol.as_deref() == Some(name))
        {
            return false;
        }
        let Some(site) = self.uses.iter().find(|u| u.name == name) else {
            return false;
        };
        self.issues.push(undefined_issue(site));
        self.valid = false;
        true
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate `source`. A syntax error short-circuits with a single issue.
pub fn validate(source: &str) -> ValidationReport {
    let lines = match lexer::scan(source) {
        Ok(lines) => lines,
        Err(fault) => {
            return ValidationReport {
                valid: false,
                issues: vec![Issue {
                    kind: IssueKind::SyntaxError,
                    line: fault.line,
                    detail: fault.message,
                    symbol: None,
                    scope: SymbolTable::MODULE,
                }],
                symbols: SymbolTable::new(),
                uses: Vec::new(),
            };
        }
    };

    let mut walker = Walker::default();
    walker.walk(&lines);

    let mut issues = unresolved_issues(&walker);
    issues.extend(deprecated_issues(&lines));

    ValidationReport {
        valid: issues.is_empty(),
        issues,
        symbols: walker.symbols,
        uses: walker.uses,
    }
}

/// One issue per name per scope, in discovery order.
fn unresolved_issues(walker: &Walker) -> Vec<Issue> {
    let mut reported: HashSet<(ScopeId, &str)> = HashSet::new();
    walker
        .uses
        .iter()
        .filter(|site| builtins::replacement_for(&site.name).is_none())
        .filter(|site| {
            !walker
                .symbols
                .resolves(site.scope, &site.name, Some(site.order))
        })
        .filter(|site| reported.insert((site.scope, site.name.as_str())))
        .map(undefined_issue)
        .collect()
}

fn undefined_issue(site: &UseSite) -> Issue {
    Issue {
        kind: IssueKind::UndefinedSymbol,
        line: site.line,
        detail: format!("undefined name '{}'", site.name),
        symbol: Some(site.name.clone()),
        scope: site.scope,
    }
}

/// One issue per (line, renamed identifier) pair, attributes included.
fn deprecated_issues(lines: &[LogicalLine]) -> Vec<Issue> {
    let mut seen: HashSet<(usize, &str)> = HashSet::new();
    let mut issues = Vec::new();
    for token in lines.iter().flat_map(|l| l.tokens.iter()) {
        if !token.is_identifier() {
            continue;
        }
        let Some(replacement) = builtins::replacement_for(&token.text) else {
            continue;
        };
        if seen.insert((token.line, token.text.as_str())) {
            issues.push(Issue {
                kind: IssueKind::DeprecatedApi,
                line: token.line,
                detail: format!("'{}' is deprecated, use '{replacement}'", token.text),
                symbol: Some(token.text.clone()),
                scope: SymbolTable::MODULE,
            });
        }
    }
    issues
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

struct Frame {
    scope: ScopeId,
    /// Indentation of the `def`/`class` header that opened the scope.
    header_indent: Option<usize>,
}

#[derive(Default)]
struct Walker {
    symbols: SymbolTable,
    uses: Vec<UseSite>,
    order: usize,
}

impl Walker {
    fn walk(&mut self, lines: &[LogicalLine]) {
        let mut frames = vec![Frame {
            scope: SymbolTable::MODULE,
            header_indent: None,
        }];

        for line in lines {
            while frames
                .last()
                .and_then(|f| f.header_indent)
                .is_some_and(|header| line.indent <= header)
            {
                frames.pop();
            }
            let scope = frames
                .last()
                .map(|f| f.scope)
                .unwrap_or(SymbolTable::MODULE);

            for statement in split_statements(&line.tokens) {
                if let Some(body) = self.statement(statement, scope) {
                    frames.push(Frame {
                        scope: body,
                        header_indent: Some(line.indent),
                    });
                }
            }
        }
    }

    /// Process one statement. Returns the scope opened by a `def`/`class`
    /// header whose body follows on the next lines.
    fn statement(&mut self, tokens: &[Token], scope: ScopeId) -> Option<ScopeId> {
        self.order += 1;
        let order = self.order;
        let locals = statement_locals(tokens);

        let first = tokens.first()?;
        let offset = usize::from(first.is_keyword("async"));
        let keyword = tokens.get(offset).map(|t| t.text.as_str()).unwrap_or("");

        match keyword {
            "import" | "from" if offset == 0 => {
                self.import(tokens, scope, order);
                None
            }
            "global" | "nonlocal" if offset == 0 => {
                for token in tokens[1..].iter().filter(|t| t.is_identifier()) {
                    self.define(token, scope, order);
                }
                None
            }
            "def" => self.function(&tokens[offset..], scope, order, &locals),
            "class" if offset == 0 => self.class(tokens, scope, order, &locals),
            "for" => {
                self.for_header(tokens, offset, scope, order, &locals);
                None
            }
            "match" if offset == 0 && lexer::is_block_header(tokens) => {
                let header_end = lexer::header_colon(tokens).unwrap_or(tokens.len());
                self.expression(&tokens[1..header_end], scope, order, &locals);
                self.inline_body(tokens, header_end, scope);
                None
            }
            "case" if offset == 0 && lexer::is_block_header(tokens) => {
                self.case_clause(tokens, scope, order, &locals);
                None
            }
            _ if lexer::is_block_header(tokens) => {
                let header_end = lexer::header_colon(tokens).unwrap_or(tokens.len());
                self.expression(&tokens[..header_end], scope, order, &locals);
                self.inline_body(tokens, header_end, scope);
                None
            }
            _ => {
                self.simple(tokens, scope, order, &locals);
                None
            }
        }
    }

    fn inline_body(&mut self, tokens: &[Token], colon: usize, scope: ScopeId) {
        if let Some(body) = tokens.get(colon + 1..).filter(|b| !b.is_empty()) {
            self.statement(body, scope);
        }
    }

    fn import(&mut self, tokens: &[Token], scope: ScopeId, order: usize) {
        let names = if tokens[0].is_keyword("from") {
            let Some(pos) = tokens.iter().position(|t| t.is_keyword("import")) else {
                return;
            };
            if tokens[pos + 1..].iter().any(|t| t.is_op("*")) {
                let module: String = tokens[1..pos].iter().map(|t| t.text.as_str()).collect();
                self.star_import(&module, &tokens[0], scope, order);
                return;
            }
            &tokens[pos + 1..]
        } else {
            &tokens[1..]
        };

        for segment in names.split(|t| t.is_op(",")) {
            let segment: Vec<&Token> = segment
                .iter()
                .filter(|t| !t.is_op("(") && !t.is_op(")"))
                .collect();
            let bound = match segment.iter().position(|t| t.is_keyword("as")) {
                Some(pos) => segment.get(pos + 1).copied(),
                None => segment.first().copied(),
            };
            if let Some(token) = bound.filter(|t| t.is_identifier()) {
                self.define(token, scope, order);
            }
        }
    }

    /// `from module import *`: the animation library's exports are always
    /// in scope, a few standard modules have known exports, and anything
    /// else may bind any name from here on.
    fn star_import(&mut self, module: &str, at: &Token, scope: ScopeId, order: usize) {
        if module == "manim" || module.starts_with("manim.") {
            return;
        }
        match builtins::star_exports(module) {
            Some(names) => {
                for name in names {
                    self.symbols.define(scope, name, at.line, order);
                }
            }
            None => self.symbols.define_wildcard(scope, at.line, order),
        }
    }

    /// `case <pattern> [if <guard>]:`. Class names and dotted values in the
    /// pattern are uses, bare names are captures.
    fn case_clause(&mut self, tokens: &[Token], scope: ScopeId, order: usize, locals: &HashSet<String>) {
        let colon = lexer::header_colon(tokens).unwrap_or(tokens.len());
        let depths = lexer::bracket_depths(&tokens[..colon]);
        let guard = (1..colon).find(|&i| tokens[i].is_keyword("if") && depths[i] == 0);
        let pattern_end = guard.unwrap_or(colon);

        let mut captured = locals.clone();
        for i in 1..pattern_end {
            let token = &tokens[i];
            if !token.is_identifier() || tokens[i - 1].is_op(".") || token.text == "_" {
                continue;
            }
            let next = tokens.get(i + 1);
            if next.is_some_and(|n| n.is_op(".") || n.is_op("(")) {
                self.record_use(token, scope, order, locals);
            } else if next.is_some_and(|n| n.is_op("=")) && depths.get(i).is_some_and(|&d| d > 0) {
                continue;
            } else {
                self.define(token, scope, order);
                captured.insert(token.text.clone());
            }
        }
        if let Some(guard) = guard {
            self.expression(&tokens[guard + 1..colon], scope, order, &captured);
        }
        self.inline_body(tokens, colon, scope);
    }

    fn function(
        &mut self,
        tokens: &[Token],
        scope: ScopeId,
        order: usize,
        locals: &HashSet<String>,
    ) -> Option<ScopeId> {
        if let Some(name) = tokens.get(1).filter(|t| t.is_identifier()) {
            self.define(name, scope, order);
        }
        let colon = lexer::header_colon(tokens);
        let header_end = colon.unwrap_or(tokens.len());
        let body = self.symbols.push_scope(ScopeKind::Function, scope);

        let mut skip = locals.clone();
        if tokens.get(2).is_some_and(|t| t.is_op("(")) {
            let depths = lexer::bracket_depths(&tokens[..header_end]);
            let mut expect_param = true;
            for (i, token) in tokens.iter().enumerate().take(header_end).skip(3) {
                if depths[i] == 0 {
                    break;
                }
                if depths[i] != 1 {
                    continue;
                }
                if token.is_op(",") {
                    expect_param = true;
                } else if token.is_op("*") || token.is_op("**") || token.is_op("/") {
                    continue;
                } else if expect_param && token.is_identifier() {
                    self.symbols.define(body, &token.text, token.line, order);
                    skip.insert(token.text.clone());
                    expect_param = false;
                } else {
                    expect_param = false;
                }
            }
        }
        // Defaults and annotations evaluate in the enclosing scope.
        if let Some(signature) = tokens.get(2..header_end) {
            self.expression(signature, scope, order, &skip);
        }

        match colon {
            Some(c) if c + 1 < tokens.len() => {
                self.inline_body(tokens, c, body);
                None
            }
            Some(_) => Some(body),
            None => None,
        }
    }

    fn class(
        &mut self,
        tokens: &[Token],
        scope: ScopeId,
        order: usize,
        locals: &HashSet<String>,
    ) -> Option<ScopeId> {
        if let Some(name) = tokens.get(1).filter(|t| t.is_identifier()) {
            self.define(name, scope, order);
        }
        let colon = lexer::header_colon(tokens);
        let header_end = colon.unwrap_or(tokens.len());
        if let Some(bases) = tokens.get(2..header_end) {
            self.expression(bases, scope, order, locals);
        }
        let body = self.symbols.push_scope(ScopeKind::Class, scope);

        match colon {
            Some(c) if c + 1 < tokens.len() => {
                self.inline_body(tokens, c, body);
                None
            }
            Some(_) => Some(body),
            None => None,
        }
    }

    fn for_header(
        &mut self,
        tokens: &[Token],
        offset: usize,
        scope: ScopeId,
        order: usize,
        locals: &HashSet<String>,
    ) {
        let header_end = lexer::header_colon(tokens).unwrap_or(tokens.len());
        let depths = lexer::bracket_depths(tokens);
        let in_pos =
            (offset + 1..header_end).find(|&i| tokens[i].is_keyword("in") && depths[i] == 0);
        match in_pos {
            Some(pos) => {
                self.targets(&tokens[offset + 1..pos], scope, order, locals);
                self.expression(&tokens[pos + 1..header_end], scope, order, locals);
            }
            None => self.expression(&tokens[..header_end], scope, order, locals),
        }
        self.inline_body(tokens, header_end, scope);
    }

    /// Expression statements and assignments.
    fn simple(&mut self, tokens: &[Token], scope: ScopeId, order: usize, locals: &HashSet<String>) {
        let depths = lexer::bracket_depths(tokens);
        let top_level = |i: &usize| depths[*i] == 0;

        let assigns: Vec<usize> = (0..tokens.len())
            .filter(top_level)
            .filter(|&i| tokens[i].is_op("="))
            .collect();
        if let Some(&last) = assigns.last() {
            let mut start = 0;
            for &pos in &assigns {
                self.targets(&tokens[start..pos], scope, order, locals);
                start = pos + 1;
            }
            self.expression(&tokens[last + 1..], scope, order, locals);
            return;
        }

        let augmented = (0..tokens.len())
            .filter(top_level)
            .find(|&i| AUGMENTED_OPS.iter().any(|op| tokens[i].is_op(op)));
        if let Some(pos) = augmented {
            self.targets(&tokens[..pos], scope, order, locals);
            self.expression(&tokens[pos + 1..], scope, order, locals);
            return;
        }

        let annotated = tokens.first().is_some_and(|t| t.is_identifier())
            && !tokens.iter().any(|t| t.is_keyword("lambda"));
        match lexer::header_colon(tokens).filter(|_| annotated) {
            Some(colon) => {
                self.targets(&tokens[..colon], scope, order, locals);
                self.expression(&tokens[colon + 1..], scope, order, locals);
            }
            None => self.expression(tokens, scope, order, locals),
        }
    }

    /// Assignment targets: plain names bind, anything subscripted, called or
    /// dereferenced is a use.
    fn targets(&mut self, tokens: &[Token], scope: ScopeId, order: usize, locals: &HashSet<String>) {
        if let Some(colon) = lexer::header_colon(tokens) {
            self.targets(&tokens[..colon], scope, order, locals);
            self.expression(&tokens[colon + 1..], scope, order, locals);
            return;
        }

        let mut accessor_brackets: Vec<bool> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| &tokens[p]);
            if token.kind == lexer::TokenKind::Op {
                match token.text.as_str() {
                    "(" | "[" | "{" => accessor_brackets.push(prev.is_some_and(|p| {
                        p.is_identifier()
                            || p.is_op(")")
                            || p.is_op("]")
                            || p.kind == lexer::TokenKind::Str
                    })),
                    ")" | "]" | "}" => {
                        accessor_brackets.pop();
                    }
                    _ => {}
                }
                continue;
            }
            if !token.is_identifier() || prev.is_some_and(|p| p.is_op(".")) {
                continue;
            }
            let accessed = tokens
                .get(i + 1)
                .is_some_and(|n| n.is_op(".") || n.is_op("[") || n.is_op("("));
            if accessed || accessor_brackets.iter().any(|&a| a) {
                self.record_use(token, scope, order, locals);
            } else {
                self.define(token, scope, order);
            }
        }
    }

    /// Record bare-name uses in an expression. Names after `as` and before
    /// `:=` bind instead.
    fn expression(&mut self, tokens: &[Token], scope: ScopeId, order: usize, locals: &HashSet<String>) {
        let mut brackets: Vec<&str> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if token.kind == lexer::TokenKind::Op {
                match token.text.as_str() {
                    "(" | "[" | "{" => brackets.push(token.text.as_str()),
                    ")" | "]" | "}" => {
                        brackets.pop();
                    }
                    _ => {}
                }
                continue;
            }
            if !token.is_identifier() {
                continue;
            }
            let prev = i.checked_sub(1).map(|p| &tokens[p]);
            if prev.is_some_and(|p| p.is_op(".")) {
                continue;
            }
            let next = tokens.get(i + 1);
            if prev.is_some_and(|p| p.is_keyword("as")) || next.is_some_and(|n| n.is_op(":=")) {
                self.define(token, scope, order);
                continue;
            }
            // keyword argument name
            if next.is_some_and(|n| n.is_op("=")) && brackets.last() == Some(&"(") {
                continue;
            }
            self.record_use(token, scope, order, locals);
        }
    }

    fn define(&mut self, token: &Token, scope: ScopeId, order: usize) {
        self.symbols.define(scope, &token.text, token.line, order);
    }

    fn record_use(&mut self, token: &Token, scope: ScopeId, order: usize, locals: &HashSet<String>) {
        if locals.contains(&token.text) {
            return;
        }
        self.uses.push(UseSite {
            name: token.text.clone(),
            line: token.line,
            scope,
            order,
        });
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split a logical line at top-level semicolons.
fn split_statements(tokens: &[Token]) -> Vec<&[Token]> {
    let depths = lexer::bracket_depths(tokens);
    let mut statements = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_op(";") && depths[i] == 0 {
            if i > start {
                statements.push(&tokens[start..i]);
            }
            start = i + 1;
        }
    }
    if start < tokens.len() {
        statements.push(&tokens[start..]);
    }
    statements
}

/// Names bound only for the statement itself: comprehension targets,
/// lambda parameters and walrus targets.
fn statement_locals(tokens: &[Token]) -> HashSet<String> {
    let depths = lexer::bracket_depths(tokens);
    let mut locals = HashSet::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.is_keyword("for") && depths[i] > 0 {
            let depth = depths[i];
            let mut j = i + 1;
            while j < tokens.len() && !(tokens[j].is_keyword("in") && depths[j] == depth) {
                if tokens[j].is_identifier() && !tokens[j - 1].is_op(".") {
                    locals.insert(tokens[j].text.clone());
                }
                j += 1;
            }
        } else if token.is_keyword("lambda") {
            let depth = depths[i];
            let mut expect_param = true;
            let mut j = i + 1;
            while j < tokens.len() && !(tokens[j].is_op(":") && depths[j] == depth) {
                let t = &tokens[j];
                let star = t.is_op("*") || t.is_op("**");
                if depths[j] == depth && !star {
                    if t.is_op(",") {
                        expect_param = true;
                    } else {
                        if expect_param && t.is_identifier() {
                            locals.insert(t.text.clone());
                        }
                        expect_param = false;
                    }
                }
                j += 1;
            }
        } else if token.is_identifier() && tokens.get(i + 1).is_some_and(|n| n.is_op(":=")) {
            locals.insert(token.text.clone());
        }
    }
    locals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn undefined(report: &ValidationReport) -> Vec<(&str, usize)> {
        report
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::UndefinedSymbol)
            .map(|i| (i.symbol.as_deref().unwrap_or(""), i.line))
            .collect()
    }

    const CLEAN: &str = "\
from manim import *

class Demo(Scene):
    def construct(self):
        circle = Circle(radius=1.0, color=BLUE)
        label = Text(\"circle\", font_size=24).next_to(circle, DOWN)
        self.play(Create(circle), Write(label))
        self.play(circle.animate.shift(LEFT * 2), run_time=2)
        self.wait()
";

    #[test]
    fn clean_script_is_valid() {
        let report = validate(CLEAN);
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn undefined_title_is_reported_once() {
        let source = "\
from manim import *

class Intro(Scene):
    def construct(self):
        self.play(Write(title))
        self.play(FadeOut(title))
";
        let report = validate(source);
        assert!(!report.valid);
        assert_eq!(undefined(&report), vec![("title", 5)]);
    }

    #[test]
    fn same_name_in_two_methods_reported_per_scope() {
        let source = "\
class Intro(Scene):
    def construct(self):
        self.play(Write(banner))

    def outro(self):
        self.play(FadeOut(banner))
";
        let report = validate(source);
        assert_eq!(undefined(&report), vec![("banner", 3), ("banner", 6)]);
    }

    #[test]
    fn module_helpers_defined_later_are_visible_in_methods() {
        let source = "\
class Intro(Scene):
    def construct(self):
        self.add(make_grid(3))

def make_grid(n):
    return VGroup(*[Square() for _ in range(n)])
";
        let report = validate(source);
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn use_before_assignment_in_same_function_is_reported() {
        let source = "\
def construct(self):
    self.play(Write(heading))
    heading = Text(\"late\")
";
        let report = validate(source);
        assert_eq!(undefined(&report), vec![("heading", 2)]);
    }

    #[test]
    fn star_imports_bind_their_exports() {
        let source = "\
from manim import *
from math import *

class Wave(Scene):
    def construct(self):
        self.wait(sqrt(2) + floor(pi))
        self.wait(mystery)
";
        let report = validate(source);
        assert_eq!(undefined(&report), vec![("mystery", 7)]);
    }

    #[test]
    fn unknown_star_import_may_bind_anything() {
        let source = "\
from manim import *
from helpers.shapes import *

class Demo(Scene):
    def construct(self):
        self.add(fancy_shape())
";
        assert!(validate(source).issues.is_empty());

        let before = "x = fancy_shape()\nfrom helpers.shapes import *\n";
        assert_eq!(undefined(&validate(before)), vec![("fancy_shape", 1)]);
    }

    #[test]
    fn match_patterns_capture_names() {
        let source = "\
from manim import *

def describe(shape):
    match shape:
        case Circle(radius=r) if r > limit:
            return r
        case [first, *rest]:
            return first, rest
        case _:
            return None
";
        let report = validate(source);
        assert!(!report.has_syntax_error(), "issues: {:?}", report.issues);
        assert_eq!(undefined(&report), vec![("limit", 5)]);
    }

    #[test]
    fn comprehension_lambda_and_loop_names_are_bound() {
        let source = "\
dots = VGroup(*[Dot(RIGHT * i) for i in range(5)])
shift = lambda m, d=UP: m.shift(d)
for index, dot in enumerate(dots):
    shift(dot)
with open(\"log.txt\") as handle:
    handle.write(str(index))
try:
    pass
except ValueError as err:
    print(err)
if (count := len(dots)) > 2:
    print(count)
";
        let report = validate(source);
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn keyword_arguments_and_attributes_are_not_uses() {
        let source = "t = Text(\"x\", weight=BOLD, gradient=(RED, BLUE)).scale(0.5).arrange_as_grid\n";
        let report = validate(source);
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn numpy_alias_requires_import() {
        let source = "points = np.array([0, 1, 0])\n";
        assert_eq!(undefined(&validate(source)), vec![("np", 1)]);

        let imported = "import numpy as np\npoints = np.array([0, 1, 0])\n";
        assert!(validate(imported).valid);
    }

    #[test]
    fn deprecated_names_are_reported_not_undefined() {
        let source = "\
class Old(Scene):
    def construct(self):
        sq = Square()
        self.play(ShowCreation(sq))
        group = VGroup(sq).arrange_submobjects(RIGHT)
";
        let report = validate(source);
        assert_eq!(report.count(IssueKind::UndefinedSymbol), 0);
        let deprecated: Vec<(usize, &str)> = report
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::DeprecatedApi)
            .map(|i| (i.line, i.symbol.as_deref().unwrap_or("")))
            .collect();
        assert_eq!(deprecated, vec![(4, "ShowCreation"), (5, "arrange_submobjects")]);
    }

    #[test]
    fn syntax_error_short_circuits() {
        let source = "class Broken(Scene)\n    def construct(self):\n        self.play(Write(missing))\n";
        let report = validate(source);
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::SyntaxError);
        assert!(report.has_syntax_error());
    }

    #[test]
    fn strings_and_comments_are_ignored() {
        let source = "label = Text(\"ghost value\")  # ghost\n";
        assert!(validate(source).valid);
    }

    #[test]
    fn semicolon_statements_see_earlier_bindings() {
        assert!(validate("a = Dot(); b = a.copy()\n").valid);
    }

    #[test]
    fn mark_undefined_flags_first_use() {
        let source = "x = Square()\ny = x.copy()\n";
        let mut report = validate(source);
        assert!(report.valid);
        assert!(report.mark_undefined("Square"));
        assert!(!report.valid);
        assert_eq!(undefined(&report), vec![("Square", 1)]);
        assert!(!report.mark_undefined("Square"));
        assert!(!report.mark_undefined("never_used"));
    }

    #[test]
    fn symbols_record_first_definition_line() {
        let source = "\
class Intro(Scene):
    def construct(self):
        pass

banner = Text(\"a\")
banner = Text(\"b\")
";
        let report = validate(source);
        assert_eq!(report.symbols.first_definition(SymbolTable::MODULE, "banner"), Some(5));
        assert_eq!(report.symbols.first_definition(SymbolTable::MODULE, "Intro"), Some(1));
    }
}
