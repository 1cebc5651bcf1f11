//! Tokenizer for generated scene scripts.
//!
//! Splits Python-style source into name, number, string and operator tokens,
//! groups them into logical lines (bracket and backslash continuations are
//! joined, blank and comment-only lines are dropped) and checks the block
//! structure the interpreter would reject at compile time.

use std::fmt;

/// Reserved words that never name a binding or a use.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Statements that open an indented block.
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "def", "class", "try", "except", "finally", "with",
];

/// Soft keywords that open a block only in statement position.
const SOFT_BLOCK_KEYWORDS: &[&str] = &["match", "case"];

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: &[&str] = &[
    "==", "!=", "<=", ">=", "->", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "**",
    "//", "<<", ">>", ":=",
];
const ONE_CHAR_OPS: &str = "+-*/%@&|^~<>=.,:;";

const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "rb", "br", "fr", "rf"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    Number,
    Str,
    Op,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based physical line the token starts on.
    pub line: usize,
    /// Byte offsets into the source.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Name && self.text == keyword
    }

    /// An identifier that is not a reserved word.
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Name && !KEYWORDS.contains(&self.text.as_str())
    }
}

/// One statement line after continuation joining.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    /// 1-based physical line the statement starts on.
    pub line: usize,
    /// Last physical line the statement occupies.
    pub end_line: usize,
    /// Indentation width; tabs advance to the next multiple of eight.
    pub indent: usize,
    pub tokens: Vec<Token>,
}

impl LogicalLine {
    pub fn first_text(&self) -> &str {
        self.tokens.first().map(|t| t.text.as_str()).unwrap_or("")
    }

    /// True when the line opens a block whose body starts on the next line.
    pub fn opens_block(&self) -> bool {
        is_block_header(&self.tokens) && self.tokens.last().is_some_and(|t| t.is_op(":"))
    }
}

/// The first error that would stop the interpreter before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxFault {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for SyntaxFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SyntaxFault {}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Tokenize `source` and verify its block structure.
pub fn scan(source: &str) -> Result<Vec<LogicalLine>, SyntaxFault> {
    let lines = tokenize(source)?;
    check_blocks(&lines)?;
    Ok(lines)
}

/// Tokenize `source` into logical lines.
pub fn tokenize(source: &str) -> Result<Vec<LogicalLine>, SyntaxFault> {
    Lexer::new(source).run()
}

/// Verify indentation and block headers of already tokenized lines.
pub fn check_blocks(lines: &[LogicalLine]) -> Result<(), SyntaxFault> {
    let mut levels = vec![0usize];
    let mut pending_header: Option<usize> = None;

    for line in lines {
        let top = levels.last().copied().unwrap_or(0);

        if let Some(header) = pending_header.take() {
            if line.indent <= top {
                return Err(SyntaxFault {
                    line: line.line,
                    message: format!("expected an indented block after line {header}"),
                });
            }
            levels.push(line.indent);
        } else if line.indent > top {
            return Err(SyntaxFault {
                line: line.line,
                message: "unexpected indent".into(),
            });
        } else if line.indent < top {
            while levels.last().is_some_and(|&level| level > line.indent) {
                levels.pop();
            }
            if levels.last().copied().unwrap_or(0) != line.indent {
                return Err(SyntaxFault {
                    line: line.line,
                    message: "unindent does not match any outer indentation level".into(),
                });
            }
        }

        if is_block_header(&line.tokens) {
            if header_colon(&line.tokens).is_none() {
                return Err(SyntaxFault {
                    line: line.line,
                    message: "expected ':'".into(),
                });
            }
            if line.opens_block() {
                pending_header = Some(line.line);
            }
        }
    }

    match pending_header {
        Some(header) => Err(SyntaxFault {
            line: header,
            message: format!("expected an indented block after line {header}"),
        }),
        None => Ok(()),
    }
}

/// Whether the statement starts with a compound-statement keyword.
pub fn is_block_header(tokens: &[Token]) -> bool {
    let first = match tokens.first() {
        Some(t) => t,
        None => return false,
    };
    if first.is_keyword("async") {
        return tokens
            .get(1)
            .is_some_and(|t| ["def", "for", "with"].contains(&t.text.as_str()));
    }
    if first.kind != TokenKind::Name {
        return false;
    }
    if BLOCK_KEYWORDS.contains(&first.text.as_str()) {
        return true;
    }
    SOFT_BLOCK_KEYWORDS.contains(&first.text.as_str()) && is_soft_header(tokens)
}

/// `match`/`case` only open a block when followed by a subject or pattern
/// and a top-level colon; otherwise they are ordinary names.
fn is_soft_header(tokens: &[Token]) -> bool {
    let Some(second) = tokens.get(1) else {
        return false;
    };
    if second.kind == TokenKind::Op
        && !["(", "[", "{", "-", "*"].contains(&second.text.as_str())
    {
        return false;
    }
    header_colon(tokens).is_some()
}

/// Index of the first `:` outside any brackets.
pub fn header_colon(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Op {
            continue;
        }
        match token.text.as_str() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            ":" if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Bracket depth in effect at each token (an opening bracket reports the
/// depth outside it).
pub fn bracket_depths(tokens: &[Token]) -> Vec<usize> {
    let mut depth = 0usize;
    tokens
        .iter()
        .map(|token| {
            if token.kind == TokenKind::Op {
                match token.text.as_str() {
                    "(" | "[" | "{" => {
                        depth += 1;
                        return depth - 1;
                    }
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            depth
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    brackets: Vec<(char, usize)>,
    current: Option<LogicalLine>,
    lines: Vec<LogicalLine>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            line: 1,
            brackets: Vec::new(),
            current: None,
            lines: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<LogicalLine>, SyntaxFault> {
        let mut at_line_start = true;

        while self.pos < self.chars.len() {
            if at_line_start {
                at_line_start = false;
                if self.brackets.is_empty() && self.current.is_none() {
                    let indent = self.measure_indent();
                    if self.peek(0).is_some_and(|c| !matches!(c, '\n' | '\r' | '#')) {
                        self.current = Some(LogicalLine {
                            line: self.line,
                            end_line: self.line,
                            indent,
                            tokens: Vec::new(),
                        });
                    }
                }
                continue;
            }

            let c = self.chars[self.pos].1;
            match c {
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                    if self.brackets.is_empty() {
                        self.finish_line();
                    }
                    at_line_start = true;
                }
                ' ' | '\t' | '\r' | '\x0c' => self.pos += 1,
                '#' => {
                    while self.peek(0).is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                '\\' => self.continuation()?,
                '"' | '\'' => self.string(self.pos, self.pos)?,
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) =>
                {
                    self.number()
                }
                c if c == '_' || c.is_alphabetic() => self.name_or_prefixed_string()?,
                '(' | '[' | '{' => {
                    self.brackets.push((c, self.line));
                    self.emit(TokenKind::Op, self.pos, self.pos + 1, self.line);
                    self.pos += 1;
                }
                ')' | ']' | '}' => self.close_bracket(c)?,
                _ => self.operator()?,
            }
        }

        if let Some(&(open, line)) = self.brackets.last() {
            return Err(SyntaxFault {
                line,
                message: format!("'{open}' was never closed"),
            });
        }
        self.finish_line();
        Ok(self.lines)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).map(|&(_, c)| c)
    }

    fn byte_at(&self, index: usize) -> usize {
        self.chars
            .get(index)
            .map(|&(byte, _)| byte)
            .unwrap_or(self.src.len())
    }

    fn fault(&self, line: usize, message: impl Into<String>) -> SyntaxFault {
        SyntaxFault {
            line,
            message: message.into(),
        }
    }

    fn measure_indent(&mut self) -> usize {
        let mut width = 0;
        while let Some(c) = self.peek(0) {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.pos += 1;
        }
        width
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize, line: usize) {
        let start_byte = self.byte_at(start);
        let end_byte = self.byte_at(end);
        let token = Token {
            kind,
            text: self.src[start_byte..end_byte].to_string(),
            line,
            start: start_byte,
            end: end_byte,
        };
        let current_line = self.line;
        let logical = self.current.get_or_insert_with(|| LogicalLine {
            line,
            end_line: line,
            indent: 0,
            tokens: Vec::new(),
        });
        logical.end_line = current_line;
        logical.tokens.push(token);
    }

    fn finish_line(&mut self) {
        if let Some(line) = self.current.take() {
            if !line.tokens.is_empty() {
                self.lines.push(line);
            }
        }
    }

    fn continuation(&mut self) -> Result<(), SyntaxFault> {
        match (self.peek(1), self.peek(2)) {
            (Some('\n'), _) => self.pos += 2,
            (Some('\r'), Some('\n')) => self.pos += 3,
            (None, _) => {
                self.pos += 1;
                return Ok(());
            }
            _ => {
                return Err(self.fault(
                    self.line,
                    "unexpected character after line continuation character",
                ))
            }
        }
        self.line += 1;
        Ok(())
    }

    /// Consume a string literal whose prefix starts at `start` and whose
    /// opening quote is at `quote_at`.
    fn string(&mut self, start: usize, quote_at: usize) -> Result<(), SyntaxFault> {
        let quote = self.chars[quote_at].1;
        let start_line = self.line;
        let triple = self.chars.get(quote_at + 1).map(|c| c.1) == Some(quote)
            && self.chars.get(quote_at + 2).map(|c| c.1) == Some(quote);
        self.pos = quote_at + if triple { 3 } else { 1 };

        loop {
            let c = match self.peek(0) {
                Some(c) => c,
                None if triple => {
                    return Err(
                        self.fault(start_line, "unterminated triple-quoted string literal")
                    )
                }
                None => return Err(self.fault(start_line, "unterminated string literal")),
            };
            match c {
                '\\' => {
                    if self.peek(1) == Some('\n') {
                        self.line += 1;
                    }
                    self.pos += 2;
                }
                '\n' if !triple => {
                    return Err(self.fault(start_line, "unterminated string literal"));
                }
                '\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                c if c == quote => {
                    if !triple {
                        self.pos += 1;
                        break;
                    }
                    if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                        self.pos += 3;
                        break;
                    }
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }

        let end = self.pos.min(self.chars.len());
        self.emit(TokenKind::Str, start, end, start_line);
        Ok(())
    }

    fn number(&mut self) {
        let start = self.pos;
        let hex = self.peek(0) == Some('0') && matches!(self.peek(1), Some('x' | 'X'));
        while let Some(c) = self.peek(0) {
            let exponent_sign = matches!(c, '+' | '-')
                && !hex
                && self.pos > start
                && matches!(self.chars[self.pos - 1].1, 'e' | 'E');
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.emit(TokenKind::Number, start, self.pos, self.line);
    }

    fn name_or_prefixed_string(&mut self) -> Result<(), SyntaxFault> {
        let start = self.pos;
        while self
            .peek(0)
            .is_some_and(|c| c == '_' || c.is_alphanumeric())
        {
            self.pos += 1;
        }
        let word = &self.src[self.byte_at(start)..self.byte_at(self.pos)];
        let prefixed = STRING_PREFIXES.contains(&word.to_ascii_lowercase().as_str());
        if prefixed && matches!(self.peek(0), Some('"' | '\'')) {
            return self.string(start, self.pos);
        }
        self.emit(TokenKind::Name, start, self.pos, self.line);
        Ok(())
    }

    fn close_bracket(&mut self, close: char) -> Result<(), SyntaxFault> {
        match self.brackets.pop() {
            None => return Err(self.fault(self.line, format!("unmatched '{close}'"))),
            Some((open, _)) if matching_close(open) != close => {
                return Err(self.fault(
                    self.line,
                    format!(
                        "closing parenthesis '{close}' does not match opening parenthesis '{open}'"
                    ),
                ));
            }
            Some(_) => {}
        }
        self.emit(TokenKind::Op, self.pos, self.pos + 1, self.line);
        self.pos += 1;
        Ok(())
    }

    fn operator(&mut self) -> Result<(), SyntaxFault> {
        let rest = &self.src[self.byte_at(self.pos)..];
        let width = if THREE_CHAR_OPS.iter().any(|op| rest.starts_with(op)) {
            3
        } else if TWO_CHAR_OPS.iter().any(|op| rest.starts_with(op)) {
            2
        } else if rest.chars().next().is_some_and(|c| ONE_CHAR_OPS.contains(c)) {
            1
        } else {
            let c = rest.chars().next().unwrap_or(' ');
            return Err(self.fault(self.line, format!("invalid character '{c}'")));
        };
        self.emit(TokenKind::Op, self.pos, self.pos + width, self.line);
        self.pos += width;
        Ok(())
    }
}

fn matching_close(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &LogicalLine) -> Vec<&str> {
        line.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn joins_bracket_continuations() {
        let lines = tokenize("self.play(\n    Write(a),\n    FadeIn(b),\n)\nx = 1\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[0].end_line, 4);
        assert_eq!(lines[1].line, 5);
        assert_eq!(texts(&lines[1]), vec!["x", "=", "1"]);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let lines = tokenize("# header\n\n   \nx = 1  # trailing\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(texts(&lines[0]), vec!["x", "=", "1"]);
    }

    #[test]
    fn strings_hide_their_contents() {
        let lines = tokenize("t = Text(\"name = (\", font_size=24)\n").unwrap();
        let kinds: Vec<TokenKind> = lines[0].tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds[4], TokenKind::Str);
        assert_eq!(lines[0].tokens.len(), 10);
    }

    #[test]
    fn prefixed_and_triple_quoted_strings() {
        let lines = tokenize("a = r\"\\frac{1}{2}\"\nb = \"\"\"multi\nline\"\"\"\nc = 2\n").unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].tokens[2].kind, TokenKind::Str);
        assert_eq!(lines[1].tokens[2].kind, TokenKind::Str);
        assert_eq!(lines[2].line, 4);
    }

    #[test]
    fn indentation_counts_tabs_to_eight() {
        let lines = tokenize("if x:\n\ty = 1\n").unwrap();
        assert_eq!(lines[1].indent, 8);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let err = tokenize("x = 'abc\ny = 2\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn mismatched_bracket_is_reported() {
        let err = tokenize("x = foo(1, 2]\n").unwrap_err();
        assert!(err.message.contains("does not match"));
    }

    #[test]
    fn unclosed_bracket_reports_opening_line() {
        let err = tokenize("x = foo(\n1,\n2\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("never closed"));
    }

    #[test]
    fn header_without_colon_is_rejected() {
        let err = scan("class Demo(Scene)\n    pass\n").unwrap_err();
        assert_eq!(err.message, "expected ':'");
    }

    #[test]
    fn unexpected_indent_is_rejected() {
        let err = scan("x = 1\n    y = 2\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.message, "unexpected indent");
    }

    #[test]
    fn inconsistent_dedent_is_rejected() {
        let err = scan("def f():\n        a = 1\n    b = 2\n").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn missing_block_body_is_rejected() {
        let err = scan("def f():\nx = 1\n").unwrap_err();
        assert!(err.message.starts_with("expected an indented block"));
        let err = scan("class A(Scene):\n").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn one_line_blocks_need_no_body() {
        assert!(scan("if ready: go()\nx = {1: 2}\n").is_ok());
    }

    #[test]
    fn match_statement_opens_blocks() {
        let source = "\
match shape:
    case Circle(radius=r) if r > 1:
        big = True
    case [first, *rest]:
        pass
    case _:
        pass
";
        assert!(scan(source).is_ok());
    }

    #[test]
    fn match_as_plain_name_is_not_a_header() {
        assert!(scan("match = 3\nmatch.group(1)\ncase(x)\n").is_ok());
        let lines = tokenize("match(x)\n").unwrap();
        assert!(!is_block_header(&lines[0].tokens));
        let lines = tokenize("match (x):\n").unwrap();
        assert!(is_block_header(&lines[0].tokens));
    }

    #[test]
    fn invalid_character_is_rejected() {
        let err = tokenize("x = $y\n").unwrap_err();
        assert!(err.message.contains("invalid character"));
    }

    #[test]
    fn depths_track_nesting() {
        let lines = tokenize("f(a, [b])\n").unwrap();
        assert_eq!(bracket_depths(&lines[0].tokens), vec![0, 0, 1, 1, 1, 2, 1, 0]);
    }
}
