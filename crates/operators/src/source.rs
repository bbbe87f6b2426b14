//! Lightweight source scanning shared by the built-in operators
//!
//! This is not a parser. It tokenizes Python and Rust well enough to:
//! - classify every physical line (code, comment, docstring/block comment, blank)
//! - count decision points outside of strings and comments
//! - find function spans and attribute tokens to the innermost function

use anyhow::{Context, Result};
use std::path::Path;

/// Languages the built-in operators understand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Rust,
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

const PYTHON_DECISIONS: &[&str] = &["if", "elif", "for", "while", "except", "and", "or", "assert"];

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", "...", "..=", "<<=", ">>="];

const TWO_CHAR_OPS: &[&str] = &[
    "**", "//", "==", "!=", "<=", ">=", "->", "=>", "::", "&&", "||", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "<<", ">>", ":=", "..",
];

impl Language {
    pub fn detect(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Some(Language::Python),
            Some("rs") => Some(Language::Rust),
            _ => None,
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Language::Python => PYTHON_KEYWORDS,
            Language::Rust => RUST_KEYWORDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Ident,
    Number,
    Str,
    /// Python docstring; not code
    Doc,
    Punct,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Zero-based line the token starts on
    pub line: usize,
    pub end_line: usize,
    /// Column of the token start, in characters
    pub col: usize,
    pub first_on_line: bool,
    /// Open bracket depth before this token
    pub depth: usize,
}

/// Physical line counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub loc: usize,
    pub sloc: usize,
    pub comments: usize,
    pub multi: usize,
    pub blank: usize,
}

/// A function or method and the decision points inside its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    /// Qualified name (`Class.method` for Python, `Type::method` for Rust)
    pub name: String,
    /// One-based line of the definition
    pub line: usize,
    pub decisions: usize,
}

/// Function list plus decision points for the whole file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub functions: Vec<FunctionInfo>,
    pub decisions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Comment,
    Multi,
}

/// A tokenized source file
#[derive(Debug)]
pub struct Source {
    pub language: Language,
    pub tokens: Vec<Token>,
    lines: Vec<String>,
    /// Comments and docstrings: (start line, end line, kind)
    spans: Vec<(usize, usize, SpanKind)>,
    /// Lines that begin inside a string or comment
    continued: Vec<bool>,
}

impl Source {
    pub fn parse(language: Language, text: &str) -> Self {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let mut lexer = Lexer::new(language, text);
        lexer.run();
        let mut source = Self {
            language,
            tokens: lexer.tokens,
            lines,
            spans: lexer.spans,
            continued: Vec::new(),
        };
        if language == Language::Python {
            source.mark_docstrings();
        }
        source.continued = source.continuation_lines();
        source
    }

    /// Read and tokenize `root/rel`; `None` when the file is not valid UTF-8
    pub fn load(root: &Path, rel: &Path) -> Result<Option<Self>> {
        let language = match Language::detect(rel) {
            Some(language) => language,
            None => return Ok(None),
        };
        let path = root.join(rel);
        let bytes =
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(Self::parse(language, &text))),
            Err(_) => {
                tracing::warn!(path = %rel.display(), "skipping non UTF-8 file");
                Ok(None)
            }
        }
    }

    /// Classify every physical line
    ///
    /// `loc == sloc + comments + multi + blank` always holds.
    pub fn line_counts(&self) -> LineCounts {
        let n = self.lines.len();
        let mut code = vec![false; n];
        let mut comment = vec![false; n];
        let mut multi = vec![false; n];

        for token in self.tokens.iter().filter(|t| t.kind != TokenKind::Doc) {
            for line in token.line..=token.end_line.min(n.saturating_sub(1)) {
                code[line] = true;
            }
        }
        for &(start, end, kind) in &self.spans {
            for line in start..=end.min(n.saturating_sub(1)) {
                match kind {
                    SpanKind::Comment => comment[line] = true,
                    SpanKind::Multi => multi[line] = true,
                }
            }
        }

        let mut counts = LineCounts {
            loc: n,
            ..LineCounts::default()
        };
        for (i, text) in self.lines.iter().enumerate() {
            if code[i] {
                counts.sloc += 1;
            } else if multi[i] {
                counts.multi += 1;
            } else if comment[i] {
                counts.comments += 1;
            } else if text.trim().is_empty() {
                counts.blank += 1;
            } else {
                counts.sloc += 1;
            }
        }
        counts
    }

    /// Halstead volume: `N * log2(n)` over operator and operand tokens
    pub fn halstead_volume(&self) -> f64 {
        let mut distinct = ahash::AHashSet::new();
        let mut total = 0usize;
        for token in &self.tokens {
            let class = match token.kind {
                TokenKind::Keyword | TokenKind::Punct => 'o',
                TokenKind::Ident | TokenKind::Number | TokenKind::Str => 'a',
                TokenKind::Doc => continue,
            };
            total += 1;
            distinct.insert((class, token.text.as_str()));
        }
        if distinct.len() < 2 {
            return 0.0;
        }
        total as f64 * (distinct.len() as f64).log2()
    }

    /// Functions with their decision points
    pub fn outline(&self) -> Outline {
        match self.language {
            Language::Python => self.python_outline(),
            Language::Rust => self.rust_outline(),
        }
    }

    fn mark_docstrings(&mut self) {
        for i in 0..self.tokens.len() {
            let token = &self.tokens[i];
            let stripped = token.text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
            let is_triple = stripped.starts_with("\"\"\"") || stripped.starts_with("'''");
            if token.kind != TokenKind::Str || !is_triple || !token.first_on_line || token.depth != 0 {
                continue;
            }
            let alone = self
                .tokens
                .get(i + 1)
                .map_or(true, |next| next.line > token.end_line);
            if alone {
                let (start, end) = (token.line, token.end_line);
                let kind = if end > start { SpanKind::Multi } else { SpanKind::Comment };
                self.spans.push((start, end, kind));
                self.tokens[i].kind = TokenKind::Doc;
            }
        }
    }

    fn continuation_lines(&self) -> Vec<bool> {
        let mut continued = vec![false; self.lines.len()];
        let multi_line_tokens = self
            .tokens
            .iter()
            .filter(|t| t.end_line > t.line)
            .map(|t| (t.line, t.end_line));
        let multi_line_spans = self.spans.iter().map(|&(start, end, _)| (start, end));
        for (start, end) in multi_line_tokens.chain(multi_line_spans) {
            for line in (start + 1)..=end {
                if let Some(flag) = continued.get_mut(line) {
                    *flag = true;
                }
            }
        }
        continued
    }

    fn is_statement_start(&self, token: &Token) -> bool {
        token.first_on_line
            && token.depth == 0
            && !self.continued.get(token.line).copied().unwrap_or(false)
    }

    fn python_outline(&self) -> Outline {
        struct Scope {
            name: String,
            indent: usize,
            function: Option<usize>,
        }

        let mut out = Outline::default();
        let mut stack: Vec<Scope> = Vec::new();
        let tokens = &self.tokens;

        for (i, token) in tokens.iter().enumerate() {
            if self.is_statement_start(token) {
                while stack.last().map_or(false, |s| s.indent >= token.col) {
                    stack.pop();
                }

                let kw = if token.text == "async" { i + 1 } else { i };
                let keyword = tokens.get(kw).map(|t| t.text.as_str());
                let name = tokens.get(kw + 1).filter(|t| t.kind == TokenKind::Ident);
                if let (Some(keyword @ ("def" | "class")), Some(name)) = (keyword, name) {
                    let mut qualified: Vec<&str> = stack.iter().map(|s| s.name.as_str()).collect();
                    qualified.push(&name.text);
                    let function = if keyword == "def" {
                        out.functions.push(FunctionInfo {
                            name: qualified.join("."),
                            line: token.line + 1,
                            decisions: 0,
                        });
                        Some(out.functions.len() - 1)
                    } else {
                        None
                    };
                    stack.push(Scope {
                        name: name.text.clone(),
                        indent: token.col,
                        function,
                    });
                }
            }

            if self.is_python_decision(i) {
                out.decisions += 1;
                if let Some(f) = stack.iter().rev().find_map(|s| s.function) {
                    out.functions[f].decisions += 1;
                }
            }
        }
        out
    }

    fn is_python_decision(&self, i: usize) -> bool {
        let token = &self.tokens[i];
        match token.kind {
            TokenKind::Keyword => PYTHON_DECISIONS.contains(&token.text.as_str()),
            // `case` is a soft keyword: only a statement ending in ':' counts
            TokenKind::Ident if token.text == "case" && self.is_statement_start(token) => self.tokens
                [i..]
                .iter()
                .take_while(|t| t.line == token.line)
                .last()
                .map_or(false, |t| t.text == ":"),
            _ => false,
        }
    }

    fn rust_outline(&self) -> Outline {
        enum Scope {
            Function(usize),
            Type(String),
        }

        let mut out = Outline::default();
        let mut scopes: Vec<(Scope, usize)> = Vec::new();
        let mut braces = 0usize;
        let mut pending_fn: Option<(String, usize, usize)> = None;
        let mut pending_type: Option<String> = None;
        let mut weights: Vec<isize> = Vec::new();
        let mut file_weight = 0isize;
        let tokens = &self.tokens;

        for (i, token) in tokens.iter().enumerate() {
            match (token.kind, token.text.as_str()) {
                (TokenKind::Keyword, "fn") => {
                    if let Some(name) = tokens.get(i + 1).filter(|t| t.kind == TokenKind::Ident) {
                        let prefix = scopes.last().map(|(scope, _)| match scope {
                            Scope::Function(f) => out.functions[*f].name.clone(),
                            Scope::Type(name) => name.clone(),
                        });
                        let qualified = match prefix {
                            Some(prefix) => format!("{}::{}", prefix, name.text),
                            None => name.text.clone(),
                        };
                        pending_fn = Some((qualified, token.line + 1, token.depth));
                    }
                }
                (TokenKind::Keyword, "impl") => pending_type = impl_type_name(&tokens[i + 1..]),
                (TokenKind::Keyword, "trait") => {
                    pending_type = tokens
                        .get(i + 1)
                        .filter(|t| t.kind == TokenKind::Ident)
                        .map(|t| t.text.clone());
                }
                (TokenKind::Punct, "{") => {
                    braces += 1;
                    if let Some((name, line, _)) = pending_fn.take() {
                        out.functions.push(FunctionInfo {
                            name,
                            line,
                            decisions: 0,
                        });
                        weights.push(0);
                        scopes.push((Scope::Function(out.functions.len() - 1), braces));
                        pending_type = None;
                    } else if let Some(name) = pending_type.take() {
                        scopes.push((Scope::Type(name), braces));
                    }
                }
                (TokenKind::Punct, "}") => {
                    if scopes.last().map_or(false, |(_, depth)| *depth == braces) {
                        scopes.pop();
                    }
                    braces = braces.saturating_sub(1);
                }
                (TokenKind::Punct, ";") => {
                    // Bodiless declaration (trait method, extern fn)
                    if pending_fn.as_ref().map_or(false, |(_, _, depth)| *depth == token.depth) {
                        pending_fn = None;
                    }
                    pending_type = None;
                }
                _ => {}
            }

            let weight = self.rust_decision_weight(i);
            if weight != 0 {
                file_weight += weight;
                let innermost = scopes.iter().rev().find_map(|(scope, _)| match scope {
                    Scope::Function(f) => Some(*f),
                    Scope::Type(_) => None,
                });
                if let Some(f) = innermost {
                    weights[f] += weight;
                }
            }
        }

        for (function, weight) in out.functions.iter_mut().zip(weights) {
            function.decisions = weight.max(0) as usize;
        }
        out.decisions = file_weight.max(0) as usize;
        out
    }

    /// `if`/`while`/loop `for`/`&&`/`||`/`?` add one; each match arm adds one
    /// beyond the first
    fn rust_decision_weight(&self, i: usize) -> isize {
        let token = &self.tokens[i];
        match (token.kind, token.text.as_str()) {
            (TokenKind::Keyword, "if" | "while") => 1,
            (TokenKind::Keyword, "for") => {
                let prev = i.checked_sub(1).map(|p| self.tokens[p].text.as_str());
                let loop_position = matches!(prev, None | Some("{" | "}" | ";" | ":" | "=" | "("));
                let hrtb = self.tokens.get(i + 1).map_or(false, |t| t.text == "<");
                isize::from(loop_position && !hrtb)
            }
            (TokenKind::Keyword, "match") => -1,
            (TokenKind::Punct, "=>" | "&&" | "||" | "?") => 1,
            _ => 0,
        }
    }
}

/// Self type of an `impl` header: the last plain identifier before `{`,
/// taken after `for` when the header implements a trait
fn impl_type_name(tokens: &[Token]) -> Option<String> {
    let mut angle = 0isize;
    let mut name = None;
    for token in tokens {
        match token.text.as_str() {
            "{" | ";" | "where" if angle <= 0 => break,
            "<" => angle += 1,
            ">" => angle -= 1,
            ">>" => angle -= 2,
            "for" if angle <= 0 => name = None,
            _ if angle <= 0 && token.kind == TokenKind::Ident => name = Some(token.text.clone()),
            _ => {}
        }
    }
    name
}

struct Lexer {
    language: Language,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    depth: usize,
    last_token_line: Option<usize>,
    tokens: Vec<Token>,
    spans: Vec<(usize, usize, SpanKind)>,
}

impl Lexer {
    fn new(language: Language, text: &str) -> Self {
        Self {
            language,
            chars: text.chars().collect(),
            pos: 0,
            line: 0,
            col: 0,
            depth: 0,
            last_token_line: None,
            tokens: Vec::new(),
            spans: Vec::new(),
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: usize, col: usize) {
        let text = self.text_from(start);
        let first_on_line = self.last_token_line != Some(line);
        let depth = self.depth;
        match text.as_str() {
            "(" | "[" | "{" if kind == TokenKind::Punct => self.depth += 1,
            ")" | "]" | "}" if kind == TokenKind::Punct => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.tokens.push(Token {
            kind,
            text,
            line,
            end_line: self.line,
            col,
            first_on_line,
            depth,
        });
        self.last_token_line = Some(self.line);
    }

    fn run(&mut self) {
        while let Some(c) = self.peek(0) {
            let (start, line, col) = (self.pos, self.line, self.col);
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' if self.language == Language::Python => self.line_comment(),
                '/' if self.language == Language::Rust && self.peek(1) == Some('/') => {
                    self.line_comment()
                }
                '/' if self.language == Language::Rust && self.peek(1) == Some('*') => {
                    self.block_comment()
                }
                '"' => {
                    self.string(c);
                    self.push(TokenKind::Str, start, line, col);
                }
                '\'' if self.language == Language::Python => {
                    self.string(c);
                    self.push(TokenKind::Str, start, line, col);
                }
                '\'' => self.quote_or_lifetime(start, line, col),
                c if c.is_ascii_digit() => {
                    self.number();
                    self.push(TokenKind::Number, start, line, col);
                }
                c if c.is_alphabetic() || c == '_' => self.word(start, line, col),
                _ => {
                    self.punct();
                    self.push(TokenKind::Punct, start, line, col);
                }
            }
        }
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        self.spans.push((self.line, self.line, SpanKind::Comment));
    }

    fn block_comment(&mut self) {
        let start_line = self.line;
        self.bump();
        self.bump();
        let mut nesting = 1;
        while nesting > 0 {
            match (self.peek(0), self.peek(1)) {
                (Some('/'), Some('*')) => {
                    nesting += 1;
                    self.bump();
                    self.bump();
                }
                (Some('*'), Some('/')) => {
                    nesting -= 1;
                    self.bump();
                    self.bump();
                }
                (Some(_), _) => {
                    self.bump();
                }
                (None, _) => break,
            }
        }
        let kind = if self.line > start_line { SpanKind::Multi } else { SpanKind::Comment };
        self.spans.push((start_line, self.line, kind));
    }

    /// Consume a quoted literal starting at the opening quote
    fn string(&mut self, quote: char) {
        let triple = self.language == Language::Python
            && self.peek(1) == Some(quote)
            && self.peek(2) == Some(quote);
        if triple {
            for _ in 0..3 {
                self.bump();
            }
            while let Some(c) = self.bump() {
                if c == '\\' {
                    self.bump();
                } else if c == quote && self.peek(0) == Some(quote) && self.peek(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    break;
                }
            }
            return;
        }

        self.bump();
        while let Some(c) = self.peek(0) {
            // Python single-quoted strings cannot span lines
            if c == '\n' && self.language == Language::Python {
                break;
            }
            self.bump();
            if c == '\\' {
                self.bump();
            } else if c == quote {
                break;
            }
        }
    }

    /// Rust raw string body after the `r`: `#*"..."#*`
    fn raw_string(&mut self) {
        let mut hashes = 0;
        while self.peek(0) == Some('#') {
            hashes += 1;
            self.bump();
        }
        self.bump();
        while let Some(c) = self.bump() {
            if c == '"' && (0..hashes).all(|k| self.peek(k) == Some('#')) {
                for _ in 0..hashes {
                    self.bump();
                }
                break;
            }
        }
    }

    fn quote_or_lifetime(&mut self, start: usize, line: usize, col: usize) {
        let is_char = match (self.peek(1), self.peek(2)) {
            (Some('\\'), _) => true,
            (Some(_), Some('\'')) => true,
            _ => false,
        };
        if is_char {
            self.string('\'');
            self.push(TokenKind::Str, start, line, col);
        } else {
            self.bump();
            while self.peek(0).map_or(false, |c| c.is_alphanumeric() || c == '_') {
                self.bump();
            }
            self.push(TokenKind::Ident, start, line, col);
        }
    }

    fn number(&mut self) {
        while let Some(c) = self.peek(0) {
            let fraction = c == '.' && self.peek(1).map_or(false, |d| d.is_ascii_digit());
            if c.is_alphanumeric() || c == '_' || fraction {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn word(&mut self, start: usize, line: usize, col: usize) {
        while self.peek(0).map_or(false, |c| c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let word = self.text_from(start);
        let next = self.peek(0);

        match self.language {
            Language::Python => {
                let prefix = matches!(
                    word.to_ascii_lowercase().as_str(),
                    "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
                );
                if prefix && matches!(next, Some('"' | '\'')) {
                    if let Some(quote) = next {
                        self.string(quote);
                    }
                    self.push(TokenKind::Str, start, line, col);
                    return;
                }
            }
            Language::Rust => match (word.as_str(), next) {
                ("r" | "br", Some('"')) => {
                    self.raw_string();
                    self.push(TokenKind::Str, start, line, col);
                    return;
                }
                ("r" | "br", Some('#')) => {
                    let mut k = 0;
                    while self.peek(k) == Some('#') {
                        k += 1;
                    }
                    if self.peek(k) == Some('"') {
                        self.raw_string();
                        self.push(TokenKind::Str, start, line, col);
                        return;
                    }
                    if word == "r" {
                        // Raw identifier
                        self.bump();
                        while self.peek(0).map_or(false, |c| c.is_alphanumeric() || c == '_') {
                            self.bump();
                        }
                        self.push(TokenKind::Ident, start, line, col);
                        return;
                    }
                }
                ("b", Some('"')) => {
                    self.string('"');
                    self.push(TokenKind::Str, start, line, col);
                    return;
                }
                ("b", Some('\'')) => {
                    self.string('\'');
                    self.push(TokenKind::Str, start, line, col);
                    return;
                }
                _ => {}
            },
        }

        let kind = if self.language.keywords().contains(&word.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        self.push(kind, start, line, col);
    }

    fn punct(&mut self) {
        let ahead: String = (0..3).filter_map(|k| self.peek(k)).collect();
        let len = if THREE_CHAR_OPS.iter().any(|op| ahead.starts_with(op)) {
            3
        } else if TWO_CHAR_OPS.iter().any(|op| ahead.starts_with(op)) {
            2
        } else {
            1
        };
        for _ in 0..len {
            self.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYTHON: &str = r##"import os

# helper module
class Parser:
    """Parse things.

    Longer description.
    """

    def parse(self, text):
        if not text:
            return None
        for line in text.splitlines():
            if line and line.startswith("#"):
                continue
        return text

def main():
    x = "if and or"  # not decisions
    return 0 if x else 1
"##;

    const RUST: &str = r#"/// Parses input
pub struct Parser;

impl Parser {
    pub fn parse(&self, text: &str) -> Option<usize> {
        if text.is_empty() && true {
            return None;
        }
        let n = text.parse::<usize>().ok()?;
        match n {
            0 => Some(0),
            _ => Some(n),
        }
    }
}

/* block
   comment */
fn helper() -> [u8; 4] {
    let s = "if while";
    [0; 4]
}

trait Named {
    fn name(&self) -> String;
}
"#;

    #[test]
    fn test_detect() {
        assert_eq!(Language::detect(Path::new("a/b.py")), Some(Language::Python));
        assert_eq!(Language::detect(Path::new("lib.rs")), Some(Language::Rust));
        assert_eq!(Language::detect(Path::new("README.md")), None);
    }

    #[test]
    fn test_python_line_counts() {
        let counts = Source::parse(Language::Python, PYTHON).line_counts();
        assert_eq!(counts.loc, 20);
        assert_eq!(counts.blank, 3);
        assert_eq!(counts.comments, 1);
        assert_eq!(counts.multi, 4);
        assert_eq!(counts.sloc, 12);
        assert_eq!(
            counts.loc,
            counts.sloc + counts.comments + counts.multi + counts.blank
        );
    }

    #[test]
    fn test_python_outline() {
        let outline = Source::parse(Language::Python, PYTHON).outline();
        let names: Vec<&str> = outline.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Parser.parse", "main"]);
        // if, for, if, and
        assert_eq!(outline.functions[0].decisions, 4);
        // conditional expression only; string contents ignored
        assert_eq!(outline.functions[1].decisions, 1);
        assert_eq!(outline.functions[1].line, 18);
    }

    #[test]
    fn test_python_match_case() {
        let text = "def f(x):\n    match x:\n        case 1:\n            return 1\n        case _:\n            return 0\n";
        let outline = Source::parse(Language::Python, text).outline();
        assert_eq!(outline.functions[0].decisions, 2);
    }

    #[test]
    fn test_rust_line_counts() {
        let counts = Source::parse(Language::Rust, RUST).line_counts();
        assert_eq!(counts.loc, 26);
        assert_eq!(counts.comments, 1);
        assert_eq!(counts.multi, 2);
        assert_eq!(counts.blank, 3);
        assert_eq!(counts.sloc, 20);
    }

    #[test]
    fn test_rust_outline() {
        let outline = Source::parse(Language::Rust, RUST).outline();
        let names: Vec<&str> = outline.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Parser::parse", "helper"]);
        // if, &&, ?, two arms of one match
        assert_eq!(outline.functions[0].decisions, 4);
        assert_eq!(outline.functions[1].decisions, 0);
    }

    #[test]
    fn test_rust_impl_trait_for_type() {
        let text = "impl<'a> fmt::Display for Wrapper<'a> {\n    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {\n        for c in self.0.chars() {\n            write!(f, \"{}\", c)?;\n        }\n        Ok(())\n    }\n}\n";
        let outline = Source::parse(Language::Rust, text).outline();
        assert_eq!(outline.functions[0].name, "Wrapper::fmt");
        assert_eq!(outline.functions[0].decisions, 2);
    }

    #[test]
    fn test_halstead_volume() {
        assert_eq!(Source::parse(Language::Python, "").halstead_volume(), 0.0);
        let small = Source::parse(Language::Python, "x = 1\n").halstead_volume();
        let large = Source::parse(Language::Python, PYTHON).halstead_volume();
        assert!(small > 0.0);
        assert!(large > small);
    }
}
