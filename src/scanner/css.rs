//! Block and declaration scanning
//!
//! The scanner only understands enough CSS to find custom-property
//! declarations: block structure, selector preludes, comments and strings.
//! Every other declaration is skipped. Malformed input produces a
//! `ParseError` diagnostic and scanning resumes after the next `;` or `}`.

use super::var_ref;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::token::{Location, Tier};
use std::str::FromStr;

/// A custom-property declaration in one selector scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Scope key: selector, prefixed by enclosing conditional at-rules
    pub scope: String,
    /// Identifier without the leading `--`
    pub name: String,
    /// Raw value with `!important` removed
    pub value: String,
    pub location: Location,
    /// Tier from a preceding `/* @tier <name> */` comment
    pub annotation: Option<Tier>,
}

/// Output of a scan: declarations in source order plus recovered parse errors
#[derive(Debug, Default)]
pub struct ScanResult {
    pub declarations: Vec<Declaration>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan CSS source text for custom-property declarations
pub fn scan(source: &str) -> ScanResult {
    Scanner::new(source).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    /// Style rule with a selector list
    Rule,
    /// `@media`, `@supports` and friends: part of the scope key
    Conditional,
    /// `@layer`: does not change the scope
    Transparent,
    /// Content is skipped after an error
    Ignored,
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    prelude: String,
    line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Semicolon,
    Open,
    Close,
    Eof,
}

#[derive(Debug)]
struct Chunk {
    text: String,
    line: usize,
    end_line: usize,
    terminator: Terminator,
    balanced: bool,
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    blocks: Vec<Block>,
    annotation: Option<Tier>,
    result: ScanResult,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            blocks: Vec::new(),
            annotation: None,
            result: ScanResult::default(),
        }
    }

    fn run(mut self) -> ScanResult {
        loop {
            if !self.skip_trivia() || self.pos >= self.chars.len() {
                break;
            }

            let chunk = self.read_chunk();
            match chunk.terminator {
                Terminator::Open => self.open_block(chunk),
                Terminator::Semicolon => self.statement(chunk),
                Terminator::Close => {
                    let close_line = chunk.end_line;
                    self.statement(chunk);
                    self.close_block(close_line);
                }
                Terminator::Eof => {
                    self.statement(chunk);
                    break;
                }
            }
        }

        for block in std::mem::take(&mut self.blocks) {
            let prelude = if block.prelude.is_empty() { "{" } else { block.prelude.as_str() };
            self.error(
                block.line,
                format!("unterminated block `{}` opened on line {}", prelude, block.line),
            );
        }

        self.result
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.result
            .diagnostics
            .push(Diagnostic::error(DiagnosticKind::ParseError, Location::new(line), message));
    }

    /// Skip whitespace and comments. Returns false on an unterminated comment.
    fn skip_trivia(&mut self) -> bool {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                self.line += 1;
                self.pos += 1;
            } else if c.is_whitespace() {
                self.pos += 1;
            } else if c == '/' && self.peek(1) == Some('*') {
                match self.read_comment() {
                    Some(text) => self.note_annotation(&text),
                    None => return false,
                }
            } else {
                break;
            }
        }
        true
    }

    /// Consume a `/* ... */` comment and return its body
    fn read_comment(&mut self) -> Option<String> {
        let start_line = self.line;
        self.pos += 2;
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if c == '*' && self.peek(1) == Some('/') {
                self.pos += 2;
                return Some(text);
            }
            if c == '\n' {
                self.line += 1;
            }
            text.push(c);
            self.pos += 1;
        }
        self.error(start_line, "unterminated comment");
        None
    }

    fn note_annotation(&mut self, comment: &str) {
        let Some(idx) = comment.find("@tier") else {
            return;
        };
        let word = comment[idx + "@tier".len()..].split_whitespace().next().unwrap_or("");
        match Tier::from_str(word) {
            Ok(tier) => self.annotation = Some(tier),
            Err(_) => {
                let line = self.line;
                self.error(line, format!("unknown tier `{}` in @tier annotation", word));
            }
        }
    }

    /// Consume a quoted string into `text`. Returns false if it never closes.
    fn read_string(&mut self, quote: char, text: &mut String) -> bool {
        let start_line = self.line;
        text.push(quote);
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            text.push(c);
            self.pos += 1;
            if c == '\\' {
                if let Some(escaped) = self.peek(0) {
                    if escaped == '\n' {
                        self.line += 1;
                    }
                    text.push(escaped);
                    self.pos += 1;
                }
            } else if c == quote {
                return true;
            } else if c == '\n' {
                self.line += 1;
            }
        }
        self.error(start_line, "unterminated string");
        false
    }

    /// Read up to the next `;`, `{` or `}` outside strings, comments and parentheses
    fn read_chunk(&mut self) -> Chunk {
        let line = self.line;
        let mut text = String::new();
        let mut depth: i32 = 0;

        let finish = |text: String, terminator: Terminator, end_line: usize, depth: i32| Chunk {
            text,
            line,
            end_line,
            terminator,
            balanced: depth == 0,
        };

        while let Some(c) = self.peek(0) {
            match c {
                '"' | '\'' => {
                    if !self.read_string(c, &mut text) {
                        return finish(String::new(), Terminator::Eof, self.line, depth);
                    }
                    continue;
                }
                '/' if self.peek(1) == Some('*') => {
                    if self.read_comment().is_none() {
                        return finish(text, Terminator::Eof, self.line, depth);
                    }
                    text.push(' ');
                    continue;
                }
                '\\' => {
                    text.push(c);
                    self.pos += 1;
                    if let Some(escaped) = self.peek(0) {
                        text.push(escaped);
                        self.pos += 1;
                    }
                    continue;
                }
                '(' => depth += 1,
                ')' => depth -= 1,
                ';' if depth <= 0 => {
                    self.pos += 1;
                    return finish(text, Terminator::Semicolon, self.line, depth);
                }
                '{' => {
                    self.pos += 1;
                    return finish(text, Terminator::Open, self.line, depth);
                }
                '}' => {
                    self.pos += 1;
                    return finish(text, Terminator::Close, self.line, depth);
                }
                '\n' => self.line += 1,
                _ => {}
            }
            text.push(c);
            self.pos += 1;
        }

        finish(text, Terminator::Eof, self.line, depth)
    }

    fn open_block(&mut self, chunk: Chunk) {
        self.annotation = None;
        let prelude = normalize(&chunk.text);

        let kind = if prelude.is_empty() {
            self.error(chunk.line, "block without a selector");
            BlockKind::Ignored
        } else if prelude.starts_with("--") {
            self.error(chunk.line, format!("unexpected `{{` in declaration `{}`", prelude));
            BlockKind::Ignored
        } else if let Some(at_rule) = prelude.strip_prefix('@') {
            let name = at_rule.split_whitespace().next().unwrap_or("");
            if name.eq_ignore_ascii_case("layer") {
                BlockKind::Transparent
            } else {
                BlockKind::Conditional
            }
        } else {
            BlockKind::Rule
        };

        self.blocks.push(Block {
            kind,
            prelude,
            line: chunk.line,
        });
    }

    fn close_block(&mut self, line: usize) {
        if self.blocks.pop().is_none() {
            self.error(line, "unexpected `}` without a matching `{`");
        }
    }

    fn statement(&mut self, chunk: Chunk) {
        let text = chunk.text.trim();
        if text.is_empty() {
            return;
        }
        let annotation = self.annotation.take();

        if self.blocks.is_empty() {
            // @import, @charset and similar statements
            if !text.starts_with('@') {
                self.error(chunk.line, format!("unexpected `{}` outside of a rule", abbreviate(text)));
            }
            return;
        }
        if !text.starts_with("--") || self.blocks.iter().any(|b| b.kind == BlockKind::Ignored) {
            return;
        }

        let Some((raw_name, raw_value)) = text.split_once(':') else {
            self.error(
                chunk.line,
                format!("malformed declaration `{}`: expected `:`", abbreviate(text)),
            );
            return;
        };

        let name = raw_name.trim()[2..].to_string();
        if name.is_empty() || !name.chars().all(is_ident_char) {
            self.error(chunk.line, format!("invalid custom property name `{}`", raw_name.trim()));
            return;
        }
        if !chunk.balanced {
            self.error(chunk.line, format!("unbalanced parentheses in value of `--{}`", name));
            return;
        }

        let value = strip_important(raw_value.trim()).to_string();
        if let Some(err) = var_ref::syntax_errors(&value).into_iter().next() {
            self.error(chunk.line, format!("malformed var() in value of `--{}`: {}", name, err));
            return;
        }

        let scopes = self.current_scopes();
        if scopes.is_empty() {
            self.error(
                chunk.line,
                format!("custom property `--{}` declared outside of a style rule", name),
            );
            return;
        }

        for scope in scopes {
            self.result.declarations.push(Declaration {
                location: Location::new(chunk.line).with_scope(scope.clone()),
                scope,
                name: name.clone(),
                value: value.clone(),
                annotation,
            });
        }
    }

    /// Scope keys for declarations in the innermost open block
    fn current_scopes(&self) -> Vec<String> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut selectors: Vec<String> = Vec::new();

        for block in &self.blocks {
            match block.kind {
                BlockKind::Conditional => conditions.push(&block.prelude),
                BlockKind::Transparent => {}
                BlockKind::Ignored => return Vec::new(),
                BlockKind::Rule => {
                    let list = split_selector_list(&block.prelude);
                    selectors = if selectors.is_empty() {
                        list
                    } else {
                        selectors
                            .iter()
                            .flat_map(|parent| list.iter().map(move |child| nest(parent, child)))
                            .collect()
                    };
                }
            }
        }

        if conditions.is_empty() {
            return selectors;
        }
        let prefix = conditions.join(" ");
        selectors.into_iter().map(|s| format!("{} {}", prefix, s)).collect()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn abbreviate(text: &str) -> String {
    let flat = normalize(text);
    if flat.chars().count() > 40 {
        format!("{}...", flat.chars().take(40).collect::<String>())
    } else {
        flat
    }
}

fn strip_important(value: &str) -> &str {
    if let Some(idx) = value.rfind('!') {
        if value[idx + 1..].trim().eq_ignore_ascii_case("important") {
            return value[..idx].trim_end();
        }
    }
    value
}

/// CSS nesting: `&` stands for the parent, otherwise descendant composition
fn nest(parent: &str, child: &str) -> String {
    if child.contains('&') {
        child.replace('&', parent)
    } else {
        format!("{} {}", parent, child)
    }
}

/// Split a selector list on top-level commas
pub fn split_selector_list(prelude: &str) -> Vec<String> {
    let mut selectors = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    for c in prelude.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth -= 1,
                ',' if depth == 0 => {
                    selectors.push(normalize(&current));
                    current.clear();
                    continue;
                }
                _ => {}
            },
        }
        current.push(c);
    }
    selectors.push(normalize(&current));
    selectors.retain(|s| !s.is_empty());
    selectors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples(result: &ScanResult) -> Vec<(String, String, String)> {
        result
            .declarations
            .iter()
            .map(|d| (d.scope.clone(), d.name.clone(), d.value.clone()))
            .collect()
    }

    #[test]
    fn test_root_declarations() {
        let result = scan(":root {\n  --color-neutral-0: #fff;\n  --color-bg-primary: var(--color-neutral-0);\n}\n");
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            triples(&result),
            vec![
                (":root".into(), "color-neutral-0".into(), "#fff".into()),
                (":root".into(), "color-bg-primary".into(), "var(--color-neutral-0)".into()),
            ]
        );
        assert_eq!(result.declarations[0].location.line, 2);
        assert_eq!(result.declarations[1].location.line, 3);
        assert_eq!(result.declarations[1].location.scope.as_deref(), Some(":root"));
    }

    #[test]
    fn test_ignores_regular_properties_and_comments() {
        let source = "/* tokens */\n.card { color: red; --card-bg: blue /* inline */; padding: 0 }";
        let result = scan(source);
        assert!(result.diagnostics.is_empty());
        assert_eq!(triples(&result), vec![(".card".into(), "card-bg".into(), "blue".into())]);
    }

    #[test]
    fn test_last_declaration_without_semicolon() {
        let result = scan(":root{--a: 1px; --b: 2px}");
        assert_eq!(result.declarations.len(), 2);
        assert_eq!(result.declarations[1].value, "2px");
    }

    #[test]
    fn test_selector_list_and_override_scope() {
        let result = scan(":root, [data-theme=\"light\"] { --bg: white; }\n[data-theme=\"dark\"] { --bg: black; }");
        assert_eq!(
            triples(&result),
            vec![
                (":root".into(), "bg".into(), "white".into()),
                ("[data-theme=\"light\"]".into(), "bg".into(), "white".into()),
                ("[data-theme=\"dark\"]".into(), "bg".into(), "black".into()),
            ]
        );
    }

    #[test]
    fn test_media_and_layer_scopes() {
        let source = "@layer tokens { :root { --a: 1; } }\n@media (prefers-color-scheme: dark) {\n  :root { --a: 2; }\n}";
        let result = scan(source);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.declarations[0].scope, ":root");
        assert_eq!(result.declarations[1].scope, "@media (prefers-color-scheme: dark) :root");
        assert_eq!(result.declarations[1].location.line, 3);
    }

    #[test]
    fn test_nested_rules() {
        let result = scan(".card { --card-pad: 4px; &.compact { --card-pad: 2px; } .title { --card-title: bold; } }");
        let scopes: Vec<_> = result.declarations.iter().map(|d| d.scope.as_str()).collect();
        assert_eq!(scopes, vec![".card", ".card.compact", ".card .title"]);
    }

    #[test]
    fn test_important_and_strings() {
        let result = scan(":root { --font: \"Inter; sans\" !important; --url: url(data:a;b); }");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.declarations[0].value, "\"Inter; sans\"");
        assert_eq!(result.declarations[1].value, "url(data:a;b)");
    }

    #[test]
    fn test_tier_annotation() {
        let result = scan(":root {\n  /* @tier semantic */\n  --brand: var(--blue-500);\n  --other: 1;\n}");
        assert_eq!(result.declarations[0].annotation, Some(Tier::Semantic));
        assert_eq!(result.declarations[1].annotation, None);
    }

    #[test]
    fn test_unknown_annotation_is_parse_error() {
        let result = scan(":root { /* @tier fancy */ --a: 1; }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.declarations.len(), 1);
    }

    #[test]
    fn test_missing_colon_recovers() {
        let result = scan(":root {\n  --broken red;\n  --ok: blue;\n}");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::ParseError);
        assert_eq!(result.diagnostics[0].location.line, 2);
        assert_eq!(triples(&result), vec![(":root".into(), "ok".into(), "blue".into())]);
    }

    #[test]
    fn test_unterminated_block() {
        let result = scan(":root {\n  --a: 1;\n");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("unterminated block"));
        assert_eq!(result.declarations.len(), 1);
    }

    #[test]
    fn test_stray_close_brace() {
        let result = scan("} :root { --a: 1; }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.declarations.len(), 1);
    }

    #[test]
    fn test_unbalanced_parens_skip_to_brace() {
        let result = scan(":root { --a: calc(1px + 2px; } :root { --b: 1; }");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("unbalanced"));
        assert_eq!(triples(&result), vec![(":root".into(), "b".into(), "1".into())]);
    }

    #[test]
    fn test_malformed_var() {
        let result = scan(":root { --a: var(b); --c: 1; }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.declarations.len(), 1);
    }

    #[test]
    fn test_unterminated_comment_and_string() {
        assert_eq!(scan(":root { --a: 1; } /* open").diagnostics.len(), 1);
        let result = scan(":root { --a: \"open; }");
        assert!(result.diagnostics.iter().any(|d| d.message.contains("unterminated string")));
    }

    #[test]
    fn test_declaration_outside_rule() {
        let result = scan("--a: 1;\n@import url(\"x.css\");\n@media print { --b: 2; }");
        assert_eq!(result.diagnostics.len(), 2);
        assert!(result.declarations.is_empty());
    }

    #[test]
    fn test_split_selector_list() {
        assert_eq!(
            split_selector_list(":is(.a, .b) .c,  [data-x=\"1,2\"]"),
            vec![":is(.a, .b) .c".to_string(), "[data-x=\"1,2\"]".to_string()]
        );
    }
}
