//! `var()` reference parsing
//!
//! Values may nest references inside fallbacks:
//! `var(--a, var(--b, red))` references both `a` and `b`. Every call is
//! found by scanning for `var(` at an identifier boundary, so nested calls
//! are visited without recursion.

/// A reference to a custom property from inside a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarReference {
    /// Referenced identifier without the leading `--`
    pub name: String,
    /// Raw fallback text after the first top-level comma
    pub fallback: Option<String>,
}

impl VarReference {
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// A parsed `var()` call with its byte span in the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarCall {
    pub reference: VarReference,
    /// Offset of the `v` in `var(`
    pub start: usize,
    /// Offset just past the closing `)`
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VarSyntaxError {
    #[error("expected a custom property name after `var(`")]
    MissingName,
    #[error("unexpected text after the property name in `var()`")]
    UnexpectedToken,
    #[error("unterminated `var(`")]
    Unterminated,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Find the next `var(` at or after `from`, matched case-insensitively
pub fn next_var_start(value: &str, from: usize) -> Option<usize> {
    let bytes = value.as_bytes();
    let mut i = from;
    while i + 4 <= bytes.len() {
        if bytes[i..i + 4].eq_ignore_ascii_case(b"var(") && (i == 0 || !is_ident_byte(bytes[i - 1])) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Parse the `var()` call beginning at `start`
pub fn parse_var_call(value: &str, start: usize) -> Result<VarCall, VarSyntaxError> {
    let bytes = value.as_bytes();
    let mut i = skip_whitespace(bytes, start + 4);

    if !value[i..].starts_with("--") {
        return Err(VarSyntaxError::MissingName);
    }
    let name_start = i + 2;
    i = name_start;
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    if i == name_start {
        return Err(VarSyntaxError::MissingName);
    }
    let name = value[name_start..i].to_string();
    i = skip_whitespace(bytes, i);

    match bytes.get(i) {
        Some(b')') => Ok(VarCall {
            reference: VarReference { name, fallback: None },
            start,
            end: i + 1,
        }),
        Some(b',') => {
            let fallback_start = i + 1;
            let close = find_closing_paren(bytes, fallback_start).ok_or(VarSyntaxError::Unterminated)?;
            Ok(VarCall {
                reference: VarReference {
                    name,
                    fallback: Some(value[fallback_start..close].trim().to_string()),
                },
                start,
                end: close + 1,
            })
        }
        Some(_) => Err(VarSyntaxError::UnexpectedToken),
        None => Err(VarSyntaxError::Unterminated),
    }
}

/// Offset of the `)` closing the current call, skipping nested parens and strings
fn find_closing_paren(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' if depth == 0 => return Some(i),
                b')' => depth -= 1,
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Every well-formed `var()` call in `value`, outermost first, nested fallbacks included
pub fn var_calls(value: &str) -> Vec<VarCall> {
    let mut calls = Vec::new();
    let mut from = 0;
    while let Some(start) = next_var_start(value, from) {
        if let Ok(call) = parse_var_call(value, start) {
            calls.push(call);
        }
        from = start + 4;
    }
    calls
}

/// Extract all referenced identifiers, including those inside fallbacks
pub fn extract_references(value: &str) -> Vec<VarReference> {
    var_calls(value).into_iter().map(|call| call.reference).collect()
}

/// Syntax problems in the `var()` calls of `value`
pub fn syntax_errors(value: &str) -> Vec<VarSyntaxError> {
    let mut errors = Vec::new();
    let mut from = 0;
    while let Some(start) = next_var_start(value, from) {
        if let Err(err) = parse_var_call(value, start) {
            errors.push(err);
        }
        from = start + 4;
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(value: &str) -> Vec<String> {
        extract_references(value).into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_simple_reference() {
        let refs = extract_references("var(--color-neutral-0)");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "color-neutral-0");
        assert!(!refs[0].has_fallback());
    }

    #[test]
    fn test_nested_fallbacks() {
        let refs = extract_references("var(--a, var(--b, red))");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "a");
        assert_eq!(refs[0].fallback.as_deref(), Some("var(--b, red)"));
        assert_eq!(refs[1].name, "b");
        assert_eq!(refs[1].fallback.as_deref(), Some("red"));
    }

    #[test]
    fn test_multiple_references_in_value() {
        assert_eq!(
            names("var(--space-1) calc(var(--space-2) * 2) VAR(--space-3)"),
            vec!["space-1", "space-2", "space-3"]
        );
    }

    #[test]
    fn test_fallback_with_parens_and_strings() {
        let refs = extract_references("var(--font, \"Helvetica Neue (web)\", rgb(0 0 0))");
        assert_eq!(refs[0].fallback.as_deref(), Some("\"Helvetica Neue (web)\", rgb(0 0 0)"));
    }

    #[test]
    fn test_empty_fallback_is_a_fallback() {
        let refs = extract_references("var(--maybe,)");
        assert_eq!(refs[0].fallback.as_deref(), Some(""));
    }

    #[test]
    fn test_identifier_boundary() {
        assert!(names("myvar(--x)").is_empty());
        assert!(names("--var(--x)").is_empty());
    }

    #[test]
    fn test_call_span() {
        let value = "1px solid var(--border)";
        let call = parse_var_call(value, next_var_start(value, 0).unwrap()).unwrap();
        assert_eq!(&value[call.start..call.end], "var(--border)");
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(syntax_errors("var(color)"), vec![VarSyntaxError::MissingName]);
        assert_eq!(syntax_errors("var(--a"), vec![VarSyntaxError::Unterminated]);
        assert_eq!(syntax_errors("var(--a b)"), vec![VarSyntaxError::UnexpectedToken]);
        assert_eq!(syntax_errors("var(--a, ( )"), vec![VarSyntaxError::Unterminated]);
        assert!(syntax_errors("var(--a, var(--b))").is_empty());
    }
}
