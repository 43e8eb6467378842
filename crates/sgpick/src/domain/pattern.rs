//! Placeholder scanning and identifier inference over structural pattern text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::errors::DomainError;
use crate::domain::model::Pattern;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<variadic>\$\$\$[A-Za-z0-9_]*)|(?P<single>\$\$?[A-Za-z_][A-Za-z0-9_]*)|(?P<ident>[A-Za-z_][A-Za-z0-9_]*)",
    )
    .expect("valid token regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Binds exactly one syntax node (`$NAME`).
    Single,
    /// Binds zero or more sibling nodes (`$$$ARGS`).
    Variadic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub name: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Placeholder(Placeholder),
    Ident { text: &'a str },
}

fn tokens(text: &str) -> Vec<Token<'_>> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            if let Some(m) = caps.name("variadic") {
                return Some(Token::Placeholder(Placeholder {
                    kind: PlaceholderKind::Variadic,
                    name: m.as_str().trim_start_matches('$').to_owned(),
                    offset: m.start(),
                }));
            }
            if let Some(m) = caps.name("single") {
                return Some(Token::Placeholder(Placeholder {
                    kind: PlaceholderKind::Single,
                    name: m.as_str().trim_start_matches('$').to_owned(),
                    offset: m.start(),
                }));
            }
            caps.name("ident").map(|m| Token::Ident { text: m.as_str() })
        })
        .collect()
}

/// All placeholders in the order they appear.
pub fn placeholders(text: &str) -> Vec<Placeholder> {
    tokens(text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Placeholder(placeholder) => Some(placeholder),
            Token::Ident { .. } => None,
        })
        .collect()
}

/// Guess the symbol a user wants references for from the literal text around the first
/// single-node placeholder.
///
/// The first non-keyword identifier after that placeholder wins, otherwise the nearest one
/// before it. Patterns with no single-node placeholder or no literal identifier yield
/// [`DomainError::UnextractableIdentifier`].
pub fn extract_identifier(pattern: &Pattern) -> Result<String, DomainError> {
    let unextractable = || DomainError::UnextractableIdentifier(pattern.text().to_owned());
    let keywords = pattern.language().keywords();
    let tokens = tokens(pattern.text());

    let anchor = tokens
        .iter()
        .position(|token| {
            matches!(token, Token::Placeholder(p) if p.kind == PlaceholderKind::Single)
        })
        .ok_or_else(unextractable)?;

    let candidate = |token: &Token<'_>| match token {
        Token::Ident { text } if !keywords.contains(text) => Some(text.to_string()),
        _ => None,
    };

    tokens[anchor + 1..]
        .iter()
        .find_map(candidate)
        .or_else(|| tokens[..anchor].iter().rev().find_map(candidate))
        .ok_or_else(unextractable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Language;

    fn pattern(text: &str, language: Language) -> Pattern {
        Pattern::new(text, language).unwrap()
    }

    #[test]
    fn classifies_placeholders() {
        let found = placeholders("$OBJ.$METHOD($$$ARGS, $$$)");
        let kinds: Vec<_> = found.iter().map(|p| (p.kind, p.name.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (PlaceholderKind::Single, "OBJ"),
                (PlaceholderKind::Single, "METHOD"),
                (PlaceholderKind::Variadic, "ARGS"),
                (PlaceholderKind::Variadic, ""),
            ]
        );
    }

    #[test]
    fn prefers_identifier_after_placeholder() {
        let found = extract_identifier(&pattern("$X.unwrap()", Language::Rust)).unwrap();
        assert_eq!(found, "unwrap");
    }

    #[test]
    fn falls_back_to_identifier_before_placeholder() {
        let found = extract_identifier(&pattern("console.log($MSG)", Language::JavaScript));
        assert_eq!(found.unwrap(), "log");
    }

    #[test]
    fn member_call_without_literal_is_unextractable() {
        let result = extract_identifier(&pattern("$OBJ.$METHOD($$$)", Language::Python));
        assert!(matches!(
            result,
            Err(DomainError::UnextractableIdentifier(text)) if text == "$OBJ.$METHOD($$$)"
        ));
    }

    #[test]
    fn keywords_are_not_identifiers() {
        let result = extract_identifier(&pattern("def $FUNC($$$):", Language::Python));
        assert!(matches!(result, Err(DomainError::UnextractableIdentifier(_))));
    }

    #[test]
    fn variadic_only_patterns_are_unextractable() {
        let result = extract_identifier(&pattern("print($$$)", Language::Python));
        assert!(matches!(result, Err(DomainError::UnextractableIdentifier(_))));
    }
}
