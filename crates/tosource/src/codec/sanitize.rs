//! Token-level neutralization of executable constructs.
//!
//! Before safe-mode decoding the text is tokenized and constructs that could
//! execute code are cut out: `eval` identifiers, `function` keywords that
//! follow punctuation, `new Function` pairs and empty call parentheses.
//! The surviving tokens are joined back together with a space after each
//! keyword.

use tracing::debug;

use crate::codec::lexer::{Token, TokenKind, tokenize};

fn mentions_function(text: &str) -> bool {
    text.as_bytes()
        .windows(8)
        .any(|w| w.eq_ignore_ascii_case(b"function"))
}

/// Rewrites `text` so that it contains no directly invocable code.
///
/// Never fails; characters the tokenizer does not recognise survive
/// unchanged.
pub fn sanitize(text: &str) -> String {
    let mut tokens = tokenize(text);
    let original_len = tokens.len();

    let mut i = 0;
    while i + 1 < tokens.len() {
        let (x, y) = (tokens[i], tokens[i + 1]);
        if x.is_identifier("eval") {
            tokens.remove(i);
        } else if (x.kind == TokenKind::Punctuator
            && y.kind == TokenKind::Keyword
            && mentions_function(y.text))
            || y.is_identifier("eval")
        {
            tokens.remove(i + 1);
        } else if (x.is_keyword("new")
            && y.kind == TokenKind::Identifier
            && mentions_function(y.text))
            || (x.is_punct("(") && y.is_punct(")"))
        {
            tokens.drain(i..i + 2);
        } else {
            i += 1;
        }
    }

    let removed = original_len - tokens.len();
    if removed > 0 {
        debug!(removed, "sanitizer removed tokens");
    }
    join(&tokens)
}

fn join(tokens: &[Token<'_>]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len() + 1).sum());
    for token in tokens {
        out.push_str(token.text);
        if token.kind == TokenKind::Keyword {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_call() {
        assert_eq!(
            sanitize("(function(){console.log(`exploited`)}))()"),
            "({console.log(`exploited`)}))"
        );
    }

    #[test]
    fn test_function_constructor() {
        assert_eq!(
            sanitize("new Function(console.log(`exploited`))()"),
            "(console.log(`exploited`))"
        );
        assert_eq!(sanitize("new Function('x')()"), "('x')");
    }

    #[test]
    fn test_eval() {
        assert_eq!(
            sanitize("(\n\tfunction(){eval('console.log(`exploited`)') })()"),
            "({('console.log(`exploited`)')})"
        );
    }

    #[test]
    fn test_benign_text_unchanged() {
        assert_eq!(
            sanitize("new Date(\"1970-01-01T\"00:00:00)"),
            "new Date(\"1970-01-01T\"00:00:00)"
        );
        assert_eq!(sanitize("{a: [1, 2], b: null}"), "{a:[1,2],b:null}");
    }

    #[test]
    fn test_keyword_spacing() {
        assert_eq!(sanitize("new   Date(0)"), "new Date(0)");
        assert_eq!(sanitize("typeof x"), "typeof x");
    }

    #[test]
    fn test_invalid_characters_survive() {
        assert_eq!(sanitize("a # b"), "a#b");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_function_mentions_any_case() {
        assert!(mentions_function("function"));
        assert!(mentions_function("MyFunctionFactory"));
        assert!(mentions_function("FUNCTION"));
        assert!(!mentions_function("func"));
        assert!(!mentions_function("fun ction"));
        assert_eq!(sanitize("new AsyncFunction('x')"), "('x')");
    }

    #[test]
    fn test_nested_removals() {
        assert_eq!(sanitize("[eval, eval]"), "[,]");
        assert_eq!(sanitize("new FUNCTION()()"), "");
    }
}
