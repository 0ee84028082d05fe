//! Type of a default value from its source text
//!
//! Only literals are typed: numbers, strings, characters, booleans, `null`
//! and arrays of those. Anything else (identifiers, calls, tables) is left
//! untyped and never checked.

use crate::types::Type;

/// Infer the type of a literal written as `text`
pub fn infer_literal(text: &str) -> Option<Type> {
    let text = text.trim();
    match text {
        "" => return None,
        "null" => return Some(Type::NULL),
        "true" | "false" => return Some(Type::BOOL),
        _ => {}
    }

    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return infer_array(inner);
    }
    if is_string_literal(text) {
        return Some(Type::STRING);
    }
    if is_char_literal(text) {
        return Some(Type::CHAR);
    }
    infer_number(text.strip_prefix('-').unwrap_or(text))
}

/// `None` when the brackets do not enclose the whole text (`[1]+[2]`)
fn infer_array(inner: &str) -> Option<Type> {
    let elements = split_top_level(inner)?;
    if elements.is_empty() {
        return Some(Type::array(Type::ANY));
    }

    let mut types = Vec::with_capacity(elements.len());
    for element in elements {
        match infer_literal(element) {
            Some(ty) => types.push(ty),
            None => return Some(Type::array(Type::ANY)),
        }
    }
    Some(Type::array(Type::union(types)))
}

fn infer_number(text: &str) -> Option<Type> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return (!hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())).then_some(Type::INT);
    }
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return Some(Type::INT);
    }
    text.parse::<f64>().ok().map(|_| Type::FLOAT)
}

fn is_string_literal(text: &str) -> bool {
    let (body, verbatim) = match text.strip_prefix('@') {
        Some(body) => (body, true),
        None => (text, false),
    };
    body.len() >= 2 && body.starts_with('"') && closing_quote(body, verbatim) == Some(body.len() - 1)
}

fn is_char_literal(text: &str) -> bool {
    let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) else {
        return false;
    };
    let mut chars = inner.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(c), None, _) => c != '\\',
        (Some('\\'), Some(_), None) => true,
        _ => false,
    }
}

/// Byte offset of the quote closing the string that starts at offset 0
fn closing_quote(text: &str, verbatim: bool) -> Option<usize> {
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if !verbatim => {
                chars.next();
            }
            // `""` inside a verbatim string is an escaped quote
            '"' if verbatim && matches!(chars.peek(), Some((_, '"'))) => {
                chars.next();
            }
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested in brackets or string literals.
/// `None` if the text closes more brackets than it opens.
fn split_top_level(text: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    let last = &text[start..];
    // A trailing comma does not add an element
    if !last.trim().is_empty() {
        parts.push(last);
    }
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(infer_literal("5"), Some(Type::INT));
        assert_eq!(infer_literal("-5"), Some(Type::INT));
        assert_eq!(infer_literal("0x1F"), Some(Type::INT));
        assert_eq!(infer_literal("3.14"), Some(Type::FLOAT));
        assert_eq!(infer_literal("1e10"), Some(Type::FLOAT));
        assert_eq!(infer_literal("\"Alice\""), Some(Type::STRING));
        assert_eq!(infer_literal("@\"C:\\dir\""), Some(Type::STRING));
        assert_eq!(infer_literal("'a'"), Some(Type::CHAR));
        assert_eq!(infer_literal("'\\n'"), Some(Type::CHAR));
        assert_eq!(infer_literal("true"), Some(Type::BOOL));
        assert_eq!(infer_literal("null"), Some(Type::NULL));
    }

    #[test]
    fn test_non_literals_are_untyped() {
        assert_eq!(infer_literal("x"), None);
        assert_eq!(infer_literal("f(1)"), None);
        assert_eq!(infer_literal("{a=1}"), None);
        assert_eq!(infer_literal("\"a\"+\"b\""), None);
        assert_eq!(infer_literal("1+2"), None);
        assert_eq!(infer_literal("[1]+[2]"), None);
    }

    #[test]
    fn test_arrays() {
        assert_eq!(infer_literal("[95,87,92]"), Some(Type::array(Type::INT)));
        assert_eq!(infer_literal("[]"), Some(Type::array(Type::ANY)));
        assert_eq!(
            infer_literal("[\"a,b\",1]"),
            Some(Type::array(Type::union([Type::STRING, Type::INT])))
        );
        assert_eq!(infer_literal("[[1],[2,3]]"), Some(Type::array(Type::array(Type::INT))));
        assert_eq!(infer_literal("[1,x]"), Some(Type::array(Type::ANY)));
        assert_eq!(infer_literal("[1,2,]"), Some(Type::array(Type::INT)));
    }
}
