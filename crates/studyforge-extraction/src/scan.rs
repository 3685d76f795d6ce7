//! Linear character scanners used by the repair steps.
//!
//! All scanners track whether the cursor is inside a double-quoted string so
//! that brackets, commas and quotes inside values are left alone.

/// Locate the first balanced `[...]` span in `text`.
///
/// Spans whose first significant character is `{` (an array of objects) are
/// preferred over other balanced spans such as `[1]` in surrounding prose.
/// Returns byte offsets `(start, end)` with `end` exclusive.
#[must_use]
pub fn find_balanced_array(text: &str) -> Option<(usize, usize)> {
    let mut first_any = None;
    let mut search_from = 0;

    while let Some(rel) = text[search_from..].find('[') {
        let start = search_from + rel;
        match balanced_end(text, start) {
            Some(end) => {
                let inner = text[start + 1..end - 1].trim_start();
                if inner.starts_with('{') {
                    return Some((start, end));
                }
                first_any.get_or_insert((start, end));
                search_from = start + 1;
            }
            // An unclosed bracket in prose must not hide a later array.
            None => search_from = start + 1,
        }
    }
    first_any
}

/// Byte offset just past the bracket that closes the one at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (c == ']').then_some(start + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_curly_double(c: char) -> bool {
    matches!(c, '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}')
}

fn is_curly_single(c: char) -> bool {
    matches!(c, '\u{2018}' | '\u{2019}' | '\u{201A}')
}

/// Where [`normalize_smart_quotes`] is relative to string literals.
#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Outside,
    /// Inside a string opened by `"`.
    Double,
    /// Inside a string opened by a typographic double quote.
    CurlyDouble,
    /// Inside a string opened by `'` or a typographic single quote.
    Single,
}

/// Replace typographic quotes that delimit strings with ASCII quotes.
///
/// Quotes inside string values are kept as written. A string opened by a
/// typographic quote is closed by the next matching quote that is followed by
/// a JSON delimiter; ASCII double quotes inside it are escaped.
#[must_use]
pub fn normalize_smart_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = QuoteState::Outside;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if state != QuoteState::Outside && c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        match state {
            QuoteState::Outside => match c {
                '"' => {
                    state = QuoteState::Double;
                    out.push(c);
                }
                c if is_curly_double(c) => {
                    state = QuoteState::CurlyDouble;
                    out.push('"');
                }
                c if c == '\'' || is_curly_single(c) => {
                    state = QuoteState::Single;
                    out.push('\'');
                }
                c => out.push(c),
            },
            QuoteState::Double => {
                if c == '"' {
                    state = QuoteState::Outside;
                }
                out.push(c);
            }
            QuoteState::CurlyDouble => {
                if (c == '"' || is_curly_double(c)) && closes_value(&chars, i + 1) {
                    state = QuoteState::Outside;
                    out.push('"');
                } else if c == '"' {
                    out.push_str("\\\"");
                } else {
                    out.push(c);
                }
            }
            QuoteState::Single => {
                if (c == '\'' || is_curly_single(c)) && closes_value(&chars, i + 1) {
                    state = QuoteState::Outside;
                    out.push('\'');
                } else {
                    out.push(c);
                }
            }
        }
        i += 1;
    }
    out
}

/// Rewrite single-quoted strings outside double-quoted strings as JSON strings.
///
/// A quote only closes the string when the next significant character is a
/// JSON delimiter, so apostrophes inside values survive.
#[must_use]
pub fn single_quotes_to_double(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut in_double = false;

    while i < chars.len() {
        let c = chars[i];
        if in_double {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_double = false;
            }
            i += 1;
            continue;
        }
        match c {
            '"' => {
                in_double = true;
                out.push(c);
                i += 1;
            }
            '\'' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let s = chars[i];
                    if s == '\\' && i + 1 < chars.len() {
                        if chars[i + 1] == '\'' {
                            out.push('\'');
                        } else {
                            out.push('\\');
                            out.push(chars[i + 1]);
                        }
                        i += 2;
                        continue;
                    }
                    if s == '\'' && closes_value(&chars, i + 1) {
                        i += 1;
                        break;
                    }
                    if s == '"' {
                        out.push('\\');
                    }
                    out.push(s);
                    i += 1;
                }
                out.push('"');
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn closes_value(chars: &[char], from: usize) -> bool {
    chars[from..]
        .iter()
        .find(|c| !c.is_whitespace())
        .is_none_or(|c| matches!(c, ',' | '}' | ']' | ':'))
}

/// Quote bare object keys: `{term: "x"}` becomes `{"term": "x"}`.
#[must_use]
pub fn quote_unquoted_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut i = 0;
    let mut in_string = false;
    // True right after `{` or `,` (ignoring whitespace), where a key may start.
    let mut key_position = false;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if key_position && is_ident_start(c) {
            let start = i;
            let mut end = i;
            while end < chars.len() && is_ident_char(chars[end]) {
                end += 1;
            }
            let mut look = end;
            while look < chars.len() && chars[look].is_whitespace() {
                look += 1;
            }
            if look < chars.len() && chars[look] == ':' {
                out.push('"');
                out.extend(&chars[start..end]);
                out.push('"');
                i = end;
                key_position = false;
                continue;
            }
        }

        match c {
            '"' => {
                in_string = true;
                key_position = false;
            }
            '{' | ',' => key_position = true,
            c if c.is_whitespace() => {}
            _ => key_position = false,
        }
        out.push(c);
        i += 1;
    }
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '-'
}

/// Drop commas that directly precede `}` or `]`.
#[must_use]
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                i += 1;
                continue;
            }
        }
        if c == '"' {
            in_string = true;
        }
        out.push(c);
        i += 1;
    }
    out
}
