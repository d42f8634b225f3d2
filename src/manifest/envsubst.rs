//! Environment variable substitution in fragment values.
//!
//! Supports `$VAR`, `${VAR}` and `${VAR:-default}`. `$$` yields a literal
//! `$`. Unset variables expand to the empty string; a `$` not followed by a
//! name is kept as-is.

use serde_yaml::Value;

/// Expand variables in `input` using `lookup`.
pub fn expand<F>(input: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        match chars.peek().map(|&(_, c)| c) {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                let rest = &input[idx + 2..];
                match rest.find('}') {
                    Some(end) => {
                        let body = &rest[..end];
                        out.push_str(&expand_braced(body, lookup));
                        // skip "{", body and "}"
                        let consumed = body.chars().count() + 2;
                        for _ in 0..consumed {
                            chars.next();
                        }
                    }
                    None => out.push('$'),
                }
            }
            Some(c) if is_name_start(c) => {
                let start = idx + 1;
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if is_name_char(c) {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&lookup(&input[start..end]).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }

    out
}

fn expand_braced<F>(body: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match body.split_once(":-") {
        Some((name, default)) => match lookup(name) {
            Some(value) if !value.is_empty() => value,
            _ => expand(default, lookup),
        },
        None => lookup(body).unwrap_or_default(),
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expand variables in every string scalar of a parsed YAML tree.
///
/// Mapping keys are left untouched.
pub fn expand_value<F>(value: &mut Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => {
            if s.contains('$') {
                *s = expand(s, lookup);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                expand_value(item, lookup);
            }
        }
        Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                expand_value(item, lookup);
            }
        }
        Value::Tagged(tagged) => expand_value(&mut tagged.value, lookup),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Lookup backed by the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
