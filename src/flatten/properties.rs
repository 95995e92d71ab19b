//! `.properties` parsing
//!
//! Supports `key=value`, `key: value` and `key value` entries, `#` / `!` comments,
//! trailing-backslash line continuation and the usual escapes (`\t`, `\n`, `\r`,
//! `\f`, `\uXXXX`, escaped separators). Every value is a string.

use crate::domain::FlatMap;
use serde_json::Value;

/// Parse properties text into a flat map. Later duplicates overwrite earlier ones.
pub fn parse_properties(text: &str) -> Result<FlatMap, String> {
    let mut out = FlatMap::new();
    let mut logical = String::new();
    let mut continuing = false;
    let mut start_line = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_start_matches(is_blank);

        if !continuing {
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            start_line = idx + 1;
        }

        if ends_with_continuation(line) {
            logical.push_str(&line[..line.len() - 1]);
            continuing = true;
            continue;
        }

        logical.push_str(line);
        continuing = false;

        let (key, value) = split_entry(&logical).map_err(|e| format!("line {start_line}: {e}"))?;
        out.insert(key, Value::String(value));
        logical.clear();
    }

    // A continuation on the last line still terminates the entry
    if !logical.is_empty() {
        let (key, value) = split_entry(&logical).map_err(|e| format!("line {start_line}: {e}"))?;
        out.insert(key, Value::String(value));
    }

    Ok(out)
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line into unescaped key and value.
fn split_entry(logical: &str) -> Result<(String, String), String> {
    let chars: Vec<char> = logical.chars().collect();
    let len = chars.len();

    let mut key_end = len;
    let mut has_separator = false;
    let mut i = 0;
    while i < len {
        let c = chars[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if c == '=' || c == ':' {
            key_end = i;
            has_separator = true;
            break;
        }
        if is_blank(c) {
            key_end = i;
            break;
        }
        i += 1;
    }
    let key_end = key_end.min(len);

    let mut value_start = if has_separator { key_end + 1 } else { key_end };
    while value_start < len && is_blank(chars[value_start]) {
        value_start += 1;
    }
    // `key = value`: whitespace ended the key, the separator follows it
    if !has_separator && value_start < len && (chars[value_start] == '=' || chars[value_start] == ':')
    {
        value_start += 1;
        while value_start < len && is_blank(chars[value_start]) {
            value_start += 1;
        }
    }

    let key: String = chars[..key_end].iter().collect();
    let value: String = chars[value_start.min(len)..].iter().collect();
    Ok((unescape(&key)?, unescape(&value)?))
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return Err("malformed \\uxxxx encoding".to_string());
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| "malformed \\uxxxx encoding".to_string())?;
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_separators() {
        let map = parse_properties("a=1\nb: 2\nc 3\nd = 4\ne\n").unwrap();
        assert_eq!(map.get("a"), Some(&json!("1")));
        assert_eq!(map.get("b"), Some(&json!("2")));
        assert_eq!(map.get("c"), Some(&json!("3")));
        assert_eq!(map.get("d"), Some(&json!("4")));
        assert_eq!(map.get("e"), Some(&json!("")));
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let map = parse_properties("# comment\n! bang\n\n   \nkey=value\n").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("key"), Some(&json!("value")));
    }

    #[test]
    fn test_insertion_order_and_duplicates() {
        let map = parse_properties("z=1\na=2\nz=3\n").unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(map.get("z"), Some(&json!("3")));
    }

    #[test]
    fn test_line_continuation() {
        let map = parse_properties("list=a,\\\n    b,\\\n    c\nnext=1\n").unwrap();
        assert_eq!(map.get("list"), Some(&json!("a,b,c")));
        assert_eq!(map.get("next"), Some(&json!("1")));
    }

    #[test]
    fn test_escapes() {
        let map = parse_properties("path=C:\\\\temp\nkey\\=with\\:sep=v\ntab=a\\tb\nuni=\\u0041\n")
            .unwrap();
        assert_eq!(map.get("path"), Some(&json!("C:\\temp")));
        assert_eq!(map.get("key=with:sep"), Some(&json!("v")));
        assert_eq!(map.get("tab"), Some(&json!("a\tb")));
        assert_eq!(map.get("uni"), Some(&json!("A")));
    }

    #[test]
    fn test_placeholders_survive_parsing() {
        let map = parse_properties("db.password=${vault:db/password}\nurl=http://${host}:8080\n")
            .unwrap();
        assert_eq!(map.get("db.password"), Some(&json!("${vault:db/password}")));
        assert_eq!(map.get("url"), Some(&json!("http://${host}:8080")));
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let err = parse_properties("a=1\nbad=\\u12G4\n").unwrap_err();
        assert!(err.contains("line 2"), "{err}");
    }
}
