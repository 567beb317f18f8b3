//! Declaration scanner
//!
//! Extracts `(name, default, comment)` records from the source text of a
//! configuration-defaults mapping. The scanner is a tolerant recognizer,
//! not a language parser: it accepts heterogeneous, human-written
//! declaration syntax and silently skips anything it cannot match.
//!
//! Recognized per entry:
//! - a key token, either `:key =>` (old style) or `key:` (new style)
//! - a value token: a quoted string (quotes stripped) or a bareword
//!   (identifier, `@ivar`, `@@cvar`, `Mod::CONST`, `Obj.call`)
//! - an optional trailing `#` comment, folded together with any pure
//!   comment lines that follow without an intervening blank line

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One extracted configuration variable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Declared key, without quote/colon/sigil decoration. Never empty.
    pub name: String,
    /// Default value as written: quoted-string content, or the verbatim
    /// source text of a bareword expression.
    pub default: String,
    /// Trailing documentation, trimmed, with comment markers removed.
    pub comment: Option<String>,
}

/// Matches a single `key => value` / `key: value` declaration.
///
/// Groups: 1 = old-style key, 2 = new-style key, 3 = single-quoted value,
/// 4 = double-quoted value, 5 = bareword value. Quoted alternatives come
/// first so a value starting with a quote is never read as a bareword.
static DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        (?: : (\w+) \s* =>      # old-style hash key - ":key => value"
          | (\w+) :             # new-style hash key - "key: value"
        )
        \s*
        (?: ' ([^'\n]*) '       # single-quoted string
          | " ([^"\n]*) "       # double-quoted string
          | ( [\w@:.]+ )        # bareword
        )
        (?: \s* , )?            # optional separator
        "#,
    )
    .expect("declaration pattern is valid")
});

/// Matches a line whose code part ends in a key token still waiting for
/// its value (`:key =>` or `key:` at end of line).
static DANGLING_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?::\w+\s*=>|\w+:)\s*$").expect("dangling key pattern is valid"));

/// Scans declaration source text and returns the entries it recognizes,
/// in source order.
///
/// Total over all inputs: unrecognizable text yields an empty vec, never
/// an error. Pure and deterministic; every call allocates a fresh vec.
/// Only the first brace-delimited block is scanned; text without braces
/// is scanned whole.
pub fn extract(source: &str) -> Vec<Entry> {
    let region = first_block(source);
    let lines: Vec<&str> = region.lines().collect();

    let mut entries = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let trimmed = lines[i].trim();

        // Comment recognition comes before key matching: a pure comment
        // line is never scanned for declarations, even if its text looks
        // like one. Unclaimed comment lines (after a blank line) and
        // blank lines carry nothing.
        if trimmed.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }

        let (first_code, first_comment) = split_comment(lines[i]);
        let mut code = first_code.to_string();
        let mut inline_comment = first_comment;
        let mut end = i;

        // A key may sit at the end of a line with its value on the next:
        // whitespace between key and value spans newlines. Fold code
        // lines onto the dangling key until the value arrives. A comment
        // between key and value blocks the fold, as does a pure comment
        // line; such a key never gets a value and is skipped.
        while inline_comment.is_none() && DANGLING_KEY_RE.is_match(&code) && end + 1 < lines.len()
        {
            if lines[end + 1].trim().starts_with('#') {
                break;
            }
            let (next_code, next_comment) = split_comment(lines[end + 1]);
            code.push(' ');
            code.push_str(next_code);
            inline_comment = next_comment;
            end += 1;
        }

        let before = entries.len();
        let mut last_end = 0;
        for caps in DECL_RE.captures_iter(&code) {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let default = caps
                .get(3)
                .or_else(|| caps.get(4))
                .or_else(|| caps.get(5))
                .map(|m| m.as_str())
                .unwrap_or_default();

            entries.push(Entry {
                name: name.to_string(),
                default: default.to_string(),
                comment: None,
            });
            last_end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        }

        if entries.len() == before {
            // Nothing recognizable here; skip what was consumed.
            i = end + 1;
            continue;
        }

        let mut comment_parts: Vec<&str> = Vec::new();

        // A trailing comment counts only when nothing but whitespace sits
        // between the value (and optional separator) and the `#`.
        if let Some(text) = inline_comment {
            if code[last_end..].trim().is_empty() && !text.trim().is_empty() {
                comment_parts.push(text.trim());
            }
        }

        // Bounded lookahead for continuation lines: fold pure comment
        // lines that directly follow, stopping at the first blank line,
        // next declaration, or end of the block. The terminator line is
        // not consumed.
        let mut j = end + 1;
        while j < lines.len() {
            let next = lines[j].trim();
            if !next.starts_with('#') {
                break;
            }
            let text = next.trim_start_matches('#').trim();
            if !text.is_empty() {
                comment_parts.push(text);
            }
            j += 1;
        }

        if !comment_parts.is_empty() {
            if let Some(last) = entries.last_mut() {
                last.comment = Some(comment_parts.join(" "));
            }
        }

        i = j;
    }

    entries
}

/// Returns the interior of the first brace-delimited block, or the whole
/// text when no opening brace exists. An unclosed block extends to the
/// end of input. Braces inside quoted strings or `#` comments do not
/// count; multi-block merging is deliberately unsupported.
fn first_block(text: &str) -> &str {
    let mut open: Option<usize> = None;
    let mut depth = 0u32;
    let mut quote: Option<char> = None;
    let mut in_comment = false;

    for (idx, ch) in text.char_indices() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '#' => in_comment = true,
            '{' => {
                depth += 1;
                if open.is_none() {
                    open = Some(idx + 1);
                }
            }
            '}' if open.is_some() => {
                depth -= 1;
                if depth == 0 {
                    return &text[open.unwrap_or(0)..idx];
                }
            }
            _ => {}
        }
    }

    match open {
        Some(start) => &text[start..],
        None => text,
    }
}

/// Splits a line into its code part and the text after the first `#`
/// that is not inside a quoted string. Quote pairing is same-character:
/// the first matching quote closes the string.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;

    for (idx, ch) in line.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '#' => return (&line[..idx], Some(&line[idx + 1..])),
                _ => {}
            },
        }
    }

    (line, None)
}
