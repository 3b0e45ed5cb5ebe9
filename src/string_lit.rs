// String literal processing: quote stripping, interpolation placeholder
// extraction, and backslash-escape resolution.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{RunError, RunResult};

/// One `{...}` interpolation placeholder found inside a double-quoted
/// literal: the full matched expression text, the base identifier, and
/// zero or more bracketed index expressions (`$y[$i][$j]` -> base `y`,
/// indices `["$i", "$j"]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub full: String,
    pub base: String,
    pub indices: Vec<String>,
}

lazy_static! {
    // Matches either `{$name[...]...}` or a bare `$name[...]...` run.
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\{\$([A-Za-z_][A-Za-z0-9_]*)((?:\[[^\]]*\])*)\}|\$([A-Za-z_][A-Za-z0-9_]*)((?:\[[^\]]*\])*)")
            .unwrap();
    static ref INDEX_RE: Regex = Regex::new(r"\[([^\]]*)\]").unwrap();
}

/// Strips the surrounding quotes from a literal and, for double-quoted
/// literals, scans for interpolation placeholders. Single-quoted literals
/// never interpolate: their body is returned unescaped of quote marks but
/// with `unescape` NOT applied to interpolation (still subject to
/// `unescape` for backslash sequences).
pub fn unquote(literal: &str) -> RunResult<(String, Vec<Placeholder>)> {
    let bytes = literal.as_bytes();
    if bytes.len() < 2 {
        return Err(RunError::QuoteMismatch);
    }
    let quote = bytes[0];
    if quote != b'\'' && quote != b'"' {
        return Err(RunError::QuoteMismatch);
    }
    if bytes[bytes.len() - 1] != quote {
        return Err(RunError::QuoteMismatch);
    }
    let body = &literal[1..literal.len() - 1];

    if quote == b'\'' {
        return Ok((body.to_string(), Vec::new()));
    }

    let mut placeholders = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(body) {
        let full = caps.get(0).unwrap().as_str().to_string();
        let (base, bracket_run) = if let Some(b) = caps.get(1) {
            (b.as_str().to_string(), caps.get(2).map(|m| m.as_str()).unwrap_or(""))
        } else {
            (
                caps.get(3).unwrap().as_str().to_string(),
                caps.get(4).map(|m| m.as_str()).unwrap_or(""),
            )
        };
        let indices = INDEX_RE
            .captures_iter(bracket_run)
            .map(|c| c.get(1).unwrap().as_str().to_string())
            .collect();
        placeholders.push(Placeholder { full, base, indices });
    }
    Ok((body.to_string(), placeholders))
}

/// Resolves backslash escapes. A trailing backslash at end-of-input is an
/// error. An unrecognized `\x` escape yields the literal character `x`
/// (not an error). A backslash immediately followed by a literal newline
/// is erased (both characters vanish).
pub fn unescape(s: &str) -> RunResult<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }
        if i + 1 >= chars.len() {
            return Err(RunError::TrailingBackslash);
        }
        let next = chars[i + 1];
        match next {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'a' => out.push('\u{7}'),
            '\n' => {}
            other => out.push(other),
        }
        i += 2;
    }
    Ok(out)
}
