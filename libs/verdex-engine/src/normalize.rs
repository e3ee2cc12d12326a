//! Candidate Text Normalizer
//!
//! **Core Responsibility:**
//! Turn raw candidate text into canonical source text before parsing.
//!
//! **Why This Exists:**
//! Generated candidates arrive wrapped in markdown fences and sprinkled with
//! typographic characters (smart quotes, exotic spaces, zero-width marks)
//! that are invisible to a reader but fatal to a parser. Cleaning is layered:
//! NFKC first, then fence extraction, then an explicit character table for
//! everything NFKC leaves alone.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_regex() -> &'static Regex {
    FENCE_RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+\-]*\s*(.*?)\s*```").expect("static fence pattern")
    })
}

/// Clean raw candidate text into canonical source text.
///
/// Steps, in order: NFKC normalization; first fenced code block extraction;
/// typographic character mapping; dash-punctuation folding; control and
/// format character stripping (newline, tab, carriage return survive); CRLF
/// normalization; outer whitespace trim. Idempotent.
pub fn clean_source(raw: &str) -> String {
    let mut text: String = raw.nfkc().collect();

    if let Some(captures) = fence_regex().captures(&text) {
        text = captures[1].to_string();
    }

    let mut cleaned = String::with_capacity(text.len());
    for ch in text.chars() {
        if let Some(mapped) = map_typographic(ch) {
            cleaned.push_str(mapped);
        } else if is_dash_punctuation(ch) {
            cleaned.push('-');
        } else if is_stripped_control(ch) {
            continue;
        } else {
            cleaned.push(ch);
        }
    }

    let cleaned = cleaned.replace("\r\n", "\n");
    cleaned.trim().to_string()
}

/// ASCII replacements for typographic characters that survive NFKC.
fn map_typographic(ch: char) -> Option<&'static str> {
    Some(match ch {
        '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}'
        | '\u{3000}' => " ",
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => "",
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => "\"",
        '\u{2026}' => "...",
        '\u{00D7}' => "*",
        '\u{00F7}' => "/",
        '\u{2264}' => "<=",
        '\u{2265}' => ">=",
        '\u{2260}' => "!=",
        '\u{2192}' => "->",
        '\u{2022}' | '\u{00B7}' | '\u{2023}' | '\u{25E6}' | '\u{25AA}' | '\u{25CF}' => "-",
        '\u{2212}' => "-",
        '\u{2028}' | '\u{2029}' => "\n",
        _ => return None,
    })
}

/// Unicode Pd (dash punctuation) characters not already in the table.
fn is_dash_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '\u{058A}'
            | '\u{05BE}'
            | '\u{1400}'
            | '\u{1806}'
            | '\u{2010}'..='\u{2015}'
            | '\u{2E17}'
            | '\u{2E1A}'
            | '\u{2E3A}'
            | '\u{2E3B}'
            | '\u{2E40}'
            | '\u{2E5D}'
            | '\u{301C}'
            | '\u{3030}'
            | '\u{30A0}'
            | '\u{FE31}'
            | '\u{FE32}'
            | '\u{FE58}'
            | '\u{FE63}'
            | '\u{FF0D}'
            | '\u{10EAD}'
    )
}

/// Cc plus the common Cf (format) characters, keeping `\n`, `\t`, `\r`.
fn is_stripped_control(ch: char) -> bool {
    if matches!(ch, '\n' | '\t' | '\r') {
        return false;
    }
    if ch.is_control() {
        return true;
    }
    matches!(
        ch,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200E}'
            | '\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2061}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_extraction() {
        let raw = "Here is the solution:\n```js\nfunction solve(x) { return x; }\n```\nHope it helps!";
        assert_eq!(clean_source(raw), "function solve(x) { return x; }");
    }

    #[test]
    fn test_first_fenced_block_wins() {
        let raw = "```\nfirst();\n```\ntext\n```\nsecond();\n```";
        assert_eq!(clean_source(raw), "first();");
    }

    #[test]
    fn test_smart_quotes_and_dashes() {
        let raw = "let s = \u{2018}a\u{2019}; let t = \u{201C}b\u{201D}; let n = 5 \u{2212} 3;";
        assert_eq!(clean_source(raw), "let s = 'a'; let t = \"b\"; let n = 5 - 3;");
    }

    #[test]
    fn test_exotic_spaces_and_zero_width() {
        let raw = "let\u{00A0}x\u{200B} =\u{2009}1;\u{FEFF}";
        assert_eq!(clean_source(raw), "let x = 1;");
    }

    #[test]
    fn test_em_dash_folds_to_hyphen() {
        assert_eq!(clean_source("a \u{2014} b \u{2013} c"), "a - b - c");
    }

    #[test]
    fn test_control_characters_stripped() {
        let raw = "let x = 1;\u{0007}\nlet y = 2;\u{00AD}";
        assert_eq!(clean_source(raw), "let x = 1;\nlet y = 2;");
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(clean_source("a();\r\nb();\r\n"), "a();\nb();");
    }

    #[test]
    fn test_line_separator_becomes_newline() {
        assert_eq!(clean_source("a();\u{2028}b();"), "a();\nb();");
    }

    #[test]
    fn test_idempotent() {
        let raw = "```python\ndef f():\u{00A0}\u{2018}x\u{2019}\n```";
        let once = clean_source(raw);
        let twice = clean_source(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_plain_text_untouched() {
        let src = "function add(a, b) {\n    return a + b;\n}";
        assert_eq!(clean_source(src), src);
    }
}
