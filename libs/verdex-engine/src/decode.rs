//! Fixture Text Decoder
//!
//! **Core Responsibility:**
//! Turn raw fixture text (inputs and expected outputs alike) into a
//! [`DecodedValue`] using a layered grammar.
//!
//! **Layering:**
//! 1. Multiple non-empty lines decode independently and combine into a Seq.
//! 2. Strict JSON.
//! 3. Extended literals: case-insensitive `true`/`false`/`null`/`none`,
//!    signed `inf`/`infinity`, single-quoted strings, parenthesized tuples,
//!    and implicit top-level comma tuples.
//! 4. The trimmed text itself as a string leaf.
//!
//! Fixture corpora mix strict JSON for structured data, bare literal syntax
//! for tuples, and free-form scalars; no single grammar covers all three.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use verdex_common::value::DecodedValue;

/// Leniency policy for the final string-leaf fallback layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeStrictness {
    /// Undecodable text degrades to a string leaf. Decoding never fails.
    #[default]
    Lenient,
    /// Undecodable text is an error instead of a silent string leaf.
    Strict,
}

/// Decode raw fixture text leniently. Total: always produces a value.
pub fn decode(text: &str) -> DecodedValue {
    let lines = non_empty_lines(text);
    match lines.len() {
        0 => DecodedValue::Str(String::new()),
        1 => decode_piece(lines[0]),
        _ => DecodedValue::Seq(lines.into_iter().map(decode_piece).collect()),
    }
}

/// Decode raw fixture text under the given strictness policy.
pub fn decode_with(text: &str, strictness: DecodeStrictness) -> Result<DecodedValue> {
    match strictness {
        DecodeStrictness::Lenient => Ok(decode(text)),
        DecodeStrictness::Strict => {
            let lines = non_empty_lines(text);
            match lines.len() {
                0 => Ok(DecodedValue::Str(String::new())),
                1 => structured(lines[0])
                    .ok_or_else(|| undecodable(lines[0])),
                _ => lines
                    .into_iter()
                    .map(|line| structured(line).ok_or_else(|| undecodable(line)))
                    .collect::<Result<Vec<_>>>()
                    .map(DecodedValue::Seq),
            }
        }
    }
}

fn undecodable(piece: &str) -> anyhow::Error {
    anyhow::anyhow!("cannot decode {:?} as a structured value", piece)
}

fn non_empty_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

fn decode_piece(piece: &str) -> DecodedValue {
    structured(piece).unwrap_or_else(|| DecodedValue::Str(piece.to_string()))
}

fn structured(piece: &str) -> Option<DecodedValue> {
    DecodedValue::from_json(piece)
        .ok()
        .or_else(|| parse_extended(piece))
}

/// Extended literal layer. The whole input must be consumed; any leftover
/// text means the piece is not a literal and the caller falls through.
fn parse_extended(piece: &str) -> Option<DecodedValue> {
    let trimmed = piece.trim();
    let mut parser = LiteralParser::new(trimmed);
    let first = parser.parse_value()?;
    parser.skip_ws();
    if parser.done() {
        return Some(first);
    }
    // A top-level comma outside bracket syntax means an implicit tuple.
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return None;
    }
    let mut items = vec![first];
    while parser.eat(',') {
        parser.skip_ws();
        if parser.done() {
            break;
        }
        items.push(parser.parse_value()?);
        parser.skip_ws();
    }
    if !parser.done() {
        return None;
    }
    Some(DecodedValue::Seq(items))
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Option<DecodedValue> {
        self.skip_ws();
        match self.peek()? {
            '[' => self.parse_sequence('[', ']'),
            '(' => self.parse_sequence('(', ')'),
            '{' => self.parse_mapping(),
            '"' | '\'' => self.parse_string().map(DecodedValue::Str),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.parse_number(),
            c if c.is_alphabetic() || c == '_' => self.parse_word(),
            _ => None,
        }
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Option<DecodedValue> {
        if !self.eat(open) {
            return None;
        }
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                break;
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                break;
            }
            return None;
        }
        Some(DecodedValue::Seq(items))
    }

    fn parse_mapping(&mut self) -> Option<DecodedValue> {
        if !self.eat('{') {
            return None;
        }
        let mut entries = BTreeMap::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            let key = match self.peek()? {
                '"' | '\'' => self.parse_string()?,
                _ => return None,
            };
            self.skip_ws();
            if !self.eat(':') {
                return None;
            }
            let value = self.parse_value()?;
            entries.insert(key, value);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return None;
        }
        Some(DecodedValue::Map(entries))
    }

    fn parse_string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            match self.bump()? {
                c if c == quote => return Some(out),
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    'u' => {
                        let mut code = 0u32;
                        for _ in 0..4 {
                            code = code * 16 + self.bump()?.to_digit(16)?;
                        }
                        out.push(char::from_u32(code)?);
                    }
                    other => out.push(other),
                },
                other => out.push(other),
            }
        }
    }

    fn parse_number(&mut self) -> Option<DecodedValue> {
        let start = self.pos;
        let mut is_float = false;
        if matches!(self.peek(), Some('+') | Some('-')) {
            self.pos += 1;
        }
        // Signed infinity reaches here instead of parse_word.
        if matches!(self.peek(), Some(c) if c.is_alphabetic()) {
            let sign = if self.chars[start] == '-' { -1.0 } else { 1.0 };
            return match self.parse_word()? {
                DecodedValue::Float(f) if f.is_infinite() => {
                    Some(DecodedValue::Float(sign * f))
                }
                _ => None,
            };
        }
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => self.pos += 1,
                '.' => {
                    is_float = true;
                    self.pos += 1;
                }
                'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('+') | Some('-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        if is_float {
            literal.parse::<f64>().ok().map(DecodedValue::Float)
        } else {
            literal.parse::<i64>().ok().map(DecodedValue::Int)
        }
    }

    fn parse_word(&mut self) -> Option<DecodedValue> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.to_lowercase().as_str() {
            "true" => Some(DecodedValue::Bool(true)),
            "false" => Some(DecodedValue::Bool(false)),
            "null" | "none" => Some(DecodedValue::Null),
            "inf" | "infinity" => Some(DecodedValue::Float(f64::INFINITY)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json_layer() {
        assert_eq!(
            decode("[1, 2, 3]"),
            DecodedValue::Seq(vec![
                DecodedValue::Int(1),
                DecodedValue::Int(2),
                DecodedValue::Int(3),
            ])
        );
        assert_eq!(decode("\"hello\""), DecodedValue::Str("hello".to_string()));
        assert_eq!(decode("2.5"), DecodedValue::Float(2.5));
    }

    #[test]
    fn test_case_insensitive_constants() {
        assert_eq!(decode("True"), DecodedValue::Bool(true));
        assert_eq!(decode("FALSE"), DecodedValue::Bool(false));
        assert_eq!(decode("None"), DecodedValue::Null);
        assert_eq!(decode("NULL"), DecodedValue::Null);
    }

    #[test]
    fn test_infinity() {
        assert_eq!(decode("inf"), DecodedValue::Float(f64::INFINITY));
        assert_eq!(decode("-Infinity"), DecodedValue::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn test_implicit_tuple() {
        assert_eq!(
            decode("3, 4"),
            DecodedValue::Seq(vec![DecodedValue::Int(3), DecodedValue::Int(4)])
        );
        assert_eq!(
            decode("1, 'a', true"),
            DecodedValue::Seq(vec![
                DecodedValue::Int(1),
                DecodedValue::Str("a".to_string()),
                DecodedValue::Bool(true),
            ])
        );
    }

    #[test]
    fn test_parenthesized_tuple() {
        assert_eq!(
            decode("(1, 2)"),
            DecodedValue::Seq(vec![DecodedValue::Int(1), DecodedValue::Int(2)])
        );
    }

    #[test]
    fn test_tuple_and_list_decode_alike() {
        assert_eq!(decode("(1, 2, 3)"), decode("[1, 2, 3]"));
    }

    #[test]
    fn test_bracketed_text_never_becomes_implicit_tuple() {
        // Leftover after a complete array is not literal syntax; the piece
        // degrades to a string leaf instead.
        assert_eq!(
            decode("[1, 2], [3]"),
            DecodedValue::Str("[1, 2], [3]".to_string())
        );
    }

    #[test]
    fn test_single_quoted_strings() {
        assert_eq!(decode("'abc'"), DecodedValue::Str("abc".to_string()));
        assert_eq!(
            decode("['a', 'b']"),
            DecodedValue::Seq(vec![
                DecodedValue::Str("a".to_string()),
                DecodedValue::Str("b".to_string()),
            ])
        );
    }

    #[test]
    fn test_mapping_with_single_quotes() {
        let mut expected = BTreeMap::new();
        expected.insert("k".to_string(), DecodedValue::Int(1));
        assert_eq!(decode("{'k': 1}"), DecodedValue::Map(expected));
    }

    #[test]
    fn test_multi_line_combines_into_sequence() {
        assert_eq!(
            decode("1\n2\n3"),
            DecodedValue::Seq(vec![
                DecodedValue::Int(1),
                DecodedValue::Int(2),
                DecodedValue::Int(3),
            ])
        );
    }

    #[test]
    fn test_blank_lines_ignored() {
        assert_eq!(decode("\n\n  42  \n\n"), DecodedValue::Int(42));
    }

    #[test]
    fn test_empty_text_is_empty_string() {
        assert_eq!(decode(""), DecodedValue::Str(String::new()));
        assert_eq!(decode("   \n  "), DecodedValue::Str(String::new()));
    }

    #[test]
    fn test_free_form_falls_back_to_string() {
        assert_eq!(
            decode("hello world"),
            DecodedValue::Str("hello world".to_string())
        );
    }

    #[test]
    fn test_trailing_comma_tuple() {
        assert_eq!(decode("1,"), DecodedValue::Seq(vec![DecodedValue::Int(1)]));
    }

    #[test]
    fn test_nested_literals() {
        assert_eq!(
            decode("([1, 2], 'x')"),
            DecodedValue::Seq(vec![
                DecodedValue::Seq(vec![DecodedValue::Int(1), DecodedValue::Int(2)]),
                DecodedValue::Str("x".to_string()),
            ])
        );
    }

    #[test]
    fn test_strict_mode_rejects_fallback() {
        assert!(decode_with("hello world", DecodeStrictness::Strict).is_err());
        assert!(decode_with("[1, 2]", DecodeStrictness::Strict).is_ok());
    }

    #[test]
    fn test_strict_mode_matches_lenient_for_structured_text() {
        let text = "3, 4";
        assert_eq!(
            decode_with(text, DecodeStrictness::Strict).unwrap(),
            decode(text)
        );
    }
}
