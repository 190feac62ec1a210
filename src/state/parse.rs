use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Deepest object/array nesting accepted before giving up.
const MAX_DEPTH: usize = 256;

/// Errors raised while reading an object literal.
///
/// Offsets count characters from the start of the expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("invalid number literal at offset {offset}")]
    InvalidNumber { offset: usize },
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("unterminated comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },
    #[error("unterminated regular expression starting at offset {offset}")]
    UnterminatedRegex { offset: usize },
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

/// Parse a JavaScript object-literal expression into a JSON value tree.
///
/// Accepts quoted and unquoted keys, single/double/backtick strings with JS
/// escapes, JS numeric forms, `true`/`false`/`null`, and trailing commas.
/// `undefined`, `NaN`, `Infinity`, functions and any other non-data
/// expression evaluate to `null` instead of failing the parse. Object key
/// order is preserved. Integers beyond `i64` become `u64` or `f64`.
///
/// Inside skipped code, a `/` opens a regular expression literal when it
/// follows an operator, an opening bracket or a keyword such as `return`;
/// otherwise it is division. Code that defeats this guess (for example a
/// regex directly after `)`) can still fail the parse.
///
/// # Errors
///
/// Returns a [`ParseError`] when the text is structurally broken (unbalanced
/// brackets, unterminated strings, garbage after the value).
pub fn parse_object_literal(src: &str) -> Result<Value, ParseError> {
    let mut parser = Parser::new(src);
    let value = parser.parse_value()?;
    parser.skip_trivia()?;
    match parser.peek() {
        None | Some(';') => Ok(value),
        Some(_) => Err(ParseError::TrailingInput { offset: parser.pos }),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn unexpected(&self) -> ParseError {
        self.peek().map_or(ParseError::UnexpectedEnd, |found| {
            ParseError::UnexpectedChar {
                found,
                offset: self.pos,
            }
        })
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Skip whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.pos += 1;
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.starts_with("*/") {
                            self.pos += 2;
                            break;
                        }
                        if self.bump().is_none() {
                            return Err(ParseError::UnterminatedComment { offset: start });
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            None => Err(ParseError::UnexpectedEnd),
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"' | '\'' | '`') => self.parse_string().map(Value::String),
            Some('-' | '+' | '0'..='9') => self.parse_number(),
            Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.parse_number()
            }
            Some(c) if is_ident_start(c) => self.parse_identifier_value(),
            Some(_) => {
                self.skip_expression()?;
                Ok(Value::Null)
            }
        }
    }

    fn parse_object(&mut self) -> Result<Value, ParseError> {
        self.enter()?;
        self.pos += 1;
        let mut map = Map::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Err(ParseError::UnexpectedEnd),
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            if self.starts_with("...") {
                self.skip_expression()?;
                continue;
            }

            let key = self.parse_key()?;
            self.skip_trivia()?;
            match self.peek() {
                Some(':') => {
                    self.pos += 1;
                    let value = self.parse_value()?;
                    map.insert(key, value);
                }
                // Method shorthand `name() {}`
                Some('(') => self.skip_expression()?,
                // Accessors `get name() {}` and `async name() {}`
                Some(c)
                    if is_ident_start(c) && matches!(key.as_str(), "get" | "set" | "async") =>
                {
                    self.skip_expression()?;
                }
                // Shorthand property `{ name }` refers to a binding we cannot see.
                Some(',' | '}') => {
                    map.insert(key, Value::Null);
                }
                _ => return Err(self.unexpected()),
            }

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                _ => return Err(self.unexpected()),
            }
        }

        self.leave();
        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        self.enter()?;
        self.pos += 1;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Err(ParseError::UnexpectedEnd),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            if self.starts_with("...") {
                self.skip_expression()?;
            } else {
                items.push(self.parse_value()?);
            }

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {}
                _ => return Err(self.unexpected()),
            }
        }

        self.leave();
        Ok(Value::Array(items))
    }

    fn parse_key(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some('"' | '\'' | '`') => self.parse_string(),
            Some(c) if is_ident_start(c) => Ok(self.read_identifier()),
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_'))
                {
                    self.pos += 1;
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
            // Computed key `[expr]`; keep the expression text as the key.
            Some('[') => {
                let start = self.pos + 1;
                self.skip_balanced()?;
                let inner: String = self.chars[start..self.pos - 1].iter().collect();
                Ok(inner.trim().to_string())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_identifier_value(&mut self) -> Result<Value, ParseError> {
        let ident = self.read_identifier();
        match ident.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" | "undefined" | "NaN" | "Infinity" => Ok(Value::Null),
            // Functions, constructor calls, references to other globals.
            _ => {
                self.skip_expression()?;
                Ok(Value::Null)
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(ParseError::UnexpectedEnd);
        };
        let mut out = String::new();

        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::UnterminatedString { offset: start });
            };
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }

            let Some(escaped) = self.bump() else {
                return Err(ParseError::UnterminatedString { offset: start });
            };
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'v' => out.push('\u{b}'),
                '0' => out.push('\0'),
                'x' => {
                    let code = self.read_hex(2)?;
                    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                'u' => {
                    let c = self.read_unicode_escape()?;
                    out.push(c);
                }
                // Line continuation.
                '\r' => {
                    if self.peek() == Some('\n') {
                        self.pos += 1;
                    }
                }
                '\n' | '\u{2028}' | '\u{2029}' => {}
                other => out.push(other),
            }
        }
    }

    fn read_hex(&mut self, len: usize) -> Result<u32, ParseError> {
        let start = self.pos;
        let mut code = 0u32;
        for _ in 0..len {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or(ParseError::InvalidNumber { offset: start })?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    /// Read the part of a `\u` escape after the `u`, pairing surrogates.
    fn read_unicode_escape(&mut self) -> Result<char, ParseError> {
        if self.peek() == Some('{') {
            let start = self.pos;
            self.pos += 1;
            let mut code = 0u32;
            loop {
                match self.bump() {
                    Some('}') => break,
                    Some(c) => {
                        let digit = c
                            .to_digit(16)
                            .ok_or(ParseError::InvalidNumber { offset: start })?;
                        code = code.saturating_mul(16).saturating_add(digit);
                    }
                    None => return Err(ParseError::UnexpectedEnd),
                }
            }
            return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
        }

        let high = self.read_hex(4)?;
        if (0xD800..0xDC00).contains(&high) && self.starts_with("\\u") {
            let save = self.pos;
            self.pos += 2;
            let low = self.read_hex(4)?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            self.pos = save;
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let mut negative = false;
        if let Some(sign @ ('-' | '+')) = self.peek() {
            negative = sign == '-';
            self.pos += 1;
        }

        if self.peek().is_some_and(is_ident_start) {
            return match self.read_identifier().as_str() {
                "Infinity" | "NaN" => Ok(Value::Null),
                _ => Err(ParseError::InvalidNumber { offset: start }),
            };
        }

        let radix = match (self.peek(), self.peek_at(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            self.pos += 2;
            let digits: String = self
                .read_while(|c| c.is_ascii_alphanumeric() || c == '_')
                .chars()
                .filter(|c| *c != '_')
                .collect();
            return radix_number(digits.trim_end_matches('n'), radix, negative)
                .ok_or(ParseError::InvalidNumber { offset: start });
        }

        let mut text = String::new();
        if negative {
            text.push('-');
        }
        text.push_str(&self.read_while(|c| c.is_ascii_digit() || c == '_'));
        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            text.push('.');
            text.push_str(&self.read_while(|c| c.is_ascii_digit() || c == '_'));
        }
        if let Some(e @ ('e' | 'E')) = self.peek() {
            is_float = true;
            self.pos += 1;
            text.push(e);
            if let Some(sign @ ('-' | '+')) = self.peek() {
                self.pos += 1;
                text.push(sign);
            }
            text.push_str(&self.read_while(|c| c.is_ascii_digit()));
        }
        // BigInt suffix
        if self.peek() == Some('n') {
            self.pos += 1;
        }

        let text: String = text.chars().filter(|c| *c != '_').collect();
        if !is_float {
            if let Ok(int) = text.parse::<i64>() {
                return Ok(Value::Number(Number::from(int)));
            }
        }
        let float: f64 = text
            .parse()
            .map_err(|_| ParseError::InvalidNumber { offset: start })?;
        Ok(Number::from_f64(float).map_or(Value::Null, Value::Number))
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Skip a bracketed group starting at the current opening bracket.
    fn skip_balanced(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Err(ParseError::UnexpectedEnd),
                Some('"' | '\'' | '`') => {
                    self.parse_string()?;
                }
                Some('/') if self.regex_allowed() => self.skip_regex()?,
                Some('(' | '[' | '{') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(')' | ']' | '}') => {
                    self.pos += 1;
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Skip a non-data expression up to the next `,`, `;`, `}` or `]` that
    /// is not nested inside brackets or strings.
    fn skip_expression(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None | Some(',' | ';' | '}' | ']') => return Ok(()),
                Some('(' | '[' | '{') => self.skip_balanced()?,
                Some(')') => return Err(self.unexpected()),
                Some('"' | '\'' | '`') => {
                    self.parse_string()?;
                }
                Some('/') if self.regex_allowed() => self.skip_regex()?,
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Whether a `/` at the current position starts a regex literal rather
    /// than a division, judged from the preceding token.
    fn regex_allowed(&self) -> bool {
        let mut end = self.pos;
        while end > 0 && self.chars[end - 1].is_whitespace() {
            end -= 1;
        }
        let Some(&prev) = end.checked_sub(1).and_then(|i| self.chars.get(i)) else {
            return true;
        };

        if is_ident_continue(prev) {
            let mut start = end;
            while start > 0 && is_ident_continue(self.chars[start - 1]) {
                start -= 1;
            }
            let word: String = self.chars[start..end].iter().collect();
            return REGEX_KEYWORDS.contains(&word.as_str());
        }
        !matches!(prev, ')' | ']' | '}' | '"' | '\'' | '`')
    }

    /// Skip a regex literal and its flags, starting at the opening `/`.
    fn skip_regex(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => {
                    return Err(ParseError::UnterminatedRegex { offset: start })
                }
                Some('\\') => self.pos += 2,
                Some('[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some('/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.read_while(is_ident_continue);
        Ok(())
    }
}

/// Keywords after which a `/` begins a regex literal.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// Value of a hex, octal or binary literal. Magnitudes beyond `u64` (or
/// beyond `i64` when negative) degrade to `f64` like a JS number.
fn radix_number(digits: &str, radix: u32, negative: bool) -> Option<Value> {
    if digits.is_empty() {
        return None;
    }
    if let Ok(magnitude) = u64::from_str_radix(digits, radix) {
        if !negative {
            return Some(Value::Number(Number::from(magnitude)));
        }
        if let Ok(magnitude) = i64::try_from(magnitude) {
            return Some(Value::Number(Number::from(-magnitude)));
        }
    }

    let mut float = 0.0_f64;
    for c in digits.chars() {
        float = float.mul_add(f64::from(radix), f64::from(c.to_digit(radix)?));
    }
    Number::from_f64(if negative { -float } else { float }).map(Value::Number)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = parse_object_literal(r#"{"a": [1, 2.5, "x"], "b": {"c": null, "d": true}}"#)
            .unwrap();
        assert_eq!(value, json!({"a": [1, 2.5, "x"], "b": {"c": null, "d": true}}));
    }

    #[test]
    fn test_unquoted_keys_and_single_quotes() {
        let value = parse_object_literal("{note: {title: 'it\\'s', $id: 7, _x: false,}}").unwrap();
        assert_eq!(value, json!({"note": {"title": "it's", "$id": 7, "_x": false}}));
    }

    #[test]
    fn test_undefined_and_special_numbers() {
        let value =
            parse_object_literal("{a: undefined, b: NaN, c: -Infinity, d: 0x1F, e: .5, f: 1e3}")
                .unwrap();
        assert_eq!(
            value,
            json!({"a": null, "b": null, "c": null, "d": 31, "e": 0.5, "f": 1000.0})
        );
    }

    #[test]
    fn test_unicode_escapes() {
        let value = parse_object_literal(
            r#"{url: "http:\u002F\u002Fa.com\u002Fx", e: "\uD83D\uDE00", z: '\x41'}"#,
        )
        .unwrap();
        assert_eq!(value["url"], "http://a.com/x");
        assert_eq!(value["e"], "😀");
        assert_eq!(value["z"], "A");
    }

    #[test]
    fn test_functions_are_skipped() {
        let src = r#"{
            a: function (x) { return {y: x}; },
            b: (p) => { if (p) { return "}"; } },
            c() { return 1 },
            get d() { return 2 },
            e: new Date(2024, 1, 1),
            f: window.something.else,
            g: 'kept'
        }"#;
        let value = parse_object_literal(src).unwrap();
        assert!(value["a"].is_null());
        assert!(value["b"].is_null());
        assert!(value.get("c").is_none());
        assert!(value.get("d").is_none());
        assert!(value["e"].is_null());
        assert!(value["f"].is_null());
        assert_eq!(value["g"], "kept");
    }

    #[test]
    fn test_large_radix_literals() {
        let value = parse_object_literal(
            "{id: 0xFFFFFFFFFFFFFFFF, big: 0x1_0000_0000_0000_0000, neg: -0o17, bin: 0b1010n, note: {title: 'x'}}",
        )
        .unwrap();
        assert_eq!(value["id"], json!(u64::MAX));
        assert_eq!(value["big"].as_f64(), Some(18_446_744_073_709_551_616.0));
        assert_eq!(value["neg"], json!(-15));
        assert_eq!(value["bin"], json!(10));
        assert_eq!(value["note"]["title"], "x");
        assert!(matches!(
            parse_object_literal("{a: 0x}"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_regex_literals_in_skipped_code() {
        let src = r#"{
            check: function (s) { return /'/.test(s) && /[/"]+/g.test(s); },
            pattern: /a,b}/gi,
            ratio: width / 2,
            after: 'kept'
        }"#;
        let value = parse_object_literal(src).unwrap();
        assert!(value["check"].is_null());
        assert!(value["pattern"].is_null());
        assert!(value["ratio"].is_null());
        assert_eq!(value["after"], "kept");

        assert!(matches!(
            parse_object_literal("{a: /open\n}"),
            Err(ParseError::UnterminatedRegex { .. })
        ));
    }

    #[test]
    fn test_comments_and_trailing_semicolon() {
        let value = parse_object_literal("/* lead */ {a: 1, // note\n b: [1,2,],};").unwrap();
        assert_eq!(value, json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn test_preserves_key_order() {
        let value = parse_object_literal("{z: 1, a: 2, m: 3}").unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(parse_object_literal("{a: 1"), Err(ParseError::UnexpectedEnd));
        assert!(matches!(
            parse_object_literal("{a: 'x}"),
            Err(ParseError::UnterminatedString { .. })
        ));
        assert!(matches!(
            parse_object_literal("{a: 1} extra"),
            Err(ParseError::TrailingInput { .. })
        ));
        assert!(matches!(
            parse_object_literal("{a 1}"),
            Err(ParseError::UnexpectedChar { found: '1', .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);
        assert_eq!(
            parse_object_literal(&deep),
            Err(ParseError::TooDeep(MAX_DEPTH))
        );
    }
}
