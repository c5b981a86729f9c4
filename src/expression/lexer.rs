//! Cursor-based tokenizer for the embedded expression grammar.
//!
//! One token-class scan is applied repeatedly from a cursor. Whitespace is
//! insignificant outside quoted strings. [`Lexer::consume`] moves the cursor
//! to the end of a peeked token and strictly advances on every successful
//! consumption, which guarantees that parsing terminates for any input.

/// A single token peeked from the expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    /// Byte offset of the first token character.
    pub start: usize,
    /// Byte offset one past the last token character.
    pub end: usize,
}

pub struct Lexer<'a> {
    source: &'a str,
    cursor: usize,
}

/// Characters that may appear in a word token: identifiers, numbers, dotted
/// paths, brace-wrapped context references and escape backslashes.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '{' | '}' | '-' | '\\')
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The next token, or `None` when only whitespace (or nothing) remains.
    ///
    /// Token classes, first match wins: escaped quote, quote character, word,
    /// multi-character operator, any single character.
    pub fn peek(&self) -> Option<Token<'a>> {
        let rest = &self.source[self.cursor..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            return None;
        }
        let start = self.cursor + (rest.len() - trimmed.len());
        let len = Self::token_len(trimmed);
        Some(Token {
            text: &self.source[start..start + len],
            start,
            end: start + len,
        })
    }

    fn token_len(input: &str) -> usize {
        let bytes = input.as_bytes();
        // escaped quote, before the word class (which also contains '\\')
        if bytes.len() >= 2 && bytes[0] == b'\\' && (bytes[1] == b'\'' || bytes[1] == b'"') {
            return 2;
        }
        if bytes[0] == b'\'' || bytes[0] == b'"' {
            return 1;
        }
        let word_len = input
            .char_indices()
            .find(|&(_, c)| !is_word_char(c))
            .map(|(i, _)| i)
            .unwrap_or(input.len());
        if word_len > 0 {
            return word_len;
        }
        for op in ["===", "!==", "==", "!=", "<=", ">=", "||", "&&"] {
            if input.starts_with(op) {
                return op.len();
            }
        }
        // any single character keeps the cursor moving
        input
            .chars()
            .next()
            .map(|c| c.len_utf8())
            .unwrap_or(0)
    }

    /// Consume a peeked token by moving the cursor past it.
    ///
    /// Invariant: the cursor strictly advances; a token always ends past the
    /// current cursor position.
    pub fn consume(&mut self, token: &Token<'a>) {
        debug_assert!(token.end > self.cursor, "consume must advance the cursor");
        self.cursor = token.end;
    }

    /// Read a quoted string after its opening quote has been consumed.
    ///
    /// Whitespace is preserved and `\\`-escaped quote characters are
    /// unescaped. Reading stops at the matching quote, or silently at the end
    /// of input for unterminated strings.
    pub fn read_quoted(&mut self, quote: char) -> String {
        let mut out = String::new();
        let mut chars = self.source[self.cursor..].chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some(next) if next == quote || next == '\\' => {
                        out.push(next);
                        self.cursor += c.len_utf8() + next.len_utf8();
                    }
                    Some(next) => {
                        out.push(c);
                        out.push(next);
                        self.cursor += c.len_utf8() + next.len_utf8();
                    }
                    None => {
                        out.push(c);
                        self.cursor += c.len_utf8();
                    }
                }
                continue;
            }
            self.cursor += c.len_utf8();
            if c == quote {
                return out;
            }
            out.push(c);
        }
        // unterminated string: the cursor reached end of input
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<String> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        while let Some(token) = lexer.peek() {
            out.push(token.text.to_string());
            lexer.consume(&token);
        }
        out
    }

    #[test]
    fn test_token_stream() {
        assert_eq!(tokens("1 == 1"), vec!["1", "==", "1"]);
        assert_eq!(tokens("{a} != {b}"), vec!["{a}", "!=", "{b}"]);
        assert_eq!(tokens("a && !b || c"), vec!["a", "&&", "!", "b", "||", "c"]);
        assert_eq!(tokens("(x <= 3)"), vec!["(", "x", "<=", "3", ")"]);
        assert_eq!(tokens("a %2"), vec!["a", "%", "2"]);
    }

    #[test]
    fn test_and_or_are_words() {
        assert_eq!(tokens("a and b or c"), vec!["a", "and", "b", "or", "c"]);
    }

    #[test]
    fn test_cursor_strictly_advances() {
        // arbitrary junk terminates because every peeked token is non-empty
        let mut lexer = Lexer::new("@@ ??? ~~ foo !====");
        let mut steps = 0;
        while let Some(token) = lexer.peek() {
            let before = lexer.cursor();
            lexer.consume(&token);
            assert!(lexer.cursor() > before);
            steps += 1;
            assert!(steps < 64, "lexer failed to terminate");
        }
        assert!(lexer.peek().is_none());
    }

    #[test]
    fn test_read_quoted_preserves_whitespace() {
        let mut lexer = Lexer::new("'a  b' rest");
        let token = lexer.peek().unwrap();
        assert_eq!(token.text, "'");
        lexer.consume(&token);
        assert_eq!(lexer.read_quoted('\''), "a  b");
        assert_eq!(lexer.peek().unwrap().text, "rest");
    }

    #[test]
    fn test_read_quoted_escapes() {
        let mut lexer = Lexer::new(r#"it\'s done' x"#);
        assert_eq!(lexer.read_quoted('\''), "it's done");
        assert_eq!(lexer.peek().unwrap().text, "x");
    }

    #[test]
    fn test_read_quoted_unterminated_degrades() {
        let mut lexer = Lexer::new("abc");
        assert_eq!(lexer.read_quoted('\''), "abc");
        assert!(lexer.peek().is_none());
    }
}
