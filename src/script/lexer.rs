//! Lexical scanner for data handler sources
//!
//! Splits JavaScript text into tokens precisely enough to tell code apart
//! from comments, string, template and regex literals. It does not build a
//! syntax tree. Unterminated literals do not stop the scan; they are flagged
//! on the token so strict consumers can reject them.

/// Kinds of tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,
    Ident,
    Number,
    Str,
    Template,
    Regex,
    Punct,
}

/// A slice of source text with its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset into the source
    pub offset: usize,
    pub terminated: bool,
}

impl Token<'_> {
    /// Whether the token carries meaning (not whitespace or a comment)
    pub fn is_significant(&self) -> bool {
        !matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }
}

/// Keywords after which a `/` starts a regex literal rather than a division
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Keywords whose parenthesized head is followed by a statement, not a value
const CONTROL_HEAD_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Tokenize a whole source text
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// 1-based line and column of a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before, |nl| &before[nl + 1..])
        .chars()
        .count()
        + 1;
    (line, column)
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    /// Kind and text of the last significant token, for regex detection
    prev: Option<(TokenKind, &'a str)>,
    /// One entry per open `(`: whether it opened a control statement head
    parens: Vec<bool>,
    /// The last significant token was a `)` closing a control statement head
    closed_control_head: bool,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            prev: None,
            parens: Vec::new(),
            closed_control_head: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        let start = self.pos;
        let c = self.peek()?;

        let (kind, terminated) = if start == 0 && self.rest().starts_with("#!") {
            self.skip_line();
            (TokenKind::LineComment, true)
        } else if c.is_whitespace() || c == '\u{feff}' {
            while self
                .peek()
                .is_some_and(|c| c.is_whitespace() || c == '\u{feff}')
            {
                self.bump();
            }
            (TokenKind::Whitespace, true)
        } else if self.rest().starts_with("//") {
            self.skip_line();
            (TokenKind::LineComment, true)
        } else if self.rest().starts_with("/*") {
            self.pos += 2;
            match self.rest().find("*/") {
                Some(end) => {
                    self.pos += end + 2;
                    (TokenKind::BlockComment, true)
                }
                None => {
                    self.pos = self.source.len();
                    (TokenKind::BlockComment, false)
                }
            }
        } else if is_ident_start(c) {
            while self.peek().is_some_and(is_ident_part) {
                self.bump();
            }
            (TokenKind::Ident, true)
        } else if c.is_ascii_digit() || (c == '.' && self.peek_second().is_some_and(|d| d.is_ascii_digit())) {
            self.scan_number();
            (TokenKind::Number, true)
        } else if c == '"' || c == '\'' {
            (TokenKind::Str, self.scan_string(c))
        } else if c == '`' {
            (TokenKind::Template, self.scan_template())
        } else if c == '/' && self.regex_allowed() {
            (TokenKind::Regex, self.scan_regex())
        } else {
            if self.rest().starts_with("++") || self.rest().starts_with("--") {
                self.pos += 2;
            } else {
                self.bump();
            }
            (TokenKind::Punct, true)
        };

        let token = Token {
            kind,
            text: &self.source[start..self.pos],
            offset: start,
            terminated,
        };
        if token.is_significant() {
            self.track_parens(&token);
            self.prev = Some((token.kind, token.text));
        }
        Some(token)
    }

    fn track_parens(&mut self, token: &Token<'a>) {
        self.closed_control_head = false;
        if token.is_punct("(") {
            let control = matches!(
                self.prev,
                Some((TokenKind::Ident, word)) if CONTROL_HEAD_KEYWORDS.contains(&word)
            );
            self.parens.push(control);
        } else if token.is_punct(")") {
            self.closed_control_head = self.parens.pop().unwrap_or(false);
        }
    }

    fn skip_line(&mut self) {
        match self.rest().find('\n') {
            Some(end) => self.pos += end,
            None => self.pos = self.source.len(),
        }
    }

    fn scan_number(&mut self) {
        let hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        let mut last = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = !hex && matches!(c, '+' | '-') && matches!(last, 'e' | 'E');
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                last = c;
                self.bump();
            } else {
                break;
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> bool {
        self.bump();
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '\n' => return false,
                c if c == quote => {
                    self.bump();
                    return true;
                }
                _ => {
                    self.bump();
                }
            }
        }
        false
    }

    fn scan_template(&mut self) -> bool {
        self.bump();
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '`' => {
                    self.bump();
                    return true;
                }
                '$' if self.peek_second() == Some('{') => {
                    self.pos += 2;
                    if !self.scan_substitution() {
                        return false;
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
        false
    }

    /// Skip a `${ ... }` expression, returning false if input ends first
    fn scan_substitution(&mut self) -> bool {
        let saved_prev = self.prev.take();
        let saved_closed = self.closed_control_head;
        let mut depth = 0usize;
        let mut closed = false;

        while let Some(token) = self.next_token() {
            if token.is_punct("{") {
                depth += 1;
            } else if token.is_punct("}") {
                if depth == 0 {
                    closed = true;
                    break;
                }
                depth -= 1;
            } else if !token.terminated {
                break;
            }
        }

        self.prev = saved_prev;
        self.closed_control_head = saved_closed;
        closed
    }

    fn scan_regex(&mut self) -> bool {
        self.bump();
        let mut in_class = false;
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '\n' => return false,
                '[' => {
                    in_class = true;
                    self.bump();
                }
                ']' => {
                    in_class = false;
                    self.bump();
                }
                '/' if !in_class => {
                    self.bump();
                    while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                        self.bump();
                    }
                    return true;
                }
                _ => {
                    self.bump();
                }
            }
        }
        false
    }

    fn regex_allowed(&self) -> bool {
        match self.prev {
            None => true,
            Some((TokenKind::Ident, word)) => REGEX_PRECEDING_KEYWORDS.contains(&word),
            Some((TokenKind::Punct, ")")) => self.closed_control_head,
            Some((TokenKind::Punct, punct)) => !matches!(punct, "]" | "++" | "--"),
            Some(_) => false,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$' || (!c.is_ascii() && c.is_alphabetic())
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || (!c.is_ascii() && c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(source: &str) -> Vec<(TokenKind, &str)> {
        tokenize(source)
            .into_iter()
            .filter(Token::is_significant)
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_tokens_cover_source() {
        let source = "var a = require('x'); // done\n/* block */ a / 2;";
        let joined: String = tokenize(source).iter().map(|t| t.text).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_strings_and_comments() {
        let tokens = significant(r#"call("a\"b", 'c') // require('x')"#);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Ident, "call"),
                (TokenKind::Punct, "("),
                (TokenKind::Str, r#""a\"b""#),
                (TokenKind::Punct, ","),
                (TokenKind::Str, "'c'"),
                (TokenKind::Punct, ")"),
            ]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        let tokens = significant("x = a / b; y = /re\\/[/]/g.test(s); z = (a) / 2");
        assert!(tokens.contains(&(TokenKind::Regex, "/re\\/[/]/g")));
        assert_eq!(
            tokens.iter().filter(|t| t.1 == "/").count(),
            2,
            "both divisions stay punctuation"
        );
    }

    #[test]
    fn test_regex_after_return() {
        let tokens = significant("return /'/.test(s)");
        assert_eq!(tokens[1], (TokenKind::Regex, "/'/"));
    }

    #[test]
    fn test_regex_after_control_head() {
        let tokens = significant("if (ok) /'/.test(s); var r = require('request');");
        assert_eq!(tokens[4], (TokenKind::Regex, "/'/"));
        assert!(tokens.contains(&(TokenKind::Str, "'request'")));

        let tokens = significant("while (f(a)) / x/g.exec(s)");
        assert!(tokens.contains(&(TokenKind::Regex, "/ x/g")));

        let tokens = significant("for (;;) /a/.test(b)");
        assert!(tokens.contains(&(TokenKind::Regex, "/a/")));
    }

    #[test]
    fn test_division_after_call_inside_control_head() {
        let tokens = significant("if (f(a) / 2) x = (b) / c;");
        assert_eq!(tokens.iter().filter(|t| t.0 == TokenKind::Regex).count(), 0);
        assert_eq!(tokens.iter().filter(|t| t.1 == "/").count(), 2);
    }

    #[test]
    fn test_postfix_increment_then_division() {
        let tokens = significant("i++ / 2");
        assert_eq!(tokens[1], (TokenKind::Punct, "++"));
        assert_eq!(tokens[2], (TokenKind::Punct, "/"));
    }

    #[test]
    fn test_template_with_substitution() {
        let tokens = significant("`a ${ {b: `c${d}`}.b } e` + 1");
        assert_eq!(tokens[0].0, TokenKind::Template);
        assert_eq!(tokens[0].1, "`a ${ {b: `c${d}`}.b } e`");
        assert_eq!(tokens[1], (TokenKind::Punct, "+"));
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize("'abc\nx");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert!(!tokens[0].terminated);
    }

    #[test]
    fn test_numbers() {
        let tokens = significant("1e-5 + 0x1F + .5");
        assert_eq!(tokens[0], (TokenKind::Number, "1e-5"));
        assert_eq!(tokens[2], (TokenKind::Number, "0x1F"));
        assert_eq!(tokens[4], (TokenKind::Number, ".5"));
    }

    #[test]
    fn test_shebang() {
        let tokens = tokenize("#!/usr/bin/env node\nx");
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
    }

    #[test]
    fn test_line_col() {
        let source = "a\nbc\nd";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 3), (2, 2));
        assert_eq!(line_col(source, 5), (3, 1));
    }
}
