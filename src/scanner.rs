use substring::Substring;

use crate::token::{Token, Type, Location};
use crate::literal::Literal;
use crate::error::{Error, ScanError};

pub struct Scanner {
    source: String,
    chars: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    column_offset: usize,
}

impl Scanner {
    /// Creates a new scanner.
    pub fn new(source: &str) -> Scanner {
        Scanner {
            source: source.to_string(),
            chars: source.chars().collect(),
            tokens: vec!(),
            start: 0,
            current: 0,
            line: 1,
            column_offset: 0,
        }
    }

    /// Scans the source code and returns a vector of tokens.
    /// The vector is always terminated by an EOF token, even if the source
    /// had scan errors.
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(
            Token::new(
                Type::EOF,
                String::from(""),
                None,
                Location::new(self.line, 0)
            )
        );

        self.tokens.clone()
    }

    /// Returns if the scanner has reached the end of the file.
    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    /// Consumes and returns the next character.
    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    /// Returns the next character without consuming it.
    fn peek(&self) -> char {
        *self.chars.get(self.current).unwrap_or(&'\0')
    }

    /// Returns the character after the next without consuming it.
    fn peek_next(&self) -> char {
        *self.chars.get(self.current + 1).unwrap_or(&'\0')
    }

    /// Consumes the next character if it is the expected character.
    fn match_next(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }

        self.current += 1;
        true
    }

    /// Returns the location of the current lexeme's first character.
    fn location(&self) -> Location {
        Location::new(self.line, self.start.saturating_sub(self.column_offset))
    }

    /// Adds a new token spanning the current lexeme to the list of tokens.
    fn add_token(&mut self, r#type: Type, literal: Option<Literal>) {
        let lexeme = self.source.substring(self.start, self.current).to_string();
        self.tokens.push(Token::new(r#type, lexeme, literal, self.location()));
    }

    /// Handles a string literal. The literal value is the raw text between
    /// the quotes; escape sequences are not processed.
    fn string(&mut self) {
        let start = self.location();

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\n' {
                self.line += 1;
                self.column_offset = self.current + 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            ScanError {
                location: start,
                message: String::from("Unterminated string."),
            }.throw();
            return;
        }

        self.advance();  // Move past the closing double quote.

        // The literal does not include the double quotes unlike the lexeme.
        let value = self.source.substring(self.start + 1, self.current - 1).to_string();
        self.add_token(Type::String, Some(Literal::String(value)));
    }

    /// Handles a number literal.
    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A dot with no digit after it is not part of the number; it is left
        // for the parser to see as a property access.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();  // Consume the dot.

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let value: f64 = self.source.substring(self.start, self.current).parse()
            .expect("scanned number literal should parse as a double");

        self.add_token(Type::Number, Some(Literal::Number(value)));
    }

    /// Handles an identifier or a keyword.
    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let r#type = match self.source.substring(self.start, self.current) {
            "and"      => Type::And,
            "class"    => Type::Class,
            "else"     => Type::Else,
            "false"    => Type::False,
            "for"      => Type::For,
            "fun"      => Type::Fun,
            "if"       => Type::If,
            "nil"      => Type::Nil,
            "or"       => Type::Or,
            "print"    => Type::Print,
            "return"   => Type::Return,
            "super"    => Type::Super,
            "this"     => Type::This,
            "true"     => Type::True,
            "var"      => Type::Var,
            "while"    => Type::While,
            _          => Type::Identifier,
        };

        self.add_token(r#type, None);
    }

    /// Scans the next token.
    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            // One character tokens
            '(' => self.add_token(Type::LeftParen, None),
            ')' => self.add_token(Type::RightParen, None),
            '{' => self.add_token(Type::LeftBrace, None),
            '}' => self.add_token(Type::RightBrace, None),
            ',' => self.add_token(Type::Comma, None),
            '.' => self.add_token(Type::Dot, None),
            '-' => self.add_token(Type::Minus, None),
            '+' => self.add_token(Type::Plus, None),
            ';' => self.add_token(Type::Semicolon, None),
            '*' => self.add_token(Type::Star, None),

            // Two character tokens
            '!' => {
                if self.match_next('=') {
                    self.add_token(Type::BangEqual, None);
                } else {
                    self.add_token(Type::Bang, None);
                }
            },
            '=' => {
                if self.match_next('=') {
                    self.add_token(Type::EqualEqual, None);
                } else {
                    self.add_token(Type::Equal, None);
                }
            },
            '<' => {
                if self.match_next('=') {
                    self.add_token(Type::LessEqual, None);
                } else {
                    self.add_token(Type::Less, None);
                }
            },
            '>' => {
                if self.match_next('=') {
                    self.add_token(Type::GreaterEqual, None);
                } else {
                    self.add_token(Type::Greater, None);
                }
            },
            '/' => {
                if self.match_next('/') {
                    // A comment runs to the end of the line.
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                } else {
                    self.add_token(Type::Slash, None);
                }
            },

            // Ignore whitespace
            ' ' | '\r' | '\t' => (),

            // Update the line counter
            '\n' => {
                self.line += 1;
                self.column_offset = self.current;
            },

            // String
            '"' => self.string(),

            // Numbers
            c if c.is_ascii_digit() => self.number(),

            // Identifiers
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),

            _ => {
                ScanError {
                    location: self.location(),
                    message: format!("Unexpected character '{c}'."),
                }.throw();
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn types(source: &str) -> Vec<Type> {
        Scanner::new(source).scan_tokens().iter().map(|t| t.r#type).collect()
    }

    #[test]
    fn scan_punctuation() {
        assert_eq!(
            types("(){},.-+;*/"),
            vec![
                Type::LeftParen, Type::RightParen, Type::LeftBrace, Type::RightBrace,
                Type::Comma, Type::Dot, Type::Minus, Type::Plus, Type::Semicolon,
                Type::Star, Type::Slash, Type::EOF,
            ],
        );
    }

    #[test]
    fn scan_operators() {
        assert_eq!(
            types("! != = == < <= > >="),
            vec![
                Type::Bang, Type::BangEqual, Type::Equal, Type::EqualEqual,
                Type::Less, Type::LessEqual, Type::Greater, Type::GreaterEqual,
                Type::EOF,
            ],
        );
    }

    #[test]
    fn scan_keywords() {
        assert_eq!(
            types("and class else false for fun if nil or print return super this true var while"),
            vec![
                Type::And, Type::Class, Type::Else, Type::False, Type::For, Type::Fun,
                Type::If, Type::Nil, Type::Or, Type::Print, Type::Return, Type::Super,
                Type::This, Type::True, Type::Var, Type::While, Type::EOF,
            ],
        );
    }

    #[test]
    fn scan_identifier_with_underscore() {
        let tokens = Scanner::new("_private var2").scan_tokens();
        assert_eq!(tokens[0].r#type, Type::Identifier);
        assert_eq!(tokens[0].lexeme, "_private");
        assert_eq!(tokens[1].r#type, Type::Identifier);
        assert_eq!(tokens[1].lexeme, "var2");
    }

    #[test]
    fn scan_number() {
        let tokens = Scanner::new("12.75").scan_tokens();
        assert_eq!(tokens[0].r#type, Type::Number);
        assert_eq!(tokens[0].literal, Some(Literal::Number(12.75)));
    }

    #[test]
    fn scan_number_with_trailing_dot() {
        let tokens = Scanner::new("123.").scan_tokens();
        assert_eq!(tokens[0].r#type, Type::Number);
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.0)));
        assert_eq!(tokens[1].r#type, Type::Dot);
    }

    #[test]
    fn scan_string() {
        let tokens = Scanner::new("\"hello world\"").scan_tokens();
        assert_eq!(tokens[0].r#type, Type::String);
        assert_eq!(tokens[0].lexeme, "\"hello world\"");
        assert_eq!(tokens[0].literal, Some(Literal::from("hello world")));
    }

    #[test]
    fn scan_multiline_string_counts_lines() {
        let tokens = Scanner::new("\"one\ntwo\"\nfoo").scan_tokens();
        assert_eq!(tokens[0].r#type, Type::String);
        assert_eq!(tokens[0].literal, Some(Literal::from("one\ntwo")));
        assert_eq!(tokens[1].location.line, 3);
    }

    #[test]
    fn scan_string_does_not_unescape() {
        let tokens = Scanner::new(r#""a\nb""#).scan_tokens();
        assert_eq!(tokens[0].literal, Some(Literal::from(r"a\nb")));
    }

    #[test]
    fn scan_unterminated_string() {
        let tokens = Scanner::new("\"abc").scan_tokens();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].r#type, Type::EOF);
    }

    #[test]
    fn scan_comment() {
        assert_eq!(
            types("1 // the rest is ignored ()\n2"),
            vec![Type::Number, Type::Number, Type::EOF],
        );
    }

    #[test]
    fn scan_comment_at_end_of_file() {
        assert_eq!(types("// nothing here"), vec![Type::EOF]);
    }

    #[test]
    fn scan_locations() {
        let tokens = Scanner::new("var x;\nx = 1;").scan_tokens();
        assert_eq!(tokens[0].location, Location::new(1, 0));
        assert_eq!(tokens[1].location, Location::new(1, 4));
        assert_eq!(tokens[3].location, Location::new(2, 0));
        assert_eq!(tokens[4].location, Location::new(2, 2));
    }
}
