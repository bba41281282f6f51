//! One-line rule syntax: `field operator [value]`.
//!
//! ```text
//! company contains acme
//! employees between 10,50
//! name = "Ada Lovelace"
//! lastSeen isNotSet
//! ```
//!
//! An unquoted value runs to the end of the input. A quoted value ends at
//! the closing quote and nothing may follow it.

use super::ast::{Operator, Rule, RuleValue};

pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("Parse error at position {pos}: {message}")]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Rule, ParseError> {
        let field = self.parse_field()?;
        let operator = self.parse_operator()?;
        let value = self.parse_value()?;
        Ok(Rule::new(field, operator, RuleValue::Text(value)))
    }

    fn parse_field(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        let start = self.pos;

        while self.pos < self.input.len() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(self.error("Expected field name"));
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_operator(&mut self) -> Result<Operator, ParseError> {
        self.skip_whitespace();

        for symbol in [">=", "<=", "!=", "=", ">", "<"] {
            if self.match_str(symbol) {
                return Ok(Operator::from(symbol));
            }
        }

        let start = self.pos;
        while self.pos < self.input.len() && self.current_char().is_ascii_alphabetic() {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("Expected operator"));
        }

        match Operator::from(&self.input[start..self.pos]) {
            Operator::Unknown(name) => {
                self.pos = start;
                Err(self.error(&format!("Unknown operator '{name}'")))
            }
            op => Ok(op),
        }
    }

    fn parse_value(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();

        if !self.match_char('"') {
            let value = self.input[self.pos..].trim_end().to_string();
            self.pos = self.input.len();
            return Ok(value);
        }

        let start = self.pos;
        while self.pos < self.input.len() && self.current_char() != '"' {
            self.pos += self.current_char().len_utf8();
        }
        let value = self.input[start..self.pos].to_string();
        if !self.match_char('"') {
            return Err(self.error("Unterminated string"));
        }

        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error("Unexpected input after value"));
        }
        Ok(value)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.current_char().is_whitespace() {
            self.pos += self.current_char().len_utf8();
        }
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.pos < self.input.len() && self.current_char() == c {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn match_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            pos: self.pos,
        }
    }
}

pub fn parse_rule(input: &str) -> Result<Rule, ParseError> {
    Parser::new(input).parse()
}
