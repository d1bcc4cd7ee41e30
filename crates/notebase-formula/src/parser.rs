//! Formula parser
//!
//! A recursive descent parser for formula sources with proper operator
//! precedence. The lexer is driven by the parser one token at a time.

use crate::ast::{BinaryOperator, FormulaExpr, PropertyRef, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use std::ops::Range;

/// Deepest nesting of parentheses, calls, unary minus and operator chains
///
/// Keeps parsing and evaluation recursion well inside the thread stack.
pub const MAX_NESTING: usize = 256;

/// Parse a formula source into an AST
///
/// # Example
/// ```rust
/// use notebase_formula::parse_formula;
///
/// let ast = parse_formula("1 + 2").unwrap();
/// let ast = parse_formula("prop(\"Price\") * prop('Qty')").unwrap();
/// let ast = parse_formula("if(prop(\"Done\"), \"Yes\", \"No\")").unwrap();
/// ```
pub fn parse_formula(source: &str) -> FormulaResult<FormulaExpr> {
    let mut parser = FormulaParser::new(source)?;
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current_token() != &Token::Eof {
        return Err(FormulaError::parse(
            parser.token_span.start,
            format!(
                "Unexpected input after expression: '{}'",
                &source[parser.token_span.start..]
            ),
        ));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),

    // Function names, `prop`, `true` / `false`
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    EqualEqual,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Identifier(name) => format!("'{}'", name),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::EqualEqual => "'=='".into(),
            Token::NotEqual => "'!='".into(),
            Token::LessThan => "'<'".into(),
            Token::LessEqual => "'<='".into(),
            Token::GreaterThan => "'>'".into(),
            Token::GreaterEqual => "'>='".into(),
            Token::Comma => "','".into(),
            Token::LeftParen => "'('".into(),
            Token::RightParen => "')'".into(),
            Token::Eof => "end of formula".into(),
        }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    /// Byte range of `current_token` in the input
    token_span: Range<usize>,
    /// Current nesting, see [`MAX_NESTING`]
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            token_span: 0..0,
            depth: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.skip_whitespace();
        let start = self.pos;
        self.current_token = self.scan_token()?;
        self.token_span = start..self.pos;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };
        let start = self.pos;

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        match c {
            '<' | '>' => {
                self.advance();
                let or_equal = self.eat('=');
                return Ok(match (c, or_equal) {
                    ('<', true) => Token::LessEqual,
                    ('<', false) => Token::LessThan,
                    (_, true) => Token::GreaterEqual,
                    (_, false) => Token::GreaterThan,
                });
            }
            '=' => {
                self.advance();
                if self.eat('=') {
                    return Ok(Token::EqualEqual);
                }
                return Err(FormulaError::parse(start, "Use '==' to compare values"));
            }
            '!' => {
                self.advance();
                if self.eat('=') {
                    return Ok(Token::NotEqual);
                }
                return Err(FormulaError::parse(start, "Unexpected character '!'"));
            }
            _ => {}
        }

        // String literal
        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier
        if c.is_ascii_alphabetic() || c == '_' {
            while self
                .peek_char()
                .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
            {
                self.advance();
            }
            return Ok(Token::Identifier(self.input[start..self.pos].to_string()));
        }

        Err(FormulaError::parse(
            start,
            format!("Unexpected character '{}'", c),
        ))
    }

    fn scan_string(&mut self, quote: char) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            let c = self
                .peek_char()
                .ok_or_else(|| FormulaError::parse(start, "Unterminated string literal"))?;
            self.advance();
            if c == quote {
                return Ok(Token::String(s));
            }
            if c == '\\' {
                let escaped = self
                    .peek_char()
                    .ok_or_else(|| FormulaError::parse(start, "Unterminated string literal"))?;
                self.advance();
                s.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            } else {
                s.push(c);
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let sign = self
                .peek_char_at(1)
                .map_or(0, |c| usize::from(c == '+' || c == '-'));
            if self
                .peek_char_at(1 + sign)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..=sign {
                    self.advance();
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Token::Number)
            .ok_or_else(|| FormulaError::parse(start, format!("Invalid number '{}'", num_str)))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    fn nest(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FormulaError::parse(
                self.token_span.start,
                "Formula is nested too deeply",
            ));
        }
        Ok(())
    }

    fn unexpected(&self, wanted: &str) -> FormulaError {
        FormulaError::parse(
            self.token_span.start,
            format!("Expected {}, got {}", wanted, self.current_token().describe()),
        )
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: ==, !=, <, <=, >, >=
    // 2. Addition/Subtraction: +, -
    // 3. Multiplication/Division: *, /
    // 4. Unary: -
    // 5. Primary: literals, prop references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.nest()?;
        let expr = self.parse_comparison()?;
        self.depth -= 1;
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;
        let mut chained = 0;

        loop {
            let op = match self.current_token() {
                Token::EqualEqual => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            self.nest()?;
            chained += 1;
            let right = self.parse_additive()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth -= chained;
        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;
        let mut chained = 0;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            self.nest()?;
            chained += 1;
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth -= chained;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;
        let mut chained = 0;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume()?;
            self.nest()?;
            chained += 1;
            let right = self.parse_unary()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth -= chained;
        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        if matches!(self.current_token(), Token::Minus) {
            self.consume()?;
            self.nest()?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok(FormulaExpr::Number(n))
            }
            Token::String(s) => {
                self.consume()?;
                Ok(FormulaExpr::String(s))
            }
            Token::LeftParen => {
                self.consume()?;
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }
            Token::Identifier(name) => {
                let position = self.token_span.start;
                self.consume()?;

                if matches!(self.current_token(), Token::LeftParen) {
                    if name.eq_ignore_ascii_case("prop") {
                        return self.parse_prop();
                    }
                    return self.parse_function_call(name);
                }

                match name.as_str() {
                    "true" => Ok(FormulaExpr::Boolean(true)),
                    "false" => Ok(FormulaExpr::Boolean(false)),
                    _ => Err(FormulaError::parse(
                        position,
                        format!("Unknown identifier '{}'", name),
                    )),
                }
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    fn parse_prop(&mut self) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let name = match self.current_token() {
            Token::String(s) => s.clone(),
            _ => return Err(self.unexpected("a quoted property name")),
        };
        let span = self.token_span.clone();
        self.consume()?;

        self.expect(&Token::RightParen)?;
        Ok(FormulaExpr::PropertyRef(PropertyRef { name, span }))
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        if !matches!(self.current_token(), Token::RightParen) {
            loop {
                args.push(self.parse_expression()?);

                if matches!(self.current_token(), Token::Comma) {
                    self.consume()?;
                } else {
                    break;
                }
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_ascii_lowercase(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_number() {
        let expr = parse_formula("42").unwrap();
        assert_eq!(expr, FormulaExpr::Number(42.0));

        let expr = parse_formula("3.14").unwrap();
        assert_eq!(expr, FormulaExpr::Number(3.14));

        let expr = parse_formula("1.5e3").unwrap();
        assert_eq!(expr, FormulaExpr::Number(1500.0));
    }

    #[test]
    fn test_parse_string() {
        let expr = parse_formula("\"Hello\"").unwrap();
        assert_eq!(expr, FormulaExpr::String("Hello".into()));

        let expr = parse_formula("'single'").unwrap();
        assert_eq!(expr, FormulaExpr::String("single".into()));

        let expr = parse_formula(r#""say \"hi\"\n""#).unwrap();
        assert_eq!(expr, FormulaExpr::String("say \"hi\"\n".into()));
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_formula("true").unwrap(), FormulaExpr::Boolean(true));
        assert_eq!(parse_formula("false").unwrap(), FormulaExpr::Boolean(false));
    }

    #[test]
    fn test_parse_prop() {
        let source = "prop( \"Unit price\" )";
        let expr = parse_formula(source).unwrap();
        if let FormulaExpr::PropertyRef(r) = expr {
            assert_eq!(r.name, "Unit price");
            assert_eq!(&source[r.span], "\"Unit price\"");
        } else {
            panic!("Expected property reference");
        }

        let expr = parse_formula("prop('Qty')").unwrap();
        assert!(matches!(expr, FormulaExpr::PropertyRef(ref r) if r.name == "Qty"));
    }

    #[test]
    fn test_parse_prop_requires_string() {
        assert!(parse_formula("prop(Qty)").is_err());
        assert!(parse_formula("prop(\"a\", \"b\")").is_err());
        assert!(parse_formula("prop()").is_err());
    }

    #[test]
    fn test_parse_binary_op() {
        let expr = parse_formula("1+2").unwrap();
        if let FormulaExpr::BinaryOp { op, left, right } = expr {
            assert_eq!(op, BinaryOperator::Add);
            assert_eq!(*left, FormulaExpr::Number(1.0));
            assert_eq!(*right, FormulaExpr::Number(2.0));
        } else {
            panic!("Expected binary op");
        }
    }

    #[test]
    fn test_operator_precedence() {
        // 1 + 2 * 3 should parse as 1 + (2 * 3)
        let expr = parse_formula("1+2*3").unwrap();
        if let FormulaExpr::BinaryOp { op, right, .. } = expr {
            assert_eq!(op, BinaryOperator::Add);
            assert!(matches!(
                *right,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    ..
                }
            ));
        } else {
            panic!("Expected binary op");
        }

        // comparison binds loosest
        let expr = parse_formula("1 + 1 == 2").unwrap();
        assert!(matches!(
            expr,
            FormulaExpr::BinaryOp {
                op: BinaryOperator::Equal,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_unary() {
        let expr = parse_formula("--5").unwrap();
        if let FormulaExpr::UnaryOp { op, operand } = expr {
            assert_eq!(op, UnaryOperator::Negate);
            assert!(matches!(*operand, FormulaExpr::UnaryOp { .. }));
        } else {
            panic!("Expected unary op");
        }
    }

    #[test]
    fn test_parse_function() {
        let expr = parse_formula("Round(prop(\"Price\"), 2)").unwrap();
        if let FormulaExpr::Function { name, args } = expr {
            assert_eq!(name, "round");
            assert_eq!(args.len(), 2);
        } else {
            panic!("Expected function");
        }

        let expr = parse_formula("now()").unwrap();
        assert!(matches!(expr, FormulaExpr::Function { ref args, .. } if args.is_empty()));
    }

    #[test]
    fn test_comparison_tokens() {
        for (source, expected) in [
            ("1 != 2", BinaryOperator::NotEqual),
            ("1 <= 2", BinaryOperator::LessEqual),
            ("1 >= 2", BinaryOperator::GreaterEqual),
            ("1 < 2", BinaryOperator::LessThan),
            ("1 > 2", BinaryOperator::GreaterThan),
        ] {
            let expr = parse_formula(source).unwrap();
            assert!(
                matches!(expr, FormulaExpr::BinaryOp { op, .. } if op == expected),
                "{}",
                source
            );
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_formula("1 +"),
            Err(FormulaError::Parse { .. })
        ));
        assert!(matches!(
            parse_formula("(1 + 2"),
            Err(FormulaError::Parse { .. })
        ));
        assert!(matches!(
            parse_formula("\"open"),
            Err(FormulaError::Parse { position: 0, .. })
        ));
        assert!(matches!(
            parse_formula("1 = 1"),
            Err(FormulaError::Parse { position: 2, .. })
        ));
        assert!(parse_formula("1 2").is_err());
        assert!(parse_formula("alert").is_err());
        assert!(parse_formula("1 ; 2").is_err());
        assert!(parse_formula("1.2.3").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = 200_000;
        for source in [
            format!("{}1{}", "(".repeat(deep), ")".repeat(deep)),
            format!("{}1", "-".repeat(deep)),
            format!("1{}", "+1".repeat(deep)),
            format!("{}1{}", "abs(".repeat(deep), ")".repeat(deep)),
        ] {
            assert!(matches!(
                parse_formula(&source),
                Err(FormulaError::Parse { .. })
            ));
        }

        let ok = 100;
        assert!(parse_formula(&format!("{}1{}", "(".repeat(ok), ")".repeat(ok))).is_ok());
        assert!(parse_formula(&format!("1{}", "+1".repeat(ok))).is_ok());
    }

    #[test]
    fn test_property_refs_in_order() {
        let expr = parse_formula("concat(prop(\"A\"), if(prop('B'), prop(\"C\"), \"\"))").unwrap();
        let names: Vec<_> = expr.property_refs().into_iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
