//! Query language front end: tokenizer and recursive-descent parser.
//!
//! The grammar is a small Cypher subset:
//!
//! ```text
//! query       = { clause } EOF
//! clause      = CREATE patterns | MATCH patterns | WHERE propExpr
//!             | SET propExpr {"," propExpr} | DELETE idents | RETURN idents
//! pattern     = "(" node ")" [ "-" "[" rel "]" "->" "(" node ")" ]
//! node        = [ident] [":" ident] [ "{" propList "}" ]
//! rel         = [ident] [":" ident] [ "{" propList "}" ]
//! propList    = ident ":" literal { "," ident ":" literal }
//! propExpr    = ident "." ident "=" literal
//! literal     = string | number | true | false
//! ```
//!
//! Parse errors carry the offending token and its byte position; there is
//! no recovery.

mod ast;
mod lexer;


pub use ast::{Clause, Literal, NodePattern, Pattern, PropertyExpr, Query, RelPattern};
pub use lexer::{Token, TokenKind, tokenize};

use common::{KiteError, KiteResult};

/// Parse a query string into its AST.
pub fn parse(text: &str) -> KiteResult<Query> {
    let tokens = tokenize(text)?;
    Parser { tokens, pos: 0 }.parse_query()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse_query(mut self) -> KiteResult<Query> {
        let mut clauses = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            clauses.push(self.parse_clause()?);
        }
        if clauses.is_empty() {
            return Err(KiteError::Parse("query has no clauses".into()));
        }
        Ok(Query { clauses })
    }

    fn parse_clause(&mut self) -> KiteResult<Clause> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Keyword {
            return Err(self.unexpected());
        }
        self.advance();

        match token.text.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Clause::Create(self.parse_patterns()?)),
            "MATCH" => Ok(Clause::Match(self.parse_patterns()?)),
            "WHERE" => Ok(Clause::Where(self.parse_property_expr()?)),
            "SET" => {
                let mut assignments = vec![self.parse_property_expr()?];
                while self.eat_symbol(",") {
                    assignments.push(self.parse_property_expr()?);
                }
                Ok(Clause::Set(assignments))
            }
            "DELETE" => Ok(Clause::Delete(self.parse_identifier_list()?)),
            "RETURN" => Ok(Clause::Return(self.parse_identifier_list()?)),
            _ => Err(self.unexpected_at(&token)),
        }
    }

    fn parse_patterns(&mut self) -> KiteResult<Vec<Pattern>> {
        let mut patterns = vec![self.parse_pattern()?];
        while self.eat_symbol(",") {
            patterns.push(self.parse_pattern()?);
        }
        Ok(patterns)
    }

    fn parse_pattern(&mut self) -> KiteResult<Pattern> {
        self.expect_symbol("(")?;
        let start = self.parse_node_pattern()?;
        self.expect_symbol(")")?;

        if !self.eat_symbol("-") {
            return Ok(Pattern { start, rel: None });
        }

        self.expect_symbol("[")?;
        let rel = self.parse_rel_pattern()?;
        self.expect_symbol("]")?;
        self.expect_symbol("->")?;
        self.expect_symbol("(")?;
        let end = self.parse_node_pattern()?;
        self.expect_symbol(")")?;

        Ok(Pattern {
            start,
            rel: Some((rel, end)),
        })
    }

    fn parse_node_pattern(&mut self) -> KiteResult<NodePattern> {
        let variable = self.eat_identifier();
        let label = if self.eat_symbol(":") {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        let properties = self.parse_optional_property_list()?;
        Ok(NodePattern {
            variable,
            label,
            properties,
        })
    }

    fn parse_rel_pattern(&mut self) -> KiteResult<RelPattern> {
        let variable = self.eat_identifier();
        let ty = if self.eat_symbol(":") {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        let properties = self.parse_optional_property_list()?;
        Ok(RelPattern {
            variable,
            ty,
            properties,
        })
    }

    fn parse_optional_property_list(&mut self) -> KiteResult<Vec<(String, Literal)>> {
        if !self.eat_symbol("{") {
            return Ok(Vec::new());
        }

        let mut properties = Vec::new();
        loop {
            let key = self.expect_identifier()?;
            self.expect_symbol(":")?;
            let value = self.parse_literal()?;
            properties.push((key, value));
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.expect_symbol("}")?;
        Ok(properties)
    }

    /// `var.key = literal`, the shared shape of WHERE and SET.
    fn parse_property_expr(&mut self) -> KiteResult<PropertyExpr> {
        let variable = self.expect_identifier()?;
        self.expect_symbol(".")?;
        let key = self.expect_identifier()?;
        self.expect_symbol("=")?;
        let value = self.parse_literal()?;
        Ok(PropertyExpr {
            variable,
            key,
            value,
        })
    }

    fn parse_identifier_list(&mut self) -> KiteResult<Vec<String>> {
        let mut idents = vec![self.expect_identifier()?];
        while self.eat_symbol(",") {
            idents.push(self.expect_identifier()?);
        }
        Ok(idents)
    }

    fn parse_literal(&mut self) -> KiteResult<Literal> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Str => {
                self.advance();
                Ok(Literal::Str(token.text))
            }
            TokenKind::Number => {
                self.advance();
                token
                    .text
                    .parse::<i64>()
                    .map(Literal::Int)
                    .map_err(|_| {
                        KiteError::Parse(format!(
                            "integer literal {} at position {} is out of range",
                            token.text, token.pos
                        ))
                    })
            }
            TokenKind::Identifier if token.text.eq_ignore_ascii_case("true") => {
                self.advance();
                Ok(Literal::Bool(true))
            }
            TokenKind::Identifier if token.text.eq_ignore_ascii_case("false") => {
                self.advance();
                Ok(Literal::Bool(false))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn peek(&self) -> &Token {
        // The stream always ends with EOF, so `pos` stays in range.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn eat_symbol(&mut self, text: &str) -> bool {
        let token = self.peek();
        if token.kind == TokenKind::Symbol && token.text == text {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, text: &str) -> KiteResult<()> {
        if self.eat_symbol(text) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn eat_identifier(&mut self) -> Option<String> {
        let token = self.peek();
        if token.kind == TokenKind::Identifier {
            let text = token.text.clone();
            self.advance();
            Some(text)
        } else {
            None
        }
    }

    fn expect_identifier(&mut self) -> KiteResult<String> {
        self.eat_identifier().ok_or_else(|| self.unexpected())
    }

    fn unexpected(&self) -> KiteError {
        let token = self.peek();
        self.unexpected_at(token)
    }

    fn unexpected_at(&self, token: &Token) -> KiteError {
        let shown = match token.kind {
            TokenKind::Eof => "EOF",
            _ => token.text.as_str(),
        };
        KiteError::Parse(format!(
            "unexpected token {shown} at position {}",
            token.pos
        ))
    }
}
