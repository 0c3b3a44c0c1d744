//! Textual parser for type expressions.
//!
//! The front end usually hands tscpp structured type information, but type
//! annotations recovered from declaration text (and the test suites) arrive
//! as strings like `"string | null"` or `"(x: number) => Promise<void>"`.
//! This is a small hand-rolled tokenizer plus recursive-descent parser over
//! those strings.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! type        := intersection ("|" intersection)*
//! intersection:= postfix ("&" postfix)*
//! postfix     := primary ("[" "]")*
//! primary     := "(" params ")" "=>" type
//!              | "(" type ")"
//!              | "[" tuple-elems "]"
//!              | ident ("<" type ("," type)* ">")?
//!              | string-literal | number-literal | "true" | "false"
//! ```

use std::fmt;

use crate::expr::{FunctionParam, TupleElem, TypeExpr};

/// A parse failure with the byte position it occurred at.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParseError {
    pub kind: TypeParseErrorKind,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeParseErrorKind {
    UnexpectedCharacter(char),
    UnexpectedToken(String),
    UnexpectedEnd,
    UnterminatedString,
}

impl fmt::Display for TypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeParseErrorKind::UnexpectedCharacter(c) => {
                write!(f, "unexpected character {c:?} at offset {}", self.pos)
            }
            TypeParseErrorKind::UnexpectedToken(t) => {
                write!(f, "unexpected token `{t}` at offset {}", self.pos)
            }
            TypeParseErrorKind::UnexpectedEnd => {
                write!(f, "unexpected end of type expression")
            }
            TypeParseErrorKind::UnterminatedString => {
                write!(f, "unterminated string literal at offset {}", self.pos)
            }
        }
    }
}

impl std::error::Error for TypeParseError {}

// ── Tokenizer ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(String),
    LAngle,
    RAngle,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
    Amp,
    Question,
    Colon,
    Ellipsis,
    Arrow,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{s}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Num(s) => write!(f, "{s}"),
            Token::LAngle => write!(f, "<"),
            Token::RAngle => write!(f, ">"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Pipe => write!(f, "|"),
            Token::Amp => write!(f, "&"),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::Ellipsis => write!(f, "..."),
            Token::Arrow => write!(f, "=>"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, TypeParseError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '<' => {
                tokens.push((Token::LAngle, i));
                i += 1;
            }
            '>' => {
                tokens.push((Token::RAngle, i));
                i += 1;
            }
            '[' => {
                tokens.push((Token::LBracket, i));
                i += 1;
            }
            ']' => {
                tokens.push((Token::RBracket, i));
                i += 1;
            }
            '(' => {
                tokens.push((Token::LParen, i));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, i));
                i += 1;
            }
            ',' => {
                tokens.push((Token::Comma, i));
                i += 1;
            }
            '|' => {
                tokens.push((Token::Pipe, i));
                i += 1;
            }
            '&' => {
                tokens.push((Token::Amp, i));
                i += 1;
            }
            '?' => {
                tokens.push((Token::Question, i));
                i += 1;
            }
            ':' => {
                tokens.push((Token::Colon, i));
                i += 1;
            }
            '=' if bytes.get(i + 1) == Some(&b'>') => {
                tokens.push((Token::Arrow, i));
                i += 2;
            }
            '.' if bytes.get(i + 1) == Some(&b'.') && bytes.get(i + 2) == Some(&b'.') => {
                tokens.push((Token::Ellipsis, i));
                i += 3;
            }
            '"' | '\'' => {
                let start = i;
                // Slice between the quotes so multi-byte characters survive
                // intact.
                match text[i + 1..].find(c) {
                    None => {
                        return Err(TypeParseError {
                            kind: TypeParseErrorKind::UnterminatedString,
                            pos: start,
                        })
                    }
                    Some(len) => {
                        tokens.push((Token::Str(text[i + 1..i + 1 + len].to_string()), start));
                        i += len + 2;
                    }
                }
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_digit() || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push((Token::Num(text[start..i].to_string()), start));
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < bytes.len() {
                    let b = bytes[i] as char;
                    if b.is_ascii_alphanumeric() || b == '_' || b == '$' || b == '.' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(text[start..i].to_string()), start));
            }
            other => {
                // `bytes[i] as char` misreads a multi-byte lead byte; decode
                // the real character for the error.
                let ch = text[i..].chars().next().unwrap_or(other);
                return Err(TypeParseError {
                    kind: TypeParseErrorKind::UnexpectedCharacter(ch),
                    pos: i,
                })
            }
        }
    }
    Ok(tokens)
}

// ── Parser ───────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn bump(&mut self) -> Result<Token, TypeParseError> {
        match self.tokens.get(self.pos) {
            Some((t, _)) => {
                self.pos += 1;
                Ok(t.clone())
            }
            None => Err(self.eof()),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), TypeParseError> {
        let got = self.bump()?;
        if &got == expected {
            Ok(())
        } else {
            Err(self.unexpected(&got))
        }
    }

    fn eof(&self) -> TypeParseError {
        TypeParseError {
            kind: TypeParseErrorKind::UnexpectedEnd,
            pos: self.tokens.last().map(|(_, p)| *p).unwrap_or(0),
        }
    }

    fn unexpected(&self, token: &Token) -> TypeParseError {
        let pos = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, p)| *p)
            .unwrap_or(0);
        TypeParseError {
            kind: TypeParseErrorKind::UnexpectedToken(token.to_string()),
            pos,
        }
    }

    fn parse_type(&mut self) -> Result<TypeExpr, TypeParseError> {
        let first = self.parse_intersection()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.peek() == Some(&Token::Pipe) {
            self.bump()?;
            members.push(self.parse_intersection()?);
        }
        Ok(TypeExpr::Union(members))
    }

    fn parse_intersection(&mut self) -> Result<TypeExpr, TypeParseError> {
        let first = self.parse_postfix()?;
        if self.peek() != Some(&Token::Amp) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.peek() == Some(&Token::Amp) {
            self.bump()?;
            members.push(self.parse_postfix()?);
        }
        Ok(TypeExpr::Intersection(members))
    }

    fn parse_postfix(&mut self) -> Result<TypeExpr, TypeParseError> {
        let mut ty = self.parse_primary()?;
        while self.peek() == Some(&Token::LBracket) && self.peek_at(1) == Some(&Token::RBracket) {
            self.bump()?;
            self.bump()?;
            ty = TypeExpr::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_primary(&mut self) -> Result<TypeExpr, TypeParseError> {
        match self.bump()? {
            Token::LParen => {
                if self.is_function_head() {
                    self.parse_function_tail()
                } else {
                    let inner = self.parse_type()?;
                    self.expect(&Token::RParen)?;
                    // A parenthesized type may still be a function head:
                    // `(A | B) => C` is not legal TS, so no arrow check here.
                    Ok(inner)
                }
            }
            Token::LBracket => self.parse_tuple(),
            Token::Ident(name) => {
                if name == "true" {
                    return Ok(TypeExpr::BooleanLiteral(true));
                }
                if name == "false" {
                    return Ok(TypeExpr::BooleanLiteral(false));
                }
                let mut args = Vec::new();
                if self.peek() == Some(&Token::LAngle) {
                    self.bump()?;
                    loop {
                        args.push(self.parse_type()?);
                        match self.bump()? {
                            Token::Comma => continue,
                            Token::RAngle => break,
                            other => return Err(self.unexpected(&other)),
                        }
                    }
                }
                Ok(TypeExpr::Name { name, args })
            }
            Token::Str(s) => Ok(TypeExpr::StringLiteral(s)),
            Token::Num(n) => Ok(TypeExpr::NumberLiteral(n)),
            other => Err(self.unexpected(&other)),
        }
    }

    /// Decide whether the tokens after an already-consumed `(` form a
    /// function parameter list. Scans forward to the matching `)` and checks
    /// for a following `=>`.
    fn is_function_head(&self) -> bool {
        if self.peek() == Some(&Token::RParen) {
            // `() => T`
            return self.peek_at(1) == Some(&Token::Arrow);
        }
        let mut depth = 1usize;
        let mut offset = 0usize;
        while let Some(token) = self.peek_at(offset) {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek_at(offset + 1) == Some(&Token::Arrow);
                    }
                }
                _ => {}
            }
            offset += 1;
        }
        false
    }

    /// Parse `params ") =>" type` after the opening `(` was consumed.
    fn parse_function_tail(&mut self) -> Result<TypeExpr, TypeParseError> {
        let mut params = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                // `name: type`, bare `name`, or a bare type.
                let param = if let (Some(Token::Ident(_)), Some(Token::Colon)) =
                    (self.peek(), self.peek_at(1))
                {
                    let name = match self.bump()? {
                        Token::Ident(n) => n,
                        _ => unreachable!("peeked an identifier"),
                    };
                    self.bump()?; // colon
                    FunctionParam {
                        name: Some(name),
                        ty: Some(self.parse_type()?),
                    }
                } else if let (Some(Token::Ident(n)), Some(Token::Comma) | Some(Token::RParen)) =
                    (self.peek(), self.peek_at(1))
                {
                    let name = n.clone();
                    self.bump()?;
                    FunctionParam {
                        name: Some(name),
                        ty: None,
                    }
                } else {
                    FunctionParam {
                        name: None,
                        ty: Some(self.parse_type()?),
                    }
                };
                params.push(param);
                match self.bump()? {
                    Token::Comma => continue,
                    Token::RParen => break,
                    other => return Err(self.unexpected(&other)),
                }
            }
        } else {
            self.bump()?;
        }
        self.expect(&Token::Arrow)?;
        let ret = self.parse_type()?;
        Ok(TypeExpr::Function {
            params,
            ret: Box::new(ret),
        })
    }

    fn parse_tuple(&mut self) -> Result<TypeExpr, TypeParseError> {
        let mut elems = Vec::new();
        if self.peek() == Some(&Token::RBracket) {
            self.bump()?;
            return Ok(TypeExpr::Tuple(elems));
        }
        loop {
            let rest = if self.peek() == Some(&Token::Ellipsis) {
                self.bump()?;
                true
            } else {
                false
            };
            let ty = self.parse_type()?;
            let optional = if self.peek() == Some(&Token::Question) {
                self.bump()?;
                true
            } else {
                false
            };
            elems.push(TupleElem { ty, optional, rest });
            match self.bump()? {
                Token::Comma => continue,
                Token::RBracket => break,
                other => return Err(self.unexpected(&other)),
            }
        }
        Ok(TypeExpr::Tuple(elems))
    }
}

impl TypeExpr {
    /// Parse a textual type expression.
    pub fn parse(text: &str) -> Result<TypeExpr, TypeParseError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ty = parser.parse_type()?;
        if let Some(extra) = parser.peek() {
            let extra = extra.clone();
            return Err(parser.unexpected(&extra));
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_names() {
        assert_eq!(TypeExpr::parse("string").unwrap(), TypeExpr::name("string"));
        assert_eq!(TypeExpr::parse("Animal").unwrap(), TypeExpr::name("Animal"));
    }

    #[test]
    fn parses_generics_and_arrays() {
        assert_eq!(
            TypeExpr::parse("Promise<number>").unwrap(),
            TypeExpr::generic("Promise", vec![TypeExpr::name("number")])
        );
        assert_eq!(
            TypeExpr::parse("string[][]").unwrap(),
            TypeExpr::array(TypeExpr::array(TypeExpr::name("string")))
        );
        assert_eq!(
            TypeExpr::parse("Record<string, number>").unwrap(),
            TypeExpr::generic(
                "Record",
                vec![TypeExpr::name("string"), TypeExpr::name("number")]
            )
        );
    }

    #[test]
    fn string_literals_keep_non_ascii_characters() {
        assert_eq!(
            TypeExpr::parse("\"héllo\"").unwrap(),
            TypeExpr::StringLiteral("héllo".into())
        );
        assert_eq!(
            TypeExpr::parse("'日本' | 'ok'").unwrap(),
            TypeExpr::union(vec![
                TypeExpr::StringLiteral("日本".into()),
                TypeExpr::StringLiteral("ok".into()),
            ])
        );
    }

    #[test]
    fn non_ascii_outside_strings_is_rejected() {
        let err = TypeExpr::parse("strïng").unwrap_err();
        assert_eq!(err.kind, TypeParseErrorKind::UnexpectedCharacter('ï'));
    }

    #[test]
    fn parses_unions_and_intersections() {
        assert_eq!(
            TypeExpr::parse("string | null").unwrap(),
            TypeExpr::union(vec![TypeExpr::name("string"), TypeExpr::name("null")])
        );
        assert_eq!(
            TypeExpr::parse("A & B | C").unwrap(),
            TypeExpr::union(vec![
                TypeExpr::Intersection(vec![TypeExpr::name("A"), TypeExpr::name("B")]),
                TypeExpr::name("C"),
            ])
        );
    }

    #[test]
    fn parses_parenthesized_union_array() {
        assert_eq!(
            TypeExpr::parse("(string | number)[]").unwrap(),
            TypeExpr::array(TypeExpr::union(vec![
                TypeExpr::name("string"),
                TypeExpr::name("number")
            ]))
        );
    }

    #[test]
    fn parses_function_types() {
        let ty = TypeExpr::parse("(x: number, y) => string").unwrap();
        match ty {
            TypeExpr::Function { params, ret } => {
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name.as_deref(), Some("x"));
                assert_eq!(params[0].ty, Some(TypeExpr::name("number")));
                assert_eq!(params[1].name.as_deref(), Some("y"));
                assert_eq!(params[1].ty, None);
                assert_eq!(*ret, TypeExpr::name("string"));
            }
            other => panic!("expected function type, got {other:?}"),
        }
        assert!(matches!(
            TypeExpr::parse("() => void").unwrap(),
            TypeExpr::Function { .. }
        ));
    }

    #[test]
    fn parses_tuples() {
        let ty = TypeExpr::parse("[string, number?, ...boolean[]]").unwrap();
        match ty {
            TypeExpr::Tuple(elems) => {
                assert_eq!(elems.len(), 3);
                assert!(!elems[0].optional && !elems[0].rest);
                assert!(elems[1].optional);
                assert!(elems[2].rest);
            }
            other => panic!("expected tuple, got {other:?}"),
        }
    }

    #[test]
    fn parses_literal_types() {
        assert_eq!(
            TypeExpr::parse("\"ok\"").unwrap(),
            TypeExpr::StringLiteral("ok".into())
        );
        assert_eq!(
            TypeExpr::parse("42").unwrap(),
            TypeExpr::NumberLiteral("42".into())
        );
        assert_eq!(TypeExpr::parse("true").unwrap(), TypeExpr::BooleanLiteral(true));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in [
            "string",
            "Promise<number>",
            "string[]",
            "(string | number)[]",
            "string | null",
            "[string, number?]",
            "Record<string, number>",
        ] {
            let parsed = TypeExpr::parse(text).unwrap();
            let reparsed = TypeExpr::parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {text}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(TypeExpr::parse("string |").is_err());
        assert!(TypeExpr::parse("Promise<").is_err());
        assert!(TypeExpr::parse("#foo").is_err());
        assert!(TypeExpr::parse("\"unterminated").is_err());
    }
}
