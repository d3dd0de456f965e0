use ir::{
    Assignment, Block, Expression, For, FunctionDefinition, Ident, If, Object, Statement,
    VariableDeclaration,
};

use crate::{
    lexer::{Lexer, Token},
    ParseError,
};

/// Parses a whole compilation unit: `object "name" { code { ... } ... }`.
pub fn parse_object(input: &str) -> Result<Object, ParseError> {
    let mut parser = Parser::new(input);
    let object = parser.object()?;
    parser.expect_eof()?;
    Ok(object)
}

/// Parses a single braced block, for tests operating below the object level.
pub fn parse_block(input: &str) -> Result<Block, ParseError> {
    let mut parser = Parser::new(input);
    let block = parser.block()?;
    parser.expect_eof()?;
    Ok(block)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
        }
    }

    fn object(&mut self) -> Result<Object, ParseError> {
        self.expect(&Token::Object, "`object`")?;
        let name = match self.next("an object name")? {
            (Token::Str(name), _) => name,
            (token, at) => return Err(self.unexpected("an object name", &token, at)),
        };
        self.expect(&Token::LBrace, "`{`")?;

        let mut object = Object::new(name);
        if matches!(self.peek()?, Some(Token::Code)) {
            self.next("`code`")?;
            object.code = Some(self.block()?);
        }
        while matches!(self.peek()?, Some(Token::Object)) {
            object.sub_objects.push(self.object()?);
        }
        self.expect(&Token::RBrace, "`}`")?;
        Ok(object)
    }

    fn block(&mut self) -> Result<Block, ParseError> {
        self.expect(&Token::LBrace, "`{`")?;
        let mut block = Block::default();
        while !matches!(self.peek()?, Some(Token::RBrace)) {
            block.statements.push(self.statement()?);
        }
        self.expect(&Token::RBrace, "`}`")?;
        Ok(block)
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_or_eof("a statement")?.clone() {
            Token::LBrace => Ok(Statement::Block(self.block()?)),
            Token::Let => self.variable_declaration(),
            Token::Function => self.function_definition(),
            Token::If => {
                self.next("`if`")?;
                let condition = self.expression()?;
                let body = self.block()?;
                Ok(Statement::If(If { condition, body }))
            }
            Token::For => {
                self.next("`for`")?;
                let init = self.block()?;
                let condition = self.expression()?;
                let update = self.block()?;
                let body = self.block()?;
                Ok(Statement::For(For {
                    init,
                    condition,
                    update,
                    body,
                }))
            }
            Token::Ident(_) => self.assignment_or_call(),
            _ => {
                let (token, at) = self.next("a statement")?;
                Err(self.unexpected("a statement", &token, at))
            }
        }
    }

    fn variable_declaration(&mut self) -> Result<Statement, ParseError> {
        self.next("`let`")?;
        let variables = self.ident_list()?;
        let values = if matches!(self.peek()?, Some(Token::Walrus)) {
            self.next("`:=`")?;
            self.expression_list()?
        } else {
            Vec::new()
        };
        Ok(Statement::VariableDeclaration(VariableDeclaration {
            variables,
            values,
        }))
    }

    fn function_definition(&mut self) -> Result<Statement, ParseError> {
        self.next("`function`")?;
        let name = self.expect_ident("a function name")?;
        self.expect(&Token::LParen, "`(`")?;
        let parameters = if matches!(self.peek()?, Some(Token::RParen)) {
            Vec::new()
        } else {
            self.ident_list()?
        };
        self.expect(&Token::RParen, "`)`")?;
        let returns = if matches!(self.peek()?, Some(Token::Arrow)) {
            self.next("`->`")?;
            self.ident_list()?
        } else {
            Vec::new()
        };
        let body = self.block()?;
        Ok(Statement::FunctionDefinition(FunctionDefinition {
            name,
            parameters,
            returns,
            body,
        }))
    }

    /// Disambiguates `f(...)` (a call statement) from `a, b := ...` after the
    /// leading identifier has been seen.
    fn assignment_or_call(&mut self) -> Result<Statement, ParseError> {
        let first = self.expect_ident("an identifier")?;
        if matches!(self.peek()?, Some(Token::LParen)) {
            return Ok(Statement::Expression(self.call_tail(first)?));
        }
        if matches!(self.peek()?, Some(Token::Comma | Token::Walrus)) {
            let mut targets = vec![first];
            while matches!(self.peek()?, Some(Token::Comma)) {
                self.next("`,`")?;
                targets.push(self.expect_ident("an assignment target")?);
            }
            self.expect(&Token::Walrus, "`:=`")?;
            let values = self.expression_list()?;
            return Ok(Statement::Assignment(Assignment { targets, values }));
        }
        let (token, at) = self.next("`:=` or `(`")?;
        Err(self.unexpected("`:=` or `(`", &token, at))
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        match self.next("an expression")? {
            (Token::Number(value), _) => Ok(Expression::Literal(value)),
            (Token::Ident(name), _) => {
                if matches!(self.peek()?, Some(Token::LParen)) {
                    self.call_tail(name)
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            (token, at) => Err(self.unexpected("an expression", &token, at)),
        }
    }

    fn call_tail(&mut self, function: Ident) -> Result<Expression, ParseError> {
        self.expect(&Token::LParen, "`(`")?;
        let arguments = if matches!(self.peek()?, Some(Token::RParen)) {
            Vec::new()
        } else {
            self.expression_list()?
        };
        self.expect(&Token::RParen, "`)`")?;
        Ok(Expression::call(function, arguments))
    }

    fn ident_list(&mut self) -> Result<Vec<Ident>, ParseError> {
        let mut names = vec![self.expect_ident("an identifier")?];
        while matches!(self.peek()?, Some(Token::Comma)) {
            self.next("`,`")?;
            names.push(self.expect_ident("an identifier")?);
        }
        Ok(names)
    }

    fn expression_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut expressions = vec![self.expression()?];
        while matches!(self.peek()?, Some(Token::Comma)) {
            self.next("`,`")?;
            expressions.push(self.expression()?);
        }
        Ok(expressions)
    }

    fn peek(&mut self) -> Result<Option<&Token>, ParseError> {
        Ok(self.lexer.peek_token()?.map(|(token, _)| token))
    }

    fn peek_or_eof(&mut self, expected: &str) -> Result<&Token, ParseError> {
        match self.lexer.peek_token()? {
            Some((token, _)) => Ok(token),
            None => Err(ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }),
        }
    }

    fn next(&mut self, expected: &str) -> Result<(Token, usize), ParseError> {
        self.lexer
            .next_token()?
            .ok_or_else(|| ParseError::UnexpectedEof {
                expected: expected.to_string(),
            })
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ParseError> {
        let (found, at) = self.next(what)?;
        if &found == token {
            Ok(())
        } else {
            Err(self.unexpected(what, &found, at))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<Ident, ParseError> {
        match self.next(what)? {
            (Token::Ident(name), _) => Ok(name),
            (token, at) => Err(self.unexpected(what, &token, at)),
        }
    }

    fn expect_eof(&mut self) -> Result<(), ParseError> {
        match self.lexer.next_token()? {
            None => Ok(()),
            Some((token, at)) => Err(self.unexpected("end of input", &token, at)),
        }
    }

    fn unexpected(&self, expected: &str, found: &Token, at: usize) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use ir::{writer::dump_block, AstWriter};

    use super::*;

    fn roundtrip_object(source: &str) -> String {
        let object = parse_object(source).unwrap_or_else(|err| panic!("parse failed: {err}"));
        let printed = AstWriter::new(&object).dump_string();
        let reparsed =
            parse_object(&printed).unwrap_or_else(|err| panic!("reparse failed: {err}"));
        assert_eq!(AstWriter::new(&reparsed).dump_string(), printed);
        printed
    }

    #[test]
    fn roundtrips_canonical_form() {
        let source = r#"object "unit" {
    code {
        {
            mstore(64, 128)
        }
        function f(a, b) -> r {
            let x, y := g(a), 1
            x, y := y, x
            if x {
                r := add(x, b)
            }
            for {
                let i := 0
            } i {
                i := add(i, 1)
            } {
                sstore(i, y)
            }
        }
        function g(v) -> w { }
    }
    object "sub" {
        code { }
    }
}
"#;
        assert_eq!(roundtrip_object(source), source);
    }

    #[test]
    fn parses_hex_literals() {
        let block = parse_block("{ let x := 0x80 }").unwrap();
        assert_eq!(dump_block(&block), "{\n    let x := 128\n}");
    }

    #[test]
    fn parses_declaration_without_value() {
        let block = parse_block("{ let a, b }").unwrap();
        let Statement::VariableDeclaration(decl) = &block.statements[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(decl.variables.len(), 2);
        assert!(decl.values.is_empty());
    }

    #[test]
    fn ignores_comments() {
        let block = parse_block("{ // reserve scratch space\n let x := 1 }").unwrap();
        assert_eq!(block.statements.len(), 1);
    }

    #[test]
    fn rejects_bare_identifier_statement() {
        let err = parse_block("{ x }").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn rejects_unterminated_block() {
        let err = parse_block("{ let x := 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }
}
