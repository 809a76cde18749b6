pub mod ast;

use crate::parser::ast::{
    BinaryOperator, ByteRange, ClassDeclaration, CodeBlock, Declaration, Expression,
    ExpressionStatement, FunctionDeclaration, Identifier, IdentifierExpression, IfElseStatement,
    MethodDeclaration, ReturnStatement, Statement,
};
use crate::scanner::{Scanner, Token, TokenDiscriminant, TokenType};
use multipeek::{multipeek, MultiPeek};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub range: ByteRange,
}

impl ParseError {
    fn at(token: &Token, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: token.line(),
            column: token.column(),
            range: token.span(),
        }
    }
}

/// Parse a whole fun source file as a single code block.
pub fn parse_source(source: &str) -> Result<CodeBlock, ParseError> {
    Parser::parse(Scanner::new(source))
}

/// Parse the declaration that starts at byte `offset` of `source`.
///
/// Returns the declaration together with the byte range it spans; the text after the
/// declaration's closing brace is never looked at.
pub fn parse_declaration_at(
    source: &str,
    offset: usize,
) -> Result<(Declaration, ByteRange), ParseError> {
    Parser::parse_declaration(Scanner::starting_at(source, offset))
}

pub struct Parser<TokenIter>
where
    TokenIter: Iterator<Item = Token>,
{
    tokens: MultiPeek<TokenIter>,
    previous: Option<Token>,
}

impl<TokenIter> Parser<TokenIter>
where
    TokenIter: Iterator<Item = Token>,
{
    fn new(tokens: TokenIter) -> Self {
        Self {
            tokens: multipeek(tokens),
            previous: None,
        }
    }

    pub fn parse(tokens: TokenIter) -> Result<CodeBlock, ParseError> {
        let mut parser = Self::new(tokens);
        let block = parser.block()?;
        parser.expect(TokenDiscriminant::Eof)?;
        Ok(block)
    }

    pub fn parse_declaration(tokens: TokenIter) -> Result<(Declaration, ByteRange), ParseError> {
        let mut parser = Self::new(tokens);
        let start = parser.tokens.peek().map(|t| t.span().start).unwrap_or(0);
        let declaration = parser.declaration()?;
        let end = parser
            .previous
            .as_ref()
            .map(|t| t.span().end)
            .unwrap_or(start);
        Ok((declaration, ByteRange::new(start, end)))
    }

    fn block(&mut self) -> Result<CodeBlock, ParseError> {
        let mut statements = vec![];
        while !matches!(
            self.peek_discriminant(),
            TokenDiscriminant::RightBrace | TokenDiscriminant::Eof
        ) {
            statements.push(self.statement()?);
        }
        Ok(CodeBlock(statements))
    }

    fn braced_block(&mut self) -> Result<CodeBlock, ParseError> {
        self.expect(TokenDiscriminant::LeftBrace)?;
        let block = self.block()?;
        self.expect(TokenDiscriminant::RightBrace)?;
        Ok(block)
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_discriminant() {
            TokenDiscriminant::If => {
                self.advance();
                self.if_else_statement().map(Statement::IfElse)
            }
            TokenDiscriminant::Backslash => self.declaration().map(Statement::Declaration),
            TokenDiscriminant::Return => {
                self.advance();
                let value = self.expression()?;
                self.expect(TokenDiscriminant::Semicolon)?;
                Ok(Statement::Return(ReturnStatement { value }))
            }
            _ => {
                let expr = self.expression()?;
                self.expect(TokenDiscriminant::Semicolon)?;
                Ok(Statement::Expression(ExpressionStatement(expr)))
            }
        }
    }

    /// Parses everything after the `if` keyword.
    fn if_else_statement(&mut self) -> Result<IfElseStatement, ParseError> {
        let condition = self.expression()?;
        let if_branch = self.braced_block()?;
        let mut else_branch = None;
        if self.advance_on_match(&[TokenDiscriminant::Else]).is_some() {
            else_branch = match self.peek_discriminant() {
                TokenDiscriminant::LeftBrace => Some(self.braced_block()?),
                TokenDiscriminant::If => {
                    self.advance();
                    let nested = self.if_else_statement()?;
                    Some(CodeBlock(vec![Statement::IfElse(nested)]))
                }
                _ => {
                    return Err(
                        self.unexpected(&[TokenDiscriminant::LeftBrace, TokenDiscriminant::If])
                    )
                }
            };
        }
        Ok(IfElseStatement {
            condition,
            if_branch,
            else_branch,
        })
    }

    fn declaration(&mut self) -> Result<Declaration, ParseError> {
        self.expect(TokenDiscriminant::Backslash)?;
        let keyword = self.expect(TokenDiscriminant::Identifier)?;
        match keyword.lexeme() {
            "class" => {
                self.expect(TokenDiscriminant::LeftBrace)?;
                let name = self.identifier()?;
                self.expect(TokenDiscriminant::RightBrace)?;
                let body = self.braced_block()?;
                Ok(Declaration::Class(ClassDeclaration { name, body }))
            }
            "fun" => {
                self.expect(TokenDiscriminant::LeftBrace)?;
                let first = self.identifier()?;
                let method_name = if self
                    .advance_on_match(&[TokenDiscriminant::ColonColon])
                    .is_some()
                {
                    Some(self.identifier()?)
                } else {
                    None
                };
                self.expect(TokenDiscriminant::RightBrace)?;
                let parameters = self.parameters()?;
                let body = self.braced_block()?;
                Ok(match method_name {
                    Some(name) => Declaration::Method(MethodDeclaration {
                        class: first,
                        name,
                        parameters,
                        body,
                    }),
                    None => Declaration::Function(FunctionDeclaration {
                        name: first,
                        parameters,
                        body,
                    }),
                })
            }
            other => Err(ParseError::at(
                &keyword,
                format!("expected `class` or `fun`, found `{other}`"),
            )),
        }
    }

    fn parameters(&mut self) -> Result<Vec<Identifier>, ParseError> {
        self.expect(TokenDiscriminant::LeftBrace)?;
        let mut parameters = vec![];
        if self.peek_discriminant() != TokenDiscriminant::RightBrace {
            loop {
                parameters.push(self.identifier()?);
                if self.advance_on_match(&[TokenDiscriminant::Comma]).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenDiscriminant::RightBrace)?;
        Ok(parameters)
    }

    fn identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = self.expect(TokenDiscriminant::Identifier)?;
        Ok(Identifier::with_range(token.lexeme(), token.span()))
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.binary()?;

        let Some(operator) =
            self.advance_on_match(&[TokenDiscriminant::Equal, TokenDiscriminant::ColonEqual])
        else {
            return Ok(expr);
        };
        let Expression::Identifier(IdentifierExpression { identifier }) = expr else {
            let message = if operator.discriminant() == TokenDiscriminant::ColonEqual {
                "`:=` must follow an identifier"
            } else {
                "invalid assignment target"
            };
            return Err(ParseError::at(&operator, message));
        };
        // Assignments are right-associative: `a = b := c` assigns the result of `b := c`.
        let value = self.expression()?;
        if operator.discriminant() == TokenDiscriminant::ColonEqual {
            Ok(Expression::declare_assignment(identifier, value))
        } else {
            Ok(Expression::assignment(Expression::identifier(identifier), value))
        }
    }

    /// All binary operators share one precedence level and associate to the left.
    fn binary(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.call()?;

        while let Some(operator) = self.advance_on_match(&[
            TokenDiscriminant::Plus,
            TokenDiscriminant::Minus,
            TokenDiscriminant::Star,
            TokenDiscriminant::Slash,
        ]) {
            let operator = match operator.discriminant() {
                TokenDiscriminant::Plus => BinaryOperator::Add,
                TokenDiscriminant::Minus => BinaryOperator::Subtract,
                TokenDiscriminant::Star => BinaryOperator::Multiply,
                _ => BinaryOperator::Divide,
            };
            expr = Expression::binary(expr, operator, self.call()?);
        }
        Ok(expr)
    }

    fn call(&mut self) -> Result<Expression, ParseError> {
        let mut callee = self.primary()?;

        while self
            .advance_on_match(&[TokenDiscriminant::LeftParen])
            .is_some()
        {
            callee = self.finish_call(callee)?;
        }
        Ok(callee)
    }

    fn finish_call(&mut self, callee: Expression) -> Result<Expression, ParseError> {
        let mut arguments = vec![];
        if self.peek_discriminant() != TokenDiscriminant::RightParen {
            loop {
                arguments.push(self.expression()?);
                if self.advance_on_match(&[TokenDiscriminant::Comma]).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenDiscriminant::RightParen)?;
        Ok(Expression::call(callee, arguments))
    }

    fn primary(&mut self) -> Result<Expression, ParseError> {
        match self.peek_discriminant() {
            TokenDiscriminant::String
            | TokenDiscriminant::Number
            | TokenDiscriminant::Identifier => {
                let token = self.advance();
                Ok(match token.ty() {
                    TokenType::String(s) => Expression::string(s.clone()),
                    TokenType::Number(n) => Expression::number(*n),
                    _ => Expression::identifier(Identifier::with_range(
                        token.lexeme(),
                        token.span(),
                    )),
                })
            }
            TokenDiscriminant::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenDiscriminant::RightParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected(&[
                TokenDiscriminant::String,
                TokenDiscriminant::Number,
                TokenDiscriminant::Identifier,
                TokenDiscriminant::LeftParen,
            ])),
        }
    }

    fn advance_on_match(&mut self, token_types: &[TokenDiscriminant]) -> Option<Token> {
        if token_types.contains(&self.peek_discriminant()) {
            return Some(self.advance());
        }
        None
    }

    fn expect(&mut self, token_type: TokenDiscriminant) -> Result<Token, ParseError> {
        match self.advance_on_match(&[token_type]) {
            Some(t) => Ok(t),
            None => Err(self.unexpected(&[token_type])),
        }
    }

    /// Build an error describing the upcoming token, which is consumed.
    fn unexpected(&mut self, expected: &[TokenDiscriminant]) -> ParseError {
        let found = self.advance();
        if let TokenType::SyntaxError { error_msg } = found.ty() {
            return ParseError::at(&found, error_msg.clone());
        }
        let expected = expected
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        ParseError::at(
            &found,
            format!("expected {expected}, found {}", found.discriminant()),
        )
    }

    fn advance(&mut self) -> Token {
        let token = match self.tokens.next() {
            Some(t) => t,
            None => Token::end_of_input(self.previous.as_ref()),
        };
        self.previous = Some(token.clone());
        token
    }

    fn peek_discriminant(&mut self) -> TokenDiscriminant {
        self.tokens
            .peek()
            .map(Token::discriminant)
            .unwrap_or(TokenDiscriminant::Eof)
    }
}
