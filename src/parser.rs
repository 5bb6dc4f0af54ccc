//! Recursive-descent parser over the scanner's token stream, per spec.md
//! §4.2. One token of lookahead; synchronizes on error so a single run can
//! report multiple syntax errors.
//!
//! ```text
//! program     -> declaration* EOF
//! declaration -> classDecl | funDecl | varDecl | statement
//! classDecl   -> "class" IDENT ( "<" IDENT )? "{" function* "}"
//! funDecl     -> "fun" function
//! function    -> IDENT "(" parameters? ")" block
//! parameters  -> IDENT ("," IDENT)*
//! varDecl     -> "var" IDENT ( "=" expression )? ";"
//! statement   -> exprStmt | printStmt | assertStmt | block
//!              | ifStmt | whileStmt | forStmt | returnStmt
//! block       -> "{" declaration* "}"
//! ifStmt      -> "if" "(" expression ")" statement ( "else" statement )?
//! whileStmt   -> "while" "(" expression ")" statement
//! forStmt     -> "for" "(" ( varDecl | exprStmt | ";" )
//!                       expression? ";" expression? ")" statement
//! returnStmt  -> "return" expression? ";"
//! assertStmt  -> "assert" expression ";"
//! expression  -> assignment
//! assignment  -> ( call "." )? IDENT "=" assignment | logic_or
//! logic_or    -> logic_and ( "or" logic_and )*
//! logic_and   -> equality ( "and" equality )*
//! equality    -> comparison ( ("!=" | "==") comparison )*
//! comparison  -> term ( (">" | ">=" | "<" | "<=") term )*
//! term        -> factor ( ("-" | "+") factor )*
//! factor      -> unary ( ("/" | "*") unary )*
//! unary       -> ( "!" | "-" ) unary | call
//! call        -> primary ( "(" arguments? ")" | "." IDENT )*
//! primary     -> NUMBER | STRING | "true" | "false" | "nil" | "this"
//!              | IDENT | "(" expression ")" | "super" "." IDENT
//! arguments   -> expression ("," expression)*
//! ```

use std::rc::Rc;

use crate::error::{Error, ParseError};
use crate::expr::Expr;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Literal, Token, TokenKind};

type ParseResult<T> = Result<T, ParseError>;

const MAX_ARGS: usize = 255;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0, next_id: 0 }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Parses the whole token stream into a sequence of statements.
    /// Errors are reported and skipped via synchronization; the returned
    /// vector holds only the statements that parsed successfully.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    // --- token stream primitives ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|&k| self.check(k)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }

        Err(ParseError { token: self.peek().clone(), message: message.to_string() })
    }

    fn error(&self, token: &Token, message: &str) -> ParseError {
        ParseError { token: token.clone(), message: message.to_string() }
    }

    /// Discards tokens until after a semicolon or just before a
    /// statement-starting keyword, per spec.md §4.2.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Class | TokenKind::Fun | TokenKind::Var | TokenKind::For
                | TokenKind::If | TokenKind::While | TokenKind::Print | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // --- declarations ---

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(&[TokenKind::Class]) {
            self.class_declaration()
        } else if self.matches(&[TokenKind::Fun]) {
            self.function("function").map(Stmt::Function)
        } else if self.matches(&[TokenKind::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                error.throw();
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect class name")?.clone();

        let superclass = if self.matches(&[TokenKind::Less]) {
            self.consume(TokenKind::Identifier, "Expect superclass name")?;
            let id = self.next_id();
            Some(Expr::Variable { id, name: self.previous().clone() })
        } else {
            None
        };

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body")?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenKind::RightBrace, "Expect '}' after class body")?;

        Ok(Stmt::Class(name, superclass, methods))
    }

    fn function(&mut self, kind: &str) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name"))?.clone();

        self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name"))?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    let token = self.peek().clone();
                    return Err(self.error(&token, "Cannot have more than 255 parameters"));
                }

                params.push(self.consume(TokenKind::Identifier, "Expect parameter name")?.clone());

                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightParen, "Expect ')' after parameters")?;
        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body"))?;

        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name")?.clone();

        let initializer = if self.matches(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration")?;
        Ok(Stmt::Var(name, initializer))
    }

    // --- statements ---

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.matches(&[TokenKind::For]) {
            return self.for_statement();
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.matches(&[TokenKind::Print]) {
            return self.print_statement();
        }
        if self.matches(&[TokenKind::Assert]) {
            return self.assert_statement();
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement();
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.matches(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(self.block()?));
        }

        self.expression_statement()
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'")?;

        let initializer = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.matches(&[TokenKind::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expect ')' after loop clauses")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let id = self.next_id();
        let condition = condition.unwrap_or(Expr::Literal { id, value: Literal::Bool(true) });
        body = Stmt::While(condition, Box::new(body));

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(condition, then_branch, else_branch))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value")?;
        Ok(Stmt::Print(expr))
    }

    fn assert_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after assertion")?;
        Ok(Stmt::Assert(keyword, expr))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "Expect ';' after return value")?;
        Ok(Stmt::Return(keyword, value))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition")?;
        let body = self.statement()?;

        Ok(Stmt::While(condition, Box::new(body)))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenKind::RightBrace, "Expect '}' after block")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression")?;
        Ok(Stmt::Expression(expr))
    }

    // --- expressions ---

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.matches(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => {
                    let id = self.next_id();
                    Ok(Expr::Assign { id, name, value: Box::new(value) })
                }
                Expr::Get { object, name, .. } => {
                    let id = self.next_id();
                    Ok(Expr::Set { id, object, name, value: Box::new(value) })
                }
                other => {
                    self.error(&equals, "Invalid assignment target").throw();
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while self.matches(&[TokenKind::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            let id = self.next_id();
            expr = Expr::Logical { id, left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.matches(&[TokenKind::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            let id = self.next_id();
            expr = Expr::Logical { id, left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while self.matches(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            let id = self.next_id();
            expr = Expr::Binary { id, left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while self.matches(&[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            let id = self.next_id();
            expr = Expr::Binary { id, left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while self.matches(&[TokenKind::Minus, TokenKind::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            let id = self.next_id();
            expr = Expr::Binary { id, left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    /// Left-associative: each iteration parses a fresh `unary()` for the
    /// right operand. (A draft that recursed into `factor()` here instead
    /// would make `/`/`*` right-associative — spec.md §4.2/§9 call this
    /// out as a bug to avoid.)
    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while self.matches(&[TokenKind::Slash, TokenKind::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            let id = self.next_id();
            expr = Expr::Binary { id, left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            let id = self.next_id();
            return Ok(Expr::Unary { id, operator, right: Box::new(right) });
        }

        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.matches(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'")?.clone();
                let id = self.next_id();
                expr = Expr::Get { id, object: Box::new(expr), name };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let token = self.peek().clone();
                    self.error(&token, "Cannot have more than 255 arguments").throw();
                }

                arguments.push(self.expression()?);

                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments")?.clone();
        let id = self.next_id();
        Ok(Expr::Call { id, callee: Box::new(callee), paren, arguments })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.matches(&[TokenKind::False]) {
            let id = self.next_id();
            return Ok(Expr::Literal { id, value: Literal::Bool(false) });
        }
        if self.matches(&[TokenKind::True]) {
            let id = self.next_id();
            return Ok(Expr::Literal { id, value: Literal::Bool(true) });
        }
        if self.matches(&[TokenKind::Nil]) {
            let id = self.next_id();
            return Ok(Expr::Literal { id, value: Literal::Nil });
        }
        if self.matches(&[TokenKind::Number, TokenKind::String]) {
            let literal = self.previous().literal.clone().expect("number/string token to carry a literal");
            let id = self.next_id();
            return Ok(Expr::Literal { id, value: literal });
        }
        if self.matches(&[TokenKind::Super]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Dot, "Expect '.' after 'super'")?;
            let method = self.consume(TokenKind::Identifier, "Expect superclass method name")?.clone();
            let id = self.next_id();
            return Ok(Expr::Super { id, keyword, method });
        }
        if self.matches(&[TokenKind::This]) {
            let keyword = self.previous().clone();
            let id = self.next_id();
            return Ok(Expr::This { id, keyword });
        }
        if self.matches(&[TokenKind::Identifier]) {
            let name = self.previous().clone();
            let id = self.next_id();
            return Ok(Expr::Variable { id, name });
        }
        if self.matches(&[TokenKind::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression")?;
            let id = self.next_id();
            return Ok(Expr::Grouping { id, expr: Box::new(expr) });
        }

        Err(self.error(self.peek(), "Expect expression"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens = Scanner::new(source).scan_tokens();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let stmts = parse("1 + 2 * 3;");
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Expression(Expr::Binary { operator, right, .. }) => {
                assert_eq!(operator.kind, TokenKind::Plus);
                assert!(matches!(**right, Expr::Binary { .. }));
            }
            other => panic!("expected a binary expression statement, got {other:?}"),
        }
    }

    #[test]
    fn factor_is_left_associative() {
        // 8 / 4 / 2 must parse as (8 / 4) / 2, not 8 / (4 / 2).
        let stmts = parse("8 / 4 / 2;");
        match &stmts[0] {
            Stmt::Expression(Expr::Binary { left, .. }) => {
                assert!(matches!(**left, Expr::Binary { .. }));
            }
            other => panic!("expected a binary expression statement, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_desugars_to_while() {
        let stmts = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Block(inner) => {
                assert_eq!(inner.len(), 2);
                assert!(matches!(inner[0], Stmt::Var(..)));
                assert!(matches!(inner[1], Stmt::While(..)));
            }
            other => panic!("expected desugared block, got {other:?}"),
        }
    }

    #[test]
    fn missing_for_condition_becomes_true_literal() {
        let stmts = parse("for (;;) print 1;");
        match &stmts[0] {
            Stmt::While(Expr::Literal { value, .. }, _) => assert_eq!(*value, Literal::Bool(true)),
            other => panic!("expected a while with a literal condition, got {other:?}"),
        }
    }

    #[test]
    fn invalid_assignment_target_reports_without_consuming() {
        crate::error::reset_error();
        let stmts = parse("1 = 2;");
        assert!(crate::error::did_error());
        assert_eq!(stmts.len(), 1);
        crate::error::reset_error();
    }

    #[test]
    fn class_with_superclass() {
        let stmts = parse("class B < A {}");
        match &stmts[0] {
            Stmt::Class(name, Some(Expr::Variable { name: super_name, .. }), methods) => {
                assert_eq!(name.lexeme, "B");
                assert_eq!(super_name.lexeme, "A");
                assert!(methods.is_empty());
            }
            other => panic!("expected a class declaration, got {other:?}"),
        }
    }
}
