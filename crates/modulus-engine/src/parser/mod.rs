// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Recursive descent parser producing the AST in [`crate::ast`].
//!
//! Statements live here; expressions, patterns and literals live in
//! `expressions.rs`. Semicolons are optional where a line break, a closing
//! brace or the end of input allows automatic insertion.

mod expressions;

use crate::Error;
use crate::ast::*;
use crate::lexer::{Scanner, Span, Token, TokenKind};
use std::rc::Rc;

/// A recursive descent parser.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    previous: Token,
    /// Full source used for line/column reporting
    origin: &'a str,
    /// Byte offset of `scanner`'s text inside `origin`
    offset: usize,
    /// Disallows the `in` operator (for-loop heads)
    no_in: bool,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self::with_origin(source, source, 0)
    }

    /// Creates a parser over a slice of a larger source, so that errors
    /// report positions in the enclosing text.
    pub(crate) fn with_origin(source: &'a str, origin: &'a str, offset: usize) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            scanner,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0)),
            origin,
            offset,
            no_in: false,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program, Error> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement, Error> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let declaration = self.parse_variable_declaration()?;
                self.consume_semicolon()?;
                Ok(Statement::VariableDeclaration(declaration))
            }
            TokenKind::Function => {
                self.advance();
                let function = self.parse_function_rest(true)?;
                Ok(Statement::FunctionDeclaration(function))
            }
            TokenKind::Class => {
                self.advance();
                let class = self.parse_class_rest(true)?;
                Ok(Statement::ClassDeclaration(class))
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Continue)
            }
            TokenKind::Throw => {
                self.advance();
                if self.current.newline_before {
                    return Err(self.error("Illegal newline after throw"));
                }
                let argument = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::Throw(argument))
            }
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Statement::Block(self.parse_block_body()?))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration, Error> {
        let kind = self.parse_variable_kind()?;
        let mut declarations = Vec::new();

        loop {
            let id = self.parse_binding_pattern()?;
            let init = if self.eat(&TokenKind::Equal) {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            // In a `for` head the loop form decides whether one is needed
            if init.is_none() && !matches!(id, Pattern::Identifier(_)) && !self.no_in {
                return Err(self.error("Missing initializer in destructuring declaration"));
            }
            if init.is_none() && kind == VariableKind::Const && !self.no_in {
                return Err(self.error("Missing initializer in const declaration"));
            }

            declarations.push(VariableDeclarator { id, init });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        Ok(VariableDeclaration { kind, declarations })
    }

    fn parse_variable_kind(&mut self) -> Result<VariableKind, Error> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => return Err(self.error("Expected variable keyword")),
        };
        self.advance();
        Ok(kind)
    }

    /// Parses everything after the `function` keyword.
    fn parse_function_rest(&mut self, require_name: bool) -> Result<Rc<FunctionNode>, Error> {
        let id = match &self.current.kind {
            TokenKind::Identifier(name) => {
                let id = Identifier::new(name);
                self.advance();
                Some(id)
            }
            _ if require_name => return Err(self.error("Function statements require a name")),
            _ => None,
        };

        self.parse_function_tail(id)
    }

    /// Parses `(params) { body }`.
    fn parse_function_tail(&mut self, id: Option<Identifier>) -> Result<Rc<FunctionNode>, Error> {
        self.expect(&TokenKind::LeftParen)?;
        let params = self.parse_parameters()?;
        self.expect(&TokenKind::LeftBrace)?;
        let body = self.parse_block_body()?;

        Ok(Rc::new(FunctionNode {
            id,
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
        }))
    }

    /// Parses a parameter list up to and including the closing parenthesis.
    fn parse_parameters(&mut self) -> Result<Vec<Param>, Error> {
        let mut params = Vec::new();

        while !self.check(&TokenKind::RightParen) {
            let rest = self.eat(&TokenKind::Ellipsis);
            let element = self.parse_binding_element()?;
            params.push(Param { element, rest });
            if rest {
                break;
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightParen)?;
        Ok(params)
    }

    /// Parses everything after the `class` keyword.
    fn parse_class_rest(&mut self, require_name: bool) -> Result<Rc<ClassNode>, Error> {
        let id = match &self.current.kind {
            TokenKind::Identifier(name) => {
                let id = Identifier::new(name);
                self.advance();
                Some(id)
            }
            _ if require_name => return Err(self.error("Class statements require a name")),
            _ => None,
        };

        let superclass = if self.eat(&TokenKind::Extends) {
            Some(self.parse_left_hand_side()?)
        } else {
            None
        };

        self.expect(&TokenKind::LeftBrace)?;

        let mut constructor = None;
        let mut methods = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }

            let is_static = self.check(&TokenKind::Static)
                && !matches!(self.peek_token().kind, TokenKind::LeftParen);
            if is_static {
                self.advance();
            }

            let key = self
                .property_name()
                .ok_or_else(|| self.error("Expected method name in class body"))?;
            self.advance();

            if !self.check(&TokenKind::LeftParen) {
                return Err(self.error("Class fields and accessors are not supported"));
            }

            let function = self.parse_function_tail(Some(Identifier { name: key.clone() }))?;

            if !is_static && &*key == "constructor" {
                if constructor.is_some() {
                    return Err(self.error("A class may only have one constructor"));
                }
                constructor = Some(function);
            } else {
                methods.push(ClassMethod {
                    key,
                    is_static,
                    function,
                });
            }
        }

        self.expect(&TokenKind::RightBrace)?;

        Ok(Rc::new(ClassNode {
            id,
            superclass,
            constructor,
            methods,
        }))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'switch'
        self.expect(&TokenKind::LeftParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        self.expect(&TokenKind::LeftBrace)?;

        let mut cases = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let test = if self.eat(&TokenKind::Case) {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::Colon)?;
                Some(expr)
            } else if self.eat(&TokenKind::Default) {
                self.expect(&TokenKind::Colon)?;
                None
            } else {
                return Err(self.error("Expected 'case' or 'default'"));
            };

            let mut consequent = Vec::new();
            while !self.check(&TokenKind::Case)
                && !self.check(&TokenKind::Default)
                && !self.check(&TokenKind::RightBrace)
                && !self.is_at_end()
            {
                consequent.push(self.parse_statement()?);
            }

            cases.push(SwitchCase { test, consequent });
        }

        self.expect(&TokenKind::RightBrace)?;

        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'do'
        let body = Box::new(self.parse_statement()?);
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        self.eat(&TokenKind::Semicolon);

        Ok(Statement::DoWhile(WhileStatement { test, body }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'for'
        self.expect(&TokenKind::LeftParen)?;

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if matches!(
            self.current.kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            self.no_in = true;
            let declaration = self.parse_variable_declaration();
            self.no_in = false;
            let declaration = declaration?;

            if let [single] = declaration.declarations.as_slice() {
                if single.init.is_none() {
                    if let Some(statement) =
                        self.parse_for_each_tail(ForEachTarget::Declaration(
                            declaration.kind,
                            single.id.clone(),
                        ))?
                    {
                        return Ok(statement);
                    }
                }
            }
            if declaration.kind == VariableKind::Const
                && declaration.declarations.iter().any(|d| d.init.is_none())
            {
                return Err(self.error("Missing initializer in const declaration"));
            }
            if declaration
                .declarations
                .iter()
                .any(|d| d.init.is_none() && !matches!(d.id, Pattern::Identifier(_)))
            {
                return Err(self.error("Missing initializer in destructuring declaration"));
            }
            Some(ForInit::Declaration(declaration))
        } else {
            self.no_in = true;
            let expression = self.parse_expression();
            self.no_in = false;
            let expression = expression?;

            if let Some(statement) =
                self.parse_for_each_tail(ForEachTarget::Expression(expression.clone()))?
            {
                return Ok(statement);
            }
            Some(ForInit::Expression(expression))
        };

        self.expect(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);

        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    /// Finishes a `for (x in obj)` / `for (x of list)` head if one follows.
    fn parse_for_each_tail(&mut self, left: ForEachTarget) -> Result<Option<Statement>, Error> {
        let is_in = self.check(&TokenKind::In);
        let is_of = self.check_identifier("of");
        if !is_in && !is_of {
            return Ok(None);
        }
        self.advance();

        let right = if is_of {
            self.parse_assignment()?
        } else {
            self.parse_expression()?
        };
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);

        let statement = ForEachStatement { left, right, body };
        Ok(Some(if is_of {
            Statement::ForOf(statement)
        } else {
            Statement::ForIn(statement)
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'return'
        let argument = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;

        Ok(Statement::Return(argument))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'try'
        self.expect(&TokenKind::LeftBrace)?;
        let block = self.parse_block_body()?;

        let handler = if self.eat(&TokenKind::Catch) {
            let param = if self.eat(&TokenKind::LeftParen) {
                let pattern = self.parse_binding_pattern()?;
                self.expect(&TokenKind::RightParen)?;
                Some(pattern)
            } else {
                None
            };
            self.expect(&TokenKind::LeftBrace)?;
            let body = self.parse_block_body()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            self.expect(&TokenKind::LeftBrace)?;
            Some(self.parse_block_body()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    /// Parses statements up to and including the closing brace.
    fn parse_block_body(&mut self) -> Result<Vec<Statement>, Error> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(body)
    }

    // ---- token helpers ----

    fn advance(&mut self) {
        let next = self.scanner.next_token();
        self.previous = std::mem::replace(&mut self.current, next);
    }

    fn peek_token(&self) -> Token {
        self.scanner.clone().next_token()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn check_identifier(&self, name: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(s) if s == name)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), Error> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("Expected {}", describe(kind))))
        }
    }

    fn expect_identifier(&mut self) -> Result<Identifier, Error> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let id = Identifier::new(name);
                self.advance();
                Ok(id)
            }
            _ => Err(self.error("Expected identifier")),
        }
    }

    /// Reads the current token as a property name without consuming it.
    fn property_name(&self) -> Option<Rc<str>> {
        match &self.current.kind {
            TokenKind::Identifier(name) | TokenKind::String(name) => Some(name.as_str().into()),
            TokenKind::Number(n) => Some(crate::runtime::number_to_string(*n).into()),
            kind => kind.keyword_str().map(Rc::from),
        }
    }

    /// Automatic semicolon insertion.
    fn consume_semicolon(&mut self) -> Result<(), Error> {
        if self.eat(&TokenKind::Semicolon) {
            return Ok(());
        }
        if self.check(&TokenKind::RightBrace) || self.is_at_end() || self.current.newline_before {
            return Ok(());
        }
        Err(self.error("Expected ';'"))
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn error(&self, message: &str) -> Error {
        let (line, column) = Scanner::line_column(self.origin, self.offset + self.current.span.start);
        let message = match &self.current.kind {
            TokenKind::Invalid(reason) => reason.clone(),
            TokenKind::Eof => format!("{}, found end of input", message),
            kind => format!("{}, found {}", message, describe(kind)),
        };
        Error::Syntax {
            message,
            line,
            column,
        }
    }
}

/// Human-readable token description for error messages.
fn describe(kind: &TokenKind) -> String {
    if let Some(word) = kind.keyword_str() {
        return format!("'{}'", word);
    }
    let text = match kind {
        TokenKind::Number(n) => return format!("number {}", crate::runtime::number_to_string(*n)),
        TokenKind::String(_) => "string",
        TokenKind::Template(_) => "template literal",
        TokenKind::Identifier(name) => return format!("identifier '{}'", name),
        TokenKind::LeftBrace => "'{'",
        TokenKind::RightBrace => "'}'",
        TokenKind::LeftParen => "'('",
        TokenKind::RightParen => "')'",
        TokenKind::LeftBracket => "'['",
        TokenKind::RightBracket => "']'",
        TokenKind::Semicolon => "';'",
        TokenKind::Comma => "','",
        TokenKind::Colon => "':'",
        TokenKind::Dot => "'.'",
        TokenKind::Arrow => "'=>'",
        TokenKind::Equal => "'='",
        TokenKind::Eof => "end of input",
        _ => return format!("{:?}", kind),
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source)
            .parse_program()
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
    }

    #[test]
    fn test_semicolon_insertion() {
        let program = parse("const a = 1\nconst b = 2\nexports.sum = a + b");
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_missing_semicolon_on_same_line() {
        let err = Parser::new("let a = 1 let b = 2").parse_program().unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, .. }), "{}", err);
    }

    #[test]
    fn test_return_before_newline_returns_undefined() {
        let program = parse("function f() {\n  return\n  42\n}");
        let Statement::FunctionDeclaration(function) = &program.body[0] else {
            panic!("expected function declaration");
        };
        let FunctionBody::Block(body) = &function.body else {
            panic!("expected block body");
        };
        assert_eq!(body[0], Statement::Return(None));
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_class_declaration() {
        let program = parse(
            "class Calculator extends Base {\n  constructor(name) { super(name); }\n  add(a, b) { return a + b; }\n  static create() { return new Calculator('x'); }\n}",
        );
        let Statement::ClassDeclaration(class) = &program.body[0] else {
            panic!("expected class");
        };
        assert_eq!(class.id.as_ref().map(|id| &*id.name), Some("Calculator"));
        assert!(class.superclass.is_some());
        assert!(class.constructor.is_some());
        assert_eq!(class.methods.len(), 2);
        assert!(!class.methods[0].is_static);
        assert!(class.methods[1].is_static);
    }

    #[test]
    fn test_for_of_and_for_in() {
        let program = parse("for (const x of xs) {}\nfor (let k in obj) {}\nfor (let i = 0; i < 3; i++) {}");
        assert!(matches!(program.body[0], Statement::ForOf(_)));
        assert!(matches!(program.body[1], Statement::ForIn(_)));
        assert!(matches!(program.body[2], Statement::For(_)));
    }

    #[test]
    fn test_destructuring_in_for_each_head() {
        let program = parse("for (const [k, v] of Object.entries(o)) {}\nfor (let { a } of xs) {}\nfor (var [i] in obj) {}");
        assert!(matches!(program.body[0], Statement::ForOf(_)));
        assert!(matches!(program.body[1], Statement::ForOf(_)));
        assert!(matches!(program.body[2], Statement::ForIn(_)));

        assert!(Parser::new("for (let [a]; ;) {}").parse_program().is_err());
        assert!(Parser::new("let { a };").parse_program().is_err());
    }

    #[test]
    fn test_destructuring_declaration() {
        let program = parse("const { add, sub: minus = 0 } = require('./math');");
        let Statement::VariableDeclaration(declaration) = &program.body[0] else {
            panic!("expected declaration");
        };
        let mut names = Vec::new();
        declaration.declarations[0].id.bound_names(&mut names);
        assert_eq!(names, vec![Rc::from("add"), Rc::from("minus")]);
    }

    #[test]
    fn test_try_requires_handler() {
        assert!(Parser::new("try { x(); }").parse_program().is_err());
        parse("try { x(); } catch { y(); }");
        parse("try { x(); } finally { y(); }");
    }

    #[test]
    fn test_error_position() {
        let err = Parser::new("const ok = 1;\nconst = 2;").parse_program().unwrap_err();
        match err {
            Error::Syntax { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 7);
            }
            other => panic!("unexpected error {}", other),
        }
    }
}
