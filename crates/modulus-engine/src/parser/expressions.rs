// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Expression, literal and binding pattern parsing.

use super::Parser;
use crate::Error;
use crate::ast::*;
use crate::lexer::{TemplateChunk, TokenKind};
use std::rc::Rc;

impl<'a> Parser<'a> {
    /// Parses an expression, including comma sequences.
    pub fn parse_expression(&mut self) -> Result<Expression, Error> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.eat(&TokenKind::Comma) {
            expressions.push(self.parse_assignment()?);
        }
        Ok(Expression::Sequence(expressions))
    }

    pub(super) fn parse_assignment(&mut self) -> Result<Expression, Error> {
        // Arrow functions: `x => ...` and `(a, b) => ...`
        if let TokenKind::Identifier(name) = &self.current.kind {
            let next = self.peek_token();
            if next.kind == TokenKind::Arrow && !next.newline_before {
                let param = Param {
                    element: PatternElement {
                        target: Pattern::Identifier(Identifier::new(name)),
                        default: None,
                    },
                    rest: false,
                };
                self.advance(); // parameter
                self.advance(); // =>
                return self.parse_arrow_body(vec![param]);
            }
        }
        if self.check(&TokenKind::LeftParen) && self.is_arrow_ahead() {
            self.advance(); // (
            let params = self.parse_parameters()?;
            self.expect(&TokenKind::Arrow)?;
            return self.parse_arrow_body(params);
        }

        let target = self.parse_conditional()?;

        let operator = match &self.current.kind {
            TokenKind::Equal => AssignmentOperator::Assign,
            TokenKind::PlusEqual => AssignmentOperator::AddAssign,
            TokenKind::MinusEqual => AssignmentOperator::SubtractAssign,
            TokenKind::StarEqual => AssignmentOperator::MultiplyAssign,
            TokenKind::SlashEqual => AssignmentOperator::DivideAssign,
            TokenKind::PercentEqual => AssignmentOperator::ModuloAssign,
            _ => return Ok(target),
        };

        if !matches!(target, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(self.error("Invalid left-hand side in assignment"));
        }
        self.advance();
        let value = self.parse_assignment()?;

        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left: Box::new(target),
            right: Box::new(value),
        }))
    }

    /// Scans past the balanced parentheses at the current token and reports
    /// whether `=>` follows on the same line.
    fn is_arrow_ahead(&self) -> bool {
        let mut scanner = self.scanner.clone();
        let mut depth = 1usize;

        loop {
            let token = scanner.next_token();
            match token.kind {
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        let next = scanner.next_token();
                        return next.kind == TokenKind::Arrow && !next.newline_before;
                    }
                }
                TokenKind::Eof | TokenKind::Invalid(_) => return false,
                _ => {}
            }
        }
    }

    fn parse_arrow_body(&mut self, params: Vec<Param>) -> Result<Expression, Error> {
        let body = if self.eat(&TokenKind::LeftBrace) {
            FunctionBody::Block(self.parse_block_body()?)
        } else {
            let no_in = std::mem::replace(&mut self.no_in, false);
            let expression = self.parse_assignment();
            self.no_in = no_in;
            FunctionBody::Expression(Box::new(expression?))
        };

        Ok(Expression::Function(Rc::new(FunctionNode {
            id: None,
            params,
            body,
            is_arrow: true,
        })))
    }

    fn parse_conditional(&mut self) -> Result<Expression, Error> {
        let test = self.parse_logical_or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }

        let no_in = std::mem::replace(&mut self.no_in, false);
        let consequent = self.parse_assignment();
        self.no_in = no_in;
        let consequent = consequent?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;

        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    fn parse_logical_or(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_logical_and()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::PipePipe => LogicalOperator::Or,
                TokenKind::QuestionQuestion => LogicalOperator::Nullish,
                _ => break,
            };
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::Logical(LogicalExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_binary(0)?;

        while self.eat(&TokenKind::AmpersandAmpersand) {
            let right = self.parse_binary(0)?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    /// Precedence climbing over the left-associative binary operators.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, Error> {
        let mut left = self.parse_exponent()?;

        while let Some((operator, precedence)) = self.binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            left = Expression::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn binary_operator(&self) -> Option<(BinaryOperator, u8)> {
        let entry = match &self.current.kind {
            TokenKind::Pipe => (BinaryOperator::BitwiseOr, 1),
            TokenKind::Caret => (BinaryOperator::BitwiseXor, 2),
            TokenKind::Ampersand => (BinaryOperator::BitwiseAnd, 3),
            TokenKind::EqualEqual => (BinaryOperator::Equal, 4),
            TokenKind::NotEqual => (BinaryOperator::NotEqual, 4),
            TokenKind::StrictEqual => (BinaryOperator::StrictEqual, 4),
            TokenKind::StrictNotEqual => (BinaryOperator::StrictNotEqual, 4),
            TokenKind::LessThan => (BinaryOperator::LessThan, 5),
            TokenKind::GreaterThan => (BinaryOperator::GreaterThan, 5),
            TokenKind::LessThanEqual => (BinaryOperator::LessThanEqual, 5),
            TokenKind::GreaterThanEqual => (BinaryOperator::GreaterThanEqual, 5),
            TokenKind::Instanceof => (BinaryOperator::InstanceOf, 5),
            TokenKind::In if !self.no_in => (BinaryOperator::In, 5),
            TokenKind::LeftShift => (BinaryOperator::LeftShift, 6),
            TokenKind::RightShift => (BinaryOperator::RightShift, 6),
            TokenKind::UnsignedRightShift => (BinaryOperator::UnsignedRightShift, 6),
            TokenKind::Plus => (BinaryOperator::Add, 7),
            TokenKind::Minus => (BinaryOperator::Subtract, 7),
            TokenKind::Star => (BinaryOperator::Multiply, 8),
            TokenKind::Slash => (BinaryOperator::Divide, 8),
            TokenKind::Percent => (BinaryOperator::Modulo, 8),
            _ => return None,
        };
        Some(entry)
    }

    /// `**` is right-associative and binds tighter than `*`.
    fn parse_exponent(&mut self) -> Result<Expression, Error> {
        let base = self.parse_unary()?;
        if !self.eat(&TokenKind::StarStar) {
            return Ok(base);
        }
        let exponent = self.parse_exponent()?;

        Ok(Expression::Binary(BinaryExpression {
            operator: BinaryOperator::Exponent,
            left: Box::new(base),
            right: Box::new(exponent),
        }))
    }

    fn parse_unary(&mut self) -> Result<Expression, Error> {
        let operator = match &self.current.kind {
            TokenKind::Bang => UnaryOperator::LogicalNot,
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Tilde => UnaryOperator::BitwiseNot,
            TokenKind::Typeof => UnaryOperator::Typeof,
            TokenKind::Void => UnaryOperator::Void,
            TokenKind::Delete => UnaryOperator::Delete,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let operator = if self.check(&TokenKind::PlusPlus) {
                    UpdateOperator::Increment
                } else {
                    UpdateOperator::Decrement
                };
                self.advance();
                let argument = self.parse_unary()?;
                self.check_update_target(&argument)?;
                return Ok(Expression::Update(UpdateExpression {
                    operator,
                    argument: Box::new(argument),
                    prefix: true,
                }));
            }
            _ => return self.parse_postfix(),
        };

        self.advance();
        let argument = self.parse_unary()?;
        Ok(Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
        }))
    }

    fn parse_postfix(&mut self) -> Result<Expression, Error> {
        let expression = self.parse_left_hand_side()?;

        let operator = match &self.current.kind {
            TokenKind::PlusPlus if !self.current.newline_before => UpdateOperator::Increment,
            TokenKind::MinusMinus if !self.current.newline_before => UpdateOperator::Decrement,
            _ => return Ok(expression),
        };
        self.check_update_target(&expression)?;
        self.advance();

        Ok(Expression::Update(UpdateExpression {
            operator,
            argument: Box::new(expression),
            prefix: false,
        }))
    }

    fn check_update_target(&self, target: &Expression) -> Result<(), Error> {
        if matches!(target, Expression::Identifier(_) | Expression::Member(_)) {
            Ok(())
        } else {
            Err(self.error("Invalid left-hand side expression in update operation"))
        }
    }

    /// Parses calls, member accesses and `new` expressions.
    pub(super) fn parse_left_hand_side(&mut self) -> Result<Expression, Error> {
        let mut expression = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else if self.eat(&TokenKind::Super) {
            if self.check(&TokenKind::LeftParen) {
                self.advance();
                Expression::SuperCall(self.parse_arguments()?)
            } else if self.eat(&TokenKind::Dot) {
                let name = self
                    .property_name()
                    .ok_or_else(|| self.error("Expected property name after 'super.'"))?;
                self.advance();
                Expression::SuperMember(name)
            } else {
                return Err(self.error("'super' keyword unexpected here"));
            }
        } else {
            self.parse_primary()?
        };

        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    expression = self.parse_dot_member(expression, false)?;
                }
                TokenKind::QuestionDot => {
                    self.advance();
                    expression = match &self.current.kind {
                        TokenKind::LeftBracket => {
                            self.advance();
                            self.parse_computed_member(expression, true)?
                        }
                        TokenKind::LeftParen => {
                            return Err(self.error("Optional calls are not supported"));
                        }
                        _ => self.parse_dot_member(expression, true)?,
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    expression = self.parse_computed_member(expression, false)?;
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    expression = Expression::Call(CallExpression {
                        callee: Box::new(expression),
                        arguments,
                    });
                }
                TokenKind::Template(_) => {
                    return Err(self.error("Tagged templates are not supported"));
                }
                _ => break,
            }
        }

        Ok(expression)
    }

    fn parse_dot_member(&mut self, object: Expression, optional: bool) -> Result<Expression, Error> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => Rc::from(name.as_str()),
            kind => match kind.keyword_str() {
                Some(word) => Rc::from(word),
                None => return Err(self.error("Expected property name")),
            },
        };
        self.advance();

        Ok(Expression::Member(MemberExpression {
            object: Box::new(object),
            property: MemberProperty::Identifier(name),
            optional,
        }))
    }

    fn parse_computed_member(
        &mut self,
        object: Expression,
        optional: bool,
    ) -> Result<Expression, Error> {
        let no_in = std::mem::replace(&mut self.no_in, false);
        let property = self.parse_expression();
        self.no_in = no_in;
        let property = property?;
        self.expect(&TokenKind::RightBracket)?;

        Ok(Expression::Member(MemberExpression {
            object: Box::new(object),
            property: MemberProperty::Computed(Box::new(property)),
            optional,
        }))
    }

    /// `new Callee(args)`; the argument list is optional.
    fn parse_new(&mut self) -> Result<Expression, Error> {
        self.advance(); // consume 'new'

        let mut callee = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    callee = self.parse_dot_member(callee, false)?;
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    callee = self.parse_computed_member(callee, false)?;
                }
                _ => break,
            }
        }

        let arguments = if self.eat(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expression::New(CallExpression {
            callee: Box::new(callee),
            arguments,
        }))
    }

    /// Parses call arguments after the opening parenthesis.
    fn parse_arguments(&mut self) -> Result<Vec<ArrayElement>, Error> {
        let no_in = std::mem::replace(&mut self.no_in, false);
        let arguments = self.parse_element_list(&TokenKind::RightParen, false);
        self.no_in = no_in;
        arguments
    }

    /// Comma-separated elements with spread, up to and including `close`.
    fn parse_element_list(
        &mut self,
        close: &TokenKind,
        allow_holes: bool,
    ) -> Result<Vec<ArrayElement>, Error> {
        let mut elements = Vec::new();

        while !self.check(close) {
            if allow_holes && self.check(&TokenKind::Comma) {
                self.advance();
                elements.push(ArrayElement::Hole);
                continue;
            }

            if self.eat(&TokenKind::Ellipsis) {
                elements.push(ArrayElement::Spread(self.parse_assignment()?));
            } else {
                elements.push(ArrayElement::Expression(self.parse_assignment()?));
            }

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(close)?;
        Ok(elements)
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        let expression = match &self.current.kind {
            TokenKind::Number(n) => Expression::Literal(Literal::Number(*n)),
            TokenKind::String(s) => Expression::Literal(Literal::String(s.as_str().into())),
            TokenKind::True => Expression::Literal(Literal::Boolean(true)),
            TokenKind::False => Expression::Literal(Literal::Boolean(false)),
            TokenKind::Null => Expression::Literal(Literal::Null),
            TokenKind::This => Expression::This,
            TokenKind::Identifier(name) => Expression::Identifier(Identifier::new(name)),
            TokenKind::Template(chunks) => {
                let chunks = chunks.clone();
                let expression = self.parse_template(&chunks)?;
                self.advance();
                return Ok(expression);
            }
            TokenKind::Function => {
                self.advance();
                return Ok(Expression::Function(self.parse_function_rest(false)?));
            }
            TokenKind::Class => {
                self.advance();
                return Ok(Expression::Class(self.parse_class_rest(false)?));
            }
            TokenKind::LeftParen => {
                self.advance();
                let no_in = std::mem::replace(&mut self.no_in, false);
                let expression = self.parse_expression();
                self.no_in = no_in;
                let expression = expression?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(expression);
            }
            TokenKind::LeftBracket => {
                self.advance();
                let no_in = std::mem::replace(&mut self.no_in, false);
                let elements = self.parse_element_list(&TokenKind::RightBracket, true);
                self.no_in = no_in;
                return Ok(Expression::Array(elements?));
            }
            TokenKind::LeftBrace => {
                self.advance();
                let no_in = std::mem::replace(&mut self.no_in, false);
                let properties = self.parse_object_literal();
                self.no_in = no_in;
                return Ok(Expression::Object(properties?));
            }
            TokenKind::Slash | TokenKind::SlashEqual => {
                return Err(self.error("Regular expression literals are not supported"));
            }
            _ => return Err(self.error("Unexpected token")),
        };

        self.advance();
        Ok(expression)
    }

    fn parse_template(&self, chunks: &[TemplateChunk]) -> Result<Expression, Error> {
        let mut parts = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            match chunk {
                TemplateChunk::Text(text) => parts.push(TemplatePart::Text(text.as_str().into())),
                TemplateChunk::Substitution(source, offset) => {
                    let mut parser = Parser::with_origin(source, self.origin, self.offset + offset);
                    let expression = parser.parse_expression()?;
                    if !parser.is_at_end() {
                        return Err(parser.error("Unexpected token in template substitution"));
                    }
                    parts.push(TemplatePart::Expression(expression));
                }
            }
        }

        Ok(Expression::Template(parts))
    }

    /// Parses object literal entries after the opening brace.
    fn parse_object_literal(&mut self) -> Result<Vec<ObjectProperty>, Error> {
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            if self.eat(&TokenKind::Ellipsis) {
                properties.push(ObjectProperty::Spread(self.parse_assignment()?));
            } else {
                properties.push(self.parse_object_property()?);
            }

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(properties)
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty, Error> {
        let shorthand = match &self.current.kind {
            TokenKind::Identifier(name) => Some(Identifier::new(name)),
            _ => None,
        };

        let key = if self.eat(&TokenKind::LeftBracket) {
            let expression = self.parse_assignment()?;
            self.expect(&TokenKind::RightBracket)?;
            PropertyKey::Computed(Box::new(expression))
        } else {
            let name = self
                .property_name()
                .ok_or_else(|| self.error("Expected property name"))?;
            self.advance();
            PropertyKey::Static(name)
        };

        // Method names come from the key and are not bound inside the body
        if self.check(&TokenKind::LeftParen) {
            let function = self.parse_function_tail(None)?;
            return Ok(ObjectProperty::Property {
                key,
                value: Expression::Function(function),
            });
        }

        if self.eat(&TokenKind::Colon) {
            let value = self.parse_assignment()?;
            return Ok(ObjectProperty::Property { key, value });
        }

        match shorthand {
            Some(id) => Ok(ObjectProperty::Property {
                key,
                value: Expression::Identifier(id),
            }),
            None => Err(self.error("Expected ':' after property name")),
        }
    }

    /// A binding target with an optional `= default`.
    pub(super) fn parse_binding_element(&mut self) -> Result<PatternElement, Error> {
        let target = self.parse_binding_pattern()?;
        let default = if self.eat(&TokenKind::Equal) {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(PatternElement { target, default })
    }

    /// Identifier, object pattern or array pattern.
    pub(super) fn parse_binding_pattern(&mut self) -> Result<Pattern, Error> {
        if self.eat(&TokenKind::LeftBrace) {
            let mut properties = Vec::new();

            while !self.check(&TokenKind::RightBrace) {
                let shorthand = matches!(self.current.kind, TokenKind::Identifier(_));
                let key = self
                    .property_name()
                    .ok_or_else(|| self.error("Expected property name in object pattern"))?;
                self.advance();

                let value = if self.eat(&TokenKind::Colon) {
                    self.parse_binding_element()?
                } else if shorthand {
                    let default = if self.eat(&TokenKind::Equal) {
                        Some(self.parse_assignment()?)
                    } else {
                        None
                    };
                    PatternElement {
                        target: Pattern::Identifier(Identifier { name: key.clone() }),
                        default,
                    }
                } else {
                    return Err(self.error("Expected ':' in object pattern"));
                };

                properties.push(ObjectPatternProperty { key, value });

                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }

            self.expect(&TokenKind::RightBrace)?;
            return Ok(Pattern::Object(properties));
        }

        if self.eat(&TokenKind::LeftBracket) {
            let mut elements = Vec::new();

            while !self.check(&TokenKind::RightBracket) {
                if self.eat(&TokenKind::Comma) {
                    elements.push(None);
                    continue;
                }
                elements.push(Some(self.parse_binding_element()?));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }

            self.expect(&TokenKind::RightBracket)?;
            return Ok(Pattern::Array(elements));
        }

        Ok(Pattern::Identifier(self.expect_identifier()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expr(source: &str) -> Expression {
        let mut parser = Parser::new(source);
        let expression = parser
            .parse_expression()
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e));
        assert!(parser.is_at_end(), "trailing input in {:?}", source);
        expression
    }

    fn number(n: f64) -> Box<Expression> {
        Box::new(Expression::Literal(Literal::Number(n)))
    }

    #[test]
    fn test_precedence() {
        let expected = Expression::Binary(BinaryExpression {
            operator: BinaryOperator::Add,
            left: number(1.0),
            right: Box::new(Expression::Binary(BinaryExpression {
                operator: BinaryOperator::Multiply,
                left: number(2.0),
                right: number(3.0),
            })),
        });
        assert_eq!(expr("1 + 2 * 3"), expected);
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let Expression::Binary(outer) = expr("2 ** 3 ** 2") else {
            panic!("expected binary");
        };
        assert_eq!(outer.operator, BinaryOperator::Exponent);
        assert_eq!(outer.left, number(2.0));
        assert!(matches!(*outer.right, Expression::Binary(_)));
    }

    #[test]
    fn test_arrow_functions() {
        for source in ["x => x * 2", "(a, b) => a + b", "() => { return 1; }", "({ a }) => a"] {
            let Expression::Function(function) = expr(source) else {
                panic!("expected arrow for {:?}", source);
            };
            assert!(function.is_arrow);
        }
        assert!(matches!(expr("(a + b) * c"), Expression::Binary(_)));
    }

    #[test]
    fn test_member_chain() {
        let Expression::Call(call) = expr("module.exports.add(1, ...rest)") else {
            panic!("expected call");
        };
        assert_eq!(call.arguments.len(), 2);
        assert!(matches!(call.arguments[1], ArrayElement::Spread(_)));
        assert!(matches!(*call.callee, Expression::Member(_)));
    }

    #[test]
    fn test_optional_member() {
        let Expression::Member(member) = expr("config?.server") else {
            panic!("expected member");
        };
        assert!(member.optional);
    }

    #[test]
    fn test_new_without_arguments() {
        let Expression::New(call) = expr("new Calculator") else {
            panic!("expected new");
        };
        assert!(call.arguments.is_empty());
        let Expression::Member(member) = expr("new Calculator().history") else {
            panic!("expected member");
        };
        assert!(matches!(*member.object, Expression::New(_)));
    }

    #[test]
    fn test_object_literal_forms() {
        let Expression::Object(properties) = expr("{ a: 1, b, add(x) { return x; }, [k]: 2, ...rest }")
        else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 5);
        assert!(matches!(properties[2], ObjectProperty::Property { value: Expression::Function(_), .. }));
        assert!(matches!(properties[3], ObjectProperty::Property { key: PropertyKey::Computed(_), .. }));
        assert!(matches!(properties[4], ObjectProperty::Spread(_)));
    }

    #[test]
    fn test_template_literal() {
        let Expression::Template(parts) = expr("`${a} + ${b} = ${a + b}`") else {
            panic!("expected template");
        };
        assert_eq!(parts.len(), 5);
        assert!(matches!(parts[4], TemplatePart::Expression(Expression::Binary(_))));
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(Parser::new("1 = 2").parse_expression().is_err());
        assert!(Parser::new("a + b = c").parse_expression().is_err());
    }

    #[test]
    fn test_regex_is_rejected() {
        let err = Parser::new("/ab+c/").parse_expression().unwrap_err();
        assert!(err.to_string().contains("Regular expression"));
    }
}
