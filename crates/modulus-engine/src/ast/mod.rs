// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract Syntax Tree (AST) definitions.
//!
//! The node shapes follow ESTree naming where possible. Function and class
//! bodies are reference counted so closures can share them without cloning.

use std::rc::Rc;

/// A complete program (or module body).
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
}

/// An identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    /// The name of the identifier
    pub name: Rc<str>,
}

impl Identifier {
    /// Creates an identifier from a name.
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration (var, let, const)
    VariableDeclaration(VariableDeclaration),
    /// Function declaration
    FunctionDeclaration(Rc<FunctionNode>),
    /// Class declaration
    ClassDeclaration(Rc<ClassNode>),
    /// Expression statement
    Expression(Expression),
    /// Block statement { ... }
    Block(Vec<Statement>),
    /// If statement
    If(IfStatement),
    /// Switch statement
    Switch(SwitchStatement),
    /// While statement
    While(WhileStatement),
    /// Do-while statement
    DoWhile(WhileStatement),
    /// For statement
    For(ForStatement),
    /// For-in statement
    ForIn(ForEachStatement),
    /// For-of statement
    ForOf(ForEachStatement),
    /// Return statement
    Return(Option<Expression>),
    /// Break statement
    Break,
    /// Continue statement
    Continue,
    /// Throw statement
    Throw(Expression),
    /// Try statement
    Try(TryStatement),
    /// Empty statement (;)
    Empty,
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// var declaration
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// The kind of declaration
    pub kind: VariableKind,
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// A single variable declarator.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// The binding target
    pub id: Pattern,
    /// Optional initializer expression
    pub init: Option<Expression>,
}

/// A binding pattern (declarations and parameters).
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Plain identifier
    Identifier(Identifier),
    /// `{ a, b: c, d = 1 }`
    Object(Vec<ObjectPatternProperty>),
    /// `[a, , b = 2]`
    Array(Vec<Option<PatternElement>>),
}

impl Pattern {
    /// Collects every name bound by this pattern.
    pub fn bound_names(&self, out: &mut Vec<Rc<str>>) {
        match self {
            Pattern::Identifier(id) => out.push(id.name.clone()),
            Pattern::Object(props) => {
                for prop in props {
                    prop.value.target.bound_names(out);
                }
            }
            Pattern::Array(elements) => {
                for element in elements.iter().flatten() {
                    element.target.bound_names(out);
                }
            }
        }
    }
}

/// A pattern with an optional default value.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternElement {
    /// Where the value is bound
    pub target: Pattern,
    /// Used when the incoming value is undefined
    pub default: Option<Expression>,
}

/// `key: target = default` inside an object pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProperty {
    /// Property key read from the source object
    pub key: Rc<str>,
    /// Binding target for the property value
    pub value: PatternElement,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// The binding target and default
    pub element: PatternElement,
    /// `...rest` parameter
    pub rest: bool,
}

/// Function body: a block or a concise arrow expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// `{ statements }`
    Block(Vec<Statement>),
    /// `=> expression`
    Expression(Box<Expression>),
}

/// A function (declaration, expression, arrow or method).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    /// The function name, if any
    pub id: Option<Identifier>,
    /// The parameters
    pub params: Vec<Param>,
    /// The function body
    pub body: FunctionBody,
    /// Arrow functions take `this` from the enclosing scope
    pub is_arrow: bool,
}

/// A class declaration or expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    /// The class name
    pub id: Option<Identifier>,
    /// The `extends` expression
    pub superclass: Option<Expression>,
    /// Explicit constructor
    pub constructor: Option<Rc<FunctionNode>>,
    /// Methods in declaration order
    pub methods: Vec<ClassMethod>,
}

/// A method inside a class body.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMethod {
    /// Method name
    pub key: Rc<str>,
    /// Defined on the constructor rather than the prototype
    pub is_static: bool,
    /// The method function
    pub function: Rc<FunctionNode>,
}

/// An if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The condition
    pub test: Expression,
    /// The then branch
    pub consequent: Box<Statement>,
    /// The optional else branch
    pub alternate: Option<Box<Statement>>,
}

/// A while or do-while statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    /// The condition
    pub test: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// A for statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    /// The initializer
    pub init: Option<ForInit>,
    /// The condition
    pub test: Option<Expression>,
    /// The update expression
    pub update: Option<Expression>,
    /// The loop body
    pub body: Box<Statement>,
}

/// For loop initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    /// Variable declaration
    Declaration(VariableDeclaration),
    /// Expression
    Expression(Expression),
}

/// A for-in or for-of statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ForEachStatement {
    /// The loop variable
    pub left: ForEachTarget,
    /// The object or iterable
    pub right: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// The left side of a for-in/for-of head.
#[derive(Debug, Clone, PartialEq)]
pub enum ForEachTarget {
    /// `const x`, `let [a, b]`
    Declaration(VariableKind, Pattern),
    /// An existing assignment target
    Expression(Expression),
}

/// A switch statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    /// The discriminant expression
    pub discriminant: Expression,
    /// The case clauses
    pub cases: Vec<SwitchCase>,
}

/// A switch case clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// The test expression (None for default)
    pub test: Option<Expression>,
    /// The consequent statements
    pub consequent: Vec<Statement>,
}

/// A try statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    /// The try block
    pub block: Vec<Statement>,
    /// The catch clause
    pub handler: Option<CatchClause>,
    /// The finally block
    pub finalizer: Option<Vec<Statement>>,
}

/// A catch clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// The bound exception, if named
    pub param: Option<Pattern>,
    /// The handler body
    pub body: Vec<Statement>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Template literal
    Template(Vec<TemplatePart>),
    /// Identifier reference
    Identifier(Identifier),
    /// `this`
    This,
    /// Array literal
    Array(Vec<ArrayElement>),
    /// Object literal
    Object(Vec<ObjectProperty>),
    /// Function expression or arrow function
    Function(Rc<FunctionNode>),
    /// Class expression
    Class(Rc<ClassNode>),
    /// Unary operation
    Unary(UnaryExpression),
    /// `++x`, `x--`
    Update(UpdateExpression),
    /// Binary operation
    Binary(BinaryExpression),
    /// Short-circuiting logical operation
    Logical(LogicalExpression),
    /// Assignment
    Assignment(AssignmentExpression),
    /// `test ? a : b`
    Conditional(ConditionalExpression),
    /// Function call
    Call(CallExpression),
    /// `new Callee(args)`
    New(CallExpression),
    /// Property access
    Member(MemberExpression),
    /// `super(args)` inside a derived constructor
    SuperCall(Vec<ArrayElement>),
    /// `super.name`
    SuperMember(Rc<str>),
    /// Comma-separated sequence
    Sequence(Vec<Expression>),
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Number literal
    Number(f64),
    /// String literal
    String(Rc<str>),
    /// Boolean literal
    Boolean(bool),
    /// null
    Null,
}

/// A part of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text
    Text(Rc<str>),
    /// `${ expression }`
    Expression(Expression),
}

/// An array literal element or call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    /// Plain expression
    Expression(Expression),
    /// `...iterable`
    Spread(Expression),
    /// Elision `[a, , b]`
    Hole,
}

/// A property key in an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// Static name
    Static(Rc<str>),
    /// `[expression]`
    Computed(Box<Expression>),
}

/// An object literal entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    /// `key: value`, shorthand `key`, or method `key() {}`
    Property {
        /// The property key
        key: PropertyKey,
        /// The property value
        value: Expression,
    },
    /// `...source`
    Spread(Expression),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// -x
    Minus,
    /// +x
    Plus,
    /// !x
    LogicalNot,
    /// ~x
    BitwiseNot,
    /// typeof x
    Typeof,
    /// void x
    Void,
    /// delete x
    Delete,
}

/// A unary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    /// The operator
    pub operator: UnaryOperator,
    /// The operand
    pub argument: Box<Expression>,
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// ++
    Increment,
    /// --
    Decrement,
}

/// An update expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    /// The operator
    pub operator: UpdateOperator,
    /// The target
    pub argument: Box<Expression>,
    /// Prefix (`++x`) or postfix (`x++`)
    pub prefix: bool,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// %
    Modulo,
    /// **
    Exponent,
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// ===
    StrictEqual,
    /// !==
    StrictNotEqual,
    /// <
    LessThan,
    /// <=
    LessThanEqual,
    /// >
    GreaterThan,
    /// >=
    GreaterThanEqual,
    /// <<
    LeftShift,
    /// >>
    RightShift,
    /// >>>
    UnsignedRightShift,
    /// &
    BitwiseAnd,
    /// |
    BitwiseOr,
    /// ^
    BitwiseXor,
    /// in
    In,
    /// instanceof
    InstanceOf,
}

/// A binary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    /// The operator
    pub operator: BinaryOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand
    pub right: Box<Expression>,
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// &&
    And,
    /// ||
    Or,
    /// ??
    Nullish,
}

/// A logical expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    /// The operator
    pub operator: LogicalOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand, evaluated only when needed
    pub right: Box<Expression>,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// =
    Assign,
    /// +=
    AddAssign,
    /// -=
    SubtractAssign,
    /// *=
    MultiplyAssign,
    /// /=
    DivideAssign,
    /// %=
    ModuloAssign,
}

impl AssignmentOperator {
    /// The binary operator applied by a compound assignment.
    pub fn binary(self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractAssign => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyAssign => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideAssign => Some(BinaryOperator::Divide),
            AssignmentOperator::ModuloAssign => Some(BinaryOperator::Modulo),
        }
    }
}

/// An assignment expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    /// The operator
    pub operator: AssignmentOperator,
    /// Target (identifier or member expression)
    pub left: Box<Expression>,
    /// Value
    pub right: Box<Expression>,
}

/// A conditional (ternary) expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    /// The condition
    pub test: Box<Expression>,
    /// Value when truthy
    pub consequent: Box<Expression>,
    /// Value when falsy
    pub alternate: Box<Expression>,
}

/// A call or `new` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// The callee
    pub callee: Box<Expression>,
    /// The arguments
    pub arguments: Vec<ArrayElement>,
}

/// A member expression.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    /// The object
    pub object: Box<Expression>,
    /// The property
    pub property: MemberProperty,
    /// `a?.b`: yields undefined when the object is nullish
    pub optional: bool,
}

/// The property of a member expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `.name`
    Identifier(Rc<str>),
    /// `[expression]`
    Computed(Box<Expression>),
}
