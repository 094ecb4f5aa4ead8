//! Abstract syntax tree produced by the parser.
//!
//! Every node is wrapped in [`Located`], which records the line and column of
//! the token the node starts at. Each category (declarations, types,
//! statements, expressions) is a closed enum; consumers walk the tree with
//! exhaustive matches, either directly or through the [`Visit`] trait.
//!
//! The tree owns all of its data and is never mutated after parsing.

mod dump;
mod visit;

pub use dump::dump;
pub use visit::{
    Visit, walk_declaration, walk_expression, walk_parameter, walk_program, walk_statement,
    walk_statements, walk_type, walk_variable,
};

use std::{fmt, ops::Deref};

use crate::span::Span;

/// Origin of a node in the source: 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl From<Span> for Position {
    fn from(span: Span) -> Self {
        Self::new(span.line(), span.start())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A node together with its source position.
///
/// Equality compares only the wrapped values, so trees built from different
/// layouts of the same program compare equal.
#[derive(Debug, Clone)]
pub struct Located<T> {
    value: T,
    position: Position,
}

impl<T> Located<T> {
    pub fn new(value: T, position: Position) -> Self {
        Self { value, position }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Get a reference to the underlying value
    pub fn inner(&self) -> &T {
        &self.value
    }

    /// Consume the wrapper and return just the inner value
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Transform the value, keeping the position.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Located<U> {
        Located {
            value: f(self.value),
            position: self.position,
        }
    }
}

impl<T> Deref for Located<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: PartialEq> PartialEq for Located<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value.eq(&other.value)
    }
}

/// Root of the tree: top-level declarations in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub declarations: Vec<Located<Declaration>>,
}

/// A `var`, `type` or `routine` declaration, at top level or inside a body.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Variable(VariableDeclaration),
    Type(TypeDeclaration),
    Routine(RoutineDeclaration),
}

impl Declaration {
    /// The declared name.
    pub fn name(&self) -> &str {
        match self {
            Declaration::Variable(var) => &var.name,
            Declaration::Type(ty) => &ty.name,
            Declaration::Routine(routine) => &routine.name,
        }
    }
}

/// `var name : type [is initializer]`; also used for record fields.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    pub ty: Located<Type>,
    pub initializer: Option<Located<Expression>>,
}

/// `type name is type`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    pub ty: Located<Type>,
}

/// `routine name(params) [: type] [is] body end`
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineDeclaration {
    pub name: String,
    pub parameters: Vec<Located<Parameter>>,
    pub return_type: Option<Located<Type>>,
    pub body: Body,
}

/// `name : type` in a routine header.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Located<Type>,
}

/// Local declarations followed by statements, owned by a routine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub declarations: Vec<Located<Declaration>>,
    pub statements: Vec<Located<Statement>>,
}

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Integer,
    Real,
    Boolean,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "integer",
            PrimitiveType::Real => "real",
            PrimitiveType::Boolean => "boolean",
        }
    }
}

/// A type as written in a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(PrimitiveType),
    /// Reference to a declared type; resolved by later passes.
    UserDefined(String),
    Array {
        size: Box<Located<Expression>>,
        element: Box<Located<Type>>,
    },
    /// Fields in declaration order. Duplicate names are not rejected here.
    Record { fields: Vec<Located<VariableDeclaration>> },
}

/// Executable statement inside a routine body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment {
        target: Located<Expression>,
        value: Located<Expression>,
    },
    If {
        condition: Located<Expression>,
        then_branch: Vec<Located<Statement>>,
        /// Empty when there is no `else`.
        else_branch: Vec<Located<Statement>>,
    },
    While {
        condition: Located<Expression>,
        body: Vec<Located<Statement>>,
    },
    For {
        variable: String,
        /// Always an [`Expression::Range`].
        range: Located<Expression>,
        reverse: bool,
        body: Vec<Located<Statement>>,
    },
    Return(Option<Located<Expression>>),
    Print(Located<Expression>),
}

/// Infix operators, from lowest to highest precedence group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    Xor,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    /// The operator as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
            BinaryOperator::And => "and",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "/=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl UnaryOperator {
    /// The operator as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "not",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Expression forms. Precedence is already resolved into the tree shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary {
        left: Box<Located<Expression>>,
        operator: BinaryOperator,
        right: Box<Located<Expression>>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Located<Expression>>,
    },
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Identifier(String),
    ArrayAccess {
        array: Box<Located<Expression>>,
        index: Box<Located<Expression>>,
    },
    RecordAccess {
        record: Box<Located<Expression>>,
        field: String,
    },
    Call {
        routine: String,
        arguments: Vec<Located<Expression>>,
    },
    /// Inclusive `start .. end`.
    Range {
        start: Box<Located<Expression>>,
        end: Box<Located<Expression>>,
    },
    ArrayInit(Vec<Located<Expression>>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> Position {
        Position::new(line, column)
    }

    #[test]
    fn test_located_equality_ignores_position() {
        let a = Located::new(Expression::Integer(1), at(1, 1));
        let b = Located::new(Expression::Integer(1), at(7, 3));
        let c = Located::new(Expression::Integer(2), at(1, 1));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_located_accessors() {
        let located = Located::new("x".to_string(), at(4, 9));

        assert_eq!(located.line(), 4);
        assert_eq!(located.column(), 9);
        assert_eq!(located.len(), 1);
        assert_eq!(located.inner(), "x");

        let mapped = located.map(Expression::Identifier);
        assert_eq!(mapped.position(), at(4, 9));
        assert_eq!(mapped.into_inner(), Expression::Identifier("x".to_string()));
    }

    #[test]
    fn test_position_from_span() {
        let position = Position::from(Span::new(2, 6, 9, 10..14));
        assert_eq!(position, at(2, 6));
        assert_eq!(position.to_string(), "2:6");
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(BinaryOperator::NotEqual.symbol(), "/=");
        assert_eq!(BinaryOperator::Xor.symbol(), "xor");
        assert_eq!(BinaryOperator::Modulo.to_string(), "%");
        assert_eq!(UnaryOperator::Not.symbol(), "not");
        assert_eq!(UnaryOperator::Negate.to_string(), "-");
    }

    #[test]
    fn test_declaration_name() {
        let decl = Declaration::Type(TypeDeclaration {
            name: "Point".to_string(),
            ty: Located::new(Type::Primitive(PrimitiveType::Real), at(1, 15)),
        });
        assert_eq!(decl.name(), "Point");
    }
}
