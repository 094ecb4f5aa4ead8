//! Parser for imperative-language tokens.
//!
//! The grammar runs over a [`TokenSlice`] of significant tokens (no
//! `EndOfLine`), produced by [`TokenStream`]. It is a recursive-descent
//! parser written with winnow combinators: every construct starts with a
//! keyword or a distinctive token, so a single token of lookahead decides
//! which production applies. Once that token is consumed the parser commits
//! (`cut`), and the first mismatch becomes the reported [`ParseError`].
//!
//! Nested constructs recurse, so the input carries the current nesting
//! depth as winnow [`Stateful`] state. Past [`MAX_NESTING`] levels the
//! parser fails with `E103` instead of exhausting the stack.
//!
//! The public entry points are [`parse`] and [`parse_tokens`].

use std::fmt;

use log::debug;
use winnow::{
    Parser,
    combinator::{alt, opt, repeat},
    error::{ContextError, ErrMode},
    stream::{Stateful, Stream, TokenSlice},
    token::any,
};

use crate::{
    ast::{
        BinaryOperator, Body, Declaration, Expression, Located, Parameter, Position,
        PrimitiveType, Program, RoutineDeclaration, Statement, Type, TypeDeclaration,
        UnaryOperator, VariableDeclaration,
    },
    error::{Diagnostic, ErrorCode, ParseError},
    span::Span,
    stream::TokenStream,
    tokens::{PositionedToken, Token},
};

/// What the parser wanted to see at the point it failed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expected {
    Token(Token<'static>),
    /// A description such as "an expression"
    Construct(&'static str),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(token) => write!(f, "{token}"),
            Expected::Construct(what) => f.write_str(what),
        }
    }
}

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Context {
    Expected(Expected),
    /// Description of what is currently being parsed
    Label(&'static str),
    /// The keyword whose block a missing `end` would have closed
    Opened { keyword: &'static str, span: Span },
    /// Nesting went past [`MAX_NESTING`]
    TooDeep,
    /// Remaining token count (`eof_offset()`) at the offending token
    ///
    /// The token index is `tokens.len() - offset`.
    ErrorOffset(usize),
}

/// Significant tokens plus the current nesting depth.
type Input<'src> = Stateful<TokenSlice<'src, PositionedToken<'src>>, usize>;
type PError = ErrMode<ContextError<Context>>;
type IResult<O> = Result<O, PError>;

/// Deepest nesting of statements, types and bracketed, called or prefixed
/// expressions that the parser accepts.
pub(crate) const MAX_NESTING: usize = 128;

fn new_input<'src>(tokens: &'src [PositionedToken<'src>]) -> Input<'src> {
    Stateful {
        input: TokenSlice::new(tokens),
        state: 0,
    }
}

fn position(token: &PositionedToken<'_>) -> Position {
    Position::from(token.span)
}

fn peek<'src>(input: &Input<'src>) -> Option<Token<'src>> {
    input.peek_token().map(|token| token.token)
}

/// A backtrack error pointing at the next token.
fn failure(input: &Input<'_>, expected: Expected) -> PError {
    let mut e = ContextError::new();
    e.push(Context::Expected(expected));
    e.push(Context::ErrorOffset(input.eof_offset()));
    ErrMode::Backtrack(e)
}

fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    f(input).map_err(ErrMode::cut)
}

/// Run `f` one nesting level deeper; fatal once the limit is reached.
fn nested<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    if input.state >= MAX_NESTING {
        let mut e = ContextError::new();
        e.push(Context::TooDeep);
        e.push(Context::ErrorOffset(input.eof_offset()));
        return Err(ErrMode::Cut(e));
    }

    input.state += 1;
    let result = f(input);
    input.state -= 1;
    result
}

/// Commit to a construct, recording its name for the help text.
fn committed<'src, O, F>(input: &mut Input<'src>, label: &'static str, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    cut_err(input, f).map_err(|e| {
        e.map(|mut e| {
            e.push(Context::Label(label));
            e
        })
    })
}

/// Consume the next token if it is `expected`.
fn eat<'src>(
    input: &mut Input<'src>,
    expected: Token<'static>,
) -> IResult<&'src PositionedToken<'src>> {
    any.verify(|token: &PositionedToken<'_>| token.token == expected)
        .parse_next(input)
        .map_err(|_: PError| failure(input, Expected::Token(expected)))
}

/// Like [`eat`], but a mismatch is fatal.
fn expect<'src>(
    input: &mut Input<'src>,
    expected: Token<'static>,
) -> IResult<&'src PositionedToken<'src>> {
    eat(input, expected).map_err(ErrMode::cut)
}

/// Close a block opened by `keyword`.
fn expect_end<'src>(
    input: &mut Input<'src>,
    keyword: &'static str,
    opener: &PositionedToken<'_>,
) -> IResult<&'src PositionedToken<'src>> {
    let span = opener.span;
    eat(input, Token::End).map_err(|e| {
        e.cut().map(|mut e| {
            e.push(Context::Opened { keyword, span });
            e
        })
    })
}

fn token<'src>(
    kind: Token<'static>,
) -> impl Parser<Input<'src>, &'src PositionedToken<'src>, PError> {
    move |input: &mut Input<'src>| eat(input, kind)
}

fn identifier<'src>(input: &mut Input<'src>) -> IResult<(&'src str, Position)> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::Identifier(name) => Some((name, position(token))),
        _ => None,
    })
    .parse_next(input)
    .map_err(|_: PError| failure(input, Expected::Construct("an identifier")))
}

/// Replace a plain backtrack with "expected {what}" at the current token.
fn or_expected<O>(input: &Input<'_>, result: IResult<O>, what: &'static str) -> IResult<O> {
    match result {
        Err(ErrMode::Backtrack(_)) => Err(failure(input, Expected::Construct(what))),
        other => other,
    }
}

/// `element ("," element)*`, possibly empty. A comma commits to another element.
fn comma_separated<'src, O>(
    input: &mut Input<'src>,
    element: fn(&mut Input<'src>) -> IResult<O>,
) -> IResult<Vec<O>> {
    let Some(first) = opt(element).parse_next(input)? else {
        return Ok(Vec::new());
    };

    let mut items = vec![first];
    while opt(token(Token::Comma)).parse_next(input)?.is_some() {
        items.push(cut_err(input, element)?);
    }
    Ok(items)
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// ## Grammar:
///   `Program := Declaration* EndOfFile`
fn program(input: &mut Input<'_>) -> IResult<Program> {
    let declarations = repeat(0.., declaration).parse_next(input)?;

    if matches!(peek(input), Some(token) if token != Token::EndOfFile) {
        return Err(failure(input, Expected::Construct("a declaration")).cut());
    }

    Ok(Program { declarations })
}

fn declaration(input: &mut Input<'_>) -> IResult<Located<Declaration>> {
    alt((variable_declaration, type_declaration, routine_declaration)).parse_next(input)
}

/// ## Grammar:
///   `VarDecl := "var" Identifier ":" Type ("is" Expression)?`
fn variable_declaration(input: &mut Input<'_>) -> IResult<Located<Declaration>> {
    let keyword = eat(input, Token::Var)?;

    committed(input, "variable declaration", |input| {
        let variable = variable_tail(input)?;
        Ok(Located::new(Declaration::Variable(variable), position(keyword)))
    })
}

/// Everything after `var`: shared by declarations and record fields.
fn variable_tail(input: &mut Input<'_>) -> IResult<VariableDeclaration> {
    let (name, _) = identifier(input)?;
    expect(input, Token::Colon)?;
    let ty = ty(input)?;
    let initializer = match opt(token(Token::Is)).parse_next(input)? {
        Some(_) => Some(expression(input)?),
        None => None,
    };

    Ok(VariableDeclaration {
        name: name.to_string(),
        ty,
        initializer,
    })
}

/// ## Grammar:
///   `TypeDecl := "type" Identifier "is" Type`
fn type_declaration(input: &mut Input<'_>) -> IResult<Located<Declaration>> {
    let keyword = eat(input, Token::Type)?;

    committed(input, "type declaration", |input| {
        let (name, _) = identifier(input)?;
        expect(input, Token::Is)?;
        let ty = ty(input)?;

        let declaration = Declaration::Type(TypeDeclaration {
            name: name.to_string(),
            ty,
        });
        Ok(Located::new(declaration, position(keyword)))
    })
}

/// ## Grammar:
///   `RoutineDecl := "routine" Identifier "(" ParamList? ")" (":" Type)? "is"? Body "end"`
///
/// ## Notes:
/// - The body's local declarations must precede its statements.
fn routine_declaration(input: &mut Input<'_>) -> IResult<Located<Declaration>> {
    let keyword = eat(input, Token::Routine)?;

    committed(input, "routine declaration", |input| {
        let (name, _) = identifier(input)?;

        expect(input, Token::LeftParen)?;
        let parameters = comma_separated(input, parameter)?;
        expect(input, Token::RightParen)?;

        let return_type = match opt(token(Token::Colon)).parse_next(input)? {
            Some(_) => Some(ty(input)?),
            None => None,
        };
        opt(token(Token::Is)).parse_next(input)?;

        let declarations = repeat(0.., alt((variable_declaration, type_declaration)))
            .parse_next(input)?;
        let statements = statements(input)?;
        expect_end(input, "routine", keyword)?;

        let routine = RoutineDeclaration {
            name: name.to_string(),
            parameters,
            return_type,
            body: Body {
                declarations,
                statements,
            },
        };
        Ok(Located::new(Declaration::Routine(routine), position(keyword)))
    })
}

/// `Identifier ":" Type`
fn parameter(input: &mut Input<'_>) -> IResult<Located<Parameter>> {
    let (name, position) = identifier(input)?;

    cut_err(input, |input| {
        expect(input, Token::Colon)?;
        let ty = ty(input)?;
        Ok(Located::new(
            Parameter {
                name: name.to_string(),
                ty,
            },
            position,
        ))
    })
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// ## Grammar:
///   `Type := "integer" | "real" | "boolean" | Identifier
///          | "array" "[" Expression "]" Type | "record" Field* "end"`
fn ty(input: &mut Input<'_>) -> IResult<Located<Type>> {
    let result = match peek(input) {
        Some(Token::Array) => nested(input, array_type),
        Some(Token::Record) => nested(input, record_type),
        _ => named_type(input),
    };
    or_expected(input, result, "a type")
}

fn named_type<'src>(input: &mut Input<'src>) -> IResult<Located<Type>> {
    any.verify_map(|token: &PositionedToken<'src>| {
        let ty = match token.token {
            Token::Integer => Type::Primitive(PrimitiveType::Integer),
            Token::Real => Type::Primitive(PrimitiveType::Real),
            Token::Boolean => Type::Primitive(PrimitiveType::Boolean),
            Token::Identifier(name) => Type::UserDefined(name.to_string()),
            _ => return None,
        };
        Some(Located::new(ty, position(token)))
    })
    .parse_next(input)
}

fn array_type(input: &mut Input<'_>) -> IResult<Located<Type>> {
    let keyword = eat(input, Token::Array)?;

    committed(input, "array type", |input| {
        expect(input, Token::LeftBracket)?;
        let size = expression(input)?;
        expect(input, Token::RightBracket)?;
        let element = ty(input)?;

        let ty = Type::Array {
            size: Box::new(size),
            element: Box::new(element),
        };
        Ok(Located::new(ty, position(keyword)))
    })
}

fn record_type(input: &mut Input<'_>) -> IResult<Located<Type>> {
    let keyword = eat(input, Token::Record)?;

    committed(input, "record type", |input| {
        let fields = repeat(0.., field).parse_next(input)?;
        expect_end(input, "record", keyword)?;
        Ok(Located::new(Type::Record { fields }, position(keyword)))
    })
}

/// A record field: `var name : Type` or just `name : Type`.
fn field(input: &mut Input<'_>) -> IResult<Located<VariableDeclaration>> {
    if let Some(keyword) = opt(token(Token::Var)).parse_next(input)? {
        return cut_err(input, |input| {
            Ok(Located::new(variable_tail(input)?, position(keyword)))
        });
    }

    let Some(start) = input.peek_token() else {
        return Err(failure(input, Expected::Construct("a field")));
    };
    if !matches!(start.token, Token::Identifier(_)) {
        return Err(failure(input, Expected::Construct("a field")));
    }
    cut_err(input, |input| {
        Ok(Located::new(variable_tail(input)?, position(start)))
    })
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

fn statements(input: &mut Input<'_>) -> IResult<Vec<Located<Statement>>> {
    repeat(0.., statement).parse_next(input)
}

fn statement(input: &mut Input<'_>) -> IResult<Located<Statement>> {
    match peek(input) {
        Some(Token::If) => nested(input, if_statement),
        Some(Token::While) => nested(input, while_statement),
        Some(Token::For) => nested(input, for_statement),
        Some(Token::Return) => return_statement(input),
        Some(Token::Print) => print_statement(input),
        Some(Token::Identifier(_) | Token::RecordAccess(_)) => assignment(input),
        _ => Err(failure(input, Expected::Construct("a statement"))),
    }
}

/// ## Grammar:
///   `Assignment := Target ":=" Expression`
///
/// ## Notes:
/// - `Target` is a name or dotted path followed by any `[index]` / `.field`
///   suffixes; a routine call is not assignable.
fn assignment(input: &mut Input<'_>) -> IResult<Located<Statement>> {
    committed(input, "assignment", |input| {
        let target = assignment_target(input)?;
        expect(input, Token::Assign)?;
        let value = expression(input)?;

        let position = target.position();
        Ok(Located::new(Statement::Assignment { target, value }, position))
    })
}

fn assignment_target<'src>(input: &mut Input<'src>) -> IResult<Located<Expression>> {
    let base = any
        .verify_map(|token: &PositionedToken<'src>| match token.token {
            Token::Identifier(name) => Some(Located::new(
                Expression::Identifier(name.to_string()),
                position(token),
            )),
            Token::RecordAccess(path) => Some(expand_path(path, position(token))),
            _ => None,
        })
        .parse_next(input)
        .map_err(|_: PError| failure(input, Expected::Construct("an assignment target")))?;

    suffixes(input, base)
}

/// ## Grammar:
///   `IfStmt := "if" Expression "then" Statement* ("else" Statement*)? "end"`
fn if_statement(input: &mut Input<'_>) -> IResult<Located<Statement>> {
    let keyword = eat(input, Token::If)?;

    committed(input, "if statement", |input| {
        let condition = expression(input)?;
        expect(input, Token::Then)?;
        let then_branch = statements(input)?;
        let else_branch = match opt(token(Token::Else)).parse_next(input)? {
            Some(_) => statements(input)?,
            None => Vec::new(),
        };
        expect_end(input, "if", keyword)?;

        let statement = Statement::If {
            condition,
            then_branch,
            else_branch,
        };
        Ok(Located::new(statement, position(keyword)))
    })
}

/// ## Grammar:
///   `WhileStmt := "while" Expression "loop" Statement* "end"`
fn while_statement(input: &mut Input<'_>) -> IResult<Located<Statement>> {
    let keyword = eat(input, Token::While)?;

    committed(input, "while loop", |input| {
        let condition = expression(input)?;
        expect(input, Token::Loop)?;
        let body = statements(input)?;
        expect_end(input, "while", keyword)?;

        Ok(Located::new(
            Statement::While { condition, body },
            position(keyword),
        ))
    })
}

/// ## Grammar:
///   `ForStmt := "for" Identifier "in" "reverse"? Expression ".." Expression
///               "loop" Statement* "end"`
fn for_statement(input: &mut Input<'_>) -> IResult<Located<Statement>> {
    let keyword = eat(input, Token::For)?;

    committed(input, "for loop", |input| {
        let (variable, _) = identifier(input)?;
        expect(input, Token::In)?;
        let reverse = opt(token(Token::Reverse)).parse_next(input)?.is_some();

        let start = logical_or(input)?;
        expect(input, Token::Range)?;
        let end = logical_or(input)?;
        let range = range(start, end);

        expect(input, Token::Loop)?;
        let body = statements(input)?;
        expect_end(input, "for", keyword)?;

        let statement = Statement::For {
            variable: variable.to_string(),
            range,
            reverse,
            body,
        };
        Ok(Located::new(statement, position(keyword)))
    })
}

/// `"return" Expression?`
fn return_statement(input: &mut Input<'_>) -> IResult<Located<Statement>> {
    let keyword = eat(input, Token::Return)?;

    committed(input, "return statement", |input| {
        let value = opt(expression).parse_next(input)?;
        Ok(Located::new(Statement::Return(value), position(keyword)))
    })
}

/// `"print" Expression`
fn print_statement(input: &mut Input<'_>) -> IResult<Located<Statement>> {
    let keyword = eat(input, Token::Print)?;

    committed(input, "print statement", |input| {
        let value = expression(input)?;
        Ok(Located::new(Statement::Print(value), position(keyword)))
    })
}

// ---------------------------------------------------------------------------
// Expressions, loosest binding first
// ---------------------------------------------------------------------------

/// A full expression, optionally a range `a .. b`.
fn expression(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    let start = logical_or(input)?;

    if opt(token(Token::Range)).parse_next(input)?.is_none() {
        return Ok(start);
    }
    let end = cut_err(input, logical_or)?;
    Ok(range(start, end))
}

fn range(start: Located<Expression>, end: Located<Expression>) -> Located<Expression> {
    let position = start.position();
    Located::new(
        Expression::Range {
            start: Box::new(start),
            end: Box::new(end),
        },
        position,
    )
}

/// Left-associative chain of `operand (operator operand)*`.
fn binary_level<'src>(
    input: &mut Input<'src>,
    operand: fn(&mut Input<'src>) -> IResult<Located<Expression>>,
    operator: fn(Token<'_>) -> Option<BinaryOperator>,
) -> IResult<Located<Expression>> {
    let mut left = operand(input)?;

    while let Some(op) = opt(any::<_, PError>.verify_map(|token: &PositionedToken<'src>| {
        operator(token.token)
    }))
    .parse_next(input)?
    {
        let right = cut_err(input, operand)?;
        let position = left.position();
        left = Located::new(
            Expression::Binary {
                left: Box::new(left),
                operator: op,
                right: Box::new(right),
            },
            position,
        );
    }

    Ok(left)
}

fn logical_or(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    binary_level(input, logical_and, |token| match token {
        Token::Or => Some(BinaryOperator::Or),
        Token::Xor => Some(BinaryOperator::Xor),
        _ => None,
    })
}

fn logical_and(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    binary_level(input, logical_not, |token| match token {
        Token::And => Some(BinaryOperator::And),
        _ => None,
    })
}

fn logical_not(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    let Some(keyword) = opt(token(Token::Not)).parse_next(input)? else {
        return relational(input);
    };

    let operand = cut_err(input, |input| nested(input, logical_not))?;
    Ok(unary(UnaryOperator::Not, operand, position(keyword)))
}

fn relational(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    binary_level(input, additive, |token| match token {
        Token::Equal => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::Less => Some(BinaryOperator::Less),
        Token::LessEqual => Some(BinaryOperator::LessEqual),
        Token::Greater => Some(BinaryOperator::Greater),
        Token::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        _ => None,
    })
}

fn additive(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    binary_level(input, multiplicative, |token| match token {
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        _ => None,
    })
}

fn multiplicative(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    binary_level(input, negation, |token| match token {
        Token::Multiply => Some(BinaryOperator::Multiply),
        Token::Divide => Some(BinaryOperator::Divide),
        Token::Mod => Some(BinaryOperator::Modulo),
        _ => None,
    })
}

fn negation(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    let Some(minus) = opt(token(Token::Minus)).parse_next(input)? else {
        return postfix(input);
    };

    let operand = cut_err(input, |input| nested(input, negation))?;
    Ok(unary(UnaryOperator::Negate, operand, position(minus)))
}

fn unary(
    operator: UnaryOperator,
    operand: Located<Expression>,
    position: Position,
) -> Located<Expression> {
    Located::new(
        Expression::Unary {
            operator,
            operand: Box::new(operand),
        },
        position,
    )
}

fn postfix(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    let base = primary(input)?;
    suffixes(input, base)
}

/// Apply `[index]` and `.field` suffixes to `base`, left to right.
fn suffixes(input: &mut Input<'_>, mut base: Located<Expression>) -> IResult<Located<Expression>> {
    loop {
        match peek(input) {
            Some(Token::LeftBracket) => {
                let index = nested(input, |input| {
                    input.next_token();
                    cut_err(input, |input| {
                        let index = expression(input)?;
                        expect(input, Token::RightBracket)?;
                        Ok(index)
                    })
                })?;

                let position = base.position();
                base = Located::new(
                    Expression::ArrayAccess {
                        array: Box::new(base),
                        index: Box::new(index),
                    },
                    position,
                );
            }
            Some(Token::Dot) => {
                input.next_token();
                let path = cut_err(input, field_path)?;
                base = access_fields(base, path);
            }
            _ => return Ok(base),
        }
    }
}

/// The name (or dotted names) after a `.` suffix.
fn field_path<'src>(input: &mut Input<'src>) -> IResult<&'src str> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::Identifier(name) | Token::RecordAccess(name) => Some(name),
        _ => None,
    })
    .parse_next(input)
    .map_err(|_: PError| failure(input, Expected::Construct("a field name")))
}

/// Wrap `record` in one field access per segment of `path`.
///
/// Every node keeps the position of `record`.
fn access_fields(mut record: Located<Expression>, path: &str) -> Located<Expression> {
    let position = record.position();
    for field in path.split('.') {
        record = Located::new(
            Expression::RecordAccess {
                record: Box::new(record),
                field: field.to_string(),
            },
            position,
        );
    }
    record
}

/// Expand a dotted path token: `a.b.c` becomes `((a).b).c`.
fn expand_path(path: &str, position: Position) -> Located<Expression> {
    match path.split_once('.') {
        Some((base, fields)) => access_fields(
            Located::new(Expression::Identifier(base.to_string()), position),
            fields,
        ),
        None => Located::new(Expression::Identifier(path.to_string()), position),
    }
}

/// ## Grammar:
///   `Primary := Literal | Identifier | Identifier "(" Args? ")" | DottedPath
///             | "(" Expression ")" | "[" Args? "]"`
fn primary(input: &mut Input<'_>) -> IResult<Located<Expression>> {
    let Some(token) = input.peek_token() else {
        return Err(failure(input, Expected::Construct("an expression")));
    };
    let position = position(token);

    let literal = match token.token {
        Token::IntegerLiteral(value) => Expression::Integer(value),
        Token::RealLiteral(value) => Expression::Real(value),
        Token::BoolLiteral(value) => Expression::Boolean(value),
        Token::Identifier(name) => {
            input.next_token();
            return identifier_or_call(input, name, position);
        }
        Token::RecordAccess(path) => {
            input.next_token();
            return Ok(expand_path(path, position));
        }
        Token::LeftParen => {
            return nested(input, |input| {
                input.next_token();
                cut_err(input, |input| {
                    let inner = expression(input)?;
                    expect(input, Token::RightParen)?;
                    Ok(inner)
                })
            });
        }
        Token::LeftBracket => {
            return nested(input, |input| {
                input.next_token();
                committed(input, "array initializer", |input| {
                    let elements = comma_separated(input, expression)?;
                    expect(input, Token::RightBracket)?;
                    Ok(Located::new(Expression::ArrayInit(elements), position))
                })
            });
        }
        _ => return Err(failure(input, Expected::Construct("an expression"))),
    };

    input.next_token();
    Ok(Located::new(literal, position))
}

fn identifier_or_call(
    input: &mut Input<'_>,
    name: &str,
    position: Position,
) -> IResult<Located<Expression>> {
    if opt(token(Token::LeftParen)).parse_next(input)?.is_none() {
        return Ok(Located::new(Expression::Identifier(name.to_string()), position));
    }

    nested(input, |input| {
        committed(input, "call arguments", |input| {
            let arguments = comma_separated(input, expression)?;
            expect(input, Token::RightParen)?;

            let call = Expression::Call {
                routine: name.to_string(),
                arguments,
            };
            Ok(Located::new(call, position))
        })
    })
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Utility function to convert winnow errors to our diagnostic format
///
/// The offending token is located through the `ErrorOffset` context pushed
/// where the failure happened, falling back to where the parser stopped.
fn convert_error(
    error: PError,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let error = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        // TokenSlice is a complete stream
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    let remaining = error
        .context()
        .find_map(|ctx| match ctx {
            Context::ErrorOffset(n) => Some(*n),
            _ => None,
        })
        .unwrap_or(current_remaining);
    let index = tokens.len().saturating_sub(remaining);
    let (found, span) = tokens
        .get(index)
        .or_else(|| tokens.last())
        .map_or((Token::EndOfFile, Span::default()), |token| {
            (token.token, token.span)
        });

    let expected = error.context().find_map(|ctx| match ctx {
        Context::Expected(expected) => Some(expected),
        _ => None,
    });
    let opened = error.context().find_map(|ctx| match ctx {
        Context::Opened { keyword, span } => Some((*keyword, *span)),
        _ => None,
    });

    if error.context().any(|ctx| matches!(ctx, Context::TooDeep)) {
        return Diagnostic::error(format!("nesting exceeds {MAX_NESTING} levels"))
            .with_code(ErrorCode::E103)
            .with_label(span, "nesting limit reached here")
            .with_help("move inner parts into variables or routines");
    }

    let message = match expected {
        Some(expected) => format!("expected {expected}, found {found}"),
        None => format!("unexpected {found}"),
    };
    let (code, label) = match (found, opened) {
        (Token::EndOfFile, Some(_)) => (ErrorCode::E102, "block is not closed"),
        (Token::EndOfFile, None) => (ErrorCode::E101, "input ends here"),
        _ => (ErrorCode::E100, "unexpected token"),
    };

    let mut diagnostic = Diagnostic::error(message)
        .with_code(code)
        .with_label(span, label);

    if let Some((keyword, opened_at)) = opened {
        diagnostic =
            diagnostic.with_secondary_label(opened_at, format!("`{keyword}` block opened here"));
    }

    let labels: Vec<&str> = error
        .context()
        .filter_map(|ctx| match ctx {
            Context::Label(label) => Some(*label),
            _ => None,
        })
        .collect();
    if !labels.is_empty() {
        diagnostic = diagnostic.with_help(format!("while parsing {}", labels.join(" inside ")));
    }

    diagnostic
}

fn parse_significant(tokens: &[PositionedToken<'_>]) -> Result<Program, ParseError> {
    debug!(tokens = tokens.len(); "Parsing token stream");

    let mut input = new_input(tokens);
    match program.parse_next(&mut input) {
        Ok(program) => {
            debug!(declarations = program.declarations.len(); "Parsed program");
            Ok(program)
        }
        Err(e) => {
            let diagnostic = convert_error(e, tokens, input.eof_offset());
            debug!(line = diagnostic.primary_span().map_or(0, |span| span.line()); "Syntax error");
            Err(diagnostic.into())
        }
    }
}

/// Lex and parse `source` into a [`Program`].
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first syntax error. Invalid tokens
/// are reported as unexpected here; run
/// [`check_lexical`](crate::lexer::check_lexical) first to report all of them.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens: Vec<_> = TokenStream::new(source).collect();
    parse_significant(&tokens)
}

/// Parse an already scanned token sequence, such as the output of
/// [`tokenize`](crate::lexer::tokenize). `EndOfLine` tokens are skipped.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first syntax error.
pub fn parse_tokens(tokens: &[PositionedToken<'_>]) -> Result<Program, ParseError> {
    let significant: Vec<_> = tokens
        .iter()
        .filter(|token| token.token != Token::EndOfLine)
        .cloned()
        .collect();
    parse_significant(&significant)
}
