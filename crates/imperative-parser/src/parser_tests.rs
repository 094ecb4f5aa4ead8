//! Unit tests for the grammar, driven from source text.
//!
//! Trees are compared with `Located` values built at the default position;
//! `Located` equality ignores positions, so only shapes are checked unless a
//! test asserts positions explicitly.

use crate::{
    ast::{
        BinaryOperator, Declaration, Expression, Located, Position, PrimitiveType, Program,
        RoutineDeclaration, Statement, Type, UnaryOperator,
    },
    error::{ErrorCode, ParseError},
    lexer, parser,
};

/// Helper function to parse a source string and return the tree or a message
fn parse_source(source: &str) -> Result<Program, String> {
    parser::parse(source).map_err(|err| format!("Parser error: {err}"))
}

/// Helper function to parse a source string and assert success
fn assert_parses_successfully(source: &str) -> Program {
    match parse_source(source) {
        Ok(program) => program,
        Err(e) => panic!("Expected parsing to succeed, but got error: {e}"),
    }
}

/// Helper function to parse a source string and assert failure
fn assert_parse_fails(source: &str) -> ParseError {
    match parser::parse(source) {
        Ok(program) => panic!("Expected parsing to fail, but it succeeded: {program:?}"),
        Err(err) => err,
    }
}

/// Helper to check the reported location of a syntax error
fn assert_error_at_position(source: &str, expected_line: usize, expected_column: usize) {
    let err = assert_parse_fails(source);
    assert_eq!(
        (err.line(), err.column()),
        (expected_line, expected_column),
        "wrong location for error: {err}"
    );
}

fn first_routine(program: &Program) -> &RoutineDeclaration {
    program
        .declarations
        .iter()
        .find_map(|decl| match decl.inner() {
            Declaration::Routine(routine) => Some(routine),
            _ => None,
        })
        .expect("program should declare a routine")
}

/// Parse `statements` as the body of a routine and return them.
fn parse_statements(statements: &str) -> Vec<Located<Statement>> {
    let source = format!("routine main() is\n{statements}\nend\n");
    let program = assert_parses_successfully(&source);
    first_routine(&program).body.statements.clone()
}

/// Parse `x := <expression>` and return the assigned value.
fn parse_expression(expression: &str) -> Expression {
    let statements = parse_statements(&format!("x := {expression}"));
    match statements.into_iter().next().map(Located::into_inner) {
        Some(Statement::Assignment { value, .. }) => value.into_inner(),
        other => panic!("expected an assignment, got {other:?}"),
    }
}

fn at<T>(value: T) -> Located<T> {
    Located::new(value, Position::default())
}

fn boxed(expression: Expression) -> Box<Located<Expression>> {
    Box::new(at(expression))
}

fn int(value: i64) -> Expression {
    Expression::Integer(value)
}

fn ident(name: &str) -> Expression {
    Expression::Identifier(name.to_string())
}

fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    Expression::Binary {
        left: boxed(left),
        operator,
        right: boxed(right),
    }
}

fn unary(operator: UnaryOperator, operand: Expression) -> Expression {
    Expression::Unary {
        operator,
        operand: boxed(operand),
    }
}

fn field(record: Expression, name: &str) -> Expression {
    Expression::RecordAccess {
        record: boxed(record),
        field: name.to_string(),
    }
}

#[cfg(test)]
mod basic_parsing_tests {
    use super::*;

    #[test]
    fn test_empty_program() {
        let program = assert_parses_successfully("");
        assert!(program.declarations.is_empty());
    }

    #[test]
    fn test_blank_lines_and_comments_only() {
        let program = assert_parses_successfully("\n  # nothing to see\n\n");
        assert!(program.declarations.is_empty());
    }

    #[test]
    fn test_declarations_in_source_order() {
        let source = r#"
            var limit : integer is 10
            type Flags is array [limit] boolean
            routine main() is
                print limit
            end
        "#;

        let program = assert_parses_successfully(source);
        let names: Vec<_> = program.declarations.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["limit", "Flags", "main"]);
    }

    #[test]
    fn test_layout_does_not_matter() {
        let spread = assert_parses_successfully(
            "routine main()\nis\n  x\n  :=\n  1\n  print\n  x\nend\n",
        );
        let compact = assert_parses_successfully("routine main() is x := 1 print x end");

        assert_eq!(spread, compact);
    }

    #[test]
    fn test_parse_tokens_skips_end_of_line() {
        let source = "var x : integer\nvar y : real\n";
        let tokens = lexer::tokenize(source);

        let from_tokens = parser::parse_tokens(&tokens).expect("tokens should parse");
        let from_source = assert_parses_successfully(source);
        assert_eq!(from_tokens, from_source);
    }

    #[test]
    fn test_declaration_positions() {
        let program = assert_parses_successfully("var a : integer\n\n  type T is real\n");

        assert_eq!(program.declarations[0].position(), Position::new(1, 1));
        assert_eq!(program.declarations[1].position(), Position::new(3, 3));
    }
}

#[cfg(test)]
mod declaration_tests {
    use super::*;

    #[test]
    fn test_variable_without_initializer() {
        let program = assert_parses_successfully("var count : integer");

        let Declaration::Variable(var) = program.declarations[0].inner() else {
            panic!("expected a variable declaration");
        };
        assert_eq!(var.name, "count");
        assert_eq!(*var.ty, Type::Primitive(PrimitiveType::Integer));
        assert!(var.initializer.is_none());
    }

    #[test]
    fn test_variable_with_initializer() {
        let program = assert_parses_successfully("var ratio : real is 0.5");

        let Declaration::Variable(var) = program.declarations[0].inner() else {
            panic!("expected a variable declaration");
        };
        assert_eq!(*var.ty, Type::Primitive(PrimitiveType::Real));
        assert_eq!(
            var.initializer.as_ref().map(|init| init.inner()),
            Some(&Expression::Real(0.5))
        );
    }

    #[test]
    fn test_user_defined_type_reference() {
        let program = assert_parses_successfully("var origin : Point");

        let Declaration::Variable(var) = program.declarations[0].inner() else {
            panic!("expected a variable declaration");
        };
        assert_eq!(*var.ty, Type::UserDefined("Point".to_string()));
    }

    #[test]
    fn test_record_type_fields() {
        let source = r#"
            type Person is record
                var age : integer
                name : Name
                var tags : array [4] integer
            end
        "#;

        let program = assert_parses_successfully(source);
        let Declaration::Type(decl) = program.declarations[0].inner() else {
            panic!("expected a type declaration");
        };
        let Type::Record { fields } = decl.ty.inner() else {
            panic!("expected a record type");
        };

        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["age", "name", "tags"]);
        assert!(matches!(fields[2].ty.inner(), Type::Array { .. }));
    }

    #[test]
    fn test_duplicate_record_fields_are_kept() {
        let program = assert_parses_successfully("type P is record x : real x : real end");

        let Declaration::Type(decl) = program.declarations[0].inner() else {
            panic!("expected a type declaration");
        };
        let Type::Record { fields } = decl.ty.inner() else {
            panic!("expected a record type");
        };
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_array_type_with_expression_size() {
        let program = assert_parses_successfully("type Grid is array [n * 2] array [n] real");

        let Declaration::Type(decl) = program.declarations[0].inner() else {
            panic!("expected a type declaration");
        };
        let Type::Array { size, element } = decl.ty.inner() else {
            panic!("expected an array type");
        };
        assert_eq!(
            *size.inner(),
            binary(ident("n"), BinaryOperator::Multiply, int(2))
        );
        assert!(matches!(element.inner(), Type::Array { .. }));
    }

    #[test]
    fn test_routine_header() {
        let program = assert_parses_successfully(
            "routine add(a : integer, b : integer) : integer is return a + b end",
        );

        let routine = first_routine(&program);
        assert_eq!(routine.name, "add");
        let params: Vec<_> = routine.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, vec!["a", "b"]);
        assert_eq!(
            routine.return_type.as_ref().map(|ty| ty.inner()),
            Some(&Type::Primitive(PrimitiveType::Integer))
        );
    }

    #[test]
    fn test_routine_without_is() {
        let program = assert_parses_successfully("routine main()\n  print 1\nend");

        let routine = first_routine(&program);
        assert!(routine.parameters.is_empty());
        assert!(routine.return_type.is_none());
        assert_eq!(routine.body.statements.len(), 1);
    }

    #[test]
    fn test_routine_body_declarations_before_statements() {
        let source = r#"
            routine main() is
                var i : integer is 0
                type Pair is record var a : integer var b : integer end
                i := i + 1
                print i
            end
        "#;

        let program = assert_parses_successfully(source);
        let body = &first_routine(&program).body;
        assert_eq!(body.declarations.len(), 2);
        assert_eq!(body.statements.len(), 2);
    }

    #[test]
    fn test_empty_routine() {
        let program = assert_parses_successfully("routine noop() end");
        assert!(first_routine(&program).body.statements.is_empty());
    }
}

#[cfg(test)]
mod statement_tests {
    use super::*;

    #[test]
    fn test_assignment_to_record_path() {
        let statements = parse_statements("p.pos.x := 1");

        let Statement::Assignment { target, value } = statements[0].inner() else {
            panic!("expected an assignment");
        };
        assert_eq!(*target.inner(), field(field(ident("p"), "pos"), "x"));
        assert_eq!(*value.inner(), int(1));
    }

    #[test]
    fn test_assignment_to_indexed_target() {
        let statements = parse_statements("cells[i + 1].value := 0");

        let Statement::Assignment { target, .. } = statements[0].inner() else {
            panic!("expected an assignment");
        };
        let expected = field(
            Expression::ArrayAccess {
                array: boxed(ident("cells")),
                index: boxed(binary(ident("i"), BinaryOperator::Add, int(1))),
            },
            "value",
        );
        assert_eq!(*target.inner(), expected);
    }

    #[test]
    fn test_if_with_else() {
        let statements = parse_statements("if a > b then print a else print b print 0 end");

        let Statement::If {
            condition,
            then_branch,
            else_branch,
        } = statements[0].inner()
        else {
            panic!("expected an if statement");
        };
        assert_eq!(
            *condition.inner(),
            binary(ident("a"), BinaryOperator::Greater, ident("b"))
        );
        assert_eq!(then_branch.len(), 1);
        assert_eq!(else_branch.len(), 2);
    }

    #[test]
    fn test_if_without_else() {
        let statements = parse_statements("if done then return end");

        let Statement::If { else_branch, .. } = statements[0].inner() else {
            panic!("expected an if statement");
        };
        assert!(else_branch.is_empty());
    }

    #[test]
    fn test_if_with_parenthesized_operands() {
        let statements = parse_statements("if (a) and (b) then print 1 end");

        let Statement::If { condition, .. } = statements[0].inner() else {
            panic!("expected an if statement");
        };
        assert_eq!(
            *condition.inner(),
            binary(ident("a"), BinaryOperator::And, ident("b"))
        );
    }

    #[test]
    fn test_while_loop() {
        let statements = parse_statements("while i < 10 loop i := i + 1 end");

        let Statement::While { condition, body } = statements[0].inner() else {
            panic!("expected a while loop");
        };
        assert_eq!(
            *condition.inner(),
            binary(ident("i"), BinaryOperator::Less, int(10))
        );
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_for_reverse() {
        let statements = parse_statements("for i in reverse 10..1 loop print i end");

        let Statement::For {
            variable,
            range,
            reverse,
            body,
        } = statements[0].inner()
        else {
            panic!("expected a for loop");
        };
        assert_eq!(variable, "i");
        assert!(*reverse);
        assert_eq!(
            *range.inner(),
            Expression::Range {
                start: boxed(int(10)),
                end: boxed(int(1)),
            }
        );
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_for_forward() {
        let statements = parse_statements("for i in 1 .. n + 1 loop end");

        let Statement::For { reverse, range, .. } = statements[0].inner() else {
            panic!("expected a for loop");
        };
        assert!(!*reverse);
        assert_eq!(
            *range.inner(),
            Expression::Range {
                start: boxed(int(1)),
                end: boxed(binary(ident("n"), BinaryOperator::Add, int(1))),
            }
        );
    }

    #[test]
    fn test_return_with_and_without_value() {
        let statements = parse_statements("if x then return end return x * 2");

        let Statement::If { then_branch, .. } = statements[0].inner() else {
            panic!("expected an if statement");
        };
        assert_eq!(*then_branch[0].inner(), Statement::Return(None));
        assert_eq!(
            *statements[1].inner(),
            Statement::Return(Some(at(binary(ident("x"), BinaryOperator::Multiply, int(2)))))
        );
    }

    #[test]
    fn test_print() {
        let statements = parse_statements("print person.age");
        assert_eq!(
            *statements[0].inner(),
            Statement::Print(at(field(ident("person"), "age")))
        );
    }

    #[test]
    fn test_nested_blocks() {
        let source = r#"
            for i in 1..3 loop
                while flag loop
                    if i = 2 then
                        flag := false
                    end
                end
            end
        "#;

        let statements = parse_statements(source);
        let Statement::For { body, .. } = statements[0].inner() else {
            panic!("expected a for loop");
        };
        let Statement::While { body, .. } = body[0].inner() else {
            panic!("expected a while loop");
        };
        assert!(matches!(body[0].inner(), Statement::If { .. }));
    }

    #[test]
    fn test_statement_positions() {
        let statements = parse_statements("  x := 1\n  if x then print x end");

        assert_eq!(statements[0].position(), Position::new(2, 3));
        assert_eq!(statements[1].position(), Position::new(3, 3));
    }
}

#[cfg(test)]
mod expression_tests {
    use super::*;

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_expression("10 + 20 * 3"),
            binary(
                int(10),
                BinaryOperator::Add,
                binary(int(20), BinaryOperator::Multiply, int(3))
            )
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        assert_eq!(
            parse_expression("(5 + 3) * 2"),
            binary(
                binary(int(5), BinaryOperator::Add, int(3)),
                BinaryOperator::Multiply,
                int(2)
            )
        );
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(
            parse_expression("8 / 4 % 3"),
            binary(
                binary(int(8), BinaryOperator::Divide, int(4)),
                BinaryOperator::Modulo,
                int(3)
            )
        );
    }

    #[test]
    fn test_and_binds_relational_operands() {
        assert_eq!(
            parse_expression("a < b and c >= d"),
            binary(
                binary(ident("a"), BinaryOperator::Less, ident("b")),
                BinaryOperator::And,
                binary(ident("c"), BinaryOperator::GreaterEqual, ident("d"))
            )
        );
    }

    #[test]
    fn test_or_is_looser_than_and() {
        assert_eq!(
            parse_expression("a or b and c"),
            binary(
                ident("a"),
                BinaryOperator::Or,
                binary(ident("b"), BinaryOperator::And, ident("c"))
            )
        );
    }

    #[test]
    fn test_xor_shares_level_with_or() {
        assert_eq!(
            parse_expression("a xor b or c"),
            binary(
                binary(ident("a"), BinaryOperator::Xor, ident("b")),
                BinaryOperator::Or,
                ident("c")
            )
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(
            parse_expression("not flag"),
            unary(UnaryOperator::Not, ident("flag"))
        );
    }

    #[test]
    fn test_not_is_looser_than_relational() {
        assert_eq!(
            parse_expression("not a = b"),
            unary(
                UnaryOperator::Not,
                binary(ident("a"), BinaryOperator::Equal, ident("b"))
            )
        );
    }

    #[test]
    fn test_negative_literal() {
        assert_eq!(
            parse_expression("-42"),
            unary(UnaryOperator::Negate, int(42))
        );
    }

    #[test]
    fn test_negation_binds_tighter_than_multiplication() {
        assert_eq!(
            parse_expression("-a * b"),
            binary(
                unary(UnaryOperator::Negate, ident("a")),
                BinaryOperator::Multiply,
                ident("b")
            )
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_expression("3.25"), Expression::Real(3.25));
        assert_eq!(parse_expression("true"), Expression::Boolean(true));
        assert_eq!(parse_expression("false"), Expression::Boolean(false));
    }

    #[test]
    fn test_nested_record_access() {
        assert_eq!(
            parse_expression("person.addr.street"),
            field(field(ident("person"), "addr"), "street")
        );
    }

    #[test]
    fn test_array_access() {
        assert_eq!(
            parse_expression("m[1][j]"),
            Expression::ArrayAccess {
                array: boxed(Expression::ArrayAccess {
                    array: boxed(ident("m")),
                    index: boxed(int(1)),
                }),
                index: boxed(ident("j")),
            }
        );
    }

    #[test]
    fn test_call_arguments() {
        assert_eq!(
            parse_expression("max(1, x + 1)"),
            Expression::Call {
                routine: "max".to_string(),
                arguments: vec![
                    at(int(1)),
                    at(binary(ident("x"), BinaryOperator::Add, int(1)))
                ],
            }
        );
        assert_eq!(
            parse_expression("now()"),
            Expression::Call {
                routine: "now".to_string(),
                arguments: Vec::new(),
            }
        );
    }

    #[test]
    fn test_array_initializer() {
        assert_eq!(
            parse_expression("[1, 2, 3]"),
            Expression::ArrayInit(vec![at(int(1)), at(int(2)), at(int(3))])
        );
        assert_eq!(parse_expression("[]"), Expression::ArrayInit(Vec::new()));
    }

    #[test]
    fn test_range_as_value() {
        assert_eq!(
            parse_expression("1 .. 10"),
            Expression::Range {
                start: boxed(int(1)),
                end: boxed(int(10)),
            }
        );
    }

    #[test]
    fn test_binary_position_is_left_operand() {
        let statements = parse_statements("x := a\n  + b");

        let Statement::Assignment { value, .. } = statements[0].inner() else {
            panic!("expected an assignment");
        };
        assert_eq!(value.position(), Position::new(2, 6));
        let Expression::Binary { right, .. } = value.inner() else {
            panic!("expected a binary expression");
        };
        assert_eq!(right.position(), Position::new(3, 5));
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_unterminated_routine() {
        let err = assert_parse_fails("routine main() is\n  x := 1\n");

        assert_eq!(err.message(), "expected `end`, found end of input");
        assert_eq!((err.line(), err.column()), (3, 1));

        let diagnostic = &err.diagnostics()[0];
        assert_eq!(diagnostic.code(), Some(ErrorCode::E102));
        assert_eq!(diagnostic.labels()[1].message(), "`routine` block opened here");
        assert_eq!(diagnostic.labels()[1].span().line(), 1);
    }

    #[test]
    fn test_unterminated_if_reports_innermost_block() {
        let err = assert_parse_fails("routine main() is\n  if x then\n    print 1\n");

        let diagnostic = &err.diagnostics()[0];
        assert_eq!(diagnostic.code(), Some(ErrorCode::E102));
        assert_eq!(diagnostic.labels()[1].message(), "`if` block opened here");
        assert_eq!(diagnostic.labels()[1].span().line(), 2);
        assert_eq!(
            diagnostic.help(),
            Some("while parsing if statement inside routine declaration")
        );
    }

    #[test]
    fn test_unterminated_record() {
        let err = assert_parse_fails("type P is record x : integer");

        let diagnostic = &err.diagnostics()[0];
        assert_eq!(diagnostic.code(), Some(ErrorCode::E102));
        assert_eq!(diagnostic.labels()[1].message(), "`record` block opened here");
    }

    #[test]
    fn test_missing_then() {
        let err = assert_parse_fails("routine main() is\n  if x print 1 end\nend");

        assert_eq!(err.message(), "expected `then`, found `print`");
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E100));
        assert_error_at_position("routine main() is\n  if x print 1 end\nend", 2, 8);
    }

    #[test]
    fn test_statement_at_top_level() {
        let err = assert_parse_fails("x := 1");

        assert_eq!(err.message(), "expected a declaration, found identifier `x`");
        assert_error_at_position("x := 1", 1, 1);
    }

    #[test]
    fn test_missing_colon_in_variable() {
        assert_error_at_position("var x integer", 1, 7);
    }

    #[test]
    fn test_missing_type() {
        let err = assert_parse_fails("var x : is 1");
        assert_eq!(err.message(), "expected a type, found `is`");
    }

    #[test]
    fn test_call_is_not_assignable() {
        let err = assert_parse_fails("routine main() is f(1) := 2 end");
        assert_eq!(err.message(), "expected `:=`, found `(`");
    }

    #[test]
    fn test_trailing_comma_in_arguments() {
        let err = assert_parse_fails("routine main() is print f(1,) end");
        assert_eq!(err.message(), "expected an expression, found `)`");
    }

    #[test]
    fn test_for_requires_range() {
        let err = assert_parse_fails("routine main() is for i in 1 loop end end");
        assert_eq!(err.message(), "expected `..`, found `loop`");
    }

    #[test]
    fn test_missing_operand() {
        let err = assert_parse_fails("var x : integer is 1 +");
        assert_eq!(err.message(), "expected an expression, found end of input");
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_invalid_token_reaches_parser() {
        let err = assert_parse_fails("var x : integer is @");
        assert_eq!(
            err.message(),
            "expected an expression, found invalid input `@`"
        );
        assert_error_at_position("var x : integer is @", 1, 20);
    }

    #[test]
    fn test_stray_end() {
        let err = assert_parse_fails("routine main() is end end");
        assert_eq!(err.message(), "expected a declaration, found `end`");
    }
}

#[cfg(test)]
mod nesting_tests {
    use std::thread;

    use super::*;
    use crate::parser::MAX_NESTING;

    /// Run `f` on a thread with a generous stack so results do not depend on
    /// the test harness's default thread size.
    fn with_large_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(f)
            .expect("spawn parser thread")
            .join()
            .expect("parser thread should not panic")
    }

    fn parenthesized(depth: usize) -> String {
        format!("var x : integer is {}1{}", "(".repeat(depth), ")".repeat(depth))
    }

    fn assert_too_deep(source: String) -> ParseError {
        let err = with_large_stack(move || parser::parse(&source).map(|_| ()))
            .expect_err("deep nesting should be rejected");

        let diagnostic = &err.diagnostics()[0];
        assert_eq!(diagnostic.code(), Some(ErrorCode::E103));
        assert_eq!(diagnostic.message(), format!("nesting exceeds {MAX_NESTING} levels"));
        assert_eq!(
            diagnostic.help(),
            Some("move inner parts into variables or routines")
        );
        err
    }

    #[test]
    fn test_ten_thousand_parentheses_are_rejected() {
        let err = assert_too_deep(parenthesized(10_000));

        // The first parenthesis past the limit; `var x : integer is ` is 19 columns
        assert_eq!((err.line(), err.column()), (1, 20 + MAX_NESTING));
    }

    #[test]
    fn test_nesting_up_to_the_limit_parses() {
        let program = with_large_stack(|| parser::parse(&parenthesized(MAX_NESTING)));

        let program = program.expect("nesting at the limit is accepted");
        let Declaration::Variable(variable) = program.declarations[0].inner() else {
            panic!("Expected variable declaration");
        };
        assert_eq!(
            variable.initializer.as_ref().map(|value| value.inner().clone()),
            Some(int(1))
        );
    }

    #[test]
    fn test_one_past_the_limit_fails() {
        assert_too_deep(parenthesized(MAX_NESTING + 1));
    }

    #[test]
    fn test_deep_prefix_operators() {
        let nots = format!("routine main() is\n  x := {}true\nend\n", "not ".repeat(10_000));
        assert_too_deep(nots);

        let minuses = format!("routine main() is\n  x := {}1\nend\n", "- ".repeat(10_000));
        assert_too_deep(minuses);
    }

    #[test]
    fn test_deep_calls_and_indexing() {
        let calls = format!("var x : integer is {}1{}", "f(".repeat(5_000), ")".repeat(5_000));
        assert_too_deep(calls);

        let indexes = format!(
            "routine main() is\n  x := a{}\nend\n",
            "[a".repeat(5_000) + &"]".repeat(5_000)
        );
        assert_too_deep(indexes);
    }

    #[test]
    fn test_deep_statements() {
        let depth = 1_000;
        let source = format!(
            "routine main() is\n{}print 1\n{}end\n",
            "if true then\n".repeat(depth),
            "end\n".repeat(depth)
        );

        let err = assert_too_deep(source);
        assert_eq!(err.line(), 2 + MAX_NESTING);
    }

    #[test]
    fn test_moderate_statement_nesting_parses() {
        let depth = 40;
        let source = format!(
            "routine main() is\n{}print 1\n{}end\n",
            "while true loop\n".repeat(depth),
            "end\n".repeat(depth)
        );

        let program = with_large_stack(move || parser::parse(&source));
        assert!(program.is_ok(), "{program:?}");
    }

    #[test]
    fn test_deep_array_types() {
        let source = format!("type T is {}integer", "array [2] ".repeat(1_000));
        assert_too_deep(source);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Sums of products of small integer literals, e.g. `3 * 4 + 5`.
    fn arithmetic_strategy() -> impl Strategy<Value = (Vec<i64>, Vec<bool>)> {
        (1usize..8).prop_flat_map(|len| {
            (
                prop::collection::vec(0i64..100, len),
                prop::collection::vec(any::<bool>(), len - 1),
            )
        })
    }

    fn path_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z][a-z0-9_]{0,6}", 1..6).prop_filter("avoid keywords", |parts| {
            parts
                .iter()
                .all(|part| crate::tokens::Token::keyword(part).is_none())
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    fn evaluate(expression: &Expression) -> i64 {
        match expression {
            Expression::Integer(value) => *value,
            Expression::Binary {
                left,
                operator: BinaryOperator::Add,
                right,
            } => evaluate(left) + evaluate(right),
            Expression::Binary {
                left,
                operator: BinaryOperator::Multiply,
                right,
            } => evaluate(left) * evaluate(right),
            other => panic!("unexpected node {other:?}"),
        }
    }

    /// `true` in `is_product` joins neighbours with `*`, `false` with `+`.
    fn check_precedence(operands: &[i64], is_product: &[bool]) -> Result<(), TestCaseError> {
        let mut source = operands[0].to_string();
        let mut sum = 0;
        let mut product = operands[0];
        for (operand, &times) in operands[1..].iter().zip(is_product) {
            source.push_str(if times { " * " } else { " + " });
            source.push_str(&operand.to_string());
            if times {
                product *= operand;
            } else {
                sum += product;
                product = *operand;
            }
        }
        sum += product;

        let value = parse_expression(&source);
        prop_assert_eq!(evaluate(&value), sum, "source: {}", source);
        Ok(())
    }

    fn check_path_expansion(parts: &[String]) -> Result<(), TestCaseError> {
        let mut expression = parse_expression(&parts.join("."));

        for part in parts[1..].iter().rev() {
            let Expression::RecordAccess { record, field } = expression else {
                return Err(TestCaseError::fail(format!("expected field {part}")));
            };
            prop_assert_eq!(&field, part);
            expression = record.into_inner();
        }
        prop_assert_eq!(expression, ident(&parts[0]));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn precedence_matches_arithmetic((operands, is_product) in arithmetic_strategy()) {
            check_precedence(&operands, &is_product)?;
        }

        #[test]
        fn dotted_paths_expand_first_segment_innermost(parts in path_strategy()) {
            check_path_expansion(&parts)?;
        }
    }
}
