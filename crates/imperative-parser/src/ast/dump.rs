//! Indented, depth-first text rendering of a syntax tree.

use std::fmt::Write as _;

use crate::ast::{
    Declaration, Expression, Located, Parameter, Position, Program, Statement, Type,
    VariableDeclaration,
    visit::{
        Visit, walk_declaration, walk_expression, walk_parameter, walk_statement,
        walk_statements, walk_type, walk_variable,
    },
};

const INDENT: &str = "  ";

/// Render `program` one node per line, children indented below their parent.
///
/// ```
/// let program = imperative_parser::parse("var x : integer is 1 + 2").unwrap();
/// let text = imperative_parser::ast::dump(&program);
///
/// assert_eq!(
///     text,
///     "Program\n\
///      \x20 VariableDeclaration x [1:1]\n\
///      \x20   PrimitiveType integer [1:9]\n\
///      \x20   BinaryOp + [1:20]\n\
///      \x20     IntegerLiteral 1 [1:20]\n\
///      \x20     IntegerLiteral 2 [1:24]\n"
/// );
/// ```
pub fn dump(program: &Program) -> String {
    let mut dumper = Dumper::default();
    dumper.visit_program(program);
    dumper.out
}

#[derive(Default)]
struct Dumper {
    out: String,
    depth: usize,
}

impl Dumper {
    fn line(&mut self, text: &str, position: Option<Position>) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        if let Some(position) = position {
            let _ = write!(self.out, " [{position}]");
        }
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }
}

impl Visit for Dumper {
    fn visit_program(&mut self, program: &Program) {
        self.line("Program", None);
        self.nested(|this| {
            for declaration in &program.declarations {
                this.visit_declaration(declaration);
            }
        });
    }

    fn visit_declaration(&mut self, declaration: &Located<Declaration>) {
        let text = match declaration.inner() {
            Declaration::Variable(variable) => format!("VariableDeclaration {}", variable.name),
            Declaration::Type(alias) => format!("TypeDeclaration {}", alias.name),
            Declaration::Routine(routine) => format!("RoutineDeclaration {}", routine.name),
        };
        self.line(&text, Some(declaration.position()));
        self.nested(|this| walk_declaration(this, declaration));
    }

    fn visit_variable(&mut self, variable: &Located<VariableDeclaration>) {
        self.line(&format!("Field {}", variable.name), Some(variable.position()));
        self.nested(|this| walk_variable(this, variable));
    }

    fn visit_parameter(&mut self, parameter: &Located<Parameter>) {
        self.line(&format!("Parameter {}", parameter.name), Some(parameter.position()));
        self.nested(|this| walk_parameter(this, parameter));
    }

    fn visit_type(&mut self, ty: &Located<Type>) {
        let text = match ty.inner() {
            Type::Primitive(primitive) => format!("PrimitiveType {}", primitive.name()),
            Type::UserDefined(name) => format!("UserType {name}"),
            Type::Array { .. } => "ArrayType".to_string(),
            Type::Record { .. } => "RecordType".to_string(),
        };
        self.line(&text, Some(ty.position()));
        self.nested(|this| walk_type(this, ty));
    }

    fn visit_statements(&mut self, label: &'static str, statements: &[Located<Statement>]) {
        self.line(&format!("{label}:"), None);
        self.nested(|this| walk_statements(this, statements));
    }

    fn visit_statement(&mut self, statement: &Located<Statement>) {
        let text = match statement.inner() {
            Statement::Assignment { .. } => "Assignment".to_string(),
            Statement::If { .. } => "If".to_string(),
            Statement::While { .. } => "While".to_string(),
            Statement::For {
                variable, reverse, ..
            } => {
                if *reverse {
                    format!("For {variable} reverse")
                } else {
                    format!("For {variable}")
                }
            }
            Statement::Return(_) => "Return".to_string(),
            Statement::Print(_) => "Print".to_string(),
        };
        self.line(&text, Some(statement.position()));
        self.nested(|this| walk_statement(this, statement));
    }

    fn visit_expression(&mut self, expression: &Located<Expression>) {
        let text = match expression.inner() {
            Expression::Binary { operator, .. } => format!("BinaryOp {operator}"),
            Expression::Unary { operator, .. } => format!("UnaryOp {operator}"),
            Expression::Integer(value) => format!("IntegerLiteral {value}"),
            Expression::Real(value) => format!("RealLiteral {value}"),
            Expression::Boolean(value) => format!("BooleanLiteral {value}"),
            Expression::Identifier(name) => format!("Identifier {name}"),
            Expression::ArrayAccess { .. } => "ArrayAccess".to_string(),
            Expression::RecordAccess { field, .. } => format!("RecordAccess .{field}"),
            Expression::Call { routine, .. } => format!("Call {routine}"),
            Expression::Range { .. } => "Range".to_string(),
            Expression::ArrayInit(_) => "ArrayInitializer".to_string(),
        };
        self.line(&text, Some(expression.position()));
        self.nested(|this| walk_expression(this, expression));
    }
}
