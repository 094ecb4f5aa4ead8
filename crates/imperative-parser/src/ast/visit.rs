//! Read-only traversal over the syntax tree.
//!
//! Implement [`Visit`] and override the methods for the nodes you care
//! about; the defaults call the matching `walk_*` function, which visits the
//! children in source order. The `walk_*` functions match exhaustively on
//! every variant, so a new node kind fails to compile here instead of being
//! silently skipped by consumers.

use crate::ast::{
    Declaration, Expression, Located, Parameter, Program, Statement, Type, VariableDeclaration,
};

pub trait Visit {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_declaration(&mut self, declaration: &Located<Declaration>) {
        walk_declaration(self, declaration);
    }

    /// A variable declaration or a record field.
    fn visit_variable(&mut self, variable: &Located<VariableDeclaration>) {
        walk_variable(self, variable);
    }

    fn visit_parameter(&mut self, parameter: &Located<Parameter>) {
        walk_parameter(self, parameter);
    }

    fn visit_type(&mut self, ty: &Located<Type>) {
        walk_type(self, ty);
    }

    /// A named statement list: `body`, `then`, `else`.
    fn visit_statements(&mut self, label: &'static str, statements: &[Located<Statement>]) {
        let _ = label;
        walk_statements(self, statements);
    }

    fn visit_statement(&mut self, statement: &Located<Statement>) {
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expression: &Located<Expression>) {
        walk_expression(self, expression);
    }
}

pub fn walk_program<V: Visit + ?Sized>(visitor: &mut V, program: &Program) {
    for declaration in &program.declarations {
        visitor.visit_declaration(declaration);
    }
}

pub fn walk_declaration<V: Visit + ?Sized>(visitor: &mut V, declaration: &Located<Declaration>) {
    match declaration.inner() {
        Declaration::Variable(variable) => {
            visitor.visit_type(&variable.ty);
            if let Some(initializer) = &variable.initializer {
                visitor.visit_expression(initializer);
            }
        }
        Declaration::Type(alias) => visitor.visit_type(&alias.ty),
        Declaration::Routine(routine) => {
            for parameter in &routine.parameters {
                visitor.visit_parameter(parameter);
            }
            if let Some(return_type) = &routine.return_type {
                visitor.visit_type(return_type);
            }
            for local in &routine.body.declarations {
                visitor.visit_declaration(local);
            }
            visitor.visit_statements("body", &routine.body.statements);
        }
    }
}

pub fn walk_variable<V: Visit + ?Sized>(visitor: &mut V, variable: &Located<VariableDeclaration>) {
    visitor.visit_type(&variable.ty);
    if let Some(initializer) = &variable.initializer {
        visitor.visit_expression(initializer);
    }
}

pub fn walk_parameter<V: Visit + ?Sized>(visitor: &mut V, parameter: &Located<Parameter>) {
    visitor.visit_type(&parameter.ty);
}

pub fn walk_type<V: Visit + ?Sized>(visitor: &mut V, ty: &Located<Type>) {
    match ty.inner() {
        Type::Primitive(_) | Type::UserDefined(_) => {}
        Type::Array { size, element } => {
            visitor.visit_expression(size);
            visitor.visit_type(element);
        }
        Type::Record { fields } => {
            for field in fields {
                visitor.visit_variable(field);
            }
        }
    }
}

pub fn walk_statements<V: Visit + ?Sized>(visitor: &mut V, statements: &[Located<Statement>]) {
    for statement in statements {
        visitor.visit_statement(statement);
    }
}

pub fn walk_statement<V: Visit + ?Sized>(visitor: &mut V, statement: &Located<Statement>) {
    match statement.inner() {
        Statement::Assignment { target, value } => {
            visitor.visit_expression(target);
            visitor.visit_expression(value);
        }
        Statement::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expression(condition);
            visitor.visit_statements("then", then_branch);
            if !else_branch.is_empty() {
                visitor.visit_statements("else", else_branch);
            }
        }
        Statement::While { condition, body } => {
            visitor.visit_expression(condition);
            visitor.visit_statements("body", body);
        }
        Statement::For { range, body, .. } => {
            visitor.visit_expression(range);
            visitor.visit_statements("body", body);
        }
        Statement::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expression(value);
            }
        }
        Statement::Print(value) => visitor.visit_expression(value),
    }
}

pub fn walk_expression<V: Visit + ?Sized>(visitor: &mut V, expression: &Located<Expression>) {
    match expression.inner() {
        Expression::Binary { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        Expression::Unary { operand, .. } => visitor.visit_expression(operand),
        Expression::Integer(_)
        | Expression::Real(_)
        | Expression::Boolean(_)
        | Expression::Identifier(_) => {}
        Expression::ArrayAccess { array, index } => {
            visitor.visit_expression(array);
            visitor.visit_expression(index);
        }
        Expression::RecordAccess { record, .. } => visitor.visit_expression(record),
        Expression::Call { arguments, .. } => {
            for argument in arguments {
                visitor.visit_expression(argument);
            }
        }
        Expression::Range { start, end } => {
            visitor.visit_expression(start);
            visitor.visit_expression(end);
        }
        Expression::ArrayInit(elements) => {
            for element in elements {
                visitor.visit_expression(element);
            }
        }
    }
}
