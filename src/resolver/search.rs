use crate::parser::ast::{
    CodeBlock, Declaration, Expression, ExpressionStatement, Identifier, IdentifierExpression,
    Statement,
};
use crate::resolver::BindingId;

/// The id of the last resolved occurrence of `name` inside `declaration`.
///
/// "Last" is in source order: the occurrence a reader meets first when scrolling up.
pub fn find_upwards_in(declaration: &Declaration, name: &str) -> Option<BindingId> {
    occurrences(declaration, name).last().copied()
}

/// The id of the first resolved occurrence of `name` inside `declaration`.
pub fn find_downwards_in(declaration: &Declaration, name: &str) -> Option<BindingId> {
    occurrences(declaration, name).first().copied()
}

fn occurrences(declaration: &Declaration, name: &str) -> Vec<BindingId> {
    let mut search = Search { name, ids: vec![] };
    search.declaration(declaration);
    search.ids
}

struct Search<'n> {
    name: &'n str,
    ids: Vec<BindingId>,
}

impl<'n> Search<'n> {
    fn identifier(&mut self, identifier: &Identifier) {
        if identifier.name == self.name && identifier.is_resolved() {
            self.ids.push(identifier.id);
        }
    }

    fn declaration(&mut self, declaration: &Declaration) {
        let (parameters, body) = match declaration {
            Declaration::Class(c) => {
                self.identifier(&c.name);
                (&[] as &[Identifier], &c.body)
            }
            Declaration::Function(f) => {
                self.identifier(&f.name);
                (&f.parameters[..], &f.body)
            }
            Declaration::Method(m) => {
                self.identifier(&m.class);
                self.identifier(&m.name);
                (&m.parameters[..], &m.body)
            }
        };
        for parameter in parameters {
            self.identifier(parameter);
        }
        self.code_block(body);
    }

    fn code_block(&mut self, block: &CodeBlock) {
        for statement in &block.0 {
            match statement {
                Statement::Expression(ExpressionStatement(e)) => self.expression(e),
                Statement::Return(r) => self.expression(&r.value),
                Statement::Declaration(d) => self.declaration(d),
                Statement::IfElse(ifelse) => {
                    self.expression(&ifelse.condition);
                    self.code_block(&ifelse.if_branch);
                    if let Some(else_branch) = &ifelse.else_branch {
                        self.code_block(else_branch);
                    }
                }
            }
        }
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(_) => {}
            Expression::Identifier(IdentifierExpression { identifier }) => {
                self.identifier(identifier)
            }
            Expression::Binary(b) => {
                self.expression(&b.left);
                self.expression(&b.right);
            }
            Expression::Call(c) => {
                self.expression(&c.callee);
                for argument in &c.arguments {
                    self.expression(argument);
                }
            }
            Expression::Assignment(a) => {
                self.expression(&a.target);
                self.expression(&a.value);
            }
            Expression::DeclareAssignment(d) => {
                self.identifier(&d.identifier);
                self.expression(&d.value);
            }
        }
    }
}
