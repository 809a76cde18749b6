use crate::parser::ast::{
    CodeBlock, Declaration, Expression, ExpressionStatement, Identifier, IdentifierExpression,
    Statement,
};
use crate::prelude::BUILTIN_NAMES;
use crate::resolver::environment::{Environment, LookupFailure};
use crate::resolver::{BindingId, Resolution, ResolveError};

/// Binds every identifier occurrence to a [`BindingId`].
///
/// Top-level declarations are registered with [`IdentResolver::add`], which makes their names
/// visible to each other regardless of order; their bodies are resolved by
/// [`IdentResolver::finalize`]. Every block is resolved in two passes: the first one hoists
/// nested declarations and reserves the names introduced by `:=`, the second one binds
/// references from left to right.
pub struct IdentResolver<'a> {
    environment: Environment,
    declarations: Vec<&'a mut Declaration>,
    definitions: Vec<Identifier>,
    references: Vec<Identifier>,
}

impl<'a> IdentResolver<'a> {
    pub fn new() -> Self {
        Self::with_builtins(BUILTIN_NAMES.iter().copied())
    }

    /// Builtins are registered first, in order, so they get the lowest ids.
    pub fn with_builtins<'n>(names: impl IntoIterator<Item = &'n str>) -> Self {
        let mut environment = Environment::new();
        for name in names {
            if environment.define_global(name).is_none() {
                tracing::debug!(name, "builtin registered twice, ignoring");
            }
        }
        Self {
            environment,
            declarations: vec![],
            definitions: vec![],
            references: vec![],
        }
    }

    /// Register a top-level declaration under its qualified name.
    pub fn add(&mut self, declaration: &'a mut Declaration) -> Result<BindingId, ResolveError> {
        let name = declaration.qualified_name();
        let Some(id) = self.environment.define_global(&name) else {
            return Err(ResolveError::DuplicateDefinition {
                name,
                range: declaration.name().range,
            });
        };
        tracing::debug!(%name, id, "registered top-level declaration");
        self.bind_definition(declaration.name_mut(), id);
        self.declarations.push(declaration);
        Ok(id)
    }

    /// Resolve a block that is not attached to a top-level declaration, e.g. a whole fun source.
    pub fn resolve_block(&mut self, block: &mut CodeBlock) -> Result<(), ResolveError> {
        self.resolve_code_block(block)
    }

    /// Resolve the bodies of every registered declaration.
    pub fn finalize(mut self) -> Result<Resolution, ResolveError> {
        for declaration in std::mem::take(&mut self.declarations) {
            self.resolve_declaration(declaration)?;
        }
        Ok(Resolution {
            definitions: self.definitions,
            references: self.references,
        })
    }

    fn in_scope<F>(&mut self, f: F) -> Result<(), ResolveError>
    where
        F: FnOnce(&mut Self) -> Result<(), ResolveError>,
    {
        let scope_guard = self.environment.enter_scope();
        let outcome = f(self);
        self.environment.exit_scope(scope_guard);
        outcome
    }

    fn resolve_code_block(&mut self, block: &mut CodeBlock) -> Result<(), ResolveError> {
        self.in_scope(|r| {
            r.hoist(block)?;
            for statement in block.0.iter_mut() {
                r.resolve_statement(statement)?;
            }
            Ok(())
        })
    }

    fn hoist(&mut self, block: &mut CodeBlock) -> Result<(), ResolveError> {
        for statement in block.0.iter_mut() {
            match statement {
                Statement::Declaration(declaration) => {
                    let name = declaration.qualified_name();
                    let Some(id) = self.environment.define(&name) else {
                        return Err(ResolveError::DuplicateDefinition {
                            name,
                            range: declaration.name().range,
                        });
                    };
                    self.bind_definition(declaration.name_mut(), id);
                }
                Statement::Expression(ExpressionStatement(e)) => self.reserve_declared_names(e),
                Statement::Return(r) => self.reserve_declared_names(&r.value),
                // `if` opens its own scope and hoists its condition there.
                Statement::IfElse(_) => {}
            }
        }
        Ok(())
    }

    fn reserve_declared_names(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(_) | Expression::Identifier(_) => {}
            Expression::Binary(b) => {
                self.reserve_declared_names(&b.left);
                self.reserve_declared_names(&b.right);
            }
            Expression::Call(c) => {
                self.reserve_declared_names(&c.callee);
                for argument in &c.arguments {
                    self.reserve_declared_names(argument);
                }
            }
            Expression::Assignment(a) => {
                self.reserve_declared_names(&a.target);
                self.reserve_declared_names(&a.value);
            }
            Expression::DeclareAssignment(d) => {
                self.environment.reserve(&d.identifier.name);
                self.reserve_declared_names(&d.value);
            }
        }
    }

    fn resolve_statement(&mut self, statement: &mut Statement) -> Result<(), ResolveError> {
        match statement {
            Statement::Expression(ExpressionStatement(e)) => self.resolve_expression(e),
            Statement::Return(r) => self.resolve_expression(&mut r.value),
            Statement::Declaration(d) => self.resolve_declaration(d),
            Statement::IfElse(ifelse) => self.in_scope(|r| {
                r.reserve_declared_names(&ifelse.condition);
                r.resolve_expression(&mut ifelse.condition)?;
                r.resolve_code_block(&mut ifelse.if_branch)?;
                if let Some(else_branch) = &mut ifelse.else_branch {
                    r.resolve_code_block(else_branch)?;
                }
                Ok(())
            }),
        }
    }

    /// Resolves the body of a declaration whose name has already been bound.
    fn resolve_declaration(&mut self, declaration: &mut Declaration) -> Result<(), ResolveError> {
        match declaration {
            Declaration::Class(c) => self.resolve_code_block(&mut c.body),
            Declaration::Function(f) => self.resolve_callable(&mut f.parameters, &mut f.body),
            Declaration::Method(m) => {
                self.bind_reference(&mut m.class)?;
                self.resolve_callable(&mut m.parameters, &mut m.body)
            }
        }
    }

    fn resolve_callable(
        &mut self,
        parameters: &mut [Identifier],
        body: &mut CodeBlock,
    ) -> Result<(), ResolveError> {
        self.in_scope(|r| {
            for parameter in parameters.iter_mut() {
                let Some(id) = r.environment.define(&parameter.name) else {
                    return Err(ResolveError::DuplicateDefinition {
                        name: parameter.name.clone(),
                        range: parameter.range,
                    });
                };
                r.bind_definition(parameter, id);
            }
            r.resolve_code_block(body)
        })
    }

    fn resolve_expression(&mut self, expr: &mut Expression) -> Result<(), ResolveError> {
        match expr {
            Expression::Literal(_) => Ok(()),
            Expression::Identifier(IdentifierExpression { identifier }) => {
                self.bind_reference(identifier)
            }
            Expression::Binary(b) => {
                self.resolve_expression(&mut b.left)?;
                self.resolve_expression(&mut b.right)
            }
            Expression::Call(c) => {
                self.resolve_expression(&mut c.callee)?;
                for argument in c.arguments.iter_mut() {
                    self.resolve_expression(argument)?;
                }
                Ok(())
            }
            Expression::Assignment(a) => {
                let Expression::Identifier(IdentifierExpression { identifier }) = a.target.as_mut()
                else {
                    return Err(ResolveError::InvalidAssignmentTarget);
                };
                self.bind_reference(identifier)?;
                self.resolve_expression(&mut a.value)
            }
            Expression::DeclareAssignment(d) => {
                // The right-hand side still sees the enclosing binding of the same name.
                self.resolve_expression(&mut d.value)?;
                let id = self.environment.rebind(&d.identifier.name);
                self.bind_definition(&mut d.identifier, id);
                Ok(())
            }
        }
    }

    fn bind_definition(&mut self, identifier: &mut Identifier, id: BindingId) {
        identifier.bind(id);
        tracing::trace!(name = %identifier.name, id, "definition");
        self.definitions.push(identifier.clone());
    }

    fn bind_reference(&mut self, identifier: &mut Identifier) -> Result<(), ResolveError> {
        let id = match self.environment.get(&identifier.name) {
            Ok(id) => id,
            Err(LookupFailure::Undefined) => {
                return Err(ResolveError::UndefinedIdentifier {
                    name: identifier.name.clone(),
                    range: identifier.range,
                })
            }
            Err(LookupFailure::Uninitialized) => {
                return Err(ResolveError::UsedBeforeDeclaration {
                    name: identifier.name.clone(),
                    range: identifier.range,
                })
            }
        };
        identifier.bind(id);
        tracing::trace!(name = %identifier.name, id, "reference");
        self.references.push(identifier.clone());
        Ok(())
    }
}

impl<'a> Default for IdentResolver<'a> {
    fn default() -> Self {
        Self::new()
    }
}
