//! Source-like rendering of the syntax tree, used by tests and by `--ast`.
//!
//! Every expression is wrapped in parentheses so that grouping is explicit. Resolved identifiers
//! are rendered as `<name:id;start-end>`, unresolved ones as their bare name.
use crate::literate::{Block, CrossReference, Document};
use crate::parser::ast::{
    AssignmentExpression, BinaryExpression, CallExpression, ClassDeclaration, CodeBlock,
    Declaration, DeclareAssignmentExpression, Expression, ExpressionStatement,
    FunctionDeclaration, Identifier, IdentifierExpression, IfElseStatement, LiteralExpression,
    MethodDeclaration, ReturnStatement, Statement,
};
use std::fmt::Write;

pub fn display_code_block(block: &CodeBlock) -> Result<String, std::fmt::Error> {
    let mut buffer = String::new();
    _display_code_block(&mut buffer, block, 0)?;
    Ok(buffer)
}

pub fn display_declaration(d: &Declaration) -> Result<String, std::fmt::Error> {
    let mut buffer = String::new();
    _display_declaration(&mut buffer, d, 0)?;
    writeln!(buffer)?;
    Ok(buffer)
}

/// Render a literate document, with declarations pretty-printed in place and cross-references
/// tagged with the id they resolved to.
pub fn display_document(document: &Document) -> Result<String, std::fmt::Error> {
    let mut buffer = String::new();
    for block in &document.blocks {
        match block {
            Block::RawText(text) => buffer.push_str(text),
            Block::Declaration(d) => _display_declaration(&mut buffer, &d.declaration, 0)?,
            Block::UpReference(r) => _display_cross_reference(&mut buffer, '@', r)?,
            Block::DownReference(r) => _display_cross_reference(&mut buffer, '!', r)?,
        }
    }
    Ok(buffer)
}

fn _display_code_block(w: &mut impl Write, block: &CodeBlock, depth: usize) -> std::fmt::Result {
    for statement in &block.0 {
        write!(w, "{}", "    ".repeat(depth))?;
        _display_statement(w, statement, depth)?;
        writeln!(w)?;
    }
    Ok(())
}

fn _display_statement(w: &mut impl Write, s: &Statement, depth: usize) -> std::fmt::Result {
    match s {
        Statement::Expression(ExpressionStatement(e)) => {
            _display_expression(w, e)?;
            write!(w, ";")
        }
        Statement::Return(ReturnStatement { value }) => {
            write!(w, "return ")?;
            _display_expression(w, value)?;
            write!(w, ";")
        }
        Statement::IfElse(IfElseStatement {
            condition,
            if_branch,
            else_branch,
        }) => {
            write!(w, "if ")?;
            _display_expression(w, condition)?;
            writeln!(w, " {{")?;
            _display_code_block(w, if_branch, depth + 1)?;
            write!(w, "{}}}", "    ".repeat(depth))?;
            if let Some(else_branch) = else_branch {
                writeln!(w, " else {{")?;
                _display_code_block(w, else_branch, depth + 1)?;
                write!(w, "{}}}", "    ".repeat(depth))?;
            }
            Ok(())
        }
        Statement::Declaration(d) => _display_declaration(w, d, depth),
    }
}

fn _display_declaration(w: &mut impl Write, d: &Declaration, depth: usize) -> std::fmt::Result {
    let body = match d {
        Declaration::Class(ClassDeclaration { name, body }) => {
            write!(w, "\\class{{")?;
            _display_identifier(w, name)?;
            write!(w, "}}")?;
            body
        }
        Declaration::Function(FunctionDeclaration {
            name,
            parameters,
            body,
        }) => {
            write!(w, "\\fun{{")?;
            _display_identifier(w, name)?;
            write!(w, "}}")?;
            _display_parameters(w, parameters)?;
            body
        }
        Declaration::Method(MethodDeclaration {
            class,
            name,
            parameters,
            body,
        }) => {
            write!(w, "\\fun{{")?;
            _display_identifier(w, class)?;
            write!(w, "::")?;
            _display_identifier(w, name)?;
            write!(w, "}}")?;
            _display_parameters(w, parameters)?;
            body
        }
    };
    writeln!(w, "{{")?;
    _display_code_block(w, body, depth + 1)?;
    write!(w, "{}}}", "    ".repeat(depth))
}

fn _display_parameters(w: &mut impl Write, parameters: &[Identifier]) -> std::fmt::Result {
    write!(w, "{{")?;
    for (i, parameter) in parameters.iter().enumerate() {
        if i > 0 {
            write!(w, ", ")?;
        }
        _display_identifier(w, parameter)?;
    }
    write!(w, "}}")
}

fn _display_expression(w: &mut impl Write, e: &Expression) -> std::fmt::Result {
    write!(w, "(")?;
    match e {
        Expression::Literal(LiteralExpression::String(s)) => write!(w, "{s:?}")?,
        Expression::Literal(LiteralExpression::Number(n)) => write!(w, "{n}")?,
        Expression::Identifier(IdentifierExpression { identifier }) => {
            _display_identifier(w, identifier)?
        }
        Expression::Binary(BinaryExpression {
            left,
            operator,
            right,
        }) => {
            _display_expression(w, left)?;
            write!(w, " {} ", operator.symbol())?;
            _display_expression(w, right)?;
        }
        Expression::Call(CallExpression { callee, arguments }) => {
            _display_expression(w, callee)?;
            write!(w, "(")?;
            for (i, argument) in arguments.iter().enumerate() {
                if i > 0 {
                    write!(w, ", ")?;
                }
                _display_expression(w, argument)?;
            }
            write!(w, ")")?;
        }
        Expression::Assignment(AssignmentExpression { target, value }) => {
            _display_expression(w, target)?;
            write!(w, " = ")?;
            _display_expression(w, value)?;
        }
        Expression::DeclareAssignment(DeclareAssignmentExpression { identifier, value }) => {
            _display_identifier(w, identifier)?;
            write!(w, " := ")?;
            _display_expression(w, value)?;
        }
    }
    write!(w, ")")
}

fn _display_identifier(w: &mut impl Write, identifier: &Identifier) -> std::fmt::Result {
    if identifier.is_resolved() {
        write!(
            w,
            "<{}:{};{}-{}>",
            identifier.name, identifier.id, identifier.range.start, identifier.range.end
        )
    } else {
        write!(w, "{}", identifier.name)
    }
}

fn _display_cross_reference(
    w: &mut impl Write,
    marker: char,
    r: &CrossReference,
) -> std::fmt::Result {
    if r.is_resolved() {
        write!(w, "{marker}<{}:{}>", r.name, r.id)
    } else {
        write!(w, "{marker}{}", r.name)
    }
}
