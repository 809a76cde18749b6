pub mod codegen;
pub mod literate;
pub mod parser;
pub mod prelude;
pub mod printer;
pub mod resolver;
pub mod scanner;

use crate::codegen::Codegen;
use crate::literate::{read_document, resolve_cross_references, Document, UnresolvedCrossReference};
use crate::parser::ast::{ByteRange, CodeBlock};
use crate::parser::{parse_source, ParseError};
use crate::prelude::JS_PRELUDE;
use crate::resolver::{IdentResolver, Resolution, ResolveError};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Failed to write the generated code")]
    Emit(#[from] std::fmt::Error),
}

impl CompileError {
    /// Where in the source the error was detected, if anywhere.
    pub fn range(&self) -> Option<ByteRange> {
        match self {
            CompileError::Parse(e) => Some(e.range),
            CompileError::Resolve(e) => e.range(),
            CompileError::Emit(_) => None,
        }
    }
}

/// A plain fun program, resolved and lowered to JavaScript.
#[derive(Debug)]
pub struct CompiledProgram {
    pub program: CodeBlock,
    pub resolution: Resolution,
    /// The prelude followed by the generated code.
    pub code: String,
}

/// A literate document: its declarations are compiled, its cross-references resolved.
#[derive(Debug)]
pub struct CompiledDocument {
    pub document: Document,
    pub resolution: Resolution,
    pub warnings: Vec<UnresolvedCrossReference>,
    pub code: String,
}

/// Compile a fun source file to JavaScript.
pub fn compile(source: &str) -> Result<CompiledProgram, CompileError> {
    let mut program = parse_source(source)?;

    let mut resolver = IdentResolver::new();
    resolver.resolve_block(&mut program)?;
    let resolution = resolver.finalize()?;

    let mut code = String::from(JS_PRELUDE);
    let mut codegen = Codegen::new();
    for statement in &program.0 {
        codegen.add(statement);
    }
    codegen.generate(&mut code)?;
    tracing::debug!(bytes = code.len(), "generated program");

    Ok(CompiledProgram {
        program,
        resolution,
        code,
    })
}

/// Compile the declarations embedded in a literate document and resolve its cross-references.
///
/// Every declaration in the document is top-level: they can all see each other, whatever their
/// order. Unresolved cross-references do not fail the compilation, they are returned as warnings.
pub fn compile_document(source: &str) -> Result<CompiledDocument, CompileError> {
    let mut document = read_document(source)?;

    let mut resolver = IdentResolver::new();
    for declaration in document.declarations_mut() {
        resolver.add(declaration)?;
    }
    let resolution = resolver.finalize()?;
    let warnings = resolve_cross_references(&mut document);

    let mut code = String::from(JS_PRELUDE);
    let mut codegen = Codegen::new();
    for declaration in document.declarations() {
        codegen.add_declaration(declaration);
    }
    codegen.generate(&mut code)?;
    tracing::debug!(
        bytes = code.len(),
        warnings = warnings.len(),
        "generated document"
    );

    Ok(CompiledDocument {
        document,
        resolution,
        warnings,
        code,
    })
}
