use lafun::literate::{Block, Document};
use lafun::parser::ast::Identifier;
use lafun::parser::parse_declaration_at;
use lafun::prelude::JS_PRELUDE;
use lafun::resolver::{BindingId, Resolution};
use lafun::{compile, CompiledProgram};

/// Compile the provided fun source code.
/// Panics if the program does not parse or resolve.
pub fn compile_ok(source: &str) -> CompiledProgram {
    match compile(source) {
        Ok(program) => program,
        Err(e) => panic!("Failed to compile the source code: {e}"),
    }
}

/// The generated code, without the prelude.
pub fn generated(code: &str) -> &str {
    code.strip_prefix(JS_PRELUDE)
        .expect("The generated code does not start with the prelude")
}

/// The ids bound to every occurrence of `name`, definitions first, in binding order.
pub fn ids_of(resolution: &Resolution, name: &str) -> (Vec<BindingId>, Vec<BindingId>) {
    let ids = |sites: &[Identifier]| {
        sites
            .iter()
            .filter(|site| site.name == name)
            .map(|site| site.id)
            .collect()
    };
    (ids(&resolution.definitions), ids(&resolution.references))
}

/// A declaration block parsed from a standalone snippet.
pub fn declaration(source: &str) -> Block {
    let (declaration, range) = parse_declaration_at(source, 0).unwrap();
    Block::Declaration(lafun::literate::DeclarationBlock { declaration, range })
}

pub fn text(s: &str) -> Block {
    Block::RawText(s.to_owned())
}

pub fn document(blocks: Vec<Block>) -> Document {
    Document { blocks }
}
