use crate::helpers::{declaration, document, text};
use lafun::literate::{resolve_cross_references, Block, CrossReference, Direction, Document};
use lafun::parser::ast::ByteRange;
use lafun::printer::display_document;
use lafun::resolver::IdentResolver;
use lafun::{compile_document, CompileError};

fn up(name: &str) -> Block {
    Block::UpReference(CrossReference::new(name, ByteRange::default()))
}

fn down(name: &str) -> Block {
    Block::DownReference(CrossReference::new(name, ByteRange::default()))
}

/// Two declarations mentioning `A`, at indices 2 and 7, and the given block at index 5.
fn document_around(middle: Block) -> Document {
    document(vec![
        text("Before anything, "),
        up("A"),
        declaration(r"\fun{f}{A}{ return A; }"),
        text(" and "),
        text("then "),
        middle,
        text(" until "),
        declaration(r"\fun{g}{}{ A := 1; }"),
        text("."),
    ])
}

fn resolve(document: &mut Document) {
    let mut resolver = IdentResolver::new();
    for declaration in document.declarations_mut() {
        resolver.add(declaration).unwrap();
    }
    resolver.finalize().unwrap();
    assert!(resolve_cross_references(document).is_empty());
}

fn reference_id(document: &Document, index: usize) -> u64 {
    document.blocks[index]
        .cross_reference()
        .map(|(_, r)| r.id)
        .unwrap()
}

fn name_id(document: &Document, index: usize, name: &str) -> u64 {
    let declaration = document.blocks[index].declaration().unwrap();
    lafun::resolver::find_downwards_in(declaration, name).unwrap()
}

#[test]
fn up_references_find_the_nearest_declaration_above() {
    let mut document = document_around(up("A"));
    resolve(&mut document);
    assert_eq!(reference_id(&document, 5), name_id(&document, 2, "A"));
}

#[test]
fn down_references_find_the_nearest_declaration_below() {
    let mut document = document_around(down("A"));
    resolve(&mut document);
    assert_eq!(reference_id(&document, 5), name_id(&document, 7, "A"));
    assert_ne!(name_id(&document, 2, "A"), name_id(&document, 7, "A"));
}

#[test]
fn up_references_with_nothing_above_look_below() {
    let mut document = document_around(up("A"));
    resolve(&mut document);
    assert_eq!(reference_id(&document, 1), name_id(&document, 2, "A"));
}

#[test]
fn documents_compile_with_warnings_for_dangling_references() {
    let source = r"\section{Points} A !Point scales by @k.
\class{Point}{ x := 3; }
\fun{Point::scale}{k}{ return k * 2; }
Unknown: @nothing.
";
    let compiled = compile_document(source).unwrap();

    let references: Vec<_> = compiled
        .document
        .cross_references()
        .map(|(direction, r)| (direction, r.name.as_str(), r.id))
        .collect();
    assert_eq!(
        references,
        vec![
            (Direction::Down, "Point", 5),
            (Direction::Up, "k", 8),
            (Direction::Up, "nothing", 0),
        ]
    );

    assert_eq!(compiled.warnings.len(), 1);
    let warning = &compiled.warnings[0];
    assert_eq!(warning.name, "nothing");
    assert_eq!(warning.range.line_col(source), (4, 10));

    let rendered = display_document(&compiled.document).unwrap();
    assert!(rendered.starts_with(r"\section{Points} A !<Point:5> scales by @<k:8>."));
    assert!(rendered.ends_with("Unknown: @nothing.\n"));
}

#[test]
fn parse_errors_abort_the_document() {
    let source = "Intro.\n\\class{Broken}{ x := ; }";
    match compile_document(source).unwrap_err() {
        CompileError::Parse(e) => {
            assert_eq!((e.line, e.column), (2, 22));
            assert_eq!(e.to_string(), "expected String or Number or Identifier or LeftParen, found Semicolon");
        }
        e => panic!("Unexpected error: {e}"),
    }
}
