use crate::helpers::{compile_ok, ids_of};
use lafun::parser::ast::ByteRange;
use lafun::prelude::BUILTIN_NAMES;
use lafun::resolver::ResolveError;
use lafun::{compile, compile_document, CompileError};
use std::collections::HashSet;

#[test]
fn every_definition_gets_a_unique_nonzero_id() {
    let source = r"\fun{outer}{a}{
    b := a + 1;
    \fun{inner}{c}{ return c + b; }
    return inner(b);
}
outer(1);";
    let resolution = compile_ok(source).resolution;

    let definitions: Vec<_> = resolution.definitions.iter().map(|d| d.id).collect();
    assert!(definitions.iter().all(|id| *id != 0));
    let unique: HashSet<_> = definitions.iter().collect();
    assert_eq!(unique.len(), definitions.len());

    // Every reference points at a definition or at a builtin.
    for reference in &resolution.references {
        assert!(
            definitions.contains(&reference.id) || reference.id <= BUILTIN_NAMES.len() as u64,
            "`{}` resolved to an unknown id {}",
            reference.name,
            reference.id
        );
    }
}

#[test]
fn inner_bindings_shadow_without_affecting_the_outer_scope() {
    let source = r"x := 1;
\fun{f}{x}{ return x; }
if 1 { x := 2; print(x); }
print(x);";
    let resolution = compile_ok(source).resolution;
    let (definitions, references) = ids_of(&resolution, "x");
    assert_eq!(definitions, vec![6, 7, 8]);
    assert_eq!(references, vec![7, 8, 6]);
}

#[test]
fn builtins_own_the_lowest_ids() {
    let resolution = compile_ok("print(Map(), Array());").resolution;
    let references: Vec<_> = resolution
        .references
        .iter()
        .map(|r| (r.name.as_str(), r.id))
        .collect();
    assert_eq!(references, vec![("print", 2), ("Map", 4), ("Array", 3)]);
}

#[test]
fn top_level_declarations_of_a_document_see_each_other() {
    let source = r"\fun{even}{n}{ return odd(n); } and \fun{odd}{n}{ return even(n); }";
    let resolution = compile_document(source).unwrap().resolution;
    assert_eq!(ids_of(&resolution, "even"), (vec![5], vec![5]));
    assert_eq!(ids_of(&resolution, "odd"), (vec![6], vec![6]));
}

#[test]
fn duplicate_top_level_declarations_are_rejected() {
    let error = compile_document(r"\fun{f}{}{} \class{f}{}").unwrap_err();
    match error {
        CompileError::Resolve(ResolveError::DuplicateDefinition { name, range }) => {
            assert_eq!(name, "f");
            assert_eq!(range, ByteRange::new(19, 20));
        }
        e => panic!("Unexpected error: {e}"),
    }
}

#[test]
fn resolution_errors_carry_their_location() {
    let source = "x := 1;\nprint(y);";
    let error = compile(source).unwrap_err();
    assert_eq!(error.to_string(), "`y` is not defined");
    let range = error.range().unwrap();
    assert_eq!(range.line_col(source), (2, 7));
}
