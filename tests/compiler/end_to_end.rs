use crate::helpers::{compile_ok, generated, ids_of};
use insta::assert_snapshot;
use lafun::compile_document;
use lafun::printer::display_code_block;

#[test]
fn a_function_and_its_call() {
    let program = compile_ok(r"\fun{add}{a,b}{ return a + b; } add(1,2);");

    let (definitions, references) = ids_of(&program.resolution, "add");
    assert_eq!(definitions, vec![5]);
    assert_eq!(references, vec![5]);

    assert_snapshot!(generated(&program.code), @r###"
    function FUN_add(FUN_a, FUN_b) {
    const temp0 = FUN_a + FUN_b;
    return temp0;
    }
    const temp0 = FUN_add(1, 2);
    temp0;
    "###);
}

#[test]
fn resolved_programs_can_be_printed_back() {
    let program = compile_ok(r"\fun{add}{a,b}{ return a + b; } add(1,2);");
    assert_snapshot!(display_code_block(&program.program).unwrap(), @r###"
    \fun{<add:5;5-8>}{<a:6;10-11>, <b:7;12-13>}{
        return ((<a:6;23-24>) + (<b:7;27-28>));
    }
    ((<add:5;32-35>)((1), (2)));
    "###);
}

#[test]
fn a_literate_program() {
    let source = r"Adding is done by !add:
\fun{add}{a, b}{ return a + b; }
which @main calls.
\fun{main}{}{ print(add(1, 2)); }
";
    let compiled = compile_document(source).unwrap();
    assert!(compiled.warnings.is_empty());
    assert_snapshot!(generated(&compiled.code), @r###"
    function FUN_add(FUN_a, FUN_b) {
    const temp0 = FUN_a + FUN_b;
    return temp0;
    }
    function FUN_main() {
    const temp0 = FUN_add(1, 2);
    const temp1 = FUN_print(temp0);
    temp1;
    }
    "###);
}
