use crate::helpers::{compile_ok, generated};
use insta::assert_snapshot;
use lafun::codegen::Codegen;
use lafun::parser::parse_source;
use lafun::resolver::IdentResolver;

#[test]
fn nested_calls_are_evaluated_exactly_once() {
    let program = compile_ok(r"\fun{g}{}{ return 1; } \fun{f}{x}{ return x; } f(g());");
    let code = generated(&program.code);
    assert_eq!(code.matches("FUN_g();").count(), 1);
    assert_snapshot!(code, @r###"
    function FUN_g() {
    return 1;
    }
    function FUN_f(FUN_x) {
    return FUN_x;
    }
    const temp0 = FUN_g();
    const temp1 = FUN_f(temp0);
    temp1;
    "###);
}

#[test]
fn generating_twice_gives_the_same_code() {
    let mut block = parse_source(
        r#"\class{Counter}{ count := 0; }
\fun{Counter::bump}{by}{ step := by * 2; step = step + 1; return step; }
if total := 1 + 2 { print("yes"); } else { print('no'); }"#,
    )
    .unwrap();
    IdentResolver::new().resolve_block(&mut block).unwrap();

    let generate = || {
        let mut codegen = Codegen::new();
        for statement in &block.0 {
            codegen.add(statement);
        }
        let mut output = String::new();
        codegen.generate(&mut output).unwrap();
        output
    };
    assert_eq!(generate(), generate());
}

#[test]
fn assignments_inside_expressions_are_hoisted_into_statements() {
    let program = compile_ok("a := 1; b := (a := a + 1) * (c := 2);");
    assert_snapshot!(generated(&program.code), @r###"
    let FUN_a_5;
    FUN_a_5 = 1;
    FUN_a_5;
    const temp0 = FUN_a_5 + 1;
    let FUN_a_6;
    FUN_a_6 = temp0;
    let FUN_c_7;
    FUN_c_7 = 2;
    const temp1 = FUN_a_6 * FUN_c_7;
    let FUN_b_8;
    FUN_b_8 = temp1;
    FUN_b_8;
    "###);
}
