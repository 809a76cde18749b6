//! Names every program can use without declaring them, and their JavaScript definitions.

/// Registered before any user code, in this order, so they own the lowest binding ids.
pub const BUILTIN_NAMES: [&str; 4] = ["__builtins", "print", "Array", "Map"];

/// Prepended to every generated program.
pub const JS_PRELUDE: &str = r#"const FUN___builtins = {
console,
createArray: function() { return new Array(); },
createMap: function() { return new Map(); },
};
function FUN_print(FUN_str) {
FUN___builtins.console.log(FUN_str);
}
function FUN_Array() {
return FUN___builtins.createArray();
}
function FUN_Map() {
return FUN___builtins.createMap();
}
"#;

#[cfg(test)]
mod tests {
    use super::{BUILTIN_NAMES, JS_PRELUDE};

    #[test]
    fn every_builtin_is_defined_by_the_prelude() {
        for name in BUILTIN_NAMES {
            let prefixed = format!("FUN_{name}");
            assert!(
                JS_PRELUDE.contains(&format!("const {prefixed} "))
                    || JS_PRELUDE.contains(&format!("function {prefixed}(")),
                "`{name}` is not defined in the prelude"
            );
        }
    }
}
