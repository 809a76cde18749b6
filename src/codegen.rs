//! Lowers a resolved syntax tree to JavaScript.
//!
//! fun expressions can have side effects anywhere: `f(x := g())` declares a variable in the
//! middle of a call. The generator flattens every expression into a sequence of statements with
//! at most one effect each, storing intermediate results in `const` temporaries.
//!
//! Declarations, classes and parameters are named `FUN_<name>`. A variable introduced by `:=`
//! is named `FUN_<name>_<id>`: `x := x + 1` may shadow an outer `x`, and the two bindings must
//! not share a JavaScript name.
use crate::parser::ast::{
    ClassDeclaration, CodeBlock, Declaration, Expression, ExpressionStatement,
    FunctionDeclaration, Identifier, IdentifierExpression, LiteralExpression, MethodDeclaration,
    Statement,
};
use crate::resolver::BindingId;
use std::collections::HashSet;
use std::fmt::{self, Write};
use std::rc::Rc;

pub struct Codegen<'a> {
    classes: Vec<ClassAndMethods<'a>>,
    functions: Vec<&'a FunctionDeclaration>,
    statements: Vec<&'a Statement>,
    already_declared: HashSet<VariableName<'a>>,
    temporary_cursor: usize,
    /// Ids bound by `:=` anywhere in the generated code. Shared with nested generators.
    variables: Option<Rc<HashSet<BindingId>>>,
}

/// A class and its methods, which may be declared anywhere in the same block.
struct ClassAndMethods<'a> {
    name: &'a str,
    class: Option<&'a ClassDeclaration>,
    methods: Vec<&'a MethodDeclaration>,
}

/// How the value of a lowered expression can be referred to.
#[derive(Debug, Clone, Copy)]
enum ExpressionName<'a> {
    Temporary(usize),
    Variable(VariableName<'a>),
    /// Literals stand for themselves.
    Literal(&'a LiteralExpression),
}

/// The JavaScript name of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VariableName<'a> {
    name: &'a str,
    /// Set for variables introduced by `:=`.
    id: Option<BindingId>,
}

impl<'a> Codegen<'a> {
    pub fn new() -> Self {
        Self {
            classes: vec![],
            functions: vec![],
            statements: vec![],
            already_declared: HashSet::new(),
            temporary_cursor: 0,
            variables: None,
        }
    }

    fn nested(variables: Rc<HashSet<BindingId>>) -> Self {
        Self {
            variables: Some(variables),
            ..Self::new()
        }
    }

    pub fn add(&mut self, statement: &'a Statement) {
        match statement {
            Statement::Declaration(declaration) => self.add_declaration(declaration),
            _ => self.statements.push(statement),
        }
    }

    pub fn add_declaration(&mut self, declaration: &'a Declaration) {
        match declaration {
            Declaration::Class(c) => self.class_entry(&c.name.name).class = Some(c),
            Declaration::Method(m) => self.class_entry(&m.class.name).methods.push(m),
            Declaration::Function(f) => self.functions.push(f),
        }
    }

    fn class_entry(&mut self, name: &'a str) -> &mut ClassAndMethods<'a> {
        let position = match self.classes.iter().position(|c| c.name == name) {
            Some(position) => position,
            None => {
                self.classes.push(ClassAndMethods {
                    name,
                    class: None,
                    methods: vec![],
                });
                self.classes.len() - 1
            }
        };
        &mut self.classes[position]
    }

    /// Emit classes, then functions, then statements.
    pub fn generate(&mut self, w: &mut impl Write) -> fmt::Result {
        let variables = match &self.variables {
            Some(variables) => Rc::clone(variables),
            None => {
                let variables = Rc::new(self.collect_variables());
                self.variables = Some(Rc::clone(&variables));
                variables
            }
        };
        for class in &self.classes {
            Self::generate_class(w, class, &variables)?;
        }
        for function in &self.functions {
            Self::generate_function(w, function, &variables)?;
        }
        for statement in self.statements.clone() {
            self.generate_statement(w, statement)?;
        }
        Ok(())
    }

    fn collect_variables(&self) -> HashSet<BindingId> {
        let mut collector = VariableCollector::default();
        for class in &self.classes {
            if let Some(declaration) = class.class {
                collector.code_block(&declaration.body);
            }
            for method in &class.methods {
                collector.code_block(&method.body);
            }
        }
        for function in &self.functions {
            collector.code_block(&function.body);
        }
        for statement in &self.statements {
            collector.statement(statement);
        }
        collector.ids
    }

    fn generate_class(
        w: &mut impl Write,
        class: &ClassAndMethods,
        variables: &Rc<HashSet<BindingId>>,
    ) -> fmt::Result {
        tracing::debug!(
            class = class.name,
            methods = class.methods.len(),
            "generating class"
        );
        writeln!(w, "class FUN_{} {{", class.name)?;
        // Methods of a class that is never declared still get a class, without a constructor.
        if let Some(declaration) = class.class {
            writeln!(w, "constructor() {{")?;
            Self::generate_code_block(w, &declaration.body, variables)?;
            writeln!(w, "}}")?;
        }
        for method in &class.methods {
            write!(w, "FUN_{}(", method.name.name)?;
            Self::generate_parameters(w, &method.parameters)?;
            writeln!(w, ") {{")?;
            Self::generate_code_block(w, &method.body, variables)?;
            writeln!(w, "}}")?;
        }
        writeln!(w, "}}")
    }

    fn generate_function(
        w: &mut impl Write,
        function: &FunctionDeclaration,
        variables: &Rc<HashSet<BindingId>>,
    ) -> fmt::Result {
        tracing::debug!(function = %function.name.name, "generating function");
        write!(w, "function FUN_{}(", function.name.name)?;
        Self::generate_parameters(w, &function.parameters)?;
        writeln!(w, ") {{")?;
        Self::generate_code_block(w, &function.body, variables)?;
        writeln!(w, "}}")
    }

    fn generate_parameters(w: &mut impl Write, parameters: &[Identifier]) -> fmt::Result {
        for (i, parameter) in parameters.iter().enumerate() {
            if i > 0 {
                write!(w, ", ")?;
            }
            write!(w, "FUN_{}", parameter.name)?;
        }
        Ok(())
    }

    /// Every block gets its own generator: fresh temporaries and a fresh set of declared names.
    fn generate_code_block(
        w: &mut impl Write,
        block: &CodeBlock,
        variables: &Rc<HashSet<BindingId>>,
    ) -> fmt::Result {
        let mut codegen = Codegen::nested(Rc::clone(variables));
        for statement in &block.0 {
            codegen.add(statement);
        }
        codegen.generate(w)
    }

    fn generate_statement(&mut self, w: &mut impl Write, statement: &'a Statement) -> fmt::Result {
        match statement {
            // Emitted ahead of the statements by `generate`.
            Statement::Declaration(_) => Ok(()),
            Statement::Expression(ExpressionStatement(e)) => {
                let name = self.generate_expression(w, e)?;
                writeln!(w, "{name};")
            }
            Statement::Return(r) => {
                let name = self.generate_expression(w, &r.value)?;
                writeln!(w, "return {name};")
            }
            Statement::IfElse(ifelse) => {
                // Names declared by the condition live in the braces around the `if`.
                let outer_declared = std::mem::take(&mut self.already_declared);
                writeln!(w, "{{")?;
                let condition = self.generate_expression(w, &ifelse.condition)?;
                writeln!(w, "if ({condition}) {{")?;
                let variables = self.variables.clone().unwrap_or_default();
                Self::generate_code_block(w, &ifelse.if_branch, &variables)?;
                writeln!(w, "}}")?;
                if let Some(else_branch) = &ifelse.else_branch {
                    writeln!(w, "else {{")?;
                    Self::generate_code_block(w, else_branch, &variables)?;
                    writeln!(w, "}}")?;
                }
                writeln!(w, "}}")?;
                self.already_declared = outer_declared;
                Ok(())
            }
        }
    }

    fn generate_expression(
        &mut self,
        w: &mut impl Write,
        expr: &'a Expression,
    ) -> Result<ExpressionName<'a>, fmt::Error> {
        let name = match expr {
            Expression::Literal(literal) => ExpressionName::Literal(literal),
            Expression::Identifier(IdentifierExpression { identifier }) => {
                ExpressionName::Variable(self.variable_name(identifier))
            }
            Expression::Binary(b) => {
                let left = self.generate_expression(w, &b.left)?;
                let right = self.generate_expression(w, &b.right)?;
                let temporary = self.next_temporary();
                writeln!(
                    w,
                    "const temp{temporary} = {left} {} {right};",
                    b.operator.symbol()
                )?;
                ExpressionName::Temporary(temporary)
            }
            Expression::Call(c) => {
                let callee = self.generate_expression(w, &c.callee)?;
                let arguments = c
                    .arguments
                    .iter()
                    .map(|argument| self.generate_expression(w, argument))
                    .collect::<Result<Vec<_>, _>>()?;
                let temporary = self.next_temporary();
                write!(w, "const temp{temporary} = {callee}(")?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(w, ", ")?;
                    }
                    write!(w, "{argument}")?;
                }
                writeln!(w, ");")?;
                ExpressionName::Temporary(temporary)
            }
            Expression::Assignment(a) => {
                let value = self.generate_expression(w, &a.value)?;
                let Expression::Identifier(IdentifierExpression { identifier }) = a.target.as_ref()
                else {
                    unreachable!("the resolver only lets identifiers be assigned to")
                };
                let variable = self.variable_name(identifier);
                writeln!(w, "{variable} = {value};")?;
                ExpressionName::Variable(variable)
            }
            Expression::DeclareAssignment(d) => {
                let value = self.generate_expression(w, &d.value)?;
                let variable = self.variable_name(&d.identifier);
                if self.already_declared.insert(variable) {
                    writeln!(w, "let {variable};")?;
                }
                writeln!(w, "{variable} = {value};")?;
                ExpressionName::Variable(variable)
            }
        };
        Ok(name)
    }

    fn variable_name(&self, identifier: &'a Identifier) -> VariableName<'a> {
        let is_variable = self
            .variables
            .as_ref()
            .is_some_and(|variables| variables.contains(&identifier.id));
        VariableName {
            name: &identifier.name,
            id: is_variable.then_some(identifier.id),
        }
    }

    fn next_temporary(&mut self) -> usize {
        let temporary = self.temporary_cursor;
        self.temporary_cursor += 1;
        temporary
    }
}

impl<'a> Default for Codegen<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> fmt::Display for ExpressionName<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionName::Temporary(n) => write!(f, "temp{n}"),
            ExpressionName::Variable(variable) => write!(f, "{variable}"),
            ExpressionName::Literal(LiteralExpression::String(s)) => write_js_string(f, s),
            ExpressionName::Literal(LiteralExpression::Number(n)) => write!(f, "{n}"),
        }
    }
}

impl<'a> fmt::Display for VariableName<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "FUN_{}_{id}", self.name),
            None => write!(f, "FUN_{}", self.name),
        }
    }
}

/// Gathers the ids bound by `:=`, nested blocks included.
#[derive(Default)]
struct VariableCollector {
    ids: HashSet<BindingId>,
}

impl VariableCollector {
    fn code_block(&mut self, block: &CodeBlock) {
        for statement in &block.0 {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Expression(ExpressionStatement(e)) => self.expression(e),
            Statement::Return(r) => self.expression(&r.value),
            Statement::Declaration(Declaration::Class(c)) => self.code_block(&c.body),
            Statement::Declaration(Declaration::Function(f)) => self.code_block(&f.body),
            Statement::Declaration(Declaration::Method(m)) => self.code_block(&m.body),
            Statement::IfElse(ifelse) => {
                self.expression(&ifelse.condition);
                self.code_block(&ifelse.if_branch);
                if let Some(else_branch) = &ifelse.else_branch {
                    self.code_block(else_branch);
                }
            }
        }
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(_) | Expression::Identifier(_) => {}
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
            Expression::Assignment(a) => self.expression(&a.value),
            Expression::DeclareAssignment(d) => {
                if d.identifier.is_resolved() {
                    self.ids.insert(d.identifier.id);
                }
                self.expression(&d.value);
            }
        }
    }
}

fn write_js_string(w: &mut impl Write, s: &str) -> fmt::Result {
    w.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => w.write_str("\\\"")?,
            '\\' => w.write_str("\\\\")?,
            '\n' => w.write_str("\\n")?,
            '\t' => w.write_str("\\t")?,
            '\r' => w.write_str("\\r")?,
            c if c.is_control() => write!(w, "\\u{:04x}", c as u32)?,
            c => w.write_char(c)?,
        }
    }
    w.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::Codegen;
    use crate::parser::parse_source;
    use crate::resolver::IdentResolver;
    use insta::assert_snapshot;

    fn generate(source: &str) -> String {
        let mut block = parse_source(source).unwrap();
        IdentResolver::with_builtins(["f", "g", "print"])
            .resolve_block(&mut block)
            .unwrap();
        let mut codegen = Codegen::new();
        for statement in &block.0 {
            codegen.add(statement);
        }
        let mut output = String::new();
        codegen.generate(&mut output).unwrap();
        output
    }

    #[test]
    fn nested_calls_are_evaluated_once() {
        assert_snapshot!(generate("f(g());"), @r###"
        const temp0 = FUN_g();
        const temp1 = FUN_f(temp0);
        temp1;
        "###)
    }

    #[test]
    fn every_binding_is_declared_once() {
        let code = generate(r#"x := 1 + 2; x = x * 3; x := x; print(x, "hi\n");"#);
        assert_snapshot!(code, @r###"
        const temp0 = 1 + 2;
        let FUN_x_4;
        FUN_x_4 = temp0;
        FUN_x_4;
        const temp1 = FUN_x_4 * 3;
        FUN_x_4 = temp1;
        FUN_x_4;
        let FUN_x_5;
        FUN_x_5 = FUN_x_4;
        FUN_x_5;
        const temp2 = FUN_print(FUN_x_5, "hi\n");
        temp2;
        "###)
    }

    #[test]
    fn if_statements_get_their_own_block() {
        let code = generate("if x := f() { x := 2; print(x); } else { print(1); }");
        assert_snapshot!(code, @r###"
        {
        const temp0 = FUN_f();
        let FUN_x_4;
        FUN_x_4 = temp0;
        if (FUN_x_4) {
        let FUN_x_5;
        FUN_x_5 = 2;
        FUN_x_5;
        const temp0 = FUN_print(FUN_x_5);
        temp0;
        }
        else {
        const temp0 = FUN_print(1);
        temp0;
        }
        }
        "###)
    }

    #[test]
    fn names_declared_in_a_condition_do_not_count_outside_of_it() {
        assert_snapshot!(generate("if y := 1 { } y := 2;"), @r###"
        {
        let FUN_y_4;
        FUN_y_4 = 1;
        if (FUN_y_4) {
        }
        }
        let FUN_y_5;
        FUN_y_5 = 2;
        FUN_y_5;
        "###)
    }

    #[test]
    fn shadowing_variables_get_distinct_names() {
        let code = generate("x := 1; if x { x := x + 1; print(x); }");
        assert_snapshot!(code, @r###"
        let FUN_x_4;
        FUN_x_4 = 1;
        FUN_x_4;
        {
        if (FUN_x_4) {
        const temp0 = FUN_x_4 + 1;
        let FUN_x_5;
        FUN_x_5 = temp0;
        FUN_x_5;
        const temp1 = FUN_print(FUN_x_5);
        temp1;
        }
        }
        "###)
    }

    #[test]
    fn variables_may_shadow_parameters() {
        let code = generate(r"\fun{h}{x}{ x := x + 1; return x; }");
        assert_snapshot!(code, @r###"
        function FUN_h(FUN_x) {
        const temp0 = FUN_x + 1;
        let FUN_x_6;
        FUN_x_6 = temp0;
        FUN_x_6;
        return FUN_x_6;
        }
        "###)
    }

    #[test]
    fn classes_come_first_then_functions_then_statements() {
        let code = generate(
            r"print(area(2));
\fun{Shape::area}{r}{ return r * r; }
\fun{area}{r}{ return r * 3; }
\class{Shape}{ sides := 0; }",
        );
        assert_snapshot!(code, @r###"
        class FUN_Shape {
        constructor() {
        let FUN_sides_9;
        FUN_sides_9 = 0;
        FUN_sides_9;
        }
        FUN_area(FUN_r) {
        const temp0 = FUN_r * FUN_r;
        return temp0;
        }
        }
        function FUN_area(FUN_r) {
        const temp0 = FUN_r * 3;
        return temp0;
        }
        const temp0 = FUN_area(2);
        const temp1 = FUN_print(temp0);
        temp1;
        "###)
    }

    #[test]
    fn methods_without_a_class_get_no_constructor() {
        let block = parse_source(r"\fun{Ghost::boo}{}{ return 1; }").unwrap();
        let mut codegen = Codegen::new();
        codegen.add(&block.0[0]);
        let mut output = String::new();
        codegen.generate(&mut output).unwrap();
        assert_snapshot!(output, @r###"
        class FUN_Ghost {
        FUN_boo() {
        return 1;
        }
        }
        "###)
    }

    #[test]
    fn literals_are_written_as_javascript() {
        let code = generate(r#""tab\t \"q\" \e"; 12.25; 0.3; 1.1; 0x10; 'it\'s';"#);
        assert_snapshot!(code, @r###"
        "tab\t \"q\" \u001b";
        12.25;
        0.3;
        1.1;
        16;
        "it's";
        "###)
    }

    #[test]
    fn generation_is_deterministic() {
        let source = r"\class{A}{ a := f(1, g()); } \fun{A::m}{x}{ return x; } \fun{b}{}{ if 1 { 2; } }";
        assert_eq!(generate(source), generate(source));
    }
}
