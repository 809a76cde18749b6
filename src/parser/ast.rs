use crate::resolver::BindingId;

/// A half-open range of byte offsets into the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 1-based line and column of the start of the range.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let before = &source[..self.start.min(source.len())];
        let line = 1 + before.matches('\n').count();
        let column = 1 + before
            .rsplit('\n')
            .next()
            .map(|l| l.chars().count())
            .unwrap_or(0);
        (line, column)
    }
}

/// A name occurrence, either defining or referencing.
///
/// `id` is `0` until the resolver binds the identifier; it is never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub id: BindingId,
    pub range: ByteRange,
}

impl Identifier {
    pub const UNRESOLVED: BindingId = 0;

    pub fn new(name: impl Into<String>) -> Self {
        Self::with_range(name, ByteRange::default())
    }

    pub fn with_range(name: impl Into<String>, range: ByteRange) -> Self {
        Self {
            name: name.into(),
            id: Self::UNRESOLVED,
            range,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.id != Self::UNRESOLVED
    }

    pub(crate) fn bind(&mut self, id: BindingId) {
        debug_assert!(
            !self.is_resolved(),
            "`{}` is already bound to {}",
            self.name,
            self.id
        );
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeBlock(pub Vec<Statement>);

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(ExpressionStatement),
    IfElse(IfElseStatement),
    Declaration(Declaration),
    Return(ReturnStatement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement(pub Expression);

/// `else if` chains are nested: the inner `if` is the only statement of the else branch.
#[derive(Debug, Clone, PartialEq)]
pub struct IfElseStatement {
    pub condition: Expression,
    pub if_branch: CodeBlock,
    pub else_branch: Option<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Class(ClassDeclaration),
    Function(FunctionDeclaration),
    Method(MethodDeclaration),
}

impl Declaration {
    /// The identifier this declaration defines.
    pub fn name(&self) -> &Identifier {
        match self {
            Declaration::Class(c) => &c.name,
            Declaration::Function(f) => &f.name,
            Declaration::Method(m) => &m.name,
        }
    }

    pub(crate) fn name_mut(&mut self) -> &mut Identifier {
        match self {
            Declaration::Class(c) => &mut c.name,
            Declaration::Function(f) => &mut f.name,
            Declaration::Method(m) => &mut m.name,
        }
    }

    /// The key this declaration is registered under: its own name, or `Class::method`.
    pub fn qualified_name(&self) -> String {
        match self {
            Declaration::Class(c) => c.name.name.clone(),
            Declaration::Function(f) => f.name.name.clone(),
            Declaration::Method(m) => format!("{}::{}", m.class.name, m.name.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub name: Identifier,
    pub body: CodeBlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub parameters: Vec<Identifier>,
    pub body: CodeBlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDeclaration {
    pub class: Identifier,
    pub name: Identifier,
    pub parameters: Vec<Identifier>,
    pub body: CodeBlock,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(LiteralExpression),
    Identifier(IdentifierExpression),
    Binary(BinaryExpression),
    Call(CallExpression),
    Assignment(AssignmentExpression),
    DeclareAssignment(DeclareAssignmentExpression),
}

impl Expression {
    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(LiteralExpression::String(s.into()))
    }

    pub fn number(n: f64) -> Self {
        Self::Literal(LiteralExpression::Number(n))
    }

    pub fn identifier(identifier: Identifier) -> Self {
        Self::Identifier(IdentifierExpression { identifier })
    }

    /// Shorthand for a reference to `name` with no source position.
    pub fn variable(name: &str) -> Self {
        Self::identifier(Identifier::new(name))
    }

    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Self::Binary(BinaryExpression {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        Self::Call(CallExpression {
            callee: Box::new(callee),
            arguments,
        })
    }

    pub fn assignment(target: Expression, value: Expression) -> Self {
        Self::Assignment(AssignmentExpression {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn declare_assignment(identifier: Identifier, value: Expression) -> Self {
        Self::DeclareAssignment(DeclareAssignmentExpression {
            identifier,
            value: Box::new(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralExpression {
    String(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierExpression {
    pub identifier: Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: BinaryOperator,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
}

/// `target = value`. The parser only ever produces identifier targets.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    pub target: Box<Expression>,
    pub value: Box<Expression>,
}

/// `identifier := value`: introduces a binding scoped to the enclosing block.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclareAssignmentExpression {
    pub identifier: Identifier,
    pub value: Box<Expression>,
}
