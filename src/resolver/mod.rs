mod environment;
mod resolver;
mod search;

use crate::parser::ast::{ByteRange, Identifier};

/// The identity of a binding. `0` is reserved for identifiers that have not been resolved yet.
pub type BindingId = u64;

pub use resolver::IdentResolver;
pub use search::{find_downwards_in, find_upwards_in};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("`{name}` is already defined in this scope")]
    DuplicateDefinition { name: String, range: ByteRange },
    #[error("`{name}` is not defined")]
    UndefinedIdentifier { name: String, range: ByteRange },
    #[error("`{name}` is used before it is declared")]
    UsedBeforeDeclaration { name: String, range: ByteRange },
    #[error("only identifiers can be assigned to")]
    InvalidAssignmentTarget,
}

impl ResolveError {
    pub fn range(&self) -> Option<ByteRange> {
        match self {
            ResolveError::DuplicateDefinition { range, .. }
            | ResolveError::UndefinedIdentifier { range, .. }
            | ResolveError::UsedBeforeDeclaration { range, .. } => Some(*range),
            ResolveError::InvalidAssignmentTarget => None,
        }
    }
}

/// Every definition and reference site, in the order they were bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub definitions: Vec<Identifier>,
    pub references: Vec<Identifier>,
}
