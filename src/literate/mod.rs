//! Literate fun documents: prose with embedded declarations and cross-references.
mod reader;
mod xref;

use crate::parser::ast::{ByteRange, Declaration};
use crate::resolver::BindingId;

pub use reader::read_document;
pub use xref::{resolve_cross_references, Direction, UnresolvedCrossReference};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    RawText(String),
    Declaration(DeclarationBlock),
    /// `@name`: the nearest matching declaration above.
    UpReference(CrossReference),
    /// `!name`: the nearest matching declaration below.
    DownReference(CrossReference),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationBlock {
    pub declaration: Declaration,
    /// Where the declaration's text sits in the document.
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossReference {
    pub name: String,
    pub id: BindingId,
    pub range: ByteRange,
}

impl CrossReference {
    pub fn new(name: impl Into<String>, range: ByteRange) -> Self {
        Self {
            name: name.into(),
            id: 0,
            range,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.id != 0
    }
}

impl Block {
    pub fn declaration(&self) -> Option<&Declaration> {
        match self {
            Block::Declaration(d) => Some(&d.declaration),
            _ => None,
        }
    }

    pub fn cross_reference(&self) -> Option<(Direction, &CrossReference)> {
        match self {
            Block::UpReference(r) => Some((Direction::Up, r)),
            Block::DownReference(r) => Some((Direction::Down, r)),
            _ => None,
        }
    }

    fn cross_reference_mut(&mut self) -> Option<&mut CrossReference> {
        match self {
            Block::UpReference(r) | Block::DownReference(r) => Some(r),
            _ => None,
        }
    }
}

impl Document {
    /// Embedded declarations, in document order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.blocks.iter().filter_map(Block::declaration)
    }

    pub fn declarations_mut(&mut self) -> impl Iterator<Item = &mut Declaration> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Declaration(d) => Some(&mut d.declaration),
            _ => None,
        })
    }

    pub fn cross_references(&self) -> impl Iterator<Item = (Direction, &CrossReference)> {
        self.blocks.iter().filter_map(Block::cross_reference)
    }
}
