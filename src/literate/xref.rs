use crate::literate::{Block, Document};
use crate::parser::ast::ByteRange;
use crate::resolver::{find_downwards_in, find_upwards_in, BindingId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no declaration mentions `{name}` ({direction} reference)")]
pub struct UnresolvedCrossReference {
    pub name: String,
    pub direction: Direction,
    pub range: ByteRange,
}

/// Bind every cross-reference in `document` to the id of the nearest declaration that mentions
/// its name, looking in the reference's direction first and in the opposite one second.
///
/// The declarations must have been resolved already. References that match nothing keep id `0`
/// and are returned as warnings.
pub fn resolve_cross_references(document: &mut Document) -> Vec<UnresolvedCrossReference> {
    let mut unresolved = vec![];
    for index in 0..document.blocks.len() {
        let Some((direction, reference)) = document.blocks[index].cross_reference() else {
            continue;
        };
        if reference.is_resolved() {
            continue;
        }
        let (name, range) = (reference.name.clone(), reference.range);
        let blocks = &document.blocks;
        let found = match direction {
            Direction::Up => {
                search_above(blocks, index, &name).or_else(|| search_below(blocks, index, &name))
            }
            Direction::Down => {
                search_below(blocks, index, &name).or_else(|| search_above(blocks, index, &name))
            }
        };

        match found {
            Some(id) => {
                tracing::trace!(%name, %direction, id, "cross-reference");
                if let Some(reference) = document.blocks[index].cross_reference_mut() {
                    reference.id = id;
                }
            }
            None => {
                tracing::warn!(%name, %direction, start = range.start, "unresolved cross-reference");
                unresolved.push(UnresolvedCrossReference {
                    name,
                    direction,
                    range,
                });
            }
        }
    }
    unresolved
}

fn search_above(blocks: &[Block], index: usize, name: &str) -> Option<BindingId> {
    blocks[..index]
        .iter()
        .rev()
        .filter_map(Block::declaration)
        .find_map(|declaration| find_upwards_in(declaration, name))
}

fn search_below(blocks: &[Block], index: usize, name: &str) -> Option<BindingId> {
    blocks[index + 1..]
        .iter()
        .filter_map(Block::declaration)
        .find_map(|declaration| find_downwards_in(declaration, name))
}

#[cfg(test)]
mod tests {
    use super::{resolve_cross_references, Direction};
    use crate::literate::{read_document, Block};
    use crate::resolver::IdentResolver;

    #[test]
    fn references_fall_back_to_the_opposite_direction() {
        let mut document = read_document(
            r"!n @f \fun{f}{n}{ return n; } @n !f !g @z",
        )
        .unwrap();
        let mut resolver = IdentResolver::with_builtins([]);
        for declaration in document.declarations_mut() {
            resolver.add(declaration).unwrap();
        }
        resolver.finalize().unwrap();

        let unresolved = resolve_cross_references(&mut document);
        let ids: Vec<_> = document
            .cross_references()
            .map(|(direction, r)| (direction, r.name.as_str(), r.id))
            .collect();
        assert_eq!(
            ids,
            vec![
                (Direction::Down, "n", 2),
                (Direction::Up, "f", 1),
                (Direction::Up, "n", 2),
                (Direction::Down, "f", 1),
                (Direction::Down, "g", 0),
                (Direction::Up, "z", 0),
            ]
        );
        let names: Vec<_> = unresolved.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["g", "z"]);
        assert_eq!(
            unresolved[0].to_string(),
            "no declaration mentions `g` (down reference)"
        );
        assert!(matches!(document.blocks[0], Block::DownReference(_)));
    }
}
