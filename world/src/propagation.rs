//! Breadth-first constraint narrowing after a collapse.

use std::collections::VecDeque;

use wavegrid_core::{CellCoord, Direction, TileCatalog, TileId};

use crate::grid::Grid;

/// Result of one propagation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PropagationOutcome {
    /// Narrowing reached a fixed point with every candidate list non-empty.
    Settled,
    /// The named cell's candidate list became empty.
    Contradiction(CellCoord),
}

/// Narrows neighbor candidate sets outward from `origin` until no further
/// narrowing occurs anywhere in the grid.
///
/// A neighbor candidate survives only when some candidate of the source cell
/// supports it from both tiles' own perspectives: compatibility lists are
/// direction-specific and never assumed symmetric, so the source tile must
/// accept the neighbor in the travel direction and the neighbor must accept
/// the source back in the opposite direction.
///
/// On contradiction the pass halts immediately and leaves the partially
/// narrowed grid in place; recovery is the caller's episode-level concern,
/// never a rollback here.
pub(crate) fn propagate(
    grid: &mut Grid,
    catalog: &TileCatalog,
    origin: CellCoord,
) -> PropagationOutcome {
    let mut queue = VecDeque::new();
    queue.push_back(origin);

    while let Some(source) = queue.pop_front() {
        let source_candidates: Vec<TileId> = match grid.get(source) {
            Some(cell) => cell.candidates().to_vec(),
            None => continue,
        };

        for direction in Direction::ALL {
            let Some(neighbor) = grid.neighbor(source, direction) else {
                continue;
            };

            let Some(cell) = grid.get_mut(neighbor) else {
                continue;
            };
            if cell.is_collapsed() {
                continue;
            }

            let changed = cell.narrow(|candidate| {
                source_candidates.iter().any(|&supporter| {
                    catalog.compatible(supporter, candidate, direction)
                        && catalog.compatible(candidate, supporter, direction.opposite())
                })
            });

            if !changed {
                continue;
            }

            if cell.candidates().is_empty() {
                return PropagationOutcome::Contradiction(neighbor);
            }

            queue.push_back(neighbor);
        }
    }

    PropagationOutcome::Settled
}
