//! Minimum-entropy cell selection and adjusted weighted tile sampling.

use wavegrid_core::{AdjustmentSignal, CellCoord, TileCatalog, TileId};

use crate::grid::Grid;
use crate::rng::SplitMix64;

/// Picks the uncollapsed cell with the fewest remaining candidates.
///
/// Ties break on row-major scan order so generation stays reproducible for a
/// fixed seed. Returns `None` when every cell collapsed, the completion
/// condition rather than an error.
pub(crate) fn select_cell(grid: &Grid) -> Option<CellCoord> {
    let mut best: Option<(usize, CellCoord)> = None;

    for (coord, cell) in grid.iter() {
        if cell.is_collapsed() {
            continue;
        }

        let entropy = cell.candidates().len();
        match best {
            Some((current, _)) if current <= entropy => {}
            _ => best = Some((entropy, coord)),
        }
    }

    best.map(|(_, coord)| coord)
}

/// Scales a base weight by the adjustment signal.
///
/// The scaling law is `base^(1 - adjustment)`: the neutral signal reproduces
/// the base weight exactly, positive signals flatten the distribution toward
/// rare tiles, and negative signals sharpen it toward common ones. The ratio
/// between any two tiles' effective weights is monotonic in the signal.
pub(crate) fn effective_weight(base: f64, adjustment: AdjustmentSignal) -> f64 {
    base.powf(1.0 - adjustment.get())
}

/// Samples one tile from the candidate list by cumulative weighted draw.
///
/// Candidates are walked in their stored (catalog) order. Degenerate weight
/// totals fall back to the first candidate so selection never depends on
/// floating-point edge behavior.
pub(crate) fn select_tile(
    candidates: &[TileId],
    catalog: &TileCatalog,
    adjustment: AdjustmentSignal,
    rng: &mut SplitMix64,
) -> Option<TileId> {
    let first = *candidates.first()?;

    let weights: Vec<f64> = candidates
        .iter()
        .map(|tile| {
            catalog
                .variant(*tile)
                .map_or(0.0, |variant| effective_weight(variant.weight(), adjustment))
        })
        .collect();

    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return Some(first);
    }

    let mut threshold = rng.next_unit() * total;
    for (tile, weight) in candidates.iter().zip(&weights) {
        if threshold < *weight {
            return Some(*tile);
        }
        threshold -= weight;
    }

    candidates.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use wavegrid_core::{BiomeSpec, CatalogSpec, GridSize, TileCatalog, TileSpec};

    fn weighted_catalog(common: f64, rare: f64) -> TileCatalog {
        TileCatalog::from_spec(&CatalogSpec {
            biomes: vec![BiomeSpec {
                name: "test".to_owned(),
                tiles: vec![TileSpec::new("common", common), TileSpec::new("rare", rare)],
            }],
        })
    }

    #[test]
    fn selects_cell_with_fewest_candidates() {
        let mut grid = Grid::new_with(GridSize::new(2, 2), |_| {
            vec![TileId::new(0), TileId::new(1)]
        });
        let _ = grid
            .get_mut(CellCoord::new(1, 1))
            .expect("cell in bounds")
            .narrow(|tile| tile == TileId::new(0));

        assert_eq!(select_cell(&grid), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn ties_break_in_row_major_order() {
        let grid = Grid::new_with(GridSize::new(3, 3), |_| {
            vec![TileId::new(0), TileId::new(1)]
        });
        assert_eq!(select_cell(&grid), Some(CellCoord::new(0, 0)));
    }

    #[test]
    fn fully_collapsed_grid_yields_no_selection() {
        let mut grid = Grid::new_with(GridSize::new(2, 1), |_| vec![TileId::new(0)]);
        for column in 0..2 {
            grid.get_mut(CellCoord::new(column, 0))
                .expect("cell in bounds")
                .collapse(TileId::new(0));
        }
        assert_eq!(select_cell(&grid), None);
    }

    #[test]
    fn empty_candidate_cells_are_selected_first() {
        let mut grid = Grid::new_with(GridSize::new(2, 1), |_| {
            vec![TileId::new(0), TileId::new(1)]
        });
        let _ = grid
            .get_mut(CellCoord::new(1, 0))
            .expect("cell in bounds")
            .narrow(|_| false);

        assert_eq!(select_cell(&grid), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn neutral_adjustment_reproduces_base_weight_sampling() {
        let catalog = weighted_catalog(9.0, 1.0);
        let candidates = [TileId::new(0), TileId::new(1)];

        let mut adjusted_rng = SplitMix64::new(0x5eed);
        let mut baseline_rng = SplitMix64::new(0x5eed);

        for _ in 0..2_000 {
            let adjusted = select_tile(
                &candidates,
                &catalog,
                AdjustmentSignal::neutral(),
                &mut adjusted_rng,
            )
            .expect("candidates non-empty");

            // Manual cumulative draw over the raw base weights.
            let weights = [9.0_f64, 1.0];
            let total: f64 = weights.iter().sum();
            let mut threshold = baseline_rng.next_unit() * total;
            let mut baseline = candidates[1];
            for (tile, weight) in candidates.iter().zip(&weights) {
                if threshold < *weight {
                    baseline = *tile;
                    break;
                }
                threshold -= weight;
            }

            assert_eq!(adjusted, baseline);
        }
    }

    #[test]
    fn positive_adjustment_favors_rare_tiles() {
        let catalog = weighted_catalog(9.0, 1.0);
        let candidates = [TileId::new(0), TileId::new(1)];
        let rare = TileId::new(1);

        let count_rare = |signal: AdjustmentSignal| {
            let mut rng = SplitMix64::new(0xfeed);
            (0..10_000)
                .filter(|_| {
                    select_tile(&candidates, &catalog, signal, &mut rng)
                        .expect("candidates non-empty")
                        == rare
                })
                .count()
        };

        let neutral = count_rare(AdjustmentSignal::neutral());
        let flattened = count_rare(AdjustmentSignal::new(1.0));
        let sharpened = count_rare(AdjustmentSignal::new(-1.0));

        assert!(flattened > neutral, "{flattened} vs {neutral}");
        assert!(sharpened < neutral, "{sharpened} vs {neutral}");
    }

    #[test]
    fn effective_weight_is_neutral_at_zero() {
        assert_eq!(effective_weight(6.5, AdjustmentSignal::neutral()), 6.5);
    }
}
