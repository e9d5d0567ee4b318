//! Dense cell grid holding per-cell generation state.

use wavegrid_core::{CellCoord, Direction, GridSize, TileId};

/// Generation state of one grid position.
///
/// While a cell is uncollapsed its candidate list is expected to stay
/// non-empty; propagation treats an emptied list as a contradiction and never
/// resolves it silently. Once collapsed, the chosen tile is immutable for the
/// rest of the episode.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    candidates: Vec<TileId>,
    chosen: Option<TileId>,
}

impl Cell {
    pub(crate) fn with_candidates(candidates: Vec<TileId>) -> Self {
        Self {
            candidates,
            chosen: None,
        }
    }

    pub(crate) fn candidates(&self) -> &[TileId] {
        &self.candidates
    }

    pub(crate) fn is_collapsed(&self) -> bool {
        self.chosen.is_some()
    }

    pub(crate) fn chosen(&self) -> Option<TileId> {
        self.chosen
    }

    /// Fixes the cell to a single tile. The candidate list shrinks to the
    /// chosen tile so neighbor narrowing keeps a single code path.
    pub(crate) fn collapse(&mut self, tile: TileId) {
        self.candidates.clear();
        self.candidates.push(tile);
        self.chosen = Some(tile);
    }

    /// Drops every candidate failing the predicate, reporting whether the
    /// list changed.
    pub(crate) fn narrow<F>(&mut self, mut keep: F) -> bool
    where
        F: FnMut(TileId) -> bool,
    {
        let before = self.candidates.len();
        self.candidates.retain(|tile| keep(*tile));
        self.candidates.len() != before
    }
}

/// Row-major grid of cells sized by a [`GridSize`].
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    size: GridSize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid whose cells receive candidate lists from the provided
    /// factory, invoked in row-major order.
    pub(crate) fn new_with<F>(size: GridSize, mut candidates_for: F) -> Self
    where
        F: FnMut(CellCoord) -> Vec<TileId>,
    {
        let mut cells = Vec::with_capacity(size.cell_count());
        for row in 0..size.rows() {
            for column in 0..size.columns() {
                let coord = CellCoord::new(column, row);
                cells.push(Cell::with_candidates(candidates_for(coord)));
            }
        }
        Self { size, cells }
    }

    pub(crate) fn size(&self) -> GridSize {
        self.size
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    pub(crate) fn get_mut(&mut self, cell: CellCoord) -> Option<&mut Cell> {
        self.index(cell).and_then(|index| self.cells.get_mut(index))
    }

    /// Neighbor coordinate in the provided direction; out-of-bounds moves
    /// yield no neighbor.
    pub(crate) fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let candidate = match direction {
            Direction::North => cell.row().checked_sub(1).map(|row| CellCoord::new(cell.column(), row)),
            Direction::East => cell.column().checked_add(1).map(|column| CellCoord::new(column, cell.row())),
            Direction::South => cell.row().checked_add(1).map(|row| CellCoord::new(cell.column(), row)),
            Direction::West => cell.column().checked_sub(1).map(|column| CellCoord::new(column, cell.row())),
        }?;

        self.size.contains(candidate).then_some(candidate)
    }

    /// Iterator over coordinates and cells in row-major order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellCoord, &Cell)> {
        let columns = self.size.columns();
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let index = index as u32;
            (CellCoord::new(index % columns, index / columns), cell)
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.size.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.size.columns()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}
