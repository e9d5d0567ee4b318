#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wavegrid generator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative generation world, and pure systems. Trainers submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

use serde::{Deserialize, Serialize};

mod catalog;

pub use catalog::{
    BiomeSpec, CatalogIssue, CatalogSpec, Compatibility, TileCatalog, TileSpec, TileVariant,
    WILDCARD,
};

/// Label mixed into seed derivation for the collapse-selection RNG stream.
pub const RNG_STREAM_COLLAPSE: &str = "collapse";

/// Cardinal directions connecting a cell to its four neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward increasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Direction {
    /// All four directions in deterministic propagation order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Returns the direction pointing back toward the origin cell.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Dense index used to address per-direction compatibility tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }
}

/// Unique identifier assigned to a tile variant within a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a biome within a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BiomeId(u32);

impl BiomeId {
    /// Creates a new biome identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Monotonic counter identifying one generation episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeId(u64);

impl EpisodeId {
    /// Creates a new episode identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Dimensions of a generation grid measured in whole cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    columns: u32,
    rows: u32,
}

impl GridSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns laid out in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows laid out in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells contained in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let capacity = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(capacity).unwrap_or(0)
    }

    /// Reports whether the provided coordinate lies within the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }
}

/// Named constraint pattern applied to initial candidate sets beyond biome
/// filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    /// No restriction beyond the biome's tile set.
    Open,
    /// Border cells restricted to edge-compatible tile variants.
    Walled,
}

impl Layout {
    /// Stable label mixed into seed derivation for the layout.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Walled => "walled",
        }
    }
}

/// Scalar adjustment signal supplied by the reinforcement-learning loop.
///
/// The neutral value reproduces unmodified base-weight sampling; values away
/// from neutral bias selection toward rarer or more common tiles. No range is
/// enforced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdjustmentSignal(f64);

impl AdjustmentSignal {
    /// Creates an adjustment signal carrying the provided scalar.
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// The neutral signal that leaves base weights untouched.
    #[must_use]
    pub const fn neutral() -> Self {
        Self(0.0)
    }

    /// Retrieves the underlying scalar.
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards any active session and begins a fresh generation episode.
    ResetEnvironment {
        /// Biome restricting which tile variants are eligible.
        biome: BiomeId,
        /// Layout constraint applied to initial candidate sets.
        layout: Layout,
        /// Dimensions of the grid to generate.
        size: GridSize,
        /// Seed from which all session randomness derives.
        seed: u64,
    },
    /// Performs exactly one collapse plus one propagation fixed point.
    StepGeneration {
        /// Adjustment signal applied to this step's weighted selection.
        adjustment: AdjustmentSignal,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a fresh generation episode began.
    EnvironmentReset {
        /// Identifier assigned to the new episode.
        episode: EpisodeId,
        /// Biome restricting the episode's tile variants.
        biome: BiomeId,
        /// Layout constraint applied to the episode.
        layout: Layout,
    },
    /// Confirms that a cell irreversibly collapsed to a concrete tile.
    CellCollapsed {
        /// Coordinate of the collapsed cell.
        cell: CellCoord,
        /// Tile variant chosen for the cell.
        tile: TileId,
    },
    /// Announces that every cell collapsed and the episode finished.
    GenerationCompleted {
        /// Identifier of the completed episode.
        episode: EpisodeId,
    },
    /// Announces that propagation emptied a candidate set.
    GenerationFailed {
        /// Identifier of the failed episode.
        episode: EpisodeId,
        /// Cell whose candidate set became empty.
        cell: CellCoord,
    },
    /// Reports that a step command was ignored.
    StepRejected {
        /// Specific reason the step could not be performed.
        reason: StepRejection,
    },
}

/// Reasons a step command may be ignored by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepRejection {
    /// No environment reset has been performed yet.
    NotInitialized,
    /// The episode already completed; only a reset restarts generation.
    EpisodeComplete,
    /// The episode already failed; only a reset restarts generation.
    EpisodeFailed,
}

/// Immutable representation of a single cell's generation state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellSnapshot {
    /// Coordinate of the cell within the grid.
    pub cell: CellCoord,
    /// Remaining candidate tiles, in catalog order.
    pub candidates: Vec<TileId>,
    /// Tile chosen for the cell, if it collapsed.
    pub chosen: Option<TileId>,
    /// Walkability of the chosen tile, if the cell collapsed.
    pub walkable: Option<bool>,
}

impl CellSnapshot {
    /// Reports whether the cell irreversibly collapsed to a concrete tile.
    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.chosen.is_some()
    }

    /// Number of remaining candidates, the cell's entropy measure.
    #[must_use]
    pub fn entropy(&self) -> usize {
        self.candidates.len()
    }
}

/// Read-only snapshot describing every cell in the generation grid.
#[derive(Clone, Debug, Default)]
pub struct GridView {
    size: GridSize,
    snapshots: Vec<CellSnapshot>,
}

impl GridView {
    /// Creates a new grid view from the provided snapshots.
    ///
    /// Snapshots are sorted into row-major order so iteration and indexed
    /// lookup stay deterministic regardless of capture order.
    #[must_use]
    pub fn from_snapshots(size: GridSize, mut snapshots: Vec<CellSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| (snapshot.cell.row(), snapshot.cell.column()));
        Self { size, snapshots }
    }

    /// Dimensions of the captured grid.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Returns the snapshot captured for the provided cell, if in bounds.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<&CellSnapshot> {
        if !self.size.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.size.columns()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        self.snapshots
            .get(row.checked_mul(width)?.checked_add(column)?)
    }

    /// Iterator over the captured cell snapshots in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &CellSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CellSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AdjustmentSignal, CellCoord, CellSnapshot, Direction, GridSize, GridView, Layout,
        StepRejection, TileId,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn tile_id_round_trips_through_bincode() {
        assert_round_trip(&TileId::new(42));
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        assert_round_trip(&CellCoord::new(5, 7));
    }

    #[test]
    fn grid_size_round_trips_through_bincode() {
        assert_round_trip(&GridSize::new(12, 9));
    }

    #[test]
    fn layout_round_trips_through_bincode() {
        assert_round_trip(&Layout::Walled);
    }

    #[test]
    fn step_rejection_round_trips_through_bincode() {
        assert_round_trip(&StepRejection::EpisodeFailed);
    }

    #[test]
    fn opposite_directions_pair_up() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
        }
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::East.opposite(), Direction::West);
    }

    #[test]
    fn direction_indices_are_dense() {
        let mut seen = [false; 4];
        for direction in Direction::ALL {
            seen[direction.index()] = true;
        }
        assert!(seen.iter().all(|flag| *flag));
    }

    #[test]
    fn neutral_adjustment_carries_zero() {
        assert_eq!(AdjustmentSignal::neutral().get(), 0.0);
    }

    #[test]
    fn grid_size_counts_cells() {
        assert_eq!(GridSize::new(3, 4).cell_count(), 12);
        assert_eq!(GridSize::new(0, 9).cell_count(), 0);
    }

    #[test]
    fn grid_view_sorts_snapshots_row_major() {
        let size = GridSize::new(2, 2);
        let snapshot = |column, row| CellSnapshot {
            cell: CellCoord::new(column, row),
            candidates: vec![TileId::new(0)],
            chosen: None,
            walkable: None,
        };
        let view = GridView::from_snapshots(
            size,
            vec![
                snapshot(1, 1),
                snapshot(0, 0),
                snapshot(1, 0),
                snapshot(0, 1),
            ],
        );

        let order: Vec<CellCoord> = view.iter().map(|snapshot| snapshot.cell).collect();
        assert_eq!(
            order,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
            ]
        );
        let fetched = view.get(CellCoord::new(1, 0)).expect("snapshot in bounds");
        assert_eq!(fetched.cell, CellCoord::new(1, 0));
        assert!(view.get(CellCoord::new(2, 0)).is_none());
    }
}
