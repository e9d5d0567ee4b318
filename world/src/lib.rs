#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative generation-session state for Wavegrid.
//!
//! The world owns one generation session at a time: the cell grid, the
//! session RNG, and the episode state machine
//! (`Uninitialized → Generating → Complete | Failed`). Trainers mutate it
//! exclusively through [`apply`] and observe it exclusively through the
//! [`query`] module. Each step command performs exactly one collapse plus one
//! propagation fixed point before returning, so an external control loop can
//! interleave with generation one decision at a time.

use wavegrid_core::{
    AdjustmentSignal, BiomeId, CellCoord, Command, EpisodeId, Event, GridSize, Layout,
    StepRejection, TileCatalog,
};

mod grid;
mod propagation;
mod rng;
mod selector;

use grid::Grid;
use propagation::{propagate, PropagationOutcome};
use rng::{derive_session_seed, SplitMix64};

/// Represents the authoritative Wavegrid generation state.
#[derive(Debug)]
pub struct World {
    catalog: TileCatalog,
    episodes: u64,
    session: Option<Session>,
}

impl World {
    /// Creates a new world around the provided immutable catalog.
    ///
    /// The world starts uninitialized; a reset command begins the first
    /// episode. Concurrent sessions each own their own `World` value (and
    /// catalog copy) rather than sharing one.
    #[must_use]
    pub fn new(catalog: TileCatalog) -> Self {
        Self {
            catalog,
            episodes: 0,
            session: None,
        }
    }
}

#[derive(Clone, Debug)]
struct Session {
    episode: EpisodeId,
    biome: BiomeId,
    layout: Layout,
    grid: Grid,
    rng: SplitMix64,
    phase: Phase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Generating,
    Complete,
    Failed,
}

impl Session {
    /// Performs exactly one collapse plus one propagation fixed point.
    fn step(
        &mut self,
        catalog: &TileCatalog,
        adjustment: AdjustmentSignal,
        out_events: &mut Vec<Event>,
    ) {
        let Some(target) = selector::select_cell(&self.grid) else {
            self.phase = Phase::Complete;
            out_events.push(Event::GenerationCompleted {
                episode: self.episode,
            });
            return;
        };

        let candidates: Vec<_> = self
            .grid
            .get(target)
            .map(|cell| cell.candidates().to_vec())
            .unwrap_or_default();

        let Some(tile) = selector::select_tile(&candidates, catalog, adjustment, &mut self.rng)
        else {
            // An uncollapsed cell with no candidates: the contradiction was
            // latent (empty biome or over-restricted layout) and surfaces on
            // the first attempted collapse.
            self.phase = Phase::Failed;
            out_events.push(Event::GenerationFailed {
                episode: self.episode,
                cell: target,
            });
            return;
        };

        if let Some(cell) = self.grid.get_mut(target) {
            cell.collapse(tile);
        }
        out_events.push(Event::CellCollapsed { cell: target, tile });

        match propagate(&mut self.grid, catalog, target) {
            PropagationOutcome::Settled => {}
            PropagationOutcome::Contradiction(cell) => {
                self.phase = Phase::Failed;
                out_events.push(Event::GenerationFailed {
                    episode: self.episode,
                    cell,
                });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ResetEnvironment {
            biome,
            layout,
            size,
            seed,
        } => {
            world.episodes = world.episodes.saturating_add(1);
            let episode = EpisodeId::new(world.episodes);
            let grid = build_grid(&world.catalog, biome, layout, size);
            let rng = SplitMix64::new(derive_session_seed(seed, biome, layout));

            world.session = Some(Session {
                episode,
                biome,
                layout,
                grid,
                rng,
                phase: Phase::Generating,
            });
            out_events.push(Event::EnvironmentReset {
                episode,
                biome,
                layout,
            });
        }
        Command::StepGeneration { adjustment } => {
            let Some(session) = world.session.as_mut() else {
                out_events.push(Event::StepRejected {
                    reason: StepRejection::NotInitialized,
                });
                return;
            };

            match session.phase {
                Phase::Complete => out_events.push(Event::StepRejected {
                    reason: StepRejection::EpisodeComplete,
                }),
                Phase::Failed => out_events.push(Event::StepRejected {
                    reason: StepRejection::EpisodeFailed,
                }),
                Phase::Generating => session.step(&world.catalog, adjustment, out_events),
            }
        }
    }
}

/// Builds the initial grid for an episode.
///
/// Candidate lists start as the biome's full member set in catalog order;
/// the layout may restrict regions further. An unknown biome yields empty
/// candidate universes, which the first step surfaces as a generation
/// failure rather than a distinct error.
fn build_grid(catalog: &TileCatalog, biome: BiomeId, layout: Layout, size: GridSize) -> Grid {
    let members = catalog.members(biome);

    Grid::new_with(size, |cell| {
        let border_only = layout == Layout::Walled && is_border(cell, size);
        members
            .iter()
            .copied()
            .filter(|tile| {
                !border_only
                    || catalog
                        .variant(*tile)
                        .map_or(false, |variant| variant.is_edge_compatible())
            })
            .collect()
    })
}

fn is_border(cell: CellCoord, size: GridSize) -> bool {
    cell.column() == 0
        || cell.row() == 0
        || cell.column() + 1 == size.columns()
        || cell.row() + 1 == size.rows()
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use wavegrid_core::{
        BiomeId, CellCoord, CellSnapshot, EpisodeId, GridView, Layout, TileCatalog,
    };

    use super::{Phase, World};

    /// Captures a read-only view of the generation grid.
    ///
    /// Callers receive snapshots, never live cells; an uninitialized world
    /// yields an empty view.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView {
        let Some(session) = world.session.as_ref() else {
            return GridView::default();
        };

        let snapshots: Vec<CellSnapshot> = session
            .grid
            .iter()
            .map(|(cell, state)| CellSnapshot {
                cell,
                candidates: state.candidates().to_vec(),
                chosen: state.chosen(),
                walkable: state.chosen().and_then(|tile| {
                    world
                        .catalog
                        .variant(tile)
                        .map(|variant| variant.is_walkable())
                }),
            })
            .collect();

        GridView::from_snapshots(session.grid.size(), snapshots)
    }

    /// True iff every cell in the active session collapsed.
    ///
    /// Holds from the moment the final collapse lands and stays true until
    /// the next reset; an uninitialized world is never complete.
    #[must_use]
    pub fn is_complete(world: &World) -> bool {
        world.session.as_ref().map_or(false, |session| {
            session.grid.iter().all(|(_, cell)| cell.is_collapsed())
        })
    }

    /// True iff the active session's sticky failure flag is set.
    #[must_use]
    pub fn has_failed(world: &World) -> bool {
        world
            .session
            .as_ref()
            .map_or(false, |session| session.phase == Phase::Failed)
    }

    /// Identifier of the active episode, if any session started.
    #[must_use]
    pub fn episode(world: &World) -> Option<EpisodeId> {
        world.session.as_ref().map(|session| session.episode)
    }

    /// Biome restricting the active episode, if any session started.
    #[must_use]
    pub fn biome(world: &World) -> Option<BiomeId> {
        world.session.as_ref().map(|session| session.biome)
    }

    /// Layout constraint applied to the active episode, if any session
    /// started.
    #[must_use]
    pub fn layout(world: &World) -> Option<Layout> {
        world.session.as_ref().map(|session| session.layout)
    }

    /// Number of collapsed cells and total cells in the active session.
    #[must_use]
    pub fn progress(world: &World) -> (usize, usize) {
        world.session.as_ref().map_or((0, 0), |session| {
            let total = session.grid.size().cell_count();
            let collapsed = session
                .grid
                .iter()
                .filter(|(_, cell)| cell.is_collapsed())
                .count();
            (collapsed, total)
        })
    }

    /// Collapsed cells whose chosen tile is walkable, in row-major order.
    ///
    /// This is the stable attribute the pathfinding collaborator consumes;
    /// it derives from each chosen tile and never changes once a cell
    /// collapses.
    #[must_use]
    pub fn walkable_cells(world: &World) -> Vec<CellCoord> {
        let Some(session) = world.session.as_ref() else {
            return Vec::new();
        };

        session
            .grid
            .iter()
            .filter_map(|(cell, state)| {
                let tile = state.chosen()?;
                world
                    .catalog
                    .variant(tile)
                    .filter(|variant| variant.is_walkable())
                    .map(|_| cell)
            })
            .collect()
    }

    /// Provides read-only access to the catalog the world was built around.
    #[must_use]
    pub fn catalog(world: &World) -> &TileCatalog {
        &world.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavegrid_core::{BiomeSpec, CatalogSpec, TileId, TileSpec};

    fn single_tile_catalog() -> TileCatalog {
        TileCatalog::from_spec(&CatalogSpec {
            biomes: vec![BiomeSpec {
                name: "solo".to_owned(),
                tiles: vec![TileSpec::new("only", 1.0)],
            }],
        })
    }

    fn hostile_pair_catalog() -> TileCatalog {
        // Two variants incompatible with everything, themselves included.
        let mut a = TileSpec::new("a", 1.0);
        a.north = Vec::new();
        a.east = Vec::new();
        a.south = Vec::new();
        a.west = Vec::new();
        let mut b = TileSpec::new("b", 1.0);
        b.north = Vec::new();
        b.east = Vec::new();
        b.south = Vec::new();
        b.west = Vec::new();

        TileCatalog::from_spec(&CatalogSpec {
            biomes: vec![BiomeSpec {
                name: "hostile".to_owned(),
                tiles: vec![a, b],
            }],
        })
    }

    fn checkerboard_catalog() -> TileCatalog {
        let mut x = TileSpec::new("x", 1.0);
        x.east = vec!["y".to_owned()];
        x.west = vec!["y".to_owned()];
        let mut y = TileSpec::new("y", 1.0);
        y.east = vec!["x".to_owned()];
        y.west = vec!["x".to_owned()];

        TileCatalog::from_spec(&CatalogSpec {
            biomes: vec![BiomeSpec {
                name: "board".to_owned(),
                tiles: vec![x, y],
            }],
        })
    }

    fn reset_command(size: GridSize) -> Command {
        Command::ResetEnvironment {
            biome: BiomeId::new(0),
            layout: Layout::Open,
            size,
            seed: 7,
        }
    }

    fn neutral_step() -> Command {
        Command::StepGeneration {
            adjustment: AdjustmentSignal::neutral(),
        }
    }

    #[test]
    fn reset_builds_full_biome_candidates() {
        let mut world = World::new(checkerboard_catalog());
        let mut events = Vec::new();

        apply(&mut world, reset_command(GridSize::new(2, 2)), &mut events);

        assert_eq!(
            events,
            vec![Event::EnvironmentReset {
                episode: EpisodeId::new(1),
                biome: BiomeId::new(0),
                layout: Layout::Open,
            }]
        );
        for snapshot in query::grid_view(&world).iter() {
            assert_eq!(snapshot.candidates, vec![TileId::new(0), TileId::new(1)]);
            assert!(!snapshot.is_collapsed());
        }
        assert_eq!(query::progress(&world), (0, 4));
    }

    #[test]
    fn walled_layout_restricts_border_cells() {
        let mut interior = TileSpec::new("interior", 1.0);
        interior.edge_compatible = false;
        let catalog = TileCatalog::from_spec(&CatalogSpec {
            biomes: vec![BiomeSpec {
                name: "meadow".to_owned(),
                tiles: vec![TileSpec::new("edge", 1.0), interior],
            }],
        });
        let mut world = World::new(catalog);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ResetEnvironment {
                biome: BiomeId::new(0),
                layout: Layout::Walled,
                size: GridSize::new(3, 3),
                seed: 7,
            },
            &mut events,
        );

        let view = query::grid_view(&world);
        let center = view.get(CellCoord::new(1, 1)).expect("center in bounds");
        assert_eq!(center.candidates, vec![TileId::new(0), TileId::new(1)]);
        for snapshot in view.iter() {
            if snapshot.cell != CellCoord::new(1, 1) {
                assert_eq!(snapshot.candidates, vec![TileId::new(0)]);
            }
        }
    }

    #[test]
    fn single_tile_grid_completes_after_nine_steps() {
        let mut world = World::new(single_tile_catalog());
        let mut events = Vec::new();
        apply(&mut world, reset_command(GridSize::new(3, 3)), &mut events);

        for step in 0..9 {
            let mut events = Vec::new();
            apply(&mut world, neutral_step(), &mut events);
            assert!(
                matches!(events.as_slice(), [Event::CellCollapsed { .. }]),
                "step {step} produced {events:?}"
            );
            assert!(!query::has_failed(&world));
        }

        assert!(query::is_complete(&world));
        assert_eq!(query::progress(&world), (9, 9));

        let mut events = Vec::new();
        apply(&mut world, neutral_step(), &mut events);
        assert_eq!(
            events,
            vec![Event::GenerationCompleted {
                episode: EpisodeId::new(1)
            }]
        );

        let mut events = Vec::new();
        apply(&mut world, neutral_step(), &mut events);
        assert_eq!(
            events,
            vec![Event::StepRejected {
                reason: StepRejection::EpisodeComplete
            }]
        );
        assert!(query::is_complete(&world));
        assert!(!query::has_failed(&world));
    }

    #[test]
    fn hostile_pair_fails_on_first_step() {
        let mut world = World::new(hostile_pair_catalog());
        let mut events = Vec::new();
        apply(&mut world, reset_command(GridSize::new(2, 1)), &mut events);

        let mut events = Vec::new();
        apply(&mut world, neutral_step(), &mut events);

        assert!(matches!(
            events.as_slice(),
            [Event::CellCollapsed { .. }, Event::GenerationFailed { .. }]
        ));
        assert!(query::has_failed(&world));
        assert!(!query::is_complete(&world));
    }

    #[test]
    fn failure_is_sticky_and_freezes_the_grid() {
        let mut world = World::new(hostile_pair_catalog());
        let mut events = Vec::new();
        apply(&mut world, reset_command(GridSize::new(2, 1)), &mut events);
        apply(&mut world, neutral_step(), &mut events);
        assert!(query::has_failed(&world));

        let frozen = query::grid_view(&world).into_vec();
        for _ in 0..3 {
            let mut events = Vec::new();
            apply(&mut world, neutral_step(), &mut events);
            assert_eq!(
                events,
                vec![Event::StepRejected {
                    reason: StepRejection::EpisodeFailed
                }]
            );
        }

        assert!(query::has_failed(&world));
        assert_eq!(query::grid_view(&world).into_vec(), frozen);
    }

    #[test]
    fn unknown_biome_fails_on_first_step() {
        let mut world = World::new(single_tile_catalog());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ResetEnvironment {
                biome: BiomeId::new(9),
                layout: Layout::Open,
                size: GridSize::new(2, 2),
                seed: 7,
            },
            &mut events,
        );
        assert!(!query::has_failed(&world));

        let mut events = Vec::new();
        apply(&mut world, neutral_step(), &mut events);
        assert_eq!(
            events,
            vec![Event::GenerationFailed {
                episode: EpisodeId::new(1),
                cell: CellCoord::new(0, 0),
            }]
        );
        assert!(query::has_failed(&world));
    }

    #[test]
    fn step_before_reset_is_rejected() {
        let mut world = World::new(single_tile_catalog());
        let mut events = Vec::new();
        apply(&mut world, neutral_step(), &mut events);
        assert_eq!(
            events,
            vec![Event::StepRejected {
                reason: StepRejection::NotInitialized
            }]
        );
    }

    #[test]
    fn reset_increments_episode_counter() {
        let mut world = World::new(single_tile_catalog());
        let mut events = Vec::new();
        apply(&mut world, reset_command(GridSize::new(1, 1)), &mut events);
        assert_eq!(query::episode(&world), Some(EpisodeId::new(1)));

        apply(&mut world, reset_command(GridSize::new(1, 1)), &mut events);
        assert_eq!(query::episode(&world), Some(EpisodeId::new(2)));
    }

    #[test]
    fn zero_sized_grid_completes_immediately() {
        let mut world = World::new(single_tile_catalog());
        let mut events = Vec::new();
        apply(&mut world, reset_command(GridSize::new(0, 0)), &mut events);
        assert!(query::is_complete(&world));

        let mut events = Vec::new();
        apply(&mut world, neutral_step(), &mut events);
        assert_eq!(
            events,
            vec![Event::GenerationCompleted {
                episode: EpisodeId::new(1)
            }]
        );
    }

    #[test]
    fn generation_replays_identically_for_fixed_inputs() {
        let adjustments = [0.0, 0.4, -0.3, 0.9, 0.0, -1.2];
        let run = || {
            let mut world = World::new(checkerboard_catalog());
            let mut events = Vec::new();
            apply(&mut world, reset_command(GridSize::new(4, 3)), &mut events);

            let mut histories = Vec::new();
            for step in 0..24 {
                let adjustment =
                    AdjustmentSignal::new(adjustments[step % adjustments.len()]);
                let mut events = Vec::new();
                apply(
                    &mut world,
                    Command::StepGeneration { adjustment },
                    &mut events,
                );
                histories.push((events, query::grid_view(&world).into_vec()));
            }
            histories
        };

        assert_eq!(run(), run(), "replay diverged between runs");
    }

    #[test]
    fn candidate_sets_only_shrink_between_steps() {
        let mut world = World::new(checkerboard_catalog());
        let mut events = Vec::new();
        apply(&mut world, reset_command(GridSize::new(4, 4)), &mut events);

        let mut previous = query::grid_view(&world).into_vec();
        loop {
            let mut events = Vec::new();
            apply(&mut world, neutral_step(), &mut events);
            if events.iter().any(|event| {
                matches!(
                    event,
                    Event::GenerationCompleted { .. }
                        | Event::GenerationFailed { .. }
                        | Event::StepRejected { .. }
                )
            }) {
                break;
            }

            let current = query::grid_view(&world).into_vec();
            for (before, after) in previous.iter().zip(&current) {
                assert!(after.candidates.len() <= before.candidates.len());
                for candidate in &after.candidates {
                    assert!(before.candidates.contains(candidate));
                }
            }
            previous = current;
        }
    }

    #[test]
    fn adjacent_tiles_in_complete_grids_are_compatible() {
        let catalog = checkerboard_catalog();
        let mut world = World::new(catalog.clone());
        let mut events = Vec::new();
        apply(&mut world, reset_command(GridSize::new(4, 4)), &mut events);

        for _ in 0..16 {
            let mut events = Vec::new();
            apply(&mut world, neutral_step(), &mut events);
        }
        assert!(query::is_complete(&world));
        assert!(!query::has_failed(&world));

        let view = query::grid_view(&world);
        for snapshot in view.iter() {
            let tile = snapshot.chosen.expect("complete grid");
            for direction in wavegrid_core::Direction::ALL {
                let neighbor = match direction {
                    wavegrid_core::Direction::North => snapshot
                        .cell
                        .row()
                        .checked_sub(1)
                        .map(|row| CellCoord::new(snapshot.cell.column(), row)),
                    wavegrid_core::Direction::East => {
                        Some(CellCoord::new(snapshot.cell.column() + 1, snapshot.cell.row()))
                    }
                    wavegrid_core::Direction::South => {
                        Some(CellCoord::new(snapshot.cell.column(), snapshot.cell.row() + 1))
                    }
                    wavegrid_core::Direction::West => snapshot
                        .cell
                        .column()
                        .checked_sub(1)
                        .map(|column| CellCoord::new(column, snapshot.cell.row())),
                };
                let Some(neighbor) = neighbor.and_then(|cell| view.get(cell)) else {
                    continue;
                };
                let other = neighbor.chosen.expect("complete grid");
                assert!(catalog.compatible(tile, other, direction));
                assert!(catalog.compatible(other, tile, direction.opposite()));
            }
        }
    }

    #[test]
    fn walkable_cells_follow_chosen_tiles() {
        let mut water = TileSpec::new("water", 1.0);
        water.walkable = false;
        let catalog = TileCatalog::from_spec(&CatalogSpec {
            biomes: vec![BiomeSpec {
                name: "mixed".to_owned(),
                tiles: vec![TileSpec::new("grass", 1.0), water],
            }],
        });
        let mut world = World::new(catalog);
        let mut events = Vec::new();
        apply(&mut world, reset_command(GridSize::new(3, 2)), &mut events);

        for _ in 0..6 {
            let mut events = Vec::new();
            apply(&mut world, neutral_step(), &mut events);
        }
        assert!(query::is_complete(&world));

        let expected: Vec<CellCoord> = query::grid_view(&world)
            .iter()
            .filter(|snapshot| snapshot.walkable == Some(true))
            .map(|snapshot| snapshot.cell)
            .collect();
        assert_eq!(query::walkable_cells(&world), expected);
        for snapshot in query::grid_view(&world).iter() {
            assert_eq!(
                snapshot.walkable,
                snapshot.chosen.map(|tile| tile == TileId::new(0))
            );
        }
    }
}
