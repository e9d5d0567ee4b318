//! Catalog data loading for the command-line adapter.
//!
//! The generation core treats tile data as static configuration owned by an
//! external collaborator; this module is that collaborator for the CLI. It
//! either parses a JSON catalog file or falls back to the built-in
//! two-biome catalog so the binary runs without any data files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use wavegrid_core::{BiomeSpec, CatalogSpec, TileSpec};

pub(crate) fn load(path: Option<&Path>) -> Result<CatalogSpec> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("could not read catalog file '{}'", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("could not parse catalog file '{}'", path.display()))
        }
        None => Ok(builtin()),
    }
}

/// Built-in catalog: a meadow with a beach transition between grass and
/// water, and a cavern of floors, rubble and walls. All compatibility pairs
/// are symmetric.
pub(crate) fn builtin() -> CatalogSpec {
    let mut grass = TileSpec::new("grass", 8.0);
    ring(&mut grass, &["grass", "sand"]);

    let mut sand = TileSpec::new("sand", 2.0);
    ring(&mut sand, &["grass", "sand", "water"]);

    let mut water = TileSpec::new("water", 3.0);
    ring(&mut water, &["sand", "water"]);
    water.walkable = false;
    water.edge_compatible = false;

    let mut floor = TileSpec::new("floor", 6.0);
    ring(&mut floor, &["floor", "rubble", "wall"]);

    let mut rubble = TileSpec::new("rubble", 2.0);
    ring(&mut rubble, &["floor", "rubble"]);

    let mut wall = TileSpec::new("wall", 4.0);
    ring(&mut wall, &["floor", "wall"]);
    wall.walkable = false;

    CatalogSpec {
        biomes: vec![
            BiomeSpec {
                name: "meadow".to_owned(),
                tiles: vec![grass, sand, water],
            },
            BiomeSpec {
                name: "cavern".to_owned(),
                tiles: vec![floor, rubble, wall],
            },
        ],
    }
}

fn ring(tile: &mut TileSpec, allowed: &[&str]) {
    let allowed: Vec<String> = allowed.iter().map(|name| (*name).to_owned()).collect();
    tile.north = allowed.clone();
    tile.east = allowed.clone();
    tile.south = allowed.clone();
    tile.west = allowed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavegrid_core::TileCatalog;

    #[test]
    fn builtin_catalog_validates_cleanly() {
        let issues = builtin().validate();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn builtin_catalog_carries_both_biomes() {
        let catalog = TileCatalog::from_spec(&builtin());
        assert!(catalog.biome("meadow").is_some());
        assert!(catalog.biome("cavern").is_some());
        let meadow = catalog.biome("meadow").expect("meadow exists");
        assert_eq!(catalog.members(meadow).len(), 3);
    }
}
