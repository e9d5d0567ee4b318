//! Static tile-variant catalog shared by every generation session.
//!
//! Catalogs are authored as flat [`CatalogSpec`] data (serde-friendly, with
//! tile names as strings) and resolved once into an immutable [`TileCatalog`]
//! holding dense identifiers and per-direction compatibility tables. The
//! resolved catalog is passed into each generation session; nothing here is a
//! process-wide singleton and nothing is mutated during generation.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BiomeId, Direction, TileId};

/// Marker inside a compatibility list meaning "compatible with anything".
pub const WILDCARD: &str = "*";

/// Flat catalog description loaded from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogSpec {
    /// Biomes contained in the catalog, in declaration order.
    pub biomes: Vec<BiomeSpec>,
}

/// Description of one biome's tile variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeSpec {
    /// Name identifying the biome.
    pub name: String,
    /// Tile variants eligible within the biome, in declaration order.
    pub tiles: Vec<TileSpec>,
}

/// Description of a single tile variant.
///
/// Compatibility lists name the tiles allowed to sit in the given direction;
/// an entry equal to [`WILDCARD`] accepts any neighbor. Lists are
/// direction-specific and never mirrored automatically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Name identifying the tile within its biome.
    pub name: String,
    /// Base selection weight; must be a positive real.
    pub weight: f64,
    /// Whether agents can traverse cells collapsed to this tile.
    #[serde(default = "default_flag")]
    pub walkable: bool,
    /// Whether the tile may occupy border cells under restricted layouts.
    #[serde(default = "default_flag")]
    pub edge_compatible: bool,
    /// Tiles allowed directly north of this tile.
    #[serde(default = "wildcard_list")]
    pub north: Vec<String>,
    /// Tiles allowed directly east of this tile.
    #[serde(default = "wildcard_list")]
    pub east: Vec<String>,
    /// Tiles allowed directly south of this tile.
    #[serde(default = "wildcard_list")]
    pub south: Vec<String>,
    /// Tiles allowed directly west of this tile.
    #[serde(default = "wildcard_list")]
    pub west: Vec<String>,
}

fn default_flag() -> bool {
    true
}

fn wildcard_list() -> Vec<String> {
    vec![WILDCARD.to_owned()]
}

impl TileSpec {
    /// Creates a tile spec compatible with anything in every direction,
    /// walkable and edge-compatible.
    #[must_use]
    pub fn new(name: &str, weight: f64) -> Self {
        Self {
            name: name.to_owned(),
            weight,
            walkable: true,
            edge_compatible: true,
            north: wildcard_list(),
            east: wildcard_list(),
            south: wildcard_list(),
            west: wildcard_list(),
        }
    }

    fn list(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::North => &self.north,
            Direction::East => &self.east,
            Direction::South => &self.south,
            Direction::West => &self.west,
        }
    }

    fn allows_name(&self, direction: Direction, name: &str) -> bool {
        self.list(direction)
            .iter()
            .any(|entry| entry == WILDCARD || entry == name)
    }
}

impl CatalogSpec {
    /// Checks the catalog data for configuration mistakes.
    ///
    /// Returns every issue found: duplicate names, non-positive weights,
    /// compatibility entries naming unknown tiles, and asymmetric pairs
    /// (tile A accepts B in one direction while B does not accept A from the
    /// opposite perspective). Validation is an explicit load-time step;
    /// misconfigured data that skips it only manifests as downstream
    /// contradictions during generation.
    #[must_use]
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        let mut seen_biomes: Vec<&str> = Vec::new();

        for biome in &self.biomes {
            if seen_biomes.contains(&biome.name.as_str()) {
                issues.push(CatalogIssue::DuplicateBiome {
                    biome: biome.name.clone(),
                });
            }
            seen_biomes.push(&biome.name);

            let names: Vec<&str> = biome.tiles.iter().map(|tile| tile.name.as_str()).collect();
            for (index, tile) in biome.tiles.iter().enumerate() {
                if names[..index].contains(&tile.name.as_str()) {
                    issues.push(CatalogIssue::DuplicateTile {
                        biome: biome.name.clone(),
                        tile: tile.name.clone(),
                    });
                }

                if !(tile.weight > 0.0) || !tile.weight.is_finite() {
                    issues.push(CatalogIssue::NonPositiveWeight {
                        biome: biome.name.clone(),
                        tile: tile.name.clone(),
                    });
                }

                for direction in Direction::ALL {
                    for entry in tile.list(direction) {
                        if entry != WILDCARD && !names.contains(&entry.as_str()) {
                            issues.push(CatalogIssue::UnknownReference {
                                biome: biome.name.clone(),
                                tile: tile.name.clone(),
                                direction,
                                referenced: entry.clone(),
                            });
                        }
                    }
                }
            }

            for from in &biome.tiles {
                for to in &biome.tiles {
                    for direction in Direction::ALL {
                        if from.allows_name(direction, &to.name)
                            && !to.allows_name(direction.opposite(), &from.name)
                        {
                            issues.push(CatalogIssue::AsymmetricPair {
                                biome: biome.name.clone(),
                                from: from.name.clone(),
                                to: to.name.clone(),
                                direction,
                            });
                        }
                    }
                }
            }
        }

        issues
    }
}

/// Configuration mistakes reported by [`CatalogSpec::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogIssue {
    /// Two biomes share the same name.
    DuplicateBiome {
        /// Name declared more than once.
        biome: String,
    },
    /// Two tiles within one biome share the same name.
    DuplicateTile {
        /// Biome containing the duplicate.
        biome: String,
        /// Tile name declared more than once.
        tile: String,
    },
    /// A tile declares a zero, negative, or non-finite base weight.
    NonPositiveWeight {
        /// Biome containing the tile.
        biome: String,
        /// Tile carrying the invalid weight.
        tile: String,
    },
    /// A compatibility list names a tile absent from the biome.
    UnknownReference {
        /// Biome containing the tile.
        biome: String,
        /// Tile whose list holds the unknown entry.
        tile: String,
        /// Direction of the offending list.
        direction: Direction,
        /// The unknown name.
        referenced: String,
    },
    /// One tile accepts a neighbor that does not accept it back.
    AsymmetricPair {
        /// Biome containing the pair.
        biome: String,
        /// Tile whose list accepts the neighbor.
        from: String,
        /// Neighbor that does not reciprocate.
        to: String,
        /// Direction from `from` toward `to`.
        direction: Direction,
    },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBiome { biome } => {
                write!(f, "biome '{biome}' is declared more than once")
            }
            Self::DuplicateTile { biome, tile } => {
                write!(f, "tile '{tile}' is declared more than once in biome '{biome}'")
            }
            Self::NonPositiveWeight { biome, tile } => {
                write!(f, "tile '{tile}' in biome '{biome}' has a non-positive weight")
            }
            Self::UnknownReference {
                biome,
                tile,
                direction,
                referenced,
            } => write!(
                f,
                "tile '{tile}' in biome '{biome}' references unknown tile '{referenced}' ({direction:?})"
            ),
            Self::AsymmetricPair {
                biome,
                from,
                to,
                direction,
            } => write!(
                f,
                "tile '{from}' accepts '{to}' toward {direction:?} in biome '{biome}' but '{to}' does not accept '{from}' back"
            ),
        }
    }
}

/// Resolved per-direction compatibility relation of one tile variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Compatibility {
    /// The tile accepts any neighbor in this direction.
    Any,
    /// The tile accepts only the listed variants in this direction.
    Listed(Vec<TileId>),
}

impl Compatibility {
    /// Reports whether the provided tile is accepted in this direction.
    #[must_use]
    pub fn allows(&self, tile: TileId) -> bool {
        match self {
            Self::Any => true,
            Self::Listed(tiles) => tiles.contains(&tile),
        }
    }
}

/// Immutable description of a single resolved tile variant.
#[derive(Clone, Debug)]
pub struct TileVariant {
    id: TileId,
    name: String,
    biome: BiomeId,
    weight: f64,
    walkable: bool,
    edge_compatible: bool,
    compatibility: [Compatibility; 4],
}

impl TileVariant {
    /// Identifier assigned to the variant by the catalog.
    #[must_use]
    pub const fn id(&self) -> TileId {
        self.id
    }

    /// Name the variant was declared with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Biome the variant belongs to.
    #[must_use]
    pub const fn biome(&self) -> BiomeId {
        self.biome
    }

    /// Base selection weight.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Whether agents can traverse cells collapsed to this variant.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.walkable
    }

    /// Whether the variant may occupy border cells under restricted layouts.
    #[must_use]
    pub const fn is_edge_compatible(&self) -> bool {
        self.edge_compatible
    }

    /// Reports whether `other` is accepted as a neighbor in `direction`,
    /// judged from this variant's own list only.
    #[must_use]
    pub fn allows(&self, other: TileId, direction: Direction) -> bool {
        self.compatibility[direction.index()].allows(other)
    }
}

#[derive(Clone, Debug)]
struct BiomeEntry {
    name: String,
    members: Vec<TileId>,
}

/// Immutable biome-to-tiles map with direction-specific compatibility lookup.
///
/// Built once from a [`CatalogSpec`] by a single stable filter pass per biome
/// and passed by reference (or owned copy) into each generation session.
#[derive(Clone, Debug, Default)]
pub struct TileCatalog {
    variants: Vec<TileVariant>,
    biomes: Vec<BiomeEntry>,
}

impl TileCatalog {
    /// Resolves a flat catalog spec into dense identifiers and compatibility
    /// tables.
    ///
    /// Compatibility entries naming unknown tiles are dropped during
    /// resolution; [`CatalogSpec::validate`] reports them explicitly before
    /// this point for callers that want the check.
    #[must_use]
    pub fn from_spec(spec: &CatalogSpec) -> Self {
        let mut variants = Vec::new();
        let mut biomes = Vec::new();

        for (biome_index, biome) in spec.biomes.iter().enumerate() {
            let biome_id = BiomeId::new(biome_index as u32);
            let mut name_to_id: HashMap<&str, TileId> = HashMap::new();
            let mut members = Vec::with_capacity(biome.tiles.len());

            for tile in &biome.tiles {
                let id = TileId::new(variants.len() as u32 + members.len() as u32);
                if !name_to_id.contains_key(tile.name.as_str()) {
                    let _ = name_to_id.insert(tile.name.as_str(), id);
                }
                members.push(id);
            }

            let base = variants.len() as u32;
            for (offset, tile) in biome.tiles.iter().enumerate() {
                let id = TileId::new(base + offset as u32);
                let compatibility = Direction::ALL
                    .map(|direction| resolve_list(tile.list(direction), &name_to_id));
                variants.push(TileVariant {
                    id,
                    name: tile.name.clone(),
                    biome: biome_id,
                    weight: tile.weight,
                    walkable: tile.walkable,
                    edge_compatible: tile.edge_compatible,
                    compatibility,
                });
            }

            biomes.push(BiomeEntry {
                name: biome.name.clone(),
                members,
            });
        }

        Self { variants, biomes }
    }

    /// Looks up the identifier of the named biome.
    #[must_use]
    pub fn biome(&self, name: &str) -> Option<BiomeId> {
        self.biomes
            .iter()
            .position(|entry| entry.name == name)
            .map(|index| BiomeId::new(index as u32))
    }

    /// Name of the provided biome, if it exists in the catalog.
    #[must_use]
    pub fn biome_name(&self, biome: BiomeId) -> Option<&str> {
        let index = usize::try_from(biome.get()).ok()?;
        self.biomes.get(index).map(|entry| entry.name.as_str())
    }

    /// Iterator over all biome names in declaration order.
    pub fn biome_names(&self) -> impl Iterator<Item = &str> {
        self.biomes.iter().map(|entry| entry.name.as_str())
    }

    /// Ordered tile identifiers eligible within the provided biome.
    ///
    /// Unknown biomes yield an empty slice: the candidate universe is empty
    /// and the first collapse attempt will contradict.
    #[must_use]
    pub fn members(&self, biome: BiomeId) -> &[TileId] {
        usize::try_from(biome.get())
            .ok()
            .and_then(|index| self.biomes.get(index))
            .map_or(&[], |entry| entry.members.as_slice())
    }

    /// Retrieves the resolved variant carrying the provided identifier.
    #[must_use]
    pub fn variant(&self, tile: TileId) -> Option<&TileVariant> {
        let index = usize::try_from(tile.get()).ok()?;
        self.variants.get(index)
    }

    /// All resolved variants across every biome, in catalog order.
    #[must_use]
    pub fn variants(&self) -> &[TileVariant] {
        &self.variants
    }

    /// Reports whether the catalog holds no tile variants at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Reports whether `b` may sit in `direction` from `a`, judged from
    /// `a`'s own compatibility list only.
    ///
    /// Compatibility is not assumed symmetric; callers enforcing mutual
    /// agreement must also check from `b`'s perspective with the opposite
    /// direction.
    #[must_use]
    pub fn compatible(&self, a: TileId, b: TileId, direction: Direction) -> bool {
        self.variant(a)
            .map_or(false, |variant| variant.allows(b, direction))
    }
}

fn resolve_list(list: &[String], name_to_id: &HashMap<&str, TileId>) -> Compatibility {
    if list.iter().any(|entry| entry == WILDCARD) {
        return Compatibility::Any;
    }

    Compatibility::Listed(
        list.iter()
            .filter_map(|entry| name_to_id.get(entry.as_str()).copied())
            .collect(),
    )
}
