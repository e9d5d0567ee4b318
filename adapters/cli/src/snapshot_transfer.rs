#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "grid";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "grid:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of a finished grid handed to the rendering host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct GridSnapshot {
    /// Number of tile columns contained in the grid.
    pub columns: u32,
    /// Number of tile rows contained in the grid.
    pub rows: u32,
    /// Biome the grid was generated for.
    pub biome: String,
    /// Seed the episode derived its randomness from.
    pub seed: u64,
    /// Chosen tile names in row-major order; `None` for uncollapsed cells.
    pub tiles: Vec<Option<String>>,
}

impl GridSnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard
    /// transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableSnapshot {
            biome: self.biome.clone(),
            seed: self.seed,
            tiles: self.tiles.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("grid snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SnapshotTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SnapshotTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(SnapshotTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(SnapshotTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(SnapshotTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(SnapshotTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(SnapshotTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SnapshotTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(SnapshotTransferError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            biome: decoded.biome,
            seed: decoded.seed,
            tiles: decoded.tiles,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    biome: String,
    seed: u64,
    tiles: Vec<Option<String>>,
}

/// Errors that can occur while decoding snapshot transfer strings.
#[derive(Debug)]
pub(crate) enum SnapshotTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for SnapshotTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "snapshot payload was empty"),
            Self::MissingPrefix => write!(f, "snapshot string is missing the prefix"),
            Self::MissingVersion => write!(f, "snapshot string is missing the version"),
            Self::MissingDimensions => write!(f, "snapshot string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "snapshot string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "snapshot prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "snapshot version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode snapshot payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse snapshot payload: {error}")
            }
        }
    }
}

impl Error for SnapshotTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), SnapshotTransferError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| SnapshotTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| SnapshotTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| SnapshotTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(SnapshotTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_uncollapsed_grid() {
        let snapshot = GridSnapshot {
            columns: 3,
            rows: 2,
            biome: "meadow".to_owned(),
            seed: 42,
            tiles: vec![None; 6],
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:3x2:")));

        let decoded = GridSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn round_trip_collapsed_grid() {
        let snapshot = GridSnapshot {
            columns: 2,
            rows: 1,
            biome: "cavern".to_owned(),
            seed: 0xfeed_beef,
            tiles: vec![Some("floor".to_owned()), Some("wall".to_owned())],
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:2x1:")));

        let decoded = GridSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn decode_rejects_foreign_prefixes() {
        let error = GridSnapshot::decode("map:v1:2x1:AAAA").expect_err("prefix rejected");
        assert!(matches!(error, SnapshotTransferError::InvalidPrefix(_)));
    }

    #[test]
    fn decode_rejects_zero_dimensions() {
        let error = GridSnapshot::decode("grid:v1:0x4:AAAA").expect_err("dimensions rejected");
        assert!(matches!(error, SnapshotTransferError::InvalidDimensions(_)));
    }
}
