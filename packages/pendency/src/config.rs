//! Extraction and categorization settings.
//!
//! Settings are plain values injected into the parser and categorizer at
//! construction, so several differently configured instances can run side
//! by side. They load from TOML; [`DEFAULT_CONFIG_TOML`] is the annotated
//! template and parses to [`PendencyConfig::default`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr as _;

use epf_pendency_models::{DaysCategory, Officer};
use serde::Deserialize;

/// The annotated default configuration file.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

const DEFAULT_EDGES: [i64; 5] = [0, 11, 16, 20, 2000];
const DEFAULT_LABELS: [&str; 4] = ["0-10 Days", "11-15 Days", "16-19 Days", ">=20 Days"];
const DEFAULT_OFFICERS: [(Officer, &[i64]); 4] = [
    (Officer::OfficerA, &[110, 111, 112, 113, 199]),
    (Officer::OfficerB, &[106, 107, 109, 114]),
    (Officer::OfficerC, &[104, 105, 108, 115, 188]),
    (Officer::OfficerD, &[101, 102, 103]),
];

/// Errors raised while loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document is malformed or has unexpected keys.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer than two bucket edges were given.
    #[error("At least two bucket edges are required, got {count}")]
    TooFewEdges {
        /// Number of edges supplied.
        count: usize,
    },

    /// Bucket edges are not strictly increasing.
    #[error("Bucket edges must be strictly increasing: {edges:?}")]
    NonIncreasingEdges {
        /// The offending edges.
        edges: Vec<i64>,
    },

    /// The number of labels does not match the number of buckets.
    #[error("Expected {buckets} bucket labels, got {labels}")]
    LabelCount {
        /// Number of buckets implied by the edges.
        buckets: usize,
        /// Number of labels supplied.
        labels: usize,
    },

    /// An officer name is not one of the known buckets.
    #[error("Unknown officer: {name}")]
    UnknownOfficer {
        /// The unrecognised name.
        name: String,
    },

    /// A group code is assigned to more than one officer.
    #[error("Group {group} is assigned to both {first} and {second}")]
    OverlappingOfficers {
        /// The duplicated group code.
        group: i64,
        /// Officer the group was first assigned to.
        first: Officer,
        /// Officer that assigns it again.
        second: Officer,
    },
}

/// Line positions of the page ownership header.
///
/// These are tied to one report template. When a template changes, pages
/// silently lose their header rather than erroring, so swap the profile
/// instead of guessing alternate offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderProfile {
    /// Index of the `GROUP_ID: ...` line.
    pub group_line: usize,
    /// Index of the `TASK_ID:...` line.
    pub task_line: usize,
    /// Index of the `NAME: ...` line.
    pub name_line: usize,
}

impl Default for HeaderProfile {
    fn default() -> Self {
        Self {
            group_line: 20,
            task_line: 21,
            name_line: 22,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DayBucketsDef {
    edges: Vec<i64>,
    labels: Vec<String>,
}

/// Ordered, half-open pending-days buckets.
///
/// Bucket `i` covers `[edges[i], edges[i + 1])`. Values below the first
/// edge or at/above the last edge fall outside every bucket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "DayBucketsDef")]
pub struct DayBuckets {
    edges: Vec<i64>,
    labels: Vec<String>,
}

impl DayBuckets {
    /// Creates buckets from edges and one label per bucket.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if there are fewer than two edges, the edges
    /// are not strictly increasing, or the label count is wrong.
    pub fn new(edges: Vec<i64>, labels: Vec<String>) -> Result<Self, ConfigError> {
        if edges.len() < 2 {
            return Err(ConfigError::TooFewEdges { count: edges.len() });
        }
        if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::NonIncreasingEdges { edges });
        }
        if labels.len() != edges.len() - 1 {
            return Err(ConfigError::LabelCount {
                buckets: edges.len() - 1,
                labels: labels.len(),
            });
        }
        Ok(Self { edges, labels })
    }

    /// Returns the bucket containing `days`, if any.
    #[must_use]
    pub fn category(&self, days: i64) -> Option<DaysCategory> {
        self.edges
            .windows(2)
            .position(|pair| pair[0] <= days && days < pair[1])
            .map(|rank| DaysCategory {
                rank,
                label: self.labels[rank].clone(),
            })
    }
}

impl TryFrom<DayBucketsDef> for DayBuckets {
    type Error = ConfigError;

    fn try_from(def: DayBucketsDef) -> Result<Self, Self::Error> {
        Self::new(def.edges, def.labels)
    }
}

impl Default for DayBuckets {
    fn default() -> Self {
        Self {
            edges: DEFAULT_EDGES.to_vec(),
            labels: DEFAULT_LABELS.iter().map(|&label| label.to_owned()).collect(),
        }
    }
}

/// Disjoint assignment of group codes to officer buckets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<i64>>")]
pub struct OfficerMap {
    by_group: BTreeMap<i64, Officer>,
}

impl OfficerMap {
    /// Builds the map from each officer's group codes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OverlappingOfficers`] if a group code is
    /// listed under two different officers.
    pub fn new<'a>(
        assignments: impl IntoIterator<Item = (Officer, &'a [i64])>,
    ) -> Result<Self, ConfigError> {
        let mut by_group = BTreeMap::new();
        for (officer, groups) in assignments {
            for &group in groups {
                match by_group.insert(group, officer) {
                    Some(first) if first != officer => {
                        return Err(ConfigError::OverlappingOfficers {
                            group,
                            first,
                            second: officer,
                        });
                    }
                    _ => {}
                }
            }
        }
        Ok(Self { by_group })
    }

    /// Returns the officer handling `group`, if it is mapped.
    #[must_use]
    pub fn officer_for(&self, group: i64) -> Option<Officer> {
        self.by_group.get(&group).copied()
    }

    /// Group codes assigned to `officer`, ascending.
    #[must_use]
    pub fn groups_of(&self, officer: Officer) -> BTreeSet<i64> {
        self.by_group
            .iter()
            .filter(|&(_, &o)| o == officer)
            .map(|(&group, _)| group)
            .collect()
    }
}

impl TryFrom<BTreeMap<String, Vec<i64>>> for OfficerMap {
    type Error = ConfigError;

    fn try_from(raw: BTreeMap<String, Vec<i64>>) -> Result<Self, Self::Error> {
        let parsed = raw
            .iter()
            .map(|(name, groups)| {
                Officer::from_str(name)
                    .map(|officer| (officer, groups.as_slice()))
                    .map_err(|_| ConfigError::UnknownOfficer { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }
}

impl Default for OfficerMap {
    fn default() -> Self {
        Self::new(DEFAULT_OFFICERS).unwrap_or_else(|_| unreachable!())
    }
}

/// Complete extraction and categorization settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PendencyConfig {
    /// Header line positions.
    pub header: HeaderProfile,
    /// Pending-days buckets.
    pub days: DayBuckets,
    /// Officer group-code assignment.
    pub officers: OfficerMap,
}

impl PendencyConfig {
    /// Parses settings from a TOML string, validating them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or any section
    /// fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads and parses a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or fails to parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        log::debug!("Loaded pendency settings from {}", path.display());
        Ok(config)
    }
}
