use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{FaceSwapError, Result},
    types::{FaceDescriptor, ScenarioKey, SwapKind, SwapTarget},
};

/// Table shipped with the binary, used when no scenario file is configured
const BUILTIN_SCENARIOS: &str = include_str!("../scenarios.toml");

/// Segment of a scenario key, in lookup order
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum KeySegment {
    Category,
    Scenario,
    Subject,
}

/// Errors raised while loading a scenario table
#[derive(Debug, thiserror::Error)]
pub enum ScenarioLoadError {
    #[error("failed to read scenario table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse scenario table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid scenario entry '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

/// Targets available for one subject of a scenario
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioEntry {
    #[serde(default)]
    image: Option<FaceDescriptor>,
    #[serde(default)]
    video: Option<VideoEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct VideoEntry {
    video_url: String,
    #[serde(default)]
    faces: Vec<FaceDescriptor>,
}

type Subjects = IndexMap<String, ScenarioEntry>;
type Scenarios = IndexMap<String, Subjects>;

/// Immutable category → scenario → subject lookup of swap targets
///
/// Every entry is validated when the table is built, so lookups only fail
/// for keys that are absent or for a kind the entry does not offer.
#[derive(Debug, Clone)]
pub struct ScenarioTable {
    categories: IndexMap<String, Scenarios>,
}

impl ScenarioTable {
    /// The table compiled into the binary
    pub fn builtin() -> std::result::Result<Self, ScenarioLoadError> {
        Self::from_toml(BUILTIN_SCENARIOS)
    }

    /// Load a table from a TOML file
    pub fn from_file(path: &Path) -> std::result::Result<Self, ScenarioLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScenarioLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&raw)
    }

    /// Parse and validate a table
    pub fn from_toml(raw: &str) -> std::result::Result<Self, ScenarioLoadError> {
        let categories: IndexMap<String, Scenarios> = toml::from_str(raw)?;
        let table = Self { categories };

        table.validate()?;

        Ok(table)
    }

    fn validate(&self) -> std::result::Result<(), ScenarioLoadError> {
        for (key, entry) in self.entries() {
            let invalid = |reason: &str| ScenarioLoadError::Invalid {
                key: key.to_string(),
                reason: reason.to_string(),
            };

            if entry.image.is_none() && entry.video.is_none() {
                return Err(invalid("defines neither an image nor a video target"));
            }

            if let Some(ref image) = entry.image
                && !is_complete(image)
            {
                return Err(invalid("image target needs a location_url and landmarks"));
            }

            if let Some(ref video) = entry.video {
                if video.video_url.trim().is_empty() {
                    return Err(invalid("video target needs a video_url"));
                }
                if video.faces.is_empty() {
                    return Err(invalid("video target needs at least one face"));
                }
                if !video.faces.iter().all(is_complete) {
                    return Err(invalid("every video face needs a location_url and landmarks"));
                }
            }
        }

        Ok(())
    }

    fn entries(&self) -> impl Iterator<Item = (ScenarioKey, &ScenarioEntry)> {
        self.categories.iter().flat_map(|(category, scenarios)| {
            scenarios.iter().flat_map(move |(scenario, subjects)| {
                subjects.iter().map(move |(subject, entry)| {
                    let key = ScenarioKey {
                        category: category.clone(),
                        scenario: scenario.clone(),
                        subject: subject.clone(),
                    };
                    (key, entry)
                })
            })
        })
    }

    /// Look up the swap target of `kind` for `key`
    ///
    /// Segments are resolved in order, and the error names the first one
    /// that is missing.
    pub fn resolve(&self, key: &ScenarioKey, kind: SwapKind) -> Result<SwapTarget> {
        let unknown = |segment, value: &str| FaceSwapError::UnknownScenario {
            segment,
            value: value.to_string(),
        };

        let scenarios = self
            .categories
            .get(&key.category)
            .ok_or_else(|| unknown(KeySegment::Category, &key.category))?;

        let subjects = scenarios
            .get(&key.scenario)
            .ok_or_else(|| unknown(KeySegment::Scenario, &key.scenario))?;

        let entry = subjects
            .get(&key.subject)
            .ok_or_else(|| unknown(KeySegment::Subject, &key.subject))?;

        let target = match kind {
            SwapKind::Image => entry.image.clone().map(SwapTarget::Image),
            SwapKind::Video => entry.video.clone().map(|video| SwapTarget::Video {
                video_url: video.video_url,
                faces: video.faces,
            }),
        };

        target.ok_or_else(|| FaceSwapError::IncompleteScenario {
            key: key.to_string(),
            kind,
        })
    }

    /// Summary of the table for clients: which kinds each key supports
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.entries()
            .map(|(key, entry)| {
                let kinds = [
                    entry.image.as_ref().map(|_| SwapKind::Image),
                    entry.video.as_ref().map(|_| SwapKind::Video),
                ]
                .into_iter()
                .flatten()
                .collect();

                CatalogEntry {
                    category: key.category,
                    scenario: key.scenario,
                    subject: key.subject,
                    kinds,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row of the scenario catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub category: String,
    pub scenario: String,
    pub subject: String,
    pub kinds: Vec<SwapKind>,
}

fn is_complete(face: &FaceDescriptor) -> bool {
    !face.location_url.trim().is_empty() && !face.landmarks.trim().is_empty()
}
