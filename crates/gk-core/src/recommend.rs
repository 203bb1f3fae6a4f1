//! Recommendation mapping produced from a scan or a declared model.

use serde::{Deserialize, Serialize};

use crate::enums::PlatformKind;

/// Where a recommended persona came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Declared,
    GlobalIdentity,
    ConditionalInclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedPlatform {
    pub kind: PlatformKind,
    /// Blank when it could not be inferred and must be asked for.
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    /// Directory pattern of the include that surfaced this platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedPersona {
    pub name: String,
    pub email: String,
    pub source: RecommendationSource,
    #[serde(default)]
    pub platforms: Vec<RecommendedPlatform>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedMapping {
    #[serde(default)]
    pub personas: Vec<RecommendedPersona>,
}

impl RecommendedMapping {
    #[must_use]
    pub fn platform_count(&self) -> usize {
        self.personas.iter().map(|p| p.platforms.len()).sum()
    }
}
