// Analysis configuration.
//
// The tunable parts of the rule catalogue live in `AnalysisConfig`, loaded
// from JSON. Every field has a default, so a config file only needs to name
// what it changes:
//
//   { "voice_priority": ["Alto", "Soprano", "Tenor", "Bass"],
//     "max_consecutive_parallels": 2 }
//
// `voice_priority` decides which voice counts as the highest and lowest when
// splitting the composition (first present = high, last present = low), and
// the search order for the cantus firmus.

use crate::composition::VoiceName;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Voice precedence from highest to lowest.
    pub voice_priority: Vec<VoiceName>,
    /// Longest allowed run of one parallel interval class.
    pub max_consecutive_parallels: usize,
    /// Notes of look-back for voice crossing (1 = simultaneous only).
    pub voice_crossing_spacing: usize,
    /// Print the written rule after each group of violations.
    pub show_rule_text: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            voice_priority: VoiceName::ALL.to_vec(),
            max_consecutive_parallels: 3,
            voice_crossing_spacing: 2,
            show_rule_text: true,
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Load from a JSON file, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config {}: {}. Using defaults.", path.display(), e);
                AnalysisConfig::default()
            }
        }
    }

    /// Rank of a voice in the priority list; unlisted voices sort last in
    /// their natural high-to-low order.
    pub fn rank(&self, voice: VoiceName) -> (usize, VoiceName) {
        let rank = self
            .voice_priority
            .iter()
            .position(|v| *v == voice)
            .unwrap_or(self.voice_priority.len());
        (rank, voice)
    }
}
