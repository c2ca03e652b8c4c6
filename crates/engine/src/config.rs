use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Constants that turn a rule's weight sum into a score and a score into a
/// 0-100 confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score treated as a "reasonable maximum"; reaching it means 100% confidence.
    pub reference_max_score: f64,
    /// Multiplier added per priority point.
    pub priority_step: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reference_max_score: 100.0,
            priority_step: 0.1,
        }
    }
}

impl ScoringConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(toml_content)?)
    }

    pub fn priority_multiplier(&self, priority: u8) -> f64 {
        1.0 + f64::from(priority) * self.priority_step
    }

    pub fn confidence(&self, score: f64) -> u8 {
        if score.is_nan() || score <= 0.0 || self.reference_max_score <= 0.0 {
            return 0;
        }
        (score * 100.0 / self.reference_max_score).min(100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_multiplier_range() {
        let config = ScoringConfig::default();
        assert!((config.priority_multiplier(1) - 1.1).abs() < 1e-9);
        assert!((config.priority_multiplier(5) - 1.5).abs() < 1e-9);
        assert!((config.priority_multiplier(10) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_rounds_and_caps() {
        let config = ScoringConfig::default();
        assert_eq!(config.confidence(75.0), 75);
        assert_eq!(config.confidence(200.0), 100);
        assert_eq!(config.confidence(16.9), 17);
        assert_eq!(config.confidence(15.0), 15);
        assert_eq!(config.confidence(0.0), 0);
    }

    #[test]
    fn confidence_scales_with_reference() {
        let config = ScoringConfig {
            reference_max_score: 50.0,
            ..ScoringConfig::default()
        };
        assert_eq!(config.confidence(25.0), 50);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ScoringConfig::from_toml("priority_step = 0.2").unwrap();
        assert_eq!(config.reference_max_score, 100.0);
        assert!((config.priority_multiplier(5) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            ScoringConfig::from_toml("priority_step = \"high\""),
            Err(EngineError::Toml(_))
        ));
    }
}
