//! Evaluation weights.
//!
//! An immutable set of named coefficients handed to the evaluator when an
//! engine is built. Overrides are applied by name at construction time.

use crate::errors::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weights {
    /// Magnitude of a won or lost position.
    pub win_score: i32,
    /// Value of one pawn of material.
    pub material: i32,
    /// Bonus per pawn one step away from its promotion rank.
    pub promotion_bonus: i32,
    /// Bonus per rank advanced, White pawns.
    pub advancement_white: i32,
    /// Bonus per rank advanced, Black pawns.
    pub advancement_black: i32,
    /// Bonus per passed White pawn.
    pub passed_pawn_white: i32,
    /// Bonus per passed Black pawn.
    pub passed_pawn_black: i32,
}

pub const DEFAULT_WEIGHTS: Weights = Weights {
    win_score: 100_000,
    material: 100,
    promotion_bonus: 60,
    advancement_white: 8,
    advancement_black: 8,
    passed_pawn_white: 40,
    passed_pawn_black: 40,
};

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl Weights {
    pub const NAMES: [&'static str; 9] = [
        "win_score",
        "material",
        "promotion_bonus",
        "advancement",
        "advancement_white",
        "advancement_black",
        "passed_pawn",
        "passed_pawn_white",
        "passed_pawn_black",
    ];

    /// Copy with one named weight replaced. `advancement` and `passed_pawn`
    /// set both sides at once.
    pub fn with_override(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        };
        let parsed = value.trim().parse::<i32>().map_err(|_| invalid())?;

        match name.trim().to_ascii_lowercase().as_str() {
            "win_score" => {
                if parsed <= 0 {
                    return Err(invalid());
                }
                self.win_score = parsed;
            }
            "material" => self.material = parsed,
            "promotion_bonus" => self.promotion_bonus = parsed,
            "advancement" => {
                self.advancement_white = parsed;
                self.advancement_black = parsed;
            }
            "advancement_white" => self.advancement_white = parsed,
            "advancement_black" => self.advancement_black = parsed,
            "passed_pawn" => {
                self.passed_pawn_white = parsed;
                self.passed_pawn_black = parsed;
            }
            "passed_pawn_white" => self.passed_pawn_white = parsed,
            "passed_pawn_black" => self.passed_pawn_black = parsed,
            _ => return Err(ConfigError::UnknownOption(name.to_owned())),
        }

        Ok(self)
    }

    /// Apply a `name=value` override, the command-line form.
    pub fn with_assignment(self, assignment: &str) -> Result<Self, ConfigError> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidValue {
                name: assignment.to_owned(),
                value: String::new(),
            })?;
        self.with_override(name, value)
    }

    /// True when both sides are weighted identically, which is what makes
    /// the evaluation exactly antisymmetric under colour flip.
    pub fn is_symmetric(&self) -> bool {
        self.advancement_white == self.advancement_black
            && self.passed_pawn_white == self.passed_pawn_black
    }
}

#[cfg(test)]
mod tests {
    use super::{Weights, DEFAULT_WEIGHTS};
    use crate::errors::ConfigError;

    #[test]
    fn overrides_replace_named_fields() {
        let w = Weights::default()
            .with_override("material", "120")
            .and_then(|w| w.with_assignment("advancement=5"))
            .and_then(|w| w.with_override("passed_pawn_black", "55"))
            .expect("overrides should apply");

        assert_eq!(w.material, 120);
        assert_eq!(w.advancement_white, 5);
        assert_eq!(w.advancement_black, 5);
        assert_eq!(w.passed_pawn_black, 55);
        assert_eq!(w.passed_pawn_white, DEFAULT_WEIGHTS.passed_pawn_white);
        assert!(!w.is_symmetric());
        assert!(DEFAULT_WEIGHTS.is_symmetric());
    }

    #[test]
    fn bad_overrides_are_config_errors() {
        assert_eq!(
            Weights::default().with_override("queen", "900"),
            Err(ConfigError::UnknownOption("queen".to_owned()))
        );
        assert!(matches!(
            Weights::default().with_override("material", "lots"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Weights::default().with_override("win_score", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(Weights::default().with_assignment("material").is_err());
    }
}
