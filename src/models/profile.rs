//! User profile inputs
//!
//! The enumerations used by body metrics and recommended calorie targets.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Physical activity level, from minimal (FIRST) to very high (FIFTH)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityLevel {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
}

impl ActivityLevel {
    /// TDEE multiplier applied to the basal metabolic rate
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::First => 1.2,
            ActivityLevel::Second => 1.375,
            ActivityLevel::Third => 1.55,
            ActivityLevel::Fourth => 1.725,
            ActivityLevel::Fifth => 1.9,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "first" | "1" => Some(ActivityLevel::First),
            "second" | "2" => Some(ActivityLevel::Second),
            "third" | "3" => Some(ActivityLevel::Third),
            "fourth" | "4" => Some(ActivityLevel::Fourth),
            "fifth" | "5" => Some(ActivityLevel::Fifth),
            _ => None,
        }
    }
}

/// Weight goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetWeightType {
    Lose,
    Save,
    Gain,
}

impl TargetWeightType {
    /// Calorie deficit/surplus multiplier
    pub fn multiplier(&self) -> f64 {
        match self {
            TargetWeightType::Lose => 0.8,
            TargetWeightType::Save => 1.0,
            TargetWeightType::Gain => 1.2,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lose" => Some(TargetWeightType::Lose),
            "save" | "maintain" => Some(TargetWeightType::Save),
            "gain" => Some(TargetWeightType::Gain),
            _ => None,
        }
    }
}
