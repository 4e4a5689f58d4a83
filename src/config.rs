use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{AccelError, AccelResult};

pub const DEFAULT_BASE_DECAY_RATE: f64 = 0.002;
pub const DEFAULT_MIN_RETENTION: f64 = 0.1;
pub const DEFAULT_ACCESS_STABILITY_K: f64 = 0.3;
pub const DEFAULT_RELATION_RESISTANCE_K: f64 = 0.1;
pub const DEFAULT_CHANNEL_DIVERSITY_K: f64 = 0.2;

/// Memory category. Determines which type multiplier scales the decay rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    #[default]
    Conversation = 0,
    Fact = 1,
    Preference = 2,
    Insight = 3,
}

impl MemoryType {
    pub const ALL: [MemoryType; 4] = [
        MemoryType::Conversation,
        MemoryType::Fact,
        MemoryType::Preference,
        MemoryType::Insight,
    ];

    /// Map a raw category index, clamping to the valid range.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.clamp(0, 3) as usize]
    }

    /// Map a category label. Unknown labels fall back to `Conversation`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "fact" => MemoryType::Fact,
            "preference" => MemoryType::Preference,
            "insight" => MemoryType::Insight,
            _ => MemoryType::Conversation,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Decay rate multiplier per memory type (lower = slower decay).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeMultipliers([f64; 4]);

impl TypeMultipliers {
    pub const fn new(conversation: f64, fact: f64, preference: f64, insight: f64) -> Self {
        Self([conversation, fact, preference, insight])
    }

    pub fn get(&self, memory_type: MemoryType) -> f64 {
        self.0[memory_type.index()]
    }

    pub fn as_array(&self) -> &[f64; 4] {
        &self.0
    }
}

impl Default for TypeMultipliers {
    fn default() -> Self {
        Self::new(1.0, 0.3, 0.5, 0.7)
    }
}

impl Index<MemoryType> for TypeMultipliers {
    type Output = f64;

    fn index(&self, memory_type: MemoryType) -> &f64 {
        &self.0[memory_type.index()]
    }
}

impl TryFrom<&[f64]> for TypeMultipliers {
    type Error = AccelError;

    fn try_from(values: &[f64]) -> AccelResult<Self> {
        let table: [f64; 4] = values
            .try_into()
            .map_err(|_| AccelError::TypeMultiplierCount {
                expected: 4,
                actual: values.len(),
            })?;
        Ok(Self(table))
    }
}

/// Tunable parameters of the decay formula, shared read-only across a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecayConfig {
    /// Base decay rate per hour.
    pub base_decay_rate: f64,
    /// Fraction of the original importance decay can never go below.
    pub min_retention: f64,
    /// Weight of `ln(1 + access_count)` in the stability term.
    pub access_stability_k: f64,
    /// Resistance gained per graph connection, saturating at 1.0.
    pub relation_resistance_k: f64,
    /// Rate reduction per distinct channel mentioning the record.
    pub channel_diversity_k: f64,
    pub type_multipliers: TypeMultipliers,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            base_decay_rate: DEFAULT_BASE_DECAY_RATE,
            min_retention: DEFAULT_MIN_RETENTION,
            access_stability_k: DEFAULT_ACCESS_STABILITY_K,
            relation_resistance_k: DEFAULT_RELATION_RESISTANCE_K,
            channel_diversity_k: DEFAULT_CHANNEL_DIVERSITY_K,
            type_multipliers: TypeMultipliers::default(),
        }
    }
}

impl DecayConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> AccelResult<Self> {
        let config: DecayConfig =
            toml::from_str(source).map_err(|e| AccelError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is finite and in range.
    pub fn validate(&self) -> AccelResult<()> {
        let rates = [
            ("base_decay_rate", self.base_decay_rate),
            ("access_stability_k", self.access_stability_k),
            ("relation_resistance_k", self.relation_resistance_k),
            ("channel_diversity_k", self.channel_diversity_k),
        ];
        for (field, value) in rates {
            check_non_negative(field, value)?;
        }
        for value in self.type_multipliers.as_array() {
            check_non_negative("type_multipliers", *value)?;
        }

        if !(0.0..=1.0).contains(&self.min_retention) {
            return Err(reject("min_retention", "must be within [0, 1]"));
        }
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: f64) -> AccelResult<()> {
    if !value.is_finite() {
        return Err(reject(field, "must be finite"));
    }
    if value < 0.0 {
        return Err(reject(field, "must not be negative"));
    }
    Ok(())
}

fn reject(field: &'static str, reason: &'static str) -> AccelError {
    tracing::warn!(field, reason, "rejected decay config");
    AccelError::InvalidConfig { field, reason }
}
