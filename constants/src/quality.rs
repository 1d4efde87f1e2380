/// Fidelity/performance preset selected by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityTier {
    High,
    Low,
}

impl QualityTier {
    /// Convert the wire identifier supplied by the UI layer.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }

    /// Wire identifier for frontend communication.
    pub fn to_string(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Low => "LOW",
        }
    }
}

/// Settings bag derived from a tier; applied atomically, never partially.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySettings {
    /// Shadow-map resolution for every shadow-casting light.
    pub shadow_map_size: usize,
    /// Fraction of the device's maximum anisotropy used for the floor.
    pub anisotropy_multiplier: f32,
    /// Outline pass edge-strength uniform.
    pub outline_edge_strength: f32,
    /// Outline pass edge-glow uniform.
    pub outline_edge_glow: f32,
}

/// Sampler anisotropy ceiling; stands in for a per-device query, which the
/// renderer does not expose at this layer.
pub const DEVICE_MAX_ANISOTROPY: u16 = 16;

/// Pure tier-to-settings mapping. Re-derived on every tier change so a
/// toggle sequence always lands on the same bag as a direct switch.
pub const fn settings_for(tier: QualityTier) -> QualitySettings {
    match tier {
        QualityTier::High => QualitySettings {
            shadow_map_size: 2048,
            anisotropy_multiplier: 1.0,
            outline_edge_strength: 3.0,
            outline_edge_glow: 0.6,
        },
        QualityTier::Low => QualitySettings {
            shadow_map_size: 512,
            anisotropy_multiplier: 0.25,
            outline_edge_strength: 1.5,
            outline_edge_glow: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_tiers_is_idempotent() {
        let _ = settings_for(QualityTier::Low);
        let toggled = settings_for(QualityTier::High);
        assert_eq!(toggled, settings_for(QualityTier::High));
    }

    #[test]
    fn tiers_map_to_distinct_bags() {
        assert_ne!(
            settings_for(QualityTier::High),
            settings_for(QualityTier::Low)
        );
    }

    #[test]
    fn wire_identifiers_round_trip() {
        assert_eq!(QualityTier::from_string("HIGH"), Some(QualityTier::High));
        assert_eq!(QualityTier::from_string("low"), Some(QualityTier::Low));
        assert_eq!(QualityTier::from_string("ultra"), None);
        assert_eq!(
            QualityTier::from_string(QualityTier::Low.to_string()),
            Some(QualityTier::Low)
        );
    }
}
