//! Sentinel-2 L2A scene classification (SCL) codes

use serde::{Deserialize, Serialize};

/// Per-pixel categorical quality flag of the optical product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneClass {
    NoData,
    Saturated,
    DarkArea,
    CloudShadow,
    Vegetation,
    NotVegetated,
    Water,
    Unclassified,
    CloudMedium,
    CloudHigh,
    ThinCirrus,
    Snow,
}

impl SceneClass {
    /// Classes rejected by default: shadows, medium/high cloud, cirrus, snow.
    pub const DEFAULT_EXCLUDED: [SceneClass; 5] = [
        SceneClass::CloudShadow,
        SceneClass::CloudMedium,
        SceneClass::CloudHigh,
        SceneClass::ThinCirrus,
        SceneClass::Snow,
    ];

    pub fn code(self) -> u8 {
        match self {
            SceneClass::NoData => 0,
            SceneClass::Saturated => 1,
            SceneClass::DarkArea => 2,
            SceneClass::CloudShadow => 3,
            SceneClass::Vegetation => 4,
            SceneClass::NotVegetated => 5,
            SceneClass::Water => 6,
            SceneClass::Unclassified => 7,
            SceneClass::CloudMedium => 8,
            SceneClass::CloudHigh => 9,
            SceneClass::ThinCirrus => 10,
            SceneClass::Snow => 11,
        }
    }

    pub fn from_code(code: u8) -> Option<SceneClass> {
        let class = match code {
            0 => SceneClass::NoData,
            1 => SceneClass::Saturated,
            2 => SceneClass::DarkArea,
            3 => SceneClass::CloudShadow,
            4 => SceneClass::Vegetation,
            5 => SceneClass::NotVegetated,
            6 => SceneClass::Water,
            7 => SceneClass::Unclassified,
            8 => SceneClass::CloudMedium,
            9 => SceneClass::CloudHigh,
            10 => SceneClass::ThinCirrus,
            11 => SceneClass::Snow,
            _ => return None,
        };
        Some(class)
    }

    /// Decode a class stored in a floating-point band.
    ///
    /// Non-integral, negative, NaN or unknown values yield `None`.
    pub fn from_value(value: f64) -> Option<SceneClass> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u8::MAX as f64 {
            return None;
        }
        Self::from_code(value as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in 0..=11u8 {
            let class = SceneClass::from_code(code).unwrap();
            assert_eq!(class.code(), code);
        }
        assert!(SceneClass::from_code(12).is_none());
    }

    #[test]
    fn test_from_value() {
        assert_eq!(SceneClass::from_value(9.0), Some(SceneClass::CloudHigh));
        assert_eq!(SceneClass::from_value(9.5), None);
        assert_eq!(SceneClass::from_value(f64::NAN), None);
        assert_eq!(SceneClass::from_value(-1.0), None);
    }

    #[test]
    fn test_default_exclusions() {
        let codes: Vec<u8> = SceneClass::DEFAULT_EXCLUDED.iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec![3, 8, 9, 10, 11]);
    }
}
