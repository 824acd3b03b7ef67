//! Post-hoc structural validation of a written payload.
//!
//! Re-reads the serialized payload and reports issues instead of throwing:
//! a missing or unrecognized nature, a missing temperature, a temperature
//! outside the global plausibility band, or one implausible for the star's
//! stated nature. The payload is never mutated; callers decide what a
//! non-empty issue list means (the CLI exits non-zero).

use crate::classify::Nature;
use crate::error::AtlasResult;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;

/// Coldest temperature any star in a payload may carry.
pub const GLOBAL_MIN_TEFF_K: f64 = 100.0;
/// Hottest temperature any star in a payload may carry.
pub const GLOBAL_MAX_TEFF_K: f64 = 2_000_000.0;

/// Plausible temperature band per nature, bracketing everything the
/// resolution cascade can produce for that category.
const NATURE_BANDS: &[(Nature, f64, f64)] = &[
    (Nature::MainSequence, 500.0, 60_000.0),
    (Nature::WhiteDwarf, 4_000.0, 150_000.0),
    (Nature::NeutronStar, 100_000.0, 2_000_000.0),
    (Nature::BlackHole, 1_000.0, 1_000_000.0),
];

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    MissingNature {
        cube: String,
        star: String,
    },
    UnrecognizedNature {
        cube: String,
        star: String,
        value: String,
    },
    MissingTemperature {
        cube: String,
        star: String,
    },
    ImplausibleTemperature {
        cube: String,
        star: String,
        teff_k: f64,
    },
    TemperatureNatureMismatch {
        cube: String,
        star: String,
        nature: Nature,
        teff_k: f64,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNature { cube, star } => {
                write!(f, "{} in cube {}: missing nature", star, cube)
            }
            Self::UnrecognizedNature { cube, star, value } => {
                write!(f, "{} in cube {}: unrecognized nature {:?}", star, cube, value)
            }
            Self::MissingTemperature { cube, star } => {
                write!(f, "{} in cube {}: missing temperature", star, cube)
            }
            Self::ImplausibleTemperature { cube, star, teff_k } => write!(
                f,
                "{} in cube {}: temperature {} K outside the {}-{} K plausibility band",
                star, cube, teff_k, GLOBAL_MIN_TEFF_K, GLOBAL_MAX_TEFF_K
            ),
            Self::TemperatureNatureMismatch {
                cube,
                star,
                nature,
                teff_k,
            } => write!(
                f,
                "{} in cube {}: temperature {} K implausible for a {} star",
                star,
                cube,
                teff_k,
                nature.as_str()
            ),
        }
    }
}

/// Reads a payload file and validates it.
pub fn validate_file(path: &Path) -> AtlasResult<Vec<ValidationIssue>> {
    let bytes = fs::read(path)?;
    let value: Value = serde_json::from_slice(&bytes)?;
    Ok(validate_payload(&value))
}

/// Walks every star in every cube and collects structural issues.
pub fn validate_payload(payload: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let Some(cubes) = payload.get("cubes").and_then(Value::as_object) else {
        return issues;
    };

    for (cube_key, cube) in cubes {
        let Some(stars) = cube.get("stars").and_then(Value::as_array) else {
            continue;
        };
        for (position, star) in stars.iter().enumerate() {
            let label = star
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("star #{}", position));
            check_star(star, cube_key, &label, &mut issues);
        }
    }

    issues
}

fn check_star(star: &Value, cube: &str, label: &str, issues: &mut Vec<ValidationIssue>) {
    let nature = match star.get("nature").and_then(Value::as_str) {
        Some(raw) => match Nature::from_payload_str(raw) {
            Some(nature) => Some(nature),
            None => {
                issues.push(ValidationIssue::UnrecognizedNature {
                    cube: cube.to_string(),
                    star: label.to_string(),
                    value: raw.to_string(),
                });
                None
            }
        },
        None => {
            issues.push(ValidationIssue::MissingNature {
                cube: cube.to_string(),
                star: label.to_string(),
            });
            None
        }
    };

    let Some(teff_k) = star.get("temperature").and_then(Value::as_f64) else {
        issues.push(ValidationIssue::MissingTemperature {
            cube: cube.to_string(),
            star: label.to_string(),
        });
        return;
    };

    if !(GLOBAL_MIN_TEFF_K..=GLOBAL_MAX_TEFF_K).contains(&teff_k) {
        issues.push(ValidationIssue::ImplausibleTemperature {
            cube: cube.to_string(),
            star: label.to_string(),
            teff_k,
        });
        return;
    }

    if let Some(nature) = nature {
        let (_, min, max) = NATURE_BANDS
            .iter()
            .find(|(n, _, _)| *n == nature)
            .copied()
            .unwrap_or((nature, GLOBAL_MIN_TEFF_K, GLOBAL_MAX_TEFF_K));
        if !(min..=max).contains(&teff_k) {
            issues.push(ValidationIssue::TemperatureNatureMismatch {
                cube: cube.to_string(),
                star: label.to_string(),
                nature,
                teff_k,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_with_star(star: Value) -> Value {
        json!({
            "metadata": {},
            "selection": {},
            "cubes": {
                "0:0:0": {
                    "index": [0, 0, 0],
                    "origin": [0.0, 0.0, 0.0],
                    "stars": [star]
                }
            }
        })
    }

    #[test]
    fn test_clean_star_has_no_issues() {
        let payload = payload_with_star(json!({
            "name": "Tau Ceti",
            "relative_position": [0.5, 0.5, 0.5],
            "temperature": 5344.0,
            "nature": "main-sequence"
        }));
        assert!(validate_payload(&payload).is_empty());
    }

    #[test]
    fn test_missing_nature() {
        let payload = payload_with_star(json!({
            "name": "Anon",
            "temperature": 5000.0
        }));
        let issues = validate_payload(&payload);
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], ValidationIssue::MissingNature { .. }));
    }

    #[test]
    fn test_unrecognized_nature() {
        let payload = payload_with_star(json!({
            "name": "Anon",
            "temperature": 5000.0,
            "nature": "quasar"
        }));
        let issues = validate_payload(&payload);
        assert!(matches!(
            issues[0],
            ValidationIssue::UnrecognizedNature { .. }
        ));
    }

    #[test]
    fn test_missing_temperature() {
        let payload = payload_with_star(json!({
            "name": "Anon",
            "nature": "main-sequence"
        }));
        let issues = validate_payload(&payload);
        assert!(matches!(
            issues[0],
            ValidationIssue::MissingTemperature { .. }
        ));
    }

    #[test]
    fn test_globally_implausible_temperature() {
        let payload = payload_with_star(json!({
            "name": "Anon",
            "temperature": 5_000_000.0,
            "nature": "neutron-star"
        }));
        let issues = validate_payload(&payload);
        assert!(matches!(
            issues[0],
            ValidationIssue::ImplausibleTemperature { .. }
        ));
    }

    #[test]
    fn test_temperature_implausible_for_nature() {
        // 600 000 K is fine globally but absurd for a main-sequence star.
        let payload = payload_with_star(json!({
            "name": "Anon",
            "temperature": 600_000.0,
            "nature": "main-sequence"
        }));
        let issues = validate_payload(&payload);
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0],
            ValidationIssue::TemperatureNatureMismatch { .. }
        ));
    }

    #[test]
    fn test_neutron_star_band_accepts_cascade_default() {
        let payload = payload_with_star(json!({
            "name": "PSR J0000",
            "temperature": 600_000.0,
            "nature": "neutron-star"
        }));
        assert!(validate_payload(&payload).is_empty());
    }

    #[test]
    fn test_issue_display_names_the_star() {
        let payload = payload_with_star(json!({
            "name": "Wolf 359",
            "nature": "main-sequence"
        }));
        let issues = validate_payload(&payload);
        let message = issues[0].to_string();
        assert!(message.contains("Wolf 359"));
        assert!(message.contains("0:0:0"));
    }

    #[test]
    fn test_validation_never_mutates() {
        let payload = payload_with_star(json!({"name": "Anon"}));
        let before = payload.clone();
        let _ = validate_payload(&payload);
        assert_eq!(payload, before);
    }
}
