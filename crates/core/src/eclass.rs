//! Heuristic ECLASS resolver.
//!
//! Assigns a classification code to a raw tag name by matching an ordered
//! table of synonym patterns. The table order is significant: specific
//! quantities (temperature, velocity) come before the generic motor and
//! sensor buckets so ambiguous tags such as `Sen_Tmp_01` resolve to the
//! specific code.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Generic code used when nothing more specific is known.
pub const GENERIC_ECLASS_ID: &str = "0173-1#02-AAA000";
pub const GENERIC_TARGET: &str = "Generic Sensor Value";
pub const UNKNOWN_UNIT: &str = "unknown";

/// Literal the generator emits when it cannot classify a tag.
pub const UNKNOWN_TARGET: &str = "UNKNOWN";

/// Upstream answers below this confidence are replaced by the heuristic.
pub const FALLBACK_THRESHOLD: f64 = 0.5;

pub const PATTERN_CONFIDENCE: f64 = 0.75;
pub const GENERIC_CONFIDENCE: f64 = 0.6;

/// (synonym alternation, ECLASS id, target label, unit), highest priority first.
const PATTERN_TABLE: &[(&str, &str, &str, &str)] = &[
    (
        "temp|tmp|temperature|temperatura|temperatur",
        "0173-1#02-AAB713#005",
        "Temperature",
        "degC",
    ),
    (
        "vel|spd|speed|velocity|velocidade|rpm|vazao|flow",
        "0173-1#02-BAA123",
        "Velocity (linear)",
        "m/s",
    ),
    (
        "acionar|marcha|esteira|start|ligar|comando[^a-z].*motor|motor[^a-z].*forward",
        "0173-1#02-BAB014#005",
        "Drive Command / Motor Forward",
        "boolean",
    ),
    (
        "status|stop|run|cmd|control|enable|operating",
        "0173-1#02-BAF321#004",
        "Operating Status",
        "boolean",
    ),
    (
        "pres|pressure|pressao",
        "0173-1#02-AAA699",
        "Pressure",
        "bar",
    ),
    (
        "mtr|motor",
        "0173-1#02-BAA123",
        "Motor related property",
        UNKNOWN_UNIT,
    ),
    (
        "sen|sensor",
        "0173-1#02-AAB713#005",
        "Sensor value",
        UNKNOWN_UNIT,
    ),
];

/// Keywords in a target label and the unit they imply, checked in order.
const UNIT_KEYWORDS: &[(&[&str], &str)] = &[
    (&["temp", "temperature", "temperatura"], "degC"),
    (&["velocity", "velocidade", "speed", "rpm"], "m/s"),
    (&["pressure", "pressao"], "bar"),
    (&["flow", "vazao"], "m\u{b3}/h"),
    (&["status", "start", "stop", "boolean"], "boolean"),
];

/// One entry of the priority-ordered pattern table.
#[derive(Debug)]
pub struct EclassPattern {
    pub matcher: Regex,
    pub eclass_id: &'static str,
    pub target_label: &'static str,
    pub unit: &'static str,
}

/// Synonyms match as whole words, where any non-letter (underscore, digit,
/// punctuation) separates words.
pub static ECLASS_PATTERNS: LazyLock<Vec<EclassPattern>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|&(synonyms, eclass_id, target_label, unit)| EclassPattern {
            matcher: Regex::new(&format!(r"(?i)(?:^|[^a-z])(?:{})(?:[^a-z]|$)", synonyms))
                .expect("valid regex literal"),
            eclass_id,
            target_label,
            unit,
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub eclass_id: String,
    pub target: String,
    pub unit: String,
}

impl Candidate {
    fn generic() -> Self {
        Candidate {
            eclass_id: GENERIC_ECLASS_ID.to_string(),
            target: GENERIC_TARGET.to_string(),
            unit: UNKNOWN_UNIT.to_string(),
        }
    }
}

impl From<&EclassPattern> for Candidate {
    fn from(p: &EclassPattern) -> Self {
        Candidate {
            eclass_id: p.eclass_id.to_string(),
            target: p.target_label.to_string(),
            unit: p.unit.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackResult {
    pub eclass_id: String,
    pub target: String,
    pub unit: String,
    pub confidence: f64,
    /// True when the heuristic produced this value rather than the upstream.
    pub applied: bool,
}

/// Every matching pattern (deduplicated by code, table order), followed by
/// the generic entry.
pub fn candidates(tag: &str) -> Vec<Candidate> {
    let tag = tag.trim();
    let mut out: Vec<Candidate> = Vec::new();
    for pattern in ECLASS_PATTERNS.iter() {
        if pattern.matcher.is_match(tag) && !out.iter().any(|c| c.eclass_id == pattern.eclass_id) {
            out.push(Candidate::from(pattern));
        }
    }
    if !out.iter().any(|c| c.eclass_id == GENERIC_ECLASS_ID) {
        out.push(Candidate::generic());
    }
    out
}

/// First matching pattern at [`PATTERN_CONFIDENCE`], or the generic code at
/// [`GENERIC_CONFIDENCE`].
pub fn fallback(tag: &str) -> FallbackResult {
    let tag = tag.trim();
    let (candidate, confidence) = ECLASS_PATTERNS
        .iter()
        .find(|p| p.matcher.is_match(tag))
        .map(|p| (Candidate::from(p), PATTERN_CONFIDENCE))
        .unwrap_or_else(|| (Candidate::generic(), GENERIC_CONFIDENCE));

    FallbackResult {
        eclass_id: candidate.eclass_id,
        target: candidate.target,
        unit: candidate.unit,
        confidence,
        applied: true,
    }
}

/// Decide between the upstream answer and the heuristic.
///
/// The heuristic wins when the upstream code is `UNKNOWN` or the generic
/// code, the upstream target is `UNKNOWN`, or the upstream confidence is
/// below [`FALLBACK_THRESHOLD`]. Otherwise the upstream values are kept and
/// only the unit is derived from the target label.
pub fn apply_fallback(
    source: &str,
    upstream_eclass_id: &str,
    upstream_target: &str,
    upstream_confidence: f64,
) -> FallbackResult {
    let uninformative = upstream_eclass_id == UNKNOWN_TARGET
        || upstream_eclass_id == GENERIC_ECLASS_ID
        || upstream_target == UNKNOWN_TARGET;

    if !uninformative && upstream_confidence >= FALLBACK_THRESHOLD {
        return FallbackResult {
            eclass_id: upstream_eclass_id.to_string(),
            target: upstream_target.to_string(),
            unit: infer_unit(upstream_target).to_string(),
            confidence: upstream_confidence,
            applied: false,
        };
    }

    let result = fallback(source);
    tracing::info!(
        source,
        upstream_eclass_id,
        upstream_confidence,
        eclass_id = %result.eclass_id,
        "heuristic ECLASS fallback applied"
    );
    result
}

/// Physical unit implied by a target label, or `unknown`.
pub fn infer_unit(target: &str) -> &'static str {
    let lower = target.to_lowercase();
    UNIT_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, unit)| *unit)
        .unwrap_or(UNKNOWN_UNIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_temperature() {
        let result = fallback("Mtr_Tmp_01");
        assert_eq!(result.eclass_id, "0173-1#02-AAB713#005");
        assert_eq!(result.target, "Temperature");
        assert_eq!(result.unit, "degC");
        assert_eq!(result.confidence, PATTERN_CONFIDENCE);
        assert!(result.applied);
    }

    #[test]
    fn test_priority_temperature_before_sensor() {
        let result = fallback("Sen_Tmp_01");
        assert_eq!(result.target, "Temperature");
        assert_ne!(result.target, "Sensor value");
    }

    #[test]
    fn test_priority_velocity_before_motor() {
        assert_eq!(fallback("Motor_Speed").target, "Velocity (linear)");
        assert_eq!(fallback("Mtr_01").target, "Motor related property");
    }

    #[test]
    fn test_fallback_other_buckets() {
        assert_eq!(fallback("Conveyor_Start").eclass_id, "0173-1#02-BAB014#005");
        assert_eq!(fallback("motor_forward").eclass_id, "0173-1#02-BAB014#005");
        assert_eq!(fallback("Pump_Status").eclass_id, "0173-1#02-BAF321#004");
        assert_eq!(fallback("Tank_Pres_2").unit, "bar");
        assert_eq!(fallback("Sen_07").target, "Sensor value");
    }

    #[test]
    fn test_synonyms_need_word_boundaries() {
        // "tempest" and "presto" contain synonyms but not as whole words.
        assert_eq!(fallback("tempest").eclass_id, GENERIC_ECLASS_ID);
        assert_eq!(fallback("presto").eclass_id, GENERIC_ECLASS_ID);
    }

    #[test]
    fn test_fallback_generic() {
        let result = fallback("DB10.W2");
        assert_eq!(result.eclass_id, GENERIC_ECLASS_ID);
        assert_eq!(result.target, GENERIC_TARGET);
        assert_eq!(result.confidence, GENERIC_CONFIDENCE);
    }

    #[test]
    fn test_candidates_collects_all_and_appends_generic() {
        let list = candidates("Mtr_Tmp_01");
        let ids: Vec<&str> = list.iter().map(|c| c.eclass_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["0173-1#02-AAB713#005", "0173-1#02-BAA123", GENERIC_ECLASS_ID]
        );
    }

    #[test]
    fn test_candidates_dedupes_by_code() {
        // velocity and motor share a code; temperature and sensor share a code
        let list = candidates("Sen_Mtr_Spd_Tmp");
        let ids: Vec<&str> = list.iter().map(|c| c.eclass_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["0173-1#02-AAB713#005", "0173-1#02-BAA123", GENERIC_ECLASS_ID]
        );
        assert_eq!(list[1].target, "Velocity (linear)");
    }

    #[test]
    fn test_candidates_no_match() {
        assert_eq!(candidates("DB10.W2"), vec![Candidate::generic()]);
    }

    #[test]
    fn test_apply_fallback_gating() {
        let applied = apply_fallback("DB10.W2", "UNKNOWN", "UNKNOWN", 0.9);
        assert!(applied.applied);

        let kept = apply_fallback("DB10.W2", "0173-1#02-BAA123", "Velocity", 0.95);
        assert!(!kept.applied);
        assert_eq!(kept.eclass_id, "0173-1#02-BAA123");
        assert_eq!(kept.target, "Velocity");
        assert_eq!(kept.unit, "m/s");
        assert_eq!(kept.confidence, 0.95);
    }

    #[test]
    fn test_apply_fallback_generic_code_and_low_confidence() {
        assert!(apply_fallback("x", GENERIC_ECLASS_ID, "Thing", 0.99).applied);
        assert!(apply_fallback("x", "0173-1#02-AAA699", "Pressure", 0.49).applied);
        assert!(!apply_fallback("x", "0173-1#02-AAA699", "Pressure", 0.5).applied);
    }

    #[test]
    fn test_infer_unit() {
        assert_eq!(infer_unit("Temperature"), "degC");
        assert_eq!(infer_unit("Flow rate"), "m\u{b3}/h");
        assert_eq!(infer_unit("Operating Status"), "boolean");
        assert_eq!(infer_unit("Torque"), UNKNOWN_UNIT);
    }
}
