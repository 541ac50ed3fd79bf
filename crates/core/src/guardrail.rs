//! Domain guardrail: decides whether an input belongs to the industrial /
//! sensor domain before any generation call is made.
//!
//! The check is a pure function over a resolved [`GuardrailInput`]. Rules run
//! in a fixed order: empty check, security screen, positive domain match,
//! unrelated-topic denylist, and finally a raw-tag shape heuristic.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Inputs of this many characters or more are rejected outright.
pub const MAX_INPUT_CHARS: usize = 2000;

/// Inputs longer than this never qualify for the raw-tag heuristic.
const MAX_TAG_CHARS: usize = 80;

// ──────────────────────────────────────────────
// Pattern tables
// ──────────────────────────────────────────────

const BLOCKED_SOURCES: &[&str] = &[
    // Embedded markup and inline event handlers
    r"(?i)<script|javascript:|\bon[a-z]+\s*=",
    // SQL-like statements
    r"(?i)\b(select|insert|update|delete|drop|exec|execute)\s+.*\b(from|into|table)\b",
    // Script evaluation calls
    r"(?i)\b(prompt|eval|document\.write)\s*\(",
    // Raw control characters (tab, LF and CR are allowed)
    r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]",
];

const INDUSTRIAL_SOURCES: &[&str] = &[
    // PLC data-block and memory addresses: DB10.W2, DB1.DBX0.1, %IW64, MW20
    r"(?i)\bDB\d+\.(DB)?[WDBX]\d*",
    r"(?i)(^|[^A-Za-z0-9_])%[IQM][A-Z]?\d",
    r"(?i)\bM[WDB]\d+\b",
    // Vendors and fieldbus protocols
    r"(?i)\b(s7|siemens|allen.?bradley|rockwell|plc|scada|hmi|opc.?ua|modbus|profinet|ethercat)\b",
    // Physical quantities
    r"(?i)\b(sensor|temperature|temperatura|temperatur|pressure|pressao|flow|vazao|velocity|velocidade|rpm|humidity|umidade)\b",
    r"(?i)\b(telemetry|telemetria|iot|mqtt|opcua|rest.?api)\b",
    // Assets and equipment
    r"(?i)\b(motor|actuator|actuador|conveyor|esteira|pump|bomba|valve|valvula)\b",
    // Tag abbreviations, delimited by anything that is not a letter
    r"(?i)(^|[^a-z])(temp|tmp|spd|vel|pres|rpm|status|control|cmd|mtr|sen)([^a-z]|$)",
    // Path-like endpoints
    r"^/[A-Za-z0-9_\-/]+$",
    r"(?i)\b(api|endpoint|topic|graphql|webhook)\b",
    // Classification and asset-shell vocabulary
    r"(?i)\b(eclass|ecds|irdi|aas|asset.?administration.?shell)\b",
    r"\b0173-\d+#\d+-[A-Za-z0-9_]+",
    // Generic identifier shape
    r"^[A-Za-z0-9_.\-/]+$",
];

/// Topic words that are clearly unrelated to the industrial domain.
const UNRELATED_WORDS: &[&str] = &[
    // sports
    "football", "soccer", "futebol", "futebolista", "gol", "bola", "campo", "time", "jogo",
    "partida", "torcida", "campeonato", "copa", "liga", "esporte", "esportivo", "team",
    "league", "championship", "tournament", "match", "goal",
    // food
    "receita", "culinaria", "comida", "restaurante", "recipe", "cooking", "food",
    "restaurant", "pizza", "dinner",
    // entertainment
    "filme", "musica", "cinema", "entretenimento", "movie", "film", "music", "song",
    "celebrity", "entertainment", "viagem", "turismo", "travel", "tourism",
    // politics
    "politica", "eleicao", "noticia", "politics", "election", "president", "news",
];

static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(BLOCKED_SOURCES));
static INDUSTRIAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(INDUSTRIAL_SOURCES));

static TAG_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-/:#%]+$").expect("valid regex literal"));
static TAG_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(db|mw|md|%|api/)").expect("valid regex literal"));

fn compile(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|s| Regex::new(s).expect("valid regex literal"))
        .collect()
}

// ──────────────────────────────────────────────
// Input and verdict
// ──────────────────────────────────────────────

/// The text to classify, resolved explicitly by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardrailInput {
    /// A bare string.
    Text(String),
    /// A request object carrying an `inputData` field.
    InputData(Option<String>),
    /// A request object carrying a `text` field.
    FieldText(Option<String>),
    /// Any other value; it is analyzed in its serialized JSON form.
    Other(serde_json::Value),
}

impl GuardrailInput {
    /// Resolve a JSON request body into an input variant: strings become
    /// `Text`, objects with `inputData` (checked first) or `text` become the
    /// fielded variants, everything else is `Other`.
    pub fn from_json(value: serde_json::Value) -> Self {
        fn field(v: &serde_json::Value) -> Option<String> {
            match v {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }
        }

        if let serde_json::Value::Object(map) = &value {
            if let Some(v) = map.get("inputData") {
                return GuardrailInput::InputData(field(v));
            }
            if let Some(v) = map.get("text") {
                return GuardrailInput::FieldText(field(v));
            }
        }

        match value {
            serde_json::Value::String(s) => GuardrailInput::Text(s),
            other => GuardrailInput::Other(other),
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            GuardrailInput::Text(s) => Some(s.trim().to_string()),
            GuardrailInput::InputData(v) | GuardrailInput::FieldText(v) => {
                Some(v.as_deref().unwrap_or("").trim().to_string())
            }
            GuardrailInput::Other(serde_json::Value::Null) => None,
            GuardrailInput::Other(v) => Some(v.to_string()),
        }
    }
}

impl From<&str> for GuardrailInput {
    fn from(s: &str) -> Self {
        GuardrailInput::Text(s.to_string())
    }
}

impl From<String> for GuardrailInput {
    fn from(s: String) -> Self {
        GuardrailInput::Text(s)
    }
}

/// Why an input was rejected. Serializes as its machine-readable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Empty,
    NotPermitted,
    OutOfScope,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::Empty => "empty",
            RejectReason::NotPermitted => "not_permitted",
            RejectReason::OutOfScope => "out_of_scope",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Empty => write!(f, "empty"),
            RejectReason::NotPermitted => write!(f, "not permitted"),
            RejectReason::OutOfScope => write!(f, "out of industrial scope"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardrailVerdict {
    pub valid: bool,
    pub reason: Option<RejectReason>,
}

impl GuardrailVerdict {
    fn accept() -> Self {
        GuardrailVerdict {
            valid: true,
            reason: None,
        }
    }

    fn reject(reason: RejectReason) -> Self {
        GuardrailVerdict {
            valid: false,
            reason: Some(reason),
        }
    }
}

// ──────────────────────────────────────────────
// Classification
// ──────────────────────────────────────────────

/// Classify an input as industrial-domain or not.
pub fn classify(input: &GuardrailInput) -> GuardrailVerdict {
    let text = match input.text() {
        Some(t) if !t.is_empty() => t,
        _ => return GuardrailVerdict::reject(RejectReason::Empty),
    };

    if is_blocked(&text) {
        return GuardrailVerdict::reject(RejectReason::NotPermitted);
    }

    if INDUSTRIAL_PATTERNS.iter().any(|p| p.is_match(&text)) {
        return GuardrailVerdict::accept();
    }

    if mentions_unrelated_topic(&text) {
        return GuardrailVerdict::reject(RejectReason::OutOfScope);
    }

    if looks_like_tag(&text) {
        return GuardrailVerdict::accept();
    }

    GuardrailVerdict::reject(RejectReason::OutOfScope)
}

/// Convenience wrapper for a bare string.
pub fn classify_text(text: &str) -> GuardrailVerdict {
    classify(&GuardrailInput::from(text))
}

fn is_blocked(text: &str) -> bool {
    text.chars().count() >= MAX_INPUT_CHARS || BLOCKED_PATTERNS.iter().any(|p| p.is_match(text))
}

fn mentions_unrelated_topic(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|w| UNRELATED_WORDS.contains(&w))
}

fn looks_like_tag(text: &str) -> bool {
    if text.chars().count() > MAX_TAG_CHARS || !TAG_CHARSET.is_match(text) {
        return false;
    }
    text.chars()
        .any(|c| c.is_ascii_digit() || c.is_ascii_uppercase() || c == '_' || c == '.')
        || TAG_PREFIX.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(text: &str) -> Option<RejectReason> {
        classify_text(text).reason
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(reason(""), Some(RejectReason::Empty));
        assert_eq!(reason("   \n\t"), Some(RejectReason::Empty));
        assert_eq!(
            classify(&GuardrailInput::InputData(None)).reason,
            Some(RejectReason::Empty)
        );
        assert_eq!(
            classify(&GuardrailInput::Other(serde_json::Value::Null)).reason,
            Some(RejectReason::Empty)
        );
    }

    #[test]
    fn test_plc_tags_accepted() {
        for tag in ["DB10.W2", "DB1.DBX0.1", "%IW64", "MW20", "Mtr_Tmp_01", "/temp/v1"] {
            let verdict = classify_text(tag);
            assert!(verdict.valid, "expected {} to be accepted", tag);
            assert_eq!(verdict.reason, None);
        }
    }

    #[test]
    fn test_domain_vocabulary_accepted() {
        assert!(classify_text("temperature of the boiler feed").valid);
        assert!(classify_text("Siemens S7 conveyor speed").valid);
        assert!(classify_text("map this to ECLASS 0173-1#02-BAA123").valid);
    }

    #[test]
    fn test_script_rejected_even_with_keywords() {
        assert_eq!(
            reason("<script>alert(1)</script> DB10.W2 sensor"),
            Some(RejectReason::NotPermitted)
        );
        assert_eq!(
            reason("javascript:void(0) motor"),
            Some(RejectReason::NotPermitted)
        );
        assert_eq!(
            reason("<img onerror=alert(1)> pump"),
            Some(RejectReason::NotPermitted)
        );
    }

    #[test]
    fn test_sql_and_eval_rejected() {
        assert_eq!(
            reason("select * from sensors where 1=1"),
            Some(RejectReason::NotPermitted)
        );
        assert_eq!(reason("eval(payload) pump"), Some(RejectReason::NotPermitted));
        assert_eq!(reason("DB10.W2\u{7}"), Some(RejectReason::NotPermitted));
    }

    #[test]
    fn test_oversized_input_rejected() {
        let long = "a".repeat(MAX_INPUT_CHARS);
        assert_eq!(reason(&long), Some(RejectReason::NotPermitted));
        let just_under = "a".repeat(MAX_INPUT_CHARS - 1);
        assert_eq!(reason(&just_under), None);
    }

    #[test]
    fn test_unrelated_topics_rejected() {
        assert_eq!(
            reason("who won the football championship"),
            Some(RejectReason::OutOfScope)
        );
        assert_eq!(
            reason("receita de bolo de chocolate"),
            Some(RejectReason::OutOfScope)
        );
        assert_eq!(reason("the weather is nice today"), Some(RejectReason::OutOfScope));
    }

    #[test]
    fn test_raw_tag_heuristic() {
        // Contains ':' and '#', so only the tag-shape heuristic can accept it.
        assert!(classify_text("ZONE3:XQ#2").valid);
        assert!(!classify_text("hello there friend").valid);
    }

    #[test]
    fn test_from_json_resolution() {
        let input = GuardrailInput::from_json(serde_json::json!({"inputData": " DB10.W2 "}));
        assert_eq!(input, GuardrailInput::InputData(Some(" DB10.W2 ".into())));
        assert!(classify(&input).valid);

        let input = GuardrailInput::from_json(serde_json::json!({"text": "pump pressure"}));
        assert_eq!(input, GuardrailInput::FieldText(Some("pump pressure".into())));

        let input = GuardrailInput::from_json(serde_json::json!("MW20"));
        assert_eq!(input, GuardrailInput::Text("MW20".into()));

        let input = GuardrailInput::from_json(serde_json::json!({"other": 1}));
        assert!(matches!(input, GuardrailInput::Other(_)));
    }

    #[test]
    fn test_reason_display_and_code() {
        assert_eq!(RejectReason::OutOfScope.to_string(), "out of industrial scope");
        assert_eq!(RejectReason::NotPermitted.code(), "not_permitted");
        let json = serde_json::to_value(classify_text("")).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["reason"], "empty");
    }
}
