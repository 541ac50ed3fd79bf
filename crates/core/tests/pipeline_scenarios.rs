//! End-to-end pipeline scenarios using in-memory generators.
//!
//! Each test drives `Pipeline::run` from raw input to final result, so the
//! guardrail, parser and resolver are exercised together.

use async_trait::async_trait;
use toonmap_core::{
    apply_fallback, classify_text, fallback, parse, GenerationError, GenerationRequest, Generator,
    InputType, MockGenerator, Pipeline, PipelineError, PipelineState, RejectReason, Status,
    GENERIC_ECLASS_ID,
};

/// Generator replying with fixed text regardless of input.
struct Scripted(String);

#[async_trait]
impl Generator for Scripted {
    async fn generate(&self, _: &GenerationRequest) -> Result<String, GenerationError> {
        Ok(self.0.clone())
    }
}

fn brownfield(input: &str) -> GenerationRequest {
    GenerationRequest::new(input, InputType::Brownfield)
}

// ──────────────────────────────────────────────
// 1. Full runs
// ──────────────────────────────────────────────

#[tokio::test]
async fn known_siemens_tag_resolves_with_success() {
    let generator = Scripted(
        "⟨MAP_START⟩⟨SRC:DB10.W2⟩⟨TGT:ECLASS:0173-1#02-BAA123⟩⟨CONF:0.92⟩⟨MAP_END⟩".to_string(),
    );
    let result = Pipeline::new(generator)
        .run(&brownfield("DB10.W2"))
        .await
        .unwrap();

    assert_eq!(result.mapping.source, "DB10.W2");
    assert_eq!(result.mapping.eclass_id, "0173-1#02-BAA123");
    assert_eq!(result.confidence, 0.92);
    assert!(!result.fallback_applied);
    assert_eq!(result.status, Status::Success);
}

#[tokio::test]
async fn unknown_target_falls_back_to_temperature() {
    let generator = Scripted(
        "⟨MAP_START⟩⟨SRC:Mtr_Tmp_01⟩⟨TGT:UNKNOWN⟩⟨CONF:0.3⟩⟨MAP_END⟩".to_string(),
    );
    let result = Pipeline::new(generator)
        .run(&brownfield("Mtr_Tmp_01"))
        .await
        .unwrap();

    assert!(result.fallback_applied);
    assert_eq!(result.mapping.eclass_id, "0173-1#02-AAB713#005");
    assert_eq!(result.mapping.target, "Temperature");
    assert_eq!(result.unit, "degC");
    assert!(result.confidence < 0.85);
    assert_eq!(result.status, Status::Warning);

    let candidates = result.candidates.expect("low confidence attaches candidates");
    assert_eq!(candidates[0].eclass_id, "0173-1#02-AAB713#005");
    assert_eq!(candidates.last().map(|c| c.eclass_id.as_str()), Some(GENERIC_ECLASS_ID));
}

#[tokio::test]
async fn brace_form_answer_is_accepted() {
    let generator = Scripted(
        "```\nMAP{SRC='/temp/v1'|TGT='ECLASS:0173-1#02-AAB713#005'|ACTION='Convert_Unit(F_to_C)'}\n```"
            .to_string(),
    );
    let request = GenerationRequest::new("/temp/v1", InputType::Greenfield);
    let result = Pipeline::new(generator).run(&request).await.unwrap();

    assert_eq!(result.input_type, InputType::Greenfield);
    assert_eq!(result.mapping.action.as_deref(), Some("Convert_Unit(F_to_C)"));
    assert_eq!(result.actions, vec!["Convert_Unit(F_to_C)"]);
    // Brace answers carry no confidence, so the default keeps the upstream
    // code but flags the run for review.
    assert_eq!(result.confidence, 0.5);
    assert!(!result.fallback_applied);
    assert_eq!(result.status, Status::Warning);
}

#[tokio::test]
async fn grammar_errors_travel_with_recovered_mapping() {
    let generator = Scripted(
        "MAP{SRC='DB10.W2'|TGT='ECLASS:0173-1#02-BAA123'|ACTION='Teleport'}".to_string(),
    );
    let result = Pipeline::new(generator)
        .run(&brownfield("DB10.W2"))
        .await
        .unwrap();

    assert_eq!(result.mapping.eclass_id, "0173-1#02-BAA123");
    assert_eq!(result.mapping.action, None);
    assert!(!result.parse_valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code(), "unknown_action");
    assert!(result.steps.iter().any(|s| s.action == "diagnostics" && s.detail == "unknown_action"));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["parseValid"], false);
    assert_eq!(json["errors"][0]["code"], "unknown_action");
}

#[tokio::test]
async fn only_first_mapping_is_used() {
    let generator = Scripted(
        "⟨MAP_START⟩⟨SRC:DB1.DBX0.1⟩⟨TGT:ECLASS:0173-1#02-BAF321#004⟩⟨CONF:0.95⟩⟨MAP_END⟩\
         ⟨MAP_START⟩⟨SRC:DB1.DBX0.2⟩⟨TGT:ECLASS:0173-1#02-BAA123⟩⟨CONF:0.99⟩⟨MAP_END⟩"
            .to_string(),
    );
    let result = Pipeline::new(generator)
        .run(&brownfield("DB1.DBX0.1"))
        .await
        .unwrap();
    assert_eq!(result.mapping.source, "DB1.DBX0.1");
    assert_eq!(result.mapping.eclass_id, "0173-1#02-BAF321#004");
}

#[tokio::test]
async fn mock_generator_drives_every_known_tag() {
    let pipeline = Pipeline::new(MockGenerator);
    for (tag, eclass_id) in [
        ("DB10.W2", "0173-1#02-BAA123"),
        ("DB1.DBX0.1", "0173-1#02-BAF321#004"),
        ("/temp/v1", "0173-1#02-AAB713#005"),
        ("Mtr_Tmp_01", "0173-1#02-AAB713#005"),
    ] {
        let result = pipeline.run(&brownfield(tag)).await.unwrap();
        assert_eq!(result.mapping.eclass_id, eclass_id, "{tag}");
        assert_eq!(result.status, Status::Success, "{tag}");
        assert_eq!(result.actions, vec!["GENERATE_NODE_RED"]);
    }
}

// ──────────────────────────────────────────────
// 2. Terminal failures
// ──────────────────────────────────────────────

#[tokio::test]
async fn script_injection_is_rejected_before_generation() {
    let err = Pipeline::new(MockGenerator)
        .run(&brownfield("DB10.W2 <script>alert('x')</script>"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "guardrail_rejected");
    assert_eq!(err.state(), PipelineState::Rejected);
}

#[tokio::test]
async fn empty_input_is_rejected() {
    let err = Pipeline::new(MockGenerator)
        .run(&brownfield("   "))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::Rejected {
            reason: RejectReason::Empty
        }
    );
}

#[tokio::test]
async fn malformed_answer_reports_no_mapping() {
    let generator = Scripted("MAP{SRC='x'|TGT='y'}".to_string());
    let err = Pipeline::new(generator)
        .run(&brownfield("DB10.W2"))
        .await
        .unwrap_err();
    assert_eq!(err.state(), PipelineState::ParseFailed);
    match err {
        PipelineError::NoMapping { raw, errors } => {
            assert_eq!(raw, "MAP{SRC='x'|TGT='y'}");
            assert_eq!(errors[0].to_string(), "expected 3 fields, found 2");
        }
        other => panic!("expected NoMapping, got {other:?}"),
    }
}

// ──────────────────────────────────────────────
// 3. Cross-component properties
// ──────────────────────────────────────────────

#[test]
fn script_tag_is_rejected_even_with_industrial_keywords() {
    let verdict = classify_text("Siemens S7 PLC temperature <script>");
    assert!(!verdict.valid);
    assert_eq!(verdict.reason, Some(RejectReason::NotPermitted));
}

#[test]
fn fallback_prefers_temperature_over_sensor() {
    assert_eq!(fallback("Sen_Tmp_01").eclass_id, "0173-1#02-AAB713#005");
    assert_eq!(fallback("Sen_Tmp_01").target, "Temperature");
}

#[test]
fn fallback_gating_examples() {
    assert!(apply_fallback("DB10.W2", "UNKNOWN", "UNKNOWN", 0.9).applied);
    assert!(!apply_fallback("DB10.W2", "0173-1#02-BAA123", "Velocity", 0.95).applied);
}

#[test]
fn brace_round_trip() {
    for (src, tgt) in [("DB10.W2", "ECLASS:0173-1#02-BAA123"), ("x", "y"), ("a.b/c", "UNKNOWN")] {
        let out = parse(&format!("MAP{{SRC='{src}'|TGT='{tgt}'|ACTION='DirectMap'}}"));
        assert!(out.valid);
        assert_eq!(out.mappings.len(), 1);
        assert_eq!(out.mappings[0].source, src);
        assert_eq!(out.mappings[0].target, tgt);
    }
}
