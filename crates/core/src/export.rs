//! Downstream document builders for a resolved mapping.
//!
//! Both builders copy fields out of a [`PipelineResult`]; the only logic is
//! identifier sanitization.

use serde_json::{json, Value};

use crate::eclass::UNKNOWN_UNIT;
use crate::generator::InputType;
use crate::parser::brace::base_action;
use crate::pipeline::PipelineResult;

/// Semantic id of the ECLASS "technical data" submodel template.
const TECHNICAL_DATA_SEMANTIC_ID: &str = "0173-1#01-AFZ615#016";
const AAS_REGISTRY_URL: &str = "http://aas-registry:8080/api/v1/submodels/TechnicalData/elements";
const NODE_ID_PREFIX_CHARS: usize = 20;
const CONVERT_UNIT: &str = "Convert_Unit";

/// Replace every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_identifier(source: &str) -> String {
    source
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `DB10.W2` → `DB10W2`, `/temp/v1` → `TempV1`.
pub fn id_short(source: &str) -> String {
    source
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn value_type(unit: &str) -> &'static str {
    if unit == "boolean" {
        "xs:boolean"
    } else {
        "xs:double"
    }
}

/// Asset administration shell with one `TechnicalData` submodel holding the
/// mapped property, plus its ECLASS concept description.
pub fn aas_document(result: &PipelineResult) -> Value {
    let mapping = &result.mapping;
    let id = sanitize_identifier(&mapping.source);
    let unit = if result.unit.is_empty() {
        UNKNOWN_UNIT
    } else {
        result.unit.as_str()
    };

    json!({
        "assetAdministrationShells": [{
            "idShort": "GeneratedAAS",
            "id": format!("urn:aas:{id}"),
            "assetInformation": {
                "assetKind": "Instance",
                "globalAssetId": format!("urn:asset:{id}"),
            },
            "submodels": [{ "keys": [{ "type": "Submodel", "value": "TechnicalData" }] }],
        }],
        "submodels": [{
            "idShort": "TechnicalData",
            "id": format!("urn:submodel:technical:{id}"),
            "semanticId": { "keys": [{ "type": "GlobalReference", "value": TECHNICAL_DATA_SEMANTIC_ID }] },
            "submodelElements": [{
                "modelType": "Property",
                "idShort": id_short(&mapping.source),
                "semanticId": mapping.eclass_id,
                "valueType": value_type(unit),
                "value": "dynamic",
                "qualifiers": [{ "type": "Unit", "value": unit }],
            }],
        }],
        "conceptDescriptions": [{
            "idShort": mapping.target,
            "id": format!("urn:eclass:{}", mapping.eclass_id),
            "embeddedDataSpecifications": [{
                "dataSpecification": {
                    "keys": [{ "type": "GlobalReference", "value": "DataSpecificationIEC61360" }],
                },
                "dataSpecificationContent": {
                    "preferredName": [{ "language": "en", "text": mapping.target }],
                    "unit": unit,
                    "sourceOfDefinition": "ECLASS",
                },
            }],
        }],
    })
}

fn node_id(source: &str, suffix: &str) -> String {
    let base: String = sanitize_identifier(source)
        .chars()
        .take(NODE_ID_PREFIX_CHARS)
        .collect();
    format!("{base}_{suffix}")
}

/// True when the mapping or any loose action asks for unit conversion.
fn converts_unit(result: &PipelineResult) -> bool {
    result
        .mapping
        .action
        .iter()
        .chain(&result.actions)
        .any(|a| base_action(a) == CONVERT_UNIT)
}

/// Importable Node-RED flow: reader → transform → AAS publish → debug.
pub fn node_red_flow(result: &PipelineResult) -> Value {
    let mapping = &result.mapping;
    let tag = mapping.source.as_str();
    let tab = node_id(tag, "tab");
    let reader = node_id(tag, "inject");
    let transform = node_id(tag, "transform");
    let publish = node_id(tag, "aas");
    let debug = node_id(tag, "debug");

    let mut reader_node = json!({
        "id": reader,
        "name": format!("Read {tag}"),
        "tab": tab,
        "x": 150,
        "y": 100,
        "wires": [[transform]],
    });
    let extra = match result.input_type {
        InputType::Brownfield => json!({
            "type": "s7 in",
            "variable": result.input_data,
            "interval": "1000",
        }),
        InputType::Greenfield => json!({
            "type": "http request",
            "url": format!("http://cps-device{}", result.input_data),
            "method": "GET",
        }),
    };
    if let (Some(node), Value::Object(fields)) = (reader_node.as_object_mut(), extra) {
        node.extend(fields);
    }

    let func = if converts_unit(result) {
        format!(
            "// F_to_C: (value - 32) * 5/9\nmsg.payload = (msg.payload - 32) * 5/9;\nmsg.semanticId = \"{}\";\nmsg.unit = \"{}\";\nreturn msg;",
            mapping.eclass_id, result.unit
        )
    } else {
        format!(
            "// {} -> {}\nmsg.semanticId = \"{}\";\nmsg.unit = \"{}\";\nreturn msg;",
            mapping.source, mapping.target, mapping.eclass_id, result.unit
        )
    };

    json!([
        { "id": tab, "type": "tab", "label": format!("TOON - {tag}"), "x": 10, "y": 10 },
        reader_node,
        {
            "id": transform,
            "type": "function",
            "name": "TOON Transform",
            "tab": tab,
            "x": 380,
            "y": 100,
            "func": func,
            "wires": [[publish]],
        },
        {
            "id": publish,
            "type": "http request",
            "name": "Publish AAS",
            "tab": tab,
            "x": 610,
            "y": 100,
            "url": AAS_REGISTRY_URL,
            "method": "PUT",
            "wires": [[debug]],
        },
        { "id": debug, "type": "debug", "name": "Log", "tab": tab, "x": 840, "y": 100 },
    ])
}
