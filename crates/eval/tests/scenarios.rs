//! End-to-end scenarios through `Engine::process_request`.
//!
//! Each scenario builds an engine from inline policy sources and schemas,
//! submits a request body and checks either the processed document or
//! the failure text.

use praxis_core::Value;
use praxis_eval::{Engine, PolicyRegistry, ProcessError, RuleStatus};
use praxis_schema::Schema;
use serde_json::json;

fn engine(policies_yaml: &str) -> Engine {
    Engine::new(PolicyRegistry::from_yaml_str(policies_yaml).unwrap())
}

fn body(data: serde_json::Value, policies: &[&str]) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "req-7",
        "timestamp": "2024-05-01T12:00:00Z",
        "data": data,
        "policies": policies,
    }))
    .unwrap()
}

fn processed(engine: &Engine, data: serde_json::Value, policies: &[&str]) -> serde_json::Value {
    let response = engine
        .process_request(&body(data, policies))
        .unwrap_or_else(|e| panic!("request failed:\n{}", e));
    serde_json::to_value(&response.processed_data).unwrap()
}

fn failure(engine: &Engine, data: serde_json::Value, policies: &[&str]) -> ProcessError {
    match engine.process_request(&body(data, policies)) {
        Ok(r) => panic!("expected failure, got {:?}", r),
        Err(e) => e,
    }
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[test]
fn age_gate_passes_and_fails() {
    let e = engine("maioridade:\n  - \"$.idade >= 18\"\n");
    assert_eq!(processed(&e, json!({"idade": 18}), &["maioridade"]), json!({"idade": 18}));

    let err = failure(&e, json!({"idade": 17}), &["maioridade"]);
    let text = err.to_string();
    assert!(text.starts_with("Policy execution failed:\n  Policy 'maioridade': FAILED."));
    assert!(text.contains("Status: CONDITION_FAILED"));
}

#[test]
fn set_adds_discount() {
    let e = engine("desconto:\n  - SET $.desconto = 15.0\n");
    assert_eq!(
        processed(&e, json!({"valor": 100}), &["desconto"]),
        json!({"valor": 100, "desconto": 15})
    );
}

#[test]
fn if_then_applies_only_when_condition_holds() {
    let e = engine("revisao:\n  - \"IF $.valor > 1000 THEN SET $.revisao = true\"\n");
    assert_eq!(
        processed(&e, json!({"valor": 5000}), &["revisao"]),
        json!({"valor": 5000, "revisao": true})
    );
    assert_eq!(
        processed(&e, json!({"valor": 10}), &["revisao"]),
        json!({"valor": 10})
    );
}

#[test]
fn or_accepts_either_currency() {
    let e = engine("moeda:\n  - \"$.moeda == 'BRL' OR $.moeda == 'EUR'\"\n");
    assert_eq!(
        processed(&e, json!({"moeda": "EUR"}), &["moeda"]),
        json!({"moeda": "EUR"})
    );
    let err = failure(&e, json!({"moeda": "JPY"}), &["moeda"]);
    assert!(matches!(err, ProcessError::PolicyFailure(_)));
}

#[test]
fn request_schema_rejects_type_mismatch() {
    let schema = Schema::from_value(Value::from(json!({
        "type": "object",
        "required": ["id"],
        "properties": {"id": {"type": "string"}}
    })))
    .unwrap();
    let e = engine("nada: []\n").with_request_schema(schema);

    let err = failure(&e, json!({"id": 42}), &["nada"]);
    match &err {
        ProcessError::RequestValidation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "id");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        err.to_string(),
        "request data schema validation failed: id: expected string, found number"
    );

    let err = failure(&e, json!({}), &["nada"]);
    assert_eq!(
        err.to_string(),
        "request data schema validation failed: required property 'id' is missing"
    );
}

// ──────────────────────────────────────────────
// Execution properties
// ──────────────────────────────────────────────

#[test]
fn policy_short_circuits_after_failed_condition() {
    let e = engine("p:\n  - \"$.a > 10\"\n  - SET $.b = 1\n");
    let mut doc = Value::from(json!({"a": 5}));
    let (results, all) = e.execute_policies(&mut doc, &["p".to_string()]);
    assert!(!all);
    assert_eq!(results[0].rule_results.len(), 1);
    assert_eq!(doc, Value::from(json!({"a": 5})));
}

#[test]
fn rule_error_halts_only_its_policy() {
    let e = engine(
        "quebrada:\n  - \"EXP($.valor / 0) > 1\"\n  - SET $.nunca = true\nseguinte:\n  - SET $.depois = true\n",
    );
    let mut doc = Value::from(json!({"valor": 10}));
    let names = vec!["quebrada".to_string(), "seguinte".to_string()];
    let (results, all) = e.execute_policies(&mut doc, &names);
    assert!(!all);
    assert_eq!(results[0].rule_results.len(), 1);
    assert_eq!(results[0].rule_results[0].status, RuleStatus::ExecutionError);
    assert!(results[0].rule_results[0]
        .details
        .contains("(Error: division by zero in '$.valor / 0')"));
    assert!(results[1].passed);
    assert_eq!(doc.get("depois"), Some(&Value::Bool(true)));
    assert_eq!(doc.get("nunca"), None);
}

#[test]
fn unknown_policy_is_reported_and_others_still_run() {
    let e = engine("marca:\n  - SET $.marcado = true\n");
    let err = failure(&e, json!({}), &["inexistente", "marca"]);
    let text = err.to_string();
    assert!(text.contains("  Policy 'inexistente': FAILED. Error: policy 'inexistente' is not defined."));
    assert!(text.contains("  Policy 'marca': PASSED."));
    match err {
        ProcessError::PolicyFailure(report) => {
            assert_eq!(report.results.len(), 2);
            assert_eq!(report.failed().count(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn quoted_or_is_not_a_split() {
    let e = engine("texto:\n  - \"$.frase == 'chuva OR sol'\"\n");
    assert!(e
        .process_request(&body(json!({"frase": "chuva OR sol"}), &["texto"]))
        .is_ok());
}

#[test]
fn string_and_number_never_compare_equal() {
    let e = engine("eq:\n  - \"$.n == '1'\"\n");
    assert!(e.process_request(&body(json!({"n": 1}), &["eq"])).is_err());
    let e = engine("eq:\n  - \"$.n == 1.0\"\n");
    assert!(e.process_request(&body(json!({"n": 1}), &["eq"])).is_ok());
}

#[test]
fn response_schema_gates_processed_data() {
    let schema = Schema::from_json_str(r#"{"type":"object","required":["desconto"]}"#).unwrap();
    let e = engine("nada: []\ndesconto:\n  - SET $.desconto = 15\n").with_response_schema(schema);

    let err = failure(&e, json!({"valor": 1}), &["nada"]);
    assert!(matches!(err, ProcessError::ResponseValidation(_)));
    assert_eq!(
        err.to_string(),
        "response data schema validation failed: required property 'desconto' is missing"
    );
    assert_eq!(
        processed(&e, json!({"valor": 1}), &["desconto"]),
        json!({"valor": 1, "desconto": 15})
    );
}

#[test]
fn policies_mutate_one_document_in_order() {
    let e = engine(
        "base:\n  - SET $.total = SUM($.itens)\nfaixa:\n  - \"IF $.total >= 100 THEN SET $.faixa = 'alta'\"\n  - \"$.faixa == 'alta'\"\n",
    );
    assert_eq!(
        processed(&e, json!({"itens": [40, 60]}), &["base", "faixa"]),
        json!({"itens": [40, 60], "total": 100, "faixa": "alta"})
    );
}
