use super::*;
use crate::constants::{LOOKUP_MAX_RESULTS, NO_EVENTS_FOUND};
use crate::query::QueryError;
use serde_json::json;
use std::path::Path;

fn sample_registry() -> ActionRegistry {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let datasets = Datasets::load(&dir).unwrap();
    ActionRegistry::with_builtins(Arc::new(datasets)).unwrap()
}

async fn run(registry: &ActionRegistry, name: &str, args: Value) -> String {
    let action = registry.get(name).unwrap();
    run_action(action.as_ref(), &args.to_string()).await.value
}

#[tokio::test]
async fn test_registry_with_builtins() {
    let registry = sample_registry();
    assert_eq!(registry.len(), 2);
    assert!(!registry.is_empty());
    let specs = registry.specs();
    assert_eq!(specs[0].name, "query_dazn_event_schedule");
    assert_eq!(specs[1].name, "get_boxing_champs_or_bouts_or_reigns");
    assert_eq!(
        specs[1].parameters["properties"]["collection_to_query"]["enum"],
        json!(["champions", "bouts", "reigns"])
    );
    assert!(registry.get("query_lg_dishwasher_products").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let datasets = Arc::new(Datasets::default());
    let mut registry = ActionRegistry::new();
    registry
        .register(Box::new(ScheduleAction::new(Arc::clone(&datasets))))
        .unwrap();
    let err = registry
        .register(Box::new(ScheduleAction::new(datasets)))
        .unwrap_err();
    assert!(err.to_string().contains("already registered"));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_spec_serializes_as_function_entry() {
    let registry = sample_registry();
    let spec = serde_json::to_value(&registry.specs()[0]).unwrap();
    assert_eq!(spec["name"], "query_dazn_event_schedule");
    assert_eq!(spec["parameters"]["required"], json!(["pandas_dataframe_query"]));
    assert!(spec["description"].as_str().unwrap().contains("DAZN"));
}

#[tokio::test]
async fn test_schedule_filter_by_sport() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "query_dazn_event_schedule",
        json!({"pandas_dataframe_query": "Sport == 'Boxing'"}),
    )
    .await;
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].trim_start().starts_with("Title"));
    assert!(lines[1].contains("KSI vs. Fury: Open Workout"));
    assert!(lines[4].contains("Canelo vs. Charlo: Replay"));
    assert!(!out.contains("PFL 10"));
}

#[tokio::test]
async fn test_schedule_truncates_to_five_in_dataset_order() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "query_dazn_event_schedule",
        json!({"pandas_dataframe_query": "Start > '2000-01-01'"}),
    )
    .await;
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1 + LOOKUP_MAX_RESULTS);
    assert!(lines[1].contains("KSI vs. Fury: Open Workout"));
    assert!(lines[5].contains("Juventus Women vs. Roma Women"));
}

#[tokio::test]
async fn test_schedule_no_matches_sentinel() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "query_dazn_event_schedule",
        json!({"pandas_dataframe_query": "Sport == 'Curling'"}),
    )
    .await;
    assert_eq!(out, NO_EVENTS_FOUND);
    assert_eq!(out, "Query result: No events found with that criteria");
}

#[tokio::test]
async fn test_schedule_current_date_is_bound() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "query_dazn_event_schedule",
        json!({"pandas_dataframe_query": "Start >= @current_date and Start < '1990'"}),
    )
    .await;
    assert_eq!(out, NO_EVENTS_FOUND);
}

#[tokio::test]
async fn test_schedule_error_becomes_result_text() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "query_dazn_event_schedule",
        json!({"pandas_dataframe_query": "Venue == 'Wembley'"}),
    )
    .await;
    assert_eq!(out, QueryError::Undefined("Venue".into()).to_string());
    assert_eq!(out, "name 'Venue' is not defined");
}

#[tokio::test]
async fn test_schedule_deeply_nested_filter_is_result_text() {
    let registry = sample_registry();
    let query = format!("{}Sport == 'Boxing'{}", "(".repeat(20_000), ")".repeat(20_000));
    let out = run(
        &registry,
        "query_dazn_event_schedule",
        json!({ "pandas_dataframe_query": query }),
    )
    .await;
    assert!(out.ends_with("expression nested too deeply"));
}

#[tokio::test]
async fn test_schedule_one_element_tuple() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "query_dazn_event_schedule",
        json!({"pandas_dataframe_query": "Sport.isin(('Boxing',))"}),
    )
    .await;
    assert_eq!(out.lines().count(), 5);
}

#[tokio::test]
async fn test_malformed_arguments_become_result_text() {
    let registry = sample_registry();
    let action = registry.get("query_dazn_event_schedule").unwrap();
    let out = run_action(action.as_ref(), "{\"pandas_dataframe_query\": ").await;
    assert!(out.value.contains("EOF"));

    let out = run(&registry, "query_dazn_event_schedule", json!({})).await;
    assert!(out.contains("missing field `pandas_dataframe_query`"));
}

#[tokio::test]
async fn test_records_list_truncated_to_five() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "get_boxing_champs_or_bouts_or_reigns",
        json!({"collection_to_query": "reigns", "jmespath_query": "[].reign_id"}),
    )
    .await;
    assert_eq!(out, "[1,3112,3050,3051,3052]");
}

#[tokio::test]
async fn test_records_strips_stray_prefix() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "get_boxing_champs_or_bouts_or_reigns",
        json!({"collection_to_query": "champions", "jmespath_query": "?[0].name.short"}),
    )
    .await;
    assert_eq!(out, "Johnson");
}

#[tokio::test]
async fn test_records_filter_projection() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "get_boxing_champs_or_bouts_or_reigns",
        json!({
            "collection_to_query": "bouts",
            "jmespath_query": "[?boxers.boxerA.name.short=='Ioka'].location.venue"
        }),
    )
    .await;
    assert_eq!(out, r#"["Ota-City General Gymnasium"]"#);
}

#[tokio::test]
async fn test_records_empty_result_sentinel() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "get_boxing_champs_or_bouts_or_reigns",
        json!({
            "collection_to_query": "reigns",
            "jmespath_query": "[?champion.name.short=='Nobody']"
        }),
    )
    .await;
    assert_eq!(out, "Query result: No reigns found with that criteria");
}

#[tokio::test]
async fn test_records_unknown_collection() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "get_boxing_champs_or_bouts_or_reigns",
        json!({"collection_to_query": "titles", "jmespath_query": "[0]"}),
    )
    .await;
    assert!(out.starts_with("Unknown collection 'titles'"));
}

#[tokio::test]
async fn test_records_invalid_query_becomes_result_text() {
    let registry = sample_registry();
    let out = run(
        &registry,
        "get_boxing_champs_or_bouts_or_reigns",
        json!({"collection_to_query": "bouts", "jmespath_query": "[?boutId =="}),
    )
    .await;
    assert!(!out.is_empty());
    assert!(!out.starts_with("Query result"));
}
