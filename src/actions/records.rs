use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{Action, ActionResult};

use crate::constants::LOOKUP_MAX_RESULTS;
use crate::data::{Datasets, RecordsCollection};

const QUERY_DESCRIPTION: &str = r#"There is boxing reigns data in a JSON file.
Using the jmespath Python package you will write a simple jmespath_query.
jmespath_query will be used like this: ```
    jmespath.search(jmespath_query, reigns)```
The query syntax MUST be valid jmespath syntax.
In the query, project only the required or relevant data.
Example bouts JSON object:
    {"boutId":1,"date":"1912-06-24","boxers":{"boxerA":{"championId":7,"name":{"first":"Frank","last":"Klaus","short":"Klaus"},"born":"1887-12-30"},"boxerB":{"championId":25,"name":{"first":"Georges","last":"Carpentier","short":"Carpentier"},"born":"1894-01-12"}},"status":"FINISHED","result":{"winner":"BOXER A","methodOfVictory":"DQ","totalRounds":19},"scheduledRounds":20,"weight":{"class":"Middleweight","lb":"160"},"titles":[{"weight":{"class":"Middleweight","lb":"160"},"org":{"name":{"full":"New York State Athletic Commission","short":"NYSAC","abbreviation":"NYSAC"}},"active":false}],"location":{"locationId":null,"venue":null,"locality":null,"country":null,"latitude":null,"longitude":null}}
Example reigns JSON object:
    {"reign_id":3112,"period":{"begins":"2023-06-24","ends":null,"current":true},"champion":{"championId":1367,"name":{"first":"Kazuto","last":"Ioka","short":"Ioka"},"born":"1989-03-24"},"title":{"weight":{"class":"Super Flyweight","lb":"115"},"org":{"name":{"full":"World Boxing Association Regular","short":"WBA Regular","abbreviation":"WBAR"}},"active":true}}
Example champions JSON object:
    {"championId":1,"name":{"first":"Jack","last":"Johnson","short":"Johnson"},"born":"1878-03-31"}"#;

/// JMESPath lookups over the champions, bouts and reigns documents.
pub struct RecordsAction {
    datasets: Arc<Datasets>,
}

impl RecordsAction {
    pub fn new(datasets: Arc<Datasets>) -> Self {
        Self { datasets }
    }
}

#[derive(Deserialize)]
struct RecordsInput {
    collection_to_query: String,
    jmespath_query: String,
}

/// Models tend to wrap filter projections as `?[...]`, which is not valid
/// JMESPath. Every `?[` becomes `[`.
pub fn sanitize_query(query: &str) -> String {
    query.replace("?[", "[").trim().to_string()
}

/// Compiles and runs `query` against `document`. Kept synchronous: the
/// jmespath runtime values are reference counted and not `Send`.
fn search(query: &str, document: &Value) -> Result<Value> {
    let expr = jmespath::compile(query).map_err(|e| anyhow::anyhow!("{}", e))?;
    let found = expr.search(document).map_err(|e| anyhow::anyhow!("{}", e))?;
    serde_json::to_value(&*found).context("Failed to convert JMESPath result")
}

/// Python truthiness of a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn render_result(value: Value) -> String {
    match value {
        Value::Array(items) => {
            let head: Vec<Value> = items.into_iter().take(LOOKUP_MAX_RESULTS).collect();
            Value::Array(head).to_string()
        }
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl Action for RecordsAction {
    fn name(&self) -> &str {
        "get_boxing_champs_or_bouts_or_reigns"
    }

    fn description(&self) -> &str {
        "Query for current and past boxing champions, bouts or reigns."
    }

    fn schema(&self) -> Value {
        let collections: Vec<&str> = RecordsCollection::ALL.iter().map(|c| c.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "collection_to_query": {
                    "type": "string",
                    "enum": collections
                },
                "jmespath_query": {
                    "type": "string",
                    "description": QUERY_DESCRIPTION
                }
            },
            "required": ["collection_to_query", "jmespath_query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ActionResult> {
        let input: RecordsInput = serde_json::from_value(args)?;
        let collection: RecordsCollection = input.collection_to_query.parse()?;
        let query = sanitize_query(&input.jmespath_query);

        let found = search(&query, self.datasets.records(collection))?;
        if !is_truthy(&found) {
            return Ok(ActionResult::new(format!(
                "Query result: No {} found with that criteria",
                collection
            )));
        }
        Ok(ActionResult::new(render_result(found)))
    }
}
