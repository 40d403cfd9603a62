use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{Action, ActionResult};

use crate::constants::{LOOKUP_MAX_RESULTS, NO_EVENTS_FOUND};
use crate::data::{Datasets, ScheduleEvent, SCHEDULE_COLUMNS};
use crate::query::{Filter, Scope, Value as QueryValue};

const QUERY_DESCRIPTION: &str = r#"Consider that there is DAZN scheduled programming data in a Pandas Dataframe in a Python environment.
You will write a query_string that will be passed to a Dataframe.query call: ```
    dazn_schedule_dataframe = pandas.read_json(json_string, orient='records')
    current_date = datetime.now().strftime('%Y-%m-%d')
    dazn_schedule_dataframe.query(query_string, engine='python')```
The json_string contains a list of schedule event objects. Example object:
    {
        "Title": "KSI vs. Fury: Open Workout",
        "Description": "As the historic October 15 showdown draws closer, KSI and Tommy Fury take part in ...",
        "EventURL": "https://www.dazn.com/en-GB/home/8n9pw9ndc80wle43vnle55q42",
        "Start": "2023-10-11T14:00:00Z",
        "Competition": "MF & DAZN: X Series 10",
        "Sport": "Boxing"
    }
Possible values for Sport: 'Mixed Martial Arts', 'Football', 'Live channels', 'American Football', 'Extreme Sports', 'Boxing'"#;

/// Filters the broadcast schedule.
pub struct ScheduleAction {
    datasets: Arc<Datasets>,
}

impl ScheduleAction {
    pub fn new(datasets: Arc<Datasets>) -> Self {
        Self { datasets }
    }
}

#[derive(Deserialize)]
struct ScheduleInput {
    pandas_dataframe_query: String,
}

#[async_trait::async_trait]
impl Action for ScheduleAction {
    fn name(&self) -> &str {
        "query_dazn_event_schedule"
    }

    fn description(&self) -> &str {
        "Query for info on DAZN scheduled programming by querying a Pandas Dataframe in a Python environment."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pandas_dataframe_query": {
                    "type": "string",
                    "description": QUERY_DESCRIPTION
                }
            },
            "required": ["pandas_dataframe_query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ActionResult> {
        let input: ScheduleInput = serde_json::from_value(args)?;
        let filter = Filter::parse(&input.pandas_dataframe_query)?;

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let scope = Scope::new().with("current_date", QueryValue::from(today.as_str()));

        let events = filter.select(&self.datasets.schedule, &scope, LOOKUP_MAX_RESULTS)?;
        if events.is_empty() {
            return Ok(ActionResult::new(NO_EVENTS_FOUND));
        }
        Ok(ActionResult::new(render_table(&events)))
    }
}

/// Fixed-width table with a header row, every column right-aligned and
/// separated by one space. Missing cells print as `None`.
fn render_table(events: &[&ScheduleEvent]) -> String {
    let rows: Vec<Vec<&str>> = events
        .iter()
        .map(|event| {
            SCHEDULE_COLUMNS
                .iter()
                .map(|col| event.cell(col).unwrap_or("None"))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = SCHEDULE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<&str> = SCHEDULE_COLUMNS.to_vec();
    std::iter::once(&header)
        .chain(rows.iter())
        .map(|cells| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
