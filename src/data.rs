//! Lookup datasets, loaded once at startup and read-only afterwards.
//!
//! The schedule is a flat table of events; the boxing records are three
//! free-form JSON documents queried with JMESPath. All four files live in
//! one directory (`[data] dir` in the config).

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::query::{Row, Value};

/// Schedule file name inside the data directory.
pub const SCHEDULE_FILE: &str = "schedule.json";

/// Column names of the schedule table, in display order.
pub const SCHEDULE_COLUMNS: [&str; 6] = [
    "Title",
    "Description",
    "EventURL",
    "Start",
    "Competition",
    "Sport",
];

/// One scheduled broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScheduleEvent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "EventURL", default)]
    pub event_url: Option<String>,
    /// ISO-8601 timestamp, kept as text so it compares lexically.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
}

impl ScheduleEvent {
    /// Cell text for a column, `None` for a missing value.
    pub fn cell(&self, column: &str) -> Option<&str> {
        match column {
            "Title" => self.title.as_deref(),
            "Description" => self.description.as_deref(),
            "EventURL" => self.event_url.as_deref(),
            "Start" => self.start.as_deref(),
            "Competition" => self.competition.as_deref(),
            "Sport" => self.sport.as_deref(),
            _ => None,
        }
    }
}

impl Row for ScheduleEvent {
    fn column(&self, name: &str) -> Option<Value> {
        SCHEDULE_COLUMNS
            .contains(&name)
            .then(|| Value::from(self.cell(name)))
    }
}

/// The three boxing-records documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordsCollection {
    Champions,
    Bouts,
    Reigns,
}

impl RecordsCollection {
    pub const ALL: [RecordsCollection; 3] = [Self::Champions, Self::Bouts, Self::Reigns];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Champions => "champions",
            Self::Bouts => "bouts",
            Self::Reigns => "reigns",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for RecordsCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordsCollection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown collection '{}'. Expected one of: champions, bouts, reigns",
                    s
                )
            })
    }
}

/// Everything the lookup actions read.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub schedule: Vec<ScheduleEvent>,
    pub champions: JsonValue,
    pub bouts: JsonValue,
    pub reigns: JsonValue,
}

impl Datasets {
    /// Loads all four files from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let schedule: Vec<ScheduleEvent> = read_json(&dir.join(SCHEDULE_FILE))?;
        let champions = read_json(&dir.join(RecordsCollection::Champions.file_name()))?;
        let bouts = read_json(&dir.join(RecordsCollection::Bouts.file_name()))?;
        let reigns = read_json(&dir.join(RecordsCollection::Reigns.file_name()))?;

        let datasets = Self {
            schedule,
            champions,
            bouts,
            reigns,
        };
        info!(
            dir = %dir.display(),
            events = datasets.schedule.len(),
            champions = array_len(&datasets.champions),
            bouts = array_len(&datasets.bouts),
            reigns = array_len(&datasets.reigns),
            "loaded lookup datasets"
        );
        Ok(datasets)
    }

    pub fn records(&self, collection: RecordsCollection) -> &JsonValue {
        match collection {
            RecordsCollection::Champions => &self.champions,
            RecordsCollection::Bouts => &self.bouts,
            RecordsCollection::Reigns => &self.reigns,
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read dataset {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse dataset {:?}", path))
}

fn array_len(value: &JsonValue) -> usize {
    value.as_array().map_or(0, Vec::len)
}
