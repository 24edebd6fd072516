use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::record::RecordFields;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum GroupLabel {
    GroupA,
    GroupB,
    GroupC,
}

impl GroupLabel {
    pub const ALL: [GroupLabel; 3] = [Self::GroupA, Self::GroupB, Self::GroupC];

    pub fn index(self) -> usize {
        match self {
            Self::GroupA => 0,
            Self::GroupB => 1,
            Self::GroupC => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::GroupA => "Group A",
            Self::GroupB => "Group B",
            Self::GroupC => "Group C",
        }
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RosterEntry {
    pub id: u32,
    pub group: GroupLabel,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricName {
    pub field: String,
    pub label: String,
}

impl MetricName {
    fn new(field: &str, label: &str) -> Self {
        Self {
            field: field.to_owned(),
            label: label.to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RosterMetrics {
    pub timestamp: String,
    pub primary: MetricName,
    pub secondary: MetricName,
    pub tertiary: MetricName,
}

impl Default for RosterMetrics {
    fn default() -> Self {
        let fields = RecordFields::default();
        Self {
            primary: MetricName::new(&fields.primary, "Total calories"),
            secondary: MetricName::new(&fields.secondary, "Mean heart rate"),
            tertiary: MetricName::new(&fields.tertiary, "Mean steps"),
            timestamp: fields.timestamp,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Roster {
    pub entities: Vec<RosterEntry>,
    #[serde(default)]
    pub excluded: BTreeSet<u32>,
    #[serde(default)]
    pub metrics: RosterMetrics,
}

impl Roster {
    pub fn record_fields(&self) -> RecordFields {
        RecordFields {
            timestamp: self.metrics.timestamp.clone(),
            primary: self.metrics.primary.field.clone(),
            secondary: self.metrics.secondary.field.clone(),
            tertiary: self.metrics.tertiary.field.clone(),
        }
    }

    pub fn is_excluded(&self, id: u32) -> bool {
        self.excluded.contains(&id)
    }

    pub fn members(&self, group: GroupLabel) -> impl Iterator<Item = u32> + '_ {
        self.entities
            .iter()
            .filter(move |entry| entry.group == group)
            .map(|entry| entry.id)
    }

    fn validate(&self) -> Result<()> {
        if self.entities.is_empty() {
            return Err(anyhow!("roster lists no entities"));
        }

        let mut seen = BTreeSet::new();
        for entry in &self.entities {
            if !seen.insert(entry.id) {
                return Err(anyhow!("entity id {} appears more than once in roster", entry.id));
            }
        }
        Ok(())
    }
}

pub fn parse_roster(raw: &str) -> Result<Roster> {
    let roster: Roster = serde_json::from_str(raw).context("invalid roster JSON")?;
    roster.validate()?;
    Ok(roster)
}

pub fn load_roster(path: &Path) -> Result<Roster> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    parse_roster(&raw).with_context(|| format!("failed to load roster {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_roster_with_default_metrics() {
        let roster = parse_roster(
            r#"{ "entities": [ { "id": 3, "group": "GroupB" }, { "id": 9, "group": "GroupA" } ] }"#,
        )
        .unwrap();

        assert_eq!(roster.entities.len(), 2);
        assert!(roster.excluded.is_empty());
        assert_eq!(roster.metrics, RosterMetrics::default());
        assert_eq!(roster.members(GroupLabel::GroupB).collect::<Vec<_>>(), vec![3]);
        assert_eq!(roster.record_fields(), RecordFields::default());
    }

    #[test]
    fn rejects_duplicate_ids_and_empty_rosters() {
        let duplicate = parse_roster(
            r#"{ "entities": [ { "id": 1, "group": "GroupA" }, { "id": 1, "group": "GroupC" } ] }"#,
        );
        assert!(duplicate.is_err());

        assert!(parse_roster(r#"{ "entities": [] }"#).is_err());
    }

    #[test]
    fn custom_metric_names_flow_into_record_fields() {
        let roster = parse_roster(
            r#"{
                "entities": [ { "id": 1, "group": "GroupC" } ],
                "excluded": [ 1 ],
                "metrics": { "primary": { "field": "kcal", "label": "Energy" } }
            }"#,
        )
        .unwrap();

        assert!(roster.is_excluded(1));
        assert_eq!(roster.record_fields().primary, "kcal");
        assert_eq!(roster.record_fields().secondary, "heart_rate");
        assert_eq!(roster.metrics.primary.label, "Energy");
    }
}
