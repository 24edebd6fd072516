use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::aggregate::{EntitySummary, run_aggregation};
use super::roster::{GroupLabel, Roster, RosterMetrics, load_roster};
use super::source::{DirectorySource, RecordSource, SyntheticSource};
use crate::scale::encode_radii;

pub const ROSTER_FILE: &str = "roster.json";

pub struct Cohort {
    pub summaries: BTreeMap<u32, EntitySummary>,
    pub radii: BTreeMap<u32, f32>,
    pub metrics: RosterMetrics,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CohortInput {
    Directory(PathBuf),
    Demo { seed: u64, size: u32 },
}

impl CohortInput {
    pub fn describe(&self) -> String {
        match self {
            Self::Directory(dir) => dir.display().to_string(),
            Self::Demo { seed, size } => format!("demo cohort ({size} subjects, seed {seed})"),
        }
    }
}

pub fn load_cohort(source: &dyn RecordSource, roster: &Roster, workers: usize) -> Cohort {
    for group in GroupLabel::ALL {
        debug!(%group, members = roster.members(group).count(), "roster group");
    }

    let summaries = run_aggregation(source, roster, workers);
    let radii = encode_radii(&summaries);
    Cohort {
        summaries,
        radii,
        metrics: roster.metrics.clone(),
    }
}

pub fn collect_cohort(input: &CohortInput, workers: usize) -> Result<Cohort> {
    info!(input = %input.describe(), workers, "loading cohort");

    match input {
        CohortInput::Directory(dir) => {
            let roster_path = dir.join(ROSTER_FILE);
            let roster = load_roster(&roster_path)
                .with_context(|| format!("failed to load cohort from {}", dir.display()))?;
            let source = DirectorySource::new(dir, roster.record_fields());
            Ok(load_cohort(&source, &roster, workers))
        }
        CohortInput::Demo { seed, size } => {
            let source = SyntheticSource::new(*seed, *size);
            let roster = source.roster();
            Ok(load_cohort(&source, &roster, workers))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::scale::FALLBACK_RADIUS;

    #[test]
    fn demo_pipeline_covers_every_roster_entity() {
        let source = SyntheticSource::new(3, 30);
        let roster = source.roster();
        let cohort = load_cohort(&source, &roster, 3);

        assert_eq!(cohort.summaries.len(), 30);
        assert_eq!(cohort.radii.len(), 30);
        for id in &roster.excluded {
            assert_eq!(cohort.summaries[id].primary_total, 0.0);
            assert_eq!(cohort.radii[id], FALLBACK_RADIUS);
        }
    }

    #[test]
    fn directory_input_reads_roster_and_records() {
        let dir = std::env::temp_dir().join(format!("cohort-collect-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(ROSTER_FILE),
            r#"{"entities":[{"id":1,"group":"GroupA"},{"id":2,"group":"GroupB"}],"excluded":[2]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("1.json"),
            r#"[{"timestamp":"t0","calories":10,"heart_rate":60,"steps":"n/a"},
                {"timestamp":"t1","calories":"15","heart_rate":null,"steps":100}]"#,
        )
        .unwrap();

        let cohort = collect_cohort(&CohortInput::Directory(dir.clone()), 2).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(cohort.summaries[&1].primary_total, 25.0);
        assert_eq!(cohort.summaries[&1].secondary_mean, Some(60.0));
        assert_eq!(cohort.summaries[&1].tertiary_mean, Some(100.0));
        assert_eq!(cohort.summaries[&2].primary_total, 0.0);
    }

    #[test]
    fn missing_roster_fails_the_load() {
        let dir = std::env::temp_dir().join("cohort-collect-missing-roster");
        let error = collect_cohort(&CohortInput::Directory(dir), 1)
            .err()
            .unwrap();
        assert!(error.to_string().contains("failed to load cohort"));
    }
}
