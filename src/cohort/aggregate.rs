use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::thread;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::record::{RawRecord, numeric_value};
use super::roster::{GroupLabel, Roster};
use super::source::{RecordSource, SourceError};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntitySummary {
    pub id: u32,
    pub group: GroupLabel,
    pub primary_total: f64,
    pub secondary_mean: Option<f64>,
    pub tertiary_mean: Option<f64>,
}

impl EntitySummary {
    pub fn unavailable(id: u32, group: GroupLabel) -> Self {
        Self {
            id,
            group,
            primary_total: 0.0,
            secondary_mean: None,
            tertiary_mean: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.secondary_mean.is_some() && self.tertiary_mean.is_some()
    }
}

#[derive(Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

pub fn summarize_records(id: u32, group: GroupLabel, records: &[RawRecord]) -> EntitySummary {
    let mut primary_total = 0.0;
    let mut secondary = MeanAccumulator::default();
    let mut tertiary = MeanAccumulator::default();

    for record in records {
        primary_total += numeric_value(&record.primary).unwrap_or(0.0);
        secondary.push(numeric_value(&record.secondary));
        tertiary.push(numeric_value(&record.tertiary));
    }

    EntitySummary {
        id,
        group,
        primary_total,
        secondary_mean: secondary.mean(),
        tertiary_mean: tertiary.mean(),
    }
}

fn aggregate_entity(source: &dyn RecordSource, id: u32, group: GroupLabel) -> EntitySummary {
    match source.load(id) {
        Ok(records) => summarize_records(id, group, &records),
        Err(SourceError::Unavailable { .. }) => {
            debug!(id, "raw records unavailable, using default summary");
            EntitySummary::unavailable(id, group)
        }
        Err(error) => {
            warn!(id, %error, "failed to aggregate entity, using default summary");
            EntitySummary::unavailable(id, group)
        }
    }
}

pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

pub fn run_aggregation(
    source: &dyn RecordSource,
    roster: &Roster,
    workers: usize,
) -> BTreeMap<u32, EntitySummary> {
    let mut summaries = BTreeMap::new();
    let mut pending = Vec::with_capacity(roster.entities.len());
    for entry in &roster.entities {
        if roster.is_excluded(entry.id) {
            summaries.insert(entry.id, EntitySummary::unavailable(entry.id, entry.group));
        } else {
            pending.push(*entry);
        }
    }

    let worker_count = workers.clamp(1, pending.len().max(1));
    let aggregate_all = || {
        pending
            .par_iter()
            .map(|entry| aggregate_entity(source, entry.id, entry.group))
            .collect::<Vec<_>>()
    };
    let results = match ThreadPoolBuilder::new().num_threads(worker_count).build() {
        Ok(pool) => pool.install(aggregate_all),
        Err(error) => {
            warn!(%error, "failed to build aggregation pool, using the global pool");
            aggregate_all()
        }
    };
    for summary in results {
        summaries.insert(summary.id, summary);
    }

    let unavailable = summaries
        .values()
        .filter(|summary| summary.primary_total == 0.0 && !summary.is_complete())
        .count();
    info!(
        entities = summaries.len(),
        excluded = roster.excluded.len(),
        unavailable,
        workers = worker_count,
        "aggregation joined"
    );

    summaries
}
