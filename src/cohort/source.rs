use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use thiserror::Error;

use super::record::{RawRecord, RecordFields};
use super::roster::{GroupLabel, Roster, RosterEntry};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no raw records are available for entity {id}")]
    Unavailable { id: u32 },
    #[error("failed to read records for entity {id} from {path}")]
    Io {
        id: u32,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("records for entity {id} are malformed: {reason}")]
    Parse { id: u32, reason: String },
}

pub trait RecordSource: Send + Sync {
    fn load(&self, id: u32) -> Result<Vec<RawRecord>, SourceError>;
}

pub struct DirectorySource {
    dir: PathBuf,
    fields: RecordFields,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, fields: RecordFields) -> Self {
        Self {
            dir: dir.into(),
            fields,
        }
    }

    fn path_for(&self, id: u32) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl RecordSource for DirectorySource {
    fn load(&self, id: u32) -> Result<Vec<RawRecord>, SourceError> {
        let path = self.path_for(id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::Unavailable { id });
            }
            Err(source) => return Err(SourceError::Io { id, path, source }),
        };

        let parsed: Value = serde_json::from_str(&raw).map_err(|error| SourceError::Parse {
            id,
            reason: error.to_string(),
        })?;
        let rows = parsed.as_array().ok_or_else(|| SourceError::Parse {
            id,
            reason: "expected a JSON array of rows".to_owned(),
        })?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                row.as_object()
                    .map(|object| self.fields.extract(object))
                    .ok_or_else(|| SourceError::Parse {
                        id,
                        reason: format!("row {index} is not an object"),
                    })
            })
            .collect()
    }
}

pub struct SyntheticSource {
    seed: u64,
    entity_count: u32,
    records_per_entity: usize,
    unavailable: BTreeSet<u32>,
}

impl SyntheticSource {
    const FIRST_ID: u32 = 1;

    pub fn new(seed: u64, entity_count: u32) -> Self {
        let entity_count = entity_count.max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut unavailable = BTreeSet::new();
        let missing = (entity_count / 10).clamp(1, 3).min(entity_count.saturating_sub(1));
        while (unavailable.len() as u32) < missing {
            unavailable.insert(rng.random_range(Self::FIRST_ID..Self::FIRST_ID + entity_count));
        }

        Self {
            seed,
            entity_count,
            records_per_entity: 96,
            unavailable,
        }
    }

    pub fn roster(&self) -> Roster {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(0x5eed));
        let entities = (Self::FIRST_ID..Self::FIRST_ID + self.entity_count)
            .map(|id| RosterEntry {
                id,
                group: GroupLabel::ALL[rng.random_range(0..GroupLabel::ALL.len())],
            })
            .collect();

        Roster {
            entities,
            excluded: self.unavailable.clone(),
            ..Roster::default()
        }
    }

    fn sample(rng: &mut StdRng, base: f64, spread: f64) -> Value {
        let roll = rng.random::<f64>();
        if roll < 0.05 {
            Value::Null
        } else if roll < 0.10 {
            Value::from("n/a")
        } else if roll < 0.15 {
            Value::from(format!("{:.1}", base + rng.random_range(-spread..spread)))
        } else {
            Value::from(base + rng.random_range(-spread..spread))
        }
    }
}

impl RecordSource for SyntheticSource {
    fn load(&self, id: u32) -> Result<Vec<RawRecord>, SourceError> {
        if self.unavailable.contains(&id)
            || !(Self::FIRST_ID..Self::FIRST_ID + self.entity_count).contains(&id)
        {
            return Err(SourceError::Unavailable { id });
        }

        let mut rng = StdRng::seed_from_u64(self.seed ^ (u64::from(id) << 20));
        let calorie_base = rng.random_range(60.0..140.0);
        let heart_base = rng.random_range(62.0..96.0);
        let step_base = rng.random_range(150.0..900.0);
        let wears_heart_monitor = id % 7 != 0;

        let records = (0..self.records_per_entity)
            .map(|hour| {
                let secondary = if wears_heart_monitor {
                    Self::sample(&mut rng, heart_base, 12.0)
                } else {
                    Value::Null
                };
                RawRecord {
                    timestamp: Some(format!("day {} {:02}:00", hour / 24 + 1, hour % 24)),
                    primary: Self::sample(&mut rng, calorie_base, 25.0),
                    secondary,
                    tertiary: Self::sample(&mut rng, step_base, 120.0),
                }
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cohort-orbit-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, file: &str, contents: &str) {
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn directory_source_reads_rows_and_reports_missing_files() {
        let dir = scratch_dir("rows");
        write(
            &dir,
            "4.json",
            r#"[ { "timestamp": "t0", "calories": 10, "heart_rate": "71" }, { "calories": "bad" } ]"#,
        );
        let source = DirectorySource::new(&dir, RecordFields::default());

        let records = source.load(4).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp.as_deref(), Some("t0"));
        assert_eq!(records[1].primary, Value::from("bad"));

        assert!(matches!(source.load(5), Err(SourceError::Unavailable { id: 5 })));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_source_rejects_non_array_files() {
        let dir = scratch_dir("malformed");
        write(&dir, "1.json", r#"{ "calories": 10 }"#);
        write(&dir, "2.json", "[ 1, 2 ]");
        let source = DirectorySource::new(&dir, RecordFields::default());

        assert!(matches!(source.load(1), Err(SourceError::Parse { id: 1, .. })));
        assert!(matches!(source.load(2), Err(SourceError::Parse { id: 2, .. })));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn synthetic_source_is_deterministic_per_seed() {
        let first = SyntheticSource::new(7, 30);
        let second = SyntheticSource::new(7, 30);

        assert_eq!(first.roster(), second.roster());
        let id = first
            .roster()
            .entities
            .iter()
            .map(|entry| entry.id)
            .find(|id| !first.unavailable.contains(id))
            .unwrap();
        let a = first.load(id).unwrap();
        let b = second.load(id).unwrap();
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.primary == y.primary));
    }

    #[test]
    fn synthetic_roster_marks_unavailable_ids_as_excluded() {
        let source = SyntheticSource::new(11, 40);
        let roster = source.roster();

        assert_eq!(roster.entities.len(), 40);
        assert!(!roster.excluded.is_empty());
        for id in &roster.excluded {
            assert!(matches!(source.load(*id), Err(SourceError::Unavailable { .. })));
        }
    }
}
