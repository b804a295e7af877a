//! A sample store kept in a single YAML file.

use anyhow::{Context, Result};
use chrono::Utc;
use std::{fs, path::{Path, PathBuf}};
use tracing::{debug, info, warn};
use waterwatch_core::{builder, error::WaterwatchError, store::SampleStore};
use waterwatch_schemas::{
    file_formats::SampleFile,
    query::QuerySpec,
    sample::{NewSample, Sample},
};

pub const SCHEMA_VERSION: &str = "1.0";

pub struct FileSampleStore {
    path: PathBuf,
    samples: Vec<Sample>,
}

impl FileSampleStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Sample store file not found, starting empty");
            return Ok(Self { path: path.to_path_buf(), samples: Vec::new() });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sample store {:?}", path))?;
        let file: SampleFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;

        for sample in &file.samples {
            if let Err(e) = builder::validate(sample) {
                warn!(id = sample.id, error = %e, "Stored sample violates the prediction invariant");
            }
        }
        debug!(path = %path.display(), samples = file.samples.len(), "Opened sample store");
        Ok(Self { path: path.to_path_buf(), samples: file.samples })
    }

    fn save(&self) -> Result<(), WaterwatchError> {
        let shown = self.path.display().to_string();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| WaterwatchError::FileIO(shown.clone(), e))?;
        }
        let file = SampleFile { schema_version: SCHEMA_VERSION.to_string(), samples: self.samples.clone() };
        let yaml = serde_yaml::to_string(&file).map_err(|e| WaterwatchError::Store(e.to_string()))?;
        fs::write(&self.path, yaml).map_err(|e| WaterwatchError::FileIO(shown, e))
    }

    fn next_id(&self) -> u64 {
        self.samples.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }
}

/// Whether `sample` falls inside the query scope.
pub fn in_scope(spec: &QuerySpec, sample: &Sample) -> bool {
    spec.sample_type.admits(sample.sample_type)
        && spec.user_id.map_or(true, |user_id| sample.owner_user_id == Some(user_id))
}

impl SampleStore for FileSampleStore {
    /// Newest first, like the results endpoint.
    fn fetch(&self, spec: &QuerySpec) -> Result<Vec<Sample>, WaterwatchError> {
        let mut samples: Vec<Sample> = self.samples.iter().filter(|s| in_scope(spec, s)).cloned().collect();
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(query = %spec.to_query_string(), samples = samples.len(), "Fetched samples");
        Ok(samples)
    }

    fn create(&mut self, sample: NewSample) -> Result<Sample, WaterwatchError> {
        let sample = sample.into_sample(self.next_id(), Utc::now());
        builder::validate(&sample)?;
        self.samples.push(sample.clone());
        if let Err(e) = self.save() {
            self.samples.pop();
            return Err(e);
        }
        info!(id = sample.id, sample_type = %sample.sample_type, "Created sample");
        Ok(sample)
    }

    fn delete(&mut self, id: u64) -> Result<(), WaterwatchError> {
        let index = self
            .samples
            .iter()
            .position(|s| s.id == id)
            .ok_or(WaterwatchError::SampleNotFound(id))?;
        let removed = self.samples.remove(index);
        if let Err(e) = self.save() {
            self.samples.insert(index, removed);
            return Err(e);
        }
        info!(id, "Deleted sample");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterwatch_core::builder::NewSampleBuilder;
    use waterwatch_schemas::{parameter::Parameter, query::TypeSelector, sample::SampleType};

    fn seeded(dir: &Path) -> FileSampleStore {
        let mut store = FileSampleStore::open(&dir.join("samples.yaml")).unwrap();
        for (kind, owner) in [(SampleType::Influent, Some(1)), (SampleType::Sludge, None), (SampleType::Influent, Some(2))] {
            let sample = NewSampleBuilder::new(kind)
                .with_value(Parameter::Cod, 40.0)
                .owned_by(owner)
                .build()
                .unwrap();
            store.create(sample).unwrap();
        }
        store
    }

    #[test]
    fn fetch_honors_type_and_user_scope() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(dir.path());

        let all = store.fetch(&QuerySpec { sample_type: TypeSelector::All, user_id: None }).unwrap();
        assert_eq!(all.len(), 3);

        let influent = QuerySpec { sample_type: TypeSelector::Only(SampleType::Influent), user_id: None };
        assert_eq!(store.fetch(&influent).unwrap().len(), 2);

        let mine = QuerySpec { sample_type: TypeSelector::All, user_id: Some(2) };
        let mine = store.fetch(&mine).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner_user_id, Some(2));
    }

    #[test]
    fn failed_save_leaves_no_phantom_sample() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let mut store = FileSampleStore::open(&blocker.join("samples.yaml")).unwrap();

        let sample = NewSampleBuilder::new(SampleType::Effluent).build().unwrap();
        assert!(store.create(sample).is_err());
        assert!(store.samples.is_empty());
        assert_eq!(store.next_id(), 1);
    }

    #[test]
    fn changes_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded(dir.path());
        store.delete(2).unwrap();
        assert!(matches!(store.delete(2), Err(WaterwatchError::SampleNotFound(2))));

        let reopened = FileSampleStore::open(&dir.path().join("samples.yaml")).unwrap();
        let ids: Vec<_> = reopened.samples.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(reopened.samples[0].value(Parameter::Cod), Some(40.0));
    }
}
