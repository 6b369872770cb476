use std::{path::Path, sync::{atomic::{self, AtomicBool}, Mutex, MutexGuard}};

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{utils, Error};

use super::{ParamDescriptor, ParamKind, ParameterOracle};

/// On-disk form of a parameter table, as dumped from a live avatar.
#[derive(Deserialize, Serialize, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub parameters: Vec<ParamDescriptor>
}

#[derive(Default)]
struct Table {
    params: Vec<ParamDescriptor>,
    values: FnvHashMap<i32, f32>,
    priority_requests: Vec<i32>
}

/// Oracle backed by a plain parameter list. Indices are listing positions.
///
/// `set_available(false)` mimics a host with no local avatar controller:
/// writes are refused and priority requests are dropped.
pub struct MemoryOracle {
    table: Mutex<Table>,
    available: AtomicBool
}

impl Default for MemoryOracle {
    fn default() -> Self {
        MemoryOracle {
            table: Mutex::default(),
            available: AtomicBool::new(true)
        }
    }
}

impl MemoryOracle {
    pub fn new(params: Vec<ParamDescriptor>) -> MemoryOracle {
        let oracle = MemoryOracle::default();
        oracle.replace_params(params);
        oracle
    }

    pub fn with_params<'a>(params: impl IntoIterator<Item = (&'a str, ParamKind)>) -> MemoryOracle {
        MemoryOracle::new(
            params.into_iter()
                .map(|(name, kind)| ParamDescriptor::new(name, kind, 0.0))
                .collect()
        )
    }

    pub fn from_json(json: &str) -> Result<MemoryOracle, Error> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(MemoryOracle::new(snapshot.parameters))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<MemoryOracle, Error> {
        let snapshot: Snapshot = utils::read_json_file(path)?;
        Ok(MemoryOracle::new(snapshot.parameters))
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap()
    }

    /// Swaps in a new parameter set, like the host does on avatar change.
    /// Written values and priority requests are discarded.
    pub fn replace_params(&self, params: Vec<ParamDescriptor>) {
        let mut table = self.table();
        table.params = params;
        table.values.clear();
        table.priority_requests.clear();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            parameters: self.table().params.clone()
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, atomic::Ordering::Relaxed);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(atomic::Ordering::Relaxed)
    }

    pub fn value(&self, index: i32) -> Option<f32> {
        self.table().values.get(&index).copied()
    }

    pub fn value_of(&self, name: &str) -> Option<f32> {
        let table = self.table();
        let index = table.params.iter().position(|p| p.name == name)?;
        table.values.get(&(index as i32)).copied()
    }

    pub fn write_count(&self) -> usize {
        self.table().values.len()
    }

    pub fn priority_requests(&self) -> Vec<i32> {
        self.table().priority_requests.clone()
    }

    pub fn clear_priority_requests(&self) {
        self.table().priority_requests.clear();
    }
}

impl ParameterOracle for MemoryOracle {
    fn find(&self, name: &str, kind: ParamKind) -> Option<(i32, ParamDescriptor)> {
        let table = self.table();
        table.params.iter()
            .enumerate()
            .find(|(_, p)| p.name == name && p.kind == kind)
            .map(|(i, p)| (i as i32, p.clone()))
    }

    fn list_all(&self) -> Vec<ParamDescriptor> {
        self.table().params.clone()
    }

    fn set_value(&self, index: i32, value: f32) -> bool {
        if !self.is_available() {
            return false;
        }

        let mut table = self.table();
        if index < 0 || index as usize >= table.params.len() {
            return false;
        }
        table.values.insert(index, value);
        true
    }

    fn request_priority(&self, index: i32) {
        if !self.is_available() {
            return;
        }
        self.table().priority_requests.push(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_json_uses_lowercase_types() {
        let oracle = MemoryOracle::from_json(r#"{
            "parameters": [
                { "name": "EyeX", "type": "float", "default": 0.5 },
                { "name": "Blink", "type": "bool" }
            ]
        }"#).unwrap();

        let (index, descriptor) = oracle.find("EyeX", ParamKind::Float).unwrap();
        assert_eq!(index, 0);
        assert_eq!(descriptor.default_value, 0.5);
        assert!(oracle.param_exists("Blink", ParamKind::Bool));
        assert!(!oracle.param_exists("Blink", ParamKind::Float));
    }

    #[test]
    fn unavailable_host_refuses_writes() {
        let oracle = MemoryOracle::with_params([("EyeX", ParamKind::Float)]);
        oracle.set_available(false);
        assert!(!oracle.set_value(0, 1.0));
        oracle.request_priority(0);
        assert!(oracle.priority_requests().is_empty());

        oracle.set_available(true);
        assert!(oracle.set_value(0, 1.0));
        assert_eq!(oracle.value_of("EyeX"), Some(1.0));
    }

    #[test]
    fn snapshot_file_loads() {
        let path = std::env::temp_dir().join(format!("paramlib-snapshot-{}.json", std::process::id()));
        let oracle = MemoryOracle::with_params([("EyeX", ParamKind::Float), ("Blink", ParamKind::Bool)]);
        utils::write_json_file(&oracle.snapshot(), &path).unwrap();

        let loaded = MemoryOracle::load(&path).unwrap();
        assert_eq!(loaded.find("Blink", ParamKind::Bool).map(|(i, _)| i), Some(1));
        assert!(MemoryOracle::load(path.with_extension("missing")).is_err());

        _ = std::fs::remove_file(path);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let oracle = MemoryOracle::with_params([("EyeX", ParamKind::Float)]);
        assert!(!oracle.set_value(1, 1.0));
        assert!(!oracle.set_value(-1, 1.0));
    }
}
