use std::{path::{Path, PathBuf}, sync::Arc, time::{Duration, Instant}};

use arc_swap::ArcSwap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::oracle::{ParamDescriptor, ParamKind, ParameterOracle, BUILTIN_PARAMS};

use super::{priority::{DriverHandle, PriorityScheduler}, utils, Error};

/// Everything a parameter handle needs from the outside world: the host
/// oracle, the runtime config and the shared priority scheduler.
pub struct ParamLib {
    oracle: Arc<dyn ParameterOracle>,
    scheduler: Arc<PriorityScheduler>,
    pub config: ArcSwap<Config>,
    config_path: Option<PathBuf>
}

static INSTANCE: OnceCell<Arc<ParamLib>> = OnceCell::new();

impl ParamLib {
    pub fn new(oracle: Arc<dyn ParameterOracle>) -> Arc<ParamLib> {
        Self::with_config(oracle, Config::default())
    }

    pub fn with_config(oracle: Arc<dyn ParameterOracle>, config: Config) -> Arc<ParamLib> {
        Self::with_scheduler(oracle, config, PriorityScheduler::new())
    }

    pub fn with_scheduler(oracle: Arc<dyn ParameterOracle>, config: Config, scheduler: Arc<PriorityScheduler>) -> Arc<ParamLib> {
        Self::build(oracle, config, scheduler, None)
    }

    fn build(oracle: Arc<dyn ParameterOracle>, config: Config, scheduler: Arc<PriorityScheduler>, config_path: Option<PathBuf>) -> Arc<ParamLib> {
        Arc::new(ParamLib {
            oracle,
            scheduler,
            config: ArcSwap::new(Arc::new(config)),
            config_path
        })
    }

    /// Builds a context whose config lives at `config_path`. A missing file means defaults.
    pub fn from_config_file<P: AsRef<Path>>(oracle: Arc<dyn ParameterOracle>, config_path: P) -> Result<Arc<ParamLib>, Error> {
        let config_path = config_path.as_ref().to_path_buf();
        let config = Self::load_config(&config_path)?;

        Ok(Self::build(oracle, config, PriorityScheduler::new(), Some(config_path)))
    }

    /// Sets up logging and the shared instance for mods that want a single context.
    pub fn init(oracle: Arc<dyn ParameterOracle>, config_path: Option<&Path>) -> Result<Arc<ParamLib>, Error> {
        if INSTANCE.get().is_some() {
            warn!("ParamLib should be initialized only once");
            return Err(Error::AlreadyInitialized);
        }

        let instance = match config_path {
            Some(path) => Self::from_config_file(oracle, path),
            None => Ok(Self::new(oracle))
        };
        let instance = match instance {
            Ok(v) => v,
            Err(e) => {
                super::log::init(false); // early init to log error
                error!("Init failed: {}", e);
                return Err(e);
            }
        };

        super::log::init(instance.config.load().debug_mode);
        info!("ParamLib {}", env!("PARAMLIB_DISPLAY_VERSION"));

        INSTANCE.set(instance.clone()).map_err(|_| Error::AlreadyInitialized)?;
        Ok(instance)
    }

    pub fn instance() -> Option<Arc<ParamLib>> {
        INSTANCE.get().cloned()
    }

    pub fn oracle(&self) -> &dyn ParameterOracle {
        self.oracle.as_ref()
    }

    pub fn scheduler(&self) -> &Arc<PriorityScheduler> {
        &self.scheduler
    }

    pub fn load_config(path: &Path) -> Result<Config, Error> {
        if path.is_file() {
            utils::read_json_file(path)
        }
        else {
            Ok(Config::default())
        }
    }

    pub fn reload_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        let new_config = match Self::load_config(path) {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to reload config: {}", e);
                return;
            }
        };
        self.config.store(Arc::new(new_config));
    }

    pub fn save_and_reload_config(&self, config: Config) -> Result<(), Error> {
        if let Some(path) = &self.config_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            utils::write_json_file(&config, path)?;
        }

        self.config.store(Arc::new(config));
        Ok(())
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.config.load().excluded_names.iter().any(|n| n == name)
    }

    /// Resolves `(name, kind)` to the index writes should go to.
    pub fn find_param(&self, name: &str, kind: ParamKind) -> Option<(i32, ParamDescriptor)> {
        let config = self.config.load();
        if config.excluded_names.iter().any(|n| n == name) {
            debug!("Refusing to resolve built-in parameter {}", name);
            return None;
        }

        let (index, descriptor) = self.oracle.find(name, kind)?;
        let index = match config.index_correction {
            IndexCorrection::None => index,
            IndexCorrection::SkipExcluded => {
                let params = self.oracle.list_all();
                match params.iter().position(|p| p.name == name && p.kind == kind) {
                    Some(pos) => {
                        let skipped = params[..pos].iter()
                            .filter(|p| config.excluded_names.iter().any(|n| *n == p.name))
                            .count();
                        index - skipped as i32
                    },
                    None => index
                }
            }
        };

        Some((index, descriptor))
    }

    pub fn param_exists(&self, name: &str, kind: ParamKind) -> bool {
        self.oracle.param_exists(name, kind)
    }

    pub fn list_params(&self) -> Vec<ParamDescriptor> {
        self.oracle.list_all()
    }

    pub fn set_parameter(&self, index: i32, value: f32) -> bool {
        self.oracle.set_value(index, value)
    }

    pub fn prioritize_parameter(&self, index: i32) {
        self.oracle.request_priority(index);
    }

    /// Runs due priority tasks. Hosts with a frame callback call this every frame.
    pub fn poll(&self, now: Instant) -> usize {
        self.scheduler.poll(now, self.oracle.as_ref())
    }

    pub fn start_priority_thread(&self) -> Result<DriverHandle, Error> {
        let tick = Duration::from_millis(self.config.load().driver_tick_ms);
        self.scheduler.start_thread(self.oracle.clone(), tick)
    }
}

/// How the index returned by the host relates to the index it expects on writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexCorrection {
    #[default]
    None,
    /// The host drops built-in parameters from its table, shifting everything after them.
    SkipExcluded
}

fn default_serde_instance<'a, T: Deserialize<'a>>() -> Option<T> {
    let empty_data = std::iter::empty::<((), ())>();
    let empty_deserializer = serde::de::value::MapDeserializer::<_, serde::de::value::Error>::new(empty_data);
    T::deserialize(empty_deserializer).ok()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default)]
    pub index_correction: IndexCorrection,
    #[serde(default = "Config::default_excluded_names")]
    pub excluded_names: Vec<String>,
    #[serde(default = "Config::default_driver_tick_ms")]
    pub driver_tick_ms: u64
}

impl Config {
    fn default_excluded_names() -> Vec<String> { BUILTIN_PARAMS.iter().map(|s| s.to_string()).collect() }
    fn default_driver_tick_ms() -> u64 { 100 }
}

impl Default for Config {
    fn default() -> Self {
        default_serde_instance().expect("default instance")
    }
}
