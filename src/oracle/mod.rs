//! The host side of the parameter table.
//!
//! Everything this crate knows about the running avatar goes through
//! [`ParameterOracle`]. Implementations are expected to report missing
//! parameters and failed writes through their return values and never panic.

use std::fmt::Display;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

mod memory;
pub use memory::{MemoryOracle, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Bool,
    Int,
    Float
}

impl Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ParamKind::Bool => "Bool",
            ParamKind::Int => "Int",
            ParamKind::Float => "Float"
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(default, rename = "default")]
    pub default_value: f64
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>, kind: ParamKind, default_value: f64) -> ParamDescriptor {
        ParamDescriptor {
            name: name.into(),
            kind,
            default_value
        }
    }
}

pub trait ParameterOracle: Send + Sync {
    /// Looks up a parameter by name and type. Returns `None` when absent.
    fn find(&self, name: &str, kind: ParamKind) -> Option<(i32, ParamDescriptor)>;

    /// Snapshot of every parameter currently exposed by the host.
    fn list_all(&self) -> Vec<ParamDescriptor>;

    /// Sets the value at `index`. Returns whether the host accepted the write.
    fn set_value(&self, index: i32, value: f32) -> bool;

    /// Asks the host to keep `index` at the front of its update queue.
    fn request_priority(&self, index: i32);

    fn param_exists(&self, name: &str, kind: ParamKind) -> bool {
        self.list_all().iter().any(|p| p.name == name && p.kind == kind)
    }
}

/// Parameters the host drives itself. They are never resolved as user parameters.
pub static BUILTIN_PARAMS: Lazy<Vec<&'static str>> = Lazy::new(|| vec![
    "IsLocal",
    "Viseme",
    "Voice",
    "GestureLeft",
    "GestureRight",
    "GestureLeftWeight",
    "GestureRightWeight",
    "AngularY",
    "VelocityX",
    "VelocityY",
    "VelocityZ",
    "VelocityMagnitude",
    "Upright",
    "Grounded",
    "Seated",
    "AFK",
    "TrackingType",
    "VRMode",
    "MuteSelf",
    "InStation",
    "Earmuffs",
    "IsOnFriendsList",
    "AvatarVersion",
    "ScaleModified",
    "ScaleFactor",
    "ScaleFactorInverse",
    "EyeHeightAsMeters",
    "EyeHeightAsPercent"
]);
