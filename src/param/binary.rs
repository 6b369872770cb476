use std::sync::Arc;

use crate::{core::{utils, ParamLib}, oracle::{ParamDescriptor, ParamKind}};

use super::BoolParam;

const NEGATIVE_SUFFIX: &str = "Negative";

/// Bit slots for `base_name` in a parameter listing, as `(position, name)` sorted by position.
///
/// A bool parameter `<base_name><k>` occupies bit `log2(k)` when `k` is a power
/// of two. Any other suffix, zero included, is not a slot. The first listing
/// wins when two names parse to the same position.
pub fn discover_bits(params: &[ParamDescriptor], base_name: &str, is_excluded: impl Fn(&str) -> bool) -> Vec<(u32, String)> {
    let mut bits: Vec<(u32, String)> = Vec::new();

    for param in params {
        if param.kind != ParamKind::Bool || is_excluded(&param.name) {
            continue;
        }
        let Some(suffix) = utils::numeric_suffix(&param.name, base_name) else {
            continue;
        };
        if !suffix.is_power_of_two() {
            continue;
        }

        let position = suffix.trailing_zeros();
        if bits.iter().any(|(p, _)| *p == position) {
            continue;
        }
        bits.push((position, param.name.clone()));
    }

    bits.sort_by_key(|(p, _)| *p);
    bits
}

/// A signed value in [-1, 1] spread over a set of bool parameters plus a sign flag.
///
/// The bits are found by name at resolve time, so the precision follows
/// whatever the current avatar exposes.
pub struct BinaryParam {
    lib: Arc<ParamLib>,
    name: String,
    bits: Vec<(u32, BoolParam)>,
    negative: BoolParam
}

impl BinaryParam {
    pub fn new(lib: &Arc<ParamLib>, name: impl Into<String>) -> BinaryParam {
        let name = name.into();
        let negative = BoolParam::new_unresolved(lib, format!("{}{}", name, NEGATIVE_SUFFIX));
        let mut param = BinaryParam {
            lib: lib.clone(),
            name,
            bits: Vec::new(),
            negative
        };
        param.resolve();
        param
    }

    /// Rediscovers the bit parameters and resolves them along with the sign flag.
    pub fn resolve(&mut self) {
        let params = self.lib.list_params();
        let lib = &self.lib;
        self.bits = discover_bits(&params, &self.name, |name| lib.is_excluded(name))
            .into_iter()
            .map(|(position, name)| (position, BoolParam::new(lib, name)))
            .collect();
        self.negative.resolve();

        if self.bits.is_empty() {
            debug!("No binary parameters found for {}", self.name);
        }
    }

    pub fn invalidate(&mut self) {
        for (_, bit) in &mut self.bits {
            bit.invalidate();
        }
        self.negative.invalidate();
    }

    /// Writes `value`. Negative values are dropped entirely unless the sign flag resolved.
    /// Returns whether the host accepted at least one of the writes.
    pub fn set(&mut self, value: f32) -> bool {
        if value.is_nan() {
            return false;
        }
        if value < 0.0 && !self.negative.is_resolved() {
            debug!("Dropping negative value for {}, no sign parameter", self.name);
            return false;
        }

        let encoded = Self::encode(value.abs().min(1.0), self.bits.len());
        let mut applied = false;
        for (position, bit) in &mut self.bits {
            applied |= bit.set((encoded >> *position) & 1 == 1);
        }
        applied |= self.negative.set(value < 0.0);
        applied
    }

    /// Integer level for a magnitude in [0, 1] given `bit_count` bits.
    pub fn encode(magnitude: f32, bit_count: usize) -> u64 {
        let max = if bit_count >= 64 { u64::MAX } else { (1u64 << bit_count) - 1 };
        (magnitude as f64 * max as f64) as u64
    }

    /// Reads back the integer level from the cached bit values.
    pub fn encoded(&self) -> u64 {
        self.bits.iter()
            .filter(|(_, bit)| bit.get())
            .fold(0, |acc, (position, _)| acc | (1u64 << *position))
    }

    pub fn is_negative(&self) -> bool {
        self.negative.get()
    }

    pub fn bit_count(&self) -> usize {
        self.bits.len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bits(&self) -> impl Iterator<Item = (u32, &BoolParam)> {
        self.bits.iter().map(|(position, bit)| (*position, bit))
    }

    pub fn negative(&self) -> &BoolParam {
        &self.negative
    }

    /// Parameter names this handle drives. Just the base name when nothing was found.
    pub fn param_names(&self) -> Vec<String> {
        if self.bits.is_empty() {
            return vec![self.name.clone()];
        }

        let mut names: Vec<String> = self.bits.iter().map(|(_, bit)| bit.name().to_owned()).collect();
        names.push(self.negative.name().to_owned());
        names
    }
}
