use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::ParamLib;

use super::{BoolParam, FloatParam};

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32
}

impl Vector2 {
    pub fn new(x: f32, y: f32) -> Vector2 {
        Vector2 { x, y }
    }
}

impl From<(f32, f32)> for Vector2 {
    fn from((x, y): (f32, f32)) -> Self {
        Vector2 { x, y }
    }
}

/// Two float parameters driven as one vector. Each axis resolves on its own.
pub struct XYParam {
    pub x: FloatParam,
    pub y: FloatParam
}

impl XYParam {
    pub fn new(lib: &Arc<ParamLib>, x_name: &str, y_name: &str, prioritised: bool) -> XYParam {
        XYParam {
            x: FloatParam::new(lib, x_name, prioritised),
            y: FloatParam::new(lib, y_name, prioritised)
        }
    }

    pub fn from_params(x: FloatParam, y: FloatParam) -> XYParam {
        XYParam { x, y }
    }

    pub fn set(&mut self, value: impl Into<Vector2>) {
        let value = value.into();
        self.x.set(value.x);
        self.y.set(value.y);
    }

    pub fn get(&self) -> Vector2 {
        Vector2::new(self.x.get(), self.y.get())
    }

    pub fn resolve(&mut self) {
        self.x.resolve();
        self.y.resolve();
    }

    pub fn invalidate(&mut self) {
        self.x.invalidate();
        self.y.invalidate();
    }
}

/// Four bool parameters that always carry the same value.
pub struct QuadParam {
    pub q1: BoolParam,
    pub q2: BoolParam,
    pub q3: BoolParam,
    pub q4: BoolParam
}

impl QuadParam {
    pub fn new(lib: &Arc<ParamLib>, names: [&str; 4]) -> QuadParam {
        let [q1, q2, q3, q4] = names.map(|name| BoolParam::new(lib, name));
        QuadParam { q1, q2, q3, q4 }
    }

    pub fn from_params(q1: BoolParam, q2: BoolParam, q3: BoolParam, q4: BoolParam) -> QuadParam {
        QuadParam { q1, q2, q3, q4 }
    }

    fn params_mut(&mut self) -> [&mut BoolParam; 4] {
        [&mut self.q1, &mut self.q2, &mut self.q3, &mut self.q4]
    }

    pub fn set(&mut self, value: bool) {
        for param in self.params_mut() {
            param.set(value);
        }
    }

    pub fn get(&self) -> [bool; 4] {
        [self.q1.get(), self.q2.get(), self.q3.get(), self.q4.get()]
    }

    pub fn resolve(&mut self) {
        for param in self.params_mut() {
            param.resolve();
        }
    }

    pub fn invalidate(&mut self) {
        for param in self.params_mut() {
            param.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::oracle::{MemoryOracle, ParamKind};

    use super::*;

    #[test]
    fn xy_resolves_axes_independently() {
        let oracle = Arc::new(MemoryOracle::with_params([("EyesX", ParamKind::Float)]));
        let lib = ParamLib::new(oracle.clone());
        let mut eyes = XYParam::new(&lib, "EyesX", "EyesY", false);

        assert!(eyes.x.is_resolved());
        assert!(!eyes.y.is_resolved());

        eyes.set((0.5, -0.5));
        assert_eq!(eyes.get(), Vector2::new(0.5, 0.0));
        assert_eq!(oracle.value_of("EyesX"), Some(0.5));
    }

    #[test]
    fn xy_invalidate_clears_both() {
        let oracle = Arc::new(MemoryOracle::with_params([("EyesX", ParamKind::Float), ("EyesY", ParamKind::Float)]));
        let lib = ParamLib::new(oracle.clone());
        let mut eyes = XYParam::new(&lib, "EyesX", "EyesY", true);
        assert_eq!(lib.scheduler().len(), 2);

        eyes.invalidate();
        assert!(!eyes.x.is_resolved() && !eyes.y.is_resolved());
        assert!(lib.scheduler().is_empty());

        eyes.resolve();
        assert!(eyes.x.is_resolved() && eyes.y.is_resolved());
    }

    #[test]
    fn quad_writes_same_value_everywhere() {
        let oracle = Arc::new(MemoryOracle::with_params([
            ("Q1", ParamKind::Bool),
            ("Q2", ParamKind::Bool),
            ("Q4", ParamKind::Bool)
        ]));
        let lib = ParamLib::new(oracle.clone());
        let mut quad = QuadParam::new(&lib, ["Q1", "Q2", "Q3", "Q4"]);

        quad.set(true);
        assert_eq!(quad.get(), [true, true, false, true]);
        assert_eq!(oracle.value_of("Q4"), Some(1.0));
        assert_eq!(oracle.write_count(), 3);
    }
}
