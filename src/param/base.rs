use std::{ops::Deref, sync::Arc};

use crate::{core::{priority::PriorityTask, ParamLib}, oracle::{ParamDescriptor, ParamKind}};

/// Local proxy for one named host parameter.
///
/// The index is only trusted between a successful [`resolve`](Self::resolve)
/// and the next [`invalidate`](Self::invalidate). While unresolved, writes are
/// dropped without touching the host.
pub struct BaseParam {
    lib: Arc<ParamLib>,
    name: String,
    kind: ParamKind,
    index: Option<i32>,
    descriptor: Option<ParamDescriptor>,
    value: f64
}

impl BaseParam {
    pub fn new(lib: &Arc<ParamLib>, name: impl Into<String>, kind: ParamKind) -> BaseParam {
        let mut param = Self::new_unresolved(lib, name, kind);
        param.resolve();
        param
    }

    pub fn new_unresolved(lib: &Arc<ParamLib>, name: impl Into<String>, kind: ParamKind) -> BaseParam {
        BaseParam {
            lib: lib.clone(),
            name: name.into(),
            kind,
            index: None,
            descriptor: None,
            value: 0.0
        }
    }

    /// Looks the parameter up again. Returns whether it resolved.
    pub fn resolve(&mut self) -> bool {
        match self.lib.find_param(&self.name, self.kind) {
            Some((index, descriptor)) => {
                self.index = Some(index);
                self.descriptor = Some(descriptor);
                true
            }
            None => {
                debug!("{} parameter {} not found", self.kind, self.name);
                self.index = None;
                self.descriptor = None;
                false
            }
        }
    }

    /// Forgets the index without asking the host anything.
    pub fn invalidate(&mut self) {
        self.index = None;
    }

    /// Sends `value` to the host. The cached value only follows if the host accepted it.
    pub fn write(&mut self, value: f64) -> bool {
        let Some(index) = self.index else {
            return false;
        };

        if self.lib.set_parameter(index, value as f32) {
            self.value = value;
            true
        }
        else {
            false
        }
    }

    pub fn read(&self) -> f64 {
        self.value
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn index(&self) -> Option<i32> {
        self.index
    }

    pub fn is_resolved(&self) -> bool {
        self.index.is_some()
    }

    pub fn descriptor(&self) -> Option<&ParamDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn default_value(&self) -> Option<f64> {
        self.index?;
        self.descriptor.as_ref().map(|d| d.default_value)
    }

    pub(crate) fn lib(&self) -> &Arc<ParamLib> {
        &self.lib
    }
}

macro_rules! typed_param {
    ($name:ident, $kind:expr, $value:ty, |$get:ident| $from:expr, |$set:ident| $to:expr) => {
        pub struct $name {
            base: BaseParam
        }

        impl $name {
            pub fn new(lib: &Arc<ParamLib>, name: impl Into<String>) -> $name {
                $name { base: BaseParam::new(lib, name, $kind) }
            }

            pub fn new_unresolved(lib: &Arc<ParamLib>, name: impl Into<String>) -> $name {
                $name { base: BaseParam::new_unresolved(lib, name, $kind) }
            }

            pub fn resolve(&mut self) -> bool {
                self.base.resolve()
            }

            pub fn invalidate(&mut self) {
                self.base.invalidate();
            }

            pub fn get(&self) -> $value {
                let $get = self.base.read();
                $from
            }

            pub fn set(&mut self, $set: $value) -> bool {
                self.base.write($to)
            }
        }

        impl Deref for $name {
            type Target = BaseParam;

            fn deref(&self) -> &BaseParam {
                &self.base
            }
        }
    };
}

typed_param!(BoolParam, ParamKind::Bool, bool, |v| v != 0.0, |value| if value { 1.0 } else { 0.0 });
typed_param!(IntParam, ParamKind::Int, i32, |v| v as i32, |value| value as f64);

/// Float parameter, optionally competing for a slot in the host's priority queue.
pub struct FloatParam {
    base: BaseParam,
    priority: Option<PriorityTask>
}

impl FloatParam {
    pub fn new(lib: &Arc<ParamLib>, name: impl Into<String>, prioritised: bool) -> FloatParam {
        let mut param = Self::new_unresolved(lib, name, prioritised);
        param.resolve();
        param
    }

    pub fn new_unresolved(lib: &Arc<ParamLib>, name: impl Into<String>, prioritised: bool) -> FloatParam {
        let priority = prioritised.then(|| lib.scheduler().register());
        FloatParam {
            base: BaseParam::new_unresolved(lib, name, ParamKind::Float),
            priority
        }
    }

    pub fn resolve(&mut self) -> bool {
        let resolved = self.base.resolve();

        if let Some(task) = &self.priority {
            let lib = self.base.lib();
            match self.base.index() {
                Some(index) => {
                    if lib.scheduler().admit(task.id(), index) {
                        lib.prioritize_parameter(index);
                    }
                }
                None => lib.scheduler().release(task.id())
            }
        }

        resolved
    }

    pub fn invalidate(&mut self) {
        self.base.invalidate();
        if let Some(task) = &self.priority {
            self.base.lib().scheduler().release(task.id());
        }
    }

    pub fn get(&self) -> f32 {
        self.base.read() as f32
    }

    pub fn set(&mut self, value: f32) -> bool {
        self.base.write(value as f64)
    }

    pub fn wants_priority(&self) -> bool {
        self.priority.is_some()
    }

    /// Whether this parameter currently holds a priority slot.
    pub fn is_prioritised(&self) -> bool {
        self.priority.as_ref()
            .map(|task| self.base.lib().scheduler().is_member(task.id()))
            .unwrap_or(false)
    }
}

impl Deref for FloatParam {
    type Target = BaseParam;

    fn deref(&self) -> &BaseParam {
        &self.base
    }
}
