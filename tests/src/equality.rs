use parking_lot::Mutex;
use std::sync::Arc;
use surrogate_kernel::{Equality, ObjectRef, Value};

/// A mock equality strategy
///
/// Answers every comparison with a fixed verdict and records each value it
/// was asked to compare against.
#[derive(Clone, Default)]
pub struct RecordingEquality {
    verdict: bool,
    /// Every `other` argument seen, in call order
    pub call_history: Arc<Mutex<Vec<Value>>>,
}

impl RecordingEquality {
    pub fn answering(verdict: bool) -> Self {
        Self {
            verdict,
            call_history: Arc::default(),
        }
    }

    pub fn history(&self) -> Vec<Value> {
        self.call_history.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_history.lock().len()
    }
}

impl Equality for RecordingEquality {
    fn equals(&self, _receiver: &ObjectRef, other: &Value) -> bool {
        self.call_history.lock().push(other.clone());
        self.verdict
    }
}
