use std::sync::{Arc, RwLock};

use drawcast_core::WeightVector;

use crate::error::MonitorError;

/// The live weight vector, shared by every predictor and the reweighting loop.
///
/// Readers always see a complete vector: updates replace it whole under the
/// write lock.
#[derive(Debug, Clone)]
pub struct SharedWeights {
    inner: Arc<RwLock<WeightVector>>,
}

impl SharedWeights {
    pub fn new(weights: WeightVector) -> Self {
        Self {
            inner: Arc::new(RwLock::new(weights)),
        }
    }

    /// Copy of the current vector.
    pub fn snapshot(&self) -> Result<WeightVector, MonitorError> {
        let guard = self
            .inner
            .read()
            .map_err(|e| MonitorError::LockPoisoned(format!("weights read lock: {e}")))?;
        Ok(guard.clone())
    }

    /// Swap in `weights`, returning the vector it replaced.
    pub fn replace(&self, weights: WeightVector) -> Result<WeightVector, MonitorError> {
        weights.validate()?;
        let mut guard = self
            .inner
            .write()
            .map_err(|e| MonitorError::LockPoisoned(format!("weights write lock: {e}")))?;
        Ok(std::mem::replace(&mut *guard, weights))
    }
}

impl Default for SharedWeights {
    fn default() -> Self {
        Self::new(WeightVector::default())
    }
}
