//! TransformationContext - the handles a transformation is built from

use std::sync::Arc;

use crate::models::TransformationConfig;
use crate::session::ComputeSession;

/// Compute session and pipeline config shared by the steps of one run
#[derive(Clone)]
pub struct TransformationContext {
    pub session: Arc<dyn ComputeSession>,
    pub config: Arc<TransformationConfig>,
}

impl TransformationContext {
    pub fn new(session: Arc<dyn ComputeSession>, config: Arc<TransformationConfig>) -> Self {
        Self { session, config }
    }
}
