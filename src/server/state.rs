use std::sync::Arc;

use axum::extract::FromRef;

use crate::pipeline::PipelineManager;

pub type GuardedPipelineManager = Arc<PipelineManager>;

#[derive(Clone)]
pub struct ServerState {
    pub pipeline: GuardedPipelineManager,
}

impl FromRef<ServerState> for GuardedPipelineManager {
    fn from_ref(input: &ServerState) -> Self {
        input.pipeline.clone()
    }
}
