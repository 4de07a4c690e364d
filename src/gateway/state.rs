//! Shared axum application state: a handle to the wired `Engine`.

use std::sync::Arc;

use crate::infrastructure::Engine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}
