//! Shared application state for the HTTP adapter

use crate::engine::HotnessEngine;
use std::sync::Arc;

/// State handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<HotnessEngine>,
}

impl AppState {
    pub fn new(engine: Arc<HotnessEngine>) -> Self {
        Self { engine }
    }
}
