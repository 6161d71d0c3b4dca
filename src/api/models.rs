use serde::Serialize;

use crate::observability::MetricsSnapshot;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub known_podcasts: usize,
    pub metrics: MetricsSnapshot,
}
