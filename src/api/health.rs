//! Liveness probe route table.

use axum::http::Method;

use super::{payload::Payload, RequestHandler};
use crate::error::ApiError;

pub const HEALTH_PATH: &str = "/health";

/// Serves `GET /health` and nothing else.
///
/// The request target is compared verbatim, query string and any absolute-form
/// scheme/authority included, so `/health?verbose`, `/health/` and
/// `http://host/health` are all unknown paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthRoutes;

impl RequestHandler for HealthRoutes {
    fn handle(&self, method: &Method, target: &str) -> Result<Payload, ApiError> {
        if *method != Method::GET {
            return Err(ApiError::MethodNotAllowed);
        }
        if target == HEALTH_PATH {
            Ok(Payload::ok())
        } else {
            Err(ApiError::NotFound)
        }
    }
}
