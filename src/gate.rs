//! Availability gate
//!
//! The gate reads the service status once per request, before any protocol
//! adapter runs. There is no caching: a status flip is visible to the very
//! next request.
//!
//! When the status cannot be read the [`GatePolicy`] decides: `strict`
//! surfaces an internal failure, `forgiving` treats the service as
//! unavailable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::Environment;

/// Advertised to clients on every rejection
pub const RETRY_AFTER: Duration = Duration::from_secs(3600);
pub const DEFAULT_REASON: &str = "service is under maintenance";

/// Value stored in the `meta` row `service_status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub in_service: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ServiceStatus {
    pub fn in_service() -> Self {
        Self {
            in_service: true,
            reason: None,
        }
    }

    pub fn maintenance(reason: Option<String>) -> Self {
        Self {
            in_service: false,
            reason,
        }
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Service status unreadable: {0}")]
    Unreadable(String),

    #[error("No service status recorded")]
    Missing,
}

#[async_trait]
pub trait StatusSource: Send + Sync {
    /// `Ok(None)` when no status row exists
    async fn service_status(&self) -> Result<Option<ServiceStatus>, GateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatePolicy {
    Strict,
    Forgiving,
}

impl GatePolicy {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::Strict,
            Environment::Production => Self::Forgiving,
        }
    }
}

#[derive(Debug)]
pub enum Admission {
    Admit,
    Reject {
        reason: String,
        retry_after: Duration,
    },
    Fail(GateError),
}

#[derive(Clone)]
pub struct AvailabilityGate {
    source: Arc<dyn StatusSource>,
    policy: GatePolicy,
}

impl AvailabilityGate {
    pub fn new(source: Arc<dyn StatusSource>, policy: GatePolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> GatePolicy {
        self.policy
    }

    pub async fn check(&self) -> Admission {
        let failure = match self.source.service_status().await {
            Ok(Some(status)) if status.in_service => return Admission::Admit,
            Ok(Some(status)) => {
                let reason = status.reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
                debug!(%reason, "Gate closed");
                return Admission::Reject {
                    reason,
                    retry_after: RETRY_AFTER,
                };
            }
            Ok(None) => GateError::Missing,
            Err(err) => err,
        };

        match self.policy {
            GatePolicy::Strict => {
                error!(error = %failure, "Availability check failed");
                Admission::Fail(failure)
            }
            GatePolicy::Forgiving => {
                warn!(error = %failure, "Availability check failed, treating service as unavailable");
                Admission::Reject {
                    reason: DEFAULT_REASON.to_string(),
                    retry_after: RETRY_AFTER,
                }
            }
        }
    }
}
