// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the service layer.

use alfio::CoreError;
use alfio_domain::DomainError;
use alfio_persistence::PersistenceError;
use thiserror::Error;

/// Errors returned by the managers.
///
/// Business failures keep their [`CoreError`]; storage failures are
/// collapsed into a generic error so that database details never reach
/// callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// The store failed.
    #[error("Internal error")]
    Persistence(#[source] PersistenceError),
    /// A payment provider could not perform a server-side operation.
    #[error("Payment provider '{provider}' failed: {message}")]
    Provider {
        /// The provider id.
        provider: String,
        /// What the provider reported.
        message: String,
    },
}

impl ServiceError {
    /// Stable code exposed to callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Core(err) => err.error_code(),
            Self::Persistence(_) => "GENERIC_ERROR",
            Self::Provider { .. } => "PAYMENT_PROVIDER_ERROR",
        }
    }

    /// Whether the error is a business rule rather than an infrastructure fault.
    #[must_use]
    pub const fn is_business(&self) -> bool {
        matches!(self, Self::Core(_))
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity, id } => Self::Core(CoreError::NotFound { entity, id }),
            other => {
                tracing::error!(error = %other, "Persistence failure");
                Self::Persistence(other)
            }
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Core(CoreError::DomainViolation(err))
    }
}
