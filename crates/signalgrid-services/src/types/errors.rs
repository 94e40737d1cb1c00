// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Service layer error types.

Transport-agnostic errors that adapters can map to HTTP status codes or
feed replies.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use signalgrid_state_manager::StateError;
use thiserror::Error;

/// Service layer errors (transport-agnostic)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Invalid input parameters (400 in HTTP)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// More than one control command in a single request (400 in HTTP)
    #[error("Conflicting commands in one request: {0}")]
    ConflictingCommands(String),

    /// Durable state could not be written (503 in HTTP)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal service error (500 in HTTP)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

// ============================================================================
// ERROR CONVERSIONS FROM BACKEND
// ============================================================================

impl From<StateError> for ServiceError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::InvalidLane(_) | StateError::InvalidJunctionName(_) => {
                ServiceError::InvalidInput(err.to_string())
            }
            StateError::Io(_) | StateError::Persistence { .. } | StateError::Serialization(_) => {
                ServiceError::Storage(err.to_string())
            }
            StateError::InvariantViolation { .. } => ServiceError::Internal(err.to_string()),
        }
    }
}
