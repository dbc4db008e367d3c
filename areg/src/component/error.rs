//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Component error types.

use crate::dispatcher::DispatchError;
use crate::stub::StubError;
use std::fmt;

/// Errors raised while loading, registering or unloading components.
#[derive(Debug)]
pub enum ComponentError {
    /// The address has an empty or reserved role, or an invalid thread.
    InvalidAddress {
        /// Path form of the rejected address
        address: String,
    },

    /// A component with the same role name is already registered.
    DuplicateRole {
        /// The duplicated role
        role: String,
    },

    /// The component factory returned an error.
    FactoryFailed {
        /// Role of the component being created
        role: String,
        /// Error reported by the factory
        reason: String,
    },

    /// No component with the role name is registered.
    NotFound {
        /// The role that was looked up
        role: String,
    },

    /// A worker or owner thread could not be started.
    Dispatch(DispatchError),

    /// A provided service could not be started.
    Stub(StubError),
}

impl ComponentError {
    /// Returns `true` if retrying later may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Dispatch(e) => e.is_recoverable(),
            Self::Stub(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress { address } => write!(f, "Invalid component address {}", address),
            Self::DuplicateRole { role } => {
                write!(f, "Component with role {} is already registered", role)
            }
            Self::FactoryFailed { role, reason } => {
                write!(f, "Factory of component {} failed: {}", role, reason)
            }
            Self::NotFound { role } => write!(f, "Component {} not found", role),
            Self::Dispatch(e) => write!(f, "Component thread failure: {}", e),
            Self::Stub(e) => write!(f, "Component service failure: {}", e),
        }
    }
}

impl std::error::Error for ComponentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dispatch(e) => Some(e),
            Self::Stub(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DispatchError> for ComponentError {
    fn from(error: DispatchError) -> Self {
        Self::Dispatch(error)
    }
}

impl From<StubError> for ComponentError {
    fn from(error: StubError) -> Self {
        Self::Stub(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_recoverability() {
        let error = ComponentError::DuplicateRole {
            role: "Calc".to_string(),
        };
        assert_eq!(error.to_string(), "Component with role Calc is already registered");
        assert!(!error.is_recoverable());

        let error = ComponentError::NotFound {
            role: "Calc".to_string(),
        };
        assert!(error.is_recoverable());
    }
}
