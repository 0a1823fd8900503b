//! Error handling types
//!
//! One structural error taxonomy for the whole resolution engine. Every
//! variant is fatal to the triggering resolution call; nothing is retried
//! internally. Errors raised deep inside a nested builder are wrapped once
//! with the enclosing service id (`Build`), except errors that are already
//! structural, which pass through unwrapped so the root cause stays visible.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the wirebox service registry
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup by service id with no matching slot
    #[error("No service found for serviceId '{service_id}'")]
    UnknownServiceId {
        /// The id that was requested
        service_id: String,
    },

    /// Type-based single lookup with zero matches
    #[error("Found 0 services for serviceType '{service_type}', expecting 1")]
    UnknownServiceType {
        /// The type that was requested
        service_type: &'static str,
    },

    /// Type-based single lookup with more than one match
    #[error("Found {count} services for serviceType '{service_type}', expecting 1")]
    AmbiguousServiceType {
        /// The type that was requested
        service_type: &'static str,
        /// How many slots declare that type
        count: usize,
    },

    /// Id-based lookup whose resolved value does not satisfy the expected type
    #[error("Incompatible type for serviceId '{service_id}'")]
    TypeMismatch {
        /// The id whose value failed the downcast
        service_id: String,
        /// Names the expected type in the error chain
        #[source]
        source: TypeMismatchDetail,
    },

    /// A service id reappeared in its own in-progress construction chain
    #[error("Circular dependency reference detected [{}]", chain.join(", "))]
    CircularDependency {
        /// The full cycle, ending by repeating the start id
        chain: Vec<String>,
    },

    /// Two mapped-contribution entries for one target resolved to equal keys
    #[error("Duplicate contribution key {key} for serviceId '{service_id}'")]
    DuplicateKey {
        /// The target service the contributions feed
        service_id: String,
        /// Debug rendering of the offending key
        key: String,
    },

    /// The before/after constraint graph for one target contains a cycle
    #[error("Ordering conflict detected [{}]", participants.join(", "))]
    OrderingConflict {
        /// Names participating in the constraint cycle
        participants: Vec<String>,
    },

    /// Structural defect detected while assembling the registry from bindings
    #[error("{message}")]
    Assembly {
        /// Description of the assembly defect
        message: String,
    },

    /// A builder, key/value builder, or decorator failed; wrapped once with
    /// the enclosing service id
    #[error("Error building service '{service_id}'")]
    Build {
        /// The service whose construction failed
        service_id: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Internal invariant violation (poisoned lock, reuse of a failed slot)
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },

    /// Generic string-based error raised by user code
    #[error("{0}")]
    String(String),

    /// Generic error from external sources
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Cause attached to [`Error::TypeMismatch`] naming the type the caller
/// asked for.
#[derive(Error, Debug)]
#[error("expected serviceType '{expected}'")]
pub struct TypeMismatchDetail {
    /// The type the caller expected
    pub expected: &'static str,
}

// Lookup error creation methods
impl Error {
    /// Create an unknown-service-id error
    pub fn unknown_service_id<S: Into<String>>(service_id: S) -> Self {
        Self::UnknownServiceId {
            service_id: service_id.into(),
        }
    }

    /// Create an unknown-service-type error
    pub fn unknown_service_type(service_type: &'static str) -> Self {
        Self::UnknownServiceType { service_type }
    }

    /// Create an ambiguous-service-type error
    pub fn ambiguous_service_type(service_type: &'static str, count: usize) -> Self {
        Self::AmbiguousServiceType {
            service_type,
            count,
        }
    }

    /// Create a type-mismatch error for an id-based lookup
    pub fn type_mismatch<S: Into<String>>(service_id: S, expected: &'static str) -> Self {
        Self::TypeMismatch {
            service_id: service_id.into(),
            source: TypeMismatchDetail { expected },
        }
    }
}

// Structural error creation methods
impl Error {
    /// Create a circular-dependency error from the full cycle chain
    pub fn circular_dependency(chain: Vec<String>) -> Self {
        Self::CircularDependency { chain }
    }

    /// Create a duplicate-contribution-key error
    pub fn duplicate_key<S: Into<String>, K: Into<String>>(service_id: S, key: K) -> Self {
        Self::DuplicateKey {
            service_id: service_id.into(),
            key: key.into(),
        }
    }

    /// Create an ordering-conflict error naming the cycle participants
    pub fn ordering_conflict(participants: Vec<String>) -> Self {
        Self::OrderingConflict { participants }
    }

    /// Create an assembly error
    pub fn assembly<S: Into<String>>(message: S) -> Self {
        Self::Assembly {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl Error {
    /// Whether this error is part of the structural taxonomy.
    ///
    /// Structural errors pass through nested builders unwrapped; only
    /// user-originated errors (`String`, `Other`) get the one-time `Build`
    /// wrap with the enclosing service id.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::String(_) | Self::Other(_))
    }

    /// Apply the wrap-once policy for a failure raised while building
    /// `service_id`.
    pub fn wrap_build<S: Into<String>>(service_id: S, err: Error) -> Error {
        if err.is_structural() {
            err
        } else {
            Error::Build {
                service_id: service_id.into(),
                source: Box::new(err),
            }
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
