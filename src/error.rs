//! Construction-time validation errors (spec §7).
//!
//! `DomainError` never crosses into the engine's hot path: it is raised by
//! `Body::new` and friends, above the `simulate` boundary. The engine core
//! itself never returns a `Result` (see `engine::Engine::simulate`).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainError {
    #[error("mass must be strictly positive, got {0}")]
    NonPositiveMass(f64),

    #[error("radius must be non-negative, got {0}")]
    NegativeRadius(f64),

    #[error("initial state contains a non-finite component")]
    NonFiniteState,
}
