//! Core data models for transparencia
//!
//! Movements and commitment items as parsed from portal documents, plus the
//! fixed-point `Money` type used for every amount.

pub mod commitment;
pub mod money;
pub mod movement;

pub use commitment::CommitmentItem;
pub use money::Money;
pub use movement::{DatasetKind, Dimension, MovementDate, MovementRecord};
