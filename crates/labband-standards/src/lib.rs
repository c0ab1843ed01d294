#![deny(unsafe_code)]

pub mod error;
pub mod hash;
pub mod manifest;
pub mod paths;
pub mod ranges;
pub mod registry;
pub mod sections;

pub use crate::error::StandardsError;
pub use crate::paths::{REFERENCE_ENV_VAR, reference_root};
pub use crate::registry::{ReferenceRegistry, ReferenceSummary};
