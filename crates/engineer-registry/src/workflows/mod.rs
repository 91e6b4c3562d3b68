//! Reviewer and registrar workflows sharing one error taxonomy and persistence contract.

pub mod error;
pub(crate) mod http;
pub mod registration;
pub mod review;

pub use error::{RepositoryError, WorkflowError};
