//! ddlgen: offline DDL generation for persistence units
//!
//! Builds an isolated execution environment for a persistence unit, merges layered
//! generation settings into one authoritative configuration, and runs schema generation
//! on a dedicated worker that the caller joins.

pub mod api;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod generation;
pub mod invoker;
pub mod logging;
pub mod provider;

pub use api::{DdlGenerator, GenerationReport, GenerationRequest};
pub use error::{DdlError, ProviderError};
pub use generation::{GenerationConfig, GenerationOutcome, PersistenceUnitRef};
pub use invoker::GenerationInvoker;
pub use provider::{MappingProvider, SchemaProvider};
