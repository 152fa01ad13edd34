//! Shared data model for the Galaxy automation crates.
//!
//! These types mirror the JSON documents returned by the Galaxy REST API closely
//! enough to deserialize them directly, while ignoring fields the tooling does not
//! consume. Maps use `IndexMap` so configuration order survives round trips.

pub mod history;
pub mod library;
pub mod workflow;

pub use history::{CollectionRequest, History, HistoryContent, HistoryElement};
pub use library::{DatasetRef, DatasetSource, GalaxyEntity, Library, LibraryEntry};
pub use workflow::{
    InvocationPayload, InvocationRequest, SAMPLE_INPUT_LABEL, SUBWORKFLOW_STEP_TYPE, StepParams, WorkflowDescription,
    WorkflowStep, WorkflowSummary,
};
