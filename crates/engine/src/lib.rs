//! # glxy engine
//!
//! Automation over a Galaxy server: filesystem-style paths into data libraries,
//! sample upload, workflow parameter binding and invocation, and collection of
//! finished outputs.
//!
//! ## Usage
//!
//! ```rust
//! use glxy_engine::{InMemoryGalaxy, get_path, make_path};
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! runtime.block_on(async {
//!     let galaxy = InMemoryGalaxy::new();
//!     make_path(&galaxy, "Reference Genomes/hg38/bwa").await?;
//!     let folder = get_path(&galaxy, "Reference Genomes/hg38/bwa").await?;
//!     assert_eq!(folder.map(|entity| entity.name().to_string()), Some("/hg38/bwa".to_string()));
//!     Ok::<(), glxy_engine::GalaxyError>(())
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`remote`**: the [`GalaxyApi`] capability trait, its HTTP client and an in-memory stand-in
//! - **`library_fs`**: path resolution and idempotent path creation
//! - **`binder`**: maps configured inputs and parameters onto workflow steps
//! - **`config`**: YAML loading, `{key}` interpolation and validation
//! - **`collect_inputs`** / **`collect_outputs`**: the two end-to-end runs

pub mod binder;
pub mod collect_inputs;
pub mod collect_outputs;
pub mod config;
pub mod error;
pub mod history;
pub mod library_fs;
pub mod remote;
pub mod upload;
pub mod workflows;

pub use binder::WorkflowBinder;
pub use collect_inputs::{collect_inputs, collect_inputs_from_file};
pub use collect_outputs::{
    CollectedOutputs, DEFAULT_API_KEY_FILE, DEFAULT_GALAXY_URL, KNOWN_WORKFLOWS, OutputRequest, collect_outputs, resolve_output_api_key,
};
pub use config::{CONFIG_TEMPLATE, InputsConfig, RawInputsConfig, SampleConfig, load_inputs_config};
pub use error::{GalaxyError, Result};
pub use glxy_types::GalaxyEntity;
pub use library_fs::{get_path, make_path};
pub use remote::{GalaxyApi, HttpGalaxyApi, InMemoryGalaxy, ServerUpload};
pub use workflows::{ResolvedWorkflow, get_workflow_description};
