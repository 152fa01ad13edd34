//! Configuration for `collect_inputs` runs.
//!
//! Files are YAML. Loading happens in two stages: the document is parsed and
//! interpolated into a [`RawInputsConfig`] whose fields are all optional, then
//! [`RawInputsConfig::validate`] checks required keys and yields an
//! [`InputsConfig`].

mod interpolation;
mod io;
mod model;
mod validation;

pub use interpolation::interpolate;
pub use io::{CONFIG_TEMPLATE, load_inputs_config, load_raw_inputs_config};
pub use model::{InputsConfig, RawInputsConfig, RawSampleConfig, SampleConfig};
