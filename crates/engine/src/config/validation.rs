use crate::error::{GalaxyError, Result};

use super::model::{InputsConfig, RawInputsConfig, RawSampleConfig, SampleConfig};

impl RawInputsConfig {
    /// Check required keys in a fixed order and fail on the first one that is absent or empty.
    pub fn validate(self) -> Result<InputsConfig> {
        let galaxy_url = required_text(self.galaxy_url, "galaxy_url")?;
        let common_inputs = self
            .common_inputs
            .filter(|inputs| !inputs.is_empty())
            .ok_or_else(|| GalaxyError::missing_config_key("common_inputs"))?;
        let workflow = required_text(self.workflow, "workflow")?;
        let library_folder = required_text(self.library_folder, "library_folder")?;
        let sample = self
            .sample
            .filter(|sample| !sample.is_empty())
            .ok_or_else(|| GalaxyError::missing_config_key("sample"))?
            .validate()?;

        Ok(InputsConfig {
            galaxy_url,
            common_inputs,
            workflow,
            library_folder,
            sample,
            workflow_params: self.workflow_params.unwrap_or_default(),
            replacement_params: self.replacement_params.unwrap_or_default(),
        })
    }
}

impl RawSampleConfig {
    fn validate(self) -> Result<SampleConfig> {
        Ok(SampleConfig {
            name: required_text(self.name, "sample.name")?,
            // An empty list is accepted here and reported when no dataset can be built from it.
            files: self.files.ok_or_else(|| GalaxyError::missing_config_key("sample.files"))?,
            filetype: required_text(self.filetype, "sample.filetype")?,
        })
    }
}

fn required_text(value: Option<String>, key: &str) -> Result<String> {
    value
        .filter(|text| !text.is_empty())
        .ok_or_else(|| GalaxyError::missing_config_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(yaml: &str) -> RawInputsConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    const COMPLETE: &str = r#"
galaxy_url: https://galaxy.example.org
common_inputs:
  REF: refs/hg38/genome.fa
workflow: align
library_folder: runs/s1
sample:
  name: s1
  filetype: fastqsanger
  files: [/data/s1_R1.fq]
"#;

    fn missing_key(yaml: &str) -> String {
        match raw(yaml).validate() {
            Err(GalaxyError::MissingConfigKey { key }) => key,
            other => panic!("expected a missing key, got {other:?}"),
        }
    }

    #[test]
    fn complete_config_validates() {
        let config = raw(COMPLETE).validate().unwrap();
        assert_eq!(config.workflow, "align");
        assert_eq!(config.sample.files.len(), 1);
        assert!(config.workflow_params.is_empty());
        assert!(config.replacement_params.is_empty());
    }

    #[test]
    fn required_keys_are_checked_in_order() {
        assert_eq!(missing_key("workflow: align"), "galaxy_url");
        assert_eq!(missing_key("galaxy_url: http://localhost\ncommon_inputs: {}"), "common_inputs");
        assert_eq!(
            missing_key(&COMPLETE.replace("library_folder: runs/s1", "library_folder: ''")),
            "library_folder"
        );
    }

    #[test]
    fn empty_sample_counts_as_missing() {
        let yaml = COMPLETE.split("sample:").next().unwrap().to_string() + "sample: {}\n";
        assert_eq!(missing_key(&yaml), "sample");
    }

    #[test]
    fn sample_fields_are_required() {
        let yaml = COMPLETE.replace("  filetype: fastqsanger\n", "");
        assert_eq!(missing_key(&yaml), "sample.filetype");
    }

    #[test]
    fn missing_key_message_names_the_key() {
        let err = raw("galaxy_url: http://localhost").validate().unwrap_err();
        assert_eq!(err.to_string(), "missing \"common_inputs\" in the config");
    }
}
