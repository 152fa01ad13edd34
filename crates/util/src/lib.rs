use once_cell::sync::Lazy;
use regex::Regex;

pub mod http;
mod path_processing;
mod text_processing;

pub use path_processing::expand_tilde;
pub use text_processing::{strip_extension, underscore_spaces};

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(x-api-key: )([\w\-\.=:/+]+)",
        r"(?i)([A-Z0-9_]*?(KEY|TOKEN|SECRET|PASSWORD)=)([^\s&]+)",
        r"(?i)([?&]key=)([^\s&]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("secret pattern should compile"))
    .collect()
});

/// Redacts values that look like secrets in a string.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for re in SECRET_PATTERNS.iter() {
        redacted = re
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_api_key_header_and_assignments() {
        assert_eq!(redact_sensitive("x-api-key: abc123"), "x-api-key: <redacted>");
        assert_eq!(redact_sensitive("GALAXY_API_KEY=deadbeef"), "GALAXY_API_KEY=<redacted>");
        assert_eq!(
            redact_sensitive("https://galaxy.example.org/api/histories?key=deadbeef&deleted=false"),
            "https://galaxy.example.org/api/histories?key=<redacted>&deleted=false"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_sensitive("creating folder: refs/hg38"), "creating folder: refs/hg38");
    }
}
