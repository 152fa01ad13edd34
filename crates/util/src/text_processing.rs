//! Small string helpers for dataset and directory names.

/// Replace every space with an underscore, for names that become file or directory names.
pub fn underscore_spaces(name: &str) -> String {
    name.replace(' ', "_")
}

/// Drop a trailing `.<extension>` from `name` when present.
///
/// Only the exact suffix is removed: `reads.fastqsanger` with extension
/// `fastqsanger` becomes `reads`, while `reads.fq` with extension `bam` is
/// returned unchanged. An empty extension leaves the name as is.
pub fn strip_extension<'a>(name: &'a str, extension: &str) -> &'a str {
    if extension.is_empty() {
        return name;
    }
    name.strip_suffix(extension)
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(name)
}
