use semver::Version;

use crate::version::error::FormatError;

/// Extract the patch counter from a version this system generated itself.
///
/// Only the exact `MAJOR.MINOR.PATCH` shape is accepted: leading zeros,
/// pre-release tags, build metadata and partial versions are rejected.
///
/// Examples:
/// - "1.2.3" -> 3
/// - "2.0.9" -> 9
pub fn version_number_from_semver(version: &str) -> Result<u64, FormatError> {
    let parsed = Version::parse(version).map_err(|_| FormatError(version.to_string()))?;

    if !parsed.pre.is_empty() || !parsed.build.is_empty() {
        return Err(FormatError(version.to_string()));
    }

    Ok(parsed.patch)
}
