//! Compile-time registry of zone catalogs.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a new city requires creating a TOML file in `zones/` and adding
//! a corresponding entry here.

use butterfly_zone_models::ZoneRegistryFile;

use crate::ZoneError;

/// Registry used when the configuration does not name one.
pub const DEFAULT_REGISTRY: &str = "lisbon";

/// Number of registered zone catalogs. Enforced by a test.
#[cfg(test)]
const EXPECTED_REGISTRY_COUNT: usize = 1;

/// Embedded TOML zone definitions.
const REGISTRY_TOMLS: &[(&str, &str)] = &[("lisbon", include_str!("../zones/lisbon.toml"))];

/// Parses a zone registry file from TOML text.
///
/// # Errors
///
/// Returns [`ZoneError::Toml`] if the text is not a valid registry file.
pub fn parse_registry(toml_str: &str) -> Result<ZoneRegistryFile, ZoneError> {
    Ok(toml::de::from_str(toml_str)?)
}

/// Returns all embedded zone registries.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the tests below.
#[must_use]
pub fn all_registries() -> Vec<ZoneRegistryFile> {
    REGISTRY_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            parse_registry(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse zone registry '{name}': {e}"))
        })
        .collect()
}

/// Looks up an embedded registry by ID.
#[must_use]
pub fn find_registry(id: &str) -> Option<ZoneRegistryFile> {
    all_registries().into_iter().find(|r| r.id == id)
}
