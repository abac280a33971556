//! YAML syntax validation.

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::error::Result;

/// Checks whether `yml_data`, joined with newlines, is valid YAML.
///
/// Only the syntax is checked: duplicate keys and unknown tags are accepted.
/// Syntax errors (those the parser can pin to a position in the input)
/// yield `Ok(false)`. Any other failure is returned as an error.
///
/// # Errors
///
/// Returns [`crate::Error::YamlParse`] for failures that are not syntax errors.
pub fn valid_yaml<S: AsRef<str>>(yml_data: &[S]) -> Result<bool> {
    let yml_stream = yml_data
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");

    if yml_stream.trim().is_empty() {
        return Ok(true);
    }

    match IgnoredAny::deserialize(serde_yaml::Deserializer::from_str(&yml_stream)) {
        Ok(_) => Ok(true),
        Err(e) if e.location().is_some() => Ok(false),
        Err(e) => Err(e.into()),
    }
}
