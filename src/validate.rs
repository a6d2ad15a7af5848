//! Syntax validation of rendered output

use crate::error::{Error, Result};
use crate::yaml;
use tracing::debug;

/// Check that every document of `text` parses, with aliases resolved across documents
pub fn validate_syntax(text: &str) -> Result<()> {
    debug!("validating final yaml for syntax");
    yaml::load_stream(text, false)
        .map(|_| ())
        .map_err(|e| Error::Validation(e.to_string()))
}
