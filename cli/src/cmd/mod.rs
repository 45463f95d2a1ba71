//! Subcommand implementations

pub mod analyze;
pub mod pairs;
pub mod status;

use log::debug;
use tributary_core::{FlowError, NetworkDescription, NetworkSession};

/// Loads a network description and opens a session over it
///
/// Non-empty `sources`/`sinks` override the terminal sets from the file.
pub fn open_session(
    path: &str,
    max_augmentations: Option<usize>,
    sources: Vec<String>,
    sinks: Vec<String>,
) -> Result<NetworkSession, FlowError> {
    let mut description = NetworkDescription::from_path(path)?;
    if max_augmentations.is_some() {
        description.config.max_augmentations = max_augmentations;
    }
    if !sources.is_empty() {
        description.sources = sources;
    }
    if !sinks.is_empty() {
        description.sinks = sinks;
    }
    debug!(
        "Opening {} with sources {:?} and sinks {:?}",
        path, description.sources, description.sinks
    );
    NetworkSession::from_description(&description)
}
