//! Command handlers -- one module per subcommand

pub mod config;
pub mod deps;
pub mod graph;

use std::path::Path;

use tracing::debug;

/// Resolve a user-supplied target to a store path.
///
/// Symlinks such as `./result` are followed when they exist on disk;
/// anything else is passed to the store as given.
pub fn resolve_target(target: &str) -> String {
    match std::fs::canonicalize(Path::new(target)) {
        Ok(path) => {
            let resolved = path.display().to_string();
            if resolved != target {
                debug!(target_path = %target, resolved = %resolved, "resolved target path");
            }
            resolved
        }
        Err(_) => target.to_owned(),
    }
}
