pub mod fight;
pub mod init;
pub mod roll;
pub mod rules;

use std::fs;
use std::path::Path;

/// Read a file, naming it in the error.
fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}
