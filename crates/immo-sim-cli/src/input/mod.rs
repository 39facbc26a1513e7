pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a command input: `--input` file first, then piped stdin.
/// `None` means the caller should build the input from flags.
pub fn from_file_or_stdin<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_input(path)?));
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
        None => Ok(None),
    }
}
