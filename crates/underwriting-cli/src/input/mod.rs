pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a typed input from `--input <file>` or, failing that, piped stdin.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json(path);
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(serde_json::from_value(data)?),
        None => Err(format!("--input <file.json> or stdin required for {what}").into()),
    }
}

/// Like [`load`], but returns the raw JSON value.
pub fn load_value(
    path: Option<&str>,
    what: &str,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json_value(path);
    }
    stdin::read_stdin()?
        .ok_or_else(|| format!("--input <file.json> or stdin required for {what}").into())
}
