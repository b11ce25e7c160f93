//! Placeholder webhook settings for a `.env` file.

use std::path::Path;

use thiserror::Error;

pub const WEBHOOK_URL_PLACEHOLDER: &str =
    "WEBHOOK_URL=\"http://your-webhook-receiver.com/endpoint\"";
pub const WEBHOOK_SECRET_PLACEHOLDER: &str =
    "WEBHOOK_SECRET=\"your_secret_key_for_verification\"";

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("{0} file not found!")]
    Missing(String),

    #[error("Failed to update {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which placeholders were appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvUpdate {
    pub added_url: bool,
    pub added_secret: bool,
}

impl EnvUpdate {
    pub fn changed(&self) -> bool {
        self.added_url || self.added_secret
    }
}

/// Append `WEBHOOK_URL` / `WEBHOOK_SECRET` placeholders that are not already set.
///
/// Existing values are never touched. The file must already exist.
pub fn add_webhook_placeholders(path: &Path) -> Result<EnvUpdate, EnvFileError> {
    if !path.is_file() {
        return Err(EnvFileError::Missing(path.display().to_string()));
    }
    let io_err = |source| EnvFileError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut content = std::fs::read_to_string(path).map_err(io_err)?;
    let mut update = EnvUpdate::default();

    if !content.contains("WEBHOOK_URL=") {
        content.push('\n');
        content.push_str(WEBHOOK_URL_PLACEHOLDER);
        update.added_url = true;
    }
    if !content.contains("WEBHOOK_SECRET=") {
        content.push('\n');
        content.push_str(WEBHOOK_SECRET_PLACEHOLDER);
        update.added_secret = true;
    }

    if update.changed() {
        std::fs::write(path, content).map_err(io_err)?;
    }
    Ok(update)
}
