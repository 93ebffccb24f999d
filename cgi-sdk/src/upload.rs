use {
    crate::{Result, SdkError},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Final segment of a client-supplied file name.
///
/// Browsers on Windows may send a full `C:\...` path, so both separators are
/// honored.
pub fn basename(file_name: &str) -> &str {
    file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name)
}

/// Writes `bytes` unmodified to `dir/basename(file_name)`, creating `dir` if
/// needed and replacing any file already there.
pub fn save_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let name = basename(file_name);
    if matches!(name, "" | "." | "..") {
        return Err(SdkError::EmptyFileName);
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "saved upload");
    Ok(path)
}
