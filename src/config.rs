use std::path::{Path, PathBuf};

use crate::error::{AdapterError, Result};

/// Model artifact shipped next to the executable.
pub const MODEL_FILE_NAME: &str = "lightgbm_model.txt";

/// Directory the running executable lives in, independent of the caller's CWD.
pub fn install_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(AdapterError::InstallDir)?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        AdapterError::InstallDir(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} has no parent directory", exe.display()),
        ))
    })
}

pub fn model_path_in(dir: &Path) -> PathBuf {
    dir.join(MODEL_FILE_NAME)
}

pub fn resolve_model_path() -> Result<PathBuf> {
    Ok(model_path_in(&install_dir()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_sits_next_to_executable() {
        let path = resolve_model_path().unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(path.parent(), exe.parent());
        assert_eq!(path.file_name().unwrap(), MODEL_FILE_NAME);
        assert!(path.is_absolute());
    }
}
