#![forbid(unsafe_code)]

//! Write-to-temp-then-rename, the commit point for every whole-file rewrite
//! in this workspace (§5, §9 "Scoped acquisition").

use crate::error::CoreError;
use std::path::Path;

/// Write `contents` to `path` by writing a sibling `<name>.tmp-<pid>` file
/// and renaming it over `path`. The rename is the commit point: callers
/// that see `Ok(())` can rely on `path` containing either the old content
/// or the new content in full, never a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(CoreError::InvalidInput("path must have a file name"))?;
    let tmp_path = parent.join(format!(".{file_name}.tmp-{}", std::process::id()));

    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn write_atomic_creates_parent_dirs_and_content() {
        let dir = std::env::temp_dir().join(format!(
            "lore_core_atomic_test_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let path = dir.join("nested").join("file.txt");

        write_atomic(&path, b"hello").expect("write");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

        write_atomic(&path, b"world").expect("overwrite");
        assert_eq!(fs::read_to_string(&path).unwrap(), "world");

        let _ = fs::remove_dir_all(&dir);
    }
}
