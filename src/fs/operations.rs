use std::path::{Path, PathBuf};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncWriteExt},
};

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces contents of `path` with `contents`. Data is written into a sibling temporary file
/// first and then renamed over the target, so a failed write leaves the old file intact.
pub async fn replace_file(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temporary = temporary_path(path);

    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temporary)
        .await?;
    file.lock_exclusive()?;
    let written = async {
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;
    file.unlock_async().await?;
    drop(file);

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&temporary).await;
        return Err(e);
    }
    tokio::fs::rename(&temporary, path).await
}

/// Reads the whole file under a shared lock. Returns `None` when the file doesn't exist.
pub async fn read_locked(path: &Path) -> Result<Option<String>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;
    let mut contents = String::new();
    let read = file.read_to_string(&mut contents).await;
    file.unlock_async().await?;
    read?;
    Ok(Some(contents))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{read_locked, replace_file, temporary_path};

    #[tokio::test]
    async fn test_replace_file_creates_and_overwrites() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("data.json");

        replace_file(&path, b"first").await?;
        assert_eq!(read_locked(&path).await?.as_deref(), Some("first"));

        replace_file(&path, b"second").await?;
        assert_eq!(read_locked(&path).await?.as_deref(), Some("second"));

        assert!(!temporary_path(&path).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_locked(&dir.path().join("missing")).await?, None);
        Ok(())
    }

    #[test]
    fn test_temporary_path_is_sibling() {
        let path = std::path::Path::new("/tmp/state/screentime.json");
        assert_eq!(
            temporary_path(path),
            std::path::Path::new("/tmp/state/screentime.json.tmp")
        );
    }
}
