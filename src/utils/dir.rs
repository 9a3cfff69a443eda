use std::{env, io, path::PathBuf};

use anyhow::{anyhow, Result};

const APPLICATION_DIR_NAME: &str = "screentime";

fn platform_state_dir() -> Result<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            env::var("APPDATA")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("APPDATA should be present on Windows"))
        } else {
            env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))
        }
    }
}

/// Creates the application directory when needed. `dir` overrides the platform default.
pub fn resolve_application_path(dir: Option<PathBuf>) -> Result<PathBuf> {
    let path = match dir {
        Some(dir) => dir,
        None => platform_state_dir()?.join(APPLICATION_DIR_NAME),
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::resolve_application_path;

    #[test]
    fn test_explicit_dir_is_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let resolved = resolve_application_path(Some(nested.clone())).unwrap();
        assert_eq!(resolved, nested);
        assert!(nested.is_dir());
        // A second call finds it in place.
        assert_eq!(resolve_application_path(Some(nested.clone())).unwrap(), nested);
    }
}
