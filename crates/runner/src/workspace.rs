//! Per-execution scratch directories
//!
//! Each attempt gets a fresh directory under the configured root holding
//! only the staged structure file. The directory is removed when the
//! `Workspace` is dropped, on every exit path.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zeorun_core::{Error, Result, WORKSPACE_DIR_PREFIX};

/// A staged, self-removing working directory
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    input_name: String,
}

impl Workspace {
    /// Create a unique directory under `root` and write `content` to
    /// `input_name` inside it.
    ///
    /// `input_name` must be a plain file name; anything that could resolve
    /// outside the directory is rejected before touching the file system.
    pub async fn stage(root: &Path, content: &[u8], input_name: &str) -> Result<Self> {
        if !is_plain_file_name(input_name) {
            return Err(Error::staging_rejected(
                root.join(input_name),
                "input name must be a plain file name",
            ));
        }

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| Error::staging(root, "create workspace root", e))?;

        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_DIR_PREFIX)
            .tempdir_in(root)
            .map_err(|e| Error::staging(root, "create workspace directory", e))?;

        let input_path = dir.path().join(input_name);
        tokio::fs::write(&input_path, content)
            .await
            .map_err(|e| Error::staging(&input_path, "write structure file", e))?;

        tracing::trace!(
            workspace = %dir.path().display(),
            input = input_name,
            bytes = content.len(),
            "workspace staged"
        );

        Ok(Self {
            dir,
            input_name: input_name.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join(&self.input_name)
    }

    /// Remove the directory now, logging instead of failing if removal does
    /// not succeed. Dropping the workspace removes it silently.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(workspace = %path.display(), error = %e, "failed to remove workspace");
        }
    }
}

/// Whether `name` is a single, normal path component
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return false;
    }
    Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stage_writes_input_and_cleans_up_on_drop() {
        let root = TempDir::new().unwrap();

        let workspace = Workspace::stage(root.path(), b"data_x\n", "structure.cif")
            .await
            .unwrap();
        let dir = workspace.path().to_path_buf();

        assert!(dir.starts_with(root.path()));
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_DIR_PREFIX));
        assert_eq!(std::fs::read(workspace.input_path()).unwrap(), b"data_x\n");
        assert_eq!(workspace.input_name(), "structure.cif");

        drop(workspace);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_close_removes_outputs_too() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::stage(root.path(), b"", "structure.cssr")
            .await
            .unwrap();
        std::fs::write(workspace.path().join("result.res"), b"partial").unwrap();
        let dir = workspace.path().to_path_buf();

        workspace.close();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_concurrent_workspaces_are_distinct() {
        let root = TempDir::new().unwrap();
        let a = Workspace::stage(root.path(), b"a", "structure.cif").await.unwrap();
        let b = Workspace::stage(root.path(), b"b", "structure.cif").await.unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read(b.input_path()).unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_stage_rejects_path_like_names() {
        let root = TempDir::new().unwrap();
        for name in ["", ".", "..", "../escape.cif", "dir/structure.cif", "a\\b.cif"] {
            let result = Workspace::stage(root.path(), b"x", name).await;
            assert!(
                matches!(result, Err(Error::Staging { source: None, .. })),
                "name {name:?} should be rejected"
            );
        }
        // Nothing was created for rejected names
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unusable_root_is_a_staging_error() {
        let temp = TempDir::new().unwrap();
        let file_root = temp.path().join("not-a-dir");
        std::fs::write(&file_root, b"").unwrap();

        let result = Workspace::stage(&file_root, b"x", "structure.cif").await;
        assert!(matches!(result, Err(Error::Staging { source: Some(_), .. })));
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("structure.cif"));
        assert!(is_plain_file_name("result.strinfo"));
        assert!(!is_plain_file_name("/etc/passwd"));
        assert!(!is_plain_file_name("a/b"));
    }
}
