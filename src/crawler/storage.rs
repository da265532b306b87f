use std::{
    io,
    path::{Component, Path, PathBuf},
};
use tokio::fs;
use tracing::debug;
use url::Url;

/// Storage configuration
#[derive(Debug, Clone)]
struct StorageConfig {
    /// Extension of fetched pages in the workspace
    pub page_extension: String,

    /// Extension of converted artifacts in the output tree
    pub markdown_extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_extension: "html".to_string(),
            markdown_extension: "md".to_string(),
        }
    }
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid URL for storage: {0}")]
    InvalidUrl(String),

    #[error("Path escapes its root: {0}")]
    InvalidPath(PathBuf),
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<StorageError> for crate::error::Error {
    fn from(err: StorageError) -> Self {
        crate::error::Error::Storage(err)
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// File store for the workspace and the markdown output tree
#[derive(Debug, Clone, Default)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_extension(&self) -> &str {
        &self.config.page_extension
    }

    /// Workspace-relative path a fetched page is stored under.
    ///
    /// The path mirrors the URL path: a directory-like URL becomes
    /// `index.html` inside that directory and any other extension is
    /// normalised to the page extension. Pages on a host other than
    /// `base_domain` are nested under a directory named after their host.
    /// Query strings and fragments do not take part.
    pub fn workspace_path_for_url(&self, base_domain: &str, url: &Url) -> Result<PathBuf> {
        let host = url
            .host_str()
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

        let mut path = PathBuf::new();
        if !host.eq_ignore_ascii_case(base_domain) {
            path.push(sanitize_segment(host));
        }

        let mut segments: Vec<String> = url
            .path()
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .map(sanitize_segment)
            .collect();

        let file_name = if url.path().ends_with('/') {
            None
        } else {
            segments.pop()
        };

        for segment in segments {
            path.push(segment);
        }

        let ext = &self.config.page_extension;
        match file_name {
            None => path.push(format!("index.{ext}")),
            Some(name) => {
                let name_path = Path::new(&name);
                match name_path.extension().and_then(|e| e.to_str()) {
                    Some(e) if e.eq_ignore_ascii_case(ext) || e.eq_ignore_ascii_case("htm") => {
                        path.push(name_path.with_extension(ext));
                    }
                    _ => path.push(format!("{name}.{ext}")),
                }
            }
        }

        Ok(path)
    }

    /// Output-relative path of the artifact for a workspace-relative page path
    pub fn markdown_path_for(&self, page_path: &Path) -> PathBuf {
        page_path.with_extension(&self.config.markdown_extension)
    }

    /// Join a relative path onto a root, refusing anything that climbs out.
    pub fn resolve(&self, root: &Path, relative: &Path) -> Result<PathBuf> {
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StorageError::InvalidPath(relative.to_path_buf()));
        }
        Ok(root.join(relative))
    }

    /// Create a directory and all its parents
    pub async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    /// Remove a directory tree.
    ///
    /// A tree that is already gone, wholly or in part, is not an error.
    /// Returns whether anything was there to remove.
    pub async fn remove_dir_all(&self, path: &Path) -> Result<bool> {
        match fs::remove_dir_all(path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !fs::try_exists(path).await.unwrap_or(false) {
                    return Ok(false);
                }
                // An entry vanished mid-walk; what is left gets one more pass.
                match fs::remove_dir_all(path).await {
                    Ok(()) => Ok(true),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
                    Err(e) => Err(StorageError::io(path, e)),
                }
            }
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    /// List every file below `root` with the given extension.
    ///
    /// Paths are relative to `root` and sorted, so callers see the same
    /// order on every run.
    pub async fn list_files(&self, root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| StorageError::io(&dir, e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io(&dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::io(&path, e))?;

                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file()
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
                {
                    if let Ok(relative) = path.strip_prefix(root) {
                        files.push(relative.to_path_buf());
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// Read a text file
    pub async fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await.map_err(|e| StorageError::io(path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write a text file, creating its parent directories
    pub async fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }
        fs::write(path, text)
            .await
            .map_err(|e| StorageError::io(path, e))
    }
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%' | '+' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_path(url: &str) -> PathBuf {
        Storage::new()
            .workspace_path_for_url("example.com", &Url::parse(url).unwrap())
            .unwrap()
    }

    #[test]
    fn test_workspace_path_for_url() {
        assert_eq!(page_path("https://example.com/"), Path::new("index.html"));
        assert_eq!(page_path("https://example.com"), Path::new("index.html"));
        assert_eq!(
            page_path("https://example.com/docs/"),
            Path::new("docs/index.html")
        );
        assert_eq!(
            page_path("https://example.com/docs/intro"),
            Path::new("docs/intro.html")
        );
        assert_eq!(
            page_path("https://example.com/docs/intro.html"),
            Path::new("docs/intro.html")
        );
        assert_eq!(
            page_path("https://example.com/docs/old.htm"),
            Path::new("docs/old.html")
        );
        assert_eq!(
            page_path("https://example.com/api/v1.2"),
            Path::new("api/v1.2.html")
        );
        assert_eq!(
            page_path("https://example.com/docs/intro?lang=en#top"),
            Path::new("docs/intro.html")
        );
    }

    #[test]
    fn test_workspace_path_for_foreign_host() {
        assert_eq!(
            page_path("https://cdn.other.com/docs/a"),
            Path::new("cdn.other.com/docs/a.html")
        );
    }

    #[test]
    fn test_workspace_path_sanitizes_segments() {
        assert_eq!(
            page_path("https://example.com/docs/a:b/c*d"),
            Path::new("docs/a_b/c_d.html")
        );
    }

    #[test]
    fn test_markdown_path_for() {
        let storage = Storage::new();
        assert_eq!(
            storage.markdown_path_for(Path::new("docs/index.html")),
            Path::new("docs/index.md")
        );
        assert_eq!(
            storage.markdown_path_for(Path::new("api/v1.2.html")),
            Path::new("api/v1.2.md")
        );
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let storage = Storage::new();
        let root = Path::new("/tmp/out");
        assert_eq!(
            storage.resolve(root, Path::new("docs/a.md")).unwrap(),
            Path::new("/tmp/out/docs/a.md")
        );
        assert!(matches!(
            storage.resolve(root, Path::new("../a.md")),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.resolve(root, Path::new("/etc/passwd")),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_write_list_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new();

        storage
            .write_text(&dir.path().join("docs/b.html"), "<p>b</p>")
            .await
            .unwrap();
        storage
            .write_text(&dir.path().join("docs/nested/a.html"), "<p>a</p>")
            .await
            .unwrap();
        storage
            .write_text(&dir.path().join("index.html"), "<p>i</p>")
            .await
            .unwrap();
        storage
            .write_text(&dir.path().join("docs/notes.txt"), "ignored")
            .await
            .unwrap();

        let files = storage.list_files(dir.path(), "html").await.unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("docs/b.html"),
                PathBuf::from("docs/nested/a.html"),
                PathBuf::from("index.html"),
            ]
        );

        let text = storage
            .read_text(&dir.path().join("docs/nested/a.html"))
            .await
            .unwrap();
        assert_eq!(text, "<p>a</p>");
    }

    #[tokio::test]
    async fn test_remove_dir_all_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new();
        let workspace = dir.path().join("workspace");

        storage
            .write_text(&workspace.join("a/b/c.html"), "x")
            .await
            .unwrap();
        assert!(storage.remove_dir_all(&workspace).await.unwrap());
        assert!(!workspace.exists());

        assert!(!storage.remove_dir_all(&workspace).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_files_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = Storage::new()
            .list_files(&dir.path().join("missing"), "html")
            .await;
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }
}
