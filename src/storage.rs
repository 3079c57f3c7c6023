use std::io;
use std::path::PathBuf;
use tokio::fs;

/// Directory of uploaded PDFs, addressed by stored filename.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub async fn save(&self, filename: &str, contents: &[u8]) -> io::Result<()> {
        fs::write(self.path_of(filename), contents).await
    }

    pub async fn read(&self, filename: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(filename)).await
    }

    /// Returns `false` when the file was already gone.
    pub async fn remove(&self, filename: &str) -> io::Result<bool> {
        match fs::remove_file(self.path_of(filename)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}
