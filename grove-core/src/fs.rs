use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

/// Minimal, async-capable filesystem abstraction used by the engine.
///
/// Directory listings are scoped resources: each handle is opened, consumed,
/// and released before the next one is opened.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Check whether a path exists.
    async fn path_exists(&self, path: &Path) -> bool;

    /// Open a directory for iteration.
    async fn read_dir(&self, path: &Path) -> io::Result<Box<dyn ReadDirStream + Send>>;

    /// Fetch lightweight file metadata.
    async fn metadata(&self, path: &Path) -> io::Result<FsMetadata>;

    /// Read a small text file wholesale (identity markers).
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Create or overwrite a file with the given bytes.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Lightweight metadata needed by the engine.
#[derive(Debug, Clone, Copy)]
pub struct FsMetadata {
    pub is_dir: bool,
    pub is_file: bool,
    pub len: u64,
    /// Last modified time if available
    pub modified: Option<SystemTime>,
}

/// Async directory iterator (similar to tokio::fs::ReadDir).
#[async_trait]
pub trait ReadDirStream {
    /// Return next entry's path, or None when exhausted.
    async fn next_entry(&mut self) -> io::Result<Option<PathBuf>>;
}

/// Real filesystem implementation backed by tokio::fs.
#[derive(Debug, Default)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for RealFs {
    async fn path_exists(&self, path: &Path) -> bool {
        // try_exists avoids errors for permission issues by returning false
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Box<dyn ReadDirStream + Send>> {
        let rd = tokio::fs::read_dir(path).await?;
        Ok(Box::new(RealReadDir { inner: rd }))
    }

    async fn metadata(&self, path: &Path) -> io::Result<FsMetadata> {
        let md = tokio::fs::metadata(path).await?;
        Ok(FsMetadata {
            is_dir: md.is_dir(),
            is_file: md.is_file(),
            len: md.len(),
            modified: md.modified().ok(),
        })
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }
}

struct RealReadDir {
    inner: tokio::fs::ReadDir,
}

#[async_trait]
impl ReadDirStream for RealReadDir {
    async fn next_entry(&mut self) -> io::Result<Option<PathBuf>> {
        Ok(self.inner.next_entry().await?.map(|entry| entry.path()))
    }
}

/// In-memory filesystem for tests.
///
/// Paths are treated literally; callers should use consistent absolute
/// paths. Mutation helpers take `&self` so a tree already shared with the
/// engine can be edited between runs.
#[derive(Default)]
pub struct InMemoryFs {
    nodes: RwLock<HashMap<PathBuf, Node>>,
}

#[derive(Clone)]
enum Node {
    Dir {
        children: Vec<PathBuf>,
        modified: SystemTime,
    },
    File {
        data: Vec<u8>,
        modified: SystemTime,
    },
}

impl Node {
    fn modified(&self) -> SystemTime {
        match self {
            Node::Dir { modified, .. } | Node::File { modified, .. } => *modified,
        }
    }
}

impl InMemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir<P: Into<PathBuf>>(&self, path: P) {
        let path = path.into();
        let mut nodes = self.nodes.write().unwrap();
        if nodes.contains_key(&path) {
            return;
        }
        Self::ensure_parent_link(&mut nodes, &path);
        nodes.insert(
            path,
            Node::Dir {
                children: Vec::new(),
                modified: SystemTime::now(),
            },
        );
    }

    pub fn add_file<P: Into<PathBuf>>(&self, path: P, data: &[u8]) {
        let path = path.into();
        let mut nodes = self.nodes.write().unwrap();
        Self::ensure_parent_link(&mut nodes, &path);
        nodes.insert(
            path,
            Node::File {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
    }

    /// Overwrite a node's mtime, e.g. to simulate drift between runs.
    pub fn set_mtime<P: AsRef<Path>>(&self, path: P, mtime: SystemTime) {
        let mut nodes = self.nodes.write().unwrap();
        if let Some(node) = nodes.get_mut(path.as_ref()) {
            match node {
                Node::Dir { modified, .. } | Node::File { modified, .. } => *modified = mtime,
            }
        }
    }

    /// Remove a node and, for directories, everything beneath it.
    pub fn remove<P: AsRef<Path>>(&self, path: P) {
        let path = path.as_ref();
        let mut nodes = self.nodes.write().unwrap();
        let doomed: Vec<PathBuf> = nodes
            .keys()
            .filter(|p| p.as_path() == path || p.starts_with(path))
            .cloned()
            .collect();
        for p in doomed {
            nodes.remove(&p);
        }
        if let Some(parent) = path.parent()
            && let Some(Node::Dir { children, .. }) = nodes.get_mut(parent)
        {
            children.retain(|c| c.as_path() != path);
        }
    }

    /// Move a node (and any subtree) to a new path, keeping file contents
    /// and mtimes. Mirrors a user renaming or relocating a folder on disk.
    pub fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, to: Q) {
        let from = from.as_ref();
        let to = to.as_ref().to_path_buf();
        let mut nodes = self.nodes.write().unwrap();

        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|p| p.as_path() == from || p.starts_with(from))
            .cloned()
            .collect();
        if moved.is_empty() {
            return;
        }

        if let Some(parent) = from.parent()
            && let Some(Node::Dir { children, .. }) = nodes.get_mut(parent)
        {
            children.retain(|c| c.as_path() != from);
        }

        for old in moved {
            let suffix = old.strip_prefix(from).expect("prefix checked above");
            let new = if suffix.as_os_str().is_empty() {
                to.clone()
            } else {
                to.join(suffix)
            };
            if let Some(mut node) = nodes.remove(&old) {
                if let Node::Dir { children, .. } = &mut node {
                    for child in children.iter_mut() {
                        let child_suffix =
                            child.strip_prefix(from).expect("children live under from");
                        *child = to.join(child_suffix);
                    }
                }
                nodes.insert(new, node);
            }
        }

        Self::ensure_parent_link(&mut nodes, &to);
    }

    fn ensure_parent_link(nodes: &mut HashMap<PathBuf, Node>, path: &Path) {
        if let Some(parent) = path.parent() {
            // Ensure parent directory exists
            if !nodes.contains_key(parent) {
                nodes.insert(
                    parent.to_path_buf(),
                    Node::Dir {
                        children: Vec::new(),
                        modified: SystemTime::now(),
                    },
                );
                // Recurse to ensure its parent exists
                Self::ensure_parent_link(nodes, parent);
            }
            // Link child into parent
            if let Some(Node::Dir { children, .. }) = nodes.get_mut(parent)
                && !children.iter().any(|p| p.as_path() == path)
            {
                children.push(path.to_path_buf());
            }
        }
    }
}

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn path_exists(&self, path: &Path) -> bool {
        self.nodes.read().unwrap().contains_key(path)
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Box<dyn ReadDirStream + Send>> {
        match self.nodes.read().unwrap().get(path) {
            Some(Node::Dir { children, .. }) => Ok(Box::new(InMemReadDir {
                queue: children.clone().into(),
            })),
            Some(Node::File { .. }) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("read_dir on file: {path:?}"),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("read_dir on missing path: {path:?}"),
            )),
        }
    }

    async fn metadata(&self, path: &Path) -> io::Result<FsMetadata> {
        match self.nodes.read().unwrap().get(path) {
            Some(node @ Node::Dir { .. }) => Ok(FsMetadata {
                is_dir: true,
                is_file: false,
                len: 0,
                modified: Some(node.modified()),
            }),
            Some(node @ Node::File { data, .. }) => Ok(FsMetadata {
                is_dir: false,
                is_file: true,
                len: data.len() as u64,
                modified: Some(node.modified()),
            }),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("metadata on missing path: {path:?}"),
            )),
        }
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self.nodes.read().unwrap().get(path) {
            Some(Node::File { data, .. }) => Ok(String::from_utf8_lossy(data).into_owned()),
            Some(Node::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("read_to_string on directory: {path:?}"),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("read_to_string on missing path: {path:?}"),
            )),
        }
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.add_file(path.to_path_buf(), contents);
        Ok(())
    }
}

struct InMemReadDir {
    queue: VecDeque<PathBuf>,
}

#[async_trait]
impl ReadDirStream for InMemReadDir {
    async fn next_entry(&mut self) -> io::Result<Option<PathBuf>> {
        Ok(self.queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rename_moves_subtree() {
        let fs = InMemoryFs::new();
        fs.add_dir("/lib/show");
        fs.add_file("/lib/show/ep1.mkv", b"video");

        fs.rename("/lib/show", "/lib/show_renamed");

        assert!(!fs.path_exists(Path::new("/lib/show")).await);
        assert!(fs.path_exists(Path::new("/lib/show_renamed")).await);
        assert!(fs.path_exists(Path::new("/lib/show_renamed/ep1.mkv")).await);

        let mut rd = fs.read_dir(Path::new("/lib/show_renamed")).await.unwrap();
        let entry = rd.next_entry().await.unwrap().unwrap();
        assert_eq!(entry, PathBuf::from("/lib/show_renamed/ep1.mkv"));
    }

    #[tokio::test]
    async fn remove_unlinks_from_parent() {
        let fs = InMemoryFs::new();
        fs.add_file("/lib/show/ep1.mkv", b"video");
        fs.remove("/lib/show/ep1.mkv");

        let mut rd = fs.read_dir(Path::new("/lib/show")).await.unwrap();
        assert!(rd.next_entry().await.unwrap().is_none());
    }
}
