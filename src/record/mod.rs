//! In-memory registries of loaded components, kept in sync with directories
//! on disk.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use serenity::async_trait;

use crate::{
    constant,
    error::{LoadError, RecordError, SyncError},
    util,
};

mod manifest;

pub use manifest::{Export, Manifest};

/// A family of loadable components.
pub trait Component: Send + Sync {
    /// Word the exported symbol must end with, e.g. `command`.
    const DISCRIMINATOR: &'static str;

    /// Static data captured once per load.
    type Descriptor: Send + Sync + 'static;

    fn describe(&self, symbol: &str) -> Self::Descriptor;

    /// Name the entry is keyed by.
    fn key(descriptor: &Self::Descriptor) -> &str;

    /// Category overriding the one derived from the source location.
    fn category(_descriptor: &Self::Descriptor) -> Option<&str> {
        None
    }
}

pub struct Entry<T: Component + ?Sized> {
    pub name: String,
    pub symbol: String,
    pub category: String,
    /// Source file the component was loaded from, if any.
    pub path: Option<PathBuf>,
    pub descriptor: T::Descriptor,
    pub component: Arc<T>,
}

/// Lifecycle callbacks run when entries enter or leave a record.
#[async_trait]
pub trait Hooks<T: Component + ?Sized>: Send + Sync {
    async fn synced(&self, _entry: &Arc<Entry<T>>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn unsynced(&self, _entry: &Arc<Entry<T>>) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct Record<T: Component + ?Sized> {
    name: &'static str,
    default_category: String,
    paths: RwLock<Vec<PathBuf>>,
    /// Manifest exports with their paths made absolute
    exports: Vec<(PathBuf, Export<T>)>,
    entries: RwLock<Vec<Arc<Entry<T>>>>,
    hooks: Option<Arc<dyn Hooks<T>>>,
}

impl<T: Component + ?Sized> Record<T> {
    pub fn new(
        name: &'static str,
        base: &Path,
        default_category: impl Into<String>,
        manifest: Manifest<T>,
    ) -> io::Result<Self> {
        let exports = manifest
            .exports()
            .iter()
            .map(|export| Ok((util::normalize(&base.join(export.path()))?, export.clone())))
            .collect::<io::Result<_>>()?;

        Ok(Self {
            name,
            default_category: default_category.into(),
            paths: RwLock::new(vec![]),
            exports,
            entries: RwLock::new(vec![]),
            hooks: None,
        })
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn Hooks<T>>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a root directory that [`Record::sync_all`] walks.
    pub fn add_path(&self, path: &Path) -> io::Result<()> {
        let path = util::normalize(path)?;
        let mut paths = self.paths.write();
        if !paths.contains(&path) {
            paths.push(path);
        }

        Ok(())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.read().clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Entry<T>>> {
        self.entries.read().iter().find(|e| e.name == name).cloned()
    }

    /// Snapshot of every entry, in load order.
    pub fn entries(&self) -> Vec<Arc<Entry<T>>> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Loads the component declared by the file at `path`.
    pub async fn sync(&self, path: &Path) -> Result<Arc<Entry<T>>, LoadError> {
        let path = util::normalize(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
        if !metadata.is_file() {
            return Err(LoadError::NotAFile { path });
        }

        let mut candidates = self.exports.iter().filter(|(export_path, export)| {
            *export_path == path && util::has_discriminator(export.symbol(), T::DISCRIMINATOR)
        });

        let export = match (candidates.next(), candidates.next()) {
            (Some((_, export)), None) => export,
            (first, second) => {
                let found = usize::from(first.is_some())
                    + usize::from(second.is_some())
                    + candidates.count();

                return Err(LoadError::AmbiguousComponent {
                    path,
                    discriminator: T::DISCRIMINATOR,
                    found,
                });
            }
        };

        self.load(export.symbol(), export.instantiate(), Some(path))
            .await
    }

    /// Inserts an already constructed component, replacing any entry with the same key.
    pub async fn load(
        &self,
        symbol: &str,
        component: Arc<T>,
        path: Option<PathBuf>,
    ) -> Result<Arc<Entry<T>>, LoadError> {
        let descriptor = component.describe(symbol);
        let name = T::key(&descriptor).to_owned();
        let category = match T::category(&descriptor) {
            Some(category) => category.to_owned(),
            None => self.category_of(path.as_deref()),
        };

        let entry = Arc::new(Entry {
            name,
            symbol: symbol.to_owned(),
            category,
            path,
            descriptor,
            component,
        });

        if let Some(hooks) = &self.hooks {
            hooks
                .synced(&entry)
                .await
                .map_err(|source| LoadError::Hook {
                    name: entry.name.clone(),
                    source,
                })?;
        }

        let replaced = {
            let mut entries = self.entries.write();
            match entries.iter().position(|e| e.name == entry.name) {
                Some(index) => Some(std::mem::replace(&mut entries[index], Arc::clone(&entry))),
                None => {
                    entries.push(Arc::clone(&entry));
                    None
                }
            }
        };

        if let Some(replaced) = replaced {
            debug!(record = self.name, name = %entry.name, "Replaced entry");
            self.run_unsync_hook(&replaced).await;
        }

        trace!(record = self.name, name = %entry.name, category = %entry.category, "Synced entry");

        Ok(entry)
    }

    /// Removes the entry named `name`.
    pub async fn unsync(&self, name: &str) -> Result<Arc<Entry<T>>, RecordError> {
        let removed = {
            let mut entries = self.entries.write();
            let index = entries.iter().position(|e| e.name == name);
            index.map(|index| entries.remove(index))
        };

        let Some(entry) = removed else {
            return Err(RecordError::NotFound {
                record: self.name,
                name: name.to_owned(),
            });
        };

        self.run_unsync_hook(&entry).await;

        Ok(entry)
    }

    /// Removes every entry.
    pub async fn unsync_all(&self) {
        let removed = std::mem::take(&mut *self.entries.write());
        for entry in removed {
            self.run_unsync_hook(&entry).await;
        }
    }

    /// Reloads every file below the registered paths.
    ///
    /// Entries that were not loaded from a file are kept. Every file is
    /// attempted before failing with all the errors that occurred.
    pub async fn sync_all(&self) -> Result<usize, SyncError> {
        let removed: Vec<_> = {
            let mut entries = self.entries.write();
            let (disk, kept) = std::mem::take(&mut *entries)
                .into_iter()
                .partition(|entry| entry.path.is_some());
            *entries = kept;

            disk
        };
        for entry in removed {
            self.run_unsync_hook(&entry).await;
        }

        let mut errors = vec![];
        let mut synced = 0;

        for root in self.paths() {
            let files = match walk(&root).await {
                Ok(files) => files,
                Err(source) => {
                    errors.push(LoadError::Io { path: root, source });
                    continue;
                }
            };

            for file in files.iter().filter(|file| is_loadable(file)) {
                match self.sync(file).await {
                    Ok(_) => synced += 1,
                    Err(err) => {
                        warn!(record = self.name, "{err}");
                        errors.push(err);
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(SyncError {
                record: self.name,
                errors,
            });
        }

        debug!(record = self.name, synced, "Synced all entries");

        Ok(synced)
    }

    async fn run_unsync_hook(&self, entry: &Arc<Entry<T>>) {
        if let Some(hooks) = &self.hooks {
            if let Err(err) = hooks.unsynced(entry).await {
                warn!(record = self.name, name = %entry.name, "Unsync hook failed: {err:?}");
            }
        }
    }

    /// Nearest parent directory name, or the default category for files
    /// directly inside a root.
    fn category_of(&self, path: Option<&Path>) -> String {
        let Some(parent) = path.and_then(Path::parent) else {
            return self.default_category.clone();
        };

        let is_root = self.paths.read().iter().any(|root| root == parent);
        if is_root {
            return self.default_category.clone();
        }

        parent
            .file_name()
            .and_then(|name| name.to_str())
            .map_or_else(|| self.default_category.clone(), str::to_owned)
    }
}

fn is_loadable(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == constant::fs::SOURCE_EXTENSION)
        && path
            .file_name()
            .is_some_and(|name| name != constant::fs::MODULE_FILE)
}

/// Every file below `root`, recursively, sorted.
pub async fn walk(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut pending = vec![root.to_path_buf()];
    let mut files = vec![];

    while let Some(directory) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                pending.push(entry.path());
            } else {
                files.push(entry.path());
            }
        }
    }

    files.sort();

    Ok(files)
}
