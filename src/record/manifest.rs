use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

type Factory<T> = Arc<dyn Fn() -> Arc<T> + Send + Sync>;

/// A component a source file makes available for loading.
pub struct Export<T: ?Sized> {
    path: PathBuf,
    symbol: &'static str,
    factory: Factory<T>,
}

impl<T: ?Sized> Export<T> {
    /// Relative paths are resolved against the base directory of the record.
    pub fn new<F>(path: impl Into<PathBuf>, symbol: &'static str, factory: F) -> Self
    where
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            symbol,
            factory: Arc::new(factory),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn instantiate(&self) -> Arc<T> {
        (self.factory)()
    }
}

impl<T: ?Sized> Clone for Export<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            symbol: self.symbol,
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Export<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("path", &self.path)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

/// Every component a record is allowed to load, keyed by source file.
pub struct Manifest<T: ?Sized> {
    exports: Vec<Export<T>>,
}

impl<T: ?Sized> Manifest<T> {
    pub fn new() -> Self {
        Self { exports: vec![] }
    }

    pub fn with(mut self, export: Export<T>) -> Self {
        self.exports.push(export);
        self
    }

    pub fn push(&mut self, export: Export<T>) {
        self.exports.push(export);
    }

    pub fn exports(&self) -> &[Export<T>] {
        &self.exports
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

impl<T: ?Sized> Default for Manifest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Manifest<T> {
    fn clone(&self) -> Self {
        Self {
            exports: self.exports.clone(),
        }
    }
}

impl<T: ?Sized> FromIterator<Export<T>> for Manifest<T> {
    fn from_iter<I: IntoIterator<Item = Export<T>>>(iter: I) -> Self {
        Self {
            exports: iter.into_iter().collect(),
        }
    }
}

/// Declares the export of a component from the file the macro is invoked in.
///
/// ```ignore
/// pub fn export() -> Export<dyn Command> {
///     cordwork::export!(dyn Command => PingCommand)
/// }
/// ```
#[macro_export]
macro_rules! export {
    ($component:ty => $ty:ident) => {
        $crate::record::Export::<$component>::new(file!(), stringify!($ty), || {
            let component: ::std::sync::Arc<$component> = ::std::sync::Arc::new(<$ty>::default());
            component
        })
    };
}
