use thiserror::Error;

pub const MIN_PAGE_SIZE: usize = 1;
pub const MAX_PAGE_SIZE: usize = 500;
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Continuation token handed out by a [`PageSource`].
///
/// Only meaningful when passed back to the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<Cursor>) -> Self {
        Self { items, cursor }
    }

    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("{message}")]
    Service { message: String },
    #[error("{capability} capability is not available on this store")]
    Unsupported { capability: String },
    #[error("{what} was not found")]
    NotFound { what: String },
}

impl RemoteError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

/// One page at a time over a remote collection.
///
/// Callers clamp `page_size` with [`clamp_page_size`] before calling and never
/// retry a failed fetch on their own.
pub trait PageSource<T>: Send + Sync {
    fn fetch(&self, cursor: Option<&Cursor>, page_size: usize) -> Result<Page<T>, RemoteError>;
}

pub fn clamp_page_size(requested: usize) -> usize {
    requested.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}
