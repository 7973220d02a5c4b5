//! `Handle<T>` and `RelinkableHandle<T>`: shared references to market objects.
//!
//! A [`Handle`] is a read-only, optionally empty `Arc`.  A
//! [`RelinkableHandle`] adds one level of indirection: every clone shares the
//! same link, so redirecting it to another target is visible to all holders
//! on their next dereference.  Consumers never cache the target itself; they
//! read it on each use and compare [`RelinkableHandle::version`] stamps to
//! decide whether cached results derived from it are stale.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Source of link versions.  Shared by all handles so that a version uniquely
/// identifies one linking event across the process.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// A shared, optionally-null reference to a value of type `T`.
///
/// The handle is read-only; to redirect it use a [`RelinkableHandle`].
pub struct Handle<T: ?Sized> {
    inner: Option<Arc<T>>,
}

impl<T> Handle<T> {
    /// Create a non-null handle wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Some(Arc::new(value)),
        }
    }
}

impl<T: ?Sized> Handle<T> {
    /// Create a handle from an existing `Arc`.
    pub fn from_arc(arc: Arc<T>) -> Self {
        Self { inner: Some(arc) }
    }

    /// Create a null (empty) handle.
    pub fn null() -> Self {
        Self { inner: None }
    }

    /// Return `true` if the handle contains no value.
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrow the contained value, or `None` if the handle is null.
    pub fn get(&self) -> Option<&T> {
        self.inner.as_deref()
    }

    /// Clone out the contained `Arc`.
    pub fn current(&self) -> Option<Arc<T>> {
        self.inner.clone()
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> From<Arc<T>> for Handle<T> {
    fn from(arc: Arc<T>) -> Self {
        Self::from_arc(arc)
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(v) => write!(f, "Handle({:?})", v),
            None => write!(f, "Handle(null)"),
        }
    }
}

struct Link<T: ?Sized> {
    target: Option<Arc<T>>,
    version: u64,
}

/// A handle whose target can be redirected at runtime.
///
/// Clones share the link: relinking through any clone is seen by all of them.
pub struct RelinkableHandle<T: ?Sized> {
    link: Arc<RwLock<Link<T>>>,
}

impl<T> RelinkableHandle<T> {
    /// Create a relinkable handle wrapping `value`.
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }
}

impl<T: ?Sized> RelinkableHandle<T> {
    /// Create a relinkable handle pointing at an existing `Arc`.
    pub fn from_arc(arc: Arc<T>) -> Self {
        Self {
            link: Arc::new(RwLock::new(Link {
                target: Some(arc),
                version: next_version(),
            })),
        }
    }

    /// Create a relinkable handle that is initially empty.
    pub fn null() -> Self {
        Self {
            link: Arc::new(RwLock::new(Link {
                target: None,
                version: next_version(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Link<T>> {
        self.link.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Link<T>> {
        self.link.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Redirect every clone of this handle to `target`.
    pub fn link_to(&self, target: Arc<T>) {
        let mut link = self.write();
        link.target = Some(target);
        link.version = next_version();
        tracing::trace!(version = link.version, "relinked handle");
    }

    /// Detach every clone of this handle from its target.
    pub fn unlink(&self) {
        let mut link = self.write();
        link.target = None;
        link.version = next_version();
        tracing::trace!(version = link.version, "unlinked handle");
    }

    /// Return `true` if the handle currently points nowhere.
    pub fn is_empty(&self) -> bool {
        self.read().target.is_none()
    }

    /// Snapshot of the current target.
    pub fn current(&self) -> Option<Arc<T>> {
        self.read().target.clone()
    }

    /// Run `f` against the current target, or return `None` if empty.
    pub fn with<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        let link = self.read();
        link.target.as_deref().map(f)
    }

    /// Stamp identifying the current link.  Changes on every
    /// [`link_to`](Self::link_to) and [`unlink`](Self::unlink).
    pub fn version(&self) -> u64 {
        self.read().version
    }

    /// Snapshot of the current target together with its version.
    pub fn snapshot(&self) -> (Option<Arc<T>>, u64) {
        let link = self.read();
        (link.target.clone(), link.version)
    }
}

impl<T: ?Sized> Clone for RelinkableHandle<T> {
    fn clone(&self) -> Self {
        Self {
            link: Arc::clone(&self.link),
        }
    }
}

impl<T: ?Sized> Default for RelinkableHandle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> fmt::Debug for RelinkableHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = self.read();
        f.debug_struct("RelinkableHandle")
            .field("linked", &link.target.is_some())
            .field("version", &link.version)
            .finish()
    }
}
