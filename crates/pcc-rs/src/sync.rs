//! Mutex-guarded window handle for configurations with `thread_safe` set.
//!
//! [`ContextWindow`] needs `&mut` for every mutation, so a single owner can
//! never race with itself. To share one window across threads, wrap it in a
//! [`SharedWindow`]: each call holds the lock for the whole operation,
//! including early validation failures.

use crate::context::ContextWindow;
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Cloneable, thread-safe handle to a [`ContextWindow`].
///
/// ```
/// use pcc_rs::prelude::*;
///
/// let config = WindowConfig::new(100).with_thread_safe(true);
/// let shared = SharedWindow::new(ContextWindow::with_config(config)?)?;
///
/// let worker = shared.clone();
/// std::thread::spawn(move || {
///     worker.with_mut(|w| w.add_message(MessageKind::User, Priority::Normal, "hello"))
/// })
/// .join()
/// .unwrap()?;
///
/// assert_eq!(shared.with(|w| w.message_count()), 1);
/// # Ok::<(), pcc_rs::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct SharedWindow(Arc<Mutex<ContextWindow>>);

impl SharedWindow {
    /// Wrap `window`. Its configuration must have `thread_safe` enabled.
    pub fn new(window: ContextWindow) -> Result<Self> {
        if !window.config().thread_safe {
            return Err(Error::InvalidParameter(
                "window configuration does not have thread_safe enabled".into(),
            ));
        }
        Ok(Self(Arc::new(Mutex::new(window))))
    }

    /// Run a read-only operation under the lock.
    pub fn with<T>(&self, f: impl FnOnce(&ContextWindow) -> T) -> T {
        let guard = self.lock();
        f(&*guard)
    }

    /// Run a mutating operation under the lock.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut ContextWindow) -> T) -> T {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    /// Like [`with_mut`](Self::with_mut), but fails with [`Error::Locked`]
    /// instead of waiting when another caller holds the window.
    pub fn try_with_mut<T>(&self, f: impl FnOnce(&mut ContextWindow) -> T) -> Result<T> {
        let mut guard = match self.0.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(Error::Locked),
        };
        Ok(f(&mut *guard))
    }

    /// Take the window back out if this is the last handle.
    pub fn into_inner(self) -> std::result::Result<ContextWindow, Self> {
        match Arc::try_unwrap(self.0) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(|e| e.into_inner())),
            Err(arc) => Err(Self(arc)),
        }
    }

    // Window bookkeeping is never left half-updated by a panicking closure.
    fn lock(&self) -> MutexGuard<'_, ContextWindow> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}
