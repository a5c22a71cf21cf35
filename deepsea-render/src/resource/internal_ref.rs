//! The internal ref count + `defer_destroy` flag carried by every GPU
//! resource (spec §3/§5), guarded by a spinlock rather than a full mutex
//! since the hold time is a handful of instructions.

use deepsea_core::sync::Spinlock;

struct Inner {
    count: u32,
    defer_destroy: bool,
}

/// Tracks GPU-side references to a resource that outlive the user's handle:
/// a command buffer submission that reads the resource increments it before
/// submit and decrements it when the backend signals completion (via fence
/// sync). A user `destroy()` while references remain sets `defer_destroy`
/// instead of running the destructor immediately; the destructor runs when
/// the last reference is released.
pub struct InternalRefCount {
    inner: Spinlock<Inner>,
}

impl InternalRefCount {
    pub fn new() -> Self {
        InternalRefCount { inner: Spinlock::new(Inner { count: 0, defer_destroy: false }) }
    }

    /// Takes a GPU-side reference, to be matched by a later [`Self::release`].
    pub fn acquire(&self) {
        self.inner.lock().count += 1;
    }

    /// Releases a GPU-side reference. Returns `true` if this was the last
    /// outstanding reference and [`Self::request_destroy`] had already been
    /// called — the caller (the fence-completion path) must run the
    /// destructor.
    pub fn release(&self) -> bool {
        let mut inner = self.inner.lock();
        debug_assert!(inner.count > 0, "release without a matching acquire");
        inner.count -= 1;
        inner.count == 0 && inner.defer_destroy
    }

    /// Called from the user-facing `destroy`. Returns `true` if the
    /// destructor should run immediately; otherwise marks the resource for
    /// deferred destruction and returns `false`.
    pub fn request_destroy(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.count == 0 {
            true
        } else {
            inner.defer_destroy = true;
            false
        }
    }

    /// Number of GPU-side references currently outstanding.
    pub fn outstanding(&self) -> u32 {
        self.inner.lock().count
    }
}

impl Default for InternalRefCount {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroy_with_no_references_runs_immediately() {
        let rc = InternalRefCount::new();
        assert!(rc.request_destroy());
    }

    #[test]
    fn destroy_with_live_reference_defers_until_release() {
        let rc = InternalRefCount::new();
        rc.acquire();
        assert!(!rc.request_destroy());
        assert!(rc.release());
    }

    #[test]
    fn release_without_destroy_request_does_not_signal() {
        let rc = InternalRefCount::new();
        rc.acquire();
        assert!(!rc.release());
    }

    #[test]
    fn multiple_references_only_signal_on_the_last_release() {
        let rc = InternalRefCount::new();
        rc.acquire();
        rc.acquire();
        assert!(!rc.request_destroy());
        assert!(!rc.release());
        assert!(rc.release());
    }
}
