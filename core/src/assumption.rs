//! One-way invalidation flags for speculative fast paths.
//!
//! An [`Assumption`] starts valid and can only ever become invalid. Clones share the
//! same flag, so a fast path can hold a clone and test it with a single atomic load
//! while any other thread invalidates the original.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::{RuntimeError, RuntimeResult};

const VALID: u8 = 0;
const INVALIDATING: u8 = 1;
const INVALID: u8 = 2;

struct AssumptionState {
    name: Option<Arc<str>>,
    status: AtomicU8,
    reason: OnceCell<Arc<str>>,
}

#[derive(Clone)]
pub struct Assumption {
    state: Arc<AssumptionState>,
}

impl Assumption {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            state: Arc::new(AssumptionState {
                name: name.map(Arc::from),
                status: AtomicU8::new(VALID),
                reason: OnceCell::new(),
            }),
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(Some(name))
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.state.name.as_deref()
    }

    /// Stays true while an invalidation is still recording its reason.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.state.status.load(Ordering::Acquire) != INVALID
    }

    /// Fails with [`RuntimeError::Invalidated`] once the assumption no longer holds.
    #[inline]
    pub fn check(&self) -> RuntimeResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(RuntimeError::Invalidated {
                name: self.display_name().to_string(),
            })
        }
    }

    pub fn invalidate(&self) {
        self.invalidate_inner(None);
    }

    /// Like [`Assumption::invalidate`], recording why. Only the first reason sticks.
    pub fn invalidate_with_reason(&self, reason: &str) {
        self.invalidate_inner(Some(reason));
    }

    fn invalidate_inner(&self, reason: Option<&str>) {
        let status = &self.state.status;
        if status
            .compare_exchange(VALID, INVALIDATING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Lost the race: return only once the winner has published.
            while status.load(Ordering::Acquire) != INVALID {
                std::hint::spin_loop();
            }
            return;
        }

        if let Some(reason) = reason {
            let _ = self.state.reason.set(Arc::from(reason));
        }
        status.store(INVALID, Ordering::Release);
        tracing::debug!(
            target: "lkr::rt::assumption",
            assumption = self.display_name(),
            reason = reason.unwrap_or(""),
            "assumption invalidated"
        );
    }

    /// Always set by the time [`is_valid`](Self::is_valid) reports false, when
    /// the winning invalidation carried one.
    pub fn invalidation_reason(&self) -> Option<&str> {
        self.state.reason.get().map(|r| r.as_ref())
    }

    /// True when both handles observe the same flag.
    pub fn same_as(&self, other: &Assumption) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Checks a whole set of assumptions at once, e.g. before entering specialized code.
    pub fn all_valid<'a>(assumptions: impl IntoIterator<Item = &'a Assumption>) -> bool {
        assumptions.into_iter().all(Assumption::is_valid)
    }

    fn display_name(&self) -> &str {
        self.name().unwrap_or("<unnamed>")
    }
}

impl fmt::Debug for Assumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assumption")
            .field("name", &self.name())
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// An assumption that is replaced by a fresh one every time it is invalidated.
///
/// Owners that keep speculating on a fact which changes occasionally (a global
/// binding, a shape) hold one of these; readers must call [`CyclicAssumption::get`]
/// again after each invalidation.
pub struct CyclicAssumption {
    name: Arc<str>,
    current: Mutex<Assumption>,
}

impl CyclicAssumption {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            current: Mutex::new(Assumption::named(name)),
        }
    }

    pub fn get(&self) -> Assumption {
        self.current.lock().clone()
    }

    /// Invalidates the current assumption and installs a new valid one.
    pub fn invalidate(&self) {
        self.invalidate_with_reason("");
    }

    pub fn invalidate_with_reason(&self, reason: &str) {
        let mut current = self.current.lock();
        let fresh = Assumption::named(&self.name);
        let old = std::mem::replace(&mut *current, fresh);
        if reason.is_empty() {
            old.invalidate();
        } else {
            old.invalidate_with_reason(reason);
        }
    }
}

impl fmt::Debug for CyclicAssumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CyclicAssumption")
            .field("name", &self.name)
            .field("current", &*self.current.lock())
            .finish()
    }
}

/// A value that compiled code may treat as a constant while its assumption holds.
pub struct AssumedValue<T> {
    name: Arc<str>,
    slot: Mutex<(T, Assumption)>,
}

impl<T: Clone> AssumedValue<T> {
    pub fn new(name: &str, initial: T) -> Self {
        Self {
            name: Arc::from(name),
            slot: Mutex::new((initial, Assumption::named(name))),
        }
    }

    pub fn get(&self) -> T {
        self.slot.lock().0.clone()
    }

    /// Current value together with the assumption guarding it.
    pub fn get_with_assumption(&self) -> (T, Assumption) {
        let slot = self.slot.lock();
        (slot.0.clone(), slot.1.clone())
    }

    pub fn set(&self, value: T) {
        let old = {
            let mut slot = self.slot.lock();
            slot.0 = value;
            std::mem::replace(&mut slot.1, Assumption::named(&self.name))
        };
        old.invalidate_with_reason("value changed");
    }
}

impl<T: fmt::Debug> fmt::Debug for AssumedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("AssumedValue")
            .field("name", &self.name)
            .field("value", &slot.0)
            .field("assumption", &slot.1)
            .finish()
    }
}
