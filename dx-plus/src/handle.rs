//! Owning wrapper over reference-counted native handles.
//!
//! A handle type `I` is anything whose `Clone` retains the underlying object and
//! whose `Drop` releases it. Every `windows` COM interface (`ID3D11Device`,
//! `IDXGISwapChain`, ...) is such a type: `Clone` is `AddRef`, `Drop` is
//! `Release`. [`Com<I>`] adds the "maybe empty" state the native API relies on
//! (a view that has been released, a device that has not been created yet) and
//! keeps the bookkeeping in one place:
//!
//! * [`Com::adopt`] takes over the reference a creation call handed out,
//! * `Clone` retains once more,
//! * [`Com::take`] moves the reference out and leaves the source empty,
//! * [`Com::release`] and `Drop` give the reference back exactly once.

use crate::error::{NativeError, Result};

/// Holds zero or one owning reference to a native object.
#[derive(Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Com<I> {
    handle: Option<I>,
}

static_assertions::assert_eq_size!(Com<std::rc::Rc<()>>, *const ());

impl<I> Com<I> {
    pub const fn empty() -> Com<I> {
        Com { handle: None }
    }

    /// Takes ownership of a freshly created handle.
    ///
    /// The creating call already returned one reference on the caller's behalf;
    /// that reference now belongs to the wrapper and nothing is retained on top.
    pub const fn adopt(handle: I) -> Com<I> {
        Com {
            handle: Some(handle),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Borrows the handle without retaining it.
    pub fn raw(&self) -> Option<&I> {
        self.handle.as_ref()
    }

    /// Borrows the handle, failing with `E_POINTER` if the wrapper is empty.
    pub fn get(&self) -> Result<&I> {
        self.handle.as_ref().ok_or_else(NativeError::null_handle)
    }

    /// Gives the held reference back. Calling this on an empty wrapper does nothing.
    pub fn release(&mut self) {
        drop(self.handle.take());
    }

    /// Moves the reference into a new wrapper, leaving `self` empty.
    pub fn take(&mut self) -> Com<I> {
        Com {
            handle: self.handle.take(),
        }
    }

    pub fn into_inner(self) -> Option<I> {
        self.handle
    }
}

impl<I: Clone> Com<I> {
    /// Wraps a borrowed handle, retaining it once.
    pub fn from_ref(handle: &I) -> Com<I> {
        Com::adopt(handle.clone())
    }
}

#[cfg(windows)]
impl<I: windows::core::Interface> Com<I> {
    /// Queries the object for another interface.
    pub fn cast<T: windows::core::Interface>(&self) -> Result<Com<T>> {
        Ok(Com::adopt(self.get()?.cast::<T>()?))
    }
}

impl<I> Default for Com<I> {
    fn default() -> Self {
        Com::empty()
    }
}

impl<I: std::fmt::Debug> std::fmt::Debug for Com<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.handle {
            Some(handle) => f.debug_tuple("Com").field(handle).finish(),
            None => f.write_str("Com(null)"),
        }
    }
}

impl<I> From<I> for Com<I> {
    fn from(handle: I) -> Self {
        Com::adopt(handle)
    }
}

impl<I> From<Option<I>> for Com<I> {
    fn from(handle: Option<I>) -> Self {
        Com { handle }
    }
}

/// Wraps a freshly created handle in its typed wrapper, transferring exactly
/// one reference.
pub fn adopt<T, I>(handle: I) -> T
where
    T: From<Com<I>>,
{
    T::from(Com::adopt(handle))
}

/// Like [`adopt`], for out-parameters that may come back null even when the
/// call reported success.
pub fn try_adopt<T, I>(handle: Option<I>) -> Result<T>
where
    T: From<Com<I>>,
{
    handle.map(adopt::<T, I>).ok_or_else(NativeError::null_handle)
}

/// Restricts type-indexed operations to the implementations in this crate.
pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Declares a typed wrapper around `Com<$iface>`.
///
/// The wrapper derefs to its `Com`, so validity, borrowing and release come from
/// there; `take` is re-declared so that moving keeps the concrete type.
macro_rules! com_wrapper {
    ($(#[$meta:meta])* $vis:vis struct $name:ident($iface:ty);) => {
        $(#[$meta])*
        #[derive(Clone, Default, Debug, PartialEq)]
        #[repr(transparent)]
        $vis struct $name($crate::handle::Com<$iface>);

        impl $name {
            /// Moves the handle out, leaving this wrapper empty.
            pub fn take(&mut self) -> $name {
                $name(self.0.take())
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::handle::Com<$iface>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<$crate::handle::Com<$iface>> for $name {
            fn from(handle: $crate::handle::Com<$iface>) -> Self {
                $name(handle)
            }
        }

        impl From<$iface> for $name {
            fn from(handle: $iface) -> Self {
                $name($crate::handle::Com::adopt(handle))
            }
        }

        impl From<$name> for $crate::handle::Com<$iface> {
            fn from(wrapper: $name) -> Self {
                wrapper.0
            }
        }
    };
}

pub(crate) use com_wrapper;

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::codes;

    /// One native object: `live` is its reference count.
    #[derive(Debug)]
    struct Counted {
        live: Rc<Cell<usize>>,
    }

    impl Counted {
        /// What a creation call returns: a handle carrying one reference.
        fn fresh(live: &Rc<Cell<usize>>) -> Counted {
            live.set(live.get() + 1);
            Counted { live: live.clone() }
        }
    }

    impl Clone for Counted {
        fn clone(&self) -> Self {
            Counted::fresh(&self.live)
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    impl PartialEq for Counted {
        fn eq(&self, other: &Self) -> bool {
            Rc::ptr_eq(&self.live, &other.live)
        }
    }

    com_wrapper! {
        struct Thing(Counted);
    }

    fn object() -> Rc<Cell<usize>> {
        Rc::new(Cell::new(0))
    }

    #[test]
    fn adopting_a_fresh_handle_holds_one_reference() {
        let live = object();
        let thing: Thing = adopt(Counted::fresh(&live));
        assert!(thing.is_valid());
        assert_eq!(live.get(), 1);

        drop(thing);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn wrapping_a_borrowed_handle_retains() {
        let live = object();
        let original = Counted::fresh(&live);
        let wrapped = Com::from_ref(&original);
        assert_eq!(live.get(), 2);

        drop(original);
        assert_eq!(live.get(), 1);
        assert!(wrapped.is_valid());
    }

    #[test]
    fn clone_shares_the_object() {
        let live = object();
        let first = Com::adopt(Counted::fresh(&live));
        let second = first.clone();
        assert_eq!(live.get(), 2);
        assert_eq!(first, second);

        drop(first);
        assert_eq!(live.get(), 1);
        drop(second);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn take_moves_without_touching_the_count() {
        let live = object();
        let mut source: Thing = adopt(Counted::fresh(&live));
        let target = source.take();

        assert_eq!(live.get(), 1);
        assert!(!source.is_valid());
        assert!(target.is_valid());

        drop(source);
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let live = object();
        let mut thing: Thing = adopt(Counted::fresh(&live));
        thing.release();
        assert_eq!(live.get(), 0);
        assert!(!thing.is_valid());

        thing.release();
        assert_eq!(live.get(), 0);
        drop(thing);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn assignment_releases_the_previous_handle() {
        let old = object();
        let new = object();
        let mut thing: Thing = adopt(Counted::fresh(&old));
        thing = adopt(Counted::fresh(&new));

        assert_eq!(old.get(), 0);
        assert_eq!(new.get(), 1);
        assert!(thing.is_valid());
    }

    #[test]
    fn clone_from_a_handle_to_the_same_object_keeps_the_count() {
        let live = object();
        let mut first = Com::adopt(Counted::fresh(&live));
        let second = first.clone();
        first.clone_from(&second);
        assert_eq!(live.get(), 2);
    }

    #[test]
    fn empty_wrapper_refuses_to_lend() {
        let thing = Thing::default();
        assert!(!thing.is_valid());
        assert!(thing.raw().is_none());
        assert_eq!(thing.get().unwrap_err().code(), codes::E_POINTER);
    }

    #[test]
    fn null_out_parameter_is_an_error() {
        let err = try_adopt::<Thing, Counted>(None).unwrap_err();
        assert_eq!(err.code(), codes::E_POINTER);

        let live = object();
        let thing: Thing = try_adopt(Some(Counted::fresh(&live))).unwrap();
        assert_eq!(live.get(), 1);

        let inner: Option<Counted> = Com::<Counted>::from(thing).into_inner();
        assert!(inner.is_some());
        assert_eq!(live.get(), 1);
    }
}
