use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use tracing::error;

use crate::chain::LinkId;
use crate::registry::{self, Tracked};

/// A live, tracked instance of `T`.
///
/// Constructing one appends it to the tail of `T`'s chain; dropping it
/// removes it. Cloning produces a new instance that is tracked on its own.
/// The chain only observes the instance and never keeps it alive.
///
/// `Linked` is tied to the chain of the thread that created it and is
/// therefore neither `Send` nor `Sync`.
pub struct Linked<T: Tracked> {
    id: LinkId,
    storage: Rc<RefCell<T>>,
}

impl<T: Tracked> Linked<T> {
    pub fn new(value: T) -> Self {
        let storage = Rc::new(RefCell::new(value));
        let id = registry::on_create(Rc::downgrade(&storage));
        Self { id, storage }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.storage.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.storage.borrow_mut()
    }

    /// Handle to this instance, as yielded by traversal.
    pub fn handle(&self) -> InstanceMut<T> {
        InstanceMut::new(self.id, Rc::clone(&self.storage))
    }

    pub fn next_id(&self) -> Option<LinkId> {
        registry::next_of::<T>(self.id).ok().flatten()
    }

    pub fn prev_id(&self) -> Option<LinkId> {
        registry::prev_of::<T>(self.id).ok().flatten()
    }

    /// Keeps the instance linked for the rest of the thread's life, the way a
    /// `static` would be.
    pub fn leak(self) -> LinkId {
        let id = self.id;
        std::mem::forget(self);
        id
    }
}

impl<T: Tracked> Drop for Linked<T> {
    fn drop(&mut self) {
        // `None` means the thread is tearing down and the chains are already gone.
        if let Some(Err(err)) = registry::try_on_destroy::<T>(self.id) {
            error!(type_name = T::type_label(), %err, "failed to unlink instance");
            debug_assert!(false, "failed to unlink instance: {err}");
        }
    }
}

impl<T: Tracked + Clone> Clone for Linked<T> {
    fn clone(&self) -> Self {
        let value = T::clone(&self.borrow());
        Self::new(value)
    }
}

impl<T: Tracked + Default> Default for Linked<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Tracked> From<T> for Linked<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Tracked + fmt::Debug> fmt::Debug for Linked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linked")
            .field("id", &self.id)
            .field("value", &self.storage)
            .finish()
    }
}

/// Mutable access to a live instance, yielded by [`CursorMut`](crate::CursorMut)
/// and [`IterMut`](crate::IterMut).
///
/// Writes go to the instance itself, not to a copy.
pub struct InstanceMut<T> {
    id: LinkId,
    storage: Rc<RefCell<T>>,
}

impl<T> InstanceMut<T> {
    pub(crate) fn new(id: LinkId, storage: Rc<RefCell<T>>) -> Self {
        Self { id, storage }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.storage.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.storage.borrow_mut()
    }

    pub fn to_ref(&self) -> InstanceRef<T> {
        InstanceRef {
            id: self.id,
            storage: Rc::clone(&self.storage),
        }
    }
}

/// Read-only access to a live instance, yielded by [`Cursor`](crate::Cursor)
/// and [`Iter`](crate::Iter).
pub struct InstanceRef<T> {
    id: LinkId,
    storage: Rc<RefCell<T>>,
}

impl<T> InstanceRef<T> {
    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.storage.borrow()
    }
}

impl<T> From<InstanceMut<T>> for InstanceRef<T> {
    fn from(instance: InstanceMut<T>) -> Self {
        Self {
            id: instance.id,
            storage: instance.storage,
        }
    }
}

macro_rules! impl_instance_common {
    ($name:ident) => {
        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self {
                    id: self.id,
                    storage: Rc::clone(&self.storage),
                }
            }
        }

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T: fmt::Debug> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("id", &self.id)
                    .field("value", &self.storage)
                    .finish()
            }
        }
    };
}

impl_instance_common!(InstanceMut);
impl_instance_common!(InstanceRef);
