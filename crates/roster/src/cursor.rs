//! Bidirectional cursors over a chain.
//!
//! A cursor is either positioned on a live instance or at the end sentinel
//! (one past the tail). Moving backward from the end lands on the tail, so a
//! reverse walk can start from [`CursorMut::end`]. Cursors store only a
//! [`LinkId`]; every move re-reads the live chain.

use std::fmt;
use std::marker::PhantomData;

use crate::chain::LinkId;
use crate::error::RegistryError;
use crate::linked::{InstanceMut, InstanceRef};
use crate::registry::{self, Tracked};

fn advance<T: Tracked>(position: &mut Option<LinkId>) -> Result<(), RegistryError> {
    let current = position.ok_or(RegistryError::AdvancePastEnd {
        type_name: T::type_label(),
    })?;
    *position = registry::next_of::<T>(current)?;
    Ok(())
}

fn retreat<T: Tracked>(position: &mut Option<LinkId>) -> Result<(), RegistryError> {
    *position = match *position {
        Some(current) => registry::prev_of::<T>(current)?,
        None => registry::tail_of::<T>(),
    };
    Ok(())
}

fn resolve<T: Tracked>(position: Option<LinkId>) -> Result<InstanceMut<T>, RegistryError> {
    let id = position.ok_or(RegistryError::EndDereference {
        type_name: T::type_label(),
    })?;
    registry::instance_of::<T>(id)
}

macro_rules! define_cursor {
    (
        $(#[$meta:meta])*
        $name:ident, item = $item:ident, convert = $convert:expr
    ) => {
        $(#[$meta])*
        pub struct $name<T> {
            position: Option<LinkId>,
            _marker: PhantomData<fn() -> T>,
        }

        impl<T: Tracked> $name<T> {
            /// Cursor at `position`; `None` is the end sentinel.
            pub fn new(position: Option<LinkId>) -> Self {
                Self {
                    position,
                    _marker: PhantomData,
                }
            }

            /// Cursor on the current head (the end sentinel if the chain is empty).
            pub fn begin() -> Self {
                Self::new(registry::head_of::<T>())
            }

            pub fn end() -> Self {
                Self::new(None)
            }

            pub fn position(&self) -> Option<LinkId> {
                self.position
            }

            pub fn is_end(&self) -> bool {
                self.position.is_none()
            }

            /// The instance under the cursor.
            ///
            /// # Panics
            ///
            /// At the end sentinel, or if the instance under the cursor has
            /// been destroyed.
            #[track_caller]
            pub fn get(&self) -> $item<T> {
                match self.try_get() {
                    Ok(instance) => instance,
                    Err(err) => panic!("{err}"),
                }
            }

            pub fn try_get(&self) -> Result<$item<T>, RegistryError> {
                resolve::<T>(self.position).map($convert)
            }

            /// Moves to the successor; from the tail this reaches the end sentinel.
            ///
            /// On error the cursor does not move.
            pub fn move_next(&mut self) -> Result<(), RegistryError> {
                advance::<T>(&mut self.position)
            }

            /// Moves to the predecessor; from the head this reaches the end
            /// sentinel, and from the end sentinel it reaches the tail.
            ///
            /// On error the cursor does not move.
            pub fn move_prev(&mut self) -> Result<(), RegistryError> {
                retreat::<T>(&mut self.position)
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T: Tracked> Default for $name<T> {
            fn default() -> Self {
                Self::end()
            }
        }

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.position == other.position
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.position {
                    Some(id) => write!(f, "{}({id})", stringify!($name)),
                    None => write!(f, "{}(end)", stringify!($name)),
                }
            }
        }
    };
}

define_cursor!(
    /// Cursor yielding mutable access to instances.
    CursorMut,
    item = InstanceMut,
    convert = |instance| instance
);

define_cursor!(
    /// Cursor yielding read-only access to instances.
    ///
    /// Built from a [`CursorMut`] with `From`, never the other way round.
    Cursor,
    item = InstanceRef,
    convert = InstanceRef::from
);

impl<T> From<CursorMut<T>> for Cursor<T> {
    fn from(cursor: CursorMut<T>) -> Self {
        Self {
            position: cursor.position,
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq<CursorMut<T>> for Cursor<T> {
    fn eq(&self, other: &CursorMut<T>) -> bool {
        self.position == other.position
    }
}

impl<T> PartialEq<Cursor<T>> for CursorMut<T> {
    fn eq(&self, other: &Cursor<T>) -> bool {
        self.position == other.position
    }
}
