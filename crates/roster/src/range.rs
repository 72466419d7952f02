use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::chain::LinkId;
use crate::cursor::{Cursor, CursorMut};
use crate::error::RegistryError;
use crate::linked::{InstanceMut, InstanceRef};
use crate::registry::{self, Tracked};

/// A begin/end cursor pair over the chain of `T`.
///
/// The begin position is captured when the range is built and is not
/// refreshed afterwards. Iteration follows the live chain, so instances
/// linked or unlinked while a walk is in progress are observed.
pub struct Range<T> {
    first: CursorMut<T>,
    last: CursorMut<T>,
}

/// Every live instance of `T`, in construction order.
///
/// ```
/// use roster::{Linked, Tracked, range};
///
/// struct Number(i32);
/// impl Tracked for Number {}
///
/// let _a = Linked::new(Number(1));
/// let _b = Linked::new(Number(2));
/// for n in range::<Number>() {
///     n.borrow_mut().0 *= 10;
/// }
/// let values: Vec<i32> = range::<Number>().iter().map(|n| n.borrow().0).collect();
/// assert_eq!(values, [10, 20]);
/// ```
pub fn range<T: Tracked>() -> Range<T> {
    Range::new(CursorMut::begin(), CursorMut::end())
}

impl<T: Tracked> Range<T> {
    pub fn new(first: CursorMut<T>, last: CursorMut<T>) -> Self {
        Self { first, last }
    }

    pub fn begin(&self) -> CursorMut<T> {
        self.first
    }

    pub fn end(&self) -> CursorMut<T> {
        self.last
    }

    pub fn cbegin(&self) -> Cursor<T> {
        self.first.into()
    }

    pub fn cend(&self) -> Cursor<T> {
        self.last.into()
    }

    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }

    pub fn iter(&self) -> Iter<T> {
        Iter {
            walk: Walk::new(Direction::Forward, self.first.position(), self.last.position()),
        }
    }

    pub fn iter_mut(&self) -> IterMut<T> {
        IterMut {
            walk: Walk::new(Direction::Forward, self.first.position(), self.last.position()),
        }
    }

    /// Read-only walk from the end back to the beginning.
    pub fn rev(&self) -> Iter<T> {
        Iter {
            walk: Walk::new(Direction::Backward, self.first.position(), self.last.position()),
        }
    }

    pub fn rev_mut(&self) -> IterMut<T> {
        IterMut {
            walk: Walk::new(Direction::Backward, self.first.position(), self.last.position()),
        }
    }
}

impl<T> Clone for Range<T> {
    fn clone(&self) -> Self {
        Self {
            first: self.first,
            last: self.last,
        }
    }
}

impl<T> std::fmt::Debug for Range<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Range")
            .field("first", &self.first)
            .field("last", &self.last)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug)]
enum WalkState {
    Start,
    /// `id` was handed out last; `behind` and `then` were its neighbours
    /// against and along the walk direction at that moment.
    Yielded {
        id: LinkId,
        behind: Option<LinkId>,
        then: Option<LinkId>,
    },
    Done,
}

/// Lazy walk over `[first, last)` that resolves each step against the live
/// chain when the next item is requested.
struct Walk<T> {
    direction: Direction,
    first: Option<LinkId>,
    last: Option<LinkId>,
    state: WalkState,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Tracked> Walk<T> {
    fn new(direction: Direction, first: Option<LinkId>, last: Option<LinkId>) -> Self {
        Self {
            direction,
            first,
            last,
            state: WalkState::Start,
            _marker: PhantomData,
        }
    }

    fn step(&self, id: LinkId) -> Result<Option<LinkId>, RegistryError> {
        match self.direction {
            Direction::Forward => registry::next_of::<T>(id),
            Direction::Backward => registry::prev_of::<T>(id),
        }
    }

    fn step_back(&self, id: LinkId) -> Result<Option<LinkId>, RegistryError> {
        match self.direction {
            Direction::Forward => registry::prev_of::<T>(id),
            Direction::Backward => registry::next_of::<T>(id),
        }
    }

    /// Neighbour of the last handed-out instance. If that instance was
    /// destroyed meanwhile, the walk resumes after the instance that was
    /// behind it (from the head if it was the head of a forward walk), and
    /// only falls back to the neighbour recorded ahead of it when that is not
    /// possible. Instances appended at the tail are never ahead of a reverse
    /// walk.
    fn after(
        &self,
        id: LinkId,
        behind: Option<LinkId>,
        then: Option<LinkId>,
    ) -> Result<Option<LinkId>, RegistryError> {
        let err = match self.step(id) {
            Ok(next) => return Ok(next),
            Err(err) => err,
        };
        match behind {
            Some(behind) if registry::is_linked::<T>(behind) => return self.step(behind),
            None if self.direction == Direction::Forward => return Ok(registry::head_of::<T>()),
            _ => {}
        }
        match then {
            Some(then) if !registry::is_linked::<T>(then) => Err(err),
            _ => Ok(then),
        }
    }

    fn candidate(&self) -> Result<Option<Option<LinkId>>, RegistryError> {
        let candidate = match (self.direction, self.state) {
            (_, WalkState::Done) => return Ok(None),
            (Direction::Forward, WalkState::Start) => {
                if self.first == self.last {
                    return Ok(None);
                }
                self.first
            }
            (Direction::Forward, WalkState::Yielded { id, behind, then }) => {
                let next = self.after(id, behind, then)?;
                if next == self.last {
                    return Ok(None);
                }
                next
            }
            (Direction::Backward, WalkState::Start) => {
                if self.first == self.last {
                    return Ok(None);
                }
                match self.last {
                    Some(last) => registry::prev_of::<T>(last)?,
                    None => registry::tail_of::<T>(),
                }
            }
            (Direction::Backward, WalkState::Yielded { id, behind, then }) => {
                if Some(id) == self.first {
                    return Ok(None);
                }
                self.after(id, behind, then)?
            }
        };
        Ok(Some(candidate))
    }

    #[track_caller]
    fn next_instance(&mut self) -> Option<InstanceMut<T>> {
        let candidate = match self.candidate() {
            Ok(candidate) => candidate,
            Err(err) => panic!("lost position while iterating: {err}"),
        };
        let Some(Some(id)) = candidate else {
            self.state = WalkState::Done;
            return None;
        };
        let instance = match registry::instance_of::<T>(id) {
            Ok(instance) => instance,
            Err(err) => panic!("lost position while iterating: {err}"),
        };
        self.state = WalkState::Yielded {
            id,
            behind: self.step_back(id).ok().flatten(),
            then: self.step(id).ok().flatten(),
        };
        Some(instance)
    }
}

/// Read-only iterator over a [`Range`].
///
/// # Panics
///
/// `next` panics if the walk can no longer find its place in the chain:
/// the range's begin instance was destroyed before the walk started, or the
/// last yielded instance and both of its neighbours were destroyed in between
/// two calls. Use [`Cursor`] to handle these cases as errors.
pub struct Iter<T> {
    walk: Walk<T>,
}

/// Mutable iterator over a [`Range`]. Panics like [`Iter`].
pub struct IterMut<T> {
    walk: Walk<T>,
}

impl<T: Tracked> Iterator for Iter<T> {
    type Item = InstanceRef<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.next_instance().map(InstanceRef::from)
    }
}

impl<T: Tracked> Iterator for IterMut<T> {
    type Item = InstanceMut<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.next_instance()
    }
}

impl<T: Tracked> FusedIterator for Iter<T> {}
impl<T: Tracked> FusedIterator for IterMut<T> {}

impl<T: Tracked> IntoIterator for Range<T> {
    type Item = InstanceMut<T>;
    type IntoIter = IterMut<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: Tracked> IntoIterator for &Range<T> {
    type Item = InstanceRef<T>;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
