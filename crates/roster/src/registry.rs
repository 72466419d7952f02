//! Per-type chains of live instances.
//!
//! Chains live in a thread-local table keyed by `TypeId`, created empty on
//! first use of a type and never torn down. Every function here borrows the
//! table only for the duration of one chain operation and never calls back
//! into user code while holding it.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use tracing::trace;

use crate::chain::{Chain, LinkId};
use crate::error::RegistryError;
use crate::linked::InstanceMut;
use crate::snapshot::ChainSnapshot;

/// Marker for types whose instances are tracked in a chain.
///
/// Implementing it is the whole opt-in; instances are then created with
/// [`Linked::new`](crate::Linked::new).
pub trait Tracked: 'static {
    /// Name used in logs, errors and snapshots.
    fn type_label() -> &'static str {
        std::any::type_name::<Self>()
    }
}

thread_local! {
    static CHAINS: RefCell<HashMap<TypeId, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

fn chain_in<T: Tracked>(chains: &mut HashMap<TypeId, Box<dyn Any>>) -> &mut Chain<T> {
    chains
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Box::new(Chain::<T>::new(T::type_label())))
        .downcast_mut::<Chain<T>>()
        .expect("invariant violated: chain table entry does not match its TypeId")
}

fn with_chain<T: Tracked, R>(f: impl FnOnce(&mut Chain<T>) -> R) -> R {
    CHAINS.with(|chains| f(chain_in::<T>(&mut chains.borrow_mut())))
}

/// Like `with_chain`, but returns `None` once the thread-local table has been
/// destroyed during thread teardown.
fn try_with_chain<T: Tracked, R>(f: impl FnOnce(&mut Chain<T>) -> R) -> Option<R> {
    CHAINS
        .try_with(|chains| f(chain_in::<T>(&mut chains.borrow_mut())))
        .ok()
}

/// Appends an instance at the tail of its type's chain.
///
/// Must be paired with exactly one [`on_destroy`] for the returned id.
/// [`Linked`](crate::Linked) does both automatically.
pub fn on_create<T: Tracked>(instance: Weak<RefCell<T>>) -> LinkId {
    let (id, len) = with_chain::<T, _>(|chain| {
        let id = chain.link(instance);
        (id, chain.len())
    });
    trace!(
        type_name = T::type_label(),
        index = id.index(),
        generation = id.generation(),
        len,
        "linked instance"
    );
    id
}

/// Removes an instance from its type's chain.
///
/// Unlinking an id that is not linked (twice, or never) is reported as
/// [`RegistryError::StaleLink`] and leaves the chain untouched.
pub fn on_destroy<T: Tracked>(id: LinkId) -> Result<(), RegistryError> {
    let len = with_chain::<T, _>(|chain| chain.unlink(id).map(|()| chain.len()))?;
    trace_unlinked::<T>(id, len);
    Ok(())
}

pub(crate) fn try_on_destroy<T: Tracked>(id: LinkId) -> Option<Result<(), RegistryError>> {
    let result = try_with_chain::<T, _>(|chain| chain.unlink(id).map(|()| chain.len()))?;
    Some(result.map(|len| trace_unlinked::<T>(id, len)))
}

fn trace_unlinked<T: Tracked>(id: LinkId, len: usize) {
    trace!(
        type_name = T::type_label(),
        index = id.index(),
        generation = id.generation(),
        len,
        "unlinked instance"
    );
}

/// First live instance of `T`, if any.
pub fn head_of<T: Tracked>() -> Option<LinkId> {
    with_chain::<T, _>(|chain| chain.head())
}

/// Last live instance of `T`, if any.
pub fn tail_of<T: Tracked>() -> Option<LinkId> {
    with_chain::<T, _>(|chain| chain.tail())
}

/// Successor of `id`; `Ok(None)` when `id` is the tail.
pub fn next_of<T: Tracked>(id: LinkId) -> Result<Option<LinkId>, RegistryError> {
    with_chain::<T, _>(|chain| chain.next(id))
}

/// Predecessor of `id`; `Ok(None)` when `id` is the head.
pub fn prev_of<T: Tracked>(id: LinkId) -> Result<Option<LinkId>, RegistryError> {
    with_chain::<T, _>(|chain| chain.prev(id))
}

/// Whether `id` names a live instance of `T`.
pub fn is_linked<T: Tracked>(id: LinkId) -> bool {
    with_chain::<T, _>(|chain| chain.contains(id))
}

/// Number of live instances of `T` on this thread.
pub fn len_of<T: Tracked>() -> usize {
    with_chain::<T, _>(|chain| chain.len())
}

/// Mutable handle to the instance linked under `id`.
pub fn instance_of<T: Tracked>(id: LinkId) -> Result<InstanceMut<T>, RegistryError> {
    let storage = with_chain::<T, _>(|chain| chain.instance(id))?;
    Ok(InstanceMut::new(id, storage))
}

/// Checks every structural invariant of `T`'s chain.
pub fn validate<T: Tracked>() -> Result<(), RegistryError> {
    with_chain::<T, _>(|chain| chain.validate())
}

/// Link topology of `T`'s chain, head to tail.
pub fn snapshot<T: Tracked>() -> ChainSnapshot {
    with_chain::<T, _>(|chain| chain.snapshot())
}
