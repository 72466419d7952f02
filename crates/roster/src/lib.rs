//! Intrusive registry of live instances, one chain per type.
//!
//! Every value wrapped in [`Linked<T>`] is appended to the chain of `T` when
//! it is constructed and removed when it is dropped, so all live instances of
//! a type can be enumerated without any explicit registration:
//!
//! ```
//! use roster::{Linked, Tracked, range};
//!
//! struct Counter {
//!     name: &'static str,
//!     hits: u32,
//! }
//!
//! impl Tracked for Counter {}
//!
//! let parse = Linked::new(Counter { name: "parse", hits: 3 });
//! {
//!     let _render = Linked::new(Counter { name: "render", hits: 1 });
//!     assert_eq!(range::<Counter>().iter().count(), 2);
//! }
//! let names: Vec<_> = range::<Counter>().iter().map(|c| c.borrow().name).collect();
//! assert_eq!(names, ["parse"]);
//! assert_eq!(parse.borrow().hits, 3);
//! ```
//!
//! Layers:
//! - registry core ([`on_create`], [`on_destroy`], [`head_of`], [`tail_of`],
//!   [`next_of`], [`prev_of`]) keeps one doubly linked chain per type in a
//!   generation-checked slot arena;
//! - traversal ([`CursorMut`], [`Cursor`], [`Range`]) is built only on those
//!   accessors.
//!
//! Chains are thread-local and [`Linked`] is `!Send`: each thread sees only
//! the instances it created. Nothing here locks.

mod chain;
mod cursor;
mod error;
mod linked;
mod range;
mod registry;
mod snapshot;

pub use self::chain::LinkId;
pub use self::cursor::{Cursor, CursorMut};
pub use self::error::RegistryError;
pub use self::linked::{InstanceMut, InstanceRef, Linked};
pub use self::range::{Iter, IterMut, Range, range};
pub use self::registry::{
    Tracked, head_of, instance_of, is_linked, len_of, next_of, on_create, on_destroy, prev_of,
    snapshot, tail_of, validate,
};
pub use self::snapshot::{ChainSnapshot, LinkSnapshot};

#[cfg(test)]
mod tests;
