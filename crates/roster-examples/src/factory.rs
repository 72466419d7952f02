//! A factory that discovers its creators by walking the registration chain.
//!
//! Types opt in with [`register_creator!`](crate::register_creator), which
//! links a leaked [`CreatorRegistration`] before `main` runs. [`Factory::new`]
//! never needs a hand-maintained list of types.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::marker::PhantomData;

use compact_str::CompactString;
use roster::{InstanceRef, Tracked, range};
use tracing::debug;

use crate::{Options, write_snapshot};

pub trait Serializable {
    fn serialize(&self, out: &mut dyn Write) -> io::Result<()>;
}

pub trait Creator {
    fn create(&self) -> Box<dyn Serializable>;
}

/// Creates default values of `T`.
pub struct DefaultCreator<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> DefaultCreator<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for DefaultCreator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serializable + Default + 'static> Creator for DefaultCreator<T> {
    fn create(&self) -> Box<dyn Serializable> {
        Box::new(T::default())
    }
}

/// One creator offered to every [`Factory`] built on this thread.
pub struct CreatorRegistration {
    name: &'static str,
    creator: Box<dyn Creator>,
}

impl Tracked for CreatorRegistration {}

impl CreatorRegistration {
    pub fn new(name: &'static str, creator: Box<dyn Creator>) -> Self {
        Self { name, creator }
    }

    pub fn of<T: Serializable + Default + 'static>(name: &'static str) -> Self {
        Self::new(name, Box::new(DefaultCreator::<T>::new()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn creator(&self) -> &dyn Creator {
        self.creator.as_ref()
    }
}

impl fmt::Debug for CreatorRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatorRegistration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registers a `Default + Serializable` type under its own name, before `main`.
#[macro_export]
macro_rules! register_creator {
    ($ty:ident) => {
        const _: () = {
            #[$crate::ctor::ctor]
            fn register() {
                $crate::roster::Linked::new($crate::factory::CreatorRegistration::of::<$ty>(
                    ::std::stringify!($ty),
                ))
                .leak();
            }
        };
    };
}

/// Name-to-creator table snapshotted from the registration chain.
pub struct Factory {
    creators: HashMap<CompactString, InstanceRef<CreatorRegistration>>,
}

impl Factory {
    pub fn new() -> Self {
        let mut creators = HashMap::new();
        for registration in range::<CreatorRegistration>().iter() {
            let name = CompactString::from(registration.borrow().name());
            debug!(%name, "found creator");
            if creators.insert(name.clone(), registration).is_some() {
                debug!(%name, "later registration replaces earlier one");
            }
        }
        Self { creators }
    }

    /// A fresh instance of the type registered as `type_name`.
    pub fn create(&self, type_name: &str) -> Option<Box<dyn Serializable>> {
        let registration = self.creators.get(type_name)?;
        let created = registration.borrow().creator().create();
        Some(created)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.creators.keys().map(|name| name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct SomeClass;

impl Serializable for SomeClass {
    fn serialize(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Data from SomeClass.")
    }
}

register_creator!(SomeClass);

#[derive(Debug, Default)]
pub struct SomeOtherClass;

impl Serializable for SomeOtherClass {
    fn serialize(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Data from SomeOtherClass.")
    }
}

register_creator!(SomeOtherClass);

/// Creates one `SomeClass` and one `SomeOtherClass` by name and serializes them.
pub fn run(out: &mut dyn Write, options: Options) -> io::Result<()> {
    let factory = Factory::new();
    for name in ["SomeClass", "SomeOtherClass"] {
        let object = factory
            .create(name)
            .ok_or_else(|| io::Error::other(format!("no creator registered for {name}")))?;
        object.serialize(out)?;
    }
    write_snapshot::<CreatorRegistration>(out, options)
}
