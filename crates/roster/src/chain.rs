//! Slot arena backing the chain of one registered type.
//!
//! Each live instance owns exactly one slot. Slots hold the `prev`/`next`
//! adjacency of the instance and a weak reference to its storage; the chain
//! never keeps an instance alive. Freed slots are recycled through a free
//! list, and every reuse bumps the slot generation so that a [`LinkId`]
//! handed out for an earlier occupant stops resolving.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use facet::Facet;

use crate::error::RegistryError;
use crate::snapshot::{ChainSnapshot, LinkSnapshot};

/// Generation-checked handle naming one linked instance.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId {
    index: u32,
    generation: u32,
}

impl LinkId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}.{}", self.index, self.generation)
    }
}

struct Links<T> {
    prev: Option<LinkId>,
    next: Option<LinkId>,
    instance: Weak<RefCell<T>>,
}

struct Slot<T> {
    generation: u32,
    links: Option<Links<T>>,
}

pub(crate) struct Chain<T> {
    type_name: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    head: Option<LinkId>,
    tail: Option<LinkId>,
    len: usize,
}

impl<T> Chain<T> {
    pub(crate) fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub(crate) fn head(&self) -> Option<LinkId> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<LinkId> {
        self.tail
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn contains(&self, id: LinkId) -> bool {
        self.links(id).is_ok()
    }

    fn stale(&self, id: LinkId) -> RegistryError {
        RegistryError::StaleLink {
            type_name: self.type_name,
            id,
        }
    }

    fn links(&self, id: LinkId) -> Result<&Links<T>, RegistryError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.links.as_ref())
            .ok_or_else(|| self.stale(id))
    }

    fn links_mut(&mut self, id: LinkId) -> Result<&mut Links<T>, RegistryError> {
        let stale = self.stale(id);
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.links.as_mut())
            .ok_or(stale)
    }

    /// Appends an instance at the tail and returns its handle.
    pub(crate) fn link(&mut self, instance: Weak<RefCell<T>>) -> LinkId {
        let old_tail = self.tail;
        let links = Links {
            prev: old_tail,
            next: None,
            instance,
        };

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.links = Some(links);
                LinkId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .expect("invariant violated: more than u32::MAX live instances");
                self.slots.push(Slot {
                    generation: 0,
                    links: Some(links),
                });
                LinkId {
                    index,
                    generation: 0,
                }
            }
        };

        match old_tail {
            Some(tail) => {
                if let Ok(tail_links) = self.links_mut(tail) {
                    tail_links.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        id
    }

    /// Removes an instance from wherever it sits and frees its slot.
    ///
    /// A stale id leaves the chain untouched.
    pub(crate) fn unlink(&mut self, id: LinkId) -> Result<(), RegistryError> {
        let (prev, next) = {
            let links = self.links(id)?;
            (links.prev, links.next)
        };
        // Neighbours must resolve before anything is mutated.
        for neighbour in [prev, next].into_iter().flatten() {
            self.links(neighbour)?;
        }

        let slot = &mut self.slots[id.index as usize];
        slot.links = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        match prev {
            Some(prev) => self.links_mut(prev)?.next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.links_mut(next)?.prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
        Ok(())
    }

    pub(crate) fn next(&self, id: LinkId) -> Result<Option<LinkId>, RegistryError> {
        self.links(id).map(|links| links.next)
    }

    pub(crate) fn prev(&self, id: LinkId) -> Result<Option<LinkId>, RegistryError> {
        self.links(id).map(|links| links.prev)
    }

    pub(crate) fn instance(&self, id: LinkId) -> Result<Rc<RefCell<T>>, RegistryError> {
        self.links(id)?
            .instance
            .upgrade()
            .ok_or_else(|| self.stale(id))
    }

    pub(crate) fn snapshot(&self) -> ChainSnapshot {
        let mut links = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let Ok(entry) = self.links(id) else {
                break;
            };
            links.push(LinkSnapshot {
                id,
                prev: entry.prev,
                next: entry.next,
            });
            if links.len() > self.len {
                break;
            }
            cursor = entry.next;
        }
        ChainSnapshot {
            type_name: self.type_name.to_owned(),
            len: self.len,
            head: self.head,
            tail: self.tail,
            links,
        }
    }

    /// Walks the chain and checks every structural invariant.
    pub(crate) fn validate(&self) -> Result<(), RegistryError> {
        let corrupted = |detail: String| RegistryError::corrupted(self.type_name, detail);

        match (self.head, self.tail) {
            (None, None) => {
                if self.len != 0 {
                    return Err(corrupted(format!("empty chain reports len {}", self.len)));
                }
                return self.validate_slots();
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(corrupted("exactly one of head/tail is set".into()));
            }
            (Some(_), Some(_)) => {}
        }

        let mut expected_prev = None;
        let mut cursor = self.head;
        let mut walked = 0usize;
        while let Some(id) = cursor {
            let links = self
                .links(id)
                .map_err(|_| corrupted(format!("{id} is reachable but not linked")))?;
            if links.prev != expected_prev {
                return Err(corrupted(format!(
                    "{id} has prev {:?}, expected {:?}",
                    links.prev, expected_prev
                )));
            }
            walked += 1;
            if walked > self.len {
                return Err(corrupted(format!(
                    "forward walk exceeds len {} (cycle?)",
                    self.len
                )));
            }
            expected_prev = Some(id);
            cursor = links.next;
        }

        if walked != self.len {
            return Err(corrupted(format!(
                "forward walk visited {walked} instances, len is {}",
                self.len
            )));
        }
        if expected_prev != self.tail {
            return Err(corrupted(format!(
                "forward walk ended at {expected_prev:?}, tail is {:?}",
                self.tail
            )));
        }
        self.validate_slots()
    }

    fn validate_slots(&self) -> Result<(), RegistryError> {
        let occupied = self.slots.iter().filter(|slot| slot.links.is_some()).count();
        if occupied != self.len || occupied + self.free.len() != self.slots.len() {
            return Err(RegistryError::corrupted(
                self.type_name,
                format!(
                    "{occupied} occupied slots, {} free, {} total, len {}",
                    self.free.len(),
                    self.slots.len(),
                    self.len
                ),
            ));
        }
        Ok(())
    }
}
