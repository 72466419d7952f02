use facet::Facet;

use crate::LinkId;

/// Link topology of one chain at a point in time.
///
/// Only adjacency is captured, never instance payloads.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct ChainSnapshot {
    /// `std::any::type_name` of the registered type.
    pub type_name: String,
    /// Number of live instances.
    pub len: usize,
    pub head: Option<LinkId>,
    pub tail: Option<LinkId>,
    /// Links in forward (construction) order.
    pub links: Vec<LinkSnapshot>,
}

#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub id: LinkId,
    pub prev: Option<LinkId>,
    pub next: Option<LinkId>,
}

impl ChainSnapshot {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ids in forward order.
    pub fn ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.iter().map(|link| link.id)
    }
}
