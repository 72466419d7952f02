use std::error::Error;
use std::fmt;

use crate::LinkId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The id does not name a linked instance: it was already unlinked, or
    /// its slot has been reused by a newer instance.
    StaleLink { type_name: &'static str, id: LinkId },
    /// A cursor at the end sentinel was asked for its instance.
    EndDereference { type_name: &'static str },
    /// A cursor at the end sentinel was asked to move forward.
    AdvancePastEnd { type_name: &'static str },
    /// A chain failed validation.
    Corrupted {
        type_name: &'static str,
        detail: String,
    },
}

impl RegistryError {
    pub(crate) fn corrupted(type_name: &'static str, detail: impl Into<String>) -> Self {
        Self::Corrupted {
            type_name,
            detail: detail.into(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::StaleLink { type_name, .. }
            | Self::EndDereference { type_name }
            | Self::AdvancePastEnd { type_name }
            | Self::Corrupted { type_name, .. } => type_name,
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleLink { type_name, id } => {
                write!(f, "{id} is not a linked instance of {type_name}")
            }
            Self::EndDereference { type_name } => {
                write!(f, "cannot dereference the end cursor of {type_name}")
            }
            Self::AdvancePastEnd { type_name } => {
                write!(f, "cannot advance past the end of {type_name}")
            }
            Self::Corrupted { type_name, detail } => {
                write!(f, "invariant violated in chain of {type_name}: {detail}")
            }
        }
    }
}

impl Error for RegistryError {}
