//! Consumers of the roster registry, one module per scenario.
//!
//! Each scenario writes its report to the given writer so the binary can
//! print it and the tests can inspect it.

pub mod call_count;
pub mod dynamic;
pub mod factory;
pub mod simple;

use std::io::{self, Write};

use roster::Tracked;

#[doc(hidden)]
pub use ctor;
#[doc(hidden)]
pub use roster;

#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// Append a JSON snapshot of each scenario's chain to its report.
    pub dump: bool,
}

/// Writes the link topology of `T`'s chain as pretty JSON when dumping is on.
pub fn write_snapshot<T: Tracked>(out: &mut dyn Write, options: Options) -> io::Result<()> {
    if !options.dump {
        return Ok(());
    }
    let snapshot = roster::snapshot::<T>();
    let json = facet_json::to_string_pretty(&snapshot)
        .map_err(|e| io::Error::other(format!("encode snapshot of {}: {e}", T::type_label())))?;
    writeln!(out, "{json}")
}
