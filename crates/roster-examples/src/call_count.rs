//! Per-function call counters that register themselves on first use.
//!
//! Dropping [`track_calls!`](crate::track_calls) into a function body gives
//! that function a counter living for the rest of the thread. The report is
//! produced by walking every counter in the chain, with no central list.

use std::io::{self, Write};

use compact_str::CompactString;
use roster::{Tracked, range};

use crate::{Options, write_snapshot};

#[derive(Debug, Clone)]
pub struct FunctionCallCounter {
    function_name: CompactString,
    calls: u32,
}

impl Tracked for FunctionCallCounter {}

impl FunctionCallCounter {
    pub fn new(function_name: impl Into<CompactString>) -> Self {
        Self {
            function_name: function_name.into(),
            calls: 0,
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    pub fn record(&mut self) {
        self.calls = self.calls.saturating_add(1);
    }
}

/// Last path segment of a marker item nested in a function body, i.e. the
/// function's own name.
#[doc(hidden)]
pub fn enclosing_function_name(marker_path: &'static str) -> &'static str {
    let path = marker_path.strip_suffix("::marker").unwrap_or(marker_path);
    path.rsplit("::").next().unwrap_or(path)
}

/// Counts calls to the enclosing function.
#[macro_export]
macro_rules! track_calls {
    () => {{
        fn marker() {}
        ::std::thread_local! {
            static COUNTER: $crate::roster::Linked<$crate::call_count::FunctionCallCounter> =
                $crate::roster::Linked::new($crate::call_count::FunctionCallCounter::new(
                    $crate::call_count::enclosing_function_name(::std::any::type_name_of_val(
                        &marker,
                    )),
                ));
        }
        COUNTER.with(|counter| counter.borrow_mut().record());
    }};
}

/// `(function name, calls)` for every counter of this thread, in first-call
/// order.
pub fn counts() -> Vec<(CompactString, u32)> {
    range::<FunctionCallCounter>()
        .iter()
        .map(|counter| {
            let counter = counter.borrow();
            (counter.function_name.clone(), counter.calls)
        })
        .collect()
}

fn foo() {
    track_calls!();
}

fn bar() {
    track_calls!();
}

pub fn run(out: &mut dyn Write, options: Options) -> io::Result<()> {
    foo();
    foo();
    bar();
    foo();
    bar();
    for i in 0..10 {
        if i % 2 == 0 {
            foo();
        }
        if i % 3 == 0 {
            bar();
        }
    }

    for counter in range::<FunctionCallCounter>().iter() {
        let counter = counter.borrow();
        writeln!(
            out,
            "Function '{}' was called #{} times.",
            counter.function_name(),
            counter.calls()
        )?;
    }

    write_snapshot::<FunctionCallCounter>(out, options)
}
