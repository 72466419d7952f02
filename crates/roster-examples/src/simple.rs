//! Visit every live `Number`, double it in place, then read the results back
//! with a read-only cursor.

use std::io::{self, Write};

use roster::{Cursor, Linked, Tracked, range};

use crate::{Options, write_snapshot};

#[derive(Debug)]
pub struct Number {
    pub value: i32,
}

impl Tracked for Number {}

pub fn run(out: &mut dyn Write, options: Options) -> io::Result<()> {
    let _numbers: Vec<Linked<Number>> = (0..4).map(|value| Linked::new(Number { value })).collect();

    for number in range::<Number>() {
        writeln!(out, "{}", number.borrow().value)?;
        number.borrow_mut().value *= 2;
    }
    writeln!(out)?;

    let range = range::<Number>();
    let mut cursor: Cursor<Number> = range.cbegin();
    while cursor != range.cend() {
        writeln!(out, "{}", cursor.get().borrow().value)?;
        cursor.move_next().map_err(io::Error::other)?;
    }

    write_snapshot::<Number>(out, options)
}
