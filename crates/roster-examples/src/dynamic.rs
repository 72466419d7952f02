//! Instances join the chain when created and leave it when their scope ends.

use std::io::{self, Write};

use roster::{Linked, Tracked, range};

use crate::{Options, write_snapshot};

#[derive(Debug)]
pub struct Number {
    pub value: i32,
}

impl Tracked for Number {}

fn number(value: i32) -> Linked<Number> {
    Linked::new(Number { value })
}

fn print_all(out: &mut dyn Write) -> io::Result<()> {
    for number in range::<Number>().iter() {
        writeln!(out, "{}", number.borrow().value)?;
    }
    writeln!(out)
}

pub fn run(out: &mut dyn Write, options: Options) -> io::Result<()> {
    let _a = number(0);
    let _b = number(1);
    print_all(out)?;

    {
        let _scoped = [2, 3, 4].map(number);
        print_all(out)?;
        write_snapshot::<Number>(out, options)?;
    }

    print_all(out)?;
    write_snapshot::<Number>(out, options)
}
