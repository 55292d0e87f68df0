//! Command implementations.

pub mod watch;
pub mod wishlist;

use std::io::{self, Write};

use serde::Serialize;

/// Write `value` to stdout as pretty JSON followed by a newline.
fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()
}
