//! File and standard stream I/O

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Read HTML from `path`, or from stdin when `None`
pub fn read_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut html = String::new();
            io::stdin().lock().read_to_string(&mut html)?;
            Ok(html)
        }
    }
}

/// Write to `path`, or to stdout when `None`
pub fn write_output(content: &str, path: Option<&Path>) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, content),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()
        }
    }
}
