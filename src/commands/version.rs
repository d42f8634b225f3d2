//! Version command implementation.

pub fn run() {
    println!("dockerbox {}", env!("CARGO_PKG_VERSION"));
}
