//! Album discovery

pub mod scanner;

pub use scanner::{find_album_dirs, find_album_dirs_in, list_album};
