// src/watch/mod.rs

//! Filesystem watching with event debouncing.

pub mod watcher;

pub use watcher::{spawn_watcher, WatcherHandle};
