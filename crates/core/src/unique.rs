//! Collision-free output path allocation shared by all workers of a batch.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A reserved output location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Absolute path of the output file.
    pub path: PathBuf,
    /// File name component of `path`.
    pub file_name: String,
    /// Whether a ` (N)` suffix was added to avoid a collision.
    pub renamed: bool,
}

#[derive(Debug, Default)]
struct TrackerState {
    /// Next counter to try, per base name. 0 means the bare name.
    counters: HashMap<String, u32>,
    /// Every file name handed out in this batch.
    reserved: HashSet<String>,
}

/// Tracks which output names a batch has handed out.
///
/// [`FilenameTracker::reserve`] holds the lock for the whole check-and-reserve
/// loop, so two workers can never be given the same path. Counters only move
/// forward for a base name.
#[derive(Debug, Default)]
pub struct FilenameTracker {
    state: Mutex<TrackerState>,
}

/// Split `name` into base name and extension (including the dot).
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

fn candidate_name(proposed: &str, base: &str, ext: &str, counter: u32) -> String {
    if counter == 0 {
        proposed.to_string()
    } else {
        format!("{} ({}){}", base, counter, ext)
    }
}

/// Key used to compare reserved names. Windows file names are case-insensitive.
fn reservation_key(name: &str) -> String {
    if cfg!(windows) {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

impl FilenameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a path in `output_dir` for `proposed`, appending ` (1)`,
    /// ` (2)`, ... while the candidate exists on disk or was already handed
    /// out in this batch.
    pub fn reserve(&self, output_dir: &Path, proposed: &str) -> Reservation {
        let (base, ext) = split_extension(proposed);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let mut counter = state.counters.get(base).copied().unwrap_or(0);
        loop {
            let file_name = candidate_name(proposed, base, ext, counter);
            let path = absolute(output_dir.join(&file_name));
            let key = reservation_key(&file_name);

            if path.exists() || state.reserved.contains(&key) {
                counter += 1;
                state.counters.insert(base.to_string(), counter);
                continue;
            }

            state.counters.insert(base.to_string(), counter + 1);
            state.reserved.insert(key);
            return Reservation {
                path,
                file_name,
                renamed: counter != 0,
            };
        }
    }

    /// Counter the next reservation of `base` will start from.
    pub fn next_counter(&self, base: &str) -> u32 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.counters.get(base).copied().unwrap_or(0)
    }

    /// Number of names handed out so far.
    pub fn reserved_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.reserved.len()
    }
}
