//! The strided argument decoder: a uniform rule for turning one logical
//! per-task argument into a concrete value for task `i`, given either a
//! value per task or a single value broadcast to every task.
//!
//! This is the only place batch argument layout is interpreted; every
//! batch operation in [`crate::database`] sees plain, already-decoded
//! per-task values. Keeping the two broadcast/per-task cases behind one
//! small enum is what lets callers pass either a struct-of-arrays layout
//! (one slice per field) or a single shared value without the data-plane
//! code caring which.

use ukv_core::error::{Error, Result};

/// One logical per-task argument: either a value for every task, or a
/// single value broadcast to all of them.
#[derive(Debug, Clone, Copy)]
pub enum Strided<'a, T> {
    /// One value per task, in task order. Length must equal `tasks_count`.
    Each(&'a [T]),
    /// A single value used for every task.
    Broadcast(T),
}

impl<'a, T: Copy> Strided<'a, T> {
    /// Decode into one value per task.
    ///
    /// `allow_broadcast = false` rejects [`Strided::Broadcast`] with
    /// [`Error::Usage`] — the realization of "a zero stride on a
    /// required, non-broadcastable argument is a usage error" for
    /// arguments (like `keys`) that must vary per task.
    pub fn decode(&self, tasks_count: usize, allow_broadcast: bool) -> Result<Vec<T>> {
        match self {
            Strided::Each(values) => {
                if values.len() != tasks_count {
                    return Err(Error::Usage(format!(
                        "expected {tasks_count} elements, got {}",
                        values.len()
                    )));
                }
                Ok(values.to_vec())
            }
            Strided::Broadcast(value) => {
                if !allow_broadcast {
                    return Err(Error::Usage("this argument cannot be broadcast".to_string()));
                }
                Ok(vec![*value; tasks_count])
            }
        }
    }
}

/// Decode an optional per-task argument, filling in `default` for every
/// task when the argument is entirely absent (the "null base selects a
/// documented default" case).
pub fn decode_optional<T: Copy>(
    arg: Option<Strided<'_, T>>,
    tasks_count: usize,
    default: T,
) -> Result<Vec<T>> {
    match arg {
        Some(strided) => strided.decode(tasks_count, true),
        None => Ok(vec![default; tasks_count]),
    }
}
