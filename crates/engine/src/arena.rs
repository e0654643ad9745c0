//! Caller-reused scratch region and the value-tape layout returned from
//! batch reads and scans.
//!
//! An arena is logically reset at the start of every call that fills it.
//! The borrow checker enforces the "previously returned pointers are
//! invalidated" rule for free here: [`ReadTape`] and [`ScanTape`] borrow
//! `&mut` from the [`Arena`] that built them, so code that tried to keep
//! an old tape around across a second `build_*` call simply wouldn't
//! compile.

use ukv_core::{Key, MISSING_VALUE_LENGTH};

const LEN_WIDTH: usize = std::mem::size_of::<u32>();
const KEY_WIDTH: usize = std::mem::size_of::<Key>();

/// Caller-owned, engine-grown scratch buffer backing returned tapes.
#[derive(Debug, Default)]
pub struct Arena {
    buf: Vec<u8>,
}

impl Arena {
    /// An empty arena; the backing buffer grows lazily on first use.
    pub fn new() -> Self {
        Arena { buf: Vec::new() }
    }

    fn reset(&mut self) {
        self.buf.clear();
    }

    /// Write a read-batch result as `[len0 len1 .. lenN-1 | bytes..]` and
    /// return a view over it. `values[i] == None` is encoded as
    /// [`MISSING_VALUE_LENGTH`].
    pub fn build_read_tape(&mut self, values: &[Option<Vec<u8>>]) -> ReadTape<'_> {
        self.reset();
        let value_bytes: usize = values.iter().flatten().map(|v| v.len()).sum();
        self.buf.reserve(values.len() * LEN_WIDTH + value_bytes);

        for v in values {
            let len = match v {
                Some(bytes) => bytes.len() as u32,
                None => MISSING_VALUE_LENGTH,
            };
            self.buf.extend_from_slice(&len.to_le_bytes());
        }
        for v in values {
            if let Some(bytes) = v {
                self.buf.extend_from_slice(bytes);
            }
        }

        ReadTape {
            buf: &self.buf,
            count: values.len(),
        }
    }

    /// Write a multi-task scan result: a per-task result count header,
    /// followed by all keys concatenated task-by-task, followed
    /// optionally by all value lengths in the same order.
    pub fn build_scan_tape(&mut self, per_task: &[Vec<(Key, u32)>], with_lengths: bool) -> ScanTape<'_> {
        self.reset();

        self.buf.extend_from_slice(&(per_task.len() as u32).to_le_bytes());
        for rows in per_task {
            self.buf.extend_from_slice(&(rows.len() as u32).to_le_bytes());
        }
        for rows in per_task {
            for (key, _) in rows {
                self.buf.extend_from_slice(&key.to_le_bytes());
            }
        }
        if with_lengths {
            for rows in per_task {
                for (_, len) in rows {
                    self.buf.extend_from_slice(&len.to_le_bytes());
                }
            }
        }

        ScanTape {
            buf: &self.buf,
            task_count: per_task.len(),
            with_lengths,
        }
    }
}

/// A read-batch result view into an [`Arena`].
pub struct ReadTape<'a> {
    buf: &'a [u8],
    count: usize,
}

impl<'a> ReadTape<'a> {
    /// Number of tasks in this result.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Raw length for task `i`: [`MISSING_VALUE_LENGTH`] if absent.
    pub fn len_at(&self, i: usize) -> u32 {
        let offset = i * LEN_WIDTH;
        u32::from_le_bytes(self.buf[offset..offset + LEN_WIDTH].try_into().unwrap())
    }

    /// The value bytes for task `i`, or `None` if missing.
    pub fn value_at(&self, i: usize) -> Option<&'a [u8]> {
        let len = self.len_at(i);
        if len == MISSING_VALUE_LENGTH {
            return None;
        }
        let header_bytes = self.count * LEN_WIDTH;
        let mut offset = header_bytes;
        for j in 0..i {
            let lj = self.len_at(j);
            if lj != MISSING_VALUE_LENGTH {
                offset += lj as usize;
            }
        }
        let len = len as usize;
        Some(&self.buf[offset..offset + len])
    }
}

/// A scan-batch result view into an [`Arena`].
pub struct ScanTape<'a> {
    buf: &'a [u8],
    task_count: usize,
    with_lengths: bool,
}

impl<'a> ScanTape<'a> {
    /// Number of tasks in this result.
    pub fn task_count(&self) -> usize {
        self.task_count
    }

    fn task_result_count(&self, task: usize) -> usize {
        let offset = LEN_WIDTH + task * LEN_WIDTH;
        u32::from_le_bytes(self.buf[offset..offset + LEN_WIDTH].try_into().unwrap()) as usize
    }

    fn keys_region_offset(&self) -> usize {
        LEN_WIDTH + self.task_count * LEN_WIDTH
    }

    fn row_index_before(&self, task: usize) -> usize {
        (0..task).map(|t| self.task_result_count(t)).sum()
    }

    /// Keys found for `task`, ascending.
    pub fn keys_for(&self, task: usize) -> Vec<Key> {
        let rows = self.task_result_count(task);
        let start_row = self.row_index_before(task);
        let base = self.keys_region_offset() + start_row * KEY_WIDTH;
        (0..rows)
            .map(|i| {
                let offset = base + i * KEY_WIDTH;
                Key::from_le_bytes(self.buf[offset..offset + KEY_WIDTH].try_into().unwrap())
            })
            .collect()
    }

    /// Value lengths for `task`, in the same order as [`Self::keys_for`],
    /// if this tape was built with lengths.
    pub fn lengths_for(&self, task: usize) -> Option<Vec<u32>> {
        if !self.with_lengths {
            return None;
        }
        let total_rows: usize = (0..self.task_count).map(|t| self.task_result_count(t)).sum();
        let rows = self.task_result_count(task);
        let start_row = self.row_index_before(task);
        let base = self.keys_region_offset() + total_rows * KEY_WIDTH + start_row * LEN_WIDTH;
        Some(
            (0..rows)
                .map(|i| {
                    let offset = base + i * LEN_WIDTH;
                    u32::from_le_bytes(self.buf[offset..offset + LEN_WIDTH].try_into().unwrap())
                })
                .collect(),
        )
    }
}
