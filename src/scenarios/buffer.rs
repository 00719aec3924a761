//! Patterned byte buffers for the memory and disk scenarios.

/// Bytes per MiB.
pub const MIB: usize = 1024 * 1024;

/// Upper bound for a single per-tick buffer, in MiB.
pub const MAX_BUFFER_MB: i64 = 1024;

/// Allocate `mb` MiB and touch every byte so the pages are committed.
///
/// Returns `None` when the size overflows or the allocator refuses, so the
/// caller can idle its run instead of aborting the worker.
pub fn filled(mb: i64) -> Option<Vec<u8>> {
    let len = usize::try_from(mb).ok()?.checked_mul(MIB)?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).ok()?;
    buffer.extend((0..len).map(|i| (i % 256) as u8));
    Some(buffer)
}
