//! Chunking for batch calls

/// Split `items` into consecutive chunks of at most `size` elements.
///
/// `size` is clamped to at least one so a misconfigured batch size still
/// makes progress. An empty slice yields no chunks.
pub fn chunks<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

/// Number of remote calls needed for `len` items.
pub const fn chunk_count(len: usize, size: usize) -> usize {
    let size = if size == 0 { 1 } else { size };
    len.div_ceil(size)
}
