/// Linear-time scan primitives for buffer search.
///
/// Search cost must stay linear in attacker-controlled input: the
/// external watchdog is the only timeout backstop, so a quadratic
/// worst case here is a denial-of-service primitive. `memchr`'s
/// two-way searcher gives the guarantee for free.
use memchr::memmem;
use memchr::{memchr, memrchr};

/// First occurrence of `needle` at or after `from`.
///
/// An empty needle matches at the clamped offset itself.
pub fn index_of(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let from = from.min(hay.len());
    if needle.is_empty() {
        return Some(from);
    }
    if from >= hay.len() {
        return None;
    }
    match needle.len() {
        1 => memchr(needle[0], &hay[from..]).map(|i| i + from),
        _ => memmem::find(&hay[from..], needle).map(|i| i + from),
    }
}

/// Last occurrence of `needle` starting at or before `from`.
pub fn last_index_of(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(hay.len()));
    }
    let window_end = from.saturating_add(needle.len()).min(hay.len());
    match needle.len() {
        1 => memrchr(needle[0], &hay[..window_end]),
        _ => memmem::rfind(&hay[..window_end], needle),
    }
}
