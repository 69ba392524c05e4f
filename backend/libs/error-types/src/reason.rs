//! Reason phrases for the HTTP status line
//!
//! actix keeps a response's reason phrase as `&'static str`, while gateway
//! reason phrases are failure messages known only at runtime. Messages are
//! interned in a process-wide table: each distinct phrase is allocated once
//! and reused afterwards. The table is bounded; once full, new phrases are
//! refused and the response keeps the status code's canonical reason.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of distinct phrases kept
pub const DEFAULT_CAPACITY: usize = 1024;

/// Longest phrase written to the status line, in bytes
pub const MAX_REASON_LEN: usize = 256;

static PHRASES: Lazy<DashMap<String, &'static str>> = Lazy::new(DashMap::new);
static CAPACITY: AtomicUsize = AtomicUsize::new(DEFAULT_CAPACITY);
/// Slots taken, counted before insertion so the bound holds under races
static RESERVED: AtomicUsize = AtomicUsize::new(0);

/// Change how many distinct phrases may be interned
///
/// Phrases already interned stay available.
pub fn set_capacity(capacity: usize) {
    CAPACITY.store(capacity, Ordering::Relaxed);
}

pub fn capacity() -> usize {
    CAPACITY.load(Ordering::Relaxed)
}

/// Number of phrases interned so far
pub fn interned() -> usize {
    RESERVED.load(Ordering::Acquire)
}

/// Make `message` safe for a status line
///
/// Control characters (CR and LF included) become spaces, surrounding
/// whitespace is trimmed and the result is cut to [`MAX_REASON_LEN`] bytes
/// on a character boundary. Returns `None` when nothing is left.
pub fn sanitize(message: &str) -> Option<String> {
    let cleaned: String = message
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        return None;
    }

    let mut end = trimmed.len().min(MAX_REASON_LEN);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }

    Some(trimmed[..end].trim_end().to_string())
}

/// Static reason phrase for `message`
///
/// `None` means the caller should fall back to the canonical reason.
pub fn reason_phrase(message: &str) -> Option<&'static str> {
    let phrase = sanitize(message)?;

    if let Some(existing) = PHRASES.get(&phrase) {
        return Some(*existing.value());
    }

    let reserved = RESERVED.fetch_update(Ordering::AcqRel, Ordering::Acquire, |taken| {
        (taken < capacity()).then_some(taken + 1)
    });
    if reserved.is_err() {
        tracing::debug!(
            capacity = capacity(),
            "Reason phrase table full, using canonical reason"
        );
        return None;
    }

    let interned = match PHRASES.entry(phrase) {
        Entry::Occupied(entry) => {
            // Another caller interned it first; hand the slot back
            RESERVED.fetch_sub(1, Ordering::AcqRel);
            *entry.get()
        }
        Entry::Vacant(entry) => {
            let leaked: &'static str = Box::leak(entry.key().clone().into_boxed_str());
            *entry.insert(leaked)
        }
    };

    Some(interned)
}
