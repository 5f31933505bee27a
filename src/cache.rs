/*!
The deduplicating pattern cache.

A [`PatternCache`] maps a [`PatternKey`] to the single [`CompiledPattern`]
shared by every user of that key. Entries live until a collection cycle ends
without them being reachable:

1. The host calls [`PatternCache::begin_collection`] when its collector starts
marking.
2. For every regex value the collector reaches it calls
[`PatternCache::mark_live`]. Lookups made while the cycle is open also mark
their entry.
3. [`PatternCache::sweep`] closes the cycle and removes every entry that was
not marked in *this* cycle. A mark from an earlier cycle does not count.

An entry with an outstanding [`PatternGuard`] is never removed, since an
execution may be using it.
*/

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::error::Error;
use crate::flags::FlagSet;
use crate::pattern::{CompiledPattern, PatternKey};

#[cfg(test)]
mod tests;

/// A strong handle to a cached [`CompiledPattern`].
///
/// While a guard exists, sweeps keep its entry in the cache. Dropping the
/// guard releases the pin.
#[derive(Clone, Debug)]
pub struct PatternGuard {
    pattern: Arc<CompiledPattern>,
}

impl PatternGuard {
    /// Returns true when both guards refer to the same cache entry.
    pub fn ptr_eq(a: &PatternGuard, b: &PatternGuard) -> bool {
        Arc::ptr_eq(&a.pattern, &b.pattern)
    }
}

impl Deref for PatternGuard {
    type Target = CompiledPattern;

    fn deref(&self) -> &CompiledPattern {
        &self.pattern
    }
}

/// The shape shared by every match result object created by the host: the
/// `index` and `input` properties, in that order.
#[derive(Debug, Eq, PartialEq)]
pub struct MatchResultTemplate {
    properties: [&'static str; 2],
}

impl MatchResultTemplate {
    fn new() -> MatchResultTemplate {
        MatchResultTemplate { properties: ["index", "input"] }
    }

    pub fn properties(&self) -> &[&'static str] {
        &self.properties
    }
}

#[derive(Debug)]
struct Entry {
    pattern: Arc<CompiledPattern>,
    /// The last cycle this entry was marked in.
    marked: u64,
}

impl Entry {
    /// A pinned entry has guards besides the cache's own reference.
    fn is_pinned(&self) -> bool {
        Arc::strong_count(&self.pattern) > 1
    }
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<PatternKey, Entry>,
    /// The current (or last completed) collection cycle.
    epoch: u64,
    collecting: bool,
    template: Option<Arc<MatchResultTemplate>>,
    template_marked: u64,
}

/// A deduplicating store of compiled patterns.
///
/// # Example
///
/// ```
/// use regex_shared::{FlagSet, PatternCache, PatternGuard};
///
/// let cache = PatternCache::new();
/// let a = cache.get("a+", FlagSet::GLOBAL).unwrap();
/// let b = cache.get("a+", FlagSet::GLOBAL).unwrap();
/// assert!(PatternGuard::ptr_eq(&a, &b));
/// drop((a, b));
///
/// cache.begin_collection();
/// assert_eq!(1, cache.sweep());
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct PatternCache {
    state: Mutex<State>,
}

impl PatternCache {
    pub fn new() -> PatternCache {
        PatternCache::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every update leaves the state consistent, so a panic elsewhere
        // cannot have broken it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the compiled pattern for `source` and `flags`, creating an
    /// empty one on a miss.
    ///
    /// Two lookups of the same pair return the same entry until it is swept.
    pub fn get(&self, source: &str, flags: FlagSet) -> Result<PatternGuard, Error> {
        self.get_key(PatternKey::new(source, flags))
    }

    /// Like [`get`](Self::get), for an already built key, such as one
    /// restored by deserialization.
    pub fn get_key(&self, key: PatternKey) -> Result<PatternGuard, Error> {
        let mut state = self.lock();
        let (epoch, collecting) = (state.epoch, state.collecting);
        if let Some(entry) = state.entries.get_mut(&key) {
            if collecting {
                entry.marked = epoch;
            }
            return Ok(PatternGuard { pattern: Arc::clone(&entry.pattern) });
        }
        state.entries.try_reserve(1)?;
        debug!("caching new pattern {}", key);
        let pattern = Arc::new(CompiledPattern::new(key.clone()));
        // Outside a cycle this mark is already stale for the next one.
        state.entries.insert(key, Entry { pattern: Arc::clone(&pattern), marked: epoch });
        Ok(PatternGuard { pattern })
    }

    /// Opens a new collection cycle.
    pub fn begin_collection(&self) {
        let mut state = self.lock();
        state.epoch += 1;
        state.collecting = true;
        debug!("collection cycle {} started", state.epoch);
    }

    /// Marks the entry for `key` live in the open cycle. Does nothing when no
    /// cycle is open or no such entry exists.
    pub fn mark_live(&self, key: &PatternKey) {
        let mut state = self.lock();
        if !state.collecting {
            return;
        }
        let epoch = state.epoch;
        if let Some(entry) = state.entries.get_mut(key) {
            entry.marked = epoch;
        }
    }

    /// Closes the open cycle, destroying every unpinned entry not marked
    /// during it, and returns how many entries were destroyed.
    ///
    /// Without an open cycle this does nothing and returns `0`.
    pub fn sweep(&self) -> usize {
        let mut state = self.lock();
        if !state.collecting {
            return 0;
        }
        state.collecting = false;
        let epoch = state.epoch;
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.marked == epoch || entry.is_pinned());
        let swept = before - state.entries.len();
        if state.template.is_some() && state.template_marked != epoch {
            debug!("releasing match result template");
            state.template = None;
        }
        debug!("collection cycle {} swept {} of {} patterns", epoch, swept, before);
        swept
    }

    /// Returns the shared match result template, creating it if needed.
    pub fn match_result_template(&self) -> Arc<MatchResultTemplate> {
        let mut state = self.lock();
        if state.collecting {
            state.template_marked = state.epoch;
        }
        if let Some(ref template) = state.template {
            return Arc::clone(template);
        }
        let template = Arc::new(MatchResultTemplate::new());
        state.template = Some(Arc::clone(&template));
        state.template_marked = state.epoch;
        template
    }

    /// Keeps the match result template alive through the open cycle.
    pub fn mark_match_result_template(&self) {
        let mut state = self.lock();
        if state.collecting {
            state.template_marked = state.epoch;
        }
    }

    pub fn has_match_result_template(&self) -> bool {
        self.lock().template.is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &PatternKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Returns the heap memory used by all cached patterns, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.lock().entries.values().map(|entry| entry.pattern.memory_usage()).sum()
    }
}
