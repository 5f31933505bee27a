use std::sync::Arc;

use crate::flags::FlagSet;
use crate::pattern::PatternKey;

use super::{PatternCache, PatternGuard};

#[test]
fn lookups_are_deduplicated() {
    let cache = PatternCache::new();
    let a = cache.get("a+", FlagSet::empty()).unwrap();
    let b = cache.get("a+", FlagSet::empty()).unwrap();
    let c = cache.get("a+", FlagSet::GLOBAL).unwrap();
    let d = cache.get("a*", FlagSet::empty()).unwrap();
    assert!(PatternGuard::ptr_eq(&a, &b));
    assert!(!PatternGuard::ptr_eq(&a, &c));
    assert!(!PatternGuard::ptr_eq(&a, &d));
    assert_eq!(cache.len(), 3);
    assert!(cache.contains(&PatternKey::new("a+", FlagSet::GLOBAL)));
    assert!(!cache.contains(&PatternKey::new("a+", FlagSet::STICKY)));
}

#[test]
fn sweep_without_collection_is_a_no_op() {
    let cache = PatternCache::new();
    drop(cache.get("a", FlagSet::empty()).unwrap());
    assert_eq!(cache.sweep(), 0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn unmarked_entries_are_swept() {
    let cache = PatternCache::new();
    drop(cache.get("a", FlagSet::empty()).unwrap());
    drop(cache.get("b", FlagSet::empty()).unwrap());
    cache.begin_collection();
    cache.mark_live(&PatternKey::new("a", FlagSet::empty()));
    assert_eq!(cache.sweep(), 1);
    assert!(cache.contains(&PatternKey::new("a", FlagSet::empty())));
    assert!(!cache.contains(&PatternKey::new("b", FlagSet::empty())));
}

#[test]
fn stale_marks_do_not_keep_entries() {
    let cache = PatternCache::new();
    let key = PatternKey::new("a", FlagSet::empty());
    drop(cache.get_key(key.clone()).unwrap());

    cache.begin_collection();
    cache.mark_live(&key);
    assert_eq!(cache.sweep(), 0);

    cache.begin_collection();
    assert_eq!(cache.sweep(), 1);
    assert!(cache.is_empty());

    // a later lookup builds a fresh entry
    let second = cache.get_key(key).unwrap();
    assert_eq!(second.group_count(), None);
    assert_eq!(cache.len(), 1);
}

#[test]
fn mark_outside_collection_is_ignored() {
    let cache = PatternCache::new();
    let key = PatternKey::new("a", FlagSet::empty());
    drop(cache.get_key(key.clone()).unwrap());
    cache.mark_live(&key);
    cache.begin_collection();
    assert_eq!(cache.sweep(), 1);
}

#[test]
fn lookups_during_collection_mark() {
    let cache = PatternCache::new();
    drop(cache.get("old", FlagSet::empty()).unwrap());
    cache.begin_collection();
    drop(cache.get("old", FlagSet::empty()).unwrap());
    drop(cache.get("new", FlagSet::empty()).unwrap());
    assert_eq!(cache.sweep(), 0);
    assert_eq!(cache.len(), 2);
}

#[test]
fn guards_pin_entries() {
    let cache = PatternCache::new();
    let guard = cache.get("a", FlagSet::empty()).unwrap();
    cache.begin_collection();
    assert_eq!(cache.sweep(), 0);
    let again = cache.get("a", FlagSet::empty()).unwrap();
    assert!(PatternGuard::ptr_eq(&guard, &again));
    drop((guard, again));
    cache.begin_collection();
    assert_eq!(cache.sweep(), 1);
}

#[test]
fn match_result_template() {
    let cache = PatternCache::new();
    assert!(!cache.has_match_result_template());
    let template = cache.match_result_template();
    assert_eq!(template.properties(), &["index", "input"]);
    assert!(Arc::ptr_eq(&template, &cache.match_result_template()));

    cache.begin_collection();
    cache.mark_match_result_template();
    cache.sweep();
    assert!(cache.has_match_result_template());

    cache.begin_collection();
    cache.sweep();
    assert!(!cache.has_match_result_template());
    // the released template is recreated on demand
    assert!(!Arc::ptr_eq(&template, &cache.match_result_template()));
}

#[test]
fn memory_usage_grows_with_compilation() {
    use crate::exec::Executor;
    use crate::input::CharBuffer;

    let cache = PatternCache::new();
    let guard = cache.get("(a|b)+c", FlagSet::empty()).unwrap();
    let before = cache.memory_usage();
    Executor::default().is_match(&guard, CharBuffer::latin1(b"abc"), 0).unwrap();
    assert!(cache.memory_usage() > before);
}
