use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

/// The value an operation yields when it cannot or must not run
pub trait SafeDefault {
    fn safe_default() -> Self;
}

impl SafeDefault for i64 {
    /// Counters and receiver counts use -1 to signal "not executed"
    fn safe_default() -> Self {
        -1
    }
}

impl SafeDefault for usize {
    fn safe_default() -> Self {
        0
    }
}

impl SafeDefault for bool {
    fn safe_default() -> Self {
        false
    }
}

impl SafeDefault for () {
    fn safe_default() -> Self {}
}

impl SafeDefault for String {
    fn safe_default() -> Self {
        String::new()
    }
}

impl<T> SafeDefault for Option<T> {
    fn safe_default() -> Self {
        None
    }
}

impl<T> SafeDefault for Vec<T> {
    fn safe_default() -> Self {
        Vec::new()
    }
}

impl<T: Eq + Hash> SafeDefault for HashSet<T> {
    fn safe_default() -> Self {
        HashSet::new()
    }
}

impl<K: Eq + Hash, V> SafeDefault for HashMap<K, V> {
    fn safe_default() -> Self {
        HashMap::new()
    }
}

impl<K: Ord, V> SafeDefault for BTreeMap<K, V> {
    fn safe_default() -> Self {
        BTreeMap::new()
    }
}
