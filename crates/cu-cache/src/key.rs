//! Composite `(processId, sortKey)` key encoding for the `redb` table.
//!
//! Keys are `"{process_id}\0{sort_key}"`. The NUL separator sorts before
//! any other byte, so for a fixed `process_id` the encoded keys are in
//! exactly `sort_key`'s order, and a process's whole key range is bounded
//! above (exclusive) by `"{process_id}\u{1}"` regardless of what
//! `sort_key` contains. This assumes identifiers never themselves embed a
//! NUL byte, which holds for the opaque string identifiers the distilled
//! spec describes.

use cu_core::{ProcessId, SortKey};

pub fn encode(process_id: &ProcessId, sort_key: &SortKey) -> String {
    format!("{}\0{}", process_id.as_str(), sort_key.as_str())
}

pub fn process_lower_inclusive(process_id: &ProcessId) -> String {
    format!("{}\0", process_id.as_str())
}

pub fn process_upper_exclusive(process_id: &ProcessId) -> String {
    format!("{}\u{1}", process_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_for_same_process_sort_by_sort_key() {
        let p = ProcessId::from("proc-1");
        let a = encode(&p, &SortKey::from("0001"));
        let b = encode(&p, &SortKey::from("0002"));
        assert!(a < b);
    }

    #[test]
    fn process_range_excludes_other_processes() {
        let p1 = ProcessId::from("proc-1");
        let p2 = ProcessId::from("proc-10");
        let upper = process_upper_exclusive(&p1);
        let p2_key = encode(&p2, &SortKey::from("0001"));
        // "proc-1\u{1}" < "proc-10\0..." because '\u{1}' < '1'.
        assert!(upper < p2_key);
    }

    #[test]
    fn any_sort_key_stays_under_process_upper_bound() {
        let p = ProcessId::from("proc-1");
        let upper = process_upper_exclusive(&p);
        for sk in ["", "0000", "zzzzzzzz", "\u{10FFFF}"] {
            let key = encode(&p, &SortKey::from(sk));
            assert!(key < upper, "key {key:?} should be < {upper:?}");
        }
    }
}
