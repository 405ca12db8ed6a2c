//! Skip/take windowing over an ordered, filtered entry subset.
//!
//! The store is small enough to sort in memory per request (it is a local
//! SQLite file fed by one ban engine), so pagination is an explicit,
//! testable transform: stable sort descending by the caller's key, then a
//! `[(page-1)*size, page*size)` window. Equal keys keep the store's
//! enumeration order, which makes repeated calls against an unchanged
//! snapshot return identical pages.

use ipb_schemas::PagedResult;

/// Smallest page size served, regardless of what the caller asked for.
pub const MIN_PAGE_SIZE: i64 = 10;
/// Largest page size served.
pub const MAX_PAGE_SIZE: i64 = 200;

/// A 1-based page request, as received from the caller (pre-clamp).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Clamp to the served ranges: `page >= 1`, `page_size` in
    /// [[`MIN_PAGE_SIZE`], [`MAX_PAGE_SIZE`]].
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
        }
    }
}

/// Sort `items` descending by `key` (stable on enumeration order for equal
/// keys) and return the window selected by `req`.
///
/// `req` must already be clamped; callers go through [`PageRequest::clamped`].
/// A window starting past the end yields an empty `items` with the real
/// `total` still reported.
pub fn paginate<T, K, F>(mut items: Vec<T>, key: F, req: PageRequest) -> PagedResult<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));

    let total = items.len() as i64;
    let start = (req.page - 1).saturating_mul(req.page_size);

    let window: Vec<T> = if start >= total {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(start as usize)
            .take(req.page_size as usize)
            .collect()
    };

    PagedResult {
        items: window,
        total,
        page: req.page,
        page_size: req.page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(page: i64, size: i64) -> PageRequest {
        PageRequest::new(page, size).clamped()
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(req(0, 0), PageRequest::new(1, 10));
        assert_eq!(req(-3, 5), PageRequest::new(1, 10));
        assert_eq!(req(2, 9999), PageRequest::new(2, 200));
        assert_eq!(req(7, 50), PageRequest::new(7, 50));
    }

    #[test]
    fn windows_partition_without_skip_or_duplicate() {
        let items: Vec<i64> = (0..45).collect();

        let mut seen = Vec::new();
        for page in 1..=5 {
            let r = paginate(items.clone(), |v| *v, req(page, 10));
            assert_eq!(r.total, 45);
            assert!(r.items.len() <= 10);
            seen.extend(r.items);
        }

        // Descending overall, every element exactly once.
        let expected: Vec<i64> = (0..45).rev().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn window_past_end_is_empty_with_total() {
        let r = paginate(vec![1, 2, 3], |v| *v, req(9, 10));
        assert!(r.items.is_empty());
        assert_eq!(r.total, 3);
        assert_eq!(r.page, 9);
    }

    #[test]
    fn equal_keys_keep_enumeration_order() {
        // Same sort key everywhere: page order must be the input order.
        let items = vec![("a", 5), ("b", 5), ("c", 5), ("d", 5)];
        let r = paginate(items, |(_, k)| *k, req(1, 10));
        let names: Vec<&str> = r.items.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }
}
