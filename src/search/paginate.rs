/// One page of cids / 分页结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub cids: Vec<i64>,
    /// 0 when pagination is off / 不分页时为0
    pub page_count: usize,
}

/// Slice `cids` to the requested page / 分页
///
/// `page` is 1-based; 0 behaves like 1. Out-of-range pages are empty.
/// `per_page` must be positive when `enabled`.
pub fn paginate(cids: &[i64], page: usize, per_page: usize, enabled: bool) -> Page {
    if !enabled {
        return Page { cids: cids.to_vec(), page_count: 0 };
    }

    let per_page = per_page.max(1);
    let total = cids.len();
    let start = page.saturating_sub(1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    Page {
        cids: cids[start..end].to_vec(),
        page_count: total.div_ceil(per_page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cids(n: i64) -> Vec<i64> {
        (1..=n).collect()
    }

    #[test]
    fn test_first_and_last_page() {
        let all = cids(120);
        let first = paginate(&all, 1, 50, true);
        assert_eq!(first.cids, cids(50));
        assert_eq!(first.page_count, 3);

        let last = paginate(&all, 3, 50, true);
        assert_eq!(last.cids, (101..=120).collect::<Vec<_>>());
    }

    #[test]
    fn test_pages_do_not_overlap() {
        let all = cids(23);
        let mut seen = Vec::new();
        for page in 1..=5 {
            seen.extend(paginate(&all, page, 5, true).cids);
        }
        assert_eq!(seen, all);
    }

    #[test]
    fn test_page_zero_and_out_of_range() {
        let all = cids(7);
        assert_eq!(paginate(&all, 0, 5, true), paginate(&all, 1, 5, true));

        let beyond = paginate(&all, 9, 5, true);
        assert!(beyond.cids.is_empty());
        assert_eq!(beyond.page_count, 2);

        let huge = paginate(&all, usize::MAX, usize::MAX, true);
        assert!(huge.cids.is_empty());
    }

    #[test]
    fn test_disabled_returns_everything() {
        let all = cids(120);
        let page = paginate(&all, 2, 50, false);
        assert_eq!(page.cids.len(), 120);
        assert_eq!(page.page_count, 0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(paginate(&[], 1, 50, true), Page { cids: vec![], page_count: 0 });
    }
}
