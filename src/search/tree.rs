//! One-level category tree / 分类父子关系

use std::collections::HashMap;

use crate::models::Category;

/// Child cids per parent among `categories` / 按父分类归组子分类
///
/// Children are ordered by `order`, then cid. Parents equal to `root` are
/// top-level and get no entry; a category never counts as its own child.
pub fn children_by_parent(categories: &[Category], root: i64) -> HashMap<i64, Vec<i64>> {
    let mut grouped: HashMap<i64, Vec<&Category>> = HashMap::new();
    for category in categories {
        if category.parent_cid == root || category.parent_cid == category.cid {
            continue;
        }
        grouped.entry(category.parent_cid).or_default().push(category);
    }

    grouped
        .into_iter()
        .map(|(parent, mut children)| {
            children.sort_by_key(|c| (c.order, c.cid));
            (parent, children.into_iter().map(|c| c.cid).collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_and_orders_children() {
        let categories = vec![
            Category::new(1, "root", 0, 1),
            Category::new(13, "c", 1, 2),
            Category::new(11, "a", 1, 1),
            Category::new(12, "b", 1, 1),
            Category::new(21, "x", 2, 1),
            Category::new(30, "loop", 30, 1),
        ];

        let tree = children_by_parent(&categories, 0);
        assert_eq!(tree[&1], vec![11, 12, 13]);
        assert_eq!(tree[&2], vec![21]);
        assert!(!tree.contains_key(&0));
        assert!(!tree.contains_key(&30));
    }
}
