//! Result shaping / 结果整形
//!
//! Builds fresh [`CategoryNode`]s from the fetched records; the records
//! themselves are never modified.

use std::collections::{HashMap, HashSet};

use super::tree::children_by_parent;
use super::SearchError;
use crate::models::{Category, CategoryNode, RecentTopic, WatchState};
use crate::storage::{CategoryStore, RecentActivity};
use crate::utils::unique_cids;

/// Fetch, enrich and shape the page / 获取并整形当前页分类
pub async fn shape_page(
    store: &dyn CategoryStore,
    activity: &dyn RecentActivity,
    page_cids: &[i64],
    child_cids: &[i64],
    uid: i64,
    query_hint: Option<&str>,
) -> Result<Vec<CategoryNode>, SearchError> {
    let working = unique_cids(page_cids.iter().chain(child_cids).copied());
    if working.is_empty() {
        return Ok(Vec::new());
    }

    let records = store.categories(&working, uid).await.map_err(SearchError::Store)?;
    let watch_states = store
        .watch_states(&working, uid)
        .await
        .map_err(SearchError::Store)?;
    let posts = activity
        .recent_topics(&records, uid, query_hint)
        .await
        .map_err(SearchError::Enrichment)?;

    tracing::debug!(
        "Shaping {} records ({} on page) for uid {}",
        records.len(),
        page_cids.len(),
        uid
    );
    Ok(shape_nodes(&records, page_cids, &watch_states, &posts, uid))
}

/// Pure shaping step over already fetched data / 纯整形逻辑
pub fn shape_nodes(
    records: &[Category],
    page_cids: &[i64],
    watch_states: &HashMap<i64, WatchState>,
    posts: &HashMap<i64, Vec<RecentTopic>>,
    uid: i64,
) -> Vec<CategoryNode> {
    let by_cid: HashMap<i64, &Category> = records.iter().map(|c| (c.cid, c)).collect();
    let tree = children_by_parent(records, 0);

    let leaf = |category: &Category| CategoryNode {
        category: category.clone(),
        watch_state: watch_states
            .get(&category.cid)
            .copied()
            .unwrap_or_else(|| WatchState::default_for(uid)),
        posts: posts.get(&category.cid).cloned().unwrap_or_default(),
        children: Vec::new(),
    };

    let mut ordered: Vec<&Category> = records.iter().collect();
    ordered.sort_by_key(|c| (c.parent_cid, c.order));

    let on_page: HashSet<i64> = page_cids.iter().copied().collect();
    ordered
        .into_iter()
        .filter(|c| on_page.contains(&c.cid))
        .map(|category| {
            let limit = category.sub_categories_per_page.max(0) as usize;
            let children: Vec<CategoryNode> = tree
                .get(&category.cid)
                .map(|cids| {
                    cids.iter()
                        .filter_map(|cid| by_cid.get(cid))
                        .take(limit)
                        .map(|child| leaf(*child))
                        .collect()
                })
                .unwrap_or_default();

            CategoryNode { children, ..leaf(category) }
        })
        .collect()
}
