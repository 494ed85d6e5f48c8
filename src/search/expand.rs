use futures::future::try_join_all;

use super::SearchError;
use crate::storage::{CategoryStore, Privileges, PRIVILEGE_FIND};
use crate::utils::unique_cids;

/// Visible direct children of the page cids / 获取分页分类的可见子分类
///
/// Lookups run concurrently; results are merged in page order with the
/// first occurrence of each cid kept, then filtered once.
pub async fn expand_children(
    store: &dyn CategoryStore,
    privileges: &dyn Privileges,
    page_cids: &[i64],
    uid: i64,
) -> Result<Vec<i64>, SearchError> {
    if page_cids.is_empty() {
        return Ok(Vec::new());
    }

    let children = try_join_all(page_cids.iter().map(|cid| store.child_cids(*cid)))
        .await
        .map_err(SearchError::Store)?;

    let child_cids = unique_cids(children.into_iter().flatten());
    if child_cids.is_empty() {
        return Ok(child_cids);
    }

    privileges
        .filter_cids(PRIVILEGE_FIND, &child_cids, uid)
        .await
        .map_err(SearchError::Privileges)
}
