//! Candidate lookup on the category name index / 候选分类查找

use super::SearchError;
use crate::storage::{MatchPattern, NameIndex, CATEGORY_NAME_INDEX};

/// Cid suffix of a `<lowercased name>:<cid>` member / 解析索引成员中的cid
///
/// Names may themselves contain `:`, so only the last separator counts.
pub fn parse_member_cid(member: &str) -> Result<i64, SearchError> {
    member
        .rsplit_once(':')
        .and_then(|(_, cid)| cid.parse::<i64>().ok())
        .ok_or_else(|| SearchError::InvalidIndexEntry(member.to_string()))
}

/// Cids whose name contains `query`, in index order / 按名称查找候选分类
///
/// Queries shorter than `min_len` characters never reach the index.
pub async fn find_cids(
    index: &dyn NameIndex,
    query: &str,
    hard_cap: usize,
    min_len: usize,
) -> Result<Vec<i64>, SearchError> {
    if query.is_empty() || query.chars().count() < min_len {
        return Ok(Vec::new());
    }

    let pattern = MatchPattern::contains(query);
    let members = index
        .scan(CATEGORY_NAME_INDEX, &pattern, hard_cap)
        .await
        .map_err(SearchError::Index)?;

    members.iter().map(|member| parse_member_cid(member)).collect()
}
