//! Forum storage collaborators used by category search / 分类搜索依赖的存储接口
//!
//! Search only talks to these traits; it never owns the data behind them.
//! - `SqliteForum` / `SqlitePrivileges`: production backends on the forum database
//! - `MemoryForum`: in-process backend for tests and embedding

use async_trait::async_trait;
use anyhow::Result;
use std::collections::HashMap;

use crate::models::{Category, RecentTopic, WatchState};

pub mod memory;
pub mod privileges;
pub mod sqlite;

pub use memory::{FailPoint, MemoryForum};
pub use privileges::SqlitePrivileges;
pub use sqlite::SqliteForum;

/// Sorted set of `<lowercased name>:<cid>` members / 分类名称索引键
pub const CATEGORY_NAME_INDEX: &str = "categories:name";

/// Privilege required to see a category in search results / 搜索所需权限
pub const PRIVILEGE_FIND: &str = "find";

/// Case-insensitive substring pattern for sorted set scans / 子串匹配模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPattern {
    needle: String,
}

impl MatchPattern {
    pub fn contains(needle: &str) -> Self {
        Self { needle: needle.to_lowercase() }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, member: &str) -> bool {
        member.to_lowercase().contains(&self.needle)
    }

    /// SQLite GLOB form `*needle*`, with `*`, `?` and `[` matched literally
    pub fn to_glob(&self) -> String {
        let mut glob = String::with_capacity(self.needle.len() + 2);
        glob.push('*');
        for ch in self.needle.chars() {
            match ch {
                '*' | '?' | '[' => {
                    glob.push('[');
                    glob.push(ch);
                    glob.push(']');
                }
                _ => glob.push(ch),
            }
        }
        glob.push('*');
        glob
    }
}

/// Sorted name index / 有序名称索引
#[async_trait]
pub trait NameIndex: Send + Sync {
    /// Members of `key` matching `pattern`, in index order, at most `limit`
    async fn scan(&self, key: &str, pattern: &MatchPattern, limit: usize) -> Result<Vec<String>>;
}

/// Category privilege checks / 分类权限检查
#[async_trait]
pub trait Privileges: Send + Sync {
    /// Subset of `cids` that `uid` holds `privilege` on, in input order
    async fn filter_cids(&self, privilege: &str, cids: &[i64], uid: i64) -> Result<Vec<i64>>;
}

/// Category records and hierarchy / 分类数据
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Direct children of `cid` in display order / 直接子分类
    async fn child_cids(&self, cid: i64) -> Result<Vec<i64>>;

    /// Records for `cids` in input order; unknown cids are skipped / 批量获取分类
    async fn categories(&self, cids: &[i64], uid: i64) -> Result<Vec<Category>>;

    /// Explicit watch states of `uid`; missing entries mean the default
    async fn watch_states(&self, cids: &[i64], uid: i64) -> Result<HashMap<i64, WatchState>> {
        let _ = (cids, uid);
        Ok(HashMap::new())
    }
}

/// Recent activity enrichment / 最近活动
#[async_trait]
pub trait RecentActivity: Send + Sync {
    /// Recent topics per cid. `query_hint` is the caller's opaque query string.
    async fn recent_topics(
        &self,
        categories: &[Category],
        uid: i64,
        query_hint: Option<&str>,
    ) -> Result<HashMap<i64, Vec<RecentTopic>>>;
}

/// Topic link with the caller's query string appended / 生成主题链接
pub(crate) fn topic_href(slug: &str, query_hint: Option<&str>) -> String {
    match query_hint.map(|qs| qs.trim_start_matches('?')).filter(|qs| !qs.is_empty()) {
        Some(qs) => format!("/topic/{}?{}", slug, qs),
        None => format!("/topic/{}", slug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_pattern() {
        let pattern = MatchPattern::contains("AlPh");
        assert_eq!(pattern.needle(), "alph");
        assert!(pattern.matches("alphabet:9"));
        assert!(pattern.matches("ALPHA:5"));
        assert!(!pattern.matches("beta:3"));
    }

    #[test]
    fn test_glob_escapes_metacharacters() {
        assert_eq!(MatchPattern::contains("alph").to_glob(), "*alph*");
        assert_eq!(MatchPattern::contains("a*b?").to_glob(), "*a[*]b[?]*");
        assert_eq!(MatchPattern::contains("[x]").to_glob(), "*[[]x]*");
    }

    #[test]
    fn test_topic_href() {
        assert_eq!(topic_href("4/hello", None), "/topic/4/hello");
        assert_eq!(topic_href("4/hello", Some("")), "/topic/4/hello");
        assert_eq!(topic_href("4/hello", Some("?lang=en")), "/topic/4/hello?lang=en");
        assert_eq!(topic_href("4/hello", Some("lang=en")), "/topic/4/hello?lang=en");
    }
}
