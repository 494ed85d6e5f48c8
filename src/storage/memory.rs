//! In-memory forum backend / 内存论坛存储
//!
//! Holds categories, the name index, denied privileges, topics and watch
//! states in process. Used for tests and for embedding search without a
//! database. A [`FailPoint`] makes one collaborator return an error.

use async_trait::async_trait;
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{topic_href, CategoryStore, MatchPattern, NameIndex, Privileges, RecentActivity};
use crate::models::{Category, RecentTopic, WatchState};
use crate::utils::unique_cids;

/// Collaborator forced to fail / 强制失败的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Index,
    Privileges,
    Store,
    Activity,
}

#[derive(Default)]
pub struct MemoryForum {
    categories: BTreeMap<i64, Category>,
    /// Sorted members of the name index / 有序名称索引
    name_index: Vec<String>,
    denied: HashMap<i64, HashSet<i64>>,
    topics: Vec<RecentTopic>,
    watch: HashMap<(i64, i64), WatchState>,
    scans: AtomicUsize,
    failing: Option<FailPoint>,
}

impl MemoryForum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category and index its name / 添加分类并建立名称索引
    pub fn add_category(&mut self, category: Category) -> &mut Self {
        self.add_index_entry(&category.index_member());
        self.categories.insert(category.cid, category);
        self
    }

    /// Add a raw name index member, well-formed or not / 添加原始索引成员
    pub fn add_index_entry(&mut self, member: &str) -> &mut Self {
        if let Err(pos) = self.name_index.binary_search_by(|m| m.as_str().cmp(member)) {
            self.name_index.insert(pos, member.to_string());
        }
        self
    }

    /// Deny every privilege on `cid` to `uid` / 拒绝用户访问分类
    pub fn deny(&mut self, uid: i64, cid: i64) -> &mut Self {
        self.denied.entry(uid).or_default().insert(cid);
        self
    }

    pub fn add_topic(&mut self, topic: RecentTopic) -> &mut Self {
        self.topics.push(topic);
        self
    }

    pub fn set_watch(&mut self, uid: i64, cid: i64, state: WatchState) -> &mut Self {
        self.watch.insert((uid, cid), state);
        self
    }

    pub fn fail(&mut self, point: FailPoint) -> &mut Self {
        self.failing = Some(point);
        self
    }

    /// Number of index scans served so far / 已执行的索引扫描次数
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if self.failing == Some(point) {
            return Err(anyhow!("{:?} backend unavailable", point));
        }
        Ok(())
    }
}

#[async_trait]
impl NameIndex for MemoryForum {
    async fn scan(&self, _key: &str, pattern: &MatchPattern, limit: usize) -> Result<Vec<String>> {
        self.check(FailPoint::Index)?;
        self.scans.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .name_index
            .iter()
            .filter(|member| pattern.matches(member))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Privileges for MemoryForum {
    async fn filter_cids(&self, _privilege: &str, cids: &[i64], uid: i64) -> Result<Vec<i64>> {
        self.check(FailPoint::Privileges)?;

        let denied = self.denied.get(&uid);
        Ok(unique_cids(cids.iter().copied())
            .into_iter()
            .filter(|cid| *cid > 0)
            .filter(|cid| self.categories.get(cid).map_or(true, |c| !c.disabled))
            .filter(|cid| denied.map_or(true, |d| !d.contains(cid)))
            .collect())
    }
}

#[async_trait]
impl CategoryStore for MemoryForum {
    async fn child_cids(&self, cid: i64) -> Result<Vec<i64>> {
        self.check(FailPoint::Store)?;

        let mut children: Vec<&Category> = self
            .categories
            .values()
            .filter(|c| c.parent_cid == cid && c.cid != cid)
            .collect();
        children.sort_by_key(|c| (c.order, c.cid));
        Ok(children.into_iter().map(|c| c.cid).collect())
    }

    async fn categories(&self, cids: &[i64], _uid: i64) -> Result<Vec<Category>> {
        self.check(FailPoint::Store)?;
        Ok(cids.iter().filter_map(|cid| self.categories.get(cid).cloned()).collect())
    }

    async fn watch_states(&self, cids: &[i64], uid: i64) -> Result<HashMap<i64, WatchState>> {
        self.check(FailPoint::Store)?;
        Ok(cids
            .iter()
            .filter_map(|cid| self.watch.get(&(uid, *cid)).map(|state| (*cid, *state)))
            .collect())
    }
}

#[async_trait]
impl RecentActivity for MemoryForum {
    async fn recent_topics(
        &self,
        categories: &[Category],
        _uid: i64,
        query_hint: Option<&str>,
    ) -> Result<HashMap<i64, Vec<RecentTopic>>> {
        self.check(FailPoint::Activity)?;

        let mut result = HashMap::new();
        for category in categories {
            let mut topics: Vec<RecentTopic> = self
                .topics
                .iter()
                .filter(|t| t.cid == category.cid)
                .cloned()
                .collect();
            topics.sort_by(|a, b| b.last_posted_at.cmp(&a.last_posted_at).then(b.tid.cmp(&a.tid)));
            topics.truncate(category.num_recent_replies.max(0) as usize);

            if topics.is_empty() {
                continue;
            }
            for topic in &mut topics {
                topic.href = topic_href(&topic.slug, query_hint);
            }
            result.insert(category.cid, topics);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CATEGORY_NAME_INDEX, PRIVILEGE_FIND};

    fn forum() -> MemoryForum {
        let mut forum = MemoryForum::new();
        forum
            .add_category(Category::new(5, "Alpha", 0, 2))
            .add_category(Category::new(9, "Alphabet", 0, 1))
            .add_category(Category::new(3, "Beta", 0, 3))
            .add_category(Category::new(11, "Alpha Child B", 5, 2))
            .add_category(Category::new(10, "Alpha Child A", 5, 1));
        forum
    }

    #[tokio::test]
    async fn test_scan_is_sorted_and_limited() {
        let forum = forum();
        let pattern = MatchPattern::contains("alph");

        let members = forum.scan(CATEGORY_NAME_INDEX, &pattern, 500).await.unwrap();
        assert_eq!(members, vec!["alpha child a:10", "alpha child b:11", "alpha:5", "alphabet:9"]);

        let limited = forum.scan(CATEGORY_NAME_INDEX, &pattern, 1).await.unwrap();
        assert_eq!(limited, vec!["alpha child a:10"]);
        assert_eq!(forum.scan_count(), 2);
    }

    #[tokio::test]
    async fn test_filter_cids_policy() {
        let mut forum = forum();
        let mut disabled = Category::new(12, "Hidden", 0, 9);
        disabled.disabled = true;
        forum.add_category(disabled).deny(7, 9);

        let visible = forum.filter_cids(PRIVILEGE_FIND, &[9, 5, 12, 0, 5, 3], 7).await.unwrap();
        assert_eq!(visible, vec![5, 3]);

        let guest = forum.filter_cids(PRIVILEGE_FIND, &[9, 5], 0).await.unwrap();
        assert_eq!(guest, vec![9, 5]);
    }

    #[tokio::test]
    async fn test_children_and_watch_states() {
        let mut forum = forum();
        forum.set_watch(7, 5, WatchState::Ignoring);

        assert_eq!(forum.child_cids(5).await.unwrap(), vec![10, 11]);
        let states = forum.watch_states(&[5, 9], 7).await.unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[&5], WatchState::Ignoring);
    }

    #[tokio::test]
    async fn test_fail_point() {
        let mut forum = forum();
        forum.fail(FailPoint::Store);

        assert!(forum.child_cids(5).await.is_err());
        assert!(forum.scan(CATEGORY_NAME_INDEX, &MatchPattern::contains("al"), 10).await.is_ok());
    }
}
