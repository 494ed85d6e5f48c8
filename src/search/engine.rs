//! Category search engine / 分类搜索引擎
//!
//! Pipeline: find → hooks → filter → paginate → expand → shape.
//! The engine holds no request state and is shared behind an `Arc`.

use std::sync::Arc;
use std::time::Instant;

use super::expand::expand_children;
use super::finder::find_cids;
use super::hooks::{HookChain, SearchHook, SearchHookPayload};
use super::paginate::paginate;
use super::shape::shape_page;
use super::SearchError;
use crate::config::SearchConfig;
use crate::models::{SearchQuery, SearchResult};
use crate::storage::{CategoryStore, NameIndex, Privileges, RecentActivity, PRIVILEGE_FIND};
use crate::utils::format_timing;

/// Shortest query that ever reaches the name index / 最短有效查询长度
pub const MIN_QUERY_LENGTH: usize = 2;

/// Defaults applied when a query leaves a limit unset / 搜索默认参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub hard_cap: usize,
    pub results_per_page: usize,
    pub min_query_length: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            hard_cap: 500,
            results_per_page: 50,
            min_query_length: MIN_QUERY_LENGTH,
        }
    }
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        let defaults = Self::default();
        Self {
            hard_cap: positive_or(config.hard_cap, defaults.hard_cap),
            results_per_page: positive_or(config.results_per_page, defaults.results_per_page),
            min_query_length: config.min_query_length.max(MIN_QUERY_LENGTH),
        }
    }
}

fn positive_or(value: usize, fallback: usize) -> usize {
    if value > 0 { value } else { fallback }
}

/// Category search / 分类搜索
pub struct CategorySearch {
    index: Arc<dyn NameIndex>,
    store: Arc<dyn CategoryStore>,
    privileges: Arc<dyn Privileges>,
    activity: Arc<dyn RecentActivity>,
    hooks: HookChain,
    settings: SearchSettings,
}

impl CategorySearch {
    pub fn new(
        index: Arc<dyn NameIndex>,
        store: Arc<dyn CategoryStore>,
        privileges: Arc<dyn Privileges>,
        activity: Arc<dyn RecentActivity>,
    ) -> Self {
        Self {
            index,
            store,
            privileges,
            activity,
            hooks: HookChain::new(),
            settings: SearchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Append a hook to `filter:categories.search` / 注册搜索钩子
    pub fn with_hook(mut self, hook: Arc<dyn SearchHook>) -> Self {
        self.hooks.register(hook);
        self
    }

    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    /// Run one search / 执行搜索
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResult, SearchError> {
        let started = Instant::now();
        let uid = query.uid;
        let hard_cap = query
            .hard_cap
            .filter(|cap| *cap > 0)
            .unwrap_or(self.settings.hard_cap);

        let candidates = find_cids(
            self.index.as_ref(),
            &query.query,
            hard_cap,
            self.settings.min_query_length,
        )
        .await?;
        let candidate_count = candidates.len();

        // Hooks see raw matches and may rewrite both the cids and the paging parameters
        let payload = self
            .hooks
            .fire(SearchHookPayload { query, cids: candidates, uid })
            .await?;
        let query = payload.query;
        let cids = self.filter(&payload.cids, uid).await?;

        let per_page = query
            .results_per_page
            .filter(|n| *n > 0)
            .unwrap_or(self.settings.results_per_page);
        let page = paginate(&cids, query.page, per_page, query.paginate);

        let child_cids = expand_children(
            self.store.as_ref(),
            self.privileges.as_ref(),
            &page.cids,
            uid,
        )
        .await?;

        let categories = shape_page(
            self.store.as_ref(),
            self.activity.as_ref(),
            &page.cids,
            &child_cids,
            uid,
            query.qs.as_deref(),
        )
        .await?;

        tracing::debug!(
            "Category search '{}' (uid {}): {} candidates, {} visible, page {} with {} categories",
            query.query,
            uid,
            candidate_count,
            cids.len(),
            query.page.max(1),
            categories.len()
        );

        Ok(SearchResult {
            match_count: cids.len(),
            page_count: page.page_count,
            timing: format_timing(started.elapsed()),
            categories,
        })
    }

    async fn filter(&self, cids: &[i64], uid: i64) -> Result<Vec<i64>, SearchError> {
        self.privileges
            .filter_cids(PRIVILEGE_FIND, cids, uid)
            .await
            .map_err(SearchError::Privileges)
    }
}
