//! Search extension hooks / 搜索扩展钩子
//!
//! Hooks are registered when the engine is built and run in registration
//! order. Each one receives the previous hook's output; the search waits
//! for the whole chain before filtering again.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use super::SearchError;
use crate::models::SearchQuery;

/// Hook point fired before the second visibility pass / 钩子名称
pub const CATEGORY_SEARCH_HOOK: &str = "filter:categories.search";

/// Data handed through the hook chain / 钩子载荷
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHookPayload {
    pub query: SearchQuery,
    pub cids: Vec<i64>,
    pub uid: i64,
}

/// Typed transformer on the candidate list / 搜索钩子
#[async_trait]
pub trait SearchHook: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(&self, payload: SearchHookPayload) -> anyhow::Result<SearchHookPayload>;
}

/// Ordered list of hooks / 钩子链
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn SearchHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn SearchHook>) {
        tracing::info!("Registered '{}' on {}", hook.name(), CATEGORY_SEARCH_HOOK);
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Run every hook in order / 依次执行钩子
    pub async fn fire(&self, mut payload: SearchHookPayload) -> Result<SearchHookPayload, SearchError> {
        for hook in &self.hooks {
            payload = hook.apply(payload).await.map_err(|source| {
                tracing::warn!("Hook '{}' failed: {}", hook.name(), source);
                SearchError::Hook {
                    hook: hook.name().to_string(),
                    source,
                }
            })?;
        }
        Ok(payload)
    }
}

/// Drops a fixed set of categories from every search / 排除指定分类
pub struct ExcludeCategories {
    cids: HashSet<i64>,
}

impl ExcludeCategories {
    pub fn new<I: IntoIterator<Item = i64>>(cids: I) -> Self {
        Self { cids: cids.into_iter().collect() }
    }
}

#[async_trait]
impl SearchHook for ExcludeCategories {
    fn name(&self) -> &str {
        "exclude-categories"
    }

    async fn apply(&self, mut payload: SearchHookPayload) -> anyhow::Result<SearchHookPayload> {
        payload.cids.retain(|cid| !self.cids.contains(cid));
        Ok(payload)
    }
}
