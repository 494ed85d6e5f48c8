use serde::{Deserialize, Serialize};

/// Category row as stored / 分类记录
///
/// Records are read-only once fetched; shaping builds [`CategoryNode`]s
/// instead of touching these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub cid: i64,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub icon: Option<String>,
    /// 0 for root categories / 根分类为0
    pub parent_cid: i64,
    /// Sort key among siblings / 同级排序
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub sub_categories_per_page: i64,
    pub num_recent_replies: i64,
    pub topic_count: i64,
    pub post_count: i64,
    pub disabled: bool,
    pub link: Option<String>,
}

impl Category {
    /// Minimal category, mostly useful when seeding data / 构造最简分类
    pub fn new(cid: i64, name: &str, parent_cid: i64, order: i64) -> Self {
        Self {
            cid,
            name: name.to_string(),
            description: String::new(),
            slug: format!("{}/{}", cid, name.to_lowercase().replace(' ', "-")),
            icon: None,
            parent_cid,
            order,
            sub_categories_per_page: 10,
            num_recent_replies: 1,
            topic_count: 0,
            post_count: 0,
            disabled: false,
            link: None,
        }
    }

    /// Member stored in the `categories:name` sorted set / 名称索引成员
    pub fn index_member(&self) -> String {
        format!("{}:{}", self.name.to_lowercase(), self.cid)
    }
}

/// Per-user watch state of a category / 用户对分类的关注状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchState {
    Ignoring,
    NotWatching,
    Tracking,
    Watching,
}

impl WatchState {
    /// State used when the user never chose one / 默认关注状态
    pub fn default_for(uid: i64) -> Self {
        if uid > 0 {
            WatchState::Watching
        } else {
            WatchState::NotWatching
        }
    }
}

impl From<&str> for WatchState {
    fn from(s: &str) -> Self {
        match s {
            "ignoring" => WatchState::Ignoring,
            "notwatching" => WatchState::NotWatching,
            "tracking" => WatchState::Tracking,
            _ => WatchState::Watching,
        }
    }
}

/// Recent topic attached to a category / 分类最近主题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTopic {
    pub tid: i64,
    pub cid: i64,
    pub uid: i64,
    pub title: String,
    pub slug: String,
    /// Unix timestamp (seconds) / 最后回复时间
    pub last_posted_at: i64,
    pub href: String,
}

/// Shaped category view returned by search / 搜索返回的分类视图
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub watch_state: WatchState,
    pub posts: Vec<RecentTopic>,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn cid(&self) -> i64 {
        self.category.cid
    }
}

/// Category search request / 分类搜索请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: usize,
    /// Acting user, 0 for guests / 当前用户
    #[serde(default)]
    pub uid: i64,
    #[serde(default = "default_paginate")]
    pub paginate: bool,
    #[serde(default)]
    pub hard_cap: Option<usize>,
    #[serde(default)]
    pub results_per_page: Option<usize>,
    /// Opaque query string forwarded to recent-activity enrichment / 透传查询串
    #[serde(default)]
    pub qs: Option<String>,
    /// Free-form data for search hooks / 扩展数据
    #[serde(default)]
    pub extra: serde_json::Value,
}

fn default_page() -> usize { 1 }
fn default_paginate() -> bool { true }

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: default_page(),
            uid: 0,
            paginate: default_paginate(),
            hard_cap: None,
            results_per_page: None,
            qs: None,
            extra: serde_json::Value::Null,
        }
    }
}

impl SearchQuery {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Default::default()
        }
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn uid(mut self, uid: i64) -> Self {
        self.uid = uid;
        self
    }

    pub fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    pub fn hard_cap(mut self, hard_cap: usize) -> Self {
        self.hard_cap = Some(hard_cap);
        self
    }

    pub fn results_per_page(mut self, results_per_page: usize) -> Self {
        self.results_per_page = Some(results_per_page);
        self
    }

    pub fn qs(mut self, qs: &str) -> Self {
        self.qs = Some(qs.to_string());
        self
    }
}

/// Category search response / 分类搜索结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Visible matches before pagination / 分页前可见匹配数
    pub match_count: usize,
    /// 0 when not paginating / 不分页时为0
    pub page_count: usize,
    /// Seconds, two decimals / 耗时（秒）
    pub timing: String,
    pub categories: Vec<CategoryNode>,
}

impl SearchResult {
    pub fn cids(&self) -> Vec<i64> {
        self.categories.iter().map(CategoryNode::cid).collect()
    }
}
