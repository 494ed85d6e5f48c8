//! Category search module / 分类搜索模块
//!
//! Finds categories by name for the acting user:
//! - finder: substring scan of the `categories:name` index
//! - hooks: extension point `filter:categories.search`
//! - paginate / expand / shape: page slicing, child lookup and result views
//!
//! Storage and privileges are collaborators behind the traits in
//! `crate::storage`; this module only controls the flow.

pub mod engine;
pub mod error;
pub mod expand;
pub mod finder;
pub mod hooks;
pub mod paginate;
pub mod shape;
pub mod tree;

pub use engine::{CategorySearch, SearchSettings};
pub use error::SearchError;
pub use hooks::{ExcludeCategories, HookChain, SearchHook, SearchHookPayload, CATEGORY_SEARCH_HOOK};
pub use paginate::{paginate, Page};
