//! SQLite forum backend / SQLite 论坛存储
//!
//! Implements the name index, category store and recent-activity lookups on
//! the main forum database. The `categories:name` sorted set is derived data
//! and can be rebuilt from the `categories` table at any time.

use async_trait::async_trait;
use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use super::{topic_href, CategoryStore, MatchPattern, NameIndex, RecentActivity, CATEGORY_NAME_INDEX};
use crate::models::{Category, RecentTopic, WatchState};
use crate::utils::sql_placeholders;

const CATEGORY_COLUMNS: &str = "cid, name, description, slug, icon, parent_cid, sort_order, \
    sub_categories_per_page, num_recent_replies, topic_count, post_count, disabled, link";

/// Forum data on SQLite / 论坛数据
#[derive(Clone)]
pub struct SqliteForum {
    db: SqlitePool,
}

impl SqliteForum {
    /// Use existing connection pool / 使用现有数据库连接池
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Rebuild `categories:name` from the categories table / 重建分类名称索引
    ///
    /// Returns the number of indexed categories.
    pub async fn rebuild_name_index(&self) -> Result<u64> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM sorted_sets WHERE set_key = ?")
            .bind(CATEGORY_NAME_INDEX)
            .execute(&mut *tx)
            .await?;

        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT cid, name FROM categories ORDER BY cid")
            .fetch_all(&mut *tx)
            .await?;

        for (cid, name) in &rows {
            sqlx::query("INSERT OR REPLACE INTO sorted_sets (set_key, member, score) VALUES (?, ?, 0)")
                .bind(CATEGORY_NAME_INDEX)
                .bind(format!("{}:{}", name.to_lowercase(), cid))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("Category name index rebuilt: {} entries", rows.len());
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl NameIndex for SqliteForum {
    async fn scan(&self, key: &str, pattern: &MatchPattern, limit: usize) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT member FROM sorted_sets
            WHERE set_key = ? AND lower(member) GLOB ?
            ORDER BY score ASC, member ASC
            LIMIT ?
            "#
        )
        .bind(key)
        .bind(pattern.to_glob())
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|(member,)| member).collect())
    }
}

#[async_trait]
impl CategoryStore for SqliteForum {
    async fn child_cids(&self, cid: i64) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT cid FROM categories WHERE parent_cid = ? AND cid != ? ORDER BY sort_order ASC, cid ASC"
        )
        .bind(cid)
        .bind(cid)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|(cid,)| cid).collect())
    }

    async fn categories(&self, cids: &[i64], _uid: i64) -> Result<Vec<Category>> {
        if cids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM categories WHERE cid IN ({})",
            CATEGORY_COLUMNS,
            sql_placeholders(cids.len())
        );
        let mut query = sqlx::query_as::<_, Category>(&sql);
        for cid in cids {
            query = query.bind(*cid);
        }
        let rows = query.fetch_all(&self.db).await?;

        let mut by_cid: HashMap<i64, Category> = rows.into_iter().map(|c| (c.cid, c)).collect();
        Ok(cids.iter().filter_map(|cid| by_cid.remove(cid)).collect())
    }

    async fn watch_states(&self, cids: &[i64], uid: i64) -> Result<HashMap<i64, WatchState>> {
        if uid <= 0 || cids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT cid, state FROM category_watch WHERE uid = ? AND cid IN ({})",
            sql_placeholders(cids.len())
        );
        let mut query = sqlx::query_as::<_, (i64, String)>(&sql).bind(uid);
        for cid in cids {
            query = query.bind(*cid);
        }
        let rows = query.fetch_all(&self.db).await?;

        Ok(rows
            .into_iter()
            .map(|(cid, state)| (cid, WatchState::from(state.as_str())))
            .collect())
    }
}

#[async_trait]
impl RecentActivity for SqliteForum {
    async fn recent_topics(
        &self,
        categories: &[Category],
        _uid: i64,
        query_hint: Option<&str>,
    ) -> Result<HashMap<i64, Vec<RecentTopic>>> {
        let mut result = HashMap::new();

        for category in categories.iter().filter(|c| c.num_recent_replies > 0) {
            let rows = sqlx::query(
                r#"
                SELECT tid, cid, uid, title, slug, last_posted_at FROM topics
                WHERE cid = ? AND deleted = 0
                ORDER BY last_posted_at DESC, tid DESC
                LIMIT ?
                "#
            )
            .bind(category.cid)
            .bind(category.num_recent_replies)
            .fetch_all(&self.db)
            .await?;

            let topics: Vec<RecentTopic> = rows
                .iter()
                .map(|row| {
                    let slug: String = row.get("slug");
                    RecentTopic {
                        tid: row.get("tid"),
                        cid: row.get("cid"),
                        uid: row.get("uid"),
                        title: row.get("title"),
                        href: topic_href(&slug, query_hint),
                        slug,
                        last_posted_at: row.get("last_posted_at"),
                    }
                })
                .collect();

            if !topics.is_empty() {
                result.insert(category.cid, topics);
            }
        }

        Ok(result)
    }
}

/// Insert a category row, used to seed test databases / 插入分类（测试用）
#[cfg(test)]
pub(crate) async fn insert_category(pool: &SqlitePool, category: &Category) {
    sqlx::query(&format!(
        "INSERT INTO categories ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        CATEGORY_COLUMNS
    ))
    .bind(category.cid)
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.slug)
    .bind(&category.icon)
    .bind(category.parent_cid)
    .bind(category.order)
    .bind(category.sub_categories_per_page)
    .bind(category.num_recent_replies)
    .bind(category.topic_count)
    .bind(category.post_count)
    .bind(category.disabled)
    .bind(&category.link)
    .execute(pool)
    .await
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    async fn seeded_forum() -> (SqlitePool, SqliteForum) {
        let pool = memory_pool().await;
        insert_category(&pool, &Category::new(5, "Alpha", 0, 2)).await;
        insert_category(&pool, &Category::new(9, "Alphabet", 0, 1)).await;
        insert_category(&pool, &Category::new(3, "Beta", 0, 3)).await;
        insert_category(&pool, &Category::new(11, "Alpha Child B", 5, 2)).await;
        insert_category(&pool, &Category::new(10, "Alpha Child A", 5, 1)).await;
        let forum = SqliteForum::new(pool.clone());
        forum.rebuild_name_index().await.unwrap();
        (pool, forum)
    }

    #[tokio::test]
    async fn test_rebuild_and_scan() {
        let (_pool, forum) = seeded_forum().await;

        let members = forum
            .scan(CATEGORY_NAME_INDEX, &MatchPattern::contains("ALPH"), 500)
            .await
            .unwrap();
        assert_eq!(members, vec![
            "alpha child a:10",
            "alpha child b:11",
            "alpha:5",
            "alphabet:9",
        ]);

        let limited = forum
            .scan(CATEGORY_NAME_INDEX, &MatchPattern::contains("alph"), 2)
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);

        assert_eq!(forum.rebuild_name_index().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_scan_treats_glob_characters_literally() {
        let (pool, forum) = seeded_forum().await;
        insert_category(&pool, &Category::new(20, "Q&A [beta]", 0, 9)).await;
        forum.rebuild_name_index().await.unwrap();

        let members = forum
            .scan(CATEGORY_NAME_INDEX, &MatchPattern::contains("[beta"), 500)
            .await
            .unwrap();
        assert_eq!(members, vec!["q&a [beta]:20"]);

        let none = forum
            .scan(CATEGORY_NAME_INDEX, &MatchPattern::contains("a*a"), 500)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_child_cids_in_display_order() {
        let (_pool, forum) = seeded_forum().await;
        assert_eq!(forum.child_cids(5).await.unwrap(), vec![10, 11]);
        assert!(forum.child_cids(9).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_categories_keep_input_order_and_skip_unknown() {
        let (_pool, forum) = seeded_forum().await;
        let records = forum.categories(&[9, 404, 5], 1).await.unwrap();
        let cids: Vec<i64> = records.iter().map(|c| c.cid).collect();
        assert_eq!(cids, vec![9, 5]);
        assert_eq!(records[1].order, 2);
        assert!(forum.categories(&[], 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_states() {
        let (pool, forum) = seeded_forum().await;
        sqlx::query("INSERT INTO category_watch (uid, cid, state) VALUES (7, 5, 'ignoring')")
            .execute(&pool)
            .await
            .unwrap();

        let states = forum.watch_states(&[5, 9], 7).await.unwrap();
        assert_eq!(states.get(&5), Some(&WatchState::Ignoring));
        assert_eq!(states.get(&9), None);
        assert!(forum.watch_states(&[5], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_topics() {
        let (pool, forum) = seeded_forum().await;
        for (tid, cid, last_posted_at, deleted) in [(1, 5, 100, 0), (2, 5, 300, 0), (3, 5, 500, 1), (4, 9, 50, 0)] {
            sqlx::query(
                "INSERT INTO topics (tid, cid, uid, title, slug, last_posted_at, deleted) VALUES (?, ?, 1, ?, ?, ?, ?)"
            )
            .bind(tid)
            .bind(cid)
            .bind(format!("Topic {}", tid))
            .bind(format!("{}/topic-{}", tid, tid))
            .bind(last_posted_at)
            .bind(deleted)
            .execute(&pool)
            .await
            .unwrap();
        }

        let mut quiet = Category::new(9, "Alphabet", 0, 1);
        quiet.num_recent_replies = 0;
        let records = vec![Category::new(5, "Alpha", 0, 2), quiet];

        let topics = forum.recent_topics(&records, 1, Some("lang=en")).await.unwrap();
        let alpha = &topics[&5];
        assert_eq!(alpha.len(), 1);
        assert_eq!(alpha[0].tid, 2);
        assert_eq!(alpha[0].href, "/topic/2/topic-2?lang=en");
        assert!(!topics.contains_key(&9));
    }
}
