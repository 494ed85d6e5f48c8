//! Group-based category privileges / 基于用户组的分类权限
//!
//! Policy:
//! - ids are de-duplicated, non-positive ids dropped
//! - disabled categories are never visible
//! - members of an `is_admin` group pass every remaining category
//! - otherwise one of the user's groups must hold the privilege on the cid

use async_trait::async_trait;
use anyhow::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;

use super::Privileges;
use crate::db::{GUESTS_GROUP, REGISTERED_USERS_GROUP};
use crate::utils::{sql_placeholders, unique_cids};

#[derive(Clone)]
pub struct SqlitePrivileges {
    db: SqlitePool,
}

impl SqlitePrivileges {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Groups of a user, including implicit ones / 用户所属组（含隐式组）
    pub async fn groups_of(&self, uid: i64) -> Result<Vec<String>> {
        if uid <= 0 {
            return Ok(vec![GUESTS_GROUP.to_string()]);
        }

        let mut groups: Vec<String> = sqlx::query_scalar(
            "SELECT group_name FROM user_group_members WHERE uid = ? ORDER BY group_name"
        )
        .bind(uid)
        .fetch_all(&self.db)
        .await?;

        if !groups.iter().any(|g| g == REGISTERED_USERS_GROUP) {
            groups.push(REGISTERED_USERS_GROUP.to_string());
        }
        Ok(groups)
    }

    /// Whether the user belongs to an admin group / 是否管理员
    pub async fn is_admin(&self, uid: i64) -> Result<bool> {
        if uid <= 0 {
            return Ok(false);
        }

        let is_admin: Option<i64> = sqlx::query_scalar(
            r#"SELECT MAX(g.is_admin) FROM user_groups g
               INNER JOIN user_group_members m ON m.group_name = g.name
               WHERE m.uid = ?"#
        )
        .bind(uid)
        .fetch_one(&self.db)
        .await?;

        Ok(is_admin.unwrap_or(0) > 0)
    }

    async fn disabled_cids(&self, cids: &[i64]) -> Result<HashSet<i64>> {
        let sql = format!(
            "SELECT cid FROM categories WHERE disabled = 1 AND cid IN ({})",
            sql_placeholders(cids.len())
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for cid in cids {
            query = query.bind(*cid);
        }
        Ok(query.fetch_all(&self.db).await?.into_iter().collect())
    }

    async fn granted_cids(&self, privilege: &str, cids: &[i64], groups: &[String]) -> Result<HashSet<i64>> {
        let sql = format!(
            "SELECT DISTINCT cid FROM category_privileges WHERE privilege = ? AND group_name IN ({}) AND cid IN ({})",
            sql_placeholders(groups.len()),
            sql_placeholders(cids.len())
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(privilege);
        for group in groups {
            query = query.bind(group.as_str());
        }
        for cid in cids {
            query = query.bind(*cid);
        }
        Ok(query.fetch_all(&self.db).await?.into_iter().collect())
    }
}

#[async_trait]
impl Privileges for SqlitePrivileges {
    async fn filter_cids(&self, privilege: &str, cids: &[i64], uid: i64) -> Result<Vec<i64>> {
        let cids = unique_cids(cids.iter().copied().filter(|cid| *cid > 0));
        if cids.is_empty() {
            return Ok(cids);
        }

        let disabled = self.disabled_cids(&cids).await?;
        let candidates: Vec<i64> = cids.into_iter().filter(|cid| !disabled.contains(cid)).collect();
        if candidates.is_empty() || self.is_admin(uid).await? {
            return Ok(candidates);
        }

        let groups = self.groups_of(uid).await?;
        let granted = self.granted_cids(privilege, &candidates, &groups).await?;

        tracing::debug!(
            "Privilege '{}' for uid {}: {}/{} categories granted",
            privilege,
            uid,
            granted.len(),
            candidates.len()
        );
        Ok(candidates.into_iter().filter(|cid| granted.contains(cid)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory_pool, ADMINISTRATORS_GROUP};
    use crate::models::Category;
    use crate::storage::sqlite::insert_category;
    use crate::storage::PRIVILEGE_FIND;

    async fn add_user(pool: &SqlitePool, uid: i64, groups: &[&str]) {
        sqlx::query("INSERT INTO users (uid, username, enabled, created_at) VALUES (?, ?, 1, '2024-01-01')")
            .bind(uid)
            .bind(format!("user{}", uid))
            .execute(pool)
            .await
            .unwrap();
        for group in groups {
            sqlx::query("INSERT INTO user_group_members (uid, group_name, created_at) VALUES (?, ?, '2024-01-01')")
                .bind(uid)
                .bind(*group)
                .execute(pool)
                .await
                .unwrap();
        }
    }

    async fn grant(pool: &SqlitePool, cid: i64, group: &str, privilege: &str) {
        sqlx::query("INSERT INTO category_privileges (cid, group_name, privilege) VALUES (?, ?, ?)")
            .bind(cid)
            .bind(group)
            .bind(privilege)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn seeded() -> (SqlitePool, SqlitePrivileges) {
        let pool = memory_pool().await;
        for cid in [1, 2, 3, 4] {
            insert_category(&pool, &Category::new(cid, &format!("cat {}", cid), 0, cid)).await;
        }
        let mut disabled = Category::new(5, "disabled", 0, 5);
        disabled.disabled = true;
        insert_category(&pool, &disabled).await;

        grant(&pool, 1, GUESTS_GROUP, PRIVILEGE_FIND).await;
        grant(&pool, 1, REGISTERED_USERS_GROUP, PRIVILEGE_FIND).await;
        grant(&pool, 2, REGISTERED_USERS_GROUP, PRIVILEGE_FIND).await;
        grant(&pool, 3, REGISTERED_USERS_GROUP, "read").await;
        grant(&pool, 5, GUESTS_GROUP, PRIVILEGE_FIND).await;

        add_user(&pool, 7, &[]).await;
        add_user(&pool, 8, &[ADMINISTRATORS_GROUP]).await;
        let privileges = SqlitePrivileges::new(pool.clone());
        (pool, privileges)
    }

    #[tokio::test]
    async fn test_guest_sees_only_granted_categories() {
        let (_pool, privileges) = seeded().await;
        let visible = privileges.filter_cids(PRIVILEGE_FIND, &[4, 3, 2, 1, 5], 0).await.unwrap();
        assert_eq!(visible, vec![1]);
    }

    #[tokio::test]
    async fn test_registered_user_preserves_input_order() {
        let (_pool, privileges) = seeded().await;
        let visible = privileges.filter_cids(PRIVILEGE_FIND, &[2, 3, 1, 2], 7).await.unwrap();
        assert_eq!(visible, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_admin_sees_everything_but_disabled() {
        let (_pool, privileges) = seeded().await;
        assert!(privileges.is_admin(8).await.unwrap());
        assert!(!privileges.is_admin(7).await.unwrap());

        let visible = privileges.filter_cids(PRIVILEGE_FIND, &[5, 4, 0, 3, -1], 8).await.unwrap();
        assert_eq!(visible, vec![4, 3]);
    }

    #[tokio::test]
    async fn test_groups_of() {
        let (_pool, privileges) = seeded().await;
        assert_eq!(privileges.groups_of(0).await.unwrap(), vec![GUESTS_GROUP]);
        assert_eq!(privileges.groups_of(7).await.unwrap(), vec![REGISTERED_USERS_GROUP]);
        assert_eq!(
            privileges.groups_of(8).await.unwrap(),
            vec![ADMINISTRATORS_GROUP, REGISTERED_USERS_GROUP]
        );
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (_pool, privileges) = seeded().await;
        assert!(privileges.filter_cids(PRIVILEGE_FIND, &[], 7).await.unwrap().is_empty());
    }
}
