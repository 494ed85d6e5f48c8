use axum::{http::StatusCode, Json};
use sqlx::SqlitePool;
use tower_cookies::Cookies;

use crate::api::ApiResponse;
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "session_token";

// 根据session查询用户uid，过期或用户被禁用时返回None
pub async fn session_uid(pool: &SqlitePool, token: &str) -> anyhow::Result<Option<i64>> {
    let uid: Option<(i64,)> = sqlx::query_as(
        "SELECT u.uid FROM users u
         JOIN sessions s ON u.uid = s.uid
         WHERE s.id = ? AND s.expires_at > datetime('now') AND u.enabled = 1"
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(uid.map(|(uid,)| uid))
}

// 当前用户uid，游客为0；查询失败时返回错误
pub async fn current_uid(pool: &SqlitePool, cookies: &Cookies) -> anyhow::Result<i64> {
    let Some(token) = cookies.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string()) else {
        return Ok(0);
    };

    Ok(session_uid(pool, &token).await?.unwrap_or(0))
}

// 验证管理员权限
pub async fn require_admin(
    state: &AppState,
    cookies: &Cookies,
) -> Result<i64, (StatusCode, Json<ApiResponse<()>>)> {
    let uid = current_uid(&state.db, cookies).await.map_err(|e| {
        tracing::error!("Session lookup failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::failure(500, "验证session失败")))
    })?;
    if uid == 0 {
        return Err((StatusCode::UNAUTHORIZED, Json(ApiResponse::failure(401, "未登录"))));
    }

    match state.privileges.is_admin(uid).await {
        Ok(true) => Ok(uid),
        Ok(false) => Err((StatusCode::FORBIDDEN, Json(ApiResponse::failure(403, "需要管理员权限")))),
        Err(e) => {
            tracing::error!("Admin check failed for uid {}: {}", uid, e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::failure(500, "服务器错误"))))
        }
    }
}

/// Seed a user with a session / 测试用会话
#[cfg(test)]
pub async fn add_session(pool: &SqlitePool, uid: i64, token: &str, expires_in: &str, enabled: bool) {
    sqlx::query("INSERT OR IGNORE INTO users (uid, username, enabled, created_at) VALUES (?, ?, ?, datetime('now'))")
        .bind(uid)
        .bind(format!("user{}", uid))
        .bind(enabled)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO sessions (id, uid, expires_at, created_at) VALUES (?, ?, datetime('now', ?), datetime('now'))")
        .bind(token)
        .bind(uid)
        .bind(expires_in)
        .execute(pool)
        .await
        .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    #[tokio::test]
    async fn test_session_uid() {
        let state = test_state().await;
        add_session(&state.db, 7, "live", "+1 day", true).await;
        add_session(&state.db, 8, "stale", "-1 day", true).await;
        add_session(&state.db, 9, "banned", "+1 day", false).await;

        assert_eq!(session_uid(&state.db, "live").await.unwrap(), Some(7));
        assert_eq!(session_uid(&state.db, "stale").await.unwrap(), None);
        assert_eq!(session_uid(&state.db, "banned").await.unwrap(), None);
        assert_eq!(session_uid(&state.db, "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_lookup_error_is_reported() {
        let state = test_state().await;
        sqlx::query("DROP TABLE sessions").execute(&state.db).await.unwrap();

        assert!(session_uid(&state.db, "live").await.is_err());
    }
}
