use thiserror::Error;

/// Category search failure / 分类搜索错误
///
/// Every collaborator failure is wrapped unchanged; there is no retry and
/// no partial result.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Name index member without a numeric cid suffix / 索引成员格式错误
    #[error("invalid name index entry: {0:?}")]
    InvalidIndexEntry(String),

    #[error("name index scan failed: {0}")]
    Index(#[source] anyhow::Error),

    #[error("privilege check failed: {0}")]
    Privileges(#[source] anyhow::Error),

    #[error("category store failed: {0}")]
    Store(#[source] anyhow::Error),

    #[error("recent activity lookup failed: {0}")]
    Enrichment(#[source] anyhow::Error),

    #[error("search hook '{hook}' failed: {source}")]
    Hook {
        hook: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_display() {
        let err = SearchError::InvalidIndexEntry("alpha:x".to_string());
        assert_eq!(err.to_string(), "invalid name index entry: \"alpha:x\"");

        let err = SearchError::Hook { hook: "exclude".to_string(), source: anyhow!("boom") };
        assert_eq!(err.to_string(), "search hook 'exclude' failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
