use std::collections::HashSet;
use std::time::Duration;

/// Remove duplicate ids, keeping first occurrence order / 去重并保持原有顺序
pub fn unique_cids<I>(cids: I) -> Vec<i64>
where
    I: IntoIterator<Item = i64>,
{
    let mut seen = HashSet::new();
    cids.into_iter().filter(|cid| seen.insert(*cid)).collect()
}

/// Elapsed time as seconds with two decimals / 耗时格式化（秒，两位小数）
pub fn format_timing(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64())
}

/// `?, ?, ?` for a SQL `IN (...)` list / 生成SQL占位符
pub fn sql_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
