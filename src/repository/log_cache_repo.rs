// ==========================================
// 废弃物影响追踪系统 - 本地日志缓存仓储
// ==========================================
// 依据: 本地优先缓存约定 - 按用户隔离的日志镜像
// 职责: 按用户隔离的日志条目缓存（SQLite）
// 红线: 操作内读-改-写原子（每操作持锁）; 单客户端单写者模型
// 红线: merge_remote 按 id 幂等, 远端权威字段覆盖本地
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::log_entry::{LocalMetrics, LogEntry};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// LogCacheRepository - 日志缓存仓储
// ==========================================
/// 本地日志缓存
///
/// 表: log_cache(user_key, entry_id, entry_json, logged_at)
/// 主键: (user_key, entry_id)
pub struct LogCacheRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LogCacheRepository {
    /// 创建仓储实例并确保建表
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.init_schema()?;
        Ok(repo)
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 建表（幂等）
    fn init_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS log_cache (
                user_key   TEXT NOT NULL,
                entry_id   TEXT NOT NULL,
                entry_json TEXT NOT NULL,
                logged_at  TEXT NOT NULL,
                PRIMARY KEY (user_key, entry_id)
            );
            CREATE INDEX IF NOT EXISTS idx_log_cache_user_time
                ON log_cache (user_key, logged_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 追加一条日志（记录成功后的本地持久化）
    ///
    /// # 参数
    /// - user_key: 用户缓存键
    /// - entry: 日志条目
    pub fn append(&self, user_key: &str, entry: &LogEntry) -> RepositoryResult<()> {
        if user_key.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "user_key 不能为空".to_string(),
            ));
        }
        let json = serde_json::to_string(entry)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO log_cache (user_key, entry_id, entry_json, logged_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![user_key, entry.id, json, entry.timestamp.to_rfc3339()],
        )?;
        Ok(())
    }

    /// 列出用户全部日志（按时间倒序）
    pub fn list(&self, user_key: &str) -> RepositoryResult<Vec<LogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT entry_json FROM log_cache WHERE user_key = ?1 ORDER BY logged_at DESC",
        )?;
        let rows = stmt.query_map(params![user_key], |row| row.get::<_, String>(0))?;

        let mut entries = Vec::new();
        for raw in rows {
            let entry: LogEntry = serde_json::from_str(&raw?)?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// 合并远端日志（按 id upsert, 幂等）
    ///
    /// # 参数
    /// - user_key: 用户缓存键
    /// - remote: 服务端最近记录
    ///
    /// # 返回
    /// - Ok(usize): 写入（新增或更新）的条目数
    ///
    /// # 说明
    /// - 同 id 存在 → LogEntry::merge_remote（远端权威字段覆盖, 仅本地字段保留）
    /// - 同 id 不存在 → 远端条目原样插入
    /// - 同一远端记录合并两次结果不变
    /// - 整体在事务中完成（读-改-写原子）
    pub fn merge_remote(&self, user_key: &str, remote: &[LogEntry]) -> RepositoryResult<usize> {
        let existing: HashMap<String, LogEntry> = self
            .list(user_key)?
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();

        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut count = 0;
        for remote_entry in remote {
            let merged = match existing.get(&remote_entry.id) {
                Some(local) => local.merge_remote(remote_entry),
                None => remote_entry.clone(),
            };
            let json = serde_json::to_string(&merged)?;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO log_cache (user_key, entry_id, entry_json, logged_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![user_key, merged.id, json, merged.timestamp.to_rfc3339()],
            )?;
            count += 1;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 用户缓存汇总指标（离线仪表盘口径）
    pub fn local_metrics(&self, user_key: &str) -> RepositoryResult<LocalMetrics> {
        let logs = self.list(user_key)?;
        Ok(LocalMetrics::from_logs(&logs))
    }

    /// 条目总数（全部用户, 诊断用）
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM log_cache", [], |row| row.get(0))?;
        Ok(count)
    }
}
