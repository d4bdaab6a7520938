use crate::domain::DatasetSummary;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// created_at 存储格式
pub(super) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// DatasetRepository - 数据集仓储
// ==========================================
// 并发: 所有写入经由同一把连接锁串行化，id 由 SQLite AUTOINCREMENT 分配
pub struct DatasetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DatasetRepository {
    /// 创建新的数据集仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 写入一条统计摘要
    ///
    /// # 参数
    /// - `summary`: 聚合结果（完整字段，单条 INSERT 原子可见）
    /// - `source_filename`: 上传文件名（可选）
    ///
    /// # 返回
    /// - `Ok(id)`: 新分配的数据集 id
    pub fn create(
        &self,
        summary: &DatasetSummary,
        source_filename: Option<&str>,
    ) -> RepositoryResult<i64> {
        self.create_at(summary, source_filename, Utc::now().naive_utc())
    }

    /// 以指定时间写入（测试/数据迁移用）
    pub fn create_at(
        &self,
        summary: &DatasetSummary,
        source_filename: Option<&str>,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let distribution_json = serde_json::to_string(&summary.type_distribution.to_pairs())?;
        let total = i64::try_from(summary.total_equipment).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "total_equipment".to_string(),
                message: e.to_string(),
            }
        })?;

        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO dataset (
                total_equipment, avg_flowrate, avg_pressure, avg_temperature,
                type_distribution_json, source_filename, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                total,
                summary.avg_flowrate,
                summary.avg_pressure,
                summary.avg_temperature,
                distribution_json,
                source_filename,
                created_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        // 仍持有连接锁，rowid 不会被其他写入覆盖
        Ok(conn.last_insert_rowid())
    }
}
