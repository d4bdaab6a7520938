use super::core::{DatasetRepository, TS_FORMAT};
use crate::domain::{DatasetRecord, DatasetSummary, TypeDistribution};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT id, total_equipment, avg_flowrate, avg_pressure, avg_temperature,
           type_distribution_json, source_filename, created_at
    FROM dataset
"#;

/// 数据库原始行（JSON/时间戳尚未解析）
struct DatasetRow {
    id: i64,
    total_equipment: i64,
    avg_flowrate: f64,
    avg_pressure: f64,
    avg_temperature: f64,
    type_distribution_json: String,
    source_filename: Option<String>,
    created_at: String,
}

impl DatasetRow {
    fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            total_equipment: row.get(1)?,
            avg_flowrate: row.get(2)?,
            avg_pressure: row.get(3)?,
            avg_temperature: row.get(4)?,
            type_distribution_json: row.get(5)?,
            source_filename: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_record(self) -> RepositoryResult<DatasetRecord> {
        let pairs: Vec<(String, u64)> = serde_json::from_str(&self.type_distribution_json)?;
        let created_at = NaiveDateTime::parse_from_str(&self.created_at, TS_FORMAT).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "created_at".to_string(),
                message: e.to_string(),
            }
        })?;
        let total_equipment = u64::try_from(self.total_equipment).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "total_equipment".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(DatasetRecord {
            id: self.id,
            summary: DatasetSummary {
                total_equipment,
                avg_flowrate: self.avg_flowrate,
                avg_pressure: self.avg_pressure,
                avg_temperature: self.avg_temperature,
                type_distribution: TypeDistribution::from_pairs(pairs),
            },
            source_filename: self.source_filename,
            created_at,
        })
    }
}

impl DatasetRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 id 查询单个数据集
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<DatasetRecord>> {
        let row = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;

            let result = stmt.query_row(params![id], DatasetRow::from_row);
            match result {
                Ok(row) => row,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        };

        row.into_record().map(Some)
    }

    /// 按 id 获取数据集，不存在时返回 NotFound
    pub fn get(&self, id: i64) -> RepositoryResult<DatasetRecord> {
        self.find_by_id(id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Dataset".to_string(),
            id: id.to_string(),
        })
    }

    /// 最近创建的 n 条数据集（新 -> 旧）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<DatasetRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = {
            let conn = self.get_conn()?;
            let mut stmt =
                conn.prepare(&format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS))?;
            let rows = stmt
                .query_map(params![limit as i64], DatasetRow::from_row)?
                .collect::<SqliteResult<Vec<_>>>()?;
            rows
        };

        rows.into_iter().map(DatasetRow::into_record).collect()
    }

    /// 数据集总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM dataset", [], |row| row.get(0))?;
        Ok(count)
    }
}
