// ==========================================
// 化工设备参数可视化 - 数据集API
// ==========================================
// 职责: 上传 -> 解析 -> 聚合 -> 落库；历史查询；报表生成
// 约束: 解析/聚合失败时不写库
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{DatasetRecord, FileFormat};
use crate::engine::SummaryAggregator;
use crate::importer::EquipmentIngestor;
use crate::report::{self, ReportInput};
use crate::repository::DatasetRepository;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Instant;

/// 生成的报表附件
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// 数据集API
pub struct DatasetApi {
    ingestor: EquipmentIngestor,
    aggregator: SummaryAggregator,
    dataset_repo: Arc<DatasetRepository>,
    history_limit: usize,
}

impl DatasetApi {
    /// 创建新的DatasetApi实例
    ///
    /// # 参数
    /// - dataset_repo: 数据集仓储
    /// - history_limit: 历史列表最大条数
    pub fn new(dataset_repo: Arc<DatasetRepository>, history_limit: usize) -> Self {
        Self {
            ingestor: EquipmentIngestor::new(),
            aggregator: SummaryAggregator::new(),
            dataset_repo,
            history_limit,
        }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    // ==========================================
    // 上传
    // ==========================================

    /// 上传并汇总一个表格文件
    ///
    /// # 参数
    /// - filename: 上传文件名（None 表示请求中没有文件）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(DatasetRecord): 新建的数据集记录（id 由存储分配）
    /// - Err(ApiError): NoFileUploaded / UnsupportedFormat / MissingColumn / InvalidData / EmptyDataset
    pub fn upload(&self, filename: Option<&str>, bytes: &[u8]) -> ApiResult<DatasetRecord> {
        let started = Instant::now();

        let filename = match filename.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Err(ApiError::NoFileUploaded),
        };
        if FileFormat::from_filename(filename).is_none() {
            tracing::info!("拒绝上传: 不支持的文件类型 filename={}", filename);
            return Err(ApiError::UnsupportedFormat);
        }

        let readings = self.ingestor.ingest(filename, bytes).map_err(|e| {
            tracing::info!("拒绝上传: filename={}, reason={}", filename, e);
            ApiError::from(e)
        })?;
        let summary = self.aggregator.aggregate(&readings)?;

        let id = self.dataset_repo.create(&summary, Some(filename))?;
        let record = self.dataset_repo.get(id)?;

        tracing::info!(
            "数据集已创建: id={}, filename={}, rows={}, types={}, elapsed_ms={}",
            id,
            filename,
            readings.len(),
            summary.type_distribution.len(),
            started.elapsed().as_millis()
        );

        Ok(record)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 最近的数据集（新 -> 旧），条数不超过 history_limit
    pub fn history(&self, requested: Option<usize>) -> ApiResult<Vec<DatasetRecord>> {
        let limit = requested
            .map(|n| n.min(self.history_limit))
            .unwrap_or(self.history_limit);
        Ok(self.dataset_repo.list_recent(limit)?)
    }

    /// 按 id 获取数据集
    pub fn get_dataset(&self, id: i64) -> ApiResult<DatasetRecord> {
        Ok(self.dataset_repo.get(id)?)
    }

    // ==========================================
    // 报表
    // ==========================================

    /// 生成数据集报表 PDF
    pub fn render_report(&self, id: i64, generated_at: NaiveDateTime) -> ApiResult<ReportFile> {
        let record = self.dataset_repo.get(id)?;
        let rendered = report::render_report(
            &ReportInput::from(&record.summary),
            Some(record.id),
            generated_at,
        )?;

        tracing::info!(
            "报表已生成: dataset_id={}, pages={}, bytes={}",
            id,
            rendered.page_count,
            rendered.bytes.len()
        );

        Ok(ReportFile {
            filename: report::report_filename(record.id),
            bytes: rendered.bytes,
            page_count: rendered.page_count,
        })
    }
}
