// ==========================================
// 化工设备参数可视化 - 报表布局模型
// ==========================================
// 内容: 标题 / 生成时间 / 数据集编号(可选) / 统计表 / 类型分布表(非空时)
// 说明: 颜色、字体、列宽属于渲染细节，不在此模型中
// ==========================================

use crate::domain::{DatasetSummary, TypeDistribution};
use chrono::NaiveDateTime;

pub const REPORT_TITLE: &str = "Chemical Equipment Report";
pub const NOT_AVAILABLE: &str = "N/A";

pub const STATS_HEADING: &str = "Summary Statistics";
pub const DISTRIBUTION_HEADING: &str = "Equipment Type Distribution";

/// 数值展示: 整数值保留一位小数（20.0），其余按最短表示（45.67）
pub fn format_metric(value: f64) -> String {
    format!("{:?}", value)
}

// ==========================================
// ReportInput - 报表输入
// ==========================================
// 字段可缺失（客户端从宽松 JSON 渲染时），缺失处显示 N/A
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportInput {
    pub total_equipment: Option<u64>,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub type_distribution: TypeDistribution,
}

impl From<&DatasetSummary> for ReportInput {
    fn from(summary: &DatasetSummary) -> Self {
        Self {
            total_equipment: Some(summary.total_equipment),
            avg_flowrate: Some(summary.avg_flowrate),
            avg_pressure: Some(summary.avg_pressure),
            avg_temperature: Some(summary.avg_temperature),
            type_distribution: summary.type_distribution.clone(),
        }
    }
}

// ==========================================
// ReportTable - 两列表格
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub heading: String,
    pub header: (String, String),
    pub rows: Vec<(String, String)>,
}

// ==========================================
// ReportDocument - 报表文档
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub dataset_id: Option<i64>,
    pub generated_at: NaiveDateTime,
    pub stats_table: ReportTable,
    pub distribution_table: Option<ReportTable>,
}

impl ReportDocument {
    pub fn build(input: &ReportInput, dataset_id: Option<i64>, generated_at: NaiveDateTime) -> Self {
        let or_na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let stats_table = ReportTable {
            heading: STATS_HEADING.to_string(),
            header: ("Metric".to_string(), "Value".to_string()),
            rows: vec![
                (
                    "Total Equipment".to_string(),
                    or_na(input.total_equipment.map(|v| v.to_string())),
                ),
                (
                    "Average Flowrate".to_string(),
                    or_na(input.avg_flowrate.map(format_metric)),
                ),
                (
                    "Average Pressure".to_string(),
                    or_na(input.avg_pressure.map(format_metric)),
                ),
                (
                    "Average Temperature".to_string(),
                    or_na(input.avg_temperature.map(format_metric)),
                ),
            ],
        };

        let distribution_table = if input.type_distribution.is_empty() {
            None
        } else {
            Some(ReportTable {
                heading: DISTRIBUTION_HEADING.to_string(),
                header: ("Equipment Type".to_string(), "Count".to_string()),
                rows: input
                    .type_distribution
                    .iter()
                    .map(|c| (c.equipment_type.clone(), c.count.to_string()))
                    .collect(),
            })
        };

        Self {
            title: REPORT_TITLE.to_string(),
            dataset_id,
            generated_at,
            stats_table,
            distribution_table,
        }
    }

    /// 元数据行（数据集编号在前，生成时间在后）
    pub fn metadata_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(id) = self.dataset_id {
            lines.push(format!("Dataset ID: {}", id));
        }
        lines.push(format!(
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines
    }

    pub fn tables(&self) -> impl Iterator<Item = &ReportTable> {
        std::iter::once(&self.stats_table).chain(self.distribution_table.iter())
    }
}
