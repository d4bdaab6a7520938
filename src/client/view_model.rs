// ==========================================
// 化工设备参数可视化 - 客户端视图模型
// ==========================================
// HistoryEntry: 宽松解析的服务端记录（字段缺失不报错）
// HistoryRow:   历史列表行（编号始终取服务端 id）
// DashboardView: 统计卡片 + 文本柱状图
// ==========================================

use crate::domain::TypeDistribution;
use crate::report::{format_metric, ReportInput, NOT_AVAILABLE};
use serde::Deserialize;

const BAR_WIDTH: usize = 30;

/// 服务端数据集记录（宽松）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    pub id: Option<i64>,
    pub total_equipment: Option<u64>,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub type_distribution: Option<TypeDistribution>,
    pub source_filename: Option<String>,
    pub created_at: Option<String>,
}

impl HistoryEntry {
    /// 客户端渲染报表的输入（缺失字段显示 N/A）
    pub fn report_input(&self) -> ReportInput {
        ReportInput {
            total_equipment: self.total_equipment,
            avg_flowrate: self.avg_flowrate,
            avg_pressure: self.avg_pressure,
            avg_temperature: self.avg_temperature,
            type_distribution: self.type_distribution.clone().unwrap_or_default(),
        }
    }
}

// ==========================================
// HistoryRow - 历史列表行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub id: i64,
    pub source_filename: Option<String>,
    pub created_at: Option<String>,
    pub total_equipment: Option<u64>,
}

impl HistoryRow {
    /// 没有服务端 id 的记录不展示
    pub fn from_entry(entry: &HistoryEntry) -> Option<Self> {
        Some(Self {
            id: entry.id?,
            source_filename: entry.source_filename.clone(),
            created_at: entry.created_at.clone(),
            total_equipment: entry.total_equipment,
        })
    }

    pub fn display(&self) -> String {
        let total = self
            .total_equipment
            .map(|n| n.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        format!(
            "#{:<5} {:<20} {:<28} {} items",
            self.id,
            self.created_at.as_deref().unwrap_or(NOT_AVAILABLE),
            self.source_filename.as_deref().unwrap_or("-"),
            total
        )
    }
}

pub fn history_rows(entries: &[HistoryEntry]) -> Vec<HistoryRow> {
    entries.iter().filter_map(HistoryRow::from_entry).collect()
}

// ==========================================
// DashboardView - 仪表盘
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub dataset_id: Option<i64>,
    pub cards: Vec<StatCard>,
    pub type_bars: Vec<Bar>,
    pub metric_bars: Vec<Bar>,
}

impl DashboardView {
    pub fn from_entry(entry: &HistoryEntry) -> Self {
        let metric = |v: Option<f64>| v.map(format_metric).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let card = |label: &str, value: String| StatCard {
            label: label.to_string(),
            value,
        };

        let cards = vec![
            card(
                "Total Equipment",
                entry
                    .total_equipment
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            card("Avg Flowrate", metric(entry.avg_flowrate)),
            card("Avg Pressure", metric(entry.avg_pressure)),
            card("Avg Temperature", metric(entry.avg_temperature)),
        ];

        let type_bars = entry
            .type_distribution
            .iter()
            .flat_map(|dist| dist.iter())
            .map(|c| Bar {
                label: c.equipment_type.clone(),
                value: c.count as f64,
            })
            .collect();

        let metric_bars = [
            ("Flowrate", entry.avg_flowrate),
            ("Pressure", entry.avg_pressure),
            ("Temperature", entry.avg_temperature),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value.map(|value| Bar {
                label: label.to_string(),
                value,
            })
        })
        .collect();

        Self {
            dataset_id: entry.id,
            cards,
            type_bars,
            metric_bars,
        }
    }

    /// 渲染为终端文本
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self.dataset_id {
            Some(id) => out.push_str(&format!("Dashboard (dataset #{})\n", id)),
            None => out.push_str("Dashboard\n"),
        }

        for card in &self.cards {
            out.push_str(&format!("  {:<18} {}\n", card.label, card.value));
        }

        if !self.type_bars.is_empty() {
            out.push_str("\nEquipment Type Distribution\n");
            out.push_str(&render_bars(&self.type_bars, |v| format!("{}", v as u64)));
        }
        if !self.metric_bars.is_empty() {
            out.push_str("\nAverage Parameters\n");
            out.push_str(&render_bars(&self.metric_bars, format_metric));
        }
        out
    }
}

fn render_bars(bars: &[Bar], fmt_value: impl Fn(f64) -> String) -> String {
    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    let label_width = bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);

    bars.iter()
        .map(|bar| {
            let len = if max > 0.0 && bar.value > 0.0 {
                ((bar.value / max) * BAR_WIDTH as f64).round().max(1.0) as usize
            } else {
                0
            };
            format!(
                "  {:<width$} | {} {}\n",
                bar.label,
                "#".repeat(len),
                fmt_value(bar.value),
                width = label_width
            )
        })
        .collect()
}
