// ==========================================
// 化工设备参数可视化 - 报表层
// ==========================================
// 职责: 统计摘要 -> 分页 PDF 字节流
// 约束: 不做传输（附件头/写文件由调用方负责）
// ==========================================

pub mod error;
pub mod layout;
pub mod pdf_writer;

pub use error::{ReportError, ReportResult};
pub use layout::{format_metric, ReportDocument, ReportInput, ReportTable, NOT_AVAILABLE, REPORT_TITLE};
pub use pdf_writer::{PdfRenderer, RenderedPdf};

use chrono::NaiveDateTime;

/// 生成报表 PDF（布局 + 渲染）
pub fn render_report(
    input: &ReportInput,
    dataset_id: Option<i64>,
    generated_at: NaiveDateTime,
) -> ReportResult<RenderedPdf> {
    let document = ReportDocument::build(input, dataset_id, generated_at);
    PdfRenderer::new().render(&document)
}

/// 报表附件文件名
pub fn report_filename(dataset_id: i64) -> String {
    format!("equipment_report_{}.pdf", dataset_id)
}
