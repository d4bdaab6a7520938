// ==========================================
// 化工设备参数可视化 - 表格导入器
// ==========================================
// 流程: 扩展名判定 -> 文件解析 -> 列校验 -> 读数映射
// ==========================================

use crate::domain::EquipmentReading;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::reading_mapper::ReadingMapper;

pub struct EquipmentIngestor {
    parser: UniversalFileParser,
    mapper: ReadingMapper,
}

impl EquipmentIngestor {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: ReadingMapper,
        }
    }

    /// 导入上传文件
    ///
    /// # 参数
    /// - filename: 上传时的文件名（决定解析格式）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(Vec<EquipmentReading>): 全部读数（可能为空，由聚合器决定是否接受）
    /// - Err(ImportError): 格式不支持 / 解析失败 / 缺列 / 数值非法
    pub fn ingest(&self, filename: &str, bytes: &[u8]) -> ImportResult<Vec<EquipmentReading>> {
        let table = self.parser.parse(filename, bytes)?;
        let readings = self.mapper.map_table(&table)?;

        tracing::debug!(
            "导入完成: filename={}, columns={}, readings={}",
            filename,
            table.headers.len(),
            readings.len()
        );

        Ok(readings)
    }
}

impl Default for EquipmentIngestor {
    fn default() -> Self {
        Self::new()
    }
}
