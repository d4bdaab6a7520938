// ==========================================
// 化工设备参数可视化 - 文件解析器实现
// ==========================================
// 阶段 0: 上传字节流 -> 原始表（表头 + 行）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::domain::FileFormat;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_from_rs, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ==========================================
// RawTable - 原始表
// ==========================================
// 所有单元格保持字符串形态，类型转换留给 ReadingMapper
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone)]
pub struct RawRow {
    pub row_number: usize, // 数据行号（从 1 开始，不含表头）
    pub values: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|v| v.as_str())
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 将上传文件的字节流解析为原始表
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<RawTable>;
}

/// 按表头把一行单元格装配为 RawRow；整行空白返回 None
fn assemble_row<I>(headers: &[String], row_number: usize, cells: I) -> Option<RawRow>
where
    I: IntoIterator<Item = String>,
{
    let mut values = HashMap::new();
    for (col_idx, value) in cells.into_iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if header.is_empty() {
                continue;
            }
            // 表头重名时保留第一列
            values
                .entry(header.clone())
                .or_insert_with(|| value.trim().to_string());
        }
    }

    // 跳过完全空白的行
    if values.values().all(|v| v.is_empty()) {
        return None;
    }

    Some(RawRow { row_number, values })
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<RawTable> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells = record.iter().map(|v| v.to_string());
            if let Some(row) = assemble_row(&headers, row_idx + 1, cells) {
                rows.push(row);
            }
        }

        Ok(RawTable { headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读取第一个工作表，第一行为表头
pub struct ExcelParser {
    format: FileFormat,
}

impl ExcelParser {
    /// .xlsx 解析器
    pub fn xlsx() -> Self {
        Self {
            format: FileFormat::Xlsx,
        }
    }

    /// .xls 解析器
    pub fn xls() -> Self {
        Self {
            format: FileFormat::Xls,
        }
    }
}

fn read_first_sheet<RS, R>(workbook: &mut R) -> ImportResult<RawTable>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

    // 提取表头（第一行）
    let mut rows = range.rows();
    let header_row = match rows.next() {
        Some(row) => row,
        None => return Ok(RawTable::default()),
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    // 读取数据行
    let mut records = Vec::new();
    for (row_idx, data_row) in rows.enumerate() {
        let cells = data_row.iter().map(|cell| cell.to_string());
        if let Some(row) = assemble_row(&headers, row_idx + 1, cells) {
            records.push(row);
        }
    }

    Ok(RawTable {
        headers,
        rows: records,
    })
}

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<RawTable> {
        let cursor = Cursor::new(bytes.to_vec());
        match self.format {
            FileFormat::Xls => {
                let mut workbook: Xls<_> = open_workbook_from_rs(cursor)?;
                read_first_sheet(&mut workbook)
            }
            _ => {
                let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)?;
                read_first_sheet(&mut workbook)
            }
        }
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse(&self, filename: &str, bytes: &[u8]) -> ImportResult<RawTable> {
        let format = FileFormat::from_filename(filename)
            .ok_or_else(|| ImportError::UnsupportedFormat(filename.to_string()))?;

        tracing::debug!("解析上传文件: filename={}, format={}, bytes={}", filename, format, bytes.len());

        match format {
            FileFormat::Csv => CsvParser.parse_bytes(bytes),
            FileFormat::Xlsx => ExcelParser::xlsx().parse_bytes(bytes),
            FileFormat::Xls => ExcelParser::xls().parse_bytes(bytes),
        }
    }
}
