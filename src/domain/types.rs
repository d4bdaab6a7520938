// ==========================================
// 化工设备参数可视化 - 领域基础类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// FileFormat - 上传文件格式
// ==========================================
// 判定依据: 文件扩展名（不区分大小写）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Csv,  // .csv
    Xlsx, // .xlsx (Office Open XML)
    Xls,  // .xls (BIFF 旧格式)
}

impl FileFormat {
    /// 根据文件名扩展名判定格式
    ///
    /// # 返回
    /// - Some(FileFormat): 支持的格式
    /// - None: 无扩展名或扩展名不受支持
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = std::path::Path::new(filename.trim())
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            "xls" => Some(FileFormat::Xls),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Xls => "xls",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}
