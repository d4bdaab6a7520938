// ==========================================
// 化工设备参数可视化 - 读数映射器
// ==========================================
// 阶段 1: 原始表 -> EquipmentReading
// 规则:
// - 必需列先行校验，缺列立即失败（一次列出全部缺失列），重复列同样拒绝
// - 数值字段必须是有限数，否则整批拒绝
// ==========================================

use crate::domain::equipment::{
    COLUMN_FLOWRATE, COLUMN_PRESSURE, COLUMN_TEMPERATURE, COLUMN_TYPE, REQUIRED_COLUMNS,
};
use crate::domain::EquipmentReading;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, RawTable};

pub struct ReadingMapper;

impl ReadingMapper {
    /// 校验表头: 必需列齐全且各只出现一次
    pub fn validate_columns(&self, headers: &[String]) -> ImportResult<()> {
        let occurrences = |column: &str| headers.iter().filter(|h| *h == column).count();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| occurrences(required) == 0)
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingColumn { columns: missing });
        }

        let duplicated: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| occurrences(required) > 1)
            .map(|c| c.to_string())
            .collect();
        if !duplicated.is_empty() {
            return Err(ImportError::DuplicateColumn { columns: duplicated });
        }

        Ok(())
    }

    /// 将原始表映射为读数列表
    pub fn map_table(&self, table: &RawTable) -> ImportResult<Vec<EquipmentReading>> {
        self.validate_columns(&table.headers)?;

        table.rows.iter().map(|row| self.map_row(row)).collect()
    }

    fn map_row(&self, row: &RawRow) -> ImportResult<EquipmentReading> {
        let equipment_type = required_text(row, COLUMN_TYPE)?;

        Ok(EquipmentReading {
            row_number: row.row_number,
            equipment_type,
            flowrate: parse_number(row, COLUMN_FLOWRATE)?,
            pressure: parse_number(row, COLUMN_PRESSURE)?,
            temperature: parse_number(row, COLUMN_TEMPERATURE)?,
        })
    }
}

fn required_text(row: &RawRow, column: &str) -> ImportResult<String> {
    match row.get(column) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ImportError::MissingValue {
            row: row.row_number,
            column: column.to_string(),
        }),
    }
}

fn parse_number(row: &RawRow, column: &str) -> ImportResult<f64> {
    let raw = required_text(row, column)?;

    // "NaN"/"inf" 可被 f64 解析，但不是合法读数
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ImportError::InvalidNumber {
            row: row.row_number,
            column: column.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::{CsvParser, FileParser};

    fn table(csv: &str) -> RawTable {
        CsvParser.parse_bytes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_map_valid_rows() {
        let t = table("Type,Flowrate,Pressure,Temperature\nPump,10,1.5,20\nValve,-3,2,30e0\n");
        let readings = ReadingMapper.map_table(&t).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].equipment_type, "Pump");
        assert_eq!(readings[0].pressure, 1.5);
        assert_eq!(readings[1].flowrate, -3.0);
        assert_eq!(readings[1].temperature, 30.0);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let t = table("Equipment Name,Type,Flowrate,Pressure,Temperature\nP-101,Pump,10,1,20\n");
        let readings = ReadingMapper.map_table(&t).unwrap();
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn test_missing_columns_reported_together() {
        let t = table("Type,Flowrate\nPump,10\n");
        match ReadingMapper.map_table(&t) {
            Err(ImportError::MissingColumn { columns }) => {
                assert_eq!(columns, vec!["Pressure", "Temperature"]);
            }
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_required_column_rejected() {
        let t = table("Type,Flowrate,Pressure,Temperature,Flowrate\nPump,10,1,20,99\n");
        match ReadingMapper.map_table(&t) {
            Err(ImportError::DuplicateColumn { columns }) => {
                assert_eq!(columns, vec!["Flowrate"]);
            }
            other => panic!("Expected DuplicateColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_extra_column_is_ignored() {
        let t = table("Note,Type,Flowrate,Pressure,Temperature,Note\na,Pump,10,1,20,b\n");
        assert_eq!(ReadingMapper.map_table(&t).unwrap().len(), 1);
    }

    #[test]
    fn test_non_numeric_cell_rejected() {
        let t = table("Type,Flowrate,Pressure,Temperature\nPump,10,1,20\nValve,abc,2,30\n");
        match ReadingMapper.map_table(&t) {
            Err(ImportError::InvalidNumber { row, column, value }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "Flowrate");
                assert_eq!(value, "abc");
            }
            other => panic!("Expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_literal_rejected() {
        let t = table("Type,Flowrate,Pressure,Temperature\nPump,NaN,1,20\n");
        assert!(matches!(
            ReadingMapper.map_table(&t),
            Err(ImportError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_blank_cell_rejected() {
        let t = table("Type,Flowrate,Pressure,Temperature\nPump,10,,20\n");
        match ReadingMapper.map_table(&t) {
            Err(ImportError::MissingValue { row, column }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "Pressure");
            }
            other => panic!("Expected MissingValue, got {:?}", other),
        }
    }
}
