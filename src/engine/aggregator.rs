// ==========================================
// 化工设备参数可视化 - 统计聚合引擎
// ==========================================
// 输入: EquipmentReading 列表
// 输出: DatasetSummary（不含 id）
// 红线: 纯函数，无副作用，不接触数据库
// ==========================================

use crate::domain::equipment::{COLUMN_FLOWRATE, COLUMN_PRESSURE, COLUMN_TEMPERATURE};
use crate::domain::{DatasetSummary, EquipmentReading, TypeDistribution};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;
use tracing::instrument;

/// 均值保留的小数位数
pub const MEAN_DECIMALS: i32 = 2;

/// 2^53：超过此量级的 f64 已无小数位
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// 保留 2 位小数（四舍五入，.5 远离零）
///
/// 放大后溢出或已无小数位的值原样返回
pub fn round2(value: f64) -> f64 {
    let factor = 10f64.powi(MEAN_DECIMALS);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= EXACT_INTEGER_LIMIT {
        return value;
    }
    scaled.round() / factor
}

/// 算术平均；求和溢出时改为先除后加（每项 |v/n| <= MAX/n，和不会溢出）
fn mean(values: impl Iterator<Item = f64> + Clone, n: f64) -> f64 {
    let sum: f64 = values.clone().sum();
    if sum.is_finite() {
        sum / n
    } else {
        values.map(|v| v / n).sum()
    }
}

// ==========================================
// SummaryAggregator - 统计聚合引擎
// ==========================================
pub struct SummaryAggregator;

impl SummaryAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 计算统计摘要
    ///
    /// # 规则
    /// - total_equipment = 行数
    /// - avg_* = 对应列算术平均，保留 2 位小数
    /// - type_distribution = 各类型出现次数，按首次出现顺序
    ///
    /// # 返回
    /// - Err(ImportError::EmptyDataset): 没有任何读数（均值无定义）
    /// - Err(ImportError::NonFiniteMean): 读数本身非有限数（调用方绕过了映射校验）
    #[instrument(skip(self, readings), fields(count = readings.len()))]
    pub fn aggregate(&self, readings: &[EquipmentReading]) -> ImportResult<DatasetSummary> {
        if readings.is_empty() {
            return Err(ImportError::EmptyDataset);
        }

        // 类型 -> 在 order 中的位置
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<(&str, u64)> = Vec::new();

        for reading in readings {
            match positions.get(reading.equipment_type.as_str()) {
                Some(&idx) => order[idx].1 += 1,
                None => {
                    positions.insert(reading.equipment_type.as_str(), order.len());
                    order.push((reading.equipment_type.as_str(), 1));
                }
            }
        }

        let n = readings.len() as f64;
        let column_mean = |column: &str, pick: fn(&EquipmentReading) -> f64| {
            let value = round2(mean(readings.iter().map(pick), n));
            if value.is_finite() {
                Ok(value)
            } else {
                Err(ImportError::NonFiniteMean {
                    column: column.to_string(),
                })
            }
        };

        Ok(DatasetSummary {
            total_equipment: readings.len() as u64,
            avg_flowrate: column_mean(COLUMN_FLOWRATE, |r| r.flowrate)?,
            avg_pressure: column_mean(COLUMN_PRESSURE, |r| r.pressure)?,
            avg_temperature: column_mean(COLUMN_TEMPERATURE, |r| r.temperature)?,
            type_distribution: TypeDistribution::from_pairs(order),
        })
    }
}

impl Default for SummaryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(row: usize, t: &str, f: f64, p: f64, temp: f64) -> EquipmentReading {
        EquipmentReading {
            row_number: row,
            equipment_type: t.to_string(),
            flowrate: f,
            pressure: p,
            temperature: temp,
        }
    }

    #[test]
    fn test_three_row_example() {
        let readings = vec![
            reading(1, "Pump", 10.0, 1.0, 20.0),
            reading(2, "Valve", 20.0, 2.0, 30.0),
            reading(3, "Pump", 30.0, 3.0, 40.0),
        ];

        let summary = SummaryAggregator::new().aggregate(&readings).unwrap();

        assert_eq!(summary.total_equipment, 3);
        assert_eq!(summary.avg_flowrate, 20.0);
        assert_eq!(summary.avg_pressure, 2.0);
        assert_eq!(summary.avg_temperature, 30.0);
        assert_eq!(summary.type_distribution.get("Pump"), Some(2));
        assert_eq!(summary.type_distribution.get("Valve"), Some(1));
    }

    #[test]
    fn test_distribution_first_seen_order_and_total() {
        let readings = vec![
            reading(1, "Valve", 1.0, 1.0, 1.0),
            reading(2, "Pump", 1.0, 1.0, 1.0),
            reading(3, "Valve", 1.0, 1.0, 1.0),
            reading(4, "Reactor", 1.0, 1.0, 1.0),
            reading(5, "Pump", 1.0, 1.0, 1.0),
        ];

        let summary = SummaryAggregator::new().aggregate(&readings).unwrap();
        let order: Vec<&str> = summary
            .type_distribution
            .iter()
            .map(|c| c.equipment_type.as_str())
            .collect();

        assert_eq!(order, vec!["Valve", "Pump", "Reactor"]);
        assert_eq!(summary.type_distribution.total(), summary.total_equipment);
    }

    #[test]
    fn test_means_rounded_to_two_decimals() {
        let readings = vec![
            reading(1, "Pump", 1.0, 0.1, 100.0),
            reading(2, "Pump", 2.0, 0.2, 100.0),
            reading(3, "Pump", 2.0, 0.2, 101.0),
        ];

        let summary = SummaryAggregator::new().aggregate(&readings).unwrap();

        assert_eq!(summary.avg_flowrate, 1.67); // 1.666..
        assert_eq!(summary.avg_pressure, 0.17); // 0.1666..
        assert_eq!(summary.avg_temperature, 100.33); // 100.333..
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let result = SummaryAggregator::new().aggregate(&[]);
        assert!(matches!(result, Err(ImportError::EmptyDataset)));
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(2.5), 2.5);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(45.666), 45.67);
    }

    #[test]
    fn test_round2_keeps_huge_values() {
        assert_eq!(round2(1e307), 1e307);
        assert_eq!(round2(-1e308), -1e308);
        assert_eq!(round2(f64::MAX), f64::MAX);
        assert_eq!(round2(1e300), 1e300);
    }

    #[test]
    fn test_huge_readings_keep_finite_means() {
        let readings = vec![
            reading(1, "Pump", 1e307, 1.0, 20.0),
            reading(2, "Valve", 1e307, 2.0, 30.0),
        ];
        let summary = SummaryAggregator::new().aggregate(&readings).unwrap();
        assert_eq!(summary.avg_flowrate, 1e307);
        assert_eq!(summary.avg_pressure, 1.5);
        assert_eq!(summary.avg_temperature, 25.0);

        // 求和溢出
        let readings = vec![
            reading(1, "Pump", 1e308, 1.0, -1e308),
            reading(2, "Pump", 1e308, 1.0, -1e308),
            reading(3, "Pump", 1e308, 1.0, -1e308),
        ];
        let summary = SummaryAggregator::new().aggregate(&readings).unwrap();
        assert!(summary.avg_flowrate.is_finite());
        assert!((summary.avg_flowrate / 1e308 - 1.0).abs() < 1e-12);
        assert!((summary.avg_temperature / -1e308 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_reading_rejected() {
        let readings = vec![reading(1, "Pump", f64::INFINITY, 1.0, 1.0)];
        match SummaryAggregator::new().aggregate(&readings) {
            Err(ImportError::NonFiniteMean { column }) => assert_eq!(column, "Flowrate"),
            other => panic!("Expected NonFiniteMean, got {:?}", other),
        }
    }
}
