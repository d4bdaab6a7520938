// ==========================================
// 化工设备参数可视化 - 数据集统计摘要领域模型
// ==========================================
// 生命周期: 上传成功时由 Aggregator + Store 一次性生成
// 约束: 创建后不可变，无更新/删除路径
// ==========================================

use chrono::NaiveDateTime;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ==========================================
// TypeCount - 单个设备类型计数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCount {
    pub equipment_type: String,
    pub count: u64,
}

// ==========================================
// TypeDistribution - 设备类型分布
// ==========================================
// 顺序: 聚合时首次出现的顺序
// JSON 形态: {"Pump": 7, "Valve": 5}（对象键顺序即插入顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDistribution(Vec<TypeCount>);

impl TypeDistribution {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// 由 (类型, 数量) 序列构造；重复类型以后出现者为准，位置保持首次出现处
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut dist = Self::new();
        for (equipment_type, count) in pairs {
            dist.insert(equipment_type.into(), count);
        }
        dist
    }

    /// 写入某类型的计数
    pub fn insert(&mut self, equipment_type: String, count: u64) {
        match self.0.iter_mut().find(|c| c.equipment_type == equipment_type) {
            Some(existing) => existing.count = count,
            None => self.0.push(TypeCount {
                equipment_type,
                count,
            }),
        }
    }

    pub fn get(&self, equipment_type: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|c| c.equipment_type == equipment_type)
            .map(|c| c.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeCount> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 各类型计数之和（应等于 total_equipment）
    pub fn total(&self) -> u64 {
        self.0.iter().map(|c| c.count).sum()
    }

    /// 转为有序 (类型, 数量) 列表，用于持久化
    pub fn to_pairs(&self) -> Vec<(String, u64)> {
        self.0
            .iter()
            .map(|c| (c.equipment_type.clone(), c.count))
            .collect()
    }
}

impl Serialize for TypeDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.equipment_type, &entry.count)?;
        }
        map.end()
    }
}

struct TypeDistributionVisitor;

impl<'de> Visitor<'de> for TypeDistributionVisitor {
    type Value = TypeDistribution;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of equipment type to count")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut dist = TypeDistribution::new();
        while let Some((equipment_type, count)) = access.next_entry::<String, u64>()? {
            dist.insert(equipment_type, count);
        }
        Ok(dist)
    }
}

impl<'de> Deserialize<'de> for TypeDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TypeDistributionVisitor)
    }
}

// ==========================================
// DatasetSummary - 统计摘要（未分配 id）
// ==========================================
// 均值: 保留 2 位小数（四舍五入，远离零）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_equipment: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub type_distribution: TypeDistribution,
}

// ==========================================
// DatasetRecord - 已持久化的数据集记录
// ==========================================
// id 由 Store 分配: 单调递增、不复用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: i64,
    #[serde(flatten)]
    pub summary: DatasetSummary,
    pub source_filename: Option<String>,
    pub created_at: NaiveDateTime,
}
