// ==========================================
// 环境变量读取工具
// ==========================================
// 约束: 非法值回退默认值并记录 warn，不中断启动
// ==========================================

use std::str::FromStr;

/// 环境变量查询函数（测试时可替换为固定表）
pub trait EnvLookup {
    fn get(&self, key: &str) -> Option<String>;
}

/// 进程环境变量
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// 读取非空字符串
pub(crate) fn read_string(env: &dyn EnvLookup, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 读取并解析；缺失或非法时返回默认值
pub(crate) fn read_parsed<T>(env: &dyn EnvLookup, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match read_string(env, key) {
        None => default,
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("环境变量 {}={} 无法解析，使用默认值 {:?}", key, raw, default);
                default
            }
        },
    }
}
