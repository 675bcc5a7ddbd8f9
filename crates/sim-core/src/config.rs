//! 模擬配置模型

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// 模擬參數配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// 計劃版本ID
    pub plan_version_id: String,

    /// 時間單位（整備/加工/搬運時間的單位，用於 LPST 推算）
    pub time_unit: TimeUnit,

    /// 數量四捨五入位數（Pegging 計算）
    pub quantity_precision: u32,

    /// 設備佇列預設容量
    pub default_queue_size: usize,

    /// 多個下游路由皆可接收時的選擇規則
    pub next_route_policy: NextRoutePolicy,

    /// 作業履歷匯出時 DUR 欄位的單位
    pub history_duration_unit: TimeUnit,
}

impl SimConfig {
    /// 創建新的模擬配置
    pub fn new(plan_version_id: String) -> Self {
        Self {
            plan_version_id,
            time_unit: TimeUnit::Hour,
            quantity_precision: 3,
            default_queue_size: 10,
            next_route_policy: NextRoutePolicy::AttributePriority,
            history_duration_unit: TimeUnit::Hour,
        }
    }

    /// 建構器模式：設置時間單位
    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = time_unit;
        self
    }

    /// 建構器模式：設置數量精度
    pub fn with_quantity_precision(mut self, precision: u32) -> Self {
        self.quantity_precision = precision;
        self
    }

    /// 建構器模式：設置佇列預設容量
    pub fn with_default_queue_size(mut self, size: usize) -> Self {
        self.default_queue_size = size;
        self
    }

    /// 建構器模式：設置下游路由選擇規則
    pub fn with_next_route_policy(mut self, policy: NextRoutePolicy) -> Self {
        self.next_route_policy = policy;
        self
    }

    /// 建構器模式：設置履歷時長單位
    pub fn with_history_duration_unit(mut self, unit: TimeUnit) -> Self {
        self.history_duration_unit = unit;
        self
    }

    /// 從 JSON 字串載入配置（缺少的欄位使用預設值）
    ///
    /// ```
    /// # use sim_core::{SimConfig, TimeUnit};
    /// let config = SimConfig::from_json_str(r#"{"plan_version_id": "PV-01", "time_unit": "MI"}"#).unwrap();
    /// assert_eq!(config.time_unit, TimeUnit::Minute);
    /// assert_eq!(config.default_queue_size, 10);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 從 JSON 檔案載入配置
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 檢查配置是否合理
    pub fn validate(&self) -> Result<()> {
        if self.default_queue_size == 0 {
            return Err(SimError::InvalidConfig(
                "default_queue_size 必須大於 0".to_string(),
            ));
        }
        if self.quantity_precision > 28 {
            return Err(SimError::InvalidConfig(format!(
                "quantity_precision 超出範圍: {}",
                self.quantity_precision
            )));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new("DEFAULT".to_string())
    }
}

/// 時間單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    /// 日
    #[serde(rename = "DAY")]
    Day,
    /// 時
    #[serde(rename = "HOUR")]
    Hour,
    /// 分
    #[serde(rename = "MI")]
    Minute,
    /// 秒
    #[serde(rename = "SEC")]
    Second,
}

impl TimeUnit {
    /// 將整數時間長度轉換為 chrono Duration
    pub fn duration(&self, length: i64) -> Duration {
        match self {
            TimeUnit::Day => Duration::days(length),
            TimeUnit::Hour => Duration::hours(length),
            TimeUnit::Minute => Duration::minutes(length),
            TimeUnit::Second => Duration::seconds(length),
        }
    }

    /// 單位長度（秒）
    pub fn seconds(&self) -> i64 {
        match self {
            TimeUnit::Day => 86_400,
            TimeUnit::Hour => 3_600,
            TimeUnit::Minute => 60,
            TimeUnit::Second => 1,
        }
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DAY" => Ok(TimeUnit::Day),
            "HOUR" => Ok(TimeUnit::Hour),
            "MI" => Ok(TimeUnit::Minute),
            "SEC" => Ok(TimeUnit::Second),
            other => Err(SimError::InvalidConfig(format!("未知的時間單位: {}", other))),
        }
    }
}

/// 下游路由選擇規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextRoutePolicy {
    /// 依 RouteAttribute.priority（數值小者優先），同值依接線順序
    AttributePriority,

    /// 依路由接線順序
    InsertionOrder,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_create_config() {
        let config = SimConfig::new("PV-2020".to_string());

        assert_eq!(config.plan_version_id, "PV-2020");
        assert_eq!(config.time_unit, TimeUnit::Hour);
        assert_eq!(config.quantity_precision, 3);
        assert_eq!(config.default_queue_size, 10);
        assert_eq!(config.next_route_policy, NextRoutePolicy::AttributePriority);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SimConfig::new("PV-2020".to_string())
            .with_time_unit(TimeUnit::Minute)
            .with_default_queue_size(4)
            .with_next_route_policy(NextRoutePolicy::InsertionOrder);

        assert_eq!(config.time_unit, TimeUnit::Minute);
        assert_eq!(config.default_queue_size, 4);
        assert_eq!(config.next_route_policy, NextRoutePolicy::InsertionOrder);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "plan_version_id": "PV-01",
            "time_unit": "DAY",
            "next_route_policy": "InsertionOrder"
        }"#;
        let config = SimConfig::from_json_str(json).unwrap();

        assert_eq!(config.plan_version_id, "PV-01");
        assert_eq!(config.time_unit, TimeUnit::Day);
        assert_eq!(config.next_route_policy, NextRoutePolicy::InsertionOrder);
        // 未指定的欄位使用預設值
        assert_eq!(config.quantity_precision, 3);
        assert_eq!(config.history_duration_unit, TimeUnit::Hour);
    }

    #[test]
    fn test_config_rejects_zero_queue() {
        let result = SimConfig::from_json_str(r#"{"default_queue_size": 0}"#);
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        let result = SimConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(SimError::ConfigParse(_))));
    }

    #[rstest]
    #[case(TimeUnit::Day, 2, Duration::hours(48))]
    #[case(TimeUnit::Hour, 3, Duration::minutes(180))]
    #[case(TimeUnit::Minute, 90, Duration::seconds(5_400))]
    #[case(TimeUnit::Second, 7, Duration::seconds(7))]
    fn test_time_unit_duration(#[case] unit: TimeUnit, #[case] length: i64, #[case] expected: Duration) {
        assert_eq!(unit.duration(length), expected);
    }

    #[rstest]
    #[case("DAY", TimeUnit::Day)]
    #[case("HOUR", TimeUnit::Hour)]
    #[case("MI", TimeUnit::Minute)]
    #[case("SEC", TimeUnit::Second)]
    fn test_time_unit_from_str(#[case] text: &str, #[case] expected: TimeUnit) {
        assert_eq!(text.parse::<TimeUnit>().unwrap(), expected);
    }

    #[test]
    fn test_time_unit_unknown() {
        assert!("WEEK".parse::<TimeUnit>().is_err());
    }
}
