//! 工單模型

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// 日期字串格式（如 20200420230000）
pub const DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// 工單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// 工單ID
    pub id: String,

    /// 成品物料ID
    pub order_item_id: String,

    /// 優先級（數值小者優先）
    pub priority: i32,

    /// 細部優先級
    pub detail_priority: i32,

    /// 訂購數量
    pub order_quantity: Decimal,

    /// 交期
    pub due_date: NaiveDateTime,

    /// 出貨據點
    pub location_id: String,
}

impl WorkOrder {
    /// 創建新工單
    pub fn new(
        id: String,
        order_item_id: String,
        order_quantity: Decimal,
        due_date: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            order_item_id,
            priority: 1,
            detail_priority: 1,
            order_quantity,
            due_date,
            location_id: String::new(),
        }
    }

    /// 建構器模式：設置優先級
    pub fn with_priority(mut self, priority: i32, detail_priority: i32) -> Self {
        self.priority = priority;
        self.detail_priority = detail_priority;
        self
    }

    /// 建構器模式：設置出貨據點
    pub fn with_location(mut self, location_id: String) -> Self {
        self.location_id = location_id;
        self
    }

    /// 排序鍵
    pub fn sort_key(&self) -> (i32, i32) {
        (self.priority, self.detail_priority)
    }
}

/// 解析 `%Y%m%d%H%M%S` 格式日期
pub fn parse_date(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| SimError::InvalidDate(format!("{}: {}", text, e)))
}

/// 格式化為 `%Y%m%d%H%M%S`
pub fn format_date(date: NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}
