//! 路由連線定義

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 據點類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    /// 倉庫
    #[serde(rename = "INV")]
    Inventory,
    /// 製程
    #[serde(rename = "PROC")]
    Process,
}

/// 路由連線（從一個據點/物料到下一個據點/物料的有向邊）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAttribute {
    /// 來源物料ID
    pub from_item_id: String,

    /// 目的物料ID
    pub to_item_id: String,

    /// 來源據點ID
    pub from_location_id: String,

    /// 目的據點ID
    pub to_location_id: String,

    /// 來源據點類型
    pub from_location_type: LocationType,

    /// 目的據點類型
    pub to_location_type: LocationType,

    /// 物料混合代碼
    pub item_mix_code: String,

    /// 路由連接代碼
    pub route_conn_code: String,

    /// 優先級（數值小者優先）
    pub priority: i32,

    /// 轉換比例
    pub ratio: Decimal,

    /// 搬運時間（tick 數）
    pub move_time: i64,
}

impl RouteAttribute {
    /// 創建路由連線
    pub fn new(
        from_item_id: String,
        to_item_id: String,
        from_location_id: String,
        to_location_id: String,
        from_location_type: LocationType,
        to_location_type: LocationType,
    ) -> Self {
        Self {
            from_item_id,
            to_item_id,
            from_location_id,
            to_location_id,
            from_location_type,
            to_location_type,
            item_mix_code: String::new(),
            route_conn_code: String::new(),
            priority: 1,
            ratio: Decimal::ONE,
            move_time: 0,
        }
    }

    /// 建構器模式：設置搬運時間
    pub fn with_move_time(mut self, move_time: i64) -> Self {
        self.move_time = move_time;
        self
    }

    /// 建構器模式：設置優先級
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 建構器模式：設置代碼
    pub fn with_codes(mut self, item_mix_code: String, route_conn_code: String) -> Self {
        self.item_mix_code = item_mix_code;
        self.route_conn_code = route_conn_code;
        self
    }

    /// 建構器模式：設置轉換比例
    pub fn with_ratio(mut self, ratio: Decimal) -> Self {
        self.ratio = ratio;
        self
    }

    /// 是否為同物料在同一據點的自我連線
    pub fn is_self_loop(&self) -> bool {
        self.from_location_id == self.to_location_id && self.from_item_id == self.to_item_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_type_serde() {
        let json = serde_json::to_string(&LocationType::Process).unwrap();
        assert_eq!(json, "\"PROC\"");

        let parsed: LocationType = serde_json::from_str("\"INV\"").unwrap();
        assert_eq!(parsed, LocationType::Inventory);
    }

    #[test]
    fn test_route_attribute_builder() {
        let attr = RouteAttribute::new(
            "RM-01".to_string(),
            "SEMI-01".to_string(),
            "RMINV".to_string(),
            "REACTOR".to_string(),
            LocationType::Inventory,
            LocationType::Process,
        )
        .with_move_time(4)
        .with_priority(2);

        assert_eq!(attr.move_time, 4);
        assert_eq!(attr.priority, 2);
        assert_eq!(attr.ratio, Decimal::ONE);
        assert!(!attr.is_self_loop());
    }
}
