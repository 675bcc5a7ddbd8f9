//! 工廠主檔資料（建構工廠所需的輸入）

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constraint::{BlackoutWindow, ScheduleConstraint};
use crate::plan::StockRecord;
use crate::routing::RouteAttribute;
use crate::Result;

/// 工廠基本資訊
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactoryInfo {
    pub id: String,
    pub name: String,
    pub plant_id: String,

    /// 工廠停機日曆
    #[serde(default)]
    pub constraint: ScheduleConstraint,
}

impl FactoryInfo {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            plant_id: String::new(),
            constraint: ScheduleConstraint::none(),
        }
    }

    /// 建構器模式：設置工廠停機時段
    pub fn with_blackouts(mut self, windows: Vec<BlackoutWindow>) -> Self {
        self.constraint = ScheduleConstraint::new(windows);
        self
    }
}

/// 倉庫類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InventoryType {
    /// 原料倉
    #[serde(rename = "RMINV")]
    RawMaterial,
    /// 半成品倉
    #[serde(rename = "IPINV")]
    InProcess,
    /// 成品倉
    #[serde(rename = "PDINV")]
    FinishedGoods,
}

/// 倉庫主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMaster {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub plant_id: String,
    pub inventory_type: InventoryType,

    /// 總容量上限（None 表示不限）
    #[serde(default)]
    pub max_quantity: Option<Decimal>,

    /// 各物料容量上限
    #[serde(default)]
    pub item_limits: HashMap<String, Decimal>,
}

impl InventoryMaster {
    pub fn new(id: String, inventory_type: InventoryType) -> Self {
        Self {
            name: id.clone(),
            id,
            plant_id: String::new(),
            inventory_type,
            max_quantity: None,
            item_limits: HashMap::new(),
        }
    }

    /// 建構器模式：設置總容量
    pub fn with_max_quantity(mut self, max_quantity: Decimal) -> Self {
        self.max_quantity = Some(max_quantity);
        self
    }

    /// 建構器模式：設置物料容量
    pub fn with_item_limit(mut self, item_id: String, limit: Decimal) -> Self {
        self.item_limits.insert(item_id, limit);
        self
    }
}

/// 設備主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMaster {
    pub id: String,
    pub name: String,

    /// 設備停機時段
    #[serde(default)]
    pub blackouts: Vec<BlackoutWindow>,
}

impl ResourceMaster {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            blackouts: Vec::new(),
        }
    }

    /// 建構器模式：加入停機時段
    pub fn with_blackout(mut self, window: BlackoutWindow) -> Self {
        self.blackouts.push(window);
        self
    }
}

/// 製程主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessMaster {
    pub id: String,
    pub name: String,
}

impl ProcessMaster {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }
}

/// 製程設備主檔（BOR）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResourceMaster {
    pub process_id: String,
    pub resource_id: String,
    pub name: String,

    /// 優先級（數值小者優先）
    pub priority: i32,

    /// 生產效率
    pub efficiency: Decimal,

    /// 投入量小數位數
    pub precision: u32,

    pub min_lot_size: Decimal,

    /// None 表示不限
    #[serde(default)]
    pub max_lot_size: Option<Decimal>,

    pub unit_lot_size: Decimal,

    /// 每 tick 加工量
    pub process_rate: Decimal,

    /// 整備時間（tick 數）
    pub setup_time: i64,

    /// 佇列容量（None 使用設定檔預設值）
    #[serde(default)]
    pub max_queue_size: Option<usize>,
}

impl ProcessResourceMaster {
    pub fn new(process_id: String, resource_id: String) -> Self {
        Self {
            process_id,
            name: resource_id.clone(),
            resource_id,
            priority: 1,
            efficiency: Decimal::ONE,
            precision: 0,
            min_lot_size: Decimal::ZERO,
            max_lot_size: None,
            unit_lot_size: Decimal::ONE,
            process_rate: Decimal::ONE,
            setup_time: 0,
            max_queue_size: None,
        }
    }

    /// 建構器模式：設置優先級
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 建構器模式：設置批量限制
    pub fn with_lot_sizes(mut self, min: Decimal, max: Option<Decimal>, unit: Decimal) -> Self {
        self.min_lot_size = min;
        self.max_lot_size = max;
        self.unit_lot_size = unit;
        self
    }

    /// 建構器模式：設置效率與精度
    pub fn with_efficiency(mut self, efficiency: Decimal, precision: u32) -> Self {
        self.efficiency = efficiency;
        self.precision = precision;
        self
    }

    /// 建構器模式：設置加工速率與整備時間
    pub fn with_times(mut self, process_rate: Decimal, setup_time: i64) -> Self {
        self.process_rate = process_rate;
        self.setup_time = setup_time;
        self
    }

    /// 建構器模式：設置佇列容量
    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = Some(size);
        self
    }
}

/// 在製品記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WipRecord {
    pub process_id: String,
    pub resource_id: String,
    pub item_id: String,
    pub quantity: Decimal,
}

impl WipRecord {
    pub fn new(process_id: String, resource_id: String, item_id: String, quantity: Decimal) -> Self {
        Self {
            process_id,
            resource_id,
            item_id,
            quantity,
        }
    }

    /// Pegging 快照（以製程為據點）
    pub fn to_stock_record(&self) -> StockRecord {
        StockRecord::new(self.process_id.clone(), self.item_id.clone(), self.quantity)
    }
}

/// 工廠主檔彙總
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryMaster {
    pub factory: FactoryInfo,
    pub inventories: Vec<InventoryMaster>,
    pub resources: Vec<ResourceMaster>,
    pub processes: Vec<ProcessMaster>,
    pub process_resources: Vec<ProcessResourceMaster>,

    /// 路由連線
    pub routes: Vec<RouteAttribute>,

    /// 期初庫存（以倉庫為據點）
    pub stock: Vec<StockRecord>,

    /// 期初在製品
    pub wip: Vec<WipRecord>,
}

impl FactoryMaster {
    pub fn new(factory: FactoryInfo) -> Self {
        Self {
            factory,
            ..Default::default()
        }
    }

    /// 從 JSON 字串載入主檔
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 從 JSON 檔案載入主檔
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 成品倉列表
    pub fn finished_goods_inventories(&self) -> Vec<&InventoryMaster> {
        self.inventories
            .iter()
            .filter(|inv| inv.inventory_type == InventoryType::FinishedGoods)
            .collect()
    }

    /// 查詢倉庫主檔
    pub fn inventory(&self, id: &str) -> Option<&InventoryMaster> {
        self.inventories.iter().find(|inv| inv.id == id)
    }

    /// 查詢製程的設備（依主檔順序）
    pub fn resources_of(&self, process_id: &str) -> Vec<&ProcessResourceMaster> {
        self.process_resources
            .iter()
            .filter(|pr| pr.process_id == process_id)
            .collect()
    }

    /// 是否為倉庫據點
    pub fn is_inventory(&self, location_id: &str) -> bool {
        self.inventories.iter().any(|inv| inv.id == location_id)
    }

    /// 是否為製程據點
    pub fn is_process(&self, location_id: &str) -> bool {
        self.processes.iter().any(|p| p.id == location_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_from_json() {
        let json = r#"{
            "factory": {"id": "F1", "name": "Plant", "plant_id": "1200"},
            "inventories": [
                {"id": "RMINV", "name": "RM", "inventory_type": "RMINV"},
                {"id": "FGI", "name": "FG", "inventory_type": "PDINV", "max_quantity": "1000"}
            ],
            "processes": [{"id": "REACTOR", "name": "REACTOR"}]
        }"#;
        let master = FactoryMaster::from_json_str(json).unwrap();

        assert_eq!(master.inventories.len(), 2);
        assert_eq!(master.finished_goods_inventories().len(), 1);
        assert_eq!(
            master.inventory("FGI").unwrap().max_quantity,
            Some(Decimal::from(1000))
        );
        assert!(master.is_process("REACTOR"));
        assert!(master.routes.is_empty());
    }

    #[test]
    fn test_resources_of_keeps_order() {
        let mut master = FactoryMaster::new(FactoryInfo::new("F1".to_string(), "F".to_string()));
        master.process_resources = vec![
            ProcessResourceMaster::new("REACTOR".to_string(), "LDMD2".to_string()).with_priority(2),
            ProcessResourceMaster::new("PACK".to_string(), "PK1".to_string()),
            ProcessResourceMaster::new("REACTOR".to_string(), "LDMD1".to_string()).with_priority(1),
        ];

        let ids: Vec<_> = master
            .resources_of("REACTOR")
            .iter()
            .map(|r| r.resource_id.as_str())
            .collect();
        assert_eq!(ids, vec!["LDMD2", "LDMD1"]);
    }

    #[test]
    fn test_wip_to_stock_record() {
        let wip = WipRecord::new(
            "REACTOR".to_string(),
            "LDMD1".to_string(),
            "SEMI-01".to_string(),
            Decimal::from(50),
        );
        let record = wip.to_stock_record();

        assert_eq!(record.location_id, "REACTOR");
        assert_eq!(record.quantity, Decimal::from(50));
    }
}
