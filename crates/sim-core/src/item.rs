//! 物料批次（Item）模型

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::plan::BackwardStepPlan;

/// 物料履歷動作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemAction {
    /// 放入倉庫
    #[serde(rename = "INVENTORY PUT")]
    InventoryPut,
    /// 開始搬運
    #[serde(rename = "MOVE START")]
    MoveStart,
    /// 入庫
    #[serde(rename = "STOCK IN")]
    StockIn,
    /// 進入設備佇列
    #[serde(rename = "QUEUE IN")]
    QueueIn,
    /// 開始整備
    #[serde(rename = "SETUP START")]
    SetupStart,
    /// 開始加工
    #[serde(rename = "PROCESS START")]
    ProcessStart,
    /// 分割
    #[serde(rename = "CUT")]
    Cut,
    /// 合併
    #[serde(rename = "MERGED")]
    Merged,
}

impl ItemAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemAction::InventoryPut => "INVENTORY PUT",
            ItemAction::MoveStart => "MOVE START",
            ItemAction::StockIn => "STOCK IN",
            ItemAction::QueueIn => "QUEUE IN",
            ItemAction::SetupStart => "SETUP START",
            ItemAction::ProcessStart => "PROCESS START",
            ItemAction::Cut => "CUT",
            ItemAction::Merged => "MERGED",
        }
    }
}

impl fmt::Display for ItemAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 物料履歷事件（只增不改）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEvent {
    pub time_index: i64,
    pub date: NaiveDateTime,
    pub action: ItemAction,
    pub location: String,
    pub work_order_id: String,
    pub quantity: Decimal,
}

/// 物料批次
///
/// 身分為 (item_id, work_order_id, order_item_id)，同一組身分可能同時存在多個批次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// 物料ID
    pub item_id: String,

    /// 目前所在據點
    pub location_id: String,

    /// 目前數量
    pub quantity: Decimal,

    /// 工單ID（空字串表示未指派）
    pub work_order_id: String,

    /// 工單成品ID
    pub order_item_id: String,

    /// 工單訂購數量
    pub order_quantity: Decimal,

    /// 目前據點需生產數量
    pub required_quantity: Decimal,

    /// Pegging 數量
    pub peg_quantity: Decimal,

    /// 交期
    pub due_date: Option<NaiveDateTime>,

    /// 整備時間（tick 數）
    pub setup_time: i64,

    /// 加工時間（tick 數）
    pub process_time: i64,

    /// 最晚開工時間
    pub lpst: Option<NaiveDateTime>,

    /// 優先級
    pub priority: i32,

    /// 履歷
    pub history: Vec<ItemEvent>,

    /// 合併來源批次
    pub merged_items: Vec<Item>,
}

impl Item {
    /// 創建新的物料批次
    pub fn new(item_id: String, location_id: String, quantity: Decimal) -> Self {
        Self {
            item_id,
            location_id,
            quantity,
            work_order_id: String::new(),
            order_item_id: String::new(),
            order_quantity: Decimal::ZERO,
            required_quantity: Decimal::ZERO,
            peg_quantity: Decimal::ZERO,
            due_date: None,
            setup_time: 0,
            process_time: 0,
            lpst: None,
            priority: -1,
            history: Vec::new(),
            merged_items: Vec::new(),
        }
    }

    /// 建構器模式：設置工單
    pub fn with_work_order(mut self, work_order_id: String, order_item_id: String) -> Self {
        self.work_order_id = work_order_id;
        self.order_item_id = order_item_id;
        self
    }

    /// 建構器模式：設置訂購/需求/Pegging 數量
    pub fn with_quantities(
        mut self,
        order_quantity: Decimal,
        required_quantity: Decimal,
        peg_quantity: Decimal,
    ) -> Self {
        self.order_quantity = order_quantity;
        self.required_quantity = required_quantity;
        self.peg_quantity = peg_quantity;
        self
    }

    /// 建構器模式：設置交期
    pub fn with_due_date(mut self, due_date: NaiveDateTime) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// 建構器模式：設置最晚開工時間
    pub fn with_lpst(mut self, lpst: NaiveDateTime) -> Self {
        self.lpst = Some(lpst);
        self
    }

    /// 建構器模式：設置優先級
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 建構器模式：設置整備/加工時間
    pub fn with_times(mut self, setup_time: i64, process_time: i64) -> Self {
        self.setup_time = setup_time;
        self.process_time = process_time;
        self
    }

    /// 依步驟計劃建立物料（起始據點投料用）
    pub fn from_plan(plan: &BackwardStepPlan, quantity: Decimal) -> Self {
        let mut item = Item::new(plan.item_id.clone(), plan.location_id.clone(), quantity)
            .with_work_order(plan.work_order_id.clone(), plan.order_item_id.clone())
            .with_quantities(plan.order_quantity, plan.required_quantity, plan.peg_quantity)
            .with_priority(plan.priority);
        item.due_date = plan.due_date;
        item.lpst = plan.lpst;
        item
    }

    /// 是否屬於指定工單
    pub fn belongs_to(&self, item_id: &str, work_order_id: &str) -> bool {
        self.item_id == item_id && self.work_order_id == work_order_id
    }

    /// 記錄履歷事件
    pub fn archive(&mut self, time_index: i64, date: NaiveDateTime, action: ItemAction, location: &str) {
        self.history.push(ItemEvent {
            time_index,
            date,
            action,
            location: location.to_string(),
            work_order_id: self.work_order_id.clone(),
            quantity: self.quantity,
        });
    }

    /// 分割出指定數量，回傳新批次並扣減原批次
    ///
    /// 分割量不超過原批次數量，原批次不會變成負數。
    pub fn cut(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        location: &str,
        quantity: Decimal,
    ) -> Item {
        let quantity = quantity.max(Decimal::ZERO).min(self.quantity);

        let mut new_item = self.clone();
        new_item.quantity = quantity;
        new_item.archive(time_index, date, ItemAction::Cut, location);

        self.quantity -= quantity;
        new_item
    }

    /// 合併多個批次為一個（單一批次原樣回傳）
    pub fn merged(
        time_index: i64,
        date: NaiveDateTime,
        location: &str,
        plan: &BackwardStepPlan,
        mut items: Vec<Item>,
    ) -> Option<Item> {
        if items.len() <= 1 {
            return items.pop();
        }

        let mut merged = Item::new(plan.item_id.clone(), plan.location_id.clone(), Decimal::ZERO)
            .with_work_order(plan.work_order_id.clone(), plan.order_item_id.clone())
            .with_quantities(plan.order_quantity, plan.required_quantity, plan.peg_quantity);
        merged.lpst = plan.lpst;

        for mut item in items {
            item.archive(time_index, date, ItemAction::Merged, location);
            merged.quantity += item.quantity;
            merged.merged_items.push(item);
        }

        merged.archive(time_index, date, ItemAction::Merged, location);
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn plan() -> BackwardStepPlan {
        BackwardStepPlan::new(
            "WO-001".to_string(),
            "FG-01".to_string(),
            Decimal::from(300),
            2,
            "SEMI-01".to_string(),
            "IPINV".to_string(),
        )
        .with_required_quantity(Decimal::from(300))
    }

    #[test]
    fn test_cut_conserves_quantity() {
        let mut item = Item::new("RM-01".to_string(), "RMINV".to_string(), Decimal::from(100))
            .with_work_order("WO-001".to_string(), "FG-01".to_string());

        let piece = item.cut(3, start(), "RMINV", Decimal::from(30));

        assert_eq!(piece.quantity, Decimal::from(30));
        assert_eq!(item.quantity, Decimal::from(70));
        assert_eq!(piece.work_order_id, "WO-001");
        assert_eq!(piece.history.last().unwrap().action, ItemAction::Cut);
        assert!(item.history.is_empty());
    }

    #[test]
    fn test_cut_is_clamped_to_source() {
        let mut item = Item::new("RM-01".to_string(), "RMINV".to_string(), Decimal::from(10));

        let piece = item.cut(0, start(), "RMINV", Decimal::from(25));

        assert_eq!(piece.quantity, Decimal::from(10));
        assert_eq!(item.quantity, Decimal::ZERO);
    }

    #[test]
    fn test_merge_single_item_is_unchanged() {
        let item = Item::new("SEMI-01".to_string(), "IPINV".to_string(), Decimal::from(40));

        let merged = Item::merged(1, start(), "IPINV", &plan(), vec![item.clone()]).unwrap();

        assert_eq!(merged, item);
        assert!(Item::merged(1, start(), "IPINV", &plan(), vec![]).is_none());
    }

    #[test]
    fn test_merge_multiple_items() {
        let a = Item::new("SEMI-01".to_string(), "IPINV".to_string(), Decimal::from(120));
        let b = Item::new("SEMI-01".to_string(), "IPINV".to_string(), Decimal::from(180));

        let merged = Item::merged(5, start(), "IPINV", &plan(), vec![a, b]).unwrap();

        assert_eq!(merged.quantity, Decimal::from(300));
        assert_eq!(merged.work_order_id, "WO-001");
        assert_eq!(merged.order_item_id, "FG-01");
        assert_eq!(merged.merged_items.len(), 2);
        assert_eq!(merged.history.len(), 1);
        assert!(merged
            .merged_items
            .iter()
            .all(|i| i.history.last().unwrap().action == ItemAction::Merged));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(ItemAction::SetupStart.to_string(), "SETUP START");
        assert_eq!(ItemAction::InventoryPut.to_string(), "INVENTORY PUT");
    }

    proptest! {
        #[test]
        fn prop_cut_sequence_conserves_quantity(
            total in 1u32..10_000,
            cuts in proptest::collection::vec(1u32..500, 0..20),
        ) {
            let original = Decimal::new(total as i64, 1);
            let mut item = Item::new("RM".to_string(), "INV".to_string(), original);
            let mut pieces = Vec::new();

            for c in cuts {
                let piece = item.cut(0, start(), "INV", Decimal::new(c as i64, 1));
                pieces.push(piece);
            }

            let sum: Decimal = pieces.iter().map(|p| p.quantity).sum::<Decimal>() + item.quantity;
            prop_assert_eq!(sum, original);
            prop_assert!(item.quantity >= Decimal::ZERO);
        }
    }
}
