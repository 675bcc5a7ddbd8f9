//! 工廠據點的共同介面

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use sim_core::{Item, LocationType, PegRecord, Result, Tick};

use crate::factory::TimeConstraint;
use crate::inventory::Inventory;
use crate::process::Process;

/// 放入結果
#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome {
    Accepted,
    /// 佇列已滿，物料原樣退回
    Rejected(Item),
}

impl PutOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PutOutcome::Accepted)
    }
}

/// 據點操作
///
/// 倉庫與製程都透過這組操作參與逆推計劃與逐 tick 模擬。
pub trait FactoryNode {
    fn id(&self) -> &str;

    /// 查詢工單物料（不取出）
    fn get_items(&self, item_id: &str, work_order_id: &str) -> Vec<&Item>;

    /// 可整批接收時回傳目標ID（倉庫ID或設備ID）
    ///
    /// `planned_id` 為逆推指定的目標，可用時優先選用。
    fn check_available(
        &self,
        date: NaiveDateTime,
        item_id: &str,
        quantity: Decimal,
        move_time: i64,
        planned_id: &str,
    ) -> Option<String>;

    /// 取出物料；數量不足時回傳空列表
    fn fetch(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        item_id: &str,
        work_order_id: &str,
        quantity: Decimal,
    ) -> Vec<Item>;

    fn put(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        item: Item,
        move_time: i64,
        target_id: &str,
    ) -> Result<PutOutcome>;

    /// 經過一個 tick
    fn run(&mut self, tick: &Tick, constraint: Option<&TimeConstraint>);

    /// 依據點限制拆分需求數量
    fn plan_input_quantity(&self, quantity: Decimal, item_id: &str) -> Result<Vec<(String, Decimal)>>;

    /// 放回無法送出的物料
    fn restock(&mut self, item: Item);

    fn set_backward_peg_items(&mut self, time_index: i64, date: NaiveDateTime, records: &[PegRecord]);

    /// 物料送出後記錄下一據點（倉庫無作業履歷，不需記錄）
    fn mark_next_location(&mut self, _item_id: &str, _work_order_id: &str, _next_location_id: &str) {}
}

/// 工廠據點
#[derive(Debug, Clone)]
pub enum Node {
    Inventory(Inventory),
    Process(Process),
}

impl Node {
    pub fn location_type(&self) -> LocationType {
        match self {
            Node::Inventory(_) => LocationType::Inventory,
            Node::Process(_) => LocationType::Process,
        }
    }

    pub fn as_inventory(&self) -> Option<&Inventory> {
        match self {
            Node::Inventory(inventory) => Some(inventory),
            Node::Process(_) => None,
        }
    }

    pub fn as_process(&self) -> Option<&Process> {
        match self {
            Node::Process(process) => Some(process),
            Node::Inventory(_) => None,
        }
    }

    pub fn as_inventory_mut(&mut self) -> Option<&mut Inventory> {
        match self {
            Node::Inventory(inventory) => Some(inventory),
            Node::Process(_) => None,
        }
    }
}

impl FactoryNode for Node {
    fn id(&self) -> &str {
        match self {
            Node::Inventory(inventory) => &inventory.id,
            Node::Process(process) => &process.id,
        }
    }

    fn get_items(&self, item_id: &str, work_order_id: &str) -> Vec<&Item> {
        match self {
            Node::Inventory(inventory) => inventory.get_items(item_id, work_order_id),
            Node::Process(process) => process.get_items(item_id, work_order_id),
        }
    }

    fn check_available(
        &self,
        date: NaiveDateTime,
        item_id: &str,
        quantity: Decimal,
        _move_time: i64,
        planned_id: &str,
    ) -> Option<String> {
        match self {
            Node::Inventory(inventory) => inventory.check_available(item_id, quantity),
            Node::Process(process) => process.check_planned(date, quantity, planned_id),
        }
    }

    fn fetch(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        item_id: &str,
        work_order_id: &str,
        quantity: Decimal,
    ) -> Vec<Item> {
        match self {
            Node::Inventory(inventory) => inventory.fetch(time_index, date, item_id, work_order_id, quantity),
            Node::Process(process) => process.fetch(time_index, date, item_id, work_order_id, quantity),
        }
    }

    fn put(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        item: Item,
        move_time: i64,
        target_id: &str,
    ) -> Result<PutOutcome> {
        match self {
            Node::Inventory(inventory) => Ok(inventory.put(time_index, date, item, move_time)),
            Node::Process(process) => process.put(time_index, date, item, move_time, target_id),
        }
    }

    fn run(&mut self, tick: &Tick, constraint: Option<&TimeConstraint>) {
        match self {
            Node::Inventory(inventory) => inventory.run(tick),
            Node::Process(process) => process.run(tick, constraint),
        }
    }

    fn plan_input_quantity(&self, quantity: Decimal, item_id: &str) -> Result<Vec<(String, Decimal)>> {
        match self {
            Node::Inventory(inventory) => Ok(inventory.plan_input_quantity(quantity, item_id)),
            Node::Process(process) => process.plan_input_quantity(quantity),
        }
    }

    fn restock(&mut self, item: Item) {
        match self {
            Node::Inventory(inventory) => inventory.restock(item),
            Node::Process(process) => process.restock(item),
        }
    }

    fn set_backward_peg_items(&mut self, time_index: i64, date: NaiveDateTime, records: &[PegRecord]) {
        match self {
            Node::Inventory(inventory) => inventory.set_backward_peg_items(time_index, date, records),
            Node::Process(process) => process.set_backward_peg_items(time_index, date, records),
        }
    }

    fn mark_next_location(&mut self, item_id: &str, work_order_id: &str, next_location_id: &str) {
        if let Node::Process(process) = self {
            process.mark_next_location(item_id, work_order_id, next_location_id);
        }
    }
}
