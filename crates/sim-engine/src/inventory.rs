//! 倉庫據點

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use sim_calc::CapacityConstraint;
use sim_core::{InventoryMaster, InventoryType, Item, ItemAction, PegRecord, Tick};

use crate::node::PutOutcome;
use crate::runtime::Runtime;
use crate::stock::{self, DrawOrder};

/// 倉庫：依物料ID保存的庫存與搬運中物料
#[derive(Debug, Clone)]
pub struct Inventory {
    pub id: String,
    pub name: String,
    pub inventory_type: InventoryType,
    capacity: CapacityConstraint,
    stock: HashMap<String, Vec<Item>>,
    moves: Vec<Runtime>,
}

impl Inventory {
    pub fn new(id: String, inventory_type: InventoryType) -> Self {
        Self {
            name: id.clone(),
            id,
            inventory_type,
            capacity: CapacityConstraint::unbounded(),
            stock: HashMap::new(),
            moves: Vec::new(),
        }
    }

    /// 建構器模式：設置容量限制
    pub fn with_capacity(mut self, capacity: CapacityConstraint) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn from_master(master: &InventoryMaster) -> Self {
        Self {
            id: master.id.clone(),
            name: master.name.clone(),
            inventory_type: master.inventory_type,
            capacity: CapacityConstraint::from_master(master),
            stock: HashMap::new(),
            moves: Vec::new(),
        }
    }

    pub fn get_items(&self, item_id: &str, work_order_id: &str) -> Vec<&Item> {
        self.stock
            .get(item_id)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.work_order_id == work_order_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 庫存加搬運中的數量（依物料）
    fn held_by_item(&self) -> HashMap<String, Decimal> {
        let mut held: HashMap<String, Decimal> = HashMap::new();
        let stocked = self.stock.values().flatten();
        let moving = self.moves.iter().map(Runtime::item);
        for item in stocked.chain(moving) {
            *held.entry(item.item_id.clone()).or_insert(Decimal::ZERO) += item.quantity;
        }
        held
    }

    /// 容量足夠時回傳倉庫ID
    pub fn check_available(&self, item_id: &str, quantity: Decimal) -> Option<String> {
        match self.capacity.check(item_id, &self.held_by_item(), quantity) {
            None => Some(self.id.clone()),
            Some(violation) => {
                tracing::debug!("[{}] {} 無法入庫：{}", self.id, item_id, violation);
                None
            }
        }
    }

    /// 取出工單物料（數量大者優先，不足時不取）
    pub fn fetch(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        item_id: &str,
        work_order_id: &str,
        quantity: Decimal,
    ) -> Vec<Item> {
        if quantity.is_zero() {
            return Vec::new();
        }
        let Some(items) = self.stock.get_mut(item_id) else {
            return Vec::new();
        };
        if stock::quantity_of(items, work_order_id) < quantity {
            return Vec::new();
        }

        stock::draw(
            items,
            work_order_id,
            quantity,
            DrawOrder::LargestFirst,
            time_index,
            date,
            &self.id,
        )
    }

    /// 放入物料；有搬運時間時先進入搬運
    pub fn put(&mut self, time_index: i64, date: NaiveDateTime, mut item: Item, move_time: i64) -> PutOutcome {
        item.location_id = self.id.clone();
        item.archive(time_index, date, ItemAction::InventoryPut, &self.id);
        item.archive(time_index, date, ItemAction::MoveStart, &self.id);

        if move_time != 0 {
            self.moves.push(Runtime::new(item, time_index, date, move_time));
        } else {
            item.archive(time_index, date, ItemAction::StockIn, &self.id);
            self.push_stock(item);
        }
        PutOutcome::Accepted
    }

    /// 搬運中物料經過一個 tick，抵達者入庫
    pub fn run(&mut self, tick: &Tick) {
        let mut in_transit = Vec::with_capacity(self.moves.len());
        let mut arrived = Vec::new();
        for mut runtime in self.moves.drain(..) {
            runtime.run();
            if runtime.is_end() {
                runtime.archive(tick.index, tick.date, ItemAction::StockIn, &self.id);
                arrived.push(runtime.into_item());
            } else {
                in_transit.push(runtime);
            }
        }
        self.moves = in_transit;

        for item in arrived {
            self.push_stock(item);
        }
    }

    /// 依物料容量拆分需求，回傳 (倉庫ID, 數量)
    pub fn plan_input_quantity(&self, quantity: Decimal, item_id: &str) -> Vec<(String, Decimal)> {
        let Some(capacity) = self.capacity.item_capacity(item_id) else {
            return vec![(self.id.clone(), quantity)];
        };

        let mut plans = Vec::new();
        let mut remaining = quantity;
        while remaining > Decimal::ZERO {
            let chunk = remaining.min(capacity);
            plans.push((self.id.clone(), chunk));
            remaining -= chunk;
        }
        plans
    }

    /// 將庫存 Pegging 結果指派給未指派工單的庫存
    pub fn set_backward_peg_items(&mut self, time_index: i64, date: NaiveDateTime, records: &[PegRecord]) {
        for record in records {
            let assigned = match self.stock.get_mut(&record.item_id) {
                Some(items) => stock::assign_pegged(items, record, time_index, date, &self.id),
                None => Decimal::ZERO,
            };
            if assigned < record.peg_quantity {
                tracing::warn!(
                    "[{}] {}:{} 庫存不足，Pegging {} 僅指派 {}",
                    self.id,
                    record.item_id,
                    record.work_order_id,
                    record.peg_quantity,
                    assigned
                );
            }
        }
    }

    /// 退回物料（放入下游失敗時）
    pub fn restock(&mut self, item: Item) {
        self.push_stock(item);
    }

    fn push_stock(&mut self, item: Item) {
        self.stock.entry(item.item_id.clone()).or_default().push(item);
    }

    /// 物料庫存總量（不含搬運中）
    pub fn stock_quantity(&self, item_id: &str) -> Decimal {
        self.stock
            .get(item_id)
            .map(|items| items.iter().map(|i| i.quantity).sum())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn moving_count(&self) -> usize {
        self.moves.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(hours: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(hours)
    }

    fn rm(work_order: &str, quantity: i64) -> Item {
        Item::new("RM".to_string(), "RMINV".to_string(), Decimal::from(quantity))
            .with_work_order(work_order.to_string(), "FG".to_string())
    }

    fn inventory() -> Inventory {
        Inventory::new("RMINV".to_string(), InventoryType::RawMaterial)
    }

    #[test]
    fn test_put_without_move_stocks_immediately() {
        let mut inv = inventory();
        assert_eq!(inv.put(0, at(0), rm("WO", 10), 0), PutOutcome::Accepted);

        let items = inv.get_items("RM", "WO");
        assert_eq!(items.len(), 1);
        let actions: Vec<_> = items[0].history.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![ItemAction::InventoryPut, ItemAction::MoveStart, ItemAction::StockIn]
        );
    }

    #[test]
    fn test_move_arrives_after_move_time() {
        let mut inv = inventory();
        inv.put(0, at(0), rm("WO", 10), 2);
        assert!(inv.get_items("RM", "WO").is_empty());

        inv.run(&Tick::new(1, at(1)));
        assert_eq!(inv.moving_count(), 1);
        inv.run(&Tick::new(2, at(2)));
        assert_eq!(inv.moving_count(), 0);
        assert_eq!(inv.stock_quantity("RM"), Decimal::from(10));
    }

    #[test]
    fn test_fetch_largest_first_all_or_nothing() {
        let mut inv = inventory();
        for q in [20, 50, 30] {
            inv.put(0, at(0), rm("WO", q), 0);
        }

        assert!(inv.fetch(1, at(1), "RM", "WO", Decimal::from(101)).is_empty());
        assert!(inv.fetch(1, at(1), "RM", "WO", Decimal::ZERO).is_empty());

        let items = inv.fetch(1, at(1), "RM", "WO", Decimal::from(60));
        let quantities: Vec<_> = items.iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, vec![Decimal::from(50), Decimal::from(10)]);
        assert_eq!(inv.stock_quantity("RM"), Decimal::from(40));
    }

    #[test]
    fn test_capacity_counts_moves() {
        let mut inv = inventory().with_capacity(CapacityConstraint::new(Some(Decimal::from(100))));
        inv.put(0, at(0), rm("WO", 60), 0);
        inv.put(0, at(0), rm("WO", 30), 3);

        assert!(inv.check_available("RM", Decimal::from(10)).is_some());
        assert!(inv.check_available("RM", Decimal::from(11)).is_none());
    }

    #[test]
    fn test_plan_input_quantity_chunks_by_item_capacity() {
        let inv = inventory()
            .with_capacity(CapacityConstraint::unbounded().with_item_limit("RM".to_string(), Decimal::from(40)));

        let plans = inv.plan_input_quantity(Decimal::from(100), "RM");
        let quantities: Vec<_> = plans.iter().map(|(_, q)| *q).collect();
        assert_eq!(quantities, vec![Decimal::from(40), Decimal::from(40), Decimal::from(20)]);

        let unbounded = inv.plan_input_quantity(Decimal::from(100), "OTHER");
        assert_eq!(unbounded, vec![("RMINV".to_string(), Decimal::from(100))]);
    }

    #[test]
    fn test_pegging_assigns_unassigned_stock() {
        let mut inv = inventory();
        inv.put(0, at(0), rm("", 100), 0);

        let record = PegRecord {
            location_id: "RMINV".to_string(),
            item_id: "RM".to_string(),
            work_order_id: "WO-1".to_string(),
            order_item_id: "FG".to_string(),
            order_quantity: Decimal::from(60),
            required_quantity: Decimal::from(60),
            peg_quantity: Decimal::from(60),
            lpst: Some(at(5)),
        };
        inv.set_backward_peg_items(0, at(0), &[record]);

        assert_eq!(inv.get_items("RM", "WO-1")[0].quantity, Decimal::from(60));
        assert_eq!(inv.get_items("RM", "")[0].quantity, Decimal::from(40));
    }
}
