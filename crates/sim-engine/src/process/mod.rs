//! 製程據點（多台設備）

pub mod lot;
pub mod queue;
pub mod resource;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use sim_core::{Item, PegRecord, ResourceHistoryRow, Result, SimError, Tick};

use crate::factory::TimeConstraint;
use crate::node::PutOutcome;

pub use lot::{Lot, LotStatus, ProcessLot, ResourceStatus};
pub use queue::ProcessQueue;
pub use resource::{ProcessResource, Resource};

/// 製程：一組依主檔順序排列的設備
#[derive(Debug, Clone)]
pub struct Process {
    pub id: String,
    pub name: String,
    resources: Vec<ProcessResource>,
}

impl Process {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            resources: Vec::new(),
        }
    }

    /// 建構器模式：加入設備
    pub fn with_resource(mut self, resource: ProcessResource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn add_resource(&mut self, resource: ProcessResource) {
        self.resources.push(resource);
    }

    pub fn resources(&self) -> &[ProcessResource] {
        &self.resources
    }

    pub fn resource(&self, resource_id: &str) -> Option<&ProcessResource> {
        self.resources.iter().find(|r| r.id() == resource_id)
    }

    fn resource_mut(&mut self, resource_id: &str) -> Option<&mut ProcessResource> {
        self.resources.iter_mut().find(|r| r.id() == resource_id)
    }

    /// 所有設備待取區中屬於工單的物料
    pub fn get_items(&self, item_id: &str, work_order_id: &str) -> Vec<&Item> {
        self.resources
            .iter()
            .flat_map(|r| r.lot().wait_items(item_id, work_order_id))
            .collect()
    }

    /// 可接收的設備中優先級最小者（同值取主檔順序在前者）
    pub fn check_available(&self, date: NaiveDateTime, quantity: Decimal) -> Option<String> {
        self.resources
            .iter()
            .filter(|r| r.is_available(date, quantity))
            .min_by_key(|r| r.priority)
            .map(|r| r.id().to_string())
    }

    /// 逆推指定的設備可用時選用，否則依優先級改選
    pub fn check_planned(&self, date: NaiveDateTime, quantity: Decimal, planned_id: &str) -> Option<String> {
        match self.resource(planned_id) {
            Some(resource) if resource.is_available(date, quantity) => Some(resource.id().to_string()),
            _ => self.check_available(date, quantity),
        }
    }

    /// 從各設備待取區合計取出指定數量
    ///
    /// 合計不足時不取任何物料；略多時照常取出並記錄。
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

        let mut remaining = quantity;
        let mut takes: Vec<(usize, Decimal)> = Vec::new();
        for (idx, resource) in self.resources.iter().enumerate() {
            if remaining <= Decimal::ZERO {
                break;
            }
            let waiting = resource.wait_quantity(item_id, work_order_id);
            let take = remaining.min(waiting);
            if take > Decimal::ZERO {
                takes.push((idx, take));
                remaining -= take;
            }
        }

        if remaining > Decimal::ZERO {
            tracing::debug!(
                "[{}] {}:{} - 待取數量不足，需求 {}，缺 {}",
                self.id,
                item_id,
                work_order_id,
                quantity,
                remaining
            );
            return Vec::new();
        }

        let total_waiting: Decimal = self
            .resources
            .iter()
            .map(|r| r.wait_quantity(item_id, work_order_id))
            .sum();
        if total_waiting > quantity {
            tracing::debug!(
                "[{}] {}:{} - 待取合計 {} 超過取料數量 {}",
                self.id,
                item_id,
                work_order_id,
                total_waiting,
                quantity
            );
        }

        let mut items = Vec::new();
        for (idx, take) in takes {
            items.extend(self.resources[idx].fetch(time_index, date, item_id, work_order_id, take));
        }
        items
    }

    /// 放入物料
    ///
    /// `target_id` 為設備ID時直接放入；為製程ID時放入目前最適合的設備（皆不可用時放入第一台）。
    pub fn put(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        item: Item,
        move_time: i64,
        target_id: &str,
    ) -> Result<PutOutcome> {
        let resource_id = if target_id == self.id {
            match self.check_available(date, item.quantity) {
                Some(resource_id) => resource_id,
                None => self
                    .resources
                    .first()
                    .map(|r| r.id().to_string())
                    .ok_or_else(|| SimError::ResourceNotFound(format!("{}:*", self.id)))?,
            }
        } else {
            target_id.to_string()
        };

        let process_id = self.id.clone();
        let resource = self
            .resource_mut(&resource_id)
            .ok_or_else(|| SimError::ResourceNotFound(format!("{}:{}", process_id, resource_id)))?;

        Ok(resource.put(time_index, date, item, move_time))
    }

    pub fn run(&mut self, tick: &Tick, constraint: Option<&TimeConstraint>) {
        for resource in self.resources.iter_mut() {
            resource.run(tick, constraint);
        }
    }

    /// 依設備批量規則輪流分配需求數量，回傳 (設備ID, 投入量)
    ///
    /// 需求以產出量扣減，效率不為 1 時投入量與扣減量不同。
    pub fn plan_input_quantity(&self, quantity: Decimal) -> Result<Vec<(String, Decimal)>> {
        if self.resources.is_empty() {
            return Err(SimError::ResourceNotFound(format!("{}:*", self.id)));
        }

        let mut plans = Vec::new();
        let mut remaining = quantity;
        for resource in self.resources.iter().cycle() {
            if remaining <= Decimal::ZERO {
                break;
            }
            let input_quantity = resource.lot_size.calculate_available_input_quantity(remaining);
            if input_quantity <= Decimal::ZERO {
                return Err(SimError::CalculationError(format!(
                    "{}:{} 無法分配需求 {}",
                    self.id,
                    resource.id(),
                    remaining
                )));
            }
            plans.push((resource.id().to_string(), input_quantity));
            remaining -= resource.lot_size.output_quantity(input_quantity);
        }
        Ok(plans)
    }

    /// 退回物料：放回原設備待取區（找不到時放入第一台）
    pub fn restock(&mut self, item: Item) {
        let idx = self
            .resources
            .iter()
            .position(|r| r.id() == item.location_id)
            .unwrap_or(0);
        match self.resources.get_mut(idx) {
            Some(resource) => resource.restock(item),
            None => tracing::error!("[{}] 沒有設備可退回 {}", self.id, item.item_id),
        }
    }

    /// 將在製品 Pegging 結果指派給未指派工單的待取物料
    pub fn set_backward_peg_items(&mut self, time_index: i64, date: NaiveDateTime, records: &[PegRecord]) {
        for record in records {
            let mut assigned = Decimal::ZERO;
            for resource in self.resources.iter_mut() {
                if assigned >= record.peg_quantity {
                    break;
                }
                let partial = PegRecord {
                    peg_quantity: record.peg_quantity - assigned,
                    ..record.clone()
                };
                assigned += resource.set_backward_peg_items(time_index, date, &partial);
            }
            if assigned < record.peg_quantity {
                tracing::warn!(
                    "[{}] {}:{} 在製品不足，Pegging {} 僅指派 {}",
                    self.id,
                    record.item_id,
                    record.work_order_id,
                    record.peg_quantity,
                    assigned
                );
            }
        }
    }

    /// 物料送出後記錄各設備履歷的下一據點
    pub fn mark_next_location(&mut self, item_id: &str, work_order_id: &str, next_location_id: &str) {
        for resource in self.resources.iter_mut() {
            resource.mark_next_location(item_id, work_order_id, next_location_id);
        }
    }

    /// 所有設備的作業履歷
    pub fn history(&self) -> impl Iterator<Item = &ResourceHistoryRow> {
        self.resources.iter().flat_map(|r| r.lot().history().iter())
    }
}
