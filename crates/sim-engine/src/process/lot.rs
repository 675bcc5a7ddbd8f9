//! 設備批次狀態機：MOVE → QUEUE → (SETUP) → PROCESS → WAIT

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sim_calc::LotSizePolicy;
use sim_core::{HistoryEvent, Item, ItemAction, PegRecord, ResourceHistoryRow};

use crate::node::PutOutcome;
use crate::process::queue::ProcessQueue;
use crate::runtime::Runtime;
use crate::stock::{self, DrawOrder};

/// 批次狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LotStatus {
    #[serde(rename = "MOVE")]
    Move,
    #[serde(rename = "QUEUE")]
    Queue,
    #[serde(rename = "SETUP")]
    Setup,
    #[serde(rename = "PROCESS")]
    Process,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Move => "MOVE",
            LotStatus::Queue => "QUEUE",
            LotStatus::Setup => "SETUP",
            LotStatus::Process => "PROCESS",
        }
    }
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 設備狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceStatus {
    #[serde(rename = "IDLE")]
    Idle,
    #[serde(rename = "SETUP")]
    Setup,
    #[serde(rename = "PROCESS")]
    Process,
}

/// 設備上的一個批次
#[derive(Debug, Clone)]
pub struct Lot {
    pub id: Uuid,
    status: LotStatus,
    runtime: Runtime,
}

impl Lot {
    pub fn new(item: Item, time_index: i64, date: NaiveDateTime, status: LotStatus, length: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            status,
            runtime: Runtime::new(item, time_index, date, length),
        }
    }

    /// 切換狀態並重新計時
    pub fn process(&mut self, time_index: i64, date: NaiveDateTime, status: LotStatus, length: i64) {
        self.runtime.reset(time_index, date, length);
        self.status = status;
    }

    pub fn status(&self) -> LotStatus {
        self.status
    }

    pub fn run(&mut self) {
        self.runtime.run();
    }

    pub fn is_end(&self) -> bool {
        self.runtime.is_end()
    }

    pub fn item(&self) -> &Item {
        self.runtime.item()
    }

    pub fn into_item(self) -> Item {
        self.runtime.into_item()
    }

    pub fn archive(&mut self, time_index: i64, date: NaiveDateTime, action: ItemAction, location: &str) {
        self.runtime.archive(time_index, date, action, location);
    }
}

/// 單一設備的批次處理
#[derive(Debug, Clone)]
pub struct ProcessLot {
    pub process_id: String,
    pub resource_id: String,
    pub name: String,

    moves: Vec<Lot>,
    queue: ProcessQueue,
    lot: Option<Lot>,

    /// 加工完成待取的物料（物料ID → 物料）
    waits: HashMap<String, Vec<Item>>,

    history: Vec<ResourceHistoryRow>,

    /// 產出量換算（未設置時產出等於投入）
    lot_size: Option<LotSizePolicy>,
}

impl ProcessLot {
    pub fn new(process_id: String, resource_id: String, name: String, max_queue_size: usize) -> Self {
        Self {
            process_id,
            resource_id,
            name,
            moves: Vec::new(),
            queue: ProcessQueue::new(max_queue_size),
            lot: None,
            waits: HashMap::new(),
            history: Vec::new(),
            lot_size: None,
        }
    }

    /// 建構器模式：加工完成時依效率換算產出量
    pub fn with_lot_size(mut self, lot_size: LotSizePolicy) -> Self {
        self.lot_size = Some(lot_size);
        self
    }

    /// 接收物料
    ///
    /// 有搬運時間時進入搬運；否則進入佇列，設備閒置則立即開始。佇列已滿時退回物料。
    pub fn put(&mut self, time_index: i64, date: NaiveDateTime, item: Item, move_time: i64) -> PutOutcome {
        if move_time != 0 {
            let mut lot = Lot::new(item, time_index, date, LotStatus::Move, move_time);
            lot.archive(time_index, date, ItemAction::MoveStart, &self.name);
            self.moves.push(lot);
            return PutOutcome::Accepted;
        }

        let lot = Lot::new(item, time_index, date, LotStatus::Queue, i64::MAX);
        if let Err(lot) = self.queue.put(lot) {
            tracing::debug!(
                "[{}:{}] 佇列已滿，退回 {}:{}",
                self.process_id,
                self.resource_id,
                lot.item().item_id,
                lot.item().work_order_id
            );
            return PutOutcome::Rejected(lot.into_item());
        }

        if self.lot.is_none() {
            self.start_next(time_index, date);
        }
        PutOutcome::Accepted
    }

    /// 經過一個 tick
    pub fn run(&mut self, time_index: i64, date: NaiveDateTime) {
        if let Some(mut lot) = self.lot.take() {
            lot.run();
            self.restart_history_step(date);

            if !lot.is_end() {
                self.lot = Some(lot);
            } else if lot.status() == LotStatus::Setup {
                let process_time = lot.item().process_time;
                lot.process(time_index, date, LotStatus::Process, process_time);
                lot.archive(time_index, date, ItemAction::ProcessStart, &self.name);
                self.end_history_step(date);
                self.append_history_step(date, &lot, HistoryEvent::Process);
                self.lot = Some(lot);
            } else {
                let mut item = lot.into_item();
                if let Some(lot_size) = &self.lot_size {
                    item.quantity = lot_size.output_quantity(item.quantity);
                }
                self.end_history_step(date);
                self.push_wait(item);
            }
        }

        self.queue.run();
        self.run_moves(time_index, date);

        if self.lot.is_none() {
            self.start_next(time_index, date);
        }
    }

    /// 設備不可用的 tick：結束目前的履歷列
    pub fn not_run(&mut self, date: NaiveDateTime) {
        self.end_history_step(date);
    }

    /// 從佇列取出下一批開始整備或加工
    fn start_next(&mut self, time_index: i64, date: NaiveDateTime) {
        let Some(mut lot) = self.queue.pop() else {
            return;
        };

        let (setup_time, process_time) = (lot.item().setup_time, lot.item().process_time);
        if setup_time > 0 {
            lot.process(time_index, date, LotStatus::Setup, setup_time);
            lot.archive(time_index, date, ItemAction::SetupStart, &self.name);
            self.append_history_step(date, &lot, HistoryEvent::Setup);
        } else {
            lot.process(time_index, date, LotStatus::Process, process_time);
            lot.archive(time_index, date, ItemAction::ProcessStart, &self.name);
            self.end_history_step(date);
            self.append_history_step(date, &lot, HistoryEvent::Process);
        }
        self.lot = Some(lot);
    }

    /// 搬運中的批次經過一個 tick，抵達者進入佇列（佇列已滿則繼續等待）
    fn run_moves(&mut self, time_index: i64, date: NaiveDateTime) {
        let mut in_transit = Vec::with_capacity(self.moves.len());
        for mut lot in self.moves.drain(..) {
            lot.run();
            if !lot.is_end() {
                in_transit.push(lot);
                continue;
            }

            lot.archive(time_index, date, ItemAction::QueueIn, &self.name);
            if let Err(mut lot) = self.queue.put(lot) {
                lot.item_history_pop();
                in_transit.push(lot);
            }
        }
        self.moves = in_transit;
    }

    fn end_history_step(&mut self, date: NaiveDateTime) {
        if let Some(last) = self.history.last_mut() {
            last.close(date);
        }
    }

    fn restart_history_step(&mut self, date: NaiveDateTime) {
        if let Some(last) = self.history.last() {
            if !last.is_open() {
                let reopened = last.reopen(date);
                self.history.push(reopened);
            }
        }
    }

    fn append_history_step(&mut self, date: NaiveDateTime, lot: &Lot, event: HistoryEvent) {
        let item = lot.item();
        self.history.push(ResourceHistoryRow {
            process_id: self.process_id.clone(),
            resource_id: self.resource_id.clone(),
            // 送出時才知道下一據點
            next_location_id: None,
            lot_id: lot.id,
            work_order_id: item.work_order_id.clone(),
            order_item_id: item.order_item_id.clone(),
            item_id: item.item_id.clone(),
            quantity: item.quantity,
            event,
            start: date,
            end: None,
            duration: None,
        });
    }

    /// 為工單物料尚未標記的履歷列填入下一據點
    pub fn mark_next_location(&mut self, item_id: &str, work_order_id: &str, next_location_id: &str) {
        for row in self.history.iter_mut().filter(|row| {
            row.next_location_id.is_none() && row.item_id == item_id && row.work_order_id == work_order_id
        }) {
            row.next_location_id = Some(next_location_id.to_string());
        }
    }

    /// 佇列剩餘容量扣除搬運中批次後仍有空位
    pub fn is_available(&self) -> bool {
        self.queue.available_size() > self.moves.len()
    }

    /// 取出待取物料
    ///
    /// 待取數量不足時回傳空列表；超過時照常取出並記錄。
    pub fn fetch(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        item_id: &str,
        work_order_id: &str,
        quantity: Decimal,
    ) -> Vec<Item> {
        let wait_quantity = self.wait_quantity(item_id, work_order_id);
        if quantity.is_zero() || wait_quantity < quantity {
            return Vec::new();
        }
        if wait_quantity > quantity {
            tracing::debug!(
                "[{}:{}] {}:{} - 待取數量 {} 超過取料數量 {}",
                self.process_id,
                self.resource_id,
                item_id,
                work_order_id,
                wait_quantity,
                quantity
            );
        }

        let Some(waits) = self.waits.get_mut(item_id) else {
            return Vec::new();
        };
        let items = stock::draw(
            waits,
            work_order_id,
            quantity,
            DrawOrder::Listed,
            time_index,
            date,
            &self.resource_id,
        );

        tracing::debug!(
            "[{}:{}] {}:{} - 取出 {}，共 {} 批",
            self.process_id,
            self.resource_id,
            item_id,
            work_order_id,
            quantity,
            items.len()
        );
        items
    }

    /// 放入待取區（在製品、退回物料）
    pub fn push_wait(&mut self, item: Item) {
        self.waits.entry(item.item_id.clone()).or_default().push(item);
    }

    /// 指派 Pegging 記錄到待取區中未指派工單的在製品
    pub fn set_backward_peg_items(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        record: &PegRecord,
    ) -> Decimal {
        match self.waits.get_mut(&record.item_id) {
            Some(waits) => stock::assign_pegged(waits, record, time_index, date, &self.resource_id),
            None => Decimal::ZERO,
        }
    }

    pub fn wait_quantity(&self, item_id: &str, work_order_id: &str) -> Decimal {
        self.waits
            .get(item_id)
            .map(|items| stock::quantity_of(items, work_order_id))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn wait_items(&self, item_id: &str, work_order_id: &str) -> Vec<&Item> {
        self.waits
            .get(item_id)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.work_order_id == work_order_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 搬運、佇列、加工、待取合計數量
    pub fn quantity(&self, item_id: &str, work_order_id: &str) -> Decimal {
        let in_flight = self
            .moves
            .iter()
            .chain(self.queue.iter())
            .chain(self.lot.iter())
            .map(Lot::item)
            .filter(|item| item.belongs_to(item_id, work_order_id))
            .map(|item| item.quantity)
            .sum::<Decimal>();

        in_flight + self.wait_quantity(item_id, work_order_id)
    }

    pub fn status(&self) -> ResourceStatus {
        match self.lot.as_ref().map(Lot::status) {
            Some(LotStatus::Setup) => ResourceStatus::Setup,
            Some(LotStatus::Process) => ResourceStatus::Process,
            _ => ResourceStatus::Idle,
        }
    }

    /// 加工中的批次
    pub fn current_lot(&self) -> Option<&Lot> {
        self.lot.as_ref()
    }

    pub fn queue(&self) -> &ProcessQueue {
        &self.queue
    }

    pub fn moves(&self) -> &[Lot] {
        &self.moves
    }

    pub fn history(&self) -> &[ResourceHistoryRow] {
        &self.history
    }
}

impl Lot {
    /// 撤銷最後一筆物料履歷（入佇列失敗時）
    fn item_history_pop(&mut self) {
        self.runtime.item_mut().history.pop();
    }
}
