//! 製程設備

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use sim_calc::LotSizePolicy;
use sim_core::{
    BlackoutWindow, Item, PegRecord, ProcessResourceMaster, ResourceMaster, Result,
    ScheduleConstraint, Tick,
};

use crate::factory::TimeConstraint;
use crate::node::PutOutcome;
use crate::process::lot::{ProcessLot, ResourceStatus};

/// 設備（停機日曆）
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub constraint: ScheduleConstraint,
}

impl Resource {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            constraint: ScheduleConstraint::none(),
        }
    }

    pub fn from_master(master: &ResourceMaster) -> Self {
        Self {
            id: master.id.clone(),
            name: master.name.clone(),
            constraint: ScheduleConstraint::new(master.blackouts.clone()),
        }
    }

    /// 時間點命中的停機時段
    pub fn check(&self, date: NaiveDateTime) -> Option<&BlackoutWindow> {
        self.constraint.check(date)
    }
}

/// 製程中的一台設備
#[derive(Debug, Clone)]
pub struct ProcessResource {
    pub process_id: String,
    pub resource: Resource,

    /// 優先級（數值小者優先）
    pub priority: i32,

    pub lot_size: LotSizePolicy,

    /// 每 tick 加工量
    pub process_rate: Decimal,

    /// 整備時間（tick 數）
    pub setup_time: i64,

    lot: ProcessLot,
}

impl ProcessResource {
    pub fn new(
        process_id: String,
        resource: Resource,
        priority: i32,
        lot_size: LotSizePolicy,
        max_queue_size: usize,
    ) -> Self {
        let lot = ProcessLot::new(
            process_id.clone(),
            resource.id.clone(),
            resource.name.clone(),
            max_queue_size,
        )
        .with_lot_size(lot_size.clone());
        Self {
            process_id,
            resource,
            priority,
            lot_size,
            process_rate: Decimal::ONE,
            setup_time: 0,
            lot,
        }
    }

    /// 建構器模式：設置加工速率與整備時間
    pub fn with_times(mut self, process_rate: Decimal, setup_time: i64) -> Self {
        self.process_rate = process_rate;
        self.setup_time = setup_time;
        self
    }

    /// 依製程設備主檔建立
    pub fn from_master(
        master: &ProcessResourceMaster,
        resource: Resource,
        default_queue_size: usize,
    ) -> Result<Self> {
        let lot_size = LotSizePolicy::from_master(master)?;
        let queue_size = master.max_queue_size.unwrap_or(default_queue_size);

        Ok(Self::new(
            master.process_id.clone(),
            resource,
            master.priority,
            lot_size,
            queue_size,
        )
        .with_times(master.process_rate, master.setup_time))
    }

    pub fn id(&self) -> &str {
        &self.resource.id
    }

    /// 是否可整批接收指定投入量（不符批量範圍時拒收，不做調整）
    pub fn is_available(&self, date: NaiveDateTime, quantity: Decimal) -> bool {
        self.resource.check(date).is_none() && self.lot_size.admits(quantity) && self.lot.is_available()
    }

    /// 放入物料：以本設備的整備時間與加工速率計時
    pub fn put(&mut self, time_index: i64, date: NaiveDateTime, mut item: Item, move_time: i64) -> PutOutcome {
        item.setup_time = self.setup_time;
        item.process_time = LotSizePolicy::process_ticks(item.quantity, self.process_rate);
        item.location_id = self.resource.id.clone();

        self.lot.put(time_index, date, item, move_time)
    }

    /// 經過一個 tick；休息日、工廠停機或設備停機時不運轉
    pub fn run(&mut self, tick: &Tick, constraint: Option<&TimeConstraint>) {
        if constraint.is_some() {
            self.lot.not_run(tick.date);
            return;
        }
        if let Some(window) = self.resource.check(tick.date) {
            tracing::trace!("[{}] 停機中：{}", self.resource.id, window.id);
            self.lot.not_run(tick.date);
            return;
        }
        self.lot.run(tick.index, tick.date);
    }

    pub fn fetch(
        &mut self,
        time_index: i64,
        date: NaiveDateTime,
        item_id: &str,
        work_order_id: &str,
        quantity: Decimal,
    ) -> Vec<Item> {
        self.lot.fetch(time_index, date, item_id, work_order_id, quantity)
    }

    pub fn wait_quantity(&self, item_id: &str, work_order_id: &str) -> Decimal {
        self.lot.wait_quantity(item_id, work_order_id)
    }

    pub fn restock(&mut self, item: Item) {
        self.lot.push_wait(item);
    }

    pub fn set_backward_peg_items(&mut self, time_index: i64, date: NaiveDateTime, record: &PegRecord) -> Decimal {
        self.lot.set_backward_peg_items(time_index, date, record)
    }

    pub fn mark_next_location(&mut self, item_id: &str, work_order_id: &str, next_location_id: &str) {
        self.lot.mark_next_location(item_id, work_order_id, next_location_id);
    }

    pub fn status(&self) -> ResourceStatus {
        self.lot.status()
    }

    pub fn lot(&self) -> &ProcessLot {
        &self.lot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rstest::rstest;
    use sim_core::OffDayType;

    fn at(hours: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(hours)
    }

    fn resource(blackout: Option<(i64, i64)>) -> ProcessResource {
        let mut machine = Resource::new("LDMD1".to_string(), "M1".to_string());
        if let Some((start, end)) = blackout {
            machine
                .constraint
                .add_window(BlackoutWindow::new("SHUTDOWN".to_string(), at(start), at(end)));
        }
        ProcessResource::new(
            "REACTOR".to_string(),
            machine,
            1,
            LotSizePolicy::new(Decimal::from(80), Some(Decimal::from(500)), Decimal::ONE),
            10,
        )
        .with_times(Decimal::ONE, 3)
    }

    fn item(quantity: i64) -> Item {
        Item::new("RM".to_string(), "RMINV".to_string(), Decimal::from(quantity))
            .with_work_order("WO".to_string(), "FG".to_string())
    }

    #[rstest]
    #[case(100, true)]
    #[case(80, true)]
    #[case(500, true)]
    #[case(600, false)]
    fn test_lot_size_admission(#[case] quantity: i64, #[case] expected: bool) {
        assert_eq!(resource(None).is_available(at(0), Decimal::from(quantity)), expected);
    }

    #[test]
    fn test_small_request_is_refused() {
        let mut machine = resource(None);
        assert!(!machine.is_available(at(0), Decimal::from(30)));
        assert!(!machine.is_available(at(0), Decimal::from(79)));

        // 可用性不因拒收而改變
        machine.put(0, at(0), item(80), 0);
        assert!(machine.is_available(at(0), Decimal::from(80)));
    }

    #[test]
    fn test_blackout_blocks_admission() {
        let machine = resource(Some((24, 144)));
        assert!(machine.is_available(at(23), Decimal::from(100)));
        assert!(!machine.is_available(at(24), Decimal::from(100)));
        assert!(machine.is_available(at(144), Decimal::from(100)));
    }

    #[test]
    fn test_put_stamps_times_and_location() {
        let mut machine = resource(None);
        machine.put(0, at(0), item(100), 0);

        let lot = machine.lot().current_lot().unwrap();
        assert_eq!(lot.item().setup_time, 3);
        assert_eq!(lot.item().process_time, 100);
        assert_eq!(lot.item().location_id, "LDMD1");
        assert_eq!(machine.status(), ResourceStatus::Setup);
    }

    #[test]
    fn test_setup_and_process_timing() {
        let mut machine = resource(None);
        machine.put(0, at(0), item(100), 0);

        for index in 1..=102 {
            machine.run(&Tick::new(index, at(index)), None);
        }
        assert_eq!(machine.wait_quantity("RM", "WO"), Decimal::ZERO);

        machine.run(&Tick::new(103, at(103)), None);
        assert_eq!(machine.wait_quantity("RM", "WO"), Decimal::from(100));

        let history = machine.lot().history();
        assert_eq!(history[0].start, at(0));
        assert_eq!(history[1].start, at(3));
        assert_eq!(history[1].end, Some(at(103)));
    }

    #[test]
    fn test_output_scaled_by_efficiency() {
        let mut machine = ProcessResource::new(
            "REACTOR".to_string(),
            Resource::new("LDMD1".to_string(), "M1".to_string()),
            1,
            LotSizePolicy::new(Decimal::from(80), Some(Decimal::from(500)), Decimal::ONE)
                .with_efficiency(Decimal::new(8, 1), 0),
            10,
        )
        .with_times(Decimal::from(25), 0);

        assert!(machine.is_available(at(0), Decimal::from(125)));
        assert!(!machine.is_available(at(0), Decimal::from(90)));
        machine.put(0, at(0), item(125), 0);

        for index in 1..=5 {
            machine.run(&Tick::new(index, at(index)), None);
        }
        assert_eq!(machine.wait_quantity("RM", "WO"), Decimal::from(100));
        assert_eq!(machine.lot().history()[0].quantity, Decimal::from(125));
    }

    #[test]
    fn test_off_day_pauses_processing() {
        let mut machine = resource(None);
        machine.put(0, at(0), item(100), 0);

        let off_day = TimeConstraint::OffDay(Some(OffDayType::Weekend));
        for index in 1..=10 {
            machine.run(&Tick::new(index, at(index)), Some(&off_day));
        }
        assert_eq!(machine.lot().history()[0].end, Some(at(1)));
        assert_eq!(machine.status(), ResourceStatus::Setup);

        for index in 11..=13 {
            machine.run(&Tick::new(index, at(index)), None);
        }
        assert_eq!(machine.status(), ResourceStatus::Process);
    }
}
