//! 計時中的物料（搬運、佇列、整備、加工共用）

use chrono::NaiveDateTime;

use sim_core::{Item, ItemAction};

/// 帶有計時器的物料
#[derive(Debug, Clone)]
pub struct Runtime {
    item: Item,

    /// 開始計時的 tick 序號
    pub started_index: i64,

    /// 開始計時的時間點
    pub started_at: NaiveDateTime,

    /// 需要經過的 tick 數
    pub length: i64,

    /// 已經過的 tick 數
    pub elapsed: i64,
}

impl Runtime {
    pub fn new(item: Item, time_index: i64, date: NaiveDateTime, length: i64) -> Self {
        Self {
            item,
            started_index: time_index,
            started_at: date,
            length,
            elapsed: 0,
        }
    }

    /// 重新開始計時
    pub fn reset(&mut self, time_index: i64, date: NaiveDateTime, length: i64) {
        self.started_index = time_index;
        self.started_at = date;
        self.length = length;
        self.elapsed = 0;
    }

    /// 經過一個 tick
    pub fn run(&mut self) {
        self.elapsed = self.elapsed.saturating_add(1);
    }

    pub fn is_end(&self) -> bool {
        self.elapsed >= self.length
    }

    /// 剩餘 tick 數
    pub fn remaining(&self) -> i64 {
        (self.length - self.elapsed).max(0)
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    pub fn into_item(self) -> Item {
        self.item
    }

    pub fn archive(&mut self, time_index: i64, date: NaiveDateTime, action: ItemAction, location: &str) {
        self.item.archive(time_index, date, action, location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_runtime_ends_after_length_ticks() {
        let item = Item::new("RM".to_string(), "RMINV".to_string(), Decimal::from(10));
        let mut runtime = Runtime::new(item, 0, start(), 3);

        assert!(!runtime.is_end());
        runtime.run();
        runtime.run();
        assert_eq!(runtime.remaining(), 1);
        runtime.run();
        assert!(runtime.is_end());

        runtime.reset(3, start(), 1);
        assert_eq!(runtime.elapsed, 0);
        assert!(!runtime.is_end());
    }

    #[test]
    fn test_zero_length_is_already_done() {
        let item = Item::new("RM".to_string(), "RMINV".to_string(), Decimal::ONE);
        assert!(Runtime::new(item, 0, start(), 0).is_end());
    }
}
