//! 排程限制（停機時段）

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 停機時段 `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackoutWindow {
    /// 限制ID
    pub id: String,

    /// 開始時間（包含）
    pub start: NaiveDateTime,

    /// 結束時間（不包含）
    pub end: NaiveDateTime,

    /// 優先級（數值小者優先）
    pub priority: i32,

    /// 原因（如 SHUTDOWN、PM）
    pub reason: String,
}

impl BlackoutWindow {
    /// 創建停機時段
    pub fn new(id: String, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id,
            start,
            end,
            priority: 1,
            reason: String::new(),
        }
    }

    /// 建構器模式：設置優先級
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 建構器模式：設置原因
    pub fn with_reason(mut self, reason: String) -> Self {
        self.reason = reason;
        self
    }

    /// 時間點是否落在此時段內
    pub fn contains(&self, date: NaiveDateTime) -> bool {
        self.start <= date && date < self.end
    }
}

/// 排程限制（工廠或設備的停機日曆）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConstraint {
    /// 停機時段
    pub windows: Vec<BlackoutWindow>,
}

impl ScheduleConstraint {
    /// 創建排程限制
    pub fn new(windows: Vec<BlackoutWindow>) -> Self {
        Self { windows }
    }

    /// 無任何限制
    pub fn none() -> Self {
        Self::default()
    }

    /// 添加停機時段
    pub fn add_window(&mut self, window: BlackoutWindow) {
        self.windows.push(window);
    }

    /// 檢查時間點是否受限，回傳命中的時段（多個命中時取優先級最小者）
    pub fn check(&self, date: NaiveDateTime) -> Option<&BlackoutWindow> {
        self.windows
            .iter()
            .filter(|w| w.contains(date))
            .min_by_key(|w| w.priority)
    }

    /// 時間點是否受限
    pub fn is_blocked(&self, date: NaiveDateTime) -> bool {
        self.check(date).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_window_is_half_open() {
        let constraint = ScheduleConstraint::new(vec![BlackoutWindow::new(
            "SHUTDOWN_1".to_string(),
            at(15, 0),
            at(20, 0),
        )]);

        assert!(!constraint.is_blocked(at(14, 23)));
        assert!(constraint.is_blocked(at(15, 0)));
        assert!(constraint.is_blocked(at(19, 23)));
        assert!(!constraint.is_blocked(at(20, 0)));
    }

    #[test]
    fn test_lowest_priority_value_wins() {
        let mut constraint = ScheduleConstraint::none();
        constraint.add_window(
            BlackoutWindow::new("PM".to_string(), at(15, 0), at(16, 0)).with_priority(5),
        );
        constraint.add_window(
            BlackoutWindow::new("SHUTDOWN".to_string(), at(14, 0), at(20, 0))
                .with_priority(1)
                .with_reason("SHDWN".to_string()),
        );

        let hit = constraint.check(at(15, 6)).unwrap();
        assert_eq!(hit.id, "SHUTDOWN");
        assert_eq!(hit.reason, "SHDWN");
    }

    #[test]
    fn test_empty_constraint() {
        assert!(ScheduleConstraint::none().check(at(15, 0)).is_none());
    }
}
