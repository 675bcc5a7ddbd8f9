//! 工廠日曆與模擬時間軸

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// 休息日類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffDayType {
    /// 週休
    Weekend,
    /// 節假日
    Holiday,
}

/// 模擬時間刻度（一個 tick）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// 時間序號（從 0 開始）
    pub index: i64,

    /// 時間點
    pub date: NaiveDateTime,

    /// 是否為休息日
    pub is_off_day: bool,

    /// 休息日類型
    pub off_day_type: Option<OffDayType>,
}

impl Tick {
    /// 創建工作日 tick
    pub fn new(index: i64, date: NaiveDateTime) -> Self {
        Self {
            index,
            date,
            is_off_day: false,
            off_day_type: None,
        }
    }

    /// 建構器模式：標記為休息日
    pub fn with_off_day(mut self, off_day_type: OffDayType) -> Self {
        self.is_off_day = true;
        self.off_day_type = Some(off_day_type);
        self
    }
}

/// 工廠日曆
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryCalendar {
    /// 開始時間
    pub start: NaiveDateTime,

    /// 結束時間（包含）
    pub end: NaiveDateTime,

    /// 時間間隔（秒）
    pub step_seconds: i64,

    /// 工作日（週一到週日，true表示工作日）
    /// 索引 0 = 週一, 1 = 週二, ..., 6 = 週日
    pub working_days: [bool; 7],

    /// 節假日列表
    pub holidays: Vec<NaiveDate>,
}

impl FactoryCalendar {
    /// 創建 24/7 工廠日曆
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, step: Duration) -> Result<Self> {
        if end < start {
            return Err(SimError::InvalidDate(format!(
                "結束時間 {} 早於開始時間 {}",
                end, start
            )));
        }
        let step_seconds = step.num_seconds();
        if step_seconds <= 0 {
            return Err(SimError::InvalidDate(format!(
                "時間間隔必須大於 0: {} 秒",
                step_seconds
            )));
        }

        Ok(Self {
            start,
            end,
            step_seconds,
            working_days: [true; 7],
            holidays: Vec::new(),
        })
    }

    /// 建構器模式：設置工作日
    pub fn with_working_days(mut self, working_days: [bool; 7]) -> Self {
        self.working_days = working_days;
        self
    }

    /// 建構器模式：設置節假日
    pub fn with_holidays(mut self, holidays: Vec<NaiveDate>) -> Self {
        self.holidays = holidays;
        self
    }

    /// 添加節假日
    pub fn add_holiday(&mut self, date: NaiveDate) {
        if !self.holidays.contains(&date) {
            self.holidays.push(date);
            self.holidays.sort();
        }
    }

    /// 判斷是否休息，回傳休息類型
    pub fn off_day_type(&self, date: NaiveDate) -> Option<OffDayType> {
        if self.holidays.contains(&date) {
            return Some(OffDayType::Holiday);
        }

        let weekday_index = date.weekday().num_days_from_monday() as usize;
        if self.working_days[weekday_index] {
            None
        } else {
            Some(OffDayType::Weekend)
        }
    }

    /// 檢查是否為工作日
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.off_day_type(date).is_none()
    }

    /// 時間間隔
    pub fn step(&self) -> Duration {
        Duration::seconds(self.step_seconds)
    }

    /// 總 tick 數
    pub fn len(&self) -> usize {
        let horizon = (self.end - self.start).num_seconds();
        (horizon / self.step_seconds) as usize + 1
    }

    /// 日曆是否為空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 展開完整時間軸（從開始到結束，依時間間隔）
    pub fn ticks(&self) -> Vec<Tick> {
        let step = self.step();
        let mut ticks = Vec::with_capacity(self.len());
        let mut date = self.start;
        let mut index = 0;

        while date <= self.end {
            let tick = match self.off_day_type(date.date()) {
                Some(off_day_type) => Tick::new(index, date).with_off_day(off_day_type),
                None => Tick::new(index, date),
            };
            ticks.push(tick);
            date += step;
            index += 1;
        }

        ticks
    }

    /// 建立逐 tick 推進的排程器
    pub fn scheduler(&self) -> TickScheduler {
        TickScheduler::new(self.ticks())
    }
}

/// 模擬時間排程器（has_next / next）
#[derive(Debug, Clone)]
pub struct TickScheduler {
    ticks: Vec<Tick>,
    cursor: usize,
}

impl TickScheduler {
    /// 從時間軸建立排程器
    pub fn new(ticks: Vec<Tick>) -> Self {
        Self { ticks, cursor: 0 }
    }

    /// 是否還有下一個 tick
    pub fn has_next(&self) -> bool {
        self.cursor < self.ticks.len()
    }

    /// 時間軸總長度
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// 時間軸是否為空
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// 第一個 tick
    pub fn first(&self) -> Option<&Tick> {
        self.ticks.first()
    }
}

impl Iterator for TickScheduler {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        let tick = self.ticks.get(self.cursor).cloned();
        if tick.is_some() {
            self.cursor += 1;
        }
        tick
    }
}
