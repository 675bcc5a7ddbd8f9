//! 前置時間與最晚開工時間（LPST）計算

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use sim_core::{FactoryMaster, TimeUnit};

use crate::lot_sizing::LotSizePolicy;

/// 單一步驟的時間參數
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepTimes {
    /// 整備時間
    pub setup_time: i64,

    /// 每單位時間加工量（≤ 0 表示不計加工時間）
    pub process_rate: Decimal,

    /// 搬運時間
    pub move_time: i64,
}

/// 前置時間計算器
pub struct LeadTimeCalculator;

impl LeadTimeCalculator {
    /// 步驟總時長 = 整備 + ceil(數量 / 速率) + 搬運
    pub fn step_length(quantity: Decimal, times: &StepTimes) -> i64 {
        times.setup_time + LotSizePolicy::process_ticks(quantity, times.process_rate) + times.move_time
    }

    /// 由下游 LPST 往前推算本步驟 LPST
    pub fn lpst(
        current: NaiveDateTime,
        quantity: Decimal,
        times: &StepTimes,
        unit: TimeUnit,
    ) -> NaiveDateTime {
        current - unit.duration(Self::step_length(quantity, times))
    }
}

/// 各據點時間表
#[derive(Debug, Clone, Default)]
pub struct TimeTables {
    /// 據點 → 整備時間
    pub setup_times: HashMap<String, i64>,

    /// 據點 → 加工速率
    pub process_rates: HashMap<String, Decimal>,

    /// (來源據點, 目的據點) → 搬運時間
    pub move_times: HashMap<(String, String), i64>,
}

impl TimeTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置據點整備時間與加工速率
    pub fn with_location(mut self, location_id: &str, setup_time: i64, process_rate: Decimal) -> Self {
        self.setup_times.insert(location_id.to_string(), setup_time);
        self.process_rates.insert(location_id.to_string(), process_rate);
        self
    }

    /// 建構器模式：設置搬運時間
    pub fn with_move(mut self, from: &str, to: &str, move_time: i64) -> Self {
        self.move_times.insert((from.to_string(), to.to_string()), move_time);
        self
    }

    /// 從主檔推導
    ///
    /// 製程取優先級最高（數值最小，同值取主檔順序）的設備；搬運時間取第一條連線。
    pub fn from_master(master: &FactoryMaster) -> Self {
        let mut tables = Self::new();

        for process in &master.processes {
            let best = master
                .resources_of(&process.id)
                .into_iter()
                .min_by_key(|pr| pr.priority);
            if let Some(resource) = best {
                tables
                    .setup_times
                    .insert(process.id.clone(), resource.setup_time);
                tables
                    .process_rates
                    .insert(process.id.clone(), resource.process_rate);
            }
        }

        for edge in &master.routes {
            tables
                .move_times
                .entry((edge.from_location_id.clone(), edge.to_location_id.clone()))
                .or_insert(edge.move_time);
        }

        tables
    }

    /// 查詢步驟時間（缺少的項目為 0）
    pub fn step_times(&self, location_id: &str, next_location_id: &str) -> StepTimes {
        StepTimes {
            setup_time: self.setup_times.get(location_id).copied().unwrap_or(0),
            process_rate: self
                .process_rates
                .get(location_id)
                .copied()
                .unwrap_or(Decimal::ZERO),
            move_time: self
                .move_times
                .get(&(location_id.to_string(), next_location_id.to_string()))
                .copied()
                .unwrap_or(0),
        }
    }
}
