//! 設備作業履歷（甘特圖資料）

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TimeUnit;
use crate::work_order::format_date;

/// 履歷事件類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryEvent {
    #[serde(rename = "SETUP")]
    Setup,
    #[serde(rename = "PROCESS")]
    Process,
}

/// 設備作業履歷列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHistoryRow {
    /// 製程ID
    pub process_id: String,

    /// 設備ID
    pub resource_id: String,

    /// 下一個據點（目前未追蹤）
    pub next_location_id: Option<String>,

    /// 批次ID
    pub lot_id: Uuid,

    pub work_order_id: String,
    pub order_item_id: String,
    pub item_id: String,

    /// 生產數量
    pub quantity: Decimal,

    /// 事件
    pub event: HistoryEvent,

    /// 開始時間
    pub start: NaiveDateTime,

    /// 結束時間（尚未結束為 None）
    pub end: Option<NaiveDateTime>,

    /// 持續時間
    pub duration: Option<Duration>,
}

impl ResourceHistoryRow {
    /// 是否仍在進行中
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// 結束本列
    pub fn close(&mut self, date: NaiveDateTime) {
        if self.end.is_none() {
            self.end = Some(date);
            self.duration = Some(date - self.start);
        }
    }

    /// 以相同內容重新開啟一列
    pub fn reopen(&self, date: NaiveDateTime) -> Self {
        Self {
            start: date,
            end: None,
            duration: None,
            ..self.clone()
        }
    }

    /// 轉換為匯出記錄
    pub fn to_record(
        &self,
        plan_version_id: &str,
        simulation_id: Uuid,
        duration_unit: TimeUnit,
    ) -> ResourceHistoryRecord {
        let duration = self.duration.map(|d| {
            Decimal::from(d.num_seconds()) / Decimal::from(duration_unit.seconds())
        });

        ResourceHistoryRecord {
            plan_version_id: plan_version_id.to_string(),
            simulation_id,
            process_id: self.process_id.clone(),
            resource_id: self.resource_id.clone(),
            next_location_id: self.next_location_id.clone(),
            lot_id: self.lot_id,
            work_order_id: self.work_order_id.clone(),
            order_item_id: self.order_item_id.clone(),
            item_id: self.item_id.clone(),
            quantity: self.quantity,
            event: self.event,
            start: format_date(self.start),
            end: self.end.map(format_date),
            duration,
        }
    }
}

/// 匯出用的設備作業履歷記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHistoryRecord {
    pub plan_version_id: String,
    pub simulation_id: Uuid,
    pub process_id: String,
    pub resource_id: String,
    pub next_location_id: Option<String>,
    pub lot_id: Uuid,
    pub work_order_id: String,
    pub order_item_id: String,
    pub item_id: String,
    pub quantity: Decimal,
    pub event: HistoryEvent,
    /// `%Y%m%d%H%M%S`
    pub start: String,
    pub end: Option<String>,
    /// 以履歷時長單位表示
    pub duration: Option<Decimal>,
}
