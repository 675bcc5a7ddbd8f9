//! # Simulation Core
//!
//! 工廠模擬核心資料模型與類型定義

pub mod calendar;
pub mod config;
pub mod constraint;
pub mod history;
pub mod item;
pub mod master;
pub mod plan;
pub mod routing;
pub mod work_order;

// Re-export 主要類型
pub use calendar::{FactoryCalendar, OffDayType, Tick, TickScheduler};
pub use config::{NextRoutePolicy, SimConfig, TimeUnit};
pub use constraint::{BlackoutWindow, ScheduleConstraint};
pub use history::{HistoryEvent, ResourceHistoryRecord, ResourceHistoryRow};
pub use item::{Item, ItemAction, ItemEvent};
pub use master::{
    FactoryInfo, FactoryMaster, InventoryMaster, InventoryType, ProcessMaster,
    ProcessResourceMaster, ResourceMaster, WipRecord,
};
pub use plan::{BackwardStepPlan, PegRecord, StockRecord};
pub use routing::{LocationType, RouteAttribute};
pub use work_order::{format_date, parse_date, WorkOrder, DATE_FORMAT};

/// 模擬錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("找不到據點: {0}")]
    LocationNotFound(String),

    #[error("找不到設備: {0}")]
    ResourceNotFound(String),

    #[error("找不到路由: {0}")]
    RouteNotFound(String),

    #[error("找不到成品倉（PDINV）")]
    MissingFinishedGoods,

    #[error("成品倉（PDINV）不只一個: {0}")]
    AmbiguousFinishedGoods(String),

    #[error("路由鏈出現循環: {0}")]
    RouteCycle(String),

    #[error("無效的批量設定: {0}")]
    InvalidLotSize(String),

    #[error("無效的設定: {0}")]
    InvalidConfig(String),

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("計算錯誤: {0}")]
    CalculationError(String),

    #[error("設定檔解析錯誤: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("檔案讀取錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
