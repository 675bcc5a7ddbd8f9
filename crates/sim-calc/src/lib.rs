//! # Simulation Calculation Engine
//!
//! 批量、容量、前置時間、Pegging 與逆推計劃計算

pub mod backward;
pub mod capacity;
pub mod lead_time;
pub mod lot_sizing;
pub mod pegging;

// Re-export 主要類型
pub use backward::{
    BackwardManager, BackwardWorkOrder, ChainStep, PegResults, RouteChain, StepPlanMultimap,
};
pub use capacity::{CapacityConstraint, CapacityViolation};
pub use lead_time::{LeadTimeCalculator, StepTimes, TimeTables};
pub use lot_sizing::LotSizePolicy;
pub use pegging::{PegAvailability, PegContext, PegOutcome, PeggingCalculator};

use rust_decimal::Decimal;

/// 逆推時向下游據點詢問投入量分割
///
/// 回傳 `(目標ID, 數量)` 列表，目標ID 對倉庫為倉庫本身，對製程為設備。
pub trait InputPlanner {
    fn plan_input_quantity(
        &self,
        location_id: &str,
        quantity: Decimal,
        item_id: &str,
    ) -> sim_core::Result<Vec<(String, Decimal)>>;
}

impl<F> InputPlanner for F
where
    F: Fn(&str, Decimal, &str) -> sim_core::Result<Vec<(String, Decimal)>>,
{
    fn plan_input_quantity(
        &self,
        location_id: &str,
        quantity: Decimal,
        item_id: &str,
    ) -> sim_core::Result<Vec<(String, Decimal)>> {
        self(location_id, quantity, item_id)
    }
}

/// 逆推計劃結果
#[derive(Debug, Clone)]
pub struct BackwardResult {
    /// 各工單的步驟計劃（依處理順序）
    pub plans: Vec<Vec<sim_core::BackwardStepPlan>>,

    /// 依據點分組的步驟計劃
    pub plans_by_location: StepPlanMultimap,

    /// Pegging 結果
    pub peg_results: PegResults,

    /// 警告信息
    pub warnings: Vec<PlanWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl BackwardResult {
    /// 創建空的計算結果
    pub fn empty() -> Self {
        Self {
            plans: Vec::new(),
            plans_by_location: StepPlanMultimap::new(),
            peg_results: PegResults::new(),
            warnings: Vec::new(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: PlanWarning) {
        self.warnings.push(warning);
    }

    /// 步驟計劃總數
    pub fn plan_count(&self) -> usize {
        self.plans.iter().map(Vec::len).sum()
    }
}

/// 計劃警告
#[derive(Debug, Clone)]
pub struct PlanWarning {
    pub work_order_id: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl PlanWarning {
    pub fn new(work_order_id: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            work_order_id,
            message,
            severity,
        }
    }

    pub fn info(work_order_id: String, message: String) -> Self {
        Self::new(work_order_id, message, WarningSeverity::Info)
    }

    pub fn warning(work_order_id: String, message: String) -> Self {
        Self::new(work_order_id, message, WarningSeverity::Warning)
    }

    pub fn error(work_order_id: String, message: String) -> Self {
        Self::new(work_order_id, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
