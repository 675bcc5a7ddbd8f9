//! 逆推步驟計劃與 Pegging 記錄

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 逆推步驟計劃（每張工單、每個路由步驟一筆）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackwardStepPlan {
    /// 步驟序號（成品倉為 1）
    pub step: u32,

    /// 本步驟物料ID
    pub item_id: String,

    /// 本步驟據點
    pub location_id: String,

    /// 下游目標ID（成品倉步驟為空字串）
    pub to_location_id: String,

    /// 工單ID
    pub work_order_id: String,

    /// 工單成品ID
    pub order_item_id: String,

    /// 工單訂購數量
    pub order_quantity: Decimal,

    /// 需生產數量（扣除 Pegging 後）
    pub required_quantity: Decimal,

    /// Pegging 數量
    pub peg_quantity: Decimal,

    /// 交期
    pub due_date: Option<NaiveDateTime>,

    /// 最晚開工時間
    pub lpst: Option<NaiveDateTime>,

    /// 優先級
    pub priority: i32,
}

impl BackwardStepPlan {
    /// 創建步驟計劃
    pub fn new(
        work_order_id: String,
        order_item_id: String,
        order_quantity: Decimal,
        step: u32,
        item_id: String,
        location_id: String,
    ) -> Self {
        Self {
            step,
            item_id,
            location_id,
            to_location_id: String::new(),
            work_order_id,
            order_item_id,
            order_quantity,
            required_quantity: Decimal::ZERO,
            peg_quantity: Decimal::ZERO,
            due_date: None,
            lpst: None,
            priority: -1,
        }
    }

    /// 建構器模式：設置需生產數量
    pub fn with_required_quantity(mut self, quantity: Decimal) -> Self {
        self.required_quantity = quantity;
        self
    }

    /// 建構器模式：設置下游目標
    pub fn with_to_location(mut self, to_location_id: String) -> Self {
        self.to_location_id = to_location_id;
        self
    }

    /// 建構器模式：設置交期與最晚開工時間
    pub fn with_dates(mut self, due_date: NaiveDateTime, lpst: NaiveDateTime) -> Self {
        self.due_date = Some(due_date);
        self.lpst = Some(lpst);
        self
    }

    /// 建構器模式：設置優先級
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 確定 Pegging 數量，需生產數量同步扣減（不低於 0）
    pub fn peg(&mut self, quantity: Decimal, precision: u32) {
        self.peg_quantity = quantity;
        self.required_quantity = (self.required_quantity - quantity)
            .round_dp(precision)
            .max(Decimal::ZERO);
    }

    /// 正向模擬時本步驟應搬出的總數量
    pub fn fetch_quantity(&self) -> Decimal {
        self.required_quantity + self.peg_quantity
    }
}

/// 可 Pegging 的庫存/在製品快照
///
/// 倉庫庫存以倉庫ID為 `location_id`，在製品以製程ID為 `location_id`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub location_id: String,
    pub item_id: String,
    pub quantity: Decimal,
}

impl StockRecord {
    pub fn new(location_id: String, item_id: String, quantity: Decimal) -> Self {
        Self {
            location_id,
            item_id,
            quantity,
        }
    }
}

/// Pegging 結果（每消耗一筆庫存記錄產生一筆）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PegRecord {
    /// 被消耗的庫存所在據點
    pub location_id: String,

    /// 物料ID
    pub item_id: String,

    /// 工單ID
    pub work_order_id: String,

    /// 工單成品ID
    pub order_item_id: String,

    /// 工單訂購數量
    pub order_quantity: Decimal,

    /// Pegging 前的需求數量
    pub required_quantity: Decimal,

    /// 本筆 Pegging 數量
    pub peg_quantity: Decimal,

    /// 最晚開工時間
    pub lpst: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn plan(required: i64) -> BackwardStepPlan {
        BackwardStepPlan::new(
            "WO-001".to_string(),
            "FG-01".to_string(),
            Decimal::from(required),
            1,
            "FG-01".to_string(),
            "FGI".to_string(),
        )
        .with_required_quantity(Decimal::from(required))
    }

    #[rstest]
    #[case(100, 30, 70)]
    #[case(100, 100, 0)]
    #[case(100, 0, 100)]
    #[case(50, 80, 0)]
    fn test_peg(#[case] required: i64, #[case] peg: i64, #[case] expected: i64) {
        let mut plan = plan(required);
        plan.peg(Decimal::from(peg), 3);

        assert_eq!(plan.peg_quantity, Decimal::from(peg));
        assert_eq!(plan.required_quantity, Decimal::from(expected));
    }

    #[test]
    fn test_peg_rounds_to_precision() {
        let mut plan = plan(0).with_required_quantity(Decimal::new(10_0004, 4));
        plan.peg(Decimal::new(3, 0), 3);

        assert_eq!(plan.required_quantity, Decimal::new(7_000, 3));
    }

    #[test]
    fn test_fetch_quantity() {
        let mut plan = plan(100);
        plan.peg(Decimal::from(40), 3);

        assert_eq!(plan.fetch_quantity(), Decimal::from(100));
        assert!(plan.to_location_id.is_empty());
    }
}
