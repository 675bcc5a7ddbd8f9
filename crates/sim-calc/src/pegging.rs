//! 庫存/在製品 Pegging

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use sim_core::{PegRecord, StockRecord};

/// 可 Pegging 庫存（(據點, 物料) → 庫存記錄，保持輸入順序）
#[derive(Debug, Clone, Default)]
pub struct PegAvailability {
    records: HashMap<(String, String), Vec<StockRecord>>,
}

impl PegAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從庫存記錄建立
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = StockRecord>,
    {
        let mut availability = Self::new();
        for record in records {
            availability.push(record);
        }
        availability
    }

    /// 追加一筆庫存記錄
    pub fn push(&mut self, record: StockRecord) {
        self.records
            .entry((record.location_id.clone(), record.item_id.clone()))
            .or_default()
            .push(record);
    }

    pub fn get(&self, location_id: &str, item_id: &str) -> &[StockRecord] {
        self.records
            .get(&(location_id.to_string(), item_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 剩餘可 Pegging 數量
    pub fn remaining(&self, location_id: &str, item_id: &str) -> Decimal {
        self.get(location_id, item_id).iter().map(|r| r.quantity).sum()
    }

    fn get_mut(&mut self, location_id: &str, item_id: &str) -> Option<&mut Vec<StockRecord>> {
        self.records
            .get_mut(&(location_id.to_string(), item_id.to_string()))
    }
}

/// Pegging 時寫入結果的工單資訊
#[derive(Debug, Clone)]
pub struct PegContext<'a> {
    pub work_order_id: &'a str,
    pub order_item_id: &'a str,
    pub order_quantity: Decimal,
    pub lpst: Option<NaiveDateTime>,
}

/// Pegging 結果
#[derive(Debug, Clone, PartialEq)]
pub struct PegOutcome {
    /// 已 Pegging 數量
    pub pegged: Decimal,

    /// 剩餘需求數量
    pub residual: Decimal,

    /// 每消耗一筆庫存的記錄
    pub records: Vec<PegRecord>,
}

/// Pegging 計算器
pub struct PeggingCalculator;

impl PeggingCalculator {
    /// 以 (據點, 物料) 的庫存依序抵扣需求
    ///
    /// 依記錄順序消耗，略過已為 0 的記錄，需求歸零即停止。
    pub fn peg(
        availability: &mut PegAvailability,
        location_id: &str,
        item_id: &str,
        required: Decimal,
        ctx: &PegContext<'_>,
        precision: u32,
    ) -> PegOutcome {
        let mut outcome = PegOutcome {
            pegged: Decimal::ZERO,
            residual: required.max(Decimal::ZERO),
            records: Vec::new(),
        };

        let Some(stock) = availability.get_mut(location_id, item_id) else {
            return outcome;
        };

        for record in stock.iter_mut() {
            if outcome.residual <= Decimal::ZERO {
                break;
            }
            if record.quantity <= Decimal::ZERO {
                continue;
            }

            let take = outcome.residual.min(record.quantity);
            outcome.records.push(PegRecord {
                location_id: location_id.to_string(),
                item_id: item_id.to_string(),
                work_order_id: ctx.work_order_id.to_string(),
                order_item_id: ctx.order_item_id.to_string(),
                order_quantity: ctx.order_quantity,
                required_quantity: outcome.residual,
                peg_quantity: take,
                lpst: ctx.lpst,
            });

            record.quantity = (record.quantity - take).round_dp(precision);
            outcome.residual -= take;
            outcome.pegged += take;
        }

        if !outcome.pegged.is_zero() {
            tracing::debug!(
                "Pegging {}:{} - {} 抵扣 {}，剩餘需求 {}",
                location_id,
                item_id,
                ctx.work_order_id,
                outcome.pegged,
                outcome.residual
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> PegContext<'static> {
        PegContext {
            work_order_id: "WO-001",
            order_item_id: "FG-01",
            order_quantity: Decimal::from(100),
            lpst: None,
        }
    }

    fn availability(quantities: &[i64]) -> PegAvailability {
        PegAvailability::from_records(quantities.iter().map(|q| {
            StockRecord::new("FGI".to_string(), "FG-01".to_string(), Decimal::from(*q))
        }))
    }

    #[test]
    fn test_peg_consumes_in_list_order() {
        let mut stock = availability(&[0, 30, 50, 20]);

        let outcome =
            PeggingCalculator::peg(&mut stock, "FGI", "FG-01", Decimal::from(60), &ctx(), 3);

        assert_eq!(outcome.pegged, Decimal::from(60));
        assert_eq!(outcome.residual, Decimal::ZERO);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].peg_quantity, Decimal::from(30));
        assert_eq!(outcome.records[1].required_quantity, Decimal::from(30));

        let left: Vec<_> = stock.get("FGI", "FG-01").iter().map(|r| r.quantity).collect();
        assert_eq!(
            left,
            vec![Decimal::ZERO, Decimal::ZERO, Decimal::from(20), Decimal::from(20)]
        );
    }

    #[test]
    fn test_peg_without_stock() {
        let mut stock = PegAvailability::new();

        let outcome =
            PeggingCalculator::peg(&mut stock, "FGI", "FG-01", Decimal::from(60), &ctx(), 3);

        assert_eq!(outcome.pegged, Decimal::ZERO);
        assert_eq!(outcome.residual, Decimal::from(60));
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_peg_zero_required_consumes_nothing() {
        let mut stock = availability(&[10]);

        let outcome = PeggingCalculator::peg(&mut stock, "FGI", "FG-01", Decimal::ZERO, &ctx(), 3);

        assert!(outcome.records.is_empty());
        assert_eq!(stock.remaining("FGI", "FG-01"), Decimal::from(10));
    }

    proptest! {
        #[test]
        fn prop_peg_exhaustion(
            stock in proptest::collection::vec(0i64..200, 0..10),
            required in 0i64..1_000,
        ) {
            let mut availability = availability(&stock);
            let total = Decimal::from(stock.iter().sum::<i64>());
            let required = Decimal::from(required);

            let outcome = PeggingCalculator::peg(&mut availability, "FGI", "FG-01", required, &ctx(), 3);

            prop_assert_eq!(outcome.pegged, required.min(total));
            prop_assert_eq!(outcome.residual, (required - total).max(Decimal::ZERO));
            prop_assert_eq!(
                availability.remaining("FGI", "FG-01"),
                (total - required).max(Decimal::ZERO)
            );
        }
    }
}
