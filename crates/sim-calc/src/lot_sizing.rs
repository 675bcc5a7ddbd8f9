//! 批量規則（設備投入量計算）

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sim_core::{ProcessResourceMaster, Result, SimError};

/// 設備批量規則
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSizePolicy {
    /// 最小批量
    pub min_lot_size: Decimal,

    /// 最大批量（None 表示不限）
    pub max_lot_size: Option<Decimal>,

    /// 批量單位（≤ 0 表示不限倍數）
    pub unit_lot_size: Decimal,

    /// 生產效率（≤ 0 視為 1）
    pub efficiency: Decimal,

    /// 投入量小數位數
    pub precision: u32,
}

impl LotSizePolicy {
    /// 創建批量規則
    pub fn new(min_lot_size: Decimal, max_lot_size: Option<Decimal>, unit_lot_size: Decimal) -> Self {
        Self {
            min_lot_size,
            max_lot_size,
            unit_lot_size,
            efficiency: Decimal::ONE,
            precision: 0,
        }
    }

    /// 建構器模式：設置效率與精度
    pub fn with_efficiency(mut self, efficiency: Decimal, precision: u32) -> Self {
        self.efficiency = efficiency;
        self.precision = precision;
        self
    }

    /// 從設備主檔建立（最大批量 0 視為不限）
    pub fn from_master(master: &ProcessResourceMaster) -> Result<Self> {
        let max_lot_size = master.max_lot_size.filter(|m| *m > Decimal::ZERO);
        if let Some(max) = max_lot_size {
            if max < master.min_lot_size {
                return Err(SimError::InvalidLotSize(format!(
                    "{}:{} 最大批量 {} 小於最小批量 {}",
                    master.process_id, master.resource_id, max, master.min_lot_size
                )));
            }
        }

        Ok(Self::new(master.min_lot_size, max_lot_size, master.unit_lot_size)
            .with_efficiency(master.efficiency, master.precision))
    }

    fn unit(&self) -> Option<Decimal> {
        (self.unit_lot_size > Decimal::ZERO).then_some(self.unit_lot_size)
    }

    fn effective_efficiency(&self) -> Decimal {
        if self.efficiency > Decimal::ZERO {
            self.efficiency
        } else {
            Decimal::ONE
        }
    }

    /// 向上取整到批量單位後換算投入量
    fn upper_input_quantity(&self, quantity: Decimal) -> Decimal {
        let units = match self.unit() {
            Some(unit) => {
                let whole = (quantity / unit).floor();
                let partial = if quantity % unit > Decimal::ZERO {
                    Decimal::ONE
                } else {
                    Decimal::ZERO
                };
                unit * (whole + partial)
            }
            None => quantity,
        };
        (units / self.effective_efficiency()).round_dp(self.precision)
    }

    /// 向下取整到批量單位後換算投入量
    fn lower_input_quantity(&self, quantity: Decimal) -> Decimal {
        let units = match self.unit() {
            Some(unit) => unit * (quantity / unit).floor(),
            None => quantity,
        };
        (units / self.effective_efficiency()).round_dp(self.precision)
    }

    /// 計算可投入量
    ///
    /// 結果介於最小與最大批量之間並符合批量單位；需求為 0 時回傳 0。
    pub fn calculate_available_input_quantity(&self, required: Decimal) -> Decimal {
        if required.is_zero() {
            return Decimal::ZERO;
        }

        let bounded = self
            .upper_input_quantity(required)
            .max(self.lower_input_quantity(self.min_lot_size));

        match self.max_lot_size {
            Some(max) => bounded.min(self.lower_input_quantity(max)),
            None => bounded,
        }
    }

    /// 投入量是否落在換算效率後的批量範圍內
    ///
    /// 投入量與 [`Self::calculate_available_input_quantity`] 同單位，不再取整或換算。
    pub fn admits(&self, input_quantity: Decimal) -> bool {
        self.lower_input_quantity(self.min_lot_size) <= input_quantity
            && self
                .max_lot_size
                .map_or(true, |max| input_quantity <= self.lower_input_quantity(max))
    }

    /// 投入量加工完成後的產出量
    pub fn output_quantity(&self, input_quantity: Decimal) -> Decimal {
        (input_quantity * self.effective_efficiency()).round_dp(self.precision)
    }

    /// 加工所需 tick 數 = ceil(數量 / 速率)
    pub fn process_ticks(quantity: Decimal, rate: Decimal) -> i64 {
        if rate <= Decimal::ZERO {
            return 0;
        }
        (quantity / rate).ceil().to_i64().unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn reactor_policy() -> LotSizePolicy {
        LotSizePolicy::new(Decimal::from(80), Some(Decimal::from(500)), Decimal::ONE)
    }

    #[rstest]
    #[case(0, 0)]
    #[case(100, 100)]
    #[case(30, 80)]
    #[case(800, 500)]
    #[case(500, 500)]
    fn test_reactor_input_quantity(#[case] required: i64, #[case] expected: i64) {
        let policy = reactor_policy();
        assert_eq!(
            policy.calculate_available_input_quantity(Decimal::from(required)),
            Decimal::from(expected)
        );
    }

    #[test]
    fn test_unit_rounding() {
        // 單位 25：需求 110 → 125，最小 60 → 50
        let policy = LotSizePolicy::new(Decimal::from(60), Some(Decimal::from(490)), Decimal::from(25));

        assert_eq!(policy.calculate_available_input_quantity(Decimal::from(110)), Decimal::from(125));
        assert_eq!(policy.calculate_available_input_quantity(Decimal::from(10)), Decimal::from(50));
        assert_eq!(policy.calculate_available_input_quantity(Decimal::from(480)), Decimal::from(475));
    }

    #[test]
    fn test_efficiency_and_precision() {
        let policy = LotSizePolicy::new(Decimal::ZERO, None, Decimal::from(10))
            .with_efficiency(Decimal::new(8, 1), 1);

        // ceil(35/10)*10 / 0.8 = 50
        assert_eq!(policy.calculate_available_input_quantity(Decimal::from(35)), Decimal::from(50));

        let policy = LotSizePolicy::new(Decimal::ZERO, None, Decimal::ONE)
            .with_efficiency(Decimal::from(3), 2);
        assert_eq!(
            policy.calculate_available_input_quantity(Decimal::from(10)),
            Decimal::new(333, 2)
        );
    }

    #[test]
    fn test_unbounded_max_and_no_unit() {
        let policy = LotSizePolicy::new(Decimal::from(5), None, Decimal::ZERO);

        assert_eq!(
            policy.calculate_available_input_quantity(Decimal::new(12346, 1)),
            Decimal::from(1235)
        );
        assert!(policy.admits(Decimal::new(1000007, 1)));
    }

    #[rstest]
    #[case(100, true)]
    #[case(80, true)]
    #[case(500, true)]
    #[case(30, false)]
    #[case(600, false)]
    fn test_admits_reactor_bounds(#[case] quantity: i64, #[case] expected: bool) {
        assert_eq!(reactor_policy().admits(Decimal::from(quantity)), expected);
    }

    #[test]
    fn test_admits_bounds_scaled_by_efficiency() {
        // 效率 0.8：範圍 100 ~ 625
        let policy = reactor_policy().with_efficiency(Decimal::new(8, 1), 0);

        let input = policy.calculate_available_input_quantity(Decimal::from(100));
        assert_eq!(input, Decimal::from(125));
        assert!(policy.admits(input));
        assert!(policy.admits(Decimal::from(625)));
        assert!(!policy.admits(Decimal::from(80)));
        assert!(!policy.admits(Decimal::from(626)));
    }

    #[test]
    fn test_output_quantity() {
        let policy = reactor_policy().with_efficiency(Decimal::new(8, 1), 0);
        assert_eq!(policy.output_quantity(Decimal::from(125)), Decimal::from(100));

        let policy = reactor_policy().with_efficiency(Decimal::new(95, 2), 0);
        let input = policy.calculate_available_input_quantity(Decimal::from(400));
        assert_eq!(input, Decimal::from(421));
        assert_eq!(policy.output_quantity(input), Decimal::from(400));

        assert_eq!(reactor_policy().output_quantity(Decimal::from(77)), Decimal::from(77));
    }

    #[rstest]
    #[case(100, 1, 100)]
    #[case(100, 3, 34)]
    #[case(0, 5, 0)]
    #[case(10, 0, 0)]
    fn test_process_ticks(#[case] quantity: i64, #[case] rate: i64, #[case] expected: i64) {
        assert_eq!(
            LotSizePolicy::process_ticks(Decimal::from(quantity), Decimal::from(rate)),
            expected
        );
    }

    #[test]
    fn test_from_master_rejects_inverted_bounds() {
        let master = ProcessResourceMaster::new("P".to_string(), "R".to_string()).with_lot_sizes(
            Decimal::from(100),
            Some(Decimal::from(50)),
            Decimal::ONE,
        );
        assert!(matches!(
            LotSizePolicy::from_master(&master),
            Err(SimError::InvalidLotSize(_))
        ));

        let master = ProcessResourceMaster::new("P".to_string(), "R".to_string()).with_lot_sizes(
            Decimal::from(10),
            Some(Decimal::ZERO),
            Decimal::ONE,
        );
        assert_eq!(LotSizePolicy::from_master(&master).unwrap().max_lot_size, None);
    }

    proptest! {
        #[test]
        fn prop_input_quantity_is_bounded(
            unit in 1i64..50,
            min_units in 0i64..20,
            extra_units in 0i64..50,
            required in 1i64..10_000,
        ) {
            let unit = Decimal::from(unit);
            let min = unit * Decimal::from(min_units);
            let max = min + unit * Decimal::from(extra_units.max(1));
            let policy = LotSizePolicy::new(min, Some(max), unit);

            let input = policy.calculate_available_input_quantity(Decimal::from(required));

            prop_assert!(min <= input);
            prop_assert!(input <= max);
            prop_assert!((input % unit).is_zero());
            prop_assert!(policy.admits(input));
        }
    }
}
