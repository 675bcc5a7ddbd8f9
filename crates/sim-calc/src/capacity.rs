//! 倉庫容量限制

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sim_core::InventoryMaster;

/// 容量限制
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityConstraint {
    /// 總容量上限
    pub max_quantity: Option<Decimal>,

    /// 各物料容量上限
    pub item_limits: HashMap<String, Decimal>,
}

/// 違反的容量限制
#[derive(Debug, Clone, PartialEq)]
pub enum CapacityViolation {
    /// 超過總容量
    Total {
        held: Decimal,
        requested: Decimal,
        max_quantity: Decimal,
    },
    /// 超過物料容量
    Item {
        item_id: String,
        held: Decimal,
        requested: Decimal,
        limit: Decimal,
    },
}

impl fmt::Display for CapacityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityViolation::Total {
                held,
                requested,
                max_quantity,
            } => write!(f, "總容量不足: {} + {} > {}", held, requested, max_quantity),
            CapacityViolation::Item {
                item_id,
                held,
                requested,
                limit,
            } => write!(
                f,
                "物料 {} 容量不足: {} + {} > {}",
                item_id, held, requested, limit
            ),
        }
    }
}

impl CapacityConstraint {
    pub fn new(max_quantity: Option<Decimal>) -> Self {
        Self {
            max_quantity,
            item_limits: HashMap::new(),
        }
    }

    /// 不限容量
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// 建構器模式：設置物料容量
    pub fn with_item_limit(mut self, item_id: String, limit: Decimal) -> Self {
        self.item_limits.insert(item_id, limit);
        self
    }

    pub fn from_master(master: &InventoryMaster) -> Self {
        Self {
            max_quantity: master.max_quantity,
            item_limits: master.item_limits.clone(),
        }
    }

    /// 檢查加入數量後是否違反容量（None 表示可行）
    ///
    /// `held_by_item` 為各物料目前持有量（庫存加在途）。
    pub fn check(
        &self,
        item_id: &str,
        held_by_item: &HashMap<String, Decimal>,
        quantity: Decimal,
    ) -> Option<CapacityViolation> {
        if let Some(max_quantity) = self.max_quantity {
            let held: Decimal = held_by_item.values().copied().sum();
            if held + quantity > max_quantity {
                return Some(CapacityViolation::Total {
                    held,
                    requested: quantity,
                    max_quantity,
                });
            }
        }

        if let Some(limit) = self.item_limits.get(item_id) {
            let held = held_by_item.get(item_id).copied().unwrap_or(Decimal::ZERO);
            if held + quantity > *limit {
                return Some(CapacityViolation::Item {
                    item_id: item_id.to_string(),
                    held,
                    requested: quantity,
                    limit: *limit,
                });
            }
        }

        None
    }

    /// 單一物料可存放上限（物料限制 → 總容量 → 不限）
    pub fn item_capacity(&self, item_id: &str) -> Option<Decimal> {
        self.item_limits
            .get(item_id)
            .copied()
            .or(self.max_quantity)
            .filter(|c| *c > Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(pairs: &[(&str, i64)]) -> HashMap<String, Decimal> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Decimal::from(*v)))
            .collect()
    }

    #[test]
    fn test_unbounded_accepts_everything() {
        let constraint = CapacityConstraint::unbounded();
        assert!(constraint
            .check("A", &held(&[("A", 1_000_000)]), Decimal::from(1_000_000))
            .is_none());
        assert_eq!(constraint.item_capacity("A"), None);
    }

    #[test]
    fn test_total_capacity() {
        let constraint = CapacityConstraint::new(Some(Decimal::from(100)));
        let current = held(&[("A", 40), ("B", 30)]);

        assert!(constraint.check("A", &current, Decimal::from(30)).is_none());
        assert!(matches!(
            constraint.check("C", &current, Decimal::from(31)),
            Some(CapacityViolation::Total { .. })
        ));
    }

    #[test]
    fn test_item_limit() {
        let constraint = CapacityConstraint::new(Some(Decimal::from(1000)))
            .with_item_limit("A".to_string(), Decimal::from(50));
        let current = held(&[("A", 40), ("B", 300)]);

        let violation = constraint.check("A", &current, Decimal::from(20)).unwrap();
        assert!(violation.to_string().contains("物料 A"));
        assert!(constraint.check("B", &current, Decimal::from(20)).is_none());
    }

    #[test]
    fn test_item_capacity_fallback() {
        let constraint = CapacityConstraint::new(Some(Decimal::from(1000)))
            .with_item_limit("A".to_string(), Decimal::from(50));

        assert_eq!(constraint.item_capacity("A"), Some(Decimal::from(50)));
        assert_eq!(constraint.item_capacity("B"), Some(Decimal::from(1000)));
    }
}
