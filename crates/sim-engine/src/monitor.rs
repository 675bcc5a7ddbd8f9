//! 模擬過程記錄

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sim_core::Tick;

use crate::manager::FactoryManager;
use crate::process::ResourceStatus;

/// 單一 tick 結束時的工廠狀態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub index: i64,
    pub date: NaiveDateTime,
    pub is_off_day: bool,

    /// 閒置設備數
    pub idle: usize,
    /// 整備中設備數
    pub setup: usize,
    /// 加工中設備數
    pub process: usize,

    /// 尚未完成的步驟計劃數
    pub open_plans: usize,
    pub finished_plans: usize,

    /// 累計出貨量
    pub shipped: Decimal,
}

/// 模擬監控
#[derive(Debug, Clone, Default)]
pub struct SimulationMonitor {
    snapshots: Vec<TickSnapshot>,
}

impl SimulationMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記錄 tick 結束時的狀態
    pub fn record(&mut self, tick: &Tick, manager: &FactoryManager) {
        let counts = manager.resource_status_counts();
        let count = |status| counts.get(&status).copied().unwrap_or(0);

        let snapshot = TickSnapshot {
            index: tick.index,
            date: tick.date,
            is_off_day: tick.is_off_day,
            idle: count(ResourceStatus::Idle),
            setup: count(ResourceStatus::Setup),
            process: count(ResourceStatus::Process),
            open_plans: manager.open_plans().len(),
            finished_plans: manager.finished_plan_count(),
            shipped: manager.shipped_quantity(),
        };
        tracing::trace!(
            "tick {} {}：加工 {}，整備 {}，閒置 {}，出貨 {}",
            snapshot.index,
            snapshot.date,
            snapshot.process,
            snapshot.setup,
            snapshot.idle,
            snapshot.shipped
        );
        self.snapshots.push(snapshot);
    }

    pub fn snapshots(&self) -> &[TickSnapshot] {
        &self.snapshots
    }

    pub fn last(&self) -> Option<&TickSnapshot> {
        self.snapshots.last()
    }

    /// 設備加工中的 tick 比例（以設備-tick 計）
    pub fn utilization(&self) -> Decimal {
        let (busy, total) = self.snapshots.iter().fold((0usize, 0usize), |(busy, total), s| {
            (busy + s.setup + s.process, total + s.idle + s.setup + s.process)
        });
        if total == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(busy as u64) / Decimal::from(total as u64)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sim_core::{
        FactoryInfo, FactoryMaster, InventoryMaster, InventoryType, LocationType, NextRoutePolicy,
        ProcessMaster, ProcessResourceMaster, ResourceMaster, RouteAttribute, SimConfig,
    };

    use crate::builder::FactoryBuilder;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn manager() -> FactoryManager {
        let mut master = FactoryMaster::new(FactoryInfo::new("F1".to_string(), "Plant".to_string()));
        master.inventories = vec![InventoryMaster::new("FGI".to_string(), InventoryType::FinishedGoods)];
        master.processes = vec![ProcessMaster::new("REACTOR".to_string(), "Reactor".to_string())];
        master.resources = vec![
            ResourceMaster::new("LDMD1".to_string(), "LDMD1".to_string()),
            ResourceMaster::new("LDMD2".to_string(), "LDMD2".to_string()),
        ];
        master.process_resources = vec![
            ProcessResourceMaster::new("REACTOR".to_string(), "LDMD1".to_string()),
            ProcessResourceMaster::new("REACTOR".to_string(), "LDMD2".to_string()),
        ];
        master.routes = vec![RouteAttribute::new(
            "RM".to_string(),
            "FG".to_string(),
            "REACTOR".to_string(),
            "FGI".to_string(),
            LocationType::Process,
            LocationType::Inventory,
        )];

        let config = SimConfig::default();
        let factory = FactoryBuilder::new(&master, &config).build(start()).unwrap();
        FactoryManager::new(factory, &[], NextRoutePolicy::AttributePriority)
    }

    #[test]
    fn test_record_counts_idle_resources() {
        let manager = manager();
        let mut monitor = SimulationMonitor::new();

        monitor.record(&Tick::new(0, start()), &manager);

        let last = monitor.last().unwrap();
        assert_eq!(last.idle, 2);
        assert_eq!(last.setup + last.process, 0);
        assert_eq!(last.shipped, Decimal::ZERO);
        assert_eq!(monitor.utilization(), Decimal::ZERO);
    }

    #[test]
    fn test_empty_monitor() {
        let mut monitor = SimulationMonitor::new();
        assert!(monitor.last().is_none());
        assert_eq!(monitor.utilization(), Decimal::ZERO);

        monitor.record(&Tick::new(0, start()), &manager());
        monitor.clear();
        assert!(monitor.snapshots().is_empty());
    }
}
