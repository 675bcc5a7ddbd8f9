//! 模擬執行環境：逆推計劃與逐 tick 模擬

use chrono::NaiveDateTime;
use uuid::Uuid;

use sim_calc::{BackwardManager, BackwardResult, TimeTables};
use sim_core::{
    FactoryMaster, ResourceHistoryRecord, Result, SimConfig, Tick, TickScheduler, WorkOrder,
};

use crate::builder::FactoryBuilder;
use crate::manager::FactoryManager;
use crate::monitor::SimulationMonitor;

/// 一次模擬所需的全部狀態
pub struct SimulationContext {
    pub simulation_id: Uuid,
    config: SimConfig,
    plan_start: NaiveDateTime,
    backward: BackwardManager,
    manager: FactoryManager,
    monitor: SimulationMonitor,
    backward_result: Option<BackwardResult>,
}

impl SimulationContext {
    /// 建立工廠與管理器
    pub fn init(
        config: SimConfig,
        master: &FactoryMaster,
        work_orders: Vec<WorkOrder>,
        plan_start: NaiveDateTime,
    ) -> Result<Self> {
        config.validate()?;

        let factory = FactoryBuilder::new(master, &config)
            .with_order_items(work_orders.iter().map(|wo| wo.order_item_id.clone()))
            .build(plan_start)?;
        let manager = FactoryManager::new(factory, &work_orders, config.next_route_policy);
        let (entire_min, entire_max) = manager.entire_lot_size();
        tracing::info!(
            "工廠建立完成：{} 條路由，全廠批量範圍 {} ~ {}",
            manager.factory().route_ids().len(),
            entire_min,
            entire_max.map_or_else(|| "不限".to_string(), |max| max.to_string())
        );
        let backward = BackwardManager::new(
            master,
            work_orders,
            TimeTables::from_master(master),
            config.clone(),
        );

        Ok(Self {
            simulation_id: Uuid::new_v4(),
            config,
            plan_start,
            backward,
            manager,
            monitor: SimulationMonitor::new(),
            backward_result: None,
        })
    }

    /// 執行逆推計劃，並將 Pegging 與步驟計劃套用到工廠
    pub fn backward_plan(&mut self) -> Result<&BackwardResult> {
        let result = self.backward.run(self.manager.factory())?;

        for warning in &result.warnings {
            tracing::warn!("[{}] {}", warning.work_order_id, warning.message);
        }

        self.manager
            .set_backward_peg_item(&result.peg_results, self.plan_start);
        self.manager
            .set_backward_step_plan(result.plans_by_location.clone(), self.plan_start)?;

        Ok(self.backward_result.insert(result))
    }

    pub fn run(&mut self, tick: &Tick) {
        self.manager.run(tick);
    }

    pub fn transfer(&mut self, tick: &Tick) -> Result<()> {
        self.manager.transfer(tick)
    }

    /// 推進一個 tick：run、transfer，再記錄狀態
    pub fn step(&mut self, tick: &Tick) -> Result<()> {
        self.manager.run(tick);
        self.manager.transfer(tick)?;
        self.monitor.record(tick, &self.manager);
        Ok(())
    }

    /// 依排程器跑完整個時間軸
    pub fn simulate(&mut self, mut scheduler: TickScheduler) -> Result<()> {
        tracing::info!("開始模擬 {}：共 {} 個 tick", self.simulation_id, scheduler.len());
        let start_time = std::time::Instant::now();

        while scheduler.has_next() {
            if let Some(tick) = scheduler.next() {
                self.step(&tick)?;
            }
        }

        tracing::info!(
            "模擬完成：出貨 {}，未完成步驟計劃 {} 筆，耗時 {:?}",
            self.manager.shipped_quantity(),
            self.manager.open_plans().len(),
            start_time.elapsed()
        );
        Ok(())
    }

    /// 設備作業履歷（甘特圖資料）
    pub fn resource_history(&self) -> Vec<ResourceHistoryRecord> {
        self.manager.get_resource_history(
            &self.config.plan_version_id,
            self.simulation_id,
            self.config.history_duration_unit,
        )
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn manager(&self) -> &FactoryManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut FactoryManager {
        &mut self.manager
    }

    pub fn monitor(&self) -> &SimulationMonitor {
        &self.monitor
    }

    pub fn backward_result(&self) -> Option<&BackwardResult> {
        self.backward_result.as_ref()
    }
}
