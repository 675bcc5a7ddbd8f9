//! # Factory Sim
//!
//! 工廠生產模擬：逆推計劃（Pegging / LPST）加上逐 tick 的正向模擬
//!
//! ```no_run
//! use factory_sim::prelude::*;
//!
//! # fn demo(master: FactoryMaster, work_orders: Vec<WorkOrder>, calendar: FactoryCalendar) -> factory_sim::Result<()> {
//! let context = factory_sim::simulate(SimConfig::default(), &master, work_orders, &calendar)?;
//! println!("出貨 {}", context.manager().shipped_quantity());
//! # Ok(())
//! # }
//! ```

pub use sim_calc;
pub use sim_core;
pub use sim_engine;

pub use sim_core::{Result, SimError};

/// 常用類型
pub mod prelude {
    pub use sim_calc::{BackwardManager, BackwardResult, InputPlanner, LotSizePolicy, TimeTables};
    pub use sim_core::{
        BackwardStepPlan, BlackoutWindow, FactoryCalendar, FactoryInfo, FactoryMaster, InventoryMaster,
        InventoryType, Item, LocationType, NextRoutePolicy, PegRecord, ProcessMaster,
        ProcessResourceMaster, ResourceHistoryRecord, ResourceMaster, RouteAttribute, SimConfig,
        StockRecord, Tick, TimeUnit, WipRecord, WorkOrder,
    };
    pub use sim_engine::{
        Factory, FactoryBuilder, FactoryManager, FactoryNode, Node, PutOutcome, SimulationContext,
        SimulationMonitor, TickSnapshot,
    };
}

use sim_core::{FactoryCalendar, FactoryMaster, SimConfig, WorkOrder};
use sim_engine::SimulationContext;

/// 一次跑完：建立工廠、逆推計劃、依日曆模擬
pub fn simulate(
    config: SimConfig,
    master: &FactoryMaster,
    work_orders: Vec<WorkOrder>,
    calendar: &FactoryCalendar,
) -> Result<SimulationContext> {
    let mut context = SimulationContext::init(config, master, work_orders, calendar.start)?;

    let result = context.backward_plan()?;
    tracing::info!(
        "逆推完成：{} 張工單，Pegging 數量 {}",
        result.plans.len(),
        result.peg_results.total_pegged()
    );

    context.simulate(calendar.scheduler())?;
    Ok(context)
}
