//! # Simulation Engine
//!
//! 工廠正向模擬：據點、路由圖與逐 tick 的物料流動

pub mod builder;
pub mod context;
pub mod factory;
pub mod inventory;
pub mod manager;
pub mod monitor;
pub mod node;
pub mod process;
pub mod route;
pub mod runtime;
pub mod stock;

// Re-export 主要類型
pub use builder::FactoryBuilder;
pub use context::SimulationContext;
pub use factory::{Factory, TimeConstraint};
pub use inventory::Inventory;
pub use manager::FactoryManager;
pub use monitor::{SimulationMonitor, TickSnapshot};
pub use node::{FactoryNode, Node, PutOutcome};
pub use process::{
    Lot, LotStatus, Process, ProcessLot, ProcessQueue, ProcessResource, Resource, ResourceStatus,
};
pub use route::{Route, RouteArena, RouteId};
pub use runtime::Runtime;
