//! 工廠管理器：路由圖的逐 tick 推進

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use sim_calc::{PegResults, StepPlanMultimap};
use sim_core::{
    BackwardStepPlan, Item, NextRoutePolicy, PegRecord, ResourceHistoryRecord, Result, SimError,
    Tick, TimeUnit, WorkOrder,
};

use crate::factory::Factory;
use crate::node::{FactoryNode, Node};
use crate::process::ResourceStatus;
use crate::route::{self, RouteId};

/// 工廠管理器
///
/// 擁有工廠並維護由路由圖推導出的索引。
#[derive(Debug, Clone)]
pub struct FactoryManager {
    factory: Factory,
    policy: NextRoutePolicy,

    starting_routes: Vec<RouteId>,
    terminal_routes: Vec<RouteId>,

    /// 由出貨端往上游的廣度優先順序
    propagation_order: Vec<RouteId>,

    /// 工單交期（步驟計劃未帶交期時補上）
    due_dates: HashMap<String, NaiveDateTime>,
}

impl FactoryManager {
    pub fn new(factory: Factory, work_orders: &[WorkOrder], policy: NextRoutePolicy) -> Self {
        let routes: Vec<(RouteId, bool, bool)> = factory
            .route_ids()
            .iter()
            .filter_map(|id| factory.route(*id).map(|r| (*id, r.is_starting(), r.is_terminal())))
            .collect();

        let starting_routes = routes.iter().filter(|r| r.1).map(|r| r.0).collect();
        let terminal_routes: Vec<RouteId> = routes.iter().filter(|r| r.2).map(|r| r.0).collect();
        let propagation_order = Self::build_propagation_order(&factory, &terminal_routes);

        let due_dates = work_orders
            .iter()
            .map(|wo| (wo.id.clone(), wo.due_date))
            .collect();

        Self {
            factory,
            policy,
            starting_routes,
            terminal_routes,
            propagation_order,
            due_dates,
        }
    }

    /// 從出貨端沿上游路由廣度優先展開，每條路由只出現一次
    fn build_propagation_order(factory: &Factory, terminal_routes: &[RouteId]) -> Vec<RouteId> {
        let mut visited: HashSet<RouteId> = HashSet::new();
        let mut order = Vec::with_capacity(factory.route_ids().len());
        let mut frontier: VecDeque<RouteId> = terminal_routes.iter().copied().collect();

        while let Some(id) = frontier.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            order.push(id);
            if let Some(route) = factory.route(id) {
                frontier.extend(route.previous().iter().filter(|p| !visited.contains(*p)));
            }
        }

        // 無法從出貨端到達的路由（如循環）排在最後
        for id in factory.route_ids() {
            if !visited.contains(id) {
                tracing::warn!(
                    "路由 {} 無法從出貨端到達",
                    factory.route(*id).map(|r| r.id()).unwrap_or_default()
                );
                visited.insert(*id);
                order.push(*id);
            }
        }
        order
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut Factory {
        &mut self.factory
    }

    pub fn starting_routes(&self) -> &[RouteId] {
        &self.starting_routes
    }

    pub fn terminal_routes(&self) -> &[RouteId] {
        &self.terminal_routes
    }

    pub fn propagation_order(&self) -> &[RouteId] {
        &self.propagation_order
    }

    pub fn previous_routes(&self, id: RouteId) -> &[RouteId] {
        self.factory.route(id).map(|r| r.previous()).unwrap_or(&[])
    }

    /// 所有據點經過一個 tick
    pub fn run(&mut self, tick: &Tick) {
        let constraint = self.factory.time_constraint(tick);
        for id in &self.propagation_order {
            if let Some(route) = self.factory.route_mut(*id) {
                route.node_mut().run(tick, constraint.as_ref());
            }
        }
    }

    /// 所有路由搬送步驟計劃；休息日不搬送
    pub fn transfer(&mut self, tick: &Tick) -> Result<()> {
        if tick.is_off_day {
            return Ok(());
        }
        let arena = self.factory.arena_mut();
        for id in &self.propagation_order {
            route::transfer(arena, *id, tick, self.policy)?;
        }
        Ok(())
    }

    /// 指派逆推步驟計劃到各路由，並在起始路由投入所需物料
    pub fn set_backward_step_plan(
        &mut self,
        mut plans_by_location: StepPlanMultimap,
        plan_start: NaiveDateTime,
    ) -> Result<()> {
        let starting: HashSet<RouteId> = self.starting_routes.iter().copied().collect();

        for id in self.factory.route_ids().to_vec() {
            let route = self
                .factory
                .route_mut(id)
                .ok_or_else(|| SimError::RouteNotFound(format!("{:?}", id)))?;
            let location_id = route.id().to_string();
            let plans = plans_by_location.take(&location_id);

            if starting.contains(&id) {
                for plan in plans.iter().filter(|p| p.required_quantity > Decimal::ZERO) {
                    let mut item = Item::from_plan(plan, plan.required_quantity);
                    if item.due_date.is_none() {
                        item.due_date = self.due_dates.get(&plan.work_order_id).copied();
                    }
                    route.node_mut().put(0, plan_start, item, 0, &location_id)?;
                }
            }

            tracing::debug!("路由 {} 指派步驟計劃 {} 筆", location_id, plans.len());
            route.set_order_items(plans);
        }

        for location_id in plans_by_location.locations() {
            tracing::warn!("步驟計劃的據點 {} 沒有路由", location_id);
        }
        Ok(())
    }

    /// 將 Pegging 結果套用到各據點的庫存與在製品
    pub fn set_backward_peg_item(&mut self, peg_results: &PegResults, plan_start: NaiveDateTime) {
        for location_id in peg_results.locations() {
            let records: Vec<PegRecord> = peg_results
                .by_location(location_id)
                .into_iter()
                .cloned()
                .collect();
            match self.factory.node_mut(location_id) {
                Some(node) => node.set_backward_peg_items(0, plan_start, &records),
                None => tracing::warn!("Pegging 據點 {} 沒有路由", location_id),
            }
        }
    }

    /// 所有設備的作業履歷
    pub fn get_resource_history(
        &self,
        plan_version_id: &str,
        simulation_id: Uuid,
        duration_unit: TimeUnit,
    ) -> Vec<ResourceHistoryRecord> {
        self.factory
            .routes()
            .filter_map(|r| r.node().as_process())
            .flat_map(|p| p.history())
            .map(|row| row.to_record(plan_version_id, simulation_id, duration_unit))
            .collect()
    }

    /// 出貨總量
    pub fn shipped_quantity(&self) -> Decimal {
        self.terminal_routes
            .iter()
            .filter_map(|id| self.factory.route(*id))
            .map(|r| r.shipped_quantity())
            .sum()
    }

    /// 尚未完成的步驟計劃
    pub fn open_plans(&self) -> Vec<&BackwardStepPlan> {
        self.factory.routes().flat_map(|r| r.order_items()).collect()
    }

    pub fn finished_plan_count(&self) -> usize {
        self.factory.routes().map(|r| r.finished().len()).sum()
    }

    /// 各狀態的設備數
    pub fn resource_status_counts(&self) -> HashMap<ResourceStatus, usize> {
        let mut counts = HashMap::new();
        for process in self.factory.routes().filter_map(|r| r.node().as_process()) {
            for resource in process.resources() {
                *counts.entry(resource.status()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// 全廠共同可接受的批量範圍：(最小批量中的最大值, 最大批量中的最小值)
    pub fn entire_lot_size(&self) -> (Decimal, Option<Decimal>) {
        let policies: Vec<_> = self
            .factory
            .routes()
            .filter_map(|r| match r.node() {
                Node::Process(process) => Some(process),
                Node::Inventory(_) => None,
            })
            .flat_map(|p| p.resources().iter().map(|r| &r.lot_size))
            .collect();

        let entire_min = policies
            .iter()
            .map(|p| p.min_lot_size)
            .max()
            .unwrap_or(Decimal::ZERO);
        let entire_max = policies.iter().filter_map(|p| p.max_lot_size).min();
        (entire_min, entire_max)
    }
}
