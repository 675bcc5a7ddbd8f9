//! 工廠：據點路由的擁有者

use std::collections::HashMap;

use rust_decimal::Decimal;

use sim_calc::InputPlanner;
use sim_core::{
    BlackoutWindow, FactoryInfo, OffDayType, Result, ScheduleConstraint, SimError, Tick,
};

use crate::node::{FactoryNode, Node};
use crate::route::{Route, RouteArena, RouteId};

/// 該 tick 不可生產的原因
#[derive(Debug, Clone, PartialEq)]
pub enum TimeConstraint {
    /// 休息日
    OffDay(Option<OffDayType>),
    /// 工廠停機時段
    Blackout(BlackoutWindow),
}

/// 工廠
#[derive(Debug, Clone)]
pub struct Factory {
    pub id: String,
    pub name: String,
    constraint: ScheduleConstraint,
    routes: RouteArena,
    route_ids: HashMap<String, RouteId>,
    /// 路由建立順序
    order: Vec<RouteId>,
}

impl Factory {
    pub fn new(info: &FactoryInfo) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            constraint: info.constraint.clone(),
            routes: RouteArena::with_key(),
            route_ids: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// 加入據點路由（同一據點只建立一次）
    pub fn add_route(&mut self, node: Node) -> RouteId {
        if let Some(id) = self.route_ids.get(node.id()) {
            return *id;
        }
        let location_id = node.id().to_string();
        let id = self.routes.insert(Route::new(node));
        self.route_ids.insert(location_id, id);
        self.order.push(id);
        id
    }

    pub fn route_id(&self, location_id: &str) -> Option<RouteId> {
        self.route_ids.get(location_id).copied()
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn route_mut(&mut self, id: RouteId) -> Option<&mut Route> {
        self.routes.get_mut(id)
    }

    /// 依建立順序的路由ID
    pub fn route_ids(&self) -> &[RouteId] {
        &self.order
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.order.iter().filter_map(|id| self.routes.get(*id))
    }

    pub(crate) fn arena_mut(&mut self) -> &mut RouteArena {
        &mut self.routes
    }

    pub fn node(&self, location_id: &str) -> Option<&Node> {
        self.route_id(location_id)
            .and_then(|id| self.routes.get(id))
            .map(Route::node)
    }

    pub fn node_mut(&mut self, location_id: &str) -> Option<&mut Node> {
        let id = self.route_id(location_id)?;
        self.routes.get_mut(id).map(Route::node_mut)
    }

    pub fn constraint(&self) -> &ScheduleConstraint {
        &self.constraint
    }

    /// 休息日優先，其次為工廠停機時段
    pub fn time_constraint(&self, tick: &Tick) -> Option<TimeConstraint> {
        if tick.is_off_day {
            return Some(TimeConstraint::OffDay(tick.off_day_type));
        }
        self.constraint
            .check(tick.date)
            .map(|window| TimeConstraint::Blackout(window.clone()))
    }
}

impl InputPlanner for Factory {
    fn plan_input_quantity(
        &self,
        location_id: &str,
        quantity: Decimal,
        item_id: &str,
    ) -> Result<Vec<(String, Decimal)>> {
        self.node(location_id)
            .ok_or_else(|| SimError::LocationNotFound(location_id.to_string()))?
            .plan_input_quantity(quantity, item_id)
    }
}
