//! 路由：據點與上下游的連線，以及工單步驟計劃的搬送

use std::collections::HashMap;

use rust_decimal::Decimal;
use slotmap::SlotMap;

use sim_core::{
    BackwardStepPlan, Item, LocationType, NextRoutePolicy, Result, RouteAttribute, SimError, Tick,
};

use crate::node::{FactoryNode, Node, PutOutcome};

slotmap::new_key_type! {
    /// 路由在工廠中的穩定索引
    pub struct RouteId;
}

/// 路由集合
pub type RouteArena = SlotMap<RouteId, Route>;

/// 一個據點的路由
#[derive(Debug, Clone)]
pub struct Route {
    node: Node,

    previous: Vec<RouteId>,
    next: Vec<RouteId>,

    /// (目前物料, 最終成品, 下游路由) → 連線
    next_attributes: HashMap<(String, String, RouteId), Vec<RouteAttribute>>,

    /// (本據點物料, 上游路由) → 連線
    previous_attributes: HashMap<(String, RouteId), RouteAttribute>,

    order_items: Vec<BackwardStepPlan>,
    finished: Vec<BackwardStepPlan>,
    shipped: Vec<Item>,
}

impl Route {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            previous: Vec::new(),
            next: Vec::new(),
            next_attributes: HashMap::new(),
            previous_attributes: HashMap::new(),
            order_items: Vec::new(),
            finished: Vec::new(),
            shipped: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.node.id()
    }

    pub fn location_type(&self) -> LocationType {
        self.node.location_type()
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    pub fn previous(&self) -> &[RouteId] {
        &self.previous
    }

    pub fn next(&self) -> &[RouteId] {
        &self.next
    }

    pub fn add_previous(&mut self, id: RouteId) {
        if !self.previous.contains(&id) {
            self.previous.push(id);
        }
    }

    pub fn add_next(&mut self, id: RouteId) {
        if !self.next.contains(&id) {
            self.next.push(id);
        }
    }

    pub fn insert_next_attribute(
        &mut self,
        item_id: &str,
        end_item_id: &str,
        next: RouteId,
        attribute: RouteAttribute,
    ) {
        let edges = self
            .next_attributes
            .entry((item_id.to_string(), end_item_id.to_string(), next))
            .or_default();
        if !edges.contains(&attribute) {
            edges.push(attribute);
        }
    }

    pub fn insert_previous_attribute(&mut self, item_id: &str, previous: RouteId, attribute: RouteAttribute) {
        self.previous_attributes
            .insert((item_id.to_string(), previous), attribute);
    }

    pub fn previous_attribute(&self, item_id: &str, previous: RouteId) -> Option<&RouteAttribute> {
        self.previous_attributes.get(&(item_id.to_string(), previous))
    }

    /// 解析搬送到下游路由的連線
    ///
    /// 多條連線時只保留目的物料為最終成品者，仍不唯一則無法解析。
    pub fn next_attribute(&self, item_id: &str, order_item_id: &str, next: RouteId) -> Option<&RouteAttribute> {
        let edges = self
            .next_attributes
            .get(&(item_id.to_string(), order_item_id.to_string(), next))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        match edges {
            [] => {
                tracing::error!(
                    "[{}] {}:{} 找不到下游連線",
                    self.id(),
                    item_id,
                    order_item_id
                );
                None
            }
            [only] => Some(only),
            many => {
                let mut matched = many.iter().filter(|a| a.to_item_id == order_item_id);
                match (matched.next(), matched.next()) {
                    (Some(only), None) => Some(only),
                    _ => {
                        tracing::error!(
                            "[{}] {}:{} 下游連線不唯一（{} 條）",
                            self.id(),
                            item_id,
                            order_item_id,
                            many.len()
                        );
                        None
                    }
                }
            }
        }
    }

    /// 指派步驟計劃
    pub fn set_order_items(&mut self, plans: Vec<BackwardStepPlan>) {
        self.order_items = plans;
    }

    pub fn order_items(&self) -> &[BackwardStepPlan] {
        &self.order_items
    }

    pub fn finished(&self) -> &[BackwardStepPlan] {
        &self.finished
    }

    pub fn shipped(&self) -> &[Item] {
        &self.shipped
    }

    pub fn shipped_quantity(&self) -> Decimal {
        self.shipped.iter().map(|i| i.quantity).sum()
    }

    pub fn is_starting(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.next.is_empty()
    }

    /// 下游候選路由與連線，依規則排序
    fn candidates(
        &self,
        self_id: RouteId,
        plan: &BackwardStepPlan,
        policy: NextRoutePolicy,
    ) -> Vec<(RouteId, RouteAttribute)> {
        let mut candidates: Vec<(RouteId, RouteAttribute)> = self
            .next
            .iter()
            .filter(|next| **next != self_id)
            .filter_map(|next| {
                self.next_attribute(&plan.item_id, &plan.order_item_id, *next)
                    .map(|attribute| (*next, attribute.clone()))
            })
            .collect();

        if policy == NextRoutePolicy::AttributePriority {
            candidates.sort_by_key(|(_, attribute)| attribute.priority);
        }
        candidates
    }

    /// 出貨：整批取出步驟計劃的數量
    fn ship(&mut self, tick: &Tick, plan: &BackwardStepPlan) -> bool {
        if self.node.get_items(&plan.item_id, &plan.work_order_id).is_empty() {
            return false;
        }

        let fetch_quantity = plan.fetch_quantity();
        let items = self
            .node
            .fetch(tick.index, tick.date, &plan.item_id, &plan.work_order_id, fetch_quantity);
        let fetched: Decimal = items.iter().map(|i| i.quantity).sum();

        if fetched == fetch_quantity {
            tracing::info!(
                "[{}] 出貨 {}:{} 數量 {}",
                self.id(),
                plan.work_order_id,
                plan.item_id,
                fetched
            );
            self.shipped.extend(items);
            true
        } else {
            for item in items {
                self.node.restock(item);
            }
            false
        }
    }
}

fn route<'a>(arena: &'a RouteArena, id: RouteId) -> Result<&'a Route> {
    arena
        .get(id)
        .ok_or_else(|| SimError::RouteNotFound(format!("{:?}", id)))
}

fn route_mut<'a>(arena: &'a mut RouteArena, id: RouteId) -> Result<&'a mut Route> {
    arena
        .get_mut(id)
        .ok_or_else(|| SimError::RouteNotFound(format!("{:?}", id)))
}

/// 搬送路由上的步驟計劃（LPST 早者優先）
///
/// 計劃的數量全部送出才算完成；未完成者留在路由上等下一個 tick。
pub fn transfer(arena: &mut RouteArena, id: RouteId, tick: &Tick, policy: NextRoutePolicy) -> Result<()> {
    let mut plans = std::mem::take(&mut route_mut(arena, id)?.order_items);
    plans.sort_by_key(|plan| (plan.lpst.is_none(), plan.lpst));

    let mut open = Vec::with_capacity(plans.len());
    let mut finished = Vec::new();
    let mut failure = None;

    for plan in plans {
        if failure.is_some() {
            open.push(plan);
            continue;
        }
        match transfer_plan(arena, id, &plan, tick, policy) {
            Ok(true) => finished.push(plan),
            Ok(false) => open.push(plan),
            Err(e) => {
                open.push(plan);
                failure = Some(e);
            }
        }
    }

    let route = route_mut(arena, id)?;
    route.order_items = open;
    route.finished.extend(finished);

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// 搬送單一步驟計劃，回傳是否完成
fn transfer_plan(
    arena: &mut RouteArena,
    id: RouteId,
    plan: &BackwardStepPlan,
    tick: &Tick,
    policy: NextRoutePolicy,
) -> Result<bool> {
    let current = route(arena, id)?;
    if current.is_terminal() {
        return Ok(route_mut(arena, id)?.ship(tick, plan));
    }
    if current.node.get_items(&plan.item_id, &plan.work_order_id).is_empty() {
        return Ok(false);
    }

    let fetch_quantity = plan.fetch_quantity();
    let candidates = current.candidates(id, plan, policy);
    let mut fetched = Decimal::ZERO;

    for (next_id, attribute) in candidates {
        let Some(target_id) = route(arena, next_id)?.node.check_available(
            tick.date,
            &attribute.to_item_id,
            fetch_quantity,
            attribute.move_time,
            &plan.to_location_id,
        ) else {
            continue;
        };

        let [current, next] = arena
            .get_disjoint_mut([id, next_id])
            .ok_or_else(|| SimError::RouteNotFound(format!("{:?}", next_id)))?;

        let items = current
            .node
            .fetch(tick.index, tick.date, &plan.item_id, &plan.work_order_id, fetch_quantity);
        if items.is_empty() {
            continue;
        }
        let quantity: Decimal = items.iter().map(|i| i.quantity).sum();

        let Some(mut item) = Item::merged(tick.index, tick.date, current.id(), plan, items) else {
            continue;
        };
        let origin = (item.item_id.clone(), item.location_id.clone());
        item.item_id = attribute.to_item_id.clone();

        match next
            .node
            .put(tick.index, tick.date, item, attribute.move_time, &target_id)?
        {
            PutOutcome::Accepted => {
                tracing::debug!(
                    "[{}] {}:{} 送往 {}（{}），數量 {}",
                    current.id(),
                    plan.work_order_id,
                    plan.item_id,
                    next.id(),
                    target_id,
                    quantity
                );
                current
                    .node
                    .mark_next_location(&plan.item_id, &plan.work_order_id, next.id());
                fetched = quantity;
                break;
            }
            PutOutcome::Rejected(mut item) => {
                tracing::debug!(
                    "[{}] {} 拒收 {}:{}，退回原據點",
                    next.id(),
                    target_id,
                    plan.work_order_id,
                    plan.item_id
                );
                (item.item_id, item.location_id) = origin;
                current.node.restock(item);
            }
        }
    }

    Ok(fetched == fetch_quantity)
}
