//! 依主檔建立工廠

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDateTime;

use sim_core::{FactoryMaster, Item, Result, SimConfig, SimError};

use crate::factory::Factory;
use crate::inventory::Inventory;
use crate::node::{FactoryNode, Node};
use crate::process::{Process, ProcessResource, Resource};

/// 工廠建構器
///
/// 先建立所有據點，再以路由ID連接上下游，最後放入期初庫存與在製品。
pub struct FactoryBuilder<'a> {
    master: &'a FactoryMaster,
    config: &'a SimConfig,
    order_items: Vec<String>,
}

impl<'a> FactoryBuilder<'a> {
    pub fn new(master: &'a FactoryMaster, config: &'a SimConfig) -> Self {
        Self {
            master,
            config,
            order_items: Vec::new(),
        }
    }

    /// 建構器模式：設置工單成品（未設置時使用進入成品倉的物料）
    pub fn with_order_items<I>(mut self, order_items: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.order_items = order_items.into_iter().collect();
        self
    }

    pub fn build(&self, plan_start: NaiveDateTime) -> Result<Factory> {
        tracing::info!(
            "建立工廠 {}：倉庫 {} 個，製程 {} 個，路由連線 {} 條",
            self.master.factory.id,
            self.master.inventories.len(),
            self.master.processes.len(),
            self.master.routes.len()
        );

        let mut nodes = self.build_nodes()?;
        let mut factory = Factory::new(&self.master.factory);

        // 每個出現在路由中的據點一條路由，依首次出現順序
        for edge in &self.master.routes {
            for location_id in [&edge.from_location_id, &edge.to_location_id] {
                if factory.route_id(location_id).is_some() {
                    continue;
                }
                let node = nodes
                    .remove(location_id.as_str())
                    .ok_or_else(|| SimError::LocationNotFound(location_id.clone()))?;
                factory.add_route(node);
            }
        }
        for location_id in nodes.keys() {
            tracing::debug!("據點 {} 未出現在路由中", location_id);
        }

        self.wire(&mut factory)?;
        self.place_stock(&mut factory, plan_start);

        tracing::info!("工廠建立完成：路由 {} 條", factory.route_ids().len());
        Ok(factory)
    }

    fn build_nodes(&self) -> Result<HashMap<String, Node>> {
        let mut nodes = HashMap::new();

        for master in &self.master.inventories {
            nodes.insert(master.id.clone(), Node::Inventory(Inventory::from_master(master)));
        }

        for master in &self.master.processes {
            let mut process = Process::new(master.id.clone(), master.name.clone());
            for pr in self.master.resources_of(&master.id) {
                let resource = match self.master.resources.iter().find(|r| r.id == pr.resource_id) {
                    Some(resource) => Resource::from_master(resource),
                    None => {
                        tracing::warn!(
                            "{}:{} 沒有設備主檔，不套用停機時段",
                            pr.process_id,
                            pr.resource_id
                        );
                        Resource::new(pr.resource_id.clone(), pr.name.clone())
                    }
                };
                process.add_resource(ProcessResource::from_master(
                    pr,
                    resource,
                    self.config.default_queue_size,
                )?);
            }
            nodes.insert(master.id.clone(), Node::Process(process));
        }

        Ok(nodes)
    }

    /// 工單成品（排序去重）
    fn order_items(&self) -> Vec<String> {
        let items: BTreeSet<String> = if self.order_items.is_empty() {
            self.master
                .routes
                .iter()
                .filter(|edge| {
                    self.master
                        .inventory(&edge.to_location_id)
                        .is_some_and(|inv| {
                            inv.inventory_type == sim_core::InventoryType::FinishedGoods
                        })
                })
                .map(|edge| edge.to_item_id.clone())
                .collect()
        } else {
            self.order_items.iter().cloned().collect()
        };
        items.into_iter().collect()
    }

    /// 物料 → 以它為原料的最終成品
    fn end_items(&self) -> HashMap<String, Vec<String>> {
        let mut to_from_item: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.master.routes {
            if edge.from_item_id == edge.to_item_id {
                continue;
            }
            let sources = to_from_item.entry(edge.to_item_id.as_str()).or_default();
            if !sources.contains(&edge.from_item_id.as_str()) {
                sources.push(edge.from_item_id.as_str());
            }
        }

        let mut end_items: HashMap<String, Vec<String>> = HashMap::new();
        for order_item in self.order_items() {
            let mut visited: HashSet<&str> = HashSet::new();
            let mut stack = vec![order_item.as_str()];
            while let Some(item) = stack.pop() {
                if !visited.insert(item) {
                    continue;
                }
                end_items
                    .entry(item.to_string())
                    .or_default()
                    .push(order_item.clone());
                if let Some(sources) = to_from_item.get(item) {
                    stack.extend(sources.iter().copied());
                }
            }
        }
        end_items
    }

    fn wire(&self, factory: &mut Factory) -> Result<()> {
        let end_items = self.end_items();

        for edge in &self.master.routes {
            let from = factory
                .route_id(&edge.from_location_id)
                .ok_or_else(|| SimError::RouteNotFound(edge.from_location_id.clone()))?;
            let to = factory
                .route_id(&edge.to_location_id)
                .ok_or_else(|| SimError::RouteNotFound(edge.to_location_id.clone()))?;

            let route = factory
                .route_mut(from)
                .ok_or_else(|| SimError::RouteNotFound(edge.from_location_id.clone()))?;
            if from != to {
                route.add_next(to);
            }
            match end_items.get(&edge.to_item_id) {
                Some(ends) => {
                    for end_item in ends {
                        route.insert_next_attribute(&edge.from_item_id, end_item, to, edge.clone());
                    }
                }
                None => tracing::debug!(
                    "{}:{} → {}:{} 不屬於任何工單成品",
                    edge.from_location_id,
                    edge.from_item_id,
                    edge.to_location_id,
                    edge.to_item_id
                ),
            }

            let route = factory
                .route_mut(to)
                .ok_or_else(|| SimError::RouteNotFound(edge.to_location_id.clone()))?;
            if from != to {
                route.add_previous(from);
            }
            route.insert_previous_attribute(&edge.to_item_id, from, edge.clone());
        }
        Ok(())
    }

    fn place_stock(&self, factory: &mut Factory, plan_start: NaiveDateTime) {
        for record in &self.master.stock {
            let inventory = factory
                .node_mut(&record.location_id)
                .filter(|node| matches!(node, Node::Inventory(_)));
            match inventory {
                Some(node) => {
                    let item = Item::new(record.item_id.clone(), record.location_id.clone(), record.quantity);
                    if let Err(e) = node.put(0, plan_start, item, 0, &record.location_id) {
                        tracing::warn!("期初庫存 {}:{} 無法放入：{}", record.location_id, record.item_id, e);
                    }
                }
                None => tracing::warn!(
                    "期初庫存 {}:{} 不在任何倉庫路由上",
                    record.location_id,
                    record.item_id
                ),
            }
        }

        for wip in &self.master.wip {
            let known = factory
                .node(&wip.process_id)
                .and_then(Node::as_process)
                .is_some_and(|p| p.resource(&wip.resource_id).is_some());
            if !known {
                tracing::warn!(
                    "期初在製品 {}:{} 找不到設備",
                    wip.process_id,
                    wip.resource_id
                );
                continue;
            }
            if let Some(node) = factory.node_mut(&wip.process_id) {
                node.restock(Item::new(wip.item_id.clone(), wip.resource_id.clone(), wip.quantity));
            }
        }
    }
}
