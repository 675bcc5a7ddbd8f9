//! 路由鏈：(下游據點, 物料) → (上游據點, 物料)

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use sim_core::{Result, RouteAttribute, SimError};

/// 路由鏈上的一個步驟
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainStep {
    pub location_id: String,
    pub item_id: String,
}

impl ChainStep {
    pub fn new(location_id: &str, item_id: &str) -> Self {
        Self {
            location_id: location_id.to_string(),
            item_id: item_id.to_string(),
        }
    }
}

/// 逆向路由鏈查詢表
#[derive(Debug, Clone, Default)]
pub struct RouteChain {
    predecessors: HashMap<ChainStep, ChainStep>,
}

impl RouteChain {
    /// 從路由連線建立（同一下游鍵以第一條連線為準）
    pub fn from_routes(routes: &[RouteAttribute]) -> Self {
        let mut predecessors = HashMap::new();
        for edge in routes {
            predecessors
                .entry(ChainStep::new(&edge.to_location_id, &edge.to_item_id))
                .or_insert_with(|| ChainStep::new(&edge.from_location_id, &edge.from_item_id));
        }
        Self { predecessors }
    }

    /// 直接上游
    pub fn predecessor(&self, location_id: &str, item_id: &str) -> Option<&ChainStep> {
        self.predecessors.get(&ChainStep::new(location_id, item_id))
    }

    /// 從成品倉的成品往上游展開（不含起點）
    ///
    /// 回到已走過的步驟時回傳 `RouteCycle`。
    pub fn chain_for(&self, end_location_id: &str, order_item_id: &str) -> Result<Vec<ChainStep>> {
        let start = ChainStep::new(end_location_id, order_item_id);
        let mut visited: HashSet<&ChainStep> = HashSet::new();
        visited.insert(&start);

        let mut steps = Vec::new();
        let mut current = &start;
        while let Some(previous) = self.predecessors.get(current) {
            if !visited.insert(previous) {
                return Err(SimError::RouteCycle(format!(
                    "{}:{} 經由 {}:{}",
                    order_item_id, end_location_id, previous.location_id, previous.item_id
                )));
            }
            steps.push(previous.clone());
            current = previous;
        }

        Ok(steps)
    }

    pub fn len(&self) -> usize {
        self.predecessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predecessors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::LocationType::{Inventory, Process};

    fn edge(from_item: &str, to_item: &str, from: &str, to: &str) -> RouteAttribute {
        let from_type = if from.ends_with("INV") || from == "FGI" { Inventory } else { Process };
        let to_type = if to.ends_with("INV") || to == "FGI" { Inventory } else { Process };
        RouteAttribute::new(
            from_item.to_string(),
            to_item.to_string(),
            from.to_string(),
            to.to_string(),
            from_type,
            to_type,
        )
    }

    fn line() -> Vec<RouteAttribute> {
        vec![
            edge("RM", "RM", "RMINV", "REACTOR"),
            edge("RM", "SEMI", "REACTOR", "IPINV"),
            edge("SEMI", "SEMI", "IPINV", "PACK"),
            edge("SEMI", "FG", "PACK", "FGI"),
        ]
    }

    #[test]
    fn test_chain_walks_to_raw_material() {
        let chain = RouteChain::from_routes(&line());
        let steps = chain.chain_for("FGI", "FG").unwrap();

        assert_eq!(
            steps,
            vec![
                ChainStep::new("PACK", "SEMI"),
                ChainStep::new("IPINV", "SEMI"),
                ChainStep::new("REACTOR", "RM"),
                ChainStep::new("RMINV", "RM"),
            ]
        );
    }

    #[test]
    fn test_first_edge_wins() {
        let mut routes = line();
        routes.push(edge("OTHER", "FG", "PACK2", "FGI"));

        let chain = RouteChain::from_routes(&routes);
        assert_eq!(chain.predecessor("FGI", "FG"), Some(&ChainStep::new("PACK", "SEMI")));
    }

    #[test]
    fn test_missing_chain_is_empty() {
        let chain = RouteChain::from_routes(&line());
        assert!(chain.chain_for("FGI", "UNKNOWN").unwrap().is_empty());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let routes = vec![
            edge("A", "B", "P1", "FGI"),
            edge("B", "A", "FGI", "P1"),
        ];
        let chain = RouteChain::from_routes(&routes);

        assert!(matches!(chain.chain_for("FGI", "B"), Err(SimError::RouteCycle(_))));
    }
}
