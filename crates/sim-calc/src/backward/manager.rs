//! 逆推計劃管理器

use std::collections::HashMap;

use rust_decimal::Decimal;
use sim_core::{FactoryMaster, Result, SimConfig, SimError, StockRecord, WorkOrder};

use crate::backward::{BackwardWorkOrder, ChainStep, PegResults, RouteChain, StepPlanMultimap};
use crate::lead_time::TimeTables;
use crate::pegging::PegAvailability;
use crate::{BackwardResult, InputPlanner, PlanWarning};

/// 逆推計劃管理器
pub struct BackwardManager {
    work_orders: Vec<WorkOrder>,
    finished_location_ids: Vec<String>,
    route_chain: RouteChain,
    stock: Vec<StockRecord>,
    time_tables: TimeTables,
    config: SimConfig,
}

impl BackwardManager {
    /// 創建逆推計劃管理器
    ///
    /// 工單依 (優先級, 明細優先級) 穩定排序。
    pub fn new(
        master: &FactoryMaster,
        mut work_orders: Vec<WorkOrder>,
        time_tables: TimeTables,
        config: SimConfig,
    ) -> Self {
        work_orders.sort_by_key(WorkOrder::sort_key);

        let finished_location_ids = master
            .finished_goods_inventories()
            .into_iter()
            .map(|inv| inv.id.clone())
            .collect();

        let stock = master
            .stock
            .iter()
            .cloned()
            .chain(master.wip.iter().map(|wip| wip.to_stock_record()))
            .collect();

        Self {
            work_orders,
            finished_location_ids,
            route_chain: RouteChain::from_routes(&master.routes),
            stock,
            time_tables,
            config,
        }
    }

    /// 排序後的工單
    pub fn work_orders(&self) -> &[WorkOrder] {
        &self.work_orders
    }

    /// 唯一的成品倉
    pub fn finished_location_id(&self) -> Result<&str> {
        match self.finished_location_ids.as_slice() {
            [] => Err(SimError::MissingFinishedGoods),
            [only] => Ok(only.as_str()),
            many => Err(SimError::AmbiguousFinishedGoods(many.join(", "))),
        }
    }

    /// 執行逆推計劃
    pub fn run(&self, planner: &dyn InputPlanner) -> Result<BackwardResult> {
        tracing::info!("開始逆推計劃：工單 {} 筆", self.work_orders.len());
        let start_time = std::time::Instant::now();

        let finished_location_id = self.finished_location_id()?;

        // 每種成品只展開一次路由鏈
        let mut chains: HashMap<&str, Vec<ChainStep>> = HashMap::new();
        for wo in &self.work_orders {
            if !chains.contains_key(wo.order_item_id.as_str()) {
                let chain = self
                    .route_chain
                    .chain_for(finished_location_id, &wo.order_item_id)?;
                chains.insert(&wo.order_item_id, chain);
            }
        }

        let mut result = BackwardResult::empty();
        let mut availability = PegAvailability::from_records(self.stock.iter().cloned());
        let mut plans_by_location = StepPlanMultimap::new();
        let mut peg_results = PegResults::new();

        for wo in &self.work_orders {
            let chain = chains
                .get(wo.order_item_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if chain.is_empty() {
                result.add_warning(PlanWarning::warning(
                    wo.id.clone(),
                    format!("成品 {} 在 {} 沒有路由鏈", wo.order_item_id, finished_location_id),
                ));
            }

            let plans = BackwardWorkOrder::new(
                wo,
                finished_location_id,
                chain,
                &self.time_tables,
                &self.config,
            )
            .process(planner, &mut availability, &mut plans_by_location, &mut peg_results)?;

            if let Some(last) = plans.last() {
                if last.required_quantity > Decimal::ZERO {
                    tracing::debug!(
                        "工單 {} 展開至 {} 仍缺 {}",
                        wo.id,
                        last.location_id,
                        last.required_quantity
                    );
                }
            }
            result.plans.push(plans);
        }

        result.plans_by_location = plans_by_location;
        result.peg_results = peg_results;

        let elapsed = start_time.elapsed();
        result.calculation_time_ms = Some(elapsed.as_millis());

        tracing::info!(
            "逆推計劃完成：步驟計劃 {} 筆，Pegging {}，耗時 {:?}",
            result.plan_count(),
            result.peg_results.total_pegged(),
            elapsed
        );

        Ok(result)
    }
}
