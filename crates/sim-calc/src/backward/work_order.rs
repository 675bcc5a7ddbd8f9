//! 單一工單逆推展開

use rust_decimal::Decimal;

use sim_core::{BackwardStepPlan, Result, SimConfig, WorkOrder};

use crate::backward::{ChainStep, PegResults, StepPlanMultimap};
use crate::lead_time::{LeadTimeCalculator, TimeTables};
use crate::pegging::{PegAvailability, PegContext, PeggingCalculator};
use crate::InputPlanner;

/// 單一工單的逆推展開
pub struct BackwardWorkOrder<'a> {
    work_order: &'a WorkOrder,
    finished_location_id: &'a str,
    chain: &'a [ChainStep],
    time_tables: &'a TimeTables,
    config: &'a SimConfig,
}

impl<'a> BackwardWorkOrder<'a> {
    pub fn new(
        work_order: &'a WorkOrder,
        finished_location_id: &'a str,
        chain: &'a [ChainStep],
        time_tables: &'a TimeTables,
        config: &'a SimConfig,
    ) -> Self {
        Self {
            work_order,
            finished_location_id,
            chain,
            time_tables,
            config,
        }
    }

    fn plan_at(&self, step: u32, location: &ChainStep) -> BackwardStepPlan {
        BackwardStepPlan::new(
            self.work_order.id.clone(),
            self.work_order.order_item_id.clone(),
            self.work_order.order_quantity,
            step,
            location.item_id.clone(),
            location.location_id.clone(),
        )
        .with_priority(self.work_order.priority)
    }

    fn peg(
        &self,
        location: &ChainStep,
        plan: &mut BackwardStepPlan,
        availability: &mut PegAvailability,
        peg_results: &mut PegResults,
    ) {
        let ctx = PegContext {
            work_order_id: &self.work_order.id,
            order_item_id: &self.work_order.order_item_id,
            order_quantity: self.work_order.order_quantity,
            lpst: plan.lpst,
        };
        let outcome = PeggingCalculator::peg(
            availability,
            &location.location_id,
            &location.item_id,
            plan.required_quantity,
            &ctx,
            self.config.quantity_precision,
        );
        plan.peg(outcome.pegged, self.config.quantity_precision);
        peg_results.extend(outcome.records);
    }

    /// 展開工單，回傳依步驟排列的計劃
    ///
    /// 每一步先由下游據點分割需求量，逐筆往前推算 LPST，僅最後一筆子計劃做 Pegging。
    pub fn process(
        &self,
        planner: &dyn InputPlanner,
        availability: &mut PegAvailability,
        plans_by_location: &mut StepPlanMultimap,
        peg_results: &mut PegResults,
    ) -> Result<Vec<BackwardStepPlan>> {
        let due_date = self.work_order.due_date;
        let mut lpst = due_date;
        let mut step = 1;

        let finished = ChainStep::new(self.finished_location_id, &self.work_order.order_item_id);
        let mut init_plan = self
            .plan_at(step, &finished)
            .with_required_quantity(self.work_order.order_quantity)
            .with_dates(due_date, lpst);
        self.peg(&finished, &mut init_plan, availability, peg_results);

        let mut required = init_plan.required_quantity;
        let mut plans = vec![init_plan];

        let mut next = &finished;
        for current in self.chain {
            if required <= Decimal::ZERO {
                break;
            }
            step += 1;

            let times = self
                .time_tables
                .step_times(&current.location_id, &next.location_id);
            let inputs = planner.plan_input_quantity(&next.location_id, required, &next.item_id)?;

            let mut step_plans = Vec::with_capacity(inputs.len());
            for (target_id, quantity) in inputs {
                lpst = LeadTimeCalculator::lpst(lpst, quantity, &times, self.config.time_unit);
                step_plans.push(
                    self.plan_at(step, current)
                        .with_to_location(target_id)
                        .with_required_quantity(quantity)
                        .with_dates(due_date, lpst),
                );
            }

            if let Some(last) = step_plans.last_mut() {
                self.peg(current, last, availability, peg_results);
            }

            required = step_plans.iter().map(|p| p.required_quantity).sum();
            tracing::debug!(
                "工單 {} 步驟 {} @ {}:{} - 子計劃 {} 筆，剩餘需求 {}",
                self.work_order.id,
                step,
                current.location_id,
                current.item_id,
                step_plans.len(),
                required
            );

            plans.extend(step_plans);
            next = current;
        }

        for plan in &plans {
            plans_by_location.push(plan.clone());
        }

        Ok(plans)
    }
}
