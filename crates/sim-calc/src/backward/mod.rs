//! 逆推計劃（由成品倉往原料倉展開工單）

mod chain;
mod manager;
mod work_order;

pub use chain::{ChainStep, RouteChain};
pub use manager::BackwardManager;
pub use work_order::BackwardWorkOrder;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sim_core::{BackwardStepPlan, PegRecord};

/// 依據點分組的步驟計劃
#[derive(Debug, Clone, Default)]
pub struct StepPlanMultimap {
    plans: BTreeMap<String, Vec<BackwardStepPlan>>,
}

impl StepPlanMultimap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一筆計劃到其所在據點
    pub fn push(&mut self, plan: BackwardStepPlan) {
        self.plans
            .entry(plan.location_id.clone())
            .or_default()
            .push(plan);
    }

    pub fn get(&self, location_id: &str) -> &[BackwardStepPlan] {
        self.plans
            .get(location_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 取出據點的全部計劃
    pub fn take(&mut self, location_id: &str) -> Vec<BackwardStepPlan> {
        self.plans.remove(location_id).unwrap_or_default()
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BackwardStepPlan])> {
        self.plans.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// 計劃總數
    pub fn len(&self) -> usize {
        self.plans.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 依 (據點, 物料) 分組的 Pegging 結果
#[derive(Debug, Clone, Default)]
pub struct PegResults {
    records: BTreeMap<(String, String), Vec<PegRecord>>,
}

impl PegResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PegRecord) {
        self.records
            .entry((record.location_id.clone(), record.item_id.clone()))
            .or_default()
            .push(record);
    }

    pub fn extend<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = PegRecord>,
    {
        for record in records {
            self.push(record);
        }
    }

    pub fn get(&self, location_id: &str, item_id: &str) -> &[PegRecord] {
        self.records
            .get(&(location_id.to_string(), item_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 某據點的所有 Pegging 記錄
    pub fn by_location(&self, location_id: &str) -> Vec<&PegRecord> {
        self.records
            .iter()
            .filter(|((loc, _), _)| loc == location_id)
            .flat_map(|(_, records)| records.iter())
            .collect()
    }

    pub fn locations(&self) -> Vec<&str> {
        let mut locations: Vec<&str> = self.records.keys().map(|(loc, _)| loc.as_str()).collect();
        locations.dedup();
        locations
    }

    pub fn iter(&self) -> impl Iterator<Item = &PegRecord> {
        self.records.values().flatten()
    }

    /// Pegging 總數量
    pub fn total_pegged(&self) -> Decimal {
        self.iter().map(|r| r.peg_quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
