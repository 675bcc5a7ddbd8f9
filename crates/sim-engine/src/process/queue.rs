//! 設備前的 FIFO 佇列

use std::collections::VecDeque;

use crate::process::lot::Lot;

/// 有容量上限的批次佇列
#[derive(Debug, Clone)]
pub struct ProcessQueue {
    lots: VecDeque<Lot>,
    max_size: usize,
}

impl ProcessQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            lots: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// 放入佇列，已滿時原樣退回
    pub fn put(&mut self, lot: Lot) -> Result<(), Lot> {
        if self.lots.len() >= self.max_size {
            return Err(lot);
        }
        self.lots.push_back(lot);
        Ok(())
    }

    /// 最早進入的批次
    pub fn peek(&self) -> Option<&Lot> {
        self.lots.front()
    }

    pub fn pop(&mut self) -> Option<Lot> {
        self.lots.pop_front()
    }

    /// 佇列中所有批次各經過一個 tick
    pub fn run(&mut self) {
        for lot in self.lots.iter_mut() {
            lot.run();
        }
    }

    pub fn available_size(&self) -> usize {
        self.max_size.saturating_sub(self.lots.len())
    }

    pub fn is_available(&self) -> bool {
        self.available_size() > 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter()
    }
}

impl Default for ProcessQueue {
    fn default() -> Self {
        Self::new(10)
    }
}
