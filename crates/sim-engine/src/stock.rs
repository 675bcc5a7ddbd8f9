//! 從物料列表中取出指定數量（必要時分割）

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use sim_core::{Item, PegRecord};

/// 取料順序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOrder {
    /// 依列表順序
    Listed,
    /// 數量大者優先（分割次數最少）
    LargestFirst,
}

/// 屬於工單的物料總數
pub fn quantity_of(items: &[Item], work_order_id: &str) -> Decimal {
    items
        .iter()
        .filter(|item| item.work_order_id == work_order_id)
        .map(|item| item.quantity)
        .sum()
}

/// 從 `items` 取出屬於 `work_order_id` 的物料共 `quantity`
///
/// 整批取走的物料自列表移除，最後一批不足時分割。呼叫端需先確認數量足夠。
pub fn draw(
    items: &mut Vec<Item>,
    work_order_id: &str,
    quantity: Decimal,
    order: DrawOrder,
    time_index: i64,
    date: NaiveDateTime,
    location: &str,
) -> Vec<Item> {
    let mut candidates: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.work_order_id == work_order_id)
        .map(|(idx, _)| idx)
        .collect();
    if order == DrawOrder::LargestFirst {
        candidates.sort_by(|a, b| items[*b].quantity.cmp(&items[*a].quantity));
    }

    // (位置, 分割數量)；None 表示整批取走
    let mut picks: Vec<(usize, Option<Decimal>)> = Vec::new();
    let mut remaining = quantity;
    for idx in candidates {
        if remaining <= Decimal::ZERO {
            break;
        }
        let available = items[idx].quantity;
        if available <= remaining {
            picks.push((idx, None));
            remaining -= available;
        } else {
            picks.push((idx, Some(remaining)));
            remaining = Decimal::ZERO;
        }
    }

    let mut drawn: Vec<Option<Item>> = vec![None; picks.len()];
    for (slot, (idx, cut)) in picks.iter().enumerate() {
        if let Some(cut) = cut {
            drawn[slot] = Some(items[*idx].cut(time_index, date, location, *cut));
        }
    }

    let mut whole: Vec<(usize, usize)> = picks
        .iter()
        .enumerate()
        .filter(|(_, (_, cut))| cut.is_none())
        .map(|(slot, (idx, _))| (*idx, slot))
        .collect();
    whole.sort_by(|a, b| b.0.cmp(&a.0));
    for (idx, slot) in whole {
        drawn[slot] = Some(items.remove(idx));
    }

    drawn.into_iter().flatten().collect()
}

/// 將未指派工單的物料指派給 Pegging 記錄，必要時分割
///
/// 回傳實際指派的數量。
pub fn assign_pegged(
    items: &mut Vec<Item>,
    record: &PegRecord,
    time_index: i64,
    date: NaiveDateTime,
    location: &str,
) -> Decimal {
    let mut remaining = record.peg_quantity;
    let mut pieces = Vec::new();

    for item in items.iter_mut() {
        if remaining <= Decimal::ZERO {
            break;
        }
        if !item.work_order_id.is_empty() || item.quantity <= Decimal::ZERO {
            continue;
        }

        if item.quantity <= remaining {
            remaining -= item.quantity;
            stamp(item, record);
        } else {
            let mut piece = item.cut(time_index, date, location, remaining);
            stamp(&mut piece, record);
            pieces.push(piece);
            remaining = Decimal::ZERO;
        }
    }

    items.extend(pieces);
    record.peg_quantity - remaining
}

fn stamp(item: &mut Item, record: &PegRecord) {
    item.work_order_id = record.work_order_id.clone();
    item.order_item_id = record.order_item_id.clone();
    item.order_quantity = record.order_quantity;
    item.required_quantity = record.required_quantity;
    item.peg_quantity = record.peg_quantity;
    item.lpst = record.lpst;
}
