//! 簡單工廠模擬示例：原料倉 → 反應槽 → 成品倉

use chrono::{Duration, NaiveDate};
use factory_sim::prelude::*;
use rust_decimal::Decimal;

fn route(from: &str, to: &str, item: &str, to_item: &str, from_type: LocationType, to_type: LocationType) -> RouteAttribute {
    RouteAttribute::new(
        item.to_string(),
        to_item.to_string(),
        from.to_string(),
        to.to_string(),
        from_type,
        to_type,
    )
    .with_move_time(1)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== 簡單工廠模擬示例 ===\n");

    // 建立工廠主檔
    let mut master = FactoryMaster::new(FactoryInfo::new("F1".to_string(), "一廠".to_string()));
    master.inventories = vec![
        InventoryMaster::new("RMINV".to_string(), InventoryType::RawMaterial),
        InventoryMaster::new("FGI".to_string(), InventoryType::FinishedGoods),
    ];
    master.processes = vec![ProcessMaster::new("REACTOR".to_string(), "反應槽".to_string())];
    master.resources = vec![ResourceMaster::new("LDMD1".to_string(), "反應槽一號".to_string())];
    master.process_resources = vec![ProcessResourceMaster::new("REACTOR".to_string(), "LDMD1".to_string())
        .with_lot_sizes(Decimal::from(50), Some(Decimal::from(200)), Decimal::from(10))
        .with_times(Decimal::from(20), 2)];
    master.routes = vec![
        route("RMINV", "REACTOR", "RESIN", "RESIN", LocationType::Inventory, LocationType::Process),
        route("REACTOR", "FGI", "RESIN", "PELLET", LocationType::Process, LocationType::Inventory),
    ];
    master.stock = vec![StockRecord::new("RMINV".to_string(), "RESIN".to_string(), Decimal::from(120))];

    // 創建工單
    let start = NaiveDate::from_ymd_opt(2020, 4, 14)
        .ok_or("無效的日期")?
        .and_hms_opt(0, 0, 0)
        .ok_or("無效的時間")?;
    let work_orders = vec![
        WorkOrder::new("WO-001".to_string(), "PELLET".to_string(), Decimal::from(150), start + Duration::days(2)),
        WorkOrder::new("WO-002".to_string(), "PELLET".to_string(), Decimal::from(80), start + Duration::days(3))
            .with_priority(2, 1),
    ];

    println!("工單清單:");
    for wo in &work_orders {
        println!("  - 工單: {}, 成品: {}, 數量: {}, 交期: {}", wo.id, wo.order_item_id, wo.order_quantity, wo.due_date);
    }

    // 執行模擬（三天，每小時一個 tick）
    let calendar = FactoryCalendar::new(start, start + Duration::days(3), Duration::hours(1))?;
    let context = factory_sim::simulate(SimConfig::default(), &master, work_orders, &calendar)?;

    if let Some(result) = context.backward_result() {
        println!("\n逆推計劃:");
        for plan in result.plans.iter().flatten() {
            println!(
                "  - {} 步驟 {} @ {}:{}，需求 {}，Pegging {}，LPST {:?}",
                plan.work_order_id,
                plan.step,
                plan.location_id,
                plan.item_id,
                plan.required_quantity,
                plan.peg_quantity,
                plan.lpst
            );
        }
    }

    println!("\n模擬結果:");
    println!("  出貨總量: {}", context.manager().shipped_quantity());
    println!("  未完成步驟計劃: {}", context.manager().open_plans().len());
    println!("  設備稼動率: {}", context.monitor().utilization().round_dp(3));

    println!("\n設備履歷:");
    for record in context.resource_history() {
        println!(
            "  - {} {:?} {} ~ {} 數量 {}",
            record.resource_id,
            record.event,
            record.start,
            record.end.as_deref().unwrap_or("-"),
            record.quantity
        );
    }

    Ok(())
}
