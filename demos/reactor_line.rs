//! 反應槽產線示例：雙設備、設備停機、期初在製品，逐 tick 推進並匯出履歷

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use factory_sim::prelude::*;
use rust_decimal::Decimal;

fn build_master(start: NaiveDateTime) -> FactoryMaster {
    let mut master = FactoryMaster::new(FactoryInfo::new("F1".to_string(), "一廠".to_string()));
    master.inventories = vec![
        InventoryMaster::new("RMINV".to_string(), InventoryType::RawMaterial),
        InventoryMaster::new("IPINV".to_string(), InventoryType::InProcess)
            .with_max_quantity(Decimal::from(600)),
        InventoryMaster::new("FGI".to_string(), InventoryType::FinishedGoods),
    ];

    // 反應槽：LDMD1 優先，第二天白天保養
    master.processes = vec![ProcessMaster::new("REACTOR".to_string(), "反應槽".to_string())];
    master.resources = vec![
        ResourceMaster::new("LDMD1".to_string(), "反應槽一號".to_string()).with_blackout(BlackoutWindow::new(
            "PM-LDMD1".to_string(),
            start + Duration::hours(30),
            start + Duration::hours(38),
        )),
        ResourceMaster::new("LDMD2".to_string(), "反應槽二號".to_string()),
    ];
    master.process_resources = vec![
        ProcessResourceMaster::new("REACTOR".to_string(), "LDMD1".to_string())
            .with_priority(1)
            .with_lot_sizes(Decimal::from(80), Some(Decimal::from(500)), Decimal::ONE)
            .with_times(Decimal::from(25), 3),
        ProcessResourceMaster::new("REACTOR".to_string(), "LDMD2".to_string())
            .with_priority(2)
            .with_lot_sizes(Decimal::from(80), Some(Decimal::from(300)), Decimal::ONE)
            .with_efficiency(Decimal::new(95, 2), 0)
            .with_times(Decimal::from(20), 3),
    ];

    let route = |from: &str, to: &str, item: &str, to_item: &str, from_type, to_type, move_time| {
        RouteAttribute::new(
            item.to_string(),
            to_item.to_string(),
            from.to_string(),
            to.to_string(),
            from_type,
            to_type,
        )
        .with_move_time(move_time)
    };
    master.routes = vec![
        route("RMINV", "REACTOR", "MONOMER", "MONOMER", LocationType::Inventory, LocationType::Process, 4),
        route("REACTOR", "IPINV", "MONOMER", "RESIN", LocationType::Process, LocationType::Inventory, 2),
        route("IPINV", "FGI", "RESIN", "RESIN", LocationType::Inventory, LocationType::Inventory, 1),
    ];

    master.stock = vec![
        StockRecord::new("RMINV".to_string(), "MONOMER".to_string(), Decimal::from(200)),
        StockRecord::new("IPINV".to_string(), "RESIN".to_string(), Decimal::from(60)),
    ];
    master.wip = vec![WipRecord::new(
        "REACTOR".to_string(),
        "LDMD2".to_string(),
        "MONOMER".to_string(),
        Decimal::from(100),
    )];
    master
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    println!("=== 反應槽產線模擬 ===\n");

    let start = NaiveDate::from_ymd_opt(2020, 4, 14)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("無效的開始時間")?;

    // 主檔經 JSON 轉存後再載入
    let json = serde_json::to_string_pretty(&build_master(start))?;
    let master = FactoryMaster::from_json_str(&json)?;
    println!("主檔 JSON 長度: {} bytes", json.len());

    let work_orders = vec![
        WorkOrder::new("WO-001".to_string(), "RESIN".to_string(), Decimal::from(400), start + Duration::days(3)),
        WorkOrder::new("WO-002".to_string(), "RESIN".to_string(), Decimal::from(150), start + Duration::days(4))
            .with_priority(2, 1),
    ];

    let config = SimConfig::new("PV-2020-04".to_string()).with_default_queue_size(5);
    let mut calendar = FactoryCalendar::new(start, start + Duration::days(5), Duration::hours(1))?;
    calendar.add_holiday((start + Duration::days(2)).date());

    // 逆推計劃
    let mut context = SimulationContext::init(config, &master, work_orders, start)?;
    let (entire_min, entire_max) = context.manager().entire_lot_size();
    println!("全廠批量範圍: {} ~ {:?}", entire_min, entire_max);
    let result = context.backward_plan()?;
    println!("\n逆推計劃：Pegging 數量 {}", result.peg_results.total_pegged());
    for warning in &result.warnings {
        println!("  ! [{}] {}", warning.work_order_id, warning.message);
    }

    // 逐 tick 推進，每 12 小時列印一次狀態
    println!("\n模擬進度:");
    for tick in calendar.scheduler() {
        context.step(&tick)?;
        if tick.index % 12 == 0 {
            if let Some(snapshot) = context.monitor().last() {
                println!(
                    "  {} {}加工 {} / 整備 {} / 閒置 {}，出貨 {}",
                    snapshot.date,
                    if snapshot.is_off_day { "[休] " } else { "" },
                    snapshot.process,
                    snapshot.setup,
                    snapshot.idle,
                    snapshot.shipped
                );
            }
        }
    }

    println!("\n模擬結果:");
    println!("  出貨總量: {}", context.manager().shipped_quantity());
    println!("  完成步驟計劃: {}", context.manager().finished_plan_count());
    for plan in context.manager().open_plans() {
        println!(
            "  未完成: {} 步驟 {} @ {}:{} 需求 {}",
            plan.work_order_id, plan.step, plan.location_id, plan.item_id, plan.fetch_quantity()
        );
    }

    println!("\n設備履歷 (JSON):");
    println!("{}", serde_json::to_string_pretty(&context.resource_history())?);

    Ok(())
}
