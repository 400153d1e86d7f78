//! Signal replays: indicator warmup, transitions, sizing and the pending
//! order gate driven through the date-by-date pipeline.

mod common;

use common::*;
use factorsig::adapters::paper_execution::PaperExecution;
use factorsig::cli::run_signal_pipeline;
use factorsig::domain::intent::{OrderAction, OrderIntent, OrderReason};
use factorsig::domain::signal::{SignalConfig, SignalEngine};
use factorsig::domain::strategy::SignalStrategy;
use factorsig::domain::trade_state::Side;
use factorsig::domain::universe::{load_universe, Universe};
use factorsig::ports::execution_port::ExecutionPort;

const WARMUP: usize = 35;

fn swing_universe(codes: &[&str], count: usize) -> Universe {
    let port = codes.iter().fold(MockDataPort::new(), |port, code| {
        port.with_bars(code, swing_bars(code, date(2024, 1, 1), count))
    });
    let codes = codes.iter().map(|c| c.to_string()).collect();
    load_universe(&port, codes, date(2000, 1, 1), date(2100, 1, 1), WARMUP).unwrap()
}

fn replay(universe: &Universe, mut port: PaperExecution) -> (usize, PaperExecution) {
    let strategy = SignalStrategy::new(&universe.codes(), &SignalConfig::default());
    let orders = run_signal_pipeline(universe, strategy, &mut port);
    (orders, port)
}

fn reasons(orders: &[OrderIntent]) -> Vec<OrderReason> {
    orders.iter().map(|o| o.reason).collect()
}

#[test]
fn first_entry_after_warmup_on_an_upward_cross() {
    let universe = swing_universe(&["IF"], 300);
    let (count, paper) = replay(&universe, PaperExecution::new(1_000_000.0));

    assert_eq!(count, paper.orders().len());
    let first = &paper.orders()[0];
    assert_eq!(first.code, "IF");
    assert_eq!(first.date, date(2024, 2, 6));
    assert_eq!(first.reason, OrderReason::EnterLong);
    // floor(1e6 * 0.005 / (2.5033 * 300 * 0.1))
    assert_eq!(first.action, OrderAction::Buy { size: 66 });
}

#[test]
fn pyramids_then_takes_profit() {
    let universe = swing_universe(&["IF"], 300);
    let (_, paper) = replay(&universe, PaperExecution::new(1_000_000.0));

    assert_eq!(
        reasons(&paper.orders()[..4]),
        vec![
            OrderReason::EnterLong,
            OrderReason::PyramidLong,
            OrderReason::PyramidLong,
            OrderReason::TakeProfit,
        ]
    );
    assert_eq!(paper.orders()[3].action, OrderAction::Close);
    assert_eq!(paper.orders()[3].date, date(2024, 2, 26));
}

#[test]
fn full_replay_order_count() {
    let universe = swing_universe(&["IF"], 300);
    let (count, paper) = replay(&universe, PaperExecution::new(1_000_000.0));
    assert_eq!(count, 59);

    let exits = paper
        .orders()
        .iter()
        .filter(|o| o.action == OrderAction::Close)
        .count();
    assert_eq!(exits, 14);
    assert!(paper.orders().iter().all(|o| o.reason != OrderReason::EnterShort));
}

#[test]
fn never_more_than_three_tranches_between_exits() {
    let universe = swing_universe(&["IF"], 300);
    let (_, paper) = replay(&universe, PaperExecution::new(1_000_000.0));

    let mut tranches = 0;
    for order in paper.orders() {
        match order.reason {
            OrderReason::EnterLong | OrderReason::EnterShort => {
                assert_eq!(tranches, 0, "entry while holding on {}", order.date);
                tranches = 1;
            }
            OrderReason::PyramidLong | OrderReason::PyramidShort => {
                assert!(tranches >= 1, "pyramid while flat on {}", order.date);
                tranches += 1;
                assert!(tranches <= 3);
            }
            OrderReason::StopLoss | OrderReason::TakeProfit | OrderReason::SignalExit => {
                assert!(tranches >= 1, "exit while flat on {}", order.date);
                tranches = 0;
            }
        }
    }
}

#[test]
fn a_pending_order_blocks_every_later_transition() {
    let universe = swing_universe(&["IF"], 300);
    let (count, paper) = replay(&universe, PaperExecution::new(1_000_000.0).holding_orders());

    assert_eq!(count, 1);
    assert_eq!(paper.orders()[0].reason, OrderReason::EnterLong);
}

#[test]
fn settling_resumes_the_state_machine() {
    let bars = swing_bars("IF", date(2024, 1, 1), 60);
    let mut engine = SignalEngine::new("IF", SignalConfig::default());
    let mut port = PaperExecution::new(1_000_000.0).holding_orders();
    let mut emitted = Vec::new();

    for bar in &bars {
        // the entry fills two bars after submission
        if bar.date == date(2024, 2, 8) {
            assert!(port.settle("IF"));
        }
        if let Some(intent) = engine.on_bar(bar, port.account_equity(), port.has_pending_order("IF")) {
            port.submit_order(intent.clone());
            emitted.push(intent);
        }
    }

    // the pyramid is still pending, so nothing follows it
    assert_eq!(
        reasons(&emitted),
        vec![OrderReason::EnterLong, OrderReason::PyramidLong]
    );
    assert_eq!(emitted[1].date, date(2024, 2, 8));
    assert_eq!(engine.state().side, Side::Long);
    assert_eq!(engine.state().pyramid_count, 2);
}

#[test]
fn identical_instruments_trade_identically() {
    let universe = swing_universe(&["IF", "IC"], 120);
    let (_, paper) = replay(&universe, PaperExecution::new(1_000_000.0));

    let per_code = |code: &str| -> Vec<_> {
        paper
            .orders()
            .iter()
            .filter(|o| o.code == code)
            .map(|o| (o.date, o.action, o.reason))
            .collect()
    };
    assert!(!per_code("IF").is_empty());
    assert_eq!(per_code("IF"), per_code("IC"));
}

#[test]
fn larger_accounts_trade_larger_sizes() {
    let universe = swing_universe(&["IF"], 60);
    let (_, small) = replay(&universe, PaperExecution::new(1_000_000.0));
    let (_, large) = replay(&universe, PaperExecution::new(4_000_000.0));

    assert_eq!(small.orders()[0].action.size(), Some(66));
    assert_eq!(large.orders()[0].action.size(), Some(266));
    assert_eq!(reasons(small.orders()), reasons(large.orders()));
}

#[test]
fn short_history_is_rejected_by_the_loader() {
    let port = MockDataPort::new().with_bars("IF", swing_bars("IF", date(2024, 1, 1), 20));
    let result = load_universe(&port, vec!["IF".into()], date(2000, 1, 1), date(2100, 1, 1), WARMUP);
    assert!(result.is_err());
}
