use tradelens::engine::reconstruct;
use tradelens::{Coin, CompletedTrade, Decimal, Direction, Fill, Side, TimeMs, ValidationError};

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn fill(coin: &str, side: Side, sz: &str, time_ms: i64, tid: i64, closed_pnl: &str) -> Fill {
    Fill::new(
        TimeMs::new(time_ms),
        Coin::new(coin.to_string()),
        side,
        d("100"),
        d(sz),
        Decimal::zero(),
        d(closed_pnl),
        Some(tid),
        None,
    )
}

fn buy(coin: &str, sz: &str, time_ms: i64, tid: i64, pnl: &str) -> Fill {
    fill(coin, Side::Buy, sz, time_ms, tid, pnl)
}

fn sell(coin: &str, sz: &str, time_ms: i64, tid: i64, pnl: &str) -> Fill {
    fill(coin, Side::Sell, sz, time_ms, tid, pnl)
}

#[test]
fn test_single_round_trip() {
    let fills = vec![buy("X", "1", 0, 1, "0"), sell("X", "1", 1000, 2, "5.0")];

    let trades = reconstruct(&fills).unwrap();
    assert_eq!(
        trades,
        vec![CompletedTrade {
            instrument: Coin::new("X".to_string()),
            direction: Direction::Long,
            open_time: TimeMs::new(0),
            close_time: TimeMs::new(1000),
            duration_ms: 1000,
            realized_pnl: d("5.0"),
            fill_count: 2,
        }]
    );
}

#[test]
fn test_dangling_position_yields_nothing() {
    let fills = vec![buy("X", "1", 0, 1, "0")];
    assert!(reconstruct(&fills).unwrap().is_empty());
}

#[test]
fn test_empty_input() {
    assert!(reconstruct(&[]).unwrap().is_empty());
}

#[test]
fn test_multi_leg_close() {
    let fills = vec![
        buy("X", "1", 0, 1, "0"),
        buy("X", "1", 10, 2, "0"),
        sell("X", "2", 20, 3, "8.0"),
    ];

    let trades = reconstruct(&fills).unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].direction, Direction::Long);
    assert_eq!(trades[0].open_time, TimeMs::new(0));
    assert_eq!(trades[0].close_time, TimeMs::new(20));
    assert_eq!(trades[0].duration_ms, 20);
    assert_eq!(trades[0].realized_pnl, d("8"));
}

#[test]
fn test_short_round_trip_with_partial_closes() {
    let fills = vec![
        sell("ETH", "1", 1000, 1, "0"),
        sell("ETH", "1", 2000, 2, "0"),
        buy("ETH", "0.5", 3000, 3, "7.5"),
        buy("ETH", "1.5", 4000, 4, "-2.5"),
    ];

    let trades = reconstruct(&fills).unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].direction, Direction::Short);
    assert_eq!(trades[0].duration_ms, 3000);
    assert_eq!(trades[0].realized_pnl, d("5"));
    assert_eq!(trades[0].fill_count, 4);
}

#[test]
fn test_reopen_after_close_scopes_pnl_per_cycle() {
    let fills = vec![
        buy("X", "1", 0, 1, "0"),
        sell("X", "1", 100, 2, "3"),
        sell("X", "2", 200, 3, "0"),
        buy("X", "2", 300, 4, "-1"),
    ];

    let trades = reconstruct(&fills).unwrap();
    assert_eq!(trades.len(), 2);

    // Most recent first.
    assert_eq!(trades[0].direction, Direction::Short);
    assert_eq!(trades[0].open_time, TimeMs::new(200));
    assert_eq!(trades[0].realized_pnl, d("-1"));

    assert_eq!(trades[1].direction, Direction::Long);
    assert_eq!(trades[1].open_time, TimeMs::new(0));
    assert_eq!(trades[1].realized_pnl, d("3"));
}

#[test]
fn test_instruments_are_independent() {
    let fills = vec![
        buy("BTC", "1", 0, 1, "0"),
        sell("ETH", "3", 5, 2, "0"),
        sell("BTC", "1", 10, 3, "2"),
        buy("ETH", "3", 20, 4, "4"),
        buy("SOL", "1", 30, 5, "0"),
    ];

    let trades = reconstruct(&fills).unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].instrument.as_str(), "ETH");
    assert_eq!(trades[0].direction, Direction::Short);
    assert_eq!(trades[0].realized_pnl, d("4"));
    assert_eq!(trades[1].instrument.as_str(), "BTC");
    assert_eq!(trades[1].realized_pnl, d("2"));
}

#[test]
fn test_unsorted_input_is_sorted_internally() {
    let sorted = vec![
        buy("X", "1", 0, 1, "0"),
        buy("X", "1", 10, 2, "0"),
        sell("X", "2", 20, 3, "8"),
        sell("X", "1", 30, 4, "0"),
        buy("X", "1", 40, 5, "1"),
    ];
    let expected = reconstruct(&sorted).unwrap();
    assert_eq!(expected.len(), 2);

    let mut reversed = sorted.clone();
    reversed.reverse();
    assert_eq!(reconstruct(&reversed).unwrap(), expected);

    for shift in 1..sorted.len() {
        let mut rotated = sorted.clone();
        rotated.rotate_left(shift);
        assert_eq!(reconstruct(&rotated).unwrap(), expected, "rotation {}", shift);
    }
}

#[test]
fn test_equal_timestamps_break_ties_by_trade_id() {
    // Same millisecond: the buy (tid 1) must be replayed before the sell (tid 2)
    // regardless of list order, so the cycle opens long and closes flat.
    let a = vec![buy("X", "1", 500, 1, "0"), sell("X", "1", 500, 2, "1")];
    let b = vec![sell("X", "1", 500, 2, "1"), buy("X", "1", 500, 1, "0")];

    let from_a = reconstruct(&a).unwrap();
    let from_b = reconstruct(&b).unwrap();
    assert_eq!(from_a, from_b);
    assert_eq!(from_a.len(), 1);
    assert_eq!(from_a[0].direction, Direction::Long);
    assert_eq!(from_a[0].duration_ms, 0);
}

#[test]
fn test_deterministic_across_repeated_calls() {
    let fills = vec![
        sell("B", "2", 7, 1, "0"),
        buy("A", "1", 3, 2, "0"),
        sell("A", "1", 9, 3, "1"),
        buy("B", "2", 8, 4, "2"),
    ];
    assert_eq!(reconstruct(&fills).unwrap(), reconstruct(&fills).unwrap());
}

#[test]
fn test_zero_size_fill_is_rejected() {
    let fills = vec![buy("X", "0", 0, 1, "0")];
    match reconstruct(&fills) {
        Err(ValidationError::NonPositiveSize { fill_key, size }) => {
            assert_eq!(fill_key, "tid:1");
            assert_eq!(size, "0");
        }
        other => panic!("Expected NonPositiveSize, got {:?}", other),
    }
}

#[test]
fn test_negative_size_fill_is_rejected() {
    let fills = vec![buy("X", "1", 0, 1, "0"), sell("X", "-1", 1, 2, "0")];
    assert!(matches!(
        reconstruct(&fills),
        Err(ValidationError::NonPositiveSize { .. })
    ));
}

#[test]
fn test_fills_partition_into_cycles() {
    let fills = vec![
        buy("X", "1", 0, 1, "0"),
        sell("X", "1", 1, 2, "0"),
        buy("X", "2", 2, 3, "0"),
        sell("X", "1", 3, 4, "0"),
        sell("X", "1", 4, 5, "0"),
        sell("X", "1", 5, 6, "0"),
    ];
    let trades = reconstruct(&fills).unwrap();
    let total: usize = trades.iter().map(|t| t.fill_count).sum();
    // The trailing short is still open and owns the last fill.
    assert_eq!(trades.len(), 2);
    assert_eq!(total, 5);
}
