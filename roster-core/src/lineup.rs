/// Rank assigned to anything that does not occupy an active lineup slot.
pub const BENCH_RANK: u32 = 999;

/// Sort key for a batter's lineup slot: 1-9 sort ascending, a missing order
/// (bench) sorts after every assigned slot.
pub fn batting_order_rank(order: Option<u32>) -> u32 {
    order.unwrap_or(BENCH_RANK)
}

/// Sort key for a pitcher's rotation slot. Orders 1-5 are starters and keep
/// their value, 6-11 are relievers shifted into the 100 band, 12 is the
/// closer at 200. Null and out-of-band values rank as bench. Total over the
/// whole integer domain, so the resulting sort is deterministic; ties keep
/// their source order (the callers use stable sorts).
pub fn pitcher_slot_rank(order: Option<u32>) -> u32 {
    match order {
        Some(o) if (1..=5).contains(&o) => o,
        Some(o) if (6..=11).contains(&o) => 100 + o,
        Some(12) => 200,
        _ => BENCH_RANK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitcher_slot_rank_bands() {
        assert_eq!(pitcher_slot_rank(Some(1)), 1);
        assert_eq!(pitcher_slot_rank(Some(3)), 3);
        assert_eq!(pitcher_slot_rank(Some(5)), 5);
        assert_eq!(pitcher_slot_rank(Some(6)), 106);
        assert_eq!(pitcher_slot_rank(Some(8)), 108);
        assert_eq!(pitcher_slot_rank(Some(11)), 111);
        assert_eq!(pitcher_slot_rank(Some(12)), 200);
    }

    #[test]
    fn test_pitcher_slot_rank_out_of_band_is_bench() {
        assert_eq!(pitcher_slot_rank(None), BENCH_RANK);
        assert_eq!(pitcher_slot_rank(Some(0)), BENCH_RANK);
        assert_eq!(pitcher_slot_rank(Some(13)), BENCH_RANK);
        assert_eq!(pitcher_slot_rank(Some(45)), BENCH_RANK);
    }

    #[test]
    fn test_pitcher_slot_rank_orders_roles() {
        let mut orders = vec![None, Some(12), Some(8), Some(2), Some(6), Some(1)];
        orders.sort_by_key(|o| pitcher_slot_rank(*o));
        assert_eq!(
            orders,
            vec![Some(1), Some(2), Some(6), Some(8), Some(12), None]
        );
    }

    #[test]
    fn test_batting_order_rank_nulls_last() {
        let mut orders = vec![Some(4), None, Some(1), Some(9), None, Some(2)];
        orders.sort_by_key(|o| batting_order_rank(*o));
        assert_eq!(
            orders,
            vec![Some(1), Some(2), Some(4), Some(9), None, None]
        );
    }
}
