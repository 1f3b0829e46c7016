//! Coinbase reward distribution.
//!
//! Each block's mining reward is split proportionally among the partial
//! solutions by difficulty target, with a fixed halving: the solution side of
//! the ledger only ever receives half the coinbase reward, the other half
//! goes to the fee recipient path outside this crate.

/// First height of the historical incentive period.
pub const INCENTIVE_START_HEIGHT: u32 = 130_888;

/// End of the incentive period (exclusive), unix seconds.
pub const INCENTIVE_END_TIMESTAMP: i64 = 1_675_209_600;

/// Total credit cap for the incentive period, in base units.
pub const INCENTIVE_CREDIT_CAP: u64 = 37_500_000_000_000;

/// Splits `coinbase_reward` across solutions with the given targets:
/// `reward_i = coinbase_reward * target_i / (2 * target_sum)`, floored.
///
/// The sum of the returned rewards is at most `coinbase_reward / 2`; the
/// difference is lost to integer truncation by design.
pub fn split_reward(coinbase_reward: u64, targets: &[u64]) -> Vec<u64> {
    let target_sum: u128 = targets.iter().map(|&t| t as u128).sum();
    if target_sum == 0 {
        return vec![0; targets.len()];
    }
    targets
        .iter()
        .map(|&target| ((coinbase_reward as u128 * target as u128) / (2 * target_sum)) as u64)
        .collect()
}

/// Whether the historical incentive rule applies to a block, evaluated
/// against the total credit recorded BEFORE this block's additions.
pub fn incentive_window_open(height: u32, timestamp: i64, total_credit_before: u64) -> bool {
    height >= INCENTIVE_START_HEIGHT
        && timestamp < INCENTIVE_END_TIMESTAMP
        && total_credit_before < INCENTIVE_CREDIT_CAP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_solution_gets_half() {
        assert_eq!(split_reward(1000, &[100]), vec![500]);
    }

    #[test]
    fn split_is_proportional_and_floored() {
        // targets 1:2 of a reward of 100 -> floor(100*1/6)=16, floor(100*2/6)=33
        assert_eq!(split_reward(100, &[1, 2]), vec![16, 33]);
    }

    #[test]
    fn total_never_exceeds_half() {
        let targets = [3, 7, 11, 13, 101, 997];
        for reward in [0u64, 1, 2, 999, 1_000_000_007] {
            let total: u64 = split_reward(reward, &targets).iter().sum();
            assert!(total <= reward / 2, "reward {} leaked {}", reward, total);
        }
    }

    #[test]
    fn zero_target_sum_pays_nothing() {
        assert_eq!(split_reward(1000, &[0, 0]), vec![0, 0]);
        assert_eq!(split_reward(1000, &[]), Vec::<u64>::new());
    }

    #[test]
    fn large_targets_do_not_overflow() {
        let targets = [u64::MAX, u64::MAX];
        let rewards = split_reward(u64::MAX, &targets);
        assert_eq!(rewards.len(), 2);
        let total: u128 = rewards.iter().map(|&r| r as u128).sum();
        assert!(total <= u64::MAX as u128 / 2);
    }

    #[test]
    fn window_edges() {
        let below_cap = INCENTIVE_CREDIT_CAP - 1;
        assert!(incentive_window_open(130_888, 1_675_209_000, 0));
        assert!(incentive_window_open(130_888, 1_675_209_000, below_cap));
        // one short of the starting height
        assert!(!incentive_window_open(130_887, 1_675_209_000, 0));
        // timestamp at the boundary is outside
        assert!(!incentive_window_open(130_888, 1_675_209_600, 0));
        // cap reached
        assert!(!incentive_window_open(130_888, 1_675_209_000, INCENTIVE_CREDIT_CAP));
    }
}
