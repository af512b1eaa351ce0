//! Terminal-transition payout routine. Invoked at most once per room, from
//! the single code path that flips a room to `Finished` — never called
//! directly by anything outside `room.rs`.
use wh_core::Seat;
use wh_core::Stake;
use wh_oracle::PaymentOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementResult {
    /// What the winner receives, or 0 on a draw/cancel.
    pub payout: Stake,
    pub house_cut: Stake,
}

/// `pot = 2*stake`, `house_cut = round(pot*HOUSE_FEE)`, `payout = pot - house_cut`.
/// Winner gets `payout`, house gets `house_cut`; on a draw each seat is
/// refunded `stake`. Every outbound transfer is best-effort: failures are
/// logged and never reverse the caller's `Finished` transition — there is
/// no durable outbox yet.
pub async fn settle(
    oracle: &dyn PaymentOracle,
    house_account: &str,
    stake: Stake,
    accounts: [&str; 2],
    winner: Option<Seat>,
) -> SettlementResult {
    let (payout, house_cut) = wh_core::settle(stake);
    match winner {
        Some(seat) => {
            if let Err(e) = oracle.send_outbound(accounts[seat], payout).await {
                log::error!("[settlement] payout transfer to {} failed: {}", accounts[seat], e);
            }
            if let Err(e) = oracle.send_outbound(house_account, house_cut).await {
                log::error!("[settlement] house cut transfer failed: {}", e);
            }
            SettlementResult { payout, house_cut }
        }
        None => {
            for account in accounts {
                if let Err(e) = oracle.send_outbound(account, stake).await {
                    log::error!("[settlement] refund transfer to {} failed: {}", account, e);
                }
            }
            SettlementResult { payout: 0, house_cut: 0 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wh_oracle::TestOracle;

    #[tokio::test]
    async fn winner_gets_payout_house_gets_cut() {
        let oracle = TestOracle::new();
        let result = settle(&oracle, "house", 100, ["alice", "bob"], Some(0)).await;
        assert_eq!(result.payout, 180);
        assert_eq!(result.house_cut, 20);
    }

    #[tokio::test]
    async fn draw_refunds_both_seats() {
        let oracle = TestOracle::new();
        let result = settle(&oracle, "house", 100, ["alice", "bob"], None).await;
        assert_eq!(result.payout, 0);
        assert_eq!(result.house_cut, 0);
    }
}
