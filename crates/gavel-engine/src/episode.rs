//! Bidding episode for the currently offered player.
//!
//! An episode exists only while one player is on the block. All bid checks
//! are evaluated against the episode's live state and, on accept, the
//! standing bid updates in the same call; there is no window where a second
//! bid could be judged against stale state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a bid was not accepted. No variant changes episode state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BidRejection {
    #[error("Bid {offered} is below the floor price {floor}")]
    BelowFloor { offered: Decimal, floor: Decimal },

    #[error("Bid {offered} does not beat the standing bid {standing}")]
    BidTooLow { offered: Decimal, standing: Decimal },

    #[error("Team {user_id} already holds the standing bid")]
    SelfOutbid { user_id: String },

    #[error("Bid {offered} exceeds remaining purse {available}")]
    InsufficientPurse {
        offered: Decimal,
        available: Decimal,
    },
}

impl BidRejection {
    /// Machine-readable code for wire errors.
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::BelowFloor { .. } => "BELOW_FLOOR",
            BidRejection::BidTooLow { .. } => "BID_TOO_LOW",
            BidRejection::SelfOutbid { .. } => "SELF_OUTBID",
            BidRejection::InsufficientPurse { .. } => "INSUFFICIENT_PURSE",
        }
    }
}

/// Live state of one player's time on the block.
#[derive(Debug, Clone, PartialEq)]
pub struct BidEpisode {
    player_id: String,
    floor_price: Decimal,
    standing_bid: Decimal,
    leader: Option<String>,
    bids_accepted: u32,
    opened_at: DateTime<Utc>,
}

impl BidEpisode {
    /// Opens a fresh episode: standing bid at the floor, no leader.
    pub fn open(player_id: &str, floor_price: Decimal) -> Self {
        Self {
            player_id: player_id.to_string(),
            floor_price,
            standing_bid: floor_price,
            leader: None,
            bids_accepted: 0,
            opened_at: Utc::now(),
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn floor_price(&self) -> Decimal {
        self.floor_price
    }

    /// The current accepted price; the floor until the first bid lands.
    pub fn standing_bid(&self) -> Decimal {
        self.standing_bid
    }

    /// User id of the team holding the standing bid, if any.
    pub fn leader(&self) -> Option<&str> {
        self.leader.as_deref()
    }

    pub fn bids_accepted(&self) -> u32 {
        self.bids_accepted
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Arbitrates one bid against the live episode.
    ///
    /// The first bid is accepted at or above the floor; after that every
    /// accepted price must strictly increase and the leading team may not
    /// outbid itself. `purse_remaining` is the bidder's current purse; the
    /// episode never moves money.
    pub fn submit(
        &mut self,
        user_id: &str,
        price: Decimal,
        purse_remaining: Decimal,
    ) -> Result<(), BidRejection> {
        match self.leader.as_deref() {
            None => {
                if price < self.floor_price {
                    return Err(BidRejection::BelowFloor {
                        offered: price,
                        floor: self.floor_price,
                    });
                }
            }
            Some(leader) => {
                if leader == user_id {
                    return Err(BidRejection::SelfOutbid {
                        user_id: user_id.to_string(),
                    });
                }
                if price <= self.standing_bid {
                    return Err(BidRejection::BidTooLow {
                        offered: price,
                        standing: self.standing_bid,
                    });
                }
            }
        }

        if price > purse_remaining {
            return Err(BidRejection::InsufficientPurse {
                offered: price,
                available: purse_remaining,
            });
        }

        // Decision and episode update are one step.
        self.standing_bid = price;
        self.leader = Some(user_id.to_string());
        self.bids_accepted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_open_starts_at_floor_with_no_leader() {
        let ep = BidEpisode::open("p1", dec!(2));
        assert_eq!(ep.standing_bid(), dec!(2));
        assert!(ep.leader().is_none());
        assert_eq!(ep.bids_accepted(), 0);
    }

    #[test]
    fn test_first_bid_at_floor_accepted() {
        let mut ep = BidEpisode::open("p1", dec!(2));
        ep.submit("teamA", dec!(2), dec!(100)).unwrap();
        assert_eq!(ep.standing_bid(), dec!(2));
        assert_eq!(ep.leader(), Some("teamA"));
    }

    #[test]
    fn test_first_bid_below_floor_rejected() {
        let mut ep = BidEpisode::open("p1", dec!(2));
        let err = ep.submit("teamA", dec!(1), dec!(100)).unwrap_err();
        assert_eq!(err.code(), "BELOW_FLOOR");
        assert!(ep.leader().is_none());
    }

    #[test]
    fn test_strictly_increasing() {
        let mut ep = BidEpisode::open("p1", dec!(2));
        ep.submit("teamA", dec!(5), dec!(100)).unwrap();
        // Equal price does not beat the standing bid.
        let err = ep.submit("teamB", dec!(5), dec!(100)).unwrap_err();
        assert!(matches!(err, BidRejection::BidTooLow { .. }));
        ep.submit("teamB", dec!(6), dec!(100)).unwrap();
        assert_eq!(ep.standing_bid(), dec!(6));
        assert_eq!(ep.leader(), Some("teamB"));
    }

    #[test]
    fn test_self_outbid_rejected() {
        let mut ep = BidEpisode::open("p1", dec!(2));
        ep.submit("teamA", dec!(5), dec!(100)).unwrap();
        let err = ep.submit("teamA", dec!(7), dec!(100)).unwrap_err();
        assert_eq!(
            err,
            BidRejection::SelfOutbid {
                user_id: "teamA".to_string()
            }
        );
        // Episode unchanged.
        assert_eq!(ep.standing_bid(), dec!(5));
        assert_eq!(ep.leader(), Some("teamA"));
    }

    #[test]
    fn test_insufficient_purse_rejected() {
        let mut ep = BidEpisode::open("p1", dec!(2));
        let err = ep.submit("teamA", dec!(10), dec!(5)).unwrap_err();
        assert_eq!(
            err,
            BidRejection::InsufficientPurse {
                offered: dec!(10),
                available: dec!(5),
            }
        );
        assert!(ep.leader().is_none());
    }

    #[test]
    fn test_accepted_sequence_alternates_and_increases() {
        let mut ep = BidEpisode::open("p1", dec!(2));
        let mut accepted = Vec::new();
        for (team, price) in [
            ("teamA", dec!(5)),
            ("teamB", dec!(7)),
            ("teamA", dec!(9)),
            ("teamB", dec!(12)),
        ] {
            ep.submit(team, price, dec!(100)).unwrap();
            accepted.push(price);
        }
        assert!(accepted.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ep.bids_accepted(), 4);
        assert_eq!(ep.leader(), Some("teamB"));
    }
}
