//! Pure auction core: ledgers, bidding episodes, lineup compliance, and the
//! room aggregate. No I/O and no async; the server crate wraps each room in
//! its own task and drives these operations through a mailbox.

pub mod episode;
pub mod events;
pub mod ledger;
pub mod lineup;
pub mod room;

pub use episode::{BidEpisode, BidRejection};
pub use events::{CurrentOffer, RoomDelta, RoomSnapshot, TeamView};
pub use ledger::{Acquisition, Ledger, LedgerError};
pub use lineup::{LineupSelection, LineupViolation};
pub use room::{AuctionRoom, PlayerImportRow, RestoredRoom, RestoredTeam, RoomError, Team};
