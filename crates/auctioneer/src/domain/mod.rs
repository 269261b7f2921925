pub mod auction;
pub mod house;
pub mod room;
pub mod settlement;

pub use {
    auction::{ActiveAuction, ClosedAuction},
    house::AuctionHouse,
    room::Room,
};
