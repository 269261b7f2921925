mod auctions;
mod rooms;
mod session;

pub(in crate::infra::api) use {auctions::auctions, rooms::rooms, session::session};
