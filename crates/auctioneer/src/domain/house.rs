//! The fixed pool of auction rooms and the routing of new listings into it.

use {
    crate::domain::room::{Config, Room},
    ledger::Ledger,
    model::{RoomId, auction::AuctionItem, room::RoomStatus},
    std::sync::Arc,
};

/// All the auction rooms the service runs. The pool is created once at
/// startup; rooms are never added or removed while the process lives.
pub struct AuctionHouse {
    rooms: Vec<Room>,
}

/// Where a new listing ended up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Placement {
    pub room: RoomId,
    /// Sales that have to clear before this listing goes up. 0 means its
    /// auction started immediately.
    pub queue_position: usize,
}

/// The room pool is empty. Only reachable when the service is configured
/// with zero rooms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("no auction room available")]
pub struct NoRoomAvailable;

impl AuctionHouse {
    pub fn new(rooms: u16, config: Config, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            rooms: (0..rooms)
                .map(|id| Room::new(RoomId(id), config, ledger.clone()))
                .collect(),
        }
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(usize::from(id.0))
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Enqueues a new listing into the room with the shortest queue, ties
    /// going to the lowest room id.
    pub async fn place(&self, item: AuctionItem) -> Result<Placement, NoRoomAvailable> {
        let queues =
            futures::future::join_all(self.rooms.iter().map(|room| room.queue_length())).await;
        let (room, _) = self
            .rooms
            .iter()
            .zip(queues)
            .min_by_key(|(_, queue)| *queue)
            .ok_or(NoRoomAvailable)?;
        let queue_position = room.enqueue(item).await;
        Ok(Placement {
            room: room.id(),
            queue_position,
        })
    }

    /// A point-in-time status snapshot of every room.
    pub async fn statuses(&self) -> Vec<RoomStatus> {
        futures::future::join_all(self.rooms.iter().map(|room| room.status())).await
    }
}

#[cfg(test)]
mod tests {
    use {super::*, ledger::MockLedger, model::Card};

    fn item(card: &str) -> AuctionItem {
        AuctionItem::new(Card::new(card, "rare"), "seller".into(), 10, 100, 300).unwrap()
    }

    fn house(rooms: u16) -> AuctionHouse {
        AuctionHouse::new(rooms, Config::default(), Arc::new(MockLedger::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn routes_to_the_shortest_queue() {
        let house = house(3);
        // Rooms 0, 1 and 2 end up with queue lengths 4, 2 and 3; the first
        // listing in each room starts its auction and leaves the queue.
        for (room, listings) in [(0, 5), (1, 3), (2, 4)] {
            for _ in 0..listings {
                house.rooms()[room].enqueue(item("Filler")).await;
            }
        }

        let placement = house.place(item("Dragon")).await.unwrap();
        assert_eq!(
            placement,
            Placement {
                room: RoomId(1),
                queue_position: 3,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ties_go_to_the_lowest_room_id() {
        let house = house(3);
        let placement = house.place(item("Dragon")).await.unwrap();
        assert_eq!(
            placement,
            Placement {
                room: RoomId(0),
                queue_position: 0,
            }
        );
    }

    #[tokio::test]
    async fn reports_when_no_room_exists() {
        let house = house(0);
        assert_eq!(house.place(item("Dragon")).await, Err(NoRoomAvailable));
    }

    #[tokio::test(start_paused = true)]
    async fn statuses_cover_every_room() {
        let house = house(3);
        house.rooms()[1].enqueue(item("Dragon")).await;

        let statuses = house.statuses().await;
        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[1].name, "Auction Room 1");
        assert!(statuses[1].active);
        assert!(!statuses[0].active);
        assert!(!statuses[2].active);
    }
}
