use crate::auction::model::{AuctionRecord, ItemAttributes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 입찰 서비스가 판정한 입찰 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidStatus {
    Accepted,
    AcceptedBelowReserve,
    TooLow,
    Finished,
}

impl BidStatus {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedBelowReserve)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum DomainEvent {
    // 경매 생성 이벤트
    AuctionCreated {
        seller: String,
        item: ItemAttributes,
        reserve_price: i64,
        auction_end: DateTime<Utc>,
        created_at: DateTime<Utc>,
    },
    // 경매 수정 이벤트 (수정 후 전체 속성)
    AuctionUpdated {
        item: ItemAttributes,
        version: i64,
        updated_at: DateTime<Utc>,
    },
    // 경매 삭제 이벤트
    AuctionDeleted,
    // 입찰 이벤트 (입찰 서비스 발행)
    BidPlaced {
        bidder: String,
        amount: i64,
        bid_status: BidStatus,
    },
    // 경매 종료 이벤트 (경매 종료 처리 서비스 발행)
    AuctionFinished {
        item_sold: bool,
        winner: Option<String>,
        amount: Option<i64>,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AuctionCreated { .. } => "AuctionCreated",
            Self::AuctionUpdated { .. } => "AuctionUpdated",
            Self::AuctionDeleted => "AuctionDeleted",
            Self::BidPlaced { .. } => "BidPlaced",
            Self::AuctionFinished { .. } => "AuctionFinished",
        }
    }
}

/// 채널로 전달되는 메시지 단위
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub auction_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(auction_id: Uuid, occurred_at: DateTime<Utc>, event: DomainEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            auction_id,
            occurred_at,
            event,
        }
    }

    pub fn created(record: &AuctionRecord) -> Self {
        Self::new(
            record.id,
            record.created_at,
            DomainEvent::AuctionCreated {
                seller: record.seller.clone(),
                item: record.item(),
                reserve_price: record.reserve_price,
                auction_end: record.auction_end,
                created_at: record.created_at,
            },
        )
    }

    pub fn updated(record: &AuctionRecord) -> Self {
        Self::new(
            record.id,
            record.updated_at,
            DomainEvent::AuctionUpdated {
                item: record.item(),
                version: record.version,
                updated_at: record.updated_at,
            },
        )
    }

    pub fn deleted(auction_id: Uuid, occurred_at: DateTime<Utc>) -> Self {
        Self::new(auction_id, occurred_at, DomainEvent::AuctionDeleted)
    }

    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bid_status_acceptance() {
        assert!(BidStatus::Accepted.is_accepted());
        assert!(BidStatus::AcceptedBelowReserve.is_accepted());
        assert!(!BidStatus::TooLow.is_accepted());
        assert!(!BidStatus::Finished.is_accepted());
    }

    #[test]
    fn wire_format_is_tagged_by_type() {
        let auction_id = Uuid::new_v4();
        let payload = json!({
            "event_id": Uuid::new_v4(),
            "auction_id": auction_id,
            "occurred_at": "2024-05-01T12:00:00Z",
            "event": {
                "type": "BidPlaced",
                "bidder": "bob",
                "amount": 25,
                "bid_status": "Accepted"
            }
        });

        let envelope: EventEnvelope = serde_json::from_value(payload).unwrap();
        assert_eq!(envelope.auction_id, auction_id);
        assert_eq!(envelope.event_type(), "BidPlaced");
        assert_eq!(
            envelope.event,
            DomainEvent::BidPlaced {
                bidder: "bob".to_string(),
                amount: 25,
                bid_status: BidStatus::Accepted,
            }
        );
    }

    #[test]
    fn deleted_event_has_no_body() {
        let envelope = EventEnvelope::deleted(Uuid::new_v4(), Utc::now());
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["event"], json!({ "type": "AuctionDeleted" }));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let payload = json!({
            "type": "BidPlaced",
            "bidder": "bob",
            "amount": 25,
            "bid_status": "Finsihed"
        });
        assert!(serde_json::from_value::<DomainEvent>(payload).is_err());
    }
}
