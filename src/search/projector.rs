/// 이벤트를 검색 레코드에 반영하는 순수 함수
/// 같은 이벤트를 여러 번, 어떤 순서로 받아도 레코드가 같은 값으로 수렴해야 한다.
/// - 생성: 비어 있는 필드만 채움
/// - 수정: version이 더 클 때만 반영
/// - 삭제: 툼스톤, 이후 이벤트 무시
/// - 입찰: 수락된 입찰이고 현재 최고가보다 클 때만 반영, 종료 후에는 무시
/// - 종료: 최초 1회만 반영 (종단 상태)
use crate::auction::events::{DomainEvent, EventEnvelope};
use crate::search::model::{AuctionStatus, SearchRecord};
use crate::search::ProjectionError;

/// 반영 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Unchanged,
    Save(SearchRecord),
}

pub fn project(
    current: Option<SearchRecord>,
    envelope: &EventEnvelope,
) -> Result<Projection, ProjectionError> {
    validate(envelope)?;

    let (mut record, existed) = match current {
        Some(record) => {
            if record.id != envelope.auction_id {
                return Err(malformed(envelope, "레코드 id와 이벤트 auction_id 불일치"));
            }
            (record, true)
        }
        None => (SearchRecord::placeholder(envelope.auction_id), false),
    };

    if record.is_deleted() {
        return Ok(Projection::Unchanged);
    }

    let changed = match &envelope.event {
        DomainEvent::AuctionCreated {
            seller,
            item,
            reserve_price,
            auction_end,
            created_at,
        } => {
            let mut changed = false;
            changed |= fill(&mut record.seller, seller.clone());
            changed |= fill(&mut record.reserve_price, *reserve_price);
            changed |= fill(&mut record.created_at, *created_at);
            changed |= fill(&mut record.auction_end, *auction_end);
            if record.version < 1 {
                record.item = Some(item.clone());
                record.version = 1;
                changed = true;
            }
            changed |= fill(&mut record.updated_at, *created_at);
            if record.needs_backfill {
                record.needs_backfill = false;
                changed = true;
            }
            changed
        }
        DomainEvent::AuctionUpdated {
            item,
            version,
            updated_at,
        } => {
            if *version > record.version {
                record.item = Some(item.clone());
                record.version = *version;
                record.updated_at = Some(*updated_at);
                true
            } else {
                false
            }
        }
        DomainEvent::AuctionDeleted => {
            record.deleted_at = Some(envelope.occurred_at);
            record.needs_backfill = false;
            true
        }
        DomainEvent::BidPlaced {
            amount, bid_status, ..
        } => {
            let outbids = record.current_high_bid.map_or(true, |high| *amount > high);
            if !record.status.is_terminal() && bid_status.is_accepted() && outbids {
                record.current_high_bid = Some(*amount);
                true
            } else {
                false
            }
        }
        DomainEvent::AuctionFinished {
            item_sold,
            winner,
            amount,
        } => {
            if record.status.is_terminal() {
                false
            } else {
                record.status = AuctionStatus::Finished;
                if *item_sold {
                    record.winner = winner.clone();
                    record.sold_amount = *amount;
                    record.auction_end = Some(envelope.occurred_at);
                }
                true
            }
        }
    };

    if changed || !existed {
        Ok(Projection::Save(record))
    } else {
        Ok(Projection::Unchanged)
    }
}

fn validate(envelope: &EventEnvelope) -> Result<(), ProjectionError> {
    match &envelope.event {
        DomainEvent::BidPlaced { amount, .. } if *amount < 0 => {
            Err(malformed(envelope, "음수 입찰 금액"))
        }
        DomainEvent::AuctionFinished {
            item_sold: true,
            winner,
            amount,
        } if winner.is_none() || amount.is_none() => {
            Err(malformed(envelope, "낙찰 이벤트에 낙찰자 또는 금액이 없음"))
        }
        DomainEvent::AuctionUpdated { version, .. } if *version < 1 => {
            Err(malformed(envelope, "version은 1 이상이어야 함"))
        }
        _ => Ok(()),
    }
}

fn fill<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_none() {
        *slot = Some(value);
        true
    } else {
        false
    }
}

fn malformed(envelope: &EventEnvelope, reason: &str) -> ProjectionError {
    ProjectionError::Malformed {
        auction_id: envelope.auction_id,
        reason: reason.to_string(),
    }
}

// endregion: --- Tests
