use crate::auction::model::ItemAttributes;
use crate::search::ProjectionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 검색 레코드 상태
/// Active → Finished 단방향, Finished는 종단 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Active,
    Finished,
}

impl AuctionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "finished" => Ok(Self::Finished),
            other => Err(ProjectionError::InvalidStatus(other.to_string())),
        }
    }
}

/// 검색용 비정규화 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: Uuid,
    pub seller: Option<String>,
    pub item: Option<ItemAttributes>,
    pub reserve_price: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub auction_end: Option<DateTime<Utc>>,
    /// 마지막으로 반영한 쓰기 측 version (0 = 아직 없음)
    pub version: i64,
    pub current_high_bid: Option<i64>,
    pub status: AuctionStatus,
    pub winner: Option<String>,
    pub sold_amount: Option<i64>,
    pub needs_backfill: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SearchRecord {
    /// 생성 이벤트 없이 먼저 도착한 이벤트를 받기 위한 빈 레코드
    pub fn placeholder(id: Uuid) -> Self {
        Self {
            id,
            seller: None,
            item: None,
            reserve_price: None,
            created_at: None,
            updated_at: None,
            auction_end: None,
            version: 0,
            current_high_bid: None,
            status: AuctionStatus::Active,
            winner: None,
            sold_amount: None,
            needs_backfill: true,
            deleted_at: None,
        }
    }

    pub fn is_sold(&self) -> bool {
        self.status.is_terminal() && self.winner.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// search_items 테이블 행
#[derive(Debug, sqlx::FromRow)]
pub struct SearchRow {
    pub id: Uuid,
    pub seller: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub mileage: Option<i32>,
    pub image_url: Option<String>,
    pub reserve_price: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub auction_end: Option<DateTime<Utc>>,
    pub version: i64,
    pub current_high_bid: Option<i64>,
    pub status: String,
    pub winner: Option<String>,
    pub sold_amount: Option<i64>,
    pub needs_backfill: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<SearchRow> for SearchRecord {
    type Error = ProjectionError;

    fn try_from(row: SearchRow) -> Result<Self, Self::Error> {
        let status = row.status.parse()?;
        let item = match (row.make, row.model, row.year, row.color, row.mileage) {
            (Some(make), Some(model), Some(year), Some(color), Some(mileage)) => {
                Some(ItemAttributes {
                    make,
                    model,
                    year,
                    color,
                    mileage,
                    image_url: row.image_url,
                })
            }
            _ => None,
        };

        Ok(Self {
            id: row.id,
            seller: row.seller,
            item,
            reserve_price: row.reserve_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
            auction_end: row.auction_end,
            version: row.version,
            current_high_bid: row.current_high_bid,
            status,
            winner: row.winner,
            sold_amount: row.sold_amount,
            needs_backfill: row.needs_backfill,
            deleted_at: row.deleted_at,
        })
    }
}
