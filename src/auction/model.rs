use crate::error::AuctionError;
use chrono::{DateTime, Datelike, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// 자동차 연식 하한 (최초의 자동차)
const MIN_YEAR: i32 = 1886;

/// 인증된 사용자 식별자
/// 인증 자체는 게이트웨이 몫이며, 여기서는 이미 검증된 이름만 전달받는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

// 상품 속성
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub mileage: i32,
    pub image_url: Option<String>,
}

// 경매 모델 (조회 응답으로도 그대로 사용)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuctionRecord {
    pub id: Uuid,
    pub seller: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub mileage: i32,
    pub image_url: Option<String>,
    pub reserve_price: i64,
    pub auction_end: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuctionRecord {
    pub fn item(&self) -> ItemAttributes {
        ItemAttributes {
            make: self.make.clone(),
            model: self.model.clone(),
            year: self.year,
            color: self.color.clone(),
            mileage: self.mileage,
            image_url: self.image_url.clone(),
        }
    }

    /// 판매자 본인 여부 확인
    pub fn ensure_owner(&self, identity: &Identity) -> Result<(), AuctionError> {
        if self.seller == identity.name() {
            Ok(())
        } else {
            Err(AuctionError::Forbidden)
        }
    }
}

/// 경매 생성 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuction {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub mileage: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub reserve_price: i64,
    pub auction_end: DateTime<Utc>,
}

impl CreateAuction {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), AuctionError> {
        require_text("make", &self.make)?;
        require_text("model", &self.model)?;
        require_text("color", &self.color)?;
        validate_year(self.year, now)?;
        validate_mileage(self.mileage)?;
        if self.reserve_price < 0 {
            return Err(AuctionError::Validation(
                "reserve_price는 0 이상이어야 합니다.".to_string(),
            ));
        }
        if self.auction_end <= now {
            return Err(AuctionError::Validation(
                "auction_end는 현재 시각 이후여야 합니다.".to_string(),
            ));
        }
        Ok(())
    }

    /// 새 레코드 생성 (id 부여, version 1)
    /// 시각은 Postgres 정밀도(마이크로초)에 맞춘다.
    pub fn into_record(self, seller: &Identity, now: DateTime<Utc>) -> AuctionRecord {
        let now = now.trunc_subsecs(6);
        AuctionRecord {
            id: Uuid::new_v4(),
            seller: seller.name().to_string(),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            year: self.year,
            color: self.color.trim().to_string(),
            mileage: self.mileage,
            image_url: self.image_url,
            reserve_price: self.reserve_price,
            auction_end: self.auction_end.trunc_subsecs(6),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 경매 수정 요청
/// None, 빈 문자열, 0은 "변경 없음"으로 취급한다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAuction {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub mileage: Option<i32>,
}

impl UpdateAuction {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), AuctionError> {
        if let Some(year) = set_number(self.year) {
            validate_year(year, now)?;
        }
        if let Some(mileage) = set_number(self.mileage) {
            validate_mileage(mileage)?;
        }
        Ok(())
    }

    /// 지정된 필드만 레코드에 반영. 실제로 바뀐 값이 있으면 true
    pub fn apply_to(&self, record: &mut AuctionRecord) -> bool {
        let before = record.item();

        if let Some(make) = set_text(&self.make) {
            record.make = make;
        }
        if let Some(model) = set_text(&self.model) {
            record.model = model;
        }
        if let Some(year) = set_number(self.year) {
            record.year = year;
        }
        if let Some(color) = set_text(&self.color) {
            record.color = color;
        }
        if let Some(mileage) = set_number(self.mileage) {
            record.mileage = mileage;
        }

        before != record.item()
    }
}

fn set_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn set_number(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v != 0)
}

fn require_text(field: &str, value: &str) -> Result<(), AuctionError> {
    if value.trim().is_empty() {
        return Err(AuctionError::Validation(format!(
            "{field}는 비어 있을 수 없습니다."
        )));
    }
    Ok(())
}

fn validate_year(year: i32, now: DateTime<Utc>) -> Result<(), AuctionError> {
    let max_year = now.year() + 1;
    if !(MIN_YEAR..=max_year).contains(&year) {
        return Err(AuctionError::Validation(format!(
            "year는 {MIN_YEAR}..={max_year} 범위여야 합니다: {year}"
        )));
    }
    Ok(())
}

fn validate_mileage(mileage: i32) -> Result<(), AuctionError> {
    if mileage < 0 {
        return Err(AuctionError::Validation(
            "mileage는 0 이상이어야 합니다.".to_string(),
        ));
    }
    Ok(())
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_request(now: DateTime<Utc>) -> CreateAuction {
        CreateAuction {
            make: "Ford".to_string(),
            model: "GT".to_string(),
            year: 2020,
            color: "White".to_string(),
            mileage: 50_000,
            image_url: None,
            reserve_price: 20_000,
            auction_end: now + Duration::days(7),
        }
    }

    #[test]
    fn create_validation_accepts_well_formed_request() {
        let now = Utc::now();
        assert!(create_request(now).validate(now).is_ok());
    }

    #[test]
    fn create_validation_rejects_bad_fields() {
        let now = Utc::now();

        let mut blank_make = create_request(now);
        blank_make.make = "  ".to_string();
        assert!(matches!(
            blank_make.validate(now),
            Err(AuctionError::Validation(_))
        ));

        let mut negative_mileage = create_request(now);
        negative_mileage.mileage = -1;
        assert!(negative_mileage.validate(now).is_err());

        let mut past_end = create_request(now);
        past_end.auction_end = now - Duration::minutes(1);
        assert!(past_end.validate(now).is_err());

        let mut future_year = create_request(now);
        future_year.year = now.year() + 5;
        assert!(future_year.validate(now).is_err());
    }

    #[test]
    fn new_record_is_owned_by_creator() {
        let now = Utc::now();
        let record = create_request(now).into_record(&Identity::new("alice"), now);
        assert_eq!(record.seller, "alice");
        assert_eq!(record.version, 1);
        assert!(record.ensure_owner(&Identity::new("alice")).is_ok());
        assert!(matches!(
            record.ensure_owner(&Identity::new("bob")),
            Err(AuctionError::Forbidden)
        ));
    }

    #[test]
    fn patch_applies_only_provided_fields() {
        let now = Utc::now();
        let mut record = create_request(now).into_record(&Identity::new("alice"), now);

        let patch = UpdateAuction {
            color: Some("Red".to_string()),
            year: Some(0),
            mileage: None,
            make: Some("".to_string()),
            model: None,
        };

        assert!(patch.apply_to(&mut record));
        assert_eq!(record.color, "Red");
        assert_eq!(record.year, 2020);
        assert_eq!(record.mileage, 50_000);
        assert_eq!(record.make, "Ford");
        assert_eq!(record.model, "GT");
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let now = Utc::now();
        let mut record = create_request(now).into_record(&Identity::new("alice"), now);
        let original = record.clone();

        assert!(!UpdateAuction::default().apply_to(&mut record));
        assert_eq!(record, original);
    }

    #[test]
    fn patch_validation_ignores_zero_sentinels() {
        let now = Utc::now();
        let patch = UpdateAuction {
            year: Some(0),
            mileage: Some(0),
            ..Default::default()
        };
        assert!(patch.validate(now).is_ok());

        let bad = UpdateAuction {
            mileage: Some(-10),
            ..Default::default()
        };
        assert!(bad.validate(now).is_err());
    }
}
// endregion: --- Tests
