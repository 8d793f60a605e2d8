// region:    --- Auctions

/// 경매 목록 조회 (since 이후 수정분만)
pub const GET_AUCTIONS_SINCE: &str = r#"
    SELECT id, seller, make, model, year, color, mileage, image_url, reserve_price,
           auction_end, version, created_at, updated_at
    FROM auctions
    WHERE ($1::timestamptz IS NULL OR updated_at > $1)
    ORDER BY make, model, id
"#;

/// 경매 조회
pub const GET_AUCTION: &str = r#"
    SELECT id, seller, make, model, year, color, mileage, image_url, reserve_price,
           auction_end, version, created_at, updated_at
    FROM auctions
    WHERE id = $1
"#;

/// 경매 조회 (행 잠금)
pub const GET_AUCTION_FOR_UPDATE: &str = r#"
    SELECT id, seller, make, model, year, color, mileage, image_url, reserve_price,
           auction_end, version, created_at, updated_at
    FROM auctions
    WHERE id = $1
    FOR UPDATE
"#;

/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (id, seller, make, model, year, color, mileage, image_url,
                          reserve_price, auction_end, version, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
"#;

/// 경매 수정 (version 증가)
pub const UPDATE_AUCTION: &str = r#"
    UPDATE auctions
    SET make = $2, model = $3, year = $4, color = $5, mileage = $6,
        version = version + 1, updated_at = $7
    WHERE id = $1
    RETURNING id, seller, make, model, year, color, mileage, image_url, reserve_price,
              auction_end, version, created_at, updated_at
"#;

/// 경매 삭제
pub const DELETE_AUCTION: &str = "DELETE FROM auctions WHERE id = $1";

// endregion: --- Auctions

// region:    --- Outbox

/// 아웃박스 적재
pub const INSERT_OUTBOX_EVENT: &str = r#"
    INSERT INTO outbox_events (event_id, auction_id, event_type, payload, occurred_at)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// 발행 대기 이벤트 조회
/// 같은 경매의 앞선 미발행 이벤트가 있으면 건너뛰어 경매별 순서를 유지한다.
pub const GET_PENDING_OUTBOX_EVENTS: &str = r#"
    SELECT o.id, o.event_id, o.auction_id, o.event_type, o.payload, o.attempts
    FROM outbox_events o
    WHERE o.published_at IS NULL
      AND o.next_attempt_at <= NOW()
      AND NOT EXISTS (
          SELECT 1 FROM outbox_events e
          WHERE e.auction_id = o.auction_id
            AND e.published_at IS NULL
            AND e.id < o.id
      )
    ORDER BY o.id
    LIMIT $1
    FOR UPDATE SKIP LOCKED
"#;

/// 발행 완료 처리
pub const MARK_OUTBOX_PUBLISHED: &str =
    "UPDATE outbox_events SET published_at = NOW(), attempts = attempts + 1, last_error = NULL WHERE id = $1";

/// 발행 실패 처리 (재시도 시각 연기)
pub const MARK_OUTBOX_FAILED: &str =
    "UPDATE outbox_events SET attempts = $2, last_error = $3, next_attempt_at = $4 WHERE id = $1";

/// 발행 완료 이벤트 정리
pub const PURGE_PUBLISHED_OUTBOX_EVENTS: &str =
    "DELETE FROM outbox_events WHERE published_at IS NOT NULL AND published_at < $1";

/// 미발행 이벤트 수
pub const COUNT_PENDING_OUTBOX_EVENTS: &str =
    "SELECT COUNT(*) FROM outbox_events WHERE published_at IS NULL";

// endregion: --- Outbox

// region:    --- Search

/// 검색 레코드 조회
pub const GET_SEARCH_ITEM: &str = r#"
    SELECT id, seller, make, model, year, color, mileage, image_url, reserve_price,
           created_at, updated_at, auction_end, version, current_high_bid, status,
           winner, sold_amount, needs_backfill, deleted_at
    FROM search_items
    WHERE id = $1
"#;

/// 검색 레코드 저장 (전체 필드 덮어쓰기)
pub const UPSERT_SEARCH_ITEM: &str = r#"
    INSERT INTO search_items (id, seller, make, model, year, color, mileage, image_url,
                              reserve_price, created_at, updated_at, auction_end, version,
                              current_high_bid, status, winner, sold_amount, needs_backfill,
                              deleted_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
    ON CONFLICT (id) DO UPDATE SET
        seller = EXCLUDED.seller,
        make = EXCLUDED.make,
        model = EXCLUDED.model,
        year = EXCLUDED.year,
        color = EXCLUDED.color,
        mileage = EXCLUDED.mileage,
        image_url = EXCLUDED.image_url,
        reserve_price = EXCLUDED.reserve_price,
        created_at = EXCLUDED.created_at,
        updated_at = EXCLUDED.updated_at,
        auction_end = EXCLUDED.auction_end,
        version = EXCLUDED.version,
        current_high_bid = EXCLUDED.current_high_bid,
        status = EXCLUDED.status,
        winner = EXCLUDED.winner,
        sold_amount = EXCLUDED.sold_amount,
        needs_backfill = EXCLUDED.needs_backfill,
        deleted_at = EXCLUDED.deleted_at
"#;

/// 경매 단위 트랜잭션 잠금
pub const LOCK_AUCTION_KEY: &str = "SELECT pg_advisory_xact_lock($1)";

/// 검색 (삭제된 레코드 제외)
pub const SEARCH_ITEMS: &str = r#"
    SELECT id, seller, make, model, year, color, mileage, image_url, reserve_price,
           created_at, updated_at, auction_end, version, current_high_bid, status,
           winner, sold_amount, needs_backfill, deleted_at
    FROM search_items
    WHERE deleted_at IS NULL
      AND ($1::text IS NULL OR status = $1)
      AND ($2::text IS NULL OR seller = $2)
      AND ($3::text IS NULL OR winner = $3)
    ORDER BY auction_end NULLS LAST, id
    LIMIT $4
"#;

/// 백필 대상 조회
pub const GET_BACKFILL_CANDIDATES: &str =
    "SELECT id FROM search_items WHERE needs_backfill AND deleted_at IS NULL ORDER BY id LIMIT $1";

/// 마지막 수정 시각
pub const GET_LAST_UPDATED: &str = "SELECT MAX(updated_at) FROM search_items";

/// 처리 불가 메시지 보관
pub const INSERT_PARKED_EVENT: &str = r#"
    INSERT INTO parked_events (event_id, auction_id, payload, error)
    VALUES ($1, $2, $3, $4)
"#;

// endregion: --- Search
