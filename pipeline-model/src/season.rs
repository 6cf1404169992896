use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MediaItemId, SeasonId};
use crate::stage::Stage;
use crate::status::StageStatus;

/// One numbered season of a TV MediaItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub item_id: MediaItemId,
    pub number: u32,
    pub current_stage: Stage,
    pub stage_status: StageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSeason {
    pub item_id: MediaItemId,
    pub number: u32,
}
