use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: Uuid,

    #[validate(length(min = 1))]
    pub name: String,

    pub country: String,

    #[validate(length(min = 1))]
    pub region: String,

    pub region_id: Uuid,
}

impl City {
    pub fn new(id: Uuid, name: String, country: String, region: String, region_id: Uuid) -> Self {
        Self {
            id,
            name,
            country,
            region,
            region_id,
        }
    }

    pub fn in_region(&self, region_id: Uuid) -> bool {
        self.region_id == region_id
    }

    /// Apply an upstream update. The region id of a known city is kept.
    pub fn merge_update(&mut self, update: City) {
        self.name = update.name;
        self.country = update.country;
        self.region = update.region;
    }
}
