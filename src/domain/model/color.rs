use super::ColorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Color {
    pub id: ColorId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Color {
    pub const ENTITY: &'static str = "color";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewColor {
    pub name: String,
}

impl NewColor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
