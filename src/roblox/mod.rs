//! # Roblox 用户/游戏聚合
//!
//! 对应 `roblox-api` 函数：`user` / `game` / `popular`

mod service;
mod types;

pub use service::RobloxService;
pub use types::{
    AggregatedProfile, INVENTORY_SAMPLE_SIZE, InventorySummary, POPULAR_GAMES_LIMIT,
    RobloxOperation, RobloxRequest,
};
