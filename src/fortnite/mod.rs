//! # Fortnite 玩家统计聚合
//!
//! 对应 `fortnite-api` 函数：`stats` / `shop` / `cosmetics`

mod service;
mod types;

pub use service::FortniteService;
pub use types::{FortniteOperation, FortniteRequest};
