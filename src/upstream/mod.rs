//! # 上游调用模块

mod client;

pub use client::{UpstreamClient, join_url};
