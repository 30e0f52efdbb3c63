//! `task` 模块包含了与单个下载块相关的所有逻辑
//!
//! 主要包括：
//! - `chunk_manager`: 分块计划 `ChunkPlan` 与单块 `ChunkSpec`
//! - `download`: Range 请求拉取与单块下载流程
//! - `storage`: 目标文件的预分配与按偏移写入
//! - `retry`: 重试逻辑

pub mod chunk_manager;
pub mod download;
pub mod retry;
pub mod storage;

// 导出核心组件，方便外部使用
pub use chunk_manager::{ChunkPlan, ChunkSpec};
pub use download::{perform_chunk_download, ChunkFailure, ChunkSource, HttpRangeFetcher};
pub use retry::RetryStrategy;
pub use storage::OutputFile;
