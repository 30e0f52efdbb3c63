//! # rangedown
//!
//! 分段并行下载库：把远程资源切分为固定大小的字节区间，
//! 通过 HTTP Range 请求并发拉取，并直接写入预分配文件中对应的偏移。
//!
//! - `core`: 资源探测、分块计划、单块下载、调度与编排
//! - `config`: TOML 配置与命令行合并
//! - `cli`: 命令行参数
//! - `ui`: 进度条、摘要与计时
//! - `utils`: 日志初始化与参数校验

pub mod cli;
pub mod config;
pub mod core;
pub mod ui;
pub mod utils;

pub use crate::config::Config;
pub use crate::core::{DownloadError, DownloadReport, Downloader, SchedulingMode};
