use std::fmt;
use std::num::NonZeroU64;

/// 单个下载块：资源中一段连续的字节区间 `[offset, offset + length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    pub index: usize,
    pub offset: u64,
    pub length: u64,
}

impl ChunkSpec {
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// 区间最后一个字节（闭区间）；空区间没有最后一个字节，返回 `offset` 前一位（不小于 0）
    pub fn last_byte(&self) -> u64 {
        (self.offset + self.length).saturating_sub(1)
    }

    /// HTTP Range 请求头的值
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.offset, self.last_byte())
    }
}

impl fmt::Display for ChunkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "块 #{} [{}] (0 字节)", self.index, self.offset);
        }
        write!(
            f,
            "块 #{} [{}-{}] ({} 字节)",
            self.index,
            self.offset,
            self.last_byte(),
            self.length
        )
    }
}

/// 分块计划
///
/// 按固定块大小切分 `[0, total_size)`，块之间无空隙、无重叠，按偏移升序排列；
/// 除最后一块外长度都等于块大小，最后一块取余数。
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    chunks: Vec<ChunkSpec>,
    total_size: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    pub fn new(total_size: u64, chunk_size: NonZeroU64) -> Self {
        let chunk_size = chunk_size.get();
        // 向上取整；整除时不会多出一个长度为 0 的尾块
        let num_chunks = total_size.div_ceil(chunk_size);

        let chunks = (0..num_chunks)
            .map(|i| {
                let offset = i * chunk_size;
                ChunkSpec {
                    index: i as usize,
                    offset,
                    length: chunk_size.min(total_size - offset),
                }
            })
            .collect();

        Self {
            chunks,
            total_size,
            chunk_size,
        }
    }

    pub fn chunks(&self) -> &[ChunkSpec] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// 按最大并发数把块划分为若干批次（波次），每批最多 `max_concurrency` 块
    pub fn waves(&self, max_concurrency: usize) -> std::slice::Chunks<'_, ChunkSpec> {
        self.chunks.chunks(max_concurrency.max(1))
    }

    pub fn wave_count(&self, max_concurrency: usize) -> usize {
        self.chunks.len().div_ceil(max_concurrency.max(1))
    }
}
