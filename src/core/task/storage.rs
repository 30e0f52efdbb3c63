use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::core::error::{DownloadError, DownloadResult, ErrContext};

/// 下载目标文件
///
/// 创建时即预分配到资源总大小；之后各个任务只在互不重叠的区间上写入，
/// 每次写入都打开自己的文件句柄，不共享游标，因此无需对文件加锁。
#[derive(Debug, Clone)]
pub struct OutputFile {
    path: PathBuf,
    len: u64,
}

impl OutputFile {
    /// 创建（或覆盖）目标文件并设置为 `len` 字节
    pub async fn allocate(path: impl AsRef<Path>, len: u64) -> DownloadResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context(format!("无法创建下载目录 {}", parent.display()))?;
        }

        let file = fs::File::create(&path)
            .await
            .context(format!("无法创建文件 {}", path.display()))?;
        file.set_len(len)
            .await
            .context(format!("无法为 {} 预分配 {} 字节", path.display(), len))?;
        file.sync_all()
            .await
            .context(format!("无法同步文件 {}", path.display()))?;

        log::debug!("已预分配文件 {} ({} 字节)", path.display(), len);
        Ok(Self { path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 在绝对偏移 `offset` 处写入一块数据，只触及 `[offset, offset + data.len())`
    pub async fn write_chunk(&self, offset: u64, data: &[u8]) -> DownloadResult<()> {
        let end = offset + data.len() as u64;
        if end > self.len {
            return Err(DownloadError::Storage {
                context: format!(
                    "写入区间 [{}, {}) 超出文件 {} 的长度 {}",
                    offset,
                    end,
                    self.path.display(),
                    self.len
                ),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "write past end"),
            });
        }

        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .context(format!("无法打开文件 {}", self.path.display()))?;

        file.seek(SeekFrom::Start(offset))
            .await
            .context(format!("无法定位到偏移 {}", offset))?;
        file.write_all(data)
            .await
            .context(format!("写入偏移 {} 失败", offset))?;
        // tokio 的文件写入在后台线程完成，flush 之后才算真正落盘
        file.flush()
            .await
            .context(format!("刷新偏移 {} 的写入失败", offset))?;

        Ok(())
    }
}
