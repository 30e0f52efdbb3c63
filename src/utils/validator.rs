use anyhow::Result;

pub fn is_valid_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 文件名只能是单独的一段，不能带目录
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("文件名不能为空");
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        anyhow::bail!("文件名不能包含路径: {}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com/file.zip"));
        assert!(is_valid_url("http://example.com"));
        assert!(!is_valid_url("ftp://example.com/file.zip"));
        assert!(!is_valid_url("invalid-url"));
    }

    #[test]
    fn test_file_name_validation() {
        assert!(validate_file_name("file.zip").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("dir/file.zip").is_err());
        assert!(validate_file_name("dir\\file.zip").is_err());
    }
}
