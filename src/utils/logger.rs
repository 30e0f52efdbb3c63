use chrono::Local; // 用于获取本地时间
use log::LevelFilter; // 用于设置日志级别
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// 根据 `-v` 的次数确定日志级别
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn format_line(level: log::Level, message: &std::fmt::Arguments<'_>) -> String {
    format!(
        "{} [{}] - {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level,
        message
    )
}

/// 初始化全局日志
///
/// 设置了 `RUST_LOG` 时以环境变量为准；`log_file` 为 `Some` 时追加写入该文件，否则写到标准错误。
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> Result<(), std::io::Error> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format(|buf, record| writeln!(buf, "{}", format_line(record.level(), record.args())));

    if let Some(path) = log_file {
        // 确保日志目录存在
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // 重复初始化（例如测试中）不算错误
    if builder.try_init().is_err() {
        log::debug!("日志已经初始化过");
    }
    Ok(())
}
