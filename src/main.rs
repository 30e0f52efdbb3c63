use rangedown::cli;
use rangedown::core::downloader::EXIT_FATAL;
use rangedown::core::{exit_code, Downloader};
use rangedown::ui::{self, DownloadSummary, ScopedTimer};
use rangedown::utils::logger;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // 计时器在 run 返回后随作用域结束而打印总耗时
    let timer = ScopedTimer::start();
    let code = run().await;
    drop(timer);
    code
}

async fn run() -> ExitCode {
    // 解析参数和配置
    let (args, config) = match cli::Args::parse_args() {
        Ok((args, config)) => (args, config),
        Err(e) => {
            ui::print_error(&format!("参数解析失败: {}", e));
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let level = logger::level_from_verbosity(args.verbose);
    if let Err(e) = logger::init_logger(level, args.log_file.as_deref()) {
        ui::print_error(&format!("日志初始化失败: {}", e));
        return ExitCode::from(EXIT_FATAL);
    }

    log::info!("解析到的URL: {}", args.url);
    log::info!("{}", config.get_summary());
    let strict = config.strict;

    let downloader = match Downloader::new(config) {
        Ok(downloader) => downloader,
        Err(e) => {
            log::error!("创建下载器失败: {}", e);
            ui::print_error(&format!("创建下载器失败: {}", e));
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let result = downloader.download(&args.url, args.file_name.as_deref()).await;
    let code = exit_code(&result, strict);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            log::error!("下载失败: {}", e);
            ui::print_error(&format!("下载失败: {}", e));
            if e.is_fatal() {
                ui::print_error("请检查URL和配置后重试");
            } else {
                ui::print_error("请检查网络和目标目录后重试");
            }
            return ExitCode::from(code);
        }
    };

    let summary = DownloadSummary {
        file_name: report.path.display().to_string(),
        total_size: report.resource.total_size,
        written_bytes: report.scheduler.written_bytes,
        total_chunks: report.scheduler.total_chunks,
        failed_chunks: report.failures().len(),
        elapsed_time: report.elapsed,
    };
    println!("{}", summary);

    if report.is_complete() {
        ui::print_success(&format!("{} 下载完成", report.path.display()));
    } else {
        ui::print_error(&format!(
            "{} 不完整：{} 个块失败，以下区间保留为零字节：",
            report.path.display(),
            report.failures().len()
        ));
        for failure in report.failures() {
            ui::print_error(&failure.to_string());
        }
        log::warn!("下载部分失败: {} 个块", report.failures().len());
    }

    ExitCode::from(code)
}
