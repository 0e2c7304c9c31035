use clap::Parser;

mod cli;
mod config;
mod converter;
mod error;
mod stream;
mod types;

use cli::CliArgs;
use error::AppError;

fn main() -> Result<(), AppError> {
    // RUST_LOG 未指定でも進捗が見えるように info を既定にする
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    log::debug!("引数: {:?}", args);

    let options = args.convert_options().map_err(|e| {
        log::error!("引数が不正です [{:?}]: {}", e.kind(), e);
        e
    })?;

    let summary = converter::convert(&args.input_file, &args.output_file, &options).map_err(|e| {
        match e.phase() {
            Some(phase) => log::error!("変換に失敗しました [{:?}] 段階: {}, 詳細: {}", e.kind(), phase, e),
            None => log::error!("変換に失敗しました [{:?}]: {}", e.kind(), e),
        }
        e
    })?;

    println!("{}", summary.rows_written);
    Ok(())
}
