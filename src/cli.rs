use clap::Parser;
use std::path::PathBuf;
use crate::converter::{ConvertOptions, DEFAULT_PROGRESS_INTERVAL};
use crate::error::AppError;
use crate::types::EmptyAddressPolicy;

/// UTXOダンプ (JSON配列) をCSVに変換する。
///
/// 成功すると書き込んだ行数を標準出力に出す。進捗とエラーはログ (標準エラー) に出る。
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    /// UTXOダンプ (JSON配列) のパス
    #[clap(short, long, value_parser, default_value = "utxodump.json")]
    pub input_file: PathBuf,

    /// 出力するCSVファイルのパス (既存のファイルは上書きされる)
    #[clap(short, long, value_parser, default_value = "utxodump.csv")]
    pub output_file: PathBuf,

    /// 何件ごとに進捗を表示するか (0 で表示しない)
    #[clap(long, value_parser, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,

    /// pkey.addresses が空のレコードの扱い ("reject", "address-field", "skip", "empty")
    #[clap(long, value_parser, default_value = "reject")]
    pub on_empty_addresses: String,
}

impl CliArgs {
    pub fn convert_options(&self) -> Result<ConvertOptions, AppError> {
        Ok(ConvertOptions {
            progress_interval: self.progress_interval,
            empty_addresses: parse_empty_address_policy(&self.on_empty_addresses)?,
        })
    }
}

pub fn parse_empty_address_policy(policy_str: &str) -> Result<EmptyAddressPolicy, AppError> {
    match policy_str.to_lowercase().as_str() {
        "reject" => Ok(EmptyAddressPolicy::Reject),
        "address-field" | "address" => Ok(EmptyAddressPolicy::AddressField),
        "skip" => Ok(EmptyAddressPolicy::Skip),
        "empty" => Ok(EmptyAddressPolicy::Empty),
        s => Err(AppError::InputValidation(format!("無効なポリシーが指定されました: {}", s))),
    }
}
