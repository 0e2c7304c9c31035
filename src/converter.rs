use std::fs::File;
use std::path::Path;
use csv::{Terminator, WriterBuilder};

use crate::error::{AppError, Phase};
use crate::stream::UtxoStream;
use crate::types::{CSV_HEADER, EmptyAddressPolicy, UtxoRow};

// 何件ごとに進捗を出すか
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// 0 の場合は進捗を出さない
    pub progress_interval: u64,
    pub empty_addresses: EmptyAddressPolicy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            empty_addresses: EmptyAddressPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionSummary {
    pub records_read: u64,
    pub rows_written: u64,
    pub skipped: u64,
}

/// JSON配列のUTXOダンプをCSVに変換する。進捗はinfoログに出力する
pub fn convert(
    input_path: &Path,
    output_path: &Path,
    options: &ConvertOptions,
) -> Result<ConversionSummary, AppError> {
    convert_with_progress(input_path, output_path, options, |count| {
        log::info!("進捗: {} 件", count);
    })
}

/// `convert` と同じだが、進捗の通知先を呼び出し側が渡す。
///
/// `on_progress` は `progress_interval` 件ごとに累計件数を引数として呼ばれる。
/// 途中でエラーになった場合、それまでに書き込んだ行は出力ファイルに残る。
pub fn convert_with_progress<F>(
    input_path: &Path,
    output_path: &Path,
    options: &ConvertOptions,
    mut on_progress: F,
) -> Result<ConversionSummary, AppError>
where
    F: FnMut(u64),
{
    log::info!("変換を開始します: {:?} -> {:?}", input_path, output_path);

    // 出力ファイルは入力が配列で始まることを確認してから作る
    let mut records = UtxoStream::open(input_path)?;

    let output_file = File::create(output_path).map_err(|e| {
        log::error!("出力ファイルの作成に失敗しました: {:?}", output_path);
        AppError::Io {
            phase: Phase::CreateOutput,
            path: output_path.to_path_buf(),
            source: e,
        }
    })?;
    // csv::Writer は drop 時にもフラッシュするので、エラーで抜けても書き込み済みの行は残る
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(output_file);

    writer
        .write_record(CSV_HEADER)
        .map_err(|source| AppError::Csv { phase: Phase::WriteHeader, source })?;

    let mut summary = ConversionSummary::default();
    while let Some(record) = records.next() {
        let record = record?;
        let record_index = summary.records_read;
        summary.records_read = records.records_read();
        log::debug!("レコード {} を処理中: hash={}, idx={}", record_index, record.hash, record.idx);

        match UtxoRow::from_record(record, record_index, options.empty_addresses)? {
            Some(row) => {
                writer
                    .serialize(&row)
                    .map_err(|source| AppError::Csv { phase: Phase::WriteRecord, source })?;
                summary.rows_written += 1;
            }
            None => summary.skipped += 1,
        }

        if options.progress_interval > 0 && summary.records_read % options.progress_interval == 0 {
            on_progress(summary.records_read);
        }
    }

    records.finish()?;

    writer.flush().map_err(|e| AppError::Io {
        phase: Phase::FlushOutput,
        path: output_path.to_path_buf(),
        source: e,
    })?;

    log::info!(
        "変換が完了しました。読み込み {} 件, 書き込み {} 件, スキップ {} 件",
        summary.records_read, summary.rows_written, summary.skipped
    );
    Ok(summary)
}
