use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 変換処理のどの段階で失敗したかを表す
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    OpenInput,
    ArrayStart,
    CreateOutput,
    WriteHeader,
    DecodeRecord,
    WriteRecord,
    ArrayEnd,
    FlushOutput,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::OpenInput => "入力ファイルのオープン",
            Phase::ArrayStart => "JSON配列の開始読み込み",
            Phase::CreateOutput => "出力ファイルの作成",
            Phase::WriteHeader => "CSVヘッダーの書き込み",
            Phase::DecodeRecord => "レコードのデコード",
            Phase::WriteRecord => "レコードの書き込み",
            Phase::ArrayEnd => "JSON配列の終端読み込み",
            Phase::FlushOutput => "出力ファイルのフラッシュ",
        };
        f.write_str(name)
    }
}

/// エラーの大分類
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    DataShape,
    InvalidArgument,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/Oエラー ({phase}) ファイル: {path:?}, 詳細: {source}")]
    Io {
        phase: Phase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV書き込みエラー ({phase}): {source}")]
    Csv {
        phase: Phase,
        #[source]
        source: csv::Error,
    },

    #[error("JSONパースエラー ({phase}) レコード番号 {record_index}: {source}")]
    JsonParse {
        phase: Phase,
        record_index: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON構造エラー ({phase}) オフセット {offset}: {detail}")]
    JsonSyntax {
        phase: Phase,
        offset: u64,
        detail: String,
    },

    #[error("データ形状エラー (レコード番号 {record_index}, hash={hash}): pkey.addresses が空です")]
    EmptyAddresses { record_index: u64, hash: String },

    #[error("入力検証エラー: {0}")]
    InputValidation(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Io { .. } | AppError::Csv { .. } => ErrorKind::Io,
            AppError::JsonParse { .. } | AppError::JsonSyntax { .. } => ErrorKind::Parse,
            AppError::EmptyAddresses { .. } => ErrorKind::DataShape,
            AppError::InputValidation(_) => ErrorKind::InvalidArgument,
        }
    }

    /// 失敗した段階。引数エラーなど変換前のものは None
    pub fn phase(&self) -> Option<Phase> {
        match self {
            AppError::Io { phase, .. }
            | AppError::Csv { phase, .. }
            | AppError::JsonParse { phase, .. }
            | AppError::JsonSyntax { phase, .. } => Some(*phase),
            AppError::EmptyAddresses { .. } => Some(Phase::DecodeRecord),
            AppError::InputValidation(_) => None,
        }
    }
}
