use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use serde::Deserialize;

use crate::config::UtxoRecord;
use crate::error::{AppError, Phase};

// 入力バッファのサイズ。巨大なダンプでも一度に読むのはこの分だけ
const READ_BUFFER_BYTES: usize = 64 * 1024;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum StreamState {
    Streaming,
    Done,
    Failed,
}

/// 読み込み済みバイト数を数えるリーダー。エラー位置の報告に使う
struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for CountingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.position += amt as u64;
    }
}

/// トップレベルのJSON配列を要素ごとに読み出すデコーダー。
///
/// 配列全体をメモリに載せず、`next()` のたびに1要素だけをデコードする。
/// `]` に到達するか最初のエラーを返した後は常に `None` を返し、巻き戻しはできない。
pub struct UtxoStream<R> {
    reader: CountingReader<R>,
    path: PathBuf,
    state: StreamState,
    records_read: u64,
}

impl UtxoStream<BufReader<File>> {
    /// ファイルを開いて配列の開始 `[` まで読み進める
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            log::error!("入力ファイルのオープンに失敗しました: {:?}", path);
            AppError::Io {
                phase: Phase::OpenInput,
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        Self::begin(BufReader::with_capacity(READ_BUFFER_BYTES, file), path)
    }
}

impl<R: BufRead> UtxoStream<R> {
    pub fn begin(reader: R, path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let mut stream = UtxoStream {
            reader: CountingReader { inner: reader, position: 0 },
            path: path.into(),
            state: StreamState::Streaming,
            records_read: 0,
        };

        stream.skip_whitespace(Phase::ArrayStart)?;
        let offset = stream.reader.position;
        match stream.next_byte(Phase::ArrayStart)? {
            Some(b'[') => Ok(stream),
            Some(other) => Err(syntax_error(
                Phase::ArrayStart,
                offset,
                format!("JSON配列の開始 `[` が必要ですが {:?} が見つかりました", other as char),
            )),
            None => Err(syntax_error(Phase::ArrayStart, offset, "入力が空です")),
        }
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// 配列の終端 `]` の後に空白以外が無いことを確認し、読み込んだ要素数を返す
    pub fn finish(mut self) -> Result<u64, AppError> {
        if self.state != StreamState::Done {
            return Err(syntax_error(
                Phase::ArrayEnd,
                self.reader.position,
                "JSON配列の終端 `]` に到達していません",
            ));
        }

        self.skip_whitespace(Phase::ArrayEnd)?;
        let offset = self.reader.position;
        if let Some(extra) = self.peek_byte(Phase::ArrayEnd)? {
            return Err(syntax_error(
                Phase::ArrayEnd,
                offset,
                format!("JSON配列の後に余分なデータがあります: {:?}", extra as char),
            ));
        }
        Ok(self.records_read)
    }

    fn advance(&mut self) -> Result<Option<UtxoRecord>, AppError> {
        // 要素間の読み込み失敗はレコードのデコード中として扱う
        self.skip_whitespace(Phase::DecodeRecord)?;
        let offset = self.reader.position;

        if self.records_read > 0 {
            match self.next_byte(Phase::DecodeRecord)? {
                Some(b',') => self.skip_whitespace(Phase::DecodeRecord)?,
                Some(b']') => {
                    self.state = StreamState::Done;
                    return Ok(None);
                }
                Some(other) => {
                    return Err(syntax_error(
                        Phase::ArrayEnd,
                        offset,
                        format!("要素の後には `,` または `]` が必要ですが {:?} が見つかりました", other as char),
                    ));
                }
                None => return Err(unexpected_eof(offset)),
            }
        }

        let offset = self.reader.position;
        match self.peek_byte(Phase::DecodeRecord)? {
            Some(b'{') => {}
            Some(b']') if self.records_read == 0 => {
                self.reader.consume(1);
                self.state = StreamState::Done;
                return Ok(None);
            }
            Some(b']') => {
                return Err(syntax_error(Phase::ArrayEnd, offset, "`]` の直前に余分な `,` があります"));
            }
            Some(other) => {
                return Err(syntax_error(
                    Phase::DecodeRecord,
                    offset,
                    format!(
                        "レコード {} はJSONオブジェクトである必要がありますが {:?} で始まっています",
                        self.records_read, other as char
                    ),
                ));
            }
            None => return Err(unexpected_eof(offset)),
        }

        let record_index = self.records_read;
        // serde_json はオブジェクトの閉じ括弧より先を読まないので、残りは引き続きこちらで読める
        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        let record = UtxoRecord::deserialize(&mut de).map_err(|source| AppError::JsonParse {
            phase: Phase::DecodeRecord,
            record_index,
            source,
        })?;
        self.records_read += 1;
        Ok(Some(record))
    }

    fn peek_byte(&mut self, phase: Phase) -> Result<Option<u8>, AppError> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error(&self.path, phase, e)),
            }
        }
    }

    fn next_byte(&mut self, phase: Phase) -> Result<Option<u8>, AppError> {
        let byte = self.peek_byte(phase)?;
        if byte.is_some() {
            self.reader.consume(1);
        }
        Ok(byte)
    }

    fn skip_whitespace(&mut self, phase: Phase) -> Result<(), AppError> {
        loop {
            let (skipped, stop) = match self.reader.fill_buf() {
                Ok(buf) => {
                    let n = buf.iter().take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')).count();
                    (n, buf.is_empty() || n < buf.len())
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error(&self.path, phase, e)),
            };
            self.reader.consume(skipped);
            if stop {
                return Ok(());
            }
        }
    }
}

impl<R: BufRead> Iterator for UtxoStream<R> {
    type Item = Result<UtxoRecord, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != StreamState::Streaming {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.state = StreamState::Failed;
                Some(Err(e))
            }
        }
    }
}

fn io_error(path: &Path, phase: Phase, source: io::Error) -> AppError {
    AppError::Io {
        phase,
        path: path.to_path_buf(),
        source,
    }
}

fn syntax_error(phase: Phase, offset: u64, detail: impl Into<String>) -> AppError {
    AppError::JsonSyntax {
        phase,
        offset,
        detail: detail.into(),
    }
}

fn unexpected_eof(offset: u64) -> AppError {
    syntax_error(Phase::ArrayEnd, offset, "JSON配列が `]` で閉じられる前に入力が終了しました")
}
