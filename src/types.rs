use serde::Serialize;
use crate::config::UtxoRecord;
use crate::error::AppError;

pub const CSV_HEADER: [&str; 5] = ["hash", "idx", "block_number", "address", "value"];

/// pkey.addresses が空のレコードの扱い
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EmptyAddressPolicy {
    /// エラーとして変換を中止する
    #[default]
    Reject,
    /// pkey.address (単数形) を代わりに使う。それも無ければエラー
    AddressField,
    /// レコードを出力せずに読み飛ばす
    Skip,
    /// address 列を空文字で出力する
    Empty,
}

// フィールドの宣言順がそのままCSVの列順になる
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtxoRow {
    pub hash: String,
    pub idx: u64,
    pub block_number: u64,
    pub address: String,
    pub value: u64,
}

impl UtxoRow {
    /// 出力しないレコード (Skip) の場合は Ok(None)
    pub fn from_record(
        record: UtxoRecord,
        record_index: u64,
        policy: EmptyAddressPolicy,
    ) -> Result<Option<Self>, AppError> {
        let UtxoRecord { hash, idx, block_number, pub_key_script, value } = record;

        let address = match pub_key_script.addresses.into_iter().next() {
            Some(first) => first,
            None => match policy {
                EmptyAddressPolicy::Reject => {
                    return Err(AppError::EmptyAddresses { record_index, hash });
                }
                EmptyAddressPolicy::AddressField => match pub_key_script.address {
                    Some(address) => address,
                    None => return Err(AppError::EmptyAddresses { record_index, hash }),
                },
                EmptyAddressPolicy::Skip => {
                    log::warn!("addresses が空のためレコード {} (hash={}) を読み飛ばします。", record_index, hash);
                    return Ok(None);
                }
                EmptyAddressPolicy::Empty => String::new(),
            },
        };

        Ok(Some(UtxoRow { hash, idx, block_number, address, value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScriptPubKey;
    use crate::error::ErrorKind;

    fn record(addresses: &[&str], address: Option<&str>) -> UtxoRecord {
        UtxoRecord {
            hash: "ab12".to_string(),
            idx: 1,
            block_number: 700000,
            pub_key_script: ScriptPubKey {
                address: address.map(str::to_string),
                addresses: addresses.iter().map(|a| a.to_string()).collect(),
                ..Default::default()
            },
            value: 5000,
        }
    }

    #[test]
    fn takes_first_address_only() {
        let row = UtxoRow::from_record(record(&["1A", "1B"], Some("3C")), 0, EmptyAddressPolicy::Reject)
            .unwrap()
            .unwrap();
        assert_eq!(row.address, "1A");
        assert_eq!(row.hash, "ab12");
        assert_eq!(row.idx, 1);
        assert_eq!(row.block_number, 700000);
        assert_eq!(row.value, 5000);
    }

    #[test]
    fn reject_reports_record_index() {
        let err = UtxoRow::from_record(record(&[], Some("3C")), 9, EmptyAddressPolicy::Reject).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataShape);
        match err {
            AppError::EmptyAddresses { record_index, hash } => {
                assert_eq!(record_index, 9);
                assert_eq!(hash, "ab12");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn address_field_fallback() {
        let row = UtxoRow::from_record(record(&[], Some("3C")), 0, EmptyAddressPolicy::AddressField)
            .unwrap()
            .unwrap();
        assert_eq!(row.address, "3C");

        let err = UtxoRow::from_record(record(&[], None), 0, EmptyAddressPolicy::AddressField).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataShape);
    }

    #[test]
    fn skip_and_empty_policies() {
        assert!(UtxoRow::from_record(record(&[], None), 0, EmptyAddressPolicy::Skip)
            .unwrap()
            .is_none());

        let row = UtxoRow::from_record(record(&[], None), 0, EmptyAddressPolicy::Empty)
            .unwrap()
            .unwrap();
        assert_eq!(row.address, "");
    }
}
