use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UtxoRecord {
    pub hash: String,
    pub idx: u64,
    #[serde(rename = "bn", alias = "blockNumber")]
    pub block_number: u64,
    #[serde(rename = "pkey", alias = "pubKeyScript")]
    pub pub_key_script: ScriptPubKey,
    #[serde(rename = "val", alias = "value")]
    pub value: u64,
}

// 出力に使うのは addresses と address のみ
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPubKey {
    #[serde(default)]
    pub asm: Option<String>,
    #[serde(default)]
    pub hex: Option<String>,
    #[serde(default)]
    pub req_sigs: Option<i32>,
    #[serde(default, rename = "type")]
    pub script_type: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub addresses: Vec<String>, // 旧形式 (Bitcoin Coreでは廃止済み)
}
