use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type Address = [u8; 20];
pub type Topic = [u8; 32];
pub type TxHash = [u8; 32];

pub const ZERO_ADDRESS: Address = [0_u8; 20];

#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct HouseId(pub String);

impl HouseId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl Display for HouseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One competing House. Loaded from configuration, never mutated at runtime.
/// A missing membership asset address disables holder enumeration for the
/// House (it still appears in rankings with zero members).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HouseConfig {
    pub id: HouseId,
    pub display_name: String,
    pub asset_address: Option<Address>,
}

impl HouseConfig {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: HouseId::new(id),
            display_name: display_name.into(),
            asset_address: None,
        }
    }

    pub fn with_asset(mut self, asset_address: Address) -> Self {
        self.asset_address = Some(asset_address);
        self
    }
}

/// Immutable pipeline configuration, injected at construction so the
/// pipeline can run against synthetic House sets in tests.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub houses: Vec<HouseConfig>,
    pub staking_pool: Option<Address>,
    pub season_start_block: u64,
}

pub trait Clock {
    fn now_unix_ms(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

pub fn parse_fixed_hex<const N: usize>(value: &str) -> Option<[u8; N]> {
    let bytes = parse_hex_bytes(value)?;
    if bytes.len() != N {
        return None;
    }
    let mut out = [0_u8; N];
    out.copy_from_slice(&bytes);
    Some(out)
}

pub fn parse_hex_bytes(value: &str) -> Option<Vec<u8>> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    if trimmed.is_empty() {
        return Some(Vec::new());
    }
    hex::decode(trimmed).ok()
}

pub fn parse_hex_u64(value: &str) -> Option<u64> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    if trimmed.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(trimmed, 16).ok()
}

pub fn parse_address(value: &str) -> Option<Address> {
    parse_fixed_hex::<20>(value)
}

pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

pub fn encode_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Widens an address to the 32-byte left-padded form used in log topics.
pub fn address_topic(address: Address) -> Topic {
    let mut topic = [0_u8; 32];
    topic[12..].copy_from_slice(&address);
    topic
}

pub fn topic_address(topic: &Topic) -> Address {
    let mut address = [0_u8; 20];
    address.copy_from_slice(&topic[12..]);
    address
}

/// Reads a big-endian 256-bit word as u128, saturating when the high half
/// is populated. Balances and staked amounts never approach that range.
pub fn decode_u256_saturating(word: &[u8]) -> Option<u128> {
    if word.len() != 32 {
        return None;
    }
    if word[..16].iter().any(|byte| *byte != 0) {
        return Some(u128::MAX);
    }
    let mut low = [0_u8; 16];
    low.copy_from_slice(&word[16..]);
    Some(u128::from_be_bytes(low))
}
