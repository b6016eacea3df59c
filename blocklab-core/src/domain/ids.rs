use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;

/// Order block identifier: `OB{base_pdi}/{YYYY.M.D/HH:MM:SS}{L|S}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(base_candle_pdi: usize, base_time: NaiveDateTime, side: Side) -> Self {
        let suffix = match side {
            Side::Long => 'L',
            Side::Short => 'S',
        };
        Self(format!(
            "OB{base_candle_pdi}/{}{suffix}",
            base_time.format("%Y.%-m.%-d/%H:%M:%S")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic parameter-set hash (BLAKE3 over canonical JSON).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamsHash(pub String);

impl ParamsHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, enough to tell sweep rows apart.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ParamsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic dataset hash (content hash of a candle series).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn zone_id_format() {
        let time = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(ZoneId::new(42, time, Side::Long).as_str(), "OB42/2024.3.7/09:05:00L");
        assert_eq!(ZoneId::new(7, time, Side::Short).as_str(), "OB7/2024.3.7/09:05:00S");
    }

    #[test]
    fn params_hash_is_deterministic() {
        let a = ParamsHash::from_bytes(b"window=3");
        let b = ParamsHash::from_bytes(b"window=3");
        let c = ParamsHash::from_bytes(b"window=4");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.short().len(), 12);
    }
}
