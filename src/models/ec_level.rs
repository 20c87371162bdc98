use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EcLevel {
    /// Low (~7% recovery capacity)
    #[default]
    L,
    /// Medium (~15% recovery capacity)
    M,
    /// Quartile (~25% recovery capacity)
    Q,
    /// High (~30% recovery capacity)
    H,
}

impl EcLevel {
    /// All levels, lowest redundancy first
    pub const ALL: [EcLevel; 4] = [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H];

    /// Single-letter name
    pub fn as_str(&self) -> &'static str {
        match self {
            EcLevel::L => "L",
            EcLevel::M => "M",
            EcLevel::Q => "Q",
            EcLevel::H => "H",
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EcLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "L" | "l" => Ok(EcLevel::L),
            "M" | "m" => Ok(EcLevel::M),
            "Q" | "q" => Ok(EcLevel::Q),
            "H" | "h" => Ok(EcLevel::H),
            other => Err(format!("unknown error correction level: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("L".parse::<EcLevel>(), Ok(EcLevel::L));
        assert_eq!("q".parse::<EcLevel>(), Ok(EcLevel::Q));
        assert!("X".parse::<EcLevel>().is_err());
    }

    #[test]
    fn test_display() {
        let names: Vec<String> = EcLevel::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["L", "M", "Q", "H"]);
    }
}
