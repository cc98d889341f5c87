use std::str::FromStr;

/// Numeric trend codes accepted in the `trend` field of a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericComparator {
    Lt,
    Gt,
    Eq,
    Leq,
    Geq,
}

impl FromStr for NumericComparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lt" => Ok(Self::Lt),
            "gt" => Ok(Self::Gt),
            "eq" => Ok(Self::Eq),
            "leq" => Ok(Self::Leq),
            "geq" => Ok(Self::Geq),
            _ => Err(format!("unknown trend: {s}")),
        }
    }
}

impl std::fmt::Display for NumericComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lt => write!(f, "lt"),
            Self::Gt => write!(f, "gt"),
            Self::Eq => write!(f, "eq"),
            Self::Leq => write!(f, "leq"),
            Self::Geq => write!(f, "geq"),
        }
    }
}

impl NumericComparator {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => value < threshold,
            Self::Gt => value > threshold,
            Self::Eq => value == threshold,
            Self::Leq => value <= threshold,
            Self::Geq => value >= threshold,
        }
    }
}
