use serde::{Deserialize, Serialize};

const LIVE_API_BASE: &str = "https://vendors.paddle.com/api";
const SANDBOX_API_BASE: &str = "https://sandbox-vendors.paddle.com/api";

/// Paddle environment - sandbox or live (production) vendor account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    #[default]
    Sandbox,
    Live,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Sandbox => "sandbox",
            PaymentMode::Live => "live",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, PaymentMode::Live)
    }

    /// Vendor API root for this environment, without the `/2.0` version segment.
    pub fn api_base(&self) -> &'static str {
        match self {
            PaymentMode::Sandbox => SANDBOX_API_BASE,
            PaymentMode::Live => LIVE_API_BASE,
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sandbox" => Ok(PaymentMode::Sandbox),
            "live" => Ok(PaymentMode::Live),
            _ => Err(format!(
                "Invalid payment mode: {}. Must be 'sandbox' or 'live'",
                s
            )),
        }
    }
}
