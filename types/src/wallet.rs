use serde::{Deserialize, Serialize};

/// Read-only mirror of the backend wallet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    #[serde(rename = "mainBalance")]
    pub main_balance: u64,
    #[serde(rename = "bonusBalance", default)]
    pub bonus_balance: u64,
}

impl WalletSnapshot {
    pub fn new(main_balance: u64, bonus_balance: u64) -> Self {
        Self {
            main_balance,
            bonus_balance,
        }
    }

    pub fn total(&self) -> u64 {
        self.main_balance.saturating_add(self.bonus_balance)
    }

    pub fn can_cover(&self, amount: u64) -> bool {
        self.total() >= amount
    }
}
