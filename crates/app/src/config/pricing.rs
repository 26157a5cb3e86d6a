//! Pricing Config

use clap::Args;
use driveshare::{
    pricing::{PricingMode, PricingPolicy},
    rules::Season,
};

/// How quotes apply the weekend and seasonal multipliers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PricingModeArg {
    /// Rate × days + deposit; multipliers are ignored.
    #[default]
    Flat,

    /// Weekend and high-season days are charged at their multiplier.
    Weighted,
}

impl From<PricingModeArg> for PricingMode {
    fn from(value: PricingModeArg) -> Self {
        match value {
            PricingModeArg::Flat => Self::Flat,
            PricingModeArg::Weighted => Self::Weighted,
        }
    }
}

/// Pricing settings.
#[derive(Debug, Clone, Args)]
pub struct PricingConfig {
    /// Pricing mode (flat, weighted)
    #[arg(
        long,
        env = "PRICING_MODE",
        value_enum,
        default_value_t = PricingModeArg::Flat,
        global = true
    )]
    pub pricing_mode: PricingModeArg,
}

impl PricingConfig {
    /// Pricing policy for the configured mode, with the default high season.
    #[must_use]
    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy::new(self.pricing_mode.into(), Season::default())
    }
}
