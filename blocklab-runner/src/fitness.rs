//! Fitness scoring — summary statistics over pooled exits and a metric
//! selector for ranking parameter sets.

use blocklab_core::domain::{ExitRecord, ExitStatus};
use blocklab_core::engine::replay_exits;
use serde::{Deserialize, Serialize};

/// Profit factor reported when there are no losing exits.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Summary statistics of a set of exits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    /// Sum of net profit over all exits.
    pub net_profit: f64,
    /// Percentage (0–100) of exits with positive net profit.
    pub win_rate: f64,
    pub trade_count: usize,
    pub gross_profit: f64,
    /// Sum of losing exits, as a positive number.
    pub gross_loss: f64,
    /// gross_profit / gross_loss, capped at [`PROFIT_FACTOR_CAP`].
    pub profit_factor: f64,
    pub average_profit: f64,
    pub full_target_count: usize,
    pub stoploss_count: usize,
    /// Largest peak-to-trough drop of cumulative profit, by exit time.
    pub max_drawdown: f64,
}

impl FitnessSummary {
    pub fn compute(exits: &[ExitRecord]) -> Self {
        let trade_count = exits.len();
        if trade_count == 0 {
            return Self::default();
        }

        let net_profit: f64 = exits.iter().map(|e| e.net_profit).sum();
        let winners = exits.iter().filter(|e| e.is_winner()).count();
        let gross_profit: f64 = exits
            .iter()
            .map(|e| e.net_profit)
            .filter(|&p| p > 0.0)
            .sum();
        let gross_loss: f64 = -exits
            .iter()
            .map(|e| e.net_profit)
            .filter(|&p| p < 0.0)
            .sum::<f64>();
        let profit_factor = if gross_loss < 1e-10 {
            if gross_profit > 0.0 {
                PROFIT_FACTOR_CAP
            } else {
                0.0
            }
        } else {
            (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
        };

        Self {
            net_profit,
            win_rate: winners as f64 / trade_count as f64 * 100.0,
            trade_count,
            gross_profit,
            gross_loss,
            profit_factor,
            average_profit: net_profit / trade_count as f64,
            full_target_count: exits.iter().filter(|e| e.status.is_full_target()).count(),
            stoploss_count: exits
                .iter()
                .filter(|e| e.status == ExitStatus::Stoploss)
                .count(),
            max_drawdown: replay_exits(0.0, exits).max_drawdown(),
        }
    }
}

/// Which metric to optimize/sort by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    #[default]
    NetProfit,
    WinRate,
    ProfitFactor,
    AverageProfit,
    TradeCount,
    MaxDrawdown,
}

impl FitnessMetric {
    /// Extract the relevant metric value from a summary.
    pub fn extract(&self, summary: &FitnessSummary) -> f64 {
        match self {
            Self::NetProfit => summary.net_profit,
            Self::WinRate => summary.win_rate,
            Self::ProfitFactor => summary.profit_factor,
            Self::AverageProfit => summary.average_profit,
            Self::TradeCount => summary.trade_count as f64,
            Self::MaxDrawdown => summary.max_drawdown,
        }
    }

    /// Whether higher values are better for this metric.
    ///
    /// All metrics except MaxDrawdown: higher is better.
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::MaxDrawdown)
    }

    /// Returns true if `a` is better than `b`.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.is_higher_better() {
            a > b
        } else {
            a < b
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NetProfit => "net_profit",
            Self::WinRate => "win_rate",
            Self::ProfitFactor => "profit_factor",
            Self::AverageProfit => "average_profit",
            Self::TradeCount => "trade_count",
            Self::MaxDrawdown => "max_drawdown",
        }
    }
}

impl std::str::FromStr for FitnessMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::NetProfit,
            Self::WinRate,
            Self::ProfitFactor,
            Self::AverageProfit,
            Self::TradeCount,
            Self::MaxDrawdown,
        ]
        .into_iter()
        .find(|m| m.name() == s)
        .ok_or_else(|| format!("unknown fitness metric '{s}'"))
    }
}
