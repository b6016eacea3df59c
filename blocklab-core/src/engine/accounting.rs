use crate::domain::{ExitRecord, Side};

/// Realized P&L tracker over exit records
#[derive(Debug, Clone)]
pub struct EquityTracker {
    initial_capital: f64,
    realized_pnl: f64,
    long_pnl: f64,
    short_pnl: f64,
    peak_equity: f64,
    max_drawdown: f64,
    equity_history: Vec<f64>,
}

impl EquityTracker {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            realized_pnl: 0.0,
            long_pnl: 0.0,
            short_pnl: 0.0,
            peak_equity: initial_capital,
            max_drawdown: 0.0,
            equity_history: vec![initial_capital],
        }
    }

    /// Book an exit's profit and record the resulting equity
    pub fn apply_exit(&mut self, exit: &ExitRecord) {
        self.realized_pnl += exit.net_profit;
        match exit.side {
            Side::Long => self.long_pnl += exit.net_profit,
            Side::Short => self.short_pnl += exit.net_profit,
        }

        let equity = self.equity();
        self.peak_equity = self.peak_equity.max(equity);
        self.max_drawdown = self.max_drawdown.max(self.peak_equity - equity);
        self.equity_history.push(equity);
    }

    pub fn equity(&self) -> f64 {
        self.initial_capital + self.realized_pnl
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn long_pnl(&self) -> f64 {
        self.long_pnl
    }

    pub fn short_pnl(&self) -> f64 {
        self.short_pnl
    }

    /// Largest peak-to-trough drop of the realized equity curve
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn equity_history(&self) -> &[f64] {
        &self.equity_history
    }
}

/// Replay exits in exit-time order (ties broken by zone id).
pub fn replay_exits<'a, I>(initial_capital: f64, exits: I) -> EquityTracker
where
    I: IntoIterator<Item = &'a ExitRecord>,
{
    let mut ordered: Vec<&ExitRecord> = exits.into_iter().collect();
    ordered.sort_by(|a, b| {
        a.exit_time
            .cmp(&b.exit_time)
            .then_with(|| a.zone_id.as_str().cmp(b.zone_id.as_str()))
    });

    let mut tracker = EquityTracker::new(initial_capital);
    for exit in ordered {
        tracker.apply_exit(exit);
    }
    tracker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitStatus, ZoneId};
    use chrono::{Duration, NaiveDateTime};

    fn exit(hour: i64, side: Side, net_profit: f64) -> ExitRecord {
        let time = NaiveDateTime::default() + Duration::hours(hour);
        ExitRecord {
            symbol: "TEST".into(),
            zone_id: ZoneId::new(hour as usize, time, side),
            side,
            capital_used: 1000.0,
            status: ExitStatus::Stoploss,
            net_profit,
            quantity: 10.0,
            entry_pdi: 0,
            entry_time: time,
            entry_price: 100.0,
            exit_pdi: hour as usize,
            exit_time: time,
            exit_price: 100.0,
            target_hit_times: Vec::new(),
            stoploss: 90.0,
            target_list: vec![110.0],
        }
    }

    #[test]
    fn test_realized_tracking() {
        let mut tracker = EquityTracker::new(10000.0);
        tracker.apply_exit(&exit(1, Side::Long, 150.0));
        tracker.apply_exit(&exit(2, Side::Short, -50.0));

        assert_eq!(tracker.realized_pnl(), 100.0);
        assert_eq!(tracker.long_pnl(), 150.0);
        assert_eq!(tracker.short_pnl(), -50.0);
        assert_eq!(tracker.equity(), 10100.0);
        assert_eq!(tracker.equity_history(), &[10000.0, 10150.0, 10100.0]);
    }

    #[test]
    fn test_max_drawdown() {
        let exits = [
            exit(1, Side::Long, 100.0),
            exit(2, Side::Long, -30.0),
            exit(3, Side::Long, -50.0),
            exit(4, Side::Long, 200.0),
            exit(5, Side::Long, -10.0),
        ];
        let tracker = replay_exits(1000.0, &exits);
        assert!((tracker.max_drawdown() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_replay_orders_by_exit_time() {
        let exits = [exit(3, Side::Long, -50.0), exit(1, Side::Long, 100.0)];
        let tracker = replay_exits(0.0, &exits);
        assert_eq!(tracker.equity_history(), &[0.0, 100.0, 50.0]);
        assert!((tracker.max_drawdown() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_replay() {
        let tracker = replay_exits(500.0, std::iter::empty());
        assert_eq!(tracker.equity(), 500.0);
        assert_eq!(tracker.max_drawdown(), 0.0);
        assert_eq!(tracker.equity_history().len(), 1);
    }
}
