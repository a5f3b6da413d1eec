//! End-to-end scenarios through the public simulator, session and optimizer
//! APIs, using mock ports where I/O would otherwise be involved.

mod common;

use common::*;
use std::path::Path;
use trendscore::cli::{run_backtest_pipeline, run_optimize_pipeline};
use trendscore::domain::backtest::{run_backtest, BacktestConfig};
use trendscore::domain::error::TrendscoreError;
use trendscore::domain::optimize::Optimizer;
use trendscore::domain::position::{ExitReason, Side};
use trendscore::domain::session::TradingSession;
use trendscore::domain::signal::Action;
use trendscore::domain::strategy::ParameterSet;

mod strategy_scenarios {
    use super::*;

    #[test]
    fn long_closes_on_max_loss_five_bars_after_entry() {
        let params = ParameterSet {
            min_profit: 50.0,
            rsi_exit: 0.0,
            ..fast_params()
        };
        let bars = bars_from(&[
            (100.0, 10.0),
            (101.0, 10.0),
            (102.0, 10.0),
            (103.0, 100.0),
            (102.8, 10.0),
            (102.5, 10.0),
            (102.2, 10.0),
            (101.9, 10.0),
            (100.9, 10.0),
        ]);
        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.side, Side::Long);
        assert_eq!(trade.entry_time, bars[3].timestamp);
        assert_eq!(trade.exit_time, bars[8].timestamp);
        assert_eq!(trade.exit_reason, ExitReason::MaxLoss);
        assert!((trade.pnl - (100.9 - 103.0)).abs() < 1e-9);
    }

    #[test]
    fn short_closes_on_trailing_stop_after_bounce() {
        let params = ParameterSet {
            max_loss: 100.0,
            rsi_exit: 100.0,
            ..fast_params()
        };
        let mut points = vec![(200.0, 10.0), (199.0, 10.0), (198.0, 10.0), (197.0, 100.0)];
        for close in [196.0, 195.0, 194.0, 193.0, 192.0, 191.0, 190.0, 189.0] {
            points.push((close, 10.0));
        }
        // a bounce of 7 above the 189 close clears prev_close + 1.5 * ATR(2)
        points.push((196.0, 10.0));
        let bars = bars_from(&points);

        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.side, Side::Short);
        assert!((trade.entry_price - 197.0).abs() < f64::EPSILON);
        assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
        assert_eq!(trade.exit_time, bars[12].timestamp);
        assert!((trade.pnl - 1.0).abs() < 1e-9);
        assert!((trade.best_price - 189.0).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_low_volume_series_never_opens() {
        let bars: Vec<Bar> = (0..120).map(|i| make_bar(i, 100.0, 10.0)).collect();
        let result = run_backtest(&bars, &ParameterSet::default(), &BacktestConfig::default())
            .unwrap();

        assert!(result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), bars.len());
        assert_eq!(result.metrics.net_profit, 0.0);
        assert_eq!(result.metrics.sharpe_ratio, 0.0);
        assert_eq!(result.metrics.max_drawdown, 0.0);
    }

    #[test]
    fn history_shorter_than_warmup_has_no_trades() {
        let bars = wave_bars(20);
        let params = ParameterSet::default();
        assert!(bars.len() < params.warmup_bars());

        let result = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), 20);
    }
}

mod accounting {
    use super::*;

    #[test]
    fn net_profit_reconciles_with_ledger() {
        for params in [ParameterSet::default(), fast_params()] {
            let result = run_backtest(&wave_bars(400), &params, &BacktestConfig::default())
                .unwrap();
            let ledger_pnl: f64 = result.trades.iter().map(|t| t.pnl).sum();
            assert!((result.metrics.net_profit - ledger_pnl).abs() < 1e-6);
            assert!(
                (result.final_balance - (result.initial_capital + ledger_pnl)).abs() < 1e-6
            );
        }
    }

    #[test]
    fn last_equity_point_matches_final_balance() {
        let result = run_backtest(&wave_bars(250), &fast_params(), &BacktestConfig::default())
            .unwrap();
        let last = result.equity_curve.last().unwrap();
        assert!((last.balance - result.final_balance).abs() < 1e-6);
    }

    #[test]
    fn trades_never_overlap() {
        let result = run_backtest(&wave_bars(400), &fast_params(), &BacktestConfig::default())
            .unwrap();
        for trade in &result.trades {
            assert!(trade.entry_time <= trade.exit_time);
        }
        for pair in result.trades.windows(2) {
            assert!(pair[1].entry_time > pair[0].exit_time);
        }
    }
}

mod live_session {
    use super::*;

    #[test]
    fn session_matches_batch_simulator() {
        let bars = wave_bars(300);
        let params = fast_params();

        let mut session = TradingSession::new(params.clone(), 10_000.0).unwrap();
        let mut opens = 0;
        for bar in &bars {
            let outcome = session.on_bar(bar).unwrap();
            if matches!(outcome.action, Action::OpenLong | Action::OpenShort) {
                opens += 1;
            }
        }
        let ledger = session.finish().unwrap();
        let batch = run_backtest(&bars, &params, &BacktestConfig::default()).unwrap();

        assert_eq!(ledger.trades, batch.trades);
        assert_eq!(ledger.equity_curve, batch.equity_curve);
        assert_eq!(opens, batch.trades.len());
    }

    #[test]
    fn session_rejects_replayed_bar() {
        let bars = wave_bars(5);
        let mut session = TradingSession::new(fast_params(), 10_000.0).unwrap();
        for bar in &bars {
            session.on_bar(bar).unwrap();
        }
        let err = session.on_bar(&bars[4]).unwrap_err();
        assert!(matches!(err, TrendscoreError::OutOfOrderBar { .. }));
    }
}

mod optimization {
    use super::*;

    fn grid() -> Vec<ParameterSet> {
        let mut sets = Vec::new();
        for ema_short_period in [2, 3, 5] {
            for atr_multiplier in [1.0, 2.0] {
                sets.push(ParameterSet {
                    ema_short_period,
                    ema_long_period: 8,
                    atr_multiplier,
                    ..fast_params()
                });
            }
        }
        sets.push(ParameterSet {
            volume_window: 0,
            ..fast_params()
        });
        sets
    }

    #[test]
    fn ranking_is_sorted_and_failures_isolated() {
        let report = Optimizer::new(BacktestConfig::default()).run(&wave_bars(300), &grid());

        assert_eq!(report.rows.len(), 6);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 6);
        for pair in report.rows.windows(2) {
            assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].index < pair[1].index)
            );
        }
    }

    #[test]
    fn optimizer_rows_match_individual_backtests() {
        let bars = wave_bars(300);
        let config = BacktestConfig::default();
        let candidates = grid();
        let report = Optimizer::new(config.clone()).run(&bars, &candidates);

        for row in &report.rows {
            let single = run_backtest(&bars, &candidates[row.index], &config).unwrap();
            assert_eq!(row.score, single.metrics.score);
            assert_eq!(row.net_profit, single.metrics.net_profit);
            assert_eq!(row.total_trades, single.metrics.total_trades);
        }
    }

    #[test]
    fn parallelism_does_not_change_ranking() {
        let bars = wave_bars(300);
        let parallel = Optimizer::new(BacktestConfig::default()).run(&bars, &grid());
        let sequential = Optimizer::new(BacktestConfig::default())
            .with_parallelism(false)
            .run(&bars, &grid());
        assert_eq!(parallel, sequential);
    }
}

mod pipelines {
    use super::*;

    #[test]
    fn backtest_pipeline_writes_report() {
        let data = MockDataPort::new(wave_bars(200));
        let report = RecordingReportPort::default();
        let result = run_backtest_pipeline(
            &data,
            &report,
            &fast_params(),
            &BacktestConfig::default(),
            Path::new("out"),
        )
        .unwrap();

        let written = report.backtests.borrow();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, result.trades.len());
        assert_eq!(written[0].1, Path::new("out"));
    }

    #[test]
    fn backtest_pipeline_empty_data_is_insufficient() {
        let data = MockDataPort::new(Vec::new());
        let report = RecordingReportPort::default();
        let err = run_backtest_pipeline(
            &data,
            &report,
            &fast_params(),
            &BacktestConfig::default(),
            Path::new("out"),
        )
        .unwrap_err();
        assert!(matches!(err, TrendscoreError::InsufficientData { .. }));
        assert!(report.backtests.borrow().is_empty());
    }

    #[test]
    fn backtest_pipeline_propagates_data_error() {
        let data = MockDataPort::new(wave_bars(10)).with_error("disk on fire");
        let report = RecordingReportPort::default();
        let err = run_backtest_pipeline(
            &data,
            &report,
            &fast_params(),
            &BacktestConfig::default(),
            Path::new("out"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn optimize_pipeline_reports_rows_and_failures() {
        let data = MockDataPort::new(wave_bars(200)).with_parameter_sets(vec![
            fast_params(),
            ParameterSet {
                rsi_period: 0,
                ..fast_params()
            },
        ]);
        let report_port = RecordingReportPort::default();
        let report = run_optimize_pipeline(
            &data,
            &report_port,
            &BacktestConfig::default(),
            false,
            5,
            Path::new("opt"),
        )
        .unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.failures.len(), 1);
        let written = report_port.optimizations.borrow();
        assert_eq!(written[0], (1, 1, Path::new("opt").to_path_buf()));
    }

    #[test]
    fn optimize_pipeline_isolates_unreadable_row() {
        let data = MockDataPort::new(wave_bars(200))
            .with_parameter_sets(vec![fast_params()])
            .with_unreadable_row("grid.csv: invalid digit found in string")
            .with_parameter_sets(vec![fast_params()]);
        let report_port = RecordingReportPort::default();
        let report = run_optimize_pipeline(
            &data,
            &report_port,
            &BacktestConfig::default(),
            true,
            5,
            Path::new("opt"),
        )
        .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert!(report.failures[0].params.is_none());
        assert!(report.rows.iter().all(|r| r.index != 1));
    }

    #[test]
    fn optimize_pipeline_without_candidates_fails() {
        let data = MockDataPort::new(wave_bars(50));
        let report_port = RecordingReportPort::default();
        let err = run_optimize_pipeline(
            &data,
            &report_port,
            &BacktestConfig::default(),
            true,
            10,
            Path::new("opt"),
        )
        .unwrap_err();
        assert!(matches!(err, TrendscoreError::Data { .. }));
    }
}
