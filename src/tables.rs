//! Terminal rendering of reports.

use analytics::{IndicatorSet, PerformanceReport, RiskProfile};
use backtester::CustodyReport;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use core_types::Bar;
use market_data::DataQuality;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn pct(x: f64) -> String {
    format!("{:.2}%", x * 100.0)
}

pub fn quality_table(quality: &DataQuality) -> Table {
    let mut t = table(vec!["Data quality", "Value"]);
    t.add_row(vec!["Rows".to_string(), quality.total_rows.to_string()]);
    t.add_row(vec!["Valid".to_string(), quality.valid_rows.to_string()]);
    t.add_row(vec!["Defective".to_string(), quality.defective_rows.to_string()]);
    t.add_row(vec!["Duplicate dates".to_string(), quality.duplicate_rows.to_string()]);
    t.add_row(vec!["Score".to_string(), format!("{:.1}", quality.score)]);
    t
}

pub fn performance_table(report: &PerformanceReport, risk: &RiskProfile) -> Table {
    let period = match (report.start_date, report.end_date) {
        (Some(from), Some(to)) => format!("{from} .. {to}"),
        _ => "-".to_string(),
    };
    let mut t = table(vec!["Metric", "Value"]);
    t.add_row(vec!["Period".to_string(), period]);
    t.add_row(vec!["Observations".to_string(), report.observations.to_string()]);
    t.add_row(vec!["Total return".to_string(), pct(report.total_return)]);
    t.add_row(vec!["CAGR".to_string(), pct(report.cagr)]);
    t.add_row(vec!["Annualized volatility".to_string(), pct(report.annualized_volatility)]);
    t.add_row(vec!["Sharpe".to_string(), format!("{:.3}", report.sharpe_ratio)]);
    t.add_row(vec!["Sortino".to_string(), format!("{:.3}", report.sortino_ratio)]);
    t.add_row(vec!["Max drawdown".to_string(), pct(report.max_drawdown)]);
    t.add_row(vec![
        "Calmar".to_string(),
        report.calmar_ratio.map_or("-".to_string(), |c| format!("{c:.3}")),
    ]);
    let vol_note = if risk.suspect_data { " (suspect data?)" } else { "" };
    t.add_row(vec![
        "Return-path volatility".to_string(),
        format!("{}{}", pct(risk.annualized_volatility), vol_note),
    ]);
    t
}

/// The last `tail` bars with their indicator readings.
pub fn indicator_table(bars: &[Bar], set: &IndicatorSet, tail: usize) -> Table {
    let mut t = table(vec![
        "Date",
        "Close",
        "Adj. close",
        "ATR",
        "Realized vol",
        "RSI (Wilder)",
        "RSI (SMA)",
        "BB lower",
        "BB upper",
        "Vol/OI",
    ]);
    let from = bars.len().saturating_sub(tail);
    for i in from..bars.len() {
        let (lower, upper) = set.bollinger[i].map_or(("-".to_string(), "-".to_string()), |b| {
            (format!("{:.2}", b.lower), format!("{:.2}", b.upper))
        });
        t.add_row(vec![
            bars[i].date.to_string(),
            format!("{:.2}", bars[i].close),
            format!("{:.2}", set.adjusted_closes[i]),
            format!("{:.2}", set.atr[i]),
            set.realized_volatility[i].map_or("-".to_string(), pct),
            format!("{:.1}", set.rsi_wilder[i]),
            format!("{:.1}", set.rsi_sma[i]),
            lower,
            upper,
            format!("{:.2}", set.liquidity_pressure[i]),
        ]);
    }
    t
}

pub fn gap_table(set: &IndicatorSet) -> Table {
    let mut t = table(vec!["Gap date", "Index", "Gap", "Change"]);
    for gap in &set.gaps {
        t.add_row(vec![
            gap.date.to_string(),
            gap.index.to_string(),
            format!("{:+.2}", gap.gap),
            pct(gap.pct_change),
        ]);
    }
    t
}

pub fn custody_table(report: &CustodyReport) -> Table {
    let best = report.best().map(|r| r.id);
    let mut t = table(vec!["Robot", "ROI", "Max DD", "Sharpe", "Fills", "Commission", ""]);
    for r in &report.results {
        t.add_row(vec![
            Cell::new(r.id),
            Cell::new(pct(r.roi)),
            Cell::new(pct(r.max_drawdown)),
            Cell::new(format!("{:.3}", r.report.sharpe_ratio)),
            Cell::new(r.fills),
            Cell::new(format!("{:.2}", r.commission_paid)),
            Cell::new(if Some(r.id) == best { "winner" } else { "" }),
        ]);
    }
    t.add_row(vec![
        Cell::new("Buy & hold"),
        Cell::new(pct(report.buy_and_hold_roi)),
        Cell::new("-"),
        Cell::new("-"),
        Cell::new("-"),
        Cell::new("-"),
        Cell::new(""),
    ]);
    t
}
