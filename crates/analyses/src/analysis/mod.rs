//! Planning analyses
//!
//! One module per analysis, each exposing `run(&Config) -> Result<()>`.
//! Analyses are independent: they share no mutable state, load their own
//! sources, and stage complete results in memory before writing any
//! output, so a failed analysis leaves nothing partial behind.

pub mod congestion;
pub mod equity;
pub mod freight_density;
pub mod signal_density;
pub mod stops_in_cities;
pub mod transit_service;
pub mod transit_signals;

use rtplan_core::config::Config;
use rtplan_core::error::Result;
use tracing::{error, info};

/// Entry point signature shared by every analysis
pub type AnalysisFn = fn(&Config) -> Result<()>;

/// Outcome of one analysis attempted by the orchestrator
pub struct AnalysisOutcome {
    pub name: &'static str,
    pub result: Result<()>,
}

/// Analyses enabled by the configuration, in run order
pub fn enabled(config: &Config) -> Vec<(&'static str, AnalysisFn)> {
    let flags = &config.analyses;
    let all: [(&'static str, bool, AnalysisFn); 7] = [
        ("freight_density", flags.freight_density, freight_density::run),
        ("transit_service", flags.transit_service, transit_service::run),
        ("transit_signals", flags.transit_signals, transit_signals::run),
        ("signal_density", flags.signal_density, signal_density::run),
        ("equity", flags.equity, equity::run),
        ("congestion", flags.congestion, congestion::run),
        ("stops_in_cities", flags.stops_in_cities, stops_in_cities::run),
    ];
    all.into_iter()
        .filter(|(_, on, _)| *on)
        .map(|(name, _, run)| (name, run))
        .collect()
}

/// Run every enabled analysis in order.
///
/// A failure is logged and does not stop later analyses; the caller
/// inspects the outcomes to decide the process exit status.
pub fn run_enabled(config: &Config) -> Vec<AnalysisOutcome> {
    let mut outcomes = Vec::new();
    for (name, run) in enabled(config) {
        info!(analysis = name, "starting");
        let result = run(config);
        match &result {
            Ok(()) => info!(analysis = name, "finished"),
            Err(e) => error!(analysis = name, error = %e, "failed"),
        }
        outcomes.push(AnalysisOutcome { name, result });
    }
    outcomes
}
