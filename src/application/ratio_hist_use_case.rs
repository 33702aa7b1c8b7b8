// ============================================================
// Layer 2 — RatioHistUseCase
// ============================================================
// Bins every ratio-vs-radius graph and plots one figure per
// deadtime, plus a 2×2 overview of the first four deadtimes.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::data::{
    binning::{bin_profile, group_by_deadtime, BinSpec, DeadtimeProfiles, GridProfile},
    graph_loader::CsvGraphLoader,
};
use crate::domain::{
    radial_graph::{deadtime_label, is_analysis_graph, GraphKey, RadialGraph},
    traits::GraphSource,
};
use crate::infra::plots::{plot_ratio_grid, plot_ratio_profiles};

/// Panels in the combined figure.
const COMBINED_PANELS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioHistConfig {
    pub input:      String,
    pub output_dir: String,
    pub bins:       BinSpec,
}

impl Default for RatioHistConfig {
    fn default() -> Self {
        Self {
            input:      "RatioVsRadius.csv".to_string(),
            output_dir: "RatioVsRadius_Histograms".to_string(),
            bins:       BinSpec::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RatioHistOutput {
    pub per_deadtime: Vec<PathBuf>,
    pub combined:     PathBuf,
}

pub struct RatioHistUseCase {
    config: RatioHistConfig,
}

impl RatioHistUseCase {
    pub fn new(config: RatioHistConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RatioHistOutput> {
        self.execute_with(&CsvGraphLoader::new(&self.config.input))
    }

    pub fn execute_with(&self, source: &dyn GraphSource) -> Result<RatioHistOutput> {
        let cfg    = &self.config;
        let groups = build_profiles(source.load_graphs()?, &cfg.bins)?;

        let output_dir = Path::new(&cfg.output_dir);
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Cannot create output directory '{}'", output_dir.display()))?;

        let mut per_deadtime = Vec::with_capacity(groups.len());
        for group in &groups {
            let path = output_dir.join(format!(
                "RatioVsRadius_Deadtime{}ns.png",
                deadtime_label(group.deadtime_ns)
            ));
            plot_ratio_profiles(&path, group, &cfg.bins)?;
            tracing::info!("Saved {}", path.display());
            per_deadtime.push(path);
        }

        if groups.len() > COMBINED_PANELS {
            let left_out: Vec<String> = groups[COMBINED_PANELS..]
                .iter()
                .map(|g| format!("{} ns", deadtime_label(g.deadtime_ns)))
                .collect();
            tracing::info!("Combined plot shows the first {COMBINED_PANELS} deadtimes; left out {}", left_out.join(", "));
        }

        let combined = output_dir.join("RatioVsRadius_Combined.png");
        let shown    = groups.len().min(COMBINED_PANELS);
        plot_ratio_grid(&combined, &groups[..shown], &cfg.bins)?;
        tracing::info!("Saved {}", combined.display());

        Ok(RatioHistOutput { per_deadtime, combined })
    }
}

/// Select the analysis graphs, bin each one and group them by deadtime.
pub fn build_profiles(graphs: Vec<RadialGraph>, spec: &BinSpec) -> Result<Vec<DeadtimeProfiles>> {
    let mut profiles = Vec::new();
    for graph in graphs {
        if !is_analysis_graph(&graph.name) {
            tracing::debug!("Ignoring '{}'", graph.name);
            continue;
        }
        let key     = GraphKey::parse(&graph.name)?;
        let profile = bin_profile(&graph.distances, &graph.ratios, spec);
        tracing::debug!(
            "Binned '{}': {} points, {} ns, {}x{}",
            graph.name, graph.len(), deadtime_label(key.deadtime_ns), key.grid_size, key.grid_size
        );
        profiles.push(GridProfile { key, profile });
    }

    ensure!(!profiles.is_empty(), "No ratio-vs-radius graphs found");
    Ok(group_by_deadtime(profiles))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(name: &str, points: &[(f64, f64)]) -> RadialGraph {
        let mut g = RadialGraph::new(name);
        for &(d, r) in points {
            g.push(d, r);
        }
        g
    }

    #[test]
    fn test_build_profiles_selects_and_groups() {
        let graphs = vec![
            graph("RatioVsRadius_Deadtime5ns_25x25", &[(0.002, 0.5), (0.0025, 0.7)]),
            graph("RatioVsRadius_Deadtime5ns_100x100;1", &[(0.010, 0.9)]),
            graph("RatioVsRadius_Deadtime0.5ns_50x50", &[(0.003, 0.4)]),
            graph("c1_RatioVsRadius_Deadtime5ns_25x25", &[(0.002, 0.0)]),
            graph("SomethingElse", &[]),
        ];

        let groups = build_profiles(graphs, &BinSpec::default()).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].deadtime_ns, 0.5);
        assert_eq!(groups[1].deadtime_ns, 5.0);

        let grids: Vec<u32> = groups[1].grids.iter().map(|g| g.key.grid_size).collect();
        assert_eq!(grids, vec![100, 25]);

        let fine = &groups[1].grids[1].profile;
        assert_eq!(fine.counts[0], 2);
        assert!((fine.means[0] - 0.6).abs() < 1e-12);
    }

    struct InMemory(Vec<RadialGraph>);

    impl GraphSource for InMemory {
        fn load_graphs(&self) -> Result<Vec<RadialGraph>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_execute_writes_one_figure_per_deadtime_and_combined() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hists");
        let cfg = RatioHistConfig {
            output_dir: out.display().to_string(),
            ..RatioHistConfig::default()
        };

        // Five deadtimes: the combined figure only has room for four
        let mut graphs = Vec::new();
        for deadtime_ns in [30.0, 0.0, 5.0, 10.0, 2.5] {
            for grid_size in [100, 20] {
                let name = GraphKey { deadtime_ns, grid_size }.graph_name();
                graphs.push(graph(&name, &[(0.005, 0.9), (0.012, 0.6), (0.030, 0.3)]));
            }
        }

        let output = RatioHistUseCase::new(cfg).execute_with(&InMemory(graphs)).unwrap();

        let names: Vec<String> = output
            .per_deadtime
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![
            "RatioVsRadius_Deadtime0.0ns.png",
            "RatioVsRadius_Deadtime2.5ns.png",
            "RatioVsRadius_Deadtime5.0ns.png",
            "RatioVsRadius_Deadtime10.0ns.png",
            "RatioVsRadius_Deadtime30.0ns.png",
        ]);
        for path in &output.per_deadtime {
            assert!(path.exists(), "{} missing", path.display());
        }
        assert_eq!(output.combined, out.join("RatioVsRadius_Combined.png"));
        assert!(output.combined.exists());
    }

    #[test]
    fn test_execute_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RatioHistConfig {
            input:      dir.path().join("absent.csv").display().to_string(),
            output_dir: dir.path().join("hists").display().to_string(),
            ..RatioHistConfig::default()
        };
        assert!(RatioHistUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_malformed_selected_name_is_an_error() {
        let graphs = vec![graph("RatioVsRadius_Deadtime_broken", &[])];
        assert!(build_profiles(graphs, &BinSpec::default()).is_err());
    }

    #[test]
    fn test_no_analysis_graphs_is_an_error() {
        let err = build_profiles(vec![graph("c1", &[])], &BinSpec::default()).unwrap_err();
        assert!(err.to_string().contains("No ratio-vs-radius graphs"));
    }
}
