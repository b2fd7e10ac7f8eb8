//! Tabular reports written after a batch of runs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cooperation_common::{AgentSnapshot, OutputConfig, OutputFormat};
use log::info;
use serde::Serialize;

use crate::queue::RunInfo;

/// One line of the summary table. Columns are named, not positional.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryRow {
    pub run: usize,
    pub seed: u64,
    pub radius: f64,
    pub cost_benefit_ratio: f64,
    pub population_size: usize,
    pub epoch_budget: usize,
    pub epoch: usize,
    pub num_coop: usize,
    pub num_defect: usize,
}

impl From<&RunInfo> for SummaryRow {
    fn from(run: &RunInfo) -> Self {
        SummaryRow {
            run: run.id,
            seed: run.seed,
            radius: run.params.radius,
            cost_benefit_ratio: run.params.cost_benefit_ratio,
            population_size: run.params.population_size,
            epoch_budget: run.params.epoch_budget,
            epoch: run.cur_epoch,
            num_coop: run.num_coop,
            num_defect: run.num_defect,
        }
    }
}

pub fn write_summary_csv<W: Write>(writer: W, runs: &[RunInfo]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for run in runs {
        csv_writer.serialize(SummaryRow::from(run))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Full run records, including snapshot history.
pub fn write_summary_json<W: Write>(writer: W, runs: &[RunInfo]) -> Result<()> {
    serde_json::to_writer(writer, runs)?;
    Ok(())
}

/// `neighbors,count` lines, one per neighborhood size from 0 to the largest.
pub fn write_neighbor_histogram<W: Write>(writer: W, histogram: &[usize]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["neighbors", "count"])?;
    for (size, count) in histogram.iter().enumerate() {
        csv_writer.write_record(&[size.to_string(), count.to_string()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// `x,y,strategy` for every agent, in population order.
pub fn write_population_csv<W: Write>(writer: W, agents: &[AgentSnapshot]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for agent in agents {
        csv_writer.serialize(agent)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Error creating file '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Writes every report enabled in `output`. Returns the paths written.
pub fn save_reports(output: &OutputConfig, runs: &[RunInfo]) -> Result<Vec<PathBuf>> {
    let base = &output.base_filename;
    let mut written = Vec::new();

    if output.save_summary {
        let path = match output.format {
            OutputFormat::Csv => PathBuf::from(format!("{}_summary.csv", base)),
            OutputFormat::Json => PathBuf::from(format!("{}_summary.json", base)),
        };
        let writer = create(&path)?;
        match output.format {
            OutputFormat::Csv => write_summary_csv(writer, runs),
            OutputFormat::Json => write_summary_json(writer, runs),
        }
        .with_context(|| format!("Error writing summary to '{}'", path.display()))?;
        info!("Summary of {} runs saved to {}", runs.len(), path.display());
        written.push(path);
    } else {
        info!("Skipping summary as per config.");
    }

    if output.save_neighbor_histogram {
        for run in runs {
            let path = PathBuf::from(format!("{}_run{}_neighbors.csv", base, run.id));
            write_neighbor_histogram(create(&path)?, &run.neighbor_histogram)
                .with_context(|| format!("Error writing neighbor histogram to '{}'", path.display()))?;
            written.push(path);
        }
        info!("Neighbor histograms saved for {} runs.", runs.len());
    }

    if output.save_final_population {
        for run in runs {
            let Some(agents) = &run.final_population else {
                continue;
            };
            let path = PathBuf::from(format!("{}_run{}_population.csv", base, run.id));
            write_population_csv(create(&path)?, agents)
                .with_context(|| format!("Error writing population to '{}'", path.display()))?;
            written.push(path);
        }
        info!("Final populations saved for {} runs.", runs.len());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cooperation_common::{SimParams, Strategy};

    fn finished_run(id: usize) -> RunInfo {
        let mut run = RunInfo::new(id, SimParams::new(0.02, 0.175, 4, 50, false), 42);
        run.cur_epoch = 50;
        run.num_coop = 3;
        run.num_defect = 1;
        run.neighbor_histogram = vec![1, 2, 1];
        run.final_population = Some(vec![
            AgentSnapshot { x: 0.25, y: 0.5, strategy: Strategy::Cooperate },
            AgentSnapshot { x: 0.75, y: 0.125, strategy: Strategy::Defect },
        ]);
        run
    }

    #[test]
    fn histogram_lines() {
        let mut out = Vec::new();
        write_neighbor_histogram(&mut out, &[1, 2, 0, 4]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "neighbors,count\n0,1\n1,2\n2,0\n3,4\n");
    }

    #[test]
    fn summary_csv_has_named_columns() {
        let mut out = Vec::new();
        write_summary_csv(&mut out, &[finished_run(0), finished_run(1)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "run,seed,radius,cost_benefit_ratio,population_size,epoch_budget,epoch,num_coop,num_defect"
        );
        assert_eq!(lines.next().unwrap(), "0,42,0.02,0.175,4,50,50,3,1");
        assert_eq!(lines.next().unwrap(), "1,42,0.02,0.175,4,50,50,3,1");
        assert!(lines.next().is_none());
    }

    #[test]
    fn population_csv() {
        let mut out = Vec::new();
        write_population_csv(&mut out, finished_run(0).final_population.as_ref().unwrap()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "x,y,strategy\n0.25,0.5,cooperate\n0.75,0.125,defect\n"
        );
    }

    #[test]
    fn json_summary_skips_population() {
        let mut out = Vec::new();
        write_summary_json(&mut out, &[finished_run(7)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["id"], 7);
        assert_eq!(value[0]["num_coop"], 3);
        assert!(value[0].get("final_population").is_none());
        assert_eq!(value[0]["neighbor_histogram"], serde_json::json!([1, 2, 1]));
    }

    #[test]
    fn save_reports_writes_enabled_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            base_filename: dir.path().join("sweep").display().to_string(),
            save_summary: true,
            format: OutputFormat::Csv,
            save_neighbor_histogram: true,
            save_final_population: true,
        };
        let written = save_reports(&output, &[finished_run(0)]).unwrap();
        assert_eq!(written.len(), 3);
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }
        let histogram = std::fs::read_to_string(dir.path().join("sweep_run0_neighbors.csv")).unwrap();
        assert!(histogram.starts_with("neighbors,count\n"));
    }
}
