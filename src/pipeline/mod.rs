// Analysis pipeline: ingestion, processing, and report generation

pub mod ingestion;
pub mod processing;

use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, info_span, instrument, warn};

use crate::analysis::{FlowDiagram, Findings, Strata};
use crate::config::AnalysisConfig;
use crate::constants;
use crate::plots;
use crate::report::{self, QualityReport, RunManifest, StrataSizes};
use processing::normalize::{DefaultNormalizer, NormalizedDataset, Normalizer};
use processing::quality_gate::{
    DefaultQualityGate, QualityAssessment, QualityDecision, QualityGate, QualityGateConfig,
};

/// Optional outputs of a run. Reading, normalizing, the quality report and
/// the manifest always happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSteps {
    pub export_cleaned: bool,
    pub tables: bool,
    pub plots: bool,
    pub flow: bool,
}

impl PipelineSteps {
    pub fn all() -> Self {
        Self {
            export_cleaned: true,
            tables: true,
            plots: true,
            flow: true,
        }
    }

    pub fn none() -> Self {
        Self {
            export_cleaned: false,
            tables: false,
            plots: false,
            flow: false,
        }
    }

    pub fn clean_only() -> Self {
        Self {
            export_cleaned: true,
            ..Self::none()
        }
    }

    pub fn tables_only() -> Self {
        Self {
            tables: true,
            ..Self::none()
        }
    }

    pub fn plots_only() -> Self {
        Self {
            plots: true,
            ..Self::none()
        }
    }

    pub fn flow_only() -> Self {
        Self {
            flow: true,
            ..Self::none()
        }
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub records: usize,
    pub patient_decides: usize,
    pub surrogate_decides: usize,
    pub warnings: usize,
    pub quality_flags: usize,
    pub artifacts: Vec<PathBuf>,
    pub findings: Option<Findings>,
}

pub struct Pipeline;

impl Pipeline {
    /// Run the analysis over the configured input and write the requested
    /// outputs under the configured output directory
    #[instrument(skip(config, steps), fields(input = %config.input.path.display()))]
    pub fn run(config: &AnalysisConfig, steps: PipelineSteps) -> anyhow::Result<PipelineResult> {
        let input = &config.input.path;
        let output_dir = &config.output.dir;
        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;

        // Step 1: Read and fingerprint the source sheet
        let (sheet, fingerprint) = info_span!("read").in_scope(|| -> anyhow::Result<_> {
            info!("📥 Reading {}", input.display());
            let sheet = ingestion::read_sheet(input, config.input.sheet.as_deref())
                .with_context(|| format!("reading {}", input.display()))?;
            let fingerprint = ingestion::fingerprint(input)?;
            info!(rows = sheet.rows.len(), columns = sheet.headers.len(), %fingerprint, "Sheet read");
            Ok((sheet, fingerprint))
        })?;

        // Step 2: Normalize encodings
        let dataset: NormalizedDataset = info_span!("normalize").in_scope(|| {
            DefaultNormalizer::new()
                .normalize(&sheet)
                .context("normalizing patient records")
        })?;
        info!(
            records = dataset.records.len(),
            warnings = dataset.warnings.len(),
            "🔧 Records normalized"
        );
        for column in &dataset.missing_columns {
            warn!(%column, "Column absent from input; values treated as missing");
        }

        // Step 3: Quality gate
        let assessments = Self::assess_quality(config, &dataset);
        let quality_flags = assessments
            .iter()
            .filter(|a| a.decision == QualityDecision::AcceptWithWarnings)
            .count();
        let mut artifacts = Vec::new();
        let quality_path = output_dir.join(constants::QUALITY_REPORT);
        report::write_json(
            &QualityReport::new(&assessments, &dataset.warnings, &dataset.missing_columns),
            &quality_path,
        )?;
        artifacts.push(quality_path);

        let records = &dataset.records;
        let strata = Strata::split(records);
        info!(
            patient = strata.patient.len(),
            surrogate = strata.surrogate.len(),
            "Records stratified by decision-maker"
        );

        // Step 4: Cleaned dataset
        if steps.export_cleaned {
            let path = output_dir.join(constants::CLEANED_CSV);
            report::write_cleaned_csv(records, &path)?;
            info!("💾 Cleaned dataset written to {}", path.display());
            artifacts.push(path);
        }

        // Step 5: Summary tables and study findings
        let findings = if steps.tables {
            let _span = info_span!("tables").entered();
            let findings = Findings::evaluate(&strata);
            let tables = report::build_all(records, &findings);
            artifacts.extend(Self::write_tables(&tables, output_dir)?);
            Some(findings)
        } else {
            None
        };

        // Step 6: Per-variable figures
        if steps.plots {
            let _span = info_span!("plots").entered();
            let figures_dir = config.output.figures_path();
            let written = plots::visualizations(records, &figures_dir, &config.figures)
                .with_context(|| format!("drawing figures into {}", figures_dir.display()))?;
            artifacts.extend(written);
        }

        // Step 7: Code status flow
        if steps.flow {
            let _span = info_span!("flow").entered();
            artifacts.extend(Self::write_flow(config, records, output_dir)?);
        }

        let manifest_path = output_dir.join(constants::RUN_MANIFEST);
        artifacts.push(manifest_path.clone());
        let manifest = RunManifest {
            generated_at: chrono::Utc::now(),
            input: input.clone(),
            sheet: config.input.sheet.clone(),
            fingerprint,
            records: records.len(),
            strata: StrataSizes::from(&strata),
            normalization_warnings: dataset.warnings.len(),
            quality_flags,
            artifacts: artifacts.clone(),
        };
        report::write_json(&manifest, &manifest_path)?;
        info!(artifacts = artifacts.len(), "✅ Run complete");

        Ok(PipelineResult {
            records: records.len(),
            patient_decides: strata.patient.len(),
            surrogate_decides: strata.surrogate.len(),
            warnings: dataset.warnings.len(),
            quality_flags,
            artifacts,
            findings,
        })
    }

    fn assess_quality(config: &AnalysisConfig, dataset: &NormalizedDataset) -> Vec<QualityAssessment> {
        let gate = DefaultQualityGate::with_config(QualityGateConfig {
            los_tolerance_days: config.analysis.los_tolerance_days,
            ..QualityGateConfig::default()
        });

        let assessments: Vec<QualityAssessment> =
            dataset.records.iter().map(|r| gate.assess(r)).collect();
        for assessment in assessments.iter().filter(|a| !a.issues.is_empty()) {
            for issue in &assessment.issues {
                warn!(
                    record = %assessment.record_id,
                    field = issue.field.as_deref().unwrap_or(""),
                    "{}",
                    issue.description
                );
            }
        }
        assessments
    }

    fn write_tables(tables: &[report::SummaryTable], output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let workbook_path = output_dir.join(constants::TABLES_WORKBOOK);
        report::write_workbook(tables, &workbook_path)
            .with_context(|| format!("writing {}", workbook_path.display()))?;

        let text_path = output_dir.join(constants::TABLES_TEXT);
        fs::write(&text_path, report::format_all(tables))?;
        info!("📊 Tables written to {} and {}", workbook_path.display(), text_path.display());

        Ok(vec![workbook_path, text_path])
    }

    fn write_flow(
        config: &AnalysisConfig,
        records: &[crate::domain::PatientRecord],
        output_dir: &Path,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let diagram = FlowDiagram::from_records(records, &config.analysis.flow_stages);
        let weights_path = output_dir.join(constants::FLOW_WEIGHTS);
        report::write_json(&diagram, &weights_path)?;

        let figure_path = output_dir.join(constants::FLOW_FIGURE);
        plots::draw_flow(&diagram, &figure_path, config.figures.width * 4 / 3, config.figures.height)
            .with_context(|| format!("drawing {}", figure_path.display()))?;
        info!(links = diagram.links.len(), "🌊 Code status flow written");

        Ok(vec![weights_path, figure_path])
    }
}
