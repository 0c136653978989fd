use anyhow::Result;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

use svh_analysis::config::AnalysisConfig;
use svh_analysis::error::AnalysisError;
use svh_analysis::pipeline::{Pipeline, PipelineSteps};

const HEADER: &str = "Record,Age,Gender,BMI,Death,Setting,LOS,Admit,Discharge,CCI,\
Prior Decision Maker,Prior Code status,Prior limitations on artificial nutrition,\
Prior limitations on intubation,Prior limitations of ICU transfer,Current Decision Maker,\
Code Status At Hospitalization,Comfort care,ICU transfer acceptable to patient?,\
Change in code status from prior ACP on admission,Direct of Change in code status on admit,\
Subsequent changes during hospitalization";

const ROWS: &[&str] = &[
    "1,84,F,22.5,N,Acute care,5,2020-04-01,2020-04-06,4,Patient,Full code,,,,Patient,Full code,,Y,N,,N",
    "2,91,M,27.1,Y,Acute care,3,2020-04-02,2020-04-05,6,Surrogate,DNR/DNI,X,X,X,Surrogate,DNR/DNI,X,N,N,,N",
    "3,78,F,31.0,N,ICU,12,2020-04-03,2020-04-15,3,Patient,Full code,,,,Patient,DNR,,Y,Y,Less,N",
    "4,95,F,19.8,Y,Acute care,2,2020-04-03,2020-04-05,8,Surrogate,DNR,X,,,Surrogate,DNR/DNI,X,N,Y,Less,Y",
    "5,88,M,24.4,N,Acute care,7,2020-04-04,2020-04-11,5,POLST,DNR/DNI,X,X,,Surrogate,DNR/DNI,,N,N,,N",
    "6,82,F,26.0,N,Acute care,6,2020-04-05,2020-04-11,2,Patient,Full code,,,,Patient,Full code,,Y,N,,Y",
    "7,90,F,23.3,Y,Acute care,4,2020-04-06,2020-04-10,7,Surrogate,Full code,,,,Surrogate,DNR/DNI,X,N,Y,Less,N",
    "8,86,M,28.9,N,Acute care,9,2020-04-06,2020-04-15,4,Patient,DNR,X,,,,Full code,,Y,Y,More,N",
];

fn write_database(dir: &Path, header: &str, rows: &[&str]) -> Result<std::path::PathBuf> {
    let path = dir.join("WorkingDb.csv");
    let mut content = String::from(header);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content)?;
    Ok(path)
}

/// Workbook with numeric, date-formatted and X-flag cells, the way the
/// database is maintained by hand
fn write_workbook_database(dir: &Path) -> Result<std::path::PathBuf> {
    let path = dir.join("WorkingDb.xlsx");
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let worksheet = workbook.add_worksheet();

    let headers = [
        "Record",
        "Age",
        "LOS",
        "Admit",
        "Discharge",
        "Current Decision Maker",
        "Code Status At Hospitalization",
        "Comfort care",
    ];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    let rows: [(&str, f64, f64, (u16, u8, u8), (u16, u8, u8), &str, &str, &str); 3] = [
        ("1", 84.0, 5.0, (2020, 4, 1), (2020, 4, 6), "Patient", "Full code", ""),
        ("2", 91.0, 3.0, (2020, 4, 2), (2020, 4, 5), "Surrogate", "DNR/DNI", "X"),
        ("3", 78.0, 12.0, (2020, 4, 3), (2020, 4, 15), "patient", "DNR", ""),
    ];
    for (i, (id, age, los, admit, discharge, maker, code, comfort)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_string(row, 0, *id)?;
        worksheet.write_number(row, 1, *age)?;
        worksheet.write_number(row, 2, *los)?;
        let admit = ExcelDateTime::from_ymd(admit.0, admit.1, admit.2)?;
        worksheet.write_datetime_with_format(row, 3, &admit, &date_format)?;
        let discharge = ExcelDateTime::from_ymd(discharge.0, discharge.1, discharge.2)?;
        worksheet.write_datetime_with_format(row, 4, &discharge, &date_format)?;
        worksheet.write_string(row, 5, *maker)?;
        worksheet.write_string(row, 6, *code)?;
        if !comfort.is_empty() {
            worksheet.write_string(row, 7, *comfort)?;
        }
    }
    workbook.save(&path)?;
    Ok(path)
}

fn config_for(temp_dir: &TempDir, input: std::path::PathBuf) -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.input.path = input;
    config.output.dir = temp_dir.path().join("output");
    config.output.log_dir = temp_dir.path().join("logs");
    config
}

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[test]
fn test_full_run_writes_every_artifact() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = write_database(temp_dir.path(), HEADER, ROWS)?;
    let config = config_for(&temp_dir, input);

    let result = Pipeline::run(&config, PipelineSteps::all())?;

    assert_eq!(result.records, 8);
    assert_eq!(result.patient_decides, 3);
    assert_eq!(result.surrogate_decides, 5);
    assert_eq!(result.findings.as_ref().map(|f| f.hypotheses.len()), Some(3));

    let output = &config.output.dir;
    for name in [
        "tables.xlsx",
        "tables.txt",
        "cleaned.csv",
        "quality.json",
        "manifest.json",
        "flow.json",
        "Code Status Flow.svg",
    ] {
        assert!(output.join(name).exists(), "{} missing", name);
    }
    assert!(result.artifacts.iter().all(|p| p.exists()));

    let figures: Vec<_> = fs::read_dir(config.output.figures_path())?.collect();
    assert!(!figures.is_empty());
    assert!(config.output.figures_path().join("Display Dist Age.svg").exists());

    let cleaned = fs::read_to_string(output.join("cleaned.csv"))?;
    assert_eq!(cleaned.lines().count(), 9);

    let tables = fs::read_to_string(output.join("tables.txt"))?;
    assert!(tables.contains("(n=8)"));
    assert!(tables.contains("p-value"));

    Ok(())
}

#[test]
fn test_flow_weights_balance_across_stages() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = write_database(temp_dir.path(), HEADER, ROWS)?;
    let config = config_for(&temp_dir, input);

    Pipeline::run(&config, PipelineSteps::flow_only())?;

    let flow = read_json(&config.output.dir.join("flow.json"))?;
    assert_eq!(flow["total"], 8);
    let stages = flow["stages"].as_array().expect("stages");
    assert_eq!(stages.len(), 3);
    for stage in stages {
        let sum: u64 = stage["nodes"]
            .as_array()
            .expect("nodes")
            .iter()
            .map(|n| n["count"].as_u64().unwrap_or(0))
            .sum();
        assert_eq!(sum, 8, "stage {}", stage["title"]);
    }

    let final_nodes = stages[2]["nodes"].as_array().expect("nodes");
    let comfort = final_nodes
        .iter()
        .find(|n| n["label"] == "Comfort care")
        .expect("comfort care node");
    assert_eq!(comfort["count"], 3);

    assert!(!config.output.dir.join("tables.xlsx").exists());
    Ok(())
}

#[test]
fn test_manifest_records_strata_and_fingerprint() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = write_database(temp_dir.path(), HEADER, ROWS)?;
    let config = config_for(&temp_dir, input);

    Pipeline::run(&config, PipelineSteps::clean_only())?;

    let manifest = read_json(&config.output.dir.join("manifest.json"))?;
    assert_eq!(manifest["records"], 8);
    assert_eq!(manifest["strata"]["all"], 8);
    assert_eq!(manifest["strata"]["patient_decides"], 3);
    assert_eq!(manifest["strata"]["surrogate_decides"], 5);
    assert!(manifest["fingerprint"]
        .as_str()
        .is_some_and(|f| f.starts_with("sha256:")));

    let quality = read_json(&config.output.dir.join("quality.json"))?;
    assert_eq!(quality["records"], 8);
    Ok(())
}

#[test]
fn test_missing_age_column_fails() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = write_database(temp_dir.path(), "Record,Gender,BMI", &["1,F,22.5"])?;
    let config = config_for(&temp_dir, input);

    let err = Pipeline::run(&config, PipelineSteps::all()).unwrap_err();
    let cause = err.downcast_ref::<AnalysisError>();
    assert!(matches!(cause, Some(AnalysisError::MissingColumn(c)) if c == "Age"));
    Ok(())
}

#[test]
fn test_unsupported_input_format_fails() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("WorkingDb.json");
    fs::write(&input, "{}")?;
    let config = config_for(&temp_dir, input);

    let err = Pipeline::run(&config, PipelineSteps::all()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnalysisError>(),
        Some(AnalysisError::UnsupportedFormat(_))
    ));
    Ok(())
}

#[test]
fn test_workbook_input_runs_end_to_end() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = write_workbook_database(temp_dir.path())?;
    let config = config_for(&temp_dir, input);

    let result = Pipeline::run(&config, PipelineSteps::all())?;

    assert_eq!(result.records, 3);
    assert_eq!(result.patient_decides, 2);
    assert_eq!(result.surrogate_decides, 1);
    // LOS agrees with the date-formatted admit and discharge cells
    assert_eq!(result.quality_flags, 0);

    let cleaned = fs::read_to_string(config.output.dir.join("cleaned.csv"))?;
    assert!(cleaned.contains("2020-04-01,2020-04-06"));
    assert!(cleaned.contains("2020-04-03,2020-04-15"));

    let flow = read_json(&config.output.dir.join("flow.json"))?;
    let final_nodes = flow["stages"][2]["nodes"].as_array().expect("nodes");
    let comfort = final_nodes
        .iter()
        .find(|n| n["label"] == "Comfort care")
        .expect("comfort care node");
    assert_eq!(comfort["count"], 1);

    assert!(config.output.dir.join("tables.xlsx").exists());
    Ok(())
}
