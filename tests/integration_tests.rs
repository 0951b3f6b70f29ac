use i94_etl::models::Dataset;
use i94_etl::processors::{processor_for, SourceProcessor};
use i94_etl::publish::LocalMirrorSync;
use i94_etl::readers::ColumnarReader;
use i94_etl::utils::constants::{DEFAULT_PARTITION_NAME, IMMIGRATION_MONTHS, PART_FILE_NAME};
use i94_etl::writers::ParquetWriter;
use i94_etl::{Pipeline, PipelineConfig, PipelineOptions, ProcessingError};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TEMPERATURE: &str = "\
dt,AverageTemperature,AverageTemperatureUncertainty,City,Country,Latitude,Longitude
1998-05-01,18.2,0.4,Boston,United States,42.59N,72.00W
2010-05-01,14.9,0.3,Boston,United States,42.59N,72.00W
2010-06-01,20.1,0.3,Boston,United States,42.59N,72.00W
2010-05-01,24.7,0.5,Austin,United States,29.74N,97.85W
2010-05-01,11.0,0.2,Aberdeen,United Kingdom,57.05N,2.15W
";

const AIRPORTS: &str = "\
ident,type,name,elevation_ft,continent,iso_country,iso_region,municipality,gps_code,iata_code,local_code,coordinates
KBOS,large_airport,General Edward Lawrence Logan International Airport,20,NA,US,US-MA,Boston,KBOS,BOS,BOS,\"-71.00520325, 42.36429977\"
KAUS,large_airport,Austin Bergstrom International Airport,542,NA,US,US-TX,Austin,KAUS,AUS,AUS,\"-97.66989899, 30.19449997\"
FYWH,large_airport,Hosea Kutako International Airport,5640,AF,NA,NA-KH,Windhoek,FYWH,WDH,,\"17.4709, -22.4799\"
XXXX,small_airport,Nowhere Strip,,NA,,,,,NWH,,\"0, 0\"
00AA,small_airport,Aero B Ranch Airport,3435,NA,US,US-KS,Leoti,00AA,,00AA,\"-101.473911, 38.704022\"
";

const DEMOGRAPHICS: &str = "\
City;State;Median Age;Male Population;Female Population;Total Population;Number of Veterans;Foreign-born;Average Household Size;State Code;Race;Count
Quincy;Massachusetts;41.0;44129;49500;93629;4147;32935;2.39;MA;White;58723
Quincy;Massachusetts;41.0;44129;49500;93629;4147;32935;2.39;MA;Asian;30473
Quincy;Massachusetts;41.0;44129;49500;93629;4147;32935;2.39;MA;Hispanic or Latino;2566
Quincy;Massachusetts;41.0;44129;49500;93629;4147;32935;2.39;MA;Black or African-American;2788
Austin;Texas;32.7;467553;463002;930555;37213;191270;2.54;TX;White;613734
Austin;Texas;32.7;467553;463002;930555;37213;191270;2.54;TX;Asian;71165
";

const IMMIGRATION_HEADER: &str =
    "cicid,i94yr,i94mon,i94port,i94addr,i94visa,arrdate,depdate,biryear,gender,visatype,i94mode,i94bir";

fn immigration_month(month: usize) -> String {
    let arrival = 20454 + (month as i64 - 1) * 30;
    let mut csv = format!(
        "{}\n\
         {m}1.0,2016.0,{m}.0,BOS,MA,2.0,{a}.0,{d}.0,1984.0,F,B2,1.0,32.0\n\
         {m}2.0,2016.0,{m}.0,AUS,TX,1.0,{a}.0,,1969.0,M,WT,1.0,47.0\n\
         {m}2.0,2016.0,{m}.0,AUS,TX,1.0,{a}.0,,1969.0,M,WT,1.0,47.0\n\
         {m}3.0,2016.0,{m}.0,BLA,,2.0,{a}.0,{d}.0,1990.0,M,B2,3.0,26.0\n",
        IMMIGRATION_HEADER,
        m = month,
        a = arrival,
        d = arrival + 7
    );
    // June carries deprecated extra columns
    if month == 6 {
        csv = csv
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("{},delete_days,delete_visa\n", line)
                } else {
                    format!("{},1.0,0.0\n", line)
                }
            })
            .collect();
    }
    csv
}

fn write_fixtures(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::with_local_root(root);
    config.processing.imm_file_extension = "csv".to_string();

    fs::create_dir_all(&config.local.imm_folder_loc).unwrap();
    fs::write(&config.local.temperature_file_loc, TEMPERATURE).unwrap();
    fs::write(&config.local.airport_file_loc, AIRPORTS).unwrap();
    fs::write(&config.local.demographics_file_loc, DEMOGRAPHICS).unwrap();
    for (i, month) in IMMIGRATION_MONTHS.iter().enumerate() {
        fs::write(config.immigration_file(month), immigration_month(i + 1)).unwrap();
    }

    let desc = config.description_dir();
    fs::create_dir_all(desc.join(".ipynb_checkpoints")).unwrap();
    fs::write(desc.join("i94_ports.json"), r#"{"BOS": "BOSTON, MA"}"#).unwrap();
    fs::write(desc.join(".ipynb_checkpoints/labels.ipynb"), "{}").unwrap();

    config
}

fn partition_bytes(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            let bytes = fs::read(e.path().join(PART_FILE_NAME)).unwrap();
            (name, bytes)
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_temperature_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());

    let report = processor_for(Dataset::Temperature, false)
        .process(&config)
        .unwrap();

    assert_eq!(report.rows_loaded, 5);
    assert_eq!(report.rows_written, 3);
    assert_eq!(report.partitions, 2);
    assert!(report.output_dir.join("city=Austin").is_dir());
    assert!(report.output_dir.join("city=Boston").is_dir());
    assert!(report.quality.all_passed());
}

#[test]
fn test_airport_partitions_by_country() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());

    let report = processor_for(Dataset::Airport, false).process(&config).unwrap();

    // Aero B Ranch has no IATA code
    assert_eq!(report.rows_written, 4);
    let info = ParquetWriter::new().inspect(&report.output_dir).unwrap();
    assert_eq!(
        info.partition_values,
        vec!["NA".to_string(), "US".to_string(), DEFAULT_PARTITION_NAME.to_string()]
    );
    assert_eq!(info.total_rows, 4);
}

#[test]
fn test_demographics_collapses_race_rows() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());

    let report = processor_for(Dataset::Demographics, false)
        .process(&config)
        .unwrap();

    assert_eq!(report.rows_loaded, 6);
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.quality.invariants.len(), 5);
    assert_eq!(report.quality.total_violations(), 0);

    let ma = ColumnarReader::new()
        .read_table(&report.output_dir.join("state_code=MA").join(PART_FILE_NAME))
        .unwrap();
    assert_eq!(ma.num_rows(), 1);
    assert!(!ma.schema().contains("state_code"));
}

#[test]
fn test_immigration_uses_january_schema() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());

    let report = processor_for(Dataset::Immigration, false)
        .process(&config)
        .unwrap();

    assert_eq!(report.rows_loaded, 48);
    // duplicate dropped, land arrival dropped
    assert_eq!(report.rows_written, 24);
    assert_eq!(report.partitions, 12);

    let june = ColumnarReader::new()
        .read_table(&report.output_dir.join("month=6").join(PART_FILE_NAME))
        .unwrap();
    assert_eq!(
        june.schema().names(),
        vec![
            "year",
            "airport_code",
            "address",
            "visa_code",
            "biryear",
            "gender",
            "visa_type",
            "stay_duration"
        ]
    );
    let stays: Vec<Option<i64>> = june
        .iter()
        .map(|row| row.opt_i64("stay_duration").unwrap())
        .collect();
    assert_eq!(stays, vec![Some(7), None]);
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());

    for dataset in [
        Dataset::Immigration,
        Dataset::Temperature,
        Dataset::Airport,
        Dataset::Demographics,
    ] {
        let processor = processor_for(dataset, false);
        let first = processor.process(&config).unwrap();
        let before = partition_bytes(&first.output_dir);

        // stale partitions from an earlier run must not survive
        fs::create_dir_all(first.output_dir.join("stale=1")).unwrap();
        fs::write(first.output_dir.join("stale=1").join(PART_FILE_NAME), b"old").unwrap();

        let second = processor.process(&config).unwrap();
        assert_eq!(partition_bytes(&second.output_dir), before);
    }
}

#[test]
fn test_missing_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());
    fs::remove_file(&config.local.airport_file_loc).unwrap();

    let result = processor_for(Dataset::Airport, false).process(&config);
    assert!(matches!(result, Err(ProcessingError::MissingInput { .. })));
}

#[tokio::test]
async fn test_pipeline_processes_and_publishes() {
    let dir = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());

    let pipeline = Pipeline::new(config, PipelineOptions::default());
    let report = pipeline
        .run(Box::new(LocalMirrorSync::new(remote.path())))
        .await
        .unwrap();

    let order: Vec<Dataset> = report.datasets.iter().map(|r| r.dataset).collect();
    assert_eq!(order, Dataset::PROCESSING_ORDER.to_vec());
    assert_eq!(report.published.len(), 5);

    let bucket = remote.path().join("local-bucket");
    assert!(bucket.join("immigration_description/i94_ports.json").is_file());
    assert!(!bucket.join("immigration_description/.ipynb_checkpoints").exists());
    assert!(bucket
        .join("immigration/month=1")
        .join(PART_FILE_NAME)
        .is_file());
    assert!(bucket.join("demographics/state_code=TX").is_dir());
    assert!(report.summary().contains("Published:"));
}

#[tokio::test]
async fn test_concurrent_run_matches_sequential() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());

    let sequential = Pipeline::new(
        config.clone(),
        PipelineOptions {
            skip_publish: true,
            ..PipelineOptions::default()
        },
    );
    let seq_report = sequential
        .run(Box::new(LocalMirrorSync::new(dir.path().join("unused"))))
        .await
        .unwrap();

    let concurrent = Pipeline::new(
        config,
        PipelineOptions {
            concurrent: true,
            skip_publish: true,
            ..PipelineOptions::default()
        },
    );
    let con_report = concurrent
        .run(Box::new(LocalMirrorSync::new(dir.path().join("unused"))))
        .await
        .unwrap();

    let rows = |r: &i94_etl::PipelineReport| -> Vec<(Dataset, usize)> {
        r.datasets.iter().map(|d| (d.dataset, d.rows_written)).collect()
    };
    assert_eq!(rows(&seq_report), rows(&con_report));
    assert!(con_report.published.is_empty());
    assert!(!dir.path().join("unused").exists());
}

#[tokio::test]
async fn test_failed_processor_publishes_nothing() {
    let dir = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    let config = write_fixtures(dir.path());
    fs::remove_file(config.immigration_file("nov")).unwrap();

    let pipeline = Pipeline::new(config, PipelineOptions::default());
    let result = pipeline
        .run(Box::new(LocalMirrorSync::new(remote.path())))
        .await;

    assert!(matches!(result, Err(ProcessingError::MissingInput { .. })));
    assert!(!remote.path().join("local-bucket").exists());
}
