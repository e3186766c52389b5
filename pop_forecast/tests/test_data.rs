use pop_forecast::data::{DataLoader, EntityRecord, LoaderConfig, PopulationSeries};
use pop_forecast::ForecastError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "Rank,CCA3,Country/Territory,Capital,Continent,2022 Population,2020 Population,2015 Population,2010 Population,2000 Population,1990 Population,1980 Population,1970 Population,Area (km²),Density (per km²),Growth Rate,World Population Percentage";

fn cells(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(label, count)| (label.to_string(), count.to_string()))
        .collect()
}

#[test]
fn test_normalize_sorts_by_year() {
    let record = EntityRecord::new(
        "ABC",
        cells(&[
            ("2022 Population", "300"),
            ("1970 Population", "100"),
            ("2000 Population", " 200 "),
        ]),
    );

    let series = record.normalize().unwrap();
    assert_eq!(series.entity(), "ABC");
    assert_eq!(series.years(), vec![1970, 2000, 2022]);
    assert_eq!(series.values(), vec![100.0, 200.0, 300.0]);
    assert_eq!(series.latest().map(|o| o.population), Some(300));
}

#[test]
fn test_bare_year_labels() {
    let series =
        PopulationSeries::from_labeled("ABC", [("1980", "5"), ("1970", "4")]).unwrap();
    assert_eq!(series.years(), vec![1970, 1980]);
}

#[rstest]
#[case::bad_label(&[("Population", "100")])]
#[case::negative_count(&[("1970 Population", "-5")])]
#[case::decimal_count(&[("1970 Population", "12.5")])]
#[case::empty_count(&[("1970 Population", "")])]
#[case::duplicate_year(&[("1970 Population", "1"), ("1970", "2")])]
fn test_malformed_rows(#[case] pairs: &[(&str, &str)]) {
    let record = EntityRecord::new("BAD", cells(pairs));

    match record.normalize() {
        Err(ForecastError::MalformedSeries { entity, .. }) => assert_eq!(entity, "BAD"),
        other => panic!("expected MalformedSeries, got {:?}", other),
    }
}

#[test]
fn test_from_counts() {
    let record = EntityRecord::from_counts("XYZ", &[1970, 1980], &[7, 9]).with_name("Xyzland");
    let series = record.normalize().unwrap();

    assert_eq!(record.name.as_deref(), Some("Xyzland"));
    assert_eq!(series.values(), vec![7.0, 9.0]);
}

#[test]
fn test_loader_reads_wide_table() {
    let csv = format!(
        "{}\n\
         1,CHN,China,Beijing,Asia,1425887337,1424929781,1393715448,1348191368,1264099069,1153704252,982372466,822534450,9706961,146.8933,1.0000,17.88\n\
         2,IND,India,New Delhi,Asia,1417173173,1396387127,1322866505,1240613620,1059633675,870452165,696828385,557501301,3287590,431.0675,1.0068,17.77\n",
        HEADER
    );

    let records = DataLoader::from_reader(csv.as_bytes(), &LoaderConfig::default()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "CHN");
    assert_eq!(records[0].name.as_deref(), Some("China"));
    assert_eq!(records[0].cells.len(), 8);

    let india = records[1].normalize().unwrap();
    assert_eq!(
        india.years(),
        vec![1970, 1980, 1990, 2000, 2010, 2015, 2020, 2022]
    );
    assert_eq!(india.latest().map(|o| o.population), Some(1417173173));
}

#[test]
fn test_loader_keeps_bad_cells_raw() {
    let csv = format!(
        "{}\n\
         1,AAA,Alpha,A,Asia,10,9,8,7,6,5,4,3,1,1,1,1\n\
         2,BBB,Beta,B,Asia,N/A,9,8,7,6,5,4,3,1,1,1,1\n",
        HEADER
    );

    let records = DataLoader::from_reader(csv.as_bytes(), &LoaderConfig::default()).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].normalize().is_ok());
    assert!(matches!(
        records[1].normalize(),
        Err(ForecastError::MalformedSeries { .. })
    ));
}

#[test]
fn test_loader_short_rows_become_empty_cells() {
    let csv = "CCA3,1970,1980,1990\nAAA,1,2\n";
    let records = DataLoader::from_reader(csv.as_bytes(), &LoaderConfig::default()).unwrap();

    assert_eq!(records[0].cells[2], ("1990".to_string(), String::new()));
}

#[rstest]
#[case::missing_id_column("Code,1970 Population\nAAA,1\n")]
#[case::no_year_columns("CCA3,Area\nAAA,1\n")]
#[case::empty_id("CCA3,1970 Population\n ,1\n")]
#[case::duplicate_id("CCA3,1970 Population\nAAA,1\nAAA,2\n")]
fn test_loader_rejects_bad_tables(#[case] csv: &str) {
    let result = DataLoader::from_reader(csv.as_bytes(), &LoaderConfig::default());
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_loader_custom_columns() {
    let config = LoaderConfig {
        id_column: "iso".to_string(),
        name_column: None,
        year_suffix: "_pop".to_string(),
    };
    let csv = "iso,1970_pop,1980_pop,note\nAAA,1,2,x\n";

    let records = DataLoader::from_reader(csv.as_bytes(), &config).unwrap();
    assert_eq!(records[0].name, None);
    assert_eq!(records[0].normalize().unwrap().years(), vec![1970, 1980]);
}

#[test]
fn test_from_csv_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "CCA3,Country/Territory,1970 Population,1980 Population").unwrap();
    writeln!(file, "AAA,Alpha,1,2").unwrap();

    let records = DataLoader::from_csv(file.path(), &LoaderConfig::default()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name.as_deref(), Some("Alpha"));
}

#[test]
fn test_from_csv_missing_file() {
    let result = DataLoader::from_csv("does/not/exist.csv", &LoaderConfig::default());
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}
