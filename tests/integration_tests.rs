use catalog::{process, run, PipelineConfig, PipelineError, RowCounts};
use std::fs;
use tempfile::tempdir;

const CATALOG: &str = "ProductID,Name,Price,Category
1,Widget,25.00,Tools
2,Phone,600.00,Electronics

3,Cable,15.00,Electronics
4,Broken,12.50
5,Laptop,555.00,Electronics
6,Tv,1200,Electronics
7,Pen,10.00,Office
8,Chair,100.00,Furniture
9,Desk,500.00,Furniture
10,Couch,500.01,Furniture
eleven,Bad,1.00,Office
12,Bad,1.0e2,Office
";

const EXPECTED: &str = "ProductID,Name,Price,Category,PriceRange
1,WIDGET,25.00,Tools,Medium
2,PHONE,540.00,Premium Electronics,Premium
3,CABLE,13.50,Electronics,Medium
5,LAPTOP,499.50,Electronics,High
6,TV,1080.00,Premium Electronics,Premium
7,PEN,10.00,Office,Low
8,CHAIR,100.00,Furniture,Medium
9,DESK,500.00,Furniture,High
10,COUCH,500.01,Furniture,Premium
";

#[test]
fn sanity() {
    let mut output = Vec::new();
    let input = "ProductID,Name,Price,Category\n1,Widget,25.00,Tools\n";
    let counts = process(input.as_bytes(), &mut output).unwrap();

    assert_eq!(
        output,
        b"ProductID,Name,Price,Category,PriceRange\n1,WIDGET,25.00,Tools,Medium\n"
    );
    assert_eq!(
        counts,
        RowCounts {
            rows_read: 1,
            rows_transformed: 1,
            rows_skipped: 0,
        }
    );
}

#[test]
fn transforms_catalog_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("products.csv");
    let output = dir.path().join("out").join("nested").join("transformed_products.csv");
    fs::write(&input, CATALOG).unwrap();

    let summary = run(&PipelineConfig::new(&input, &output)).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), EXPECTED);
    assert_eq!(
        summary.counts,
        RowCounts {
            rows_read: 12,
            rows_transformed: 9,
            rows_skipped: 3,
        }
    );
    assert_eq!(summary.output_path, output);
    for line in EXPECTED.lines() {
        assert_eq!(line.split(',').count(), 5);
    }
}

#[test]
fn rerun_produces_identical_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("products.csv");
    let output = dir.path().join("transformed_products.csv");
    fs::write(&input, CATALOG).unwrap();
    let config = PipelineConfig::new(&input, &output);

    let first_summary = run(&config).unwrap();
    let first = fs::read(&output).unwrap();
    let second_summary = run(&config).unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_summary, second_summary);
}

#[test]
fn empty_input_writes_header_only() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("products.csv");
    let output = dir.path().join("transformed_products.csv");
    fs::write(&input, "").unwrap();

    let summary = run(&PipelineConfig::new(&input, &output)).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "ProductID,Name,Price,Category,PriceRange\n"
    );
    assert_eq!(summary.counts, RowCounts::default());
}

#[test]
fn missing_input_creates_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("products.csv");
    let output_dir = dir.path().join("data");
    let output = output_dir.join("transformed_products.csv");

    let err = run(&PipelineConfig::new(&input, &output)).unwrap_err();

    assert!(matches!(err, PipelineError::MissingInput(ref path) if *path == input));
    assert!(!output_dir.exists());
    assert!(!output.exists());
    let message = err.to_string();
    let lines: Vec<&str> = message.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("ERROR: Missing input file at "));
    assert_eq!(lines[1], "Program exiting without processing.");
}

#[test]
fn unwritable_output_is_io_failure() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("products.csv");
    fs::write(&input, CATALOG).unwrap();
    // a directory cannot be opened as the output file
    let output = dir.path().join("taken");
    fs::create_dir(&output).unwrap();

    let err = run(&PipelineConfig::new(&input, &output)).unwrap_err();

    assert!(matches!(err, PipelineError::Io(_)));
    assert_eq!(
        err.to_string(),
        "ERROR: An I/O error occurred while processing files.\nProgram exiting cleanly."
    );
}

#[test]
fn default_paths() {
    let config = PipelineConfig::default();
    assert_eq!(config.input_path.to_str(), Some("data/products.csv"));
    assert_eq!(config.output_path.to_str(), Some("data/transformed_products.csv"));
}
