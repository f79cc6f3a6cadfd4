use crate::product::Product;
use crate::transform::transform;
use csv::{QuoteStyle, WriterBuilder};
use log::{debug, info, warn};
use std::borrow::Cow;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_INPUT_PATH: &str = "data/products.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/transformed_products.csv";

/// Written as the first output line whatever the input header says.
pub const OUTPUT_HEADER: [&str; 5] = ["ProductID", "Name", "Price", "Category", "PriceRange"];

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl PipelineConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::new(DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH)
    }
}

/// Failures that abort the whole run. The display text is what the user sees
/// on stdout.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("ERROR: Missing input file at {}\nProgram exiting without processing.", .0.display())]
    MissingInput(PathBuf),
    #[error("ERROR: An I/O error occurred while processing files.\nProgram exiting cleanly.")]
    Io(#[from] io::Error),
    #[error("ERROR: An I/O error occurred while processing files.\nProgram exiting cleanly.")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    /// Non-header, non-blank lines.
    pub rows_read: usize,
    pub rows_transformed: usize,
    pub rows_skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub counts: RowCounts,
    pub output_path: PathBuf,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run Summary")?;
        writeln!(f, "Rows read (non-header): {}", self.counts.rows_read)?;
        writeln!(f, "Rows transformed (written): {}", self.counts.rows_transformed)?;
        writeln!(f, "Rows skipped: {}", self.counts.rows_skipped)?;
        writeln!(f, "Output file written: {}", self.output_path.display())
    }
}

/// Runs the whole job: input file in, output file and summary out.
///
/// A missing input file is reported before anything is created on disk. Any
/// I/O failure after that aborts the run and leaves whatever was already
/// written in place.
pub fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    if !config.input_path.exists() {
        return Err(PipelineError::MissingInput(config.input_path.clone()));
    }

    if let Some(parent) = config.output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("creating output directory {}", parent.display());
            fs::create_dir_all(parent)?;
        }
    }

    info!(
        "transforming {} into {}",
        config.input_path.display(),
        config.output_path.display()
    );
    let input = File::open(&config.input_path)?;
    let output = File::create(&config.output_path)?;
    let counts = process(input, output)?;
    debug!("finished with {:?}", counts);

    Ok(RunSummary {
        counts,
        output_path: config.output_path.clone(),
    })
}

/// Streams `input` line by line into `output`.
///
/// The first line is the header and is dropped. Blank lines are ignored and
/// not counted. Malformed lines are counted as skipped and never written.
pub fn process<R: io::Read, W: io::Write>(input: R, output: W) -> Result<RowCounts, PipelineError> {
    let mut lines = read_lines(BufReader::new(input));
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(output);

    let header = lines.next().transpose()?;
    writer.write_record(OUTPUT_HEADER)?;

    let mut counts = RowCounts::default();
    if header.is_none() {
        writer.flush()?;
        return Ok(counts);
    }

    for (line, line_number) in lines.zip(2..) {
        let line = line?;
        let line = decode_line(&line);
        if line.trim().is_empty() {
            continue;
        }

        counts.rows_read += 1;
        match line.parse::<Product>() {
            Ok(product) => {
                writer.serialize(transform(&product))?;
                counts.rows_transformed += 1;
            }
            Err(err) => {
                warn!("skipping line {}: {}", line_number, err);
                counts.rows_skipped += 1;
            }
        }
    }

    writer.flush()?;
    Ok(counts)
}

/// Splits on `\n`, `\r\n` and a lone `\r`, without the terminators.
fn read_lines<B: BufRead>(input: B) -> impl Iterator<Item = io::Result<Vec<u8>>> {
    input.split(b'\n').flat_map(|chunk| {
        let lines: Vec<io::Result<Vec<u8>>> = match chunk {
            Err(err) => vec![Err(err)],
            Ok(chunk) => {
                let mut pieces: Vec<&[u8]> = chunk.split(|&b| b == b'\r').collect();
                if chunk.ends_with(b"\r") {
                    pieces.pop();
                }
                pieces.into_iter().map(|piece| Ok(piece.to_vec())).collect()
            }
        };
        lines
    })
}

fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
fn process_str(input: &str) -> (String, RowCounts) {
    let mut output = Vec::new();
    let counts = process(input.as_bytes(), &mut output).unwrap();
    (String::from_utf8(output).unwrap(), counts)
}

#[test]
fn header_only_for_empty_input() {
    let (output, counts) = process_str("");
    assert_eq!(output, "ProductID,Name,Price,Category,PriceRange\n");
    assert_eq!(counts, RowCounts::default());
}

#[test]
fn input_header_is_ignored() {
    let (output, counts) = process_str("whatever,goes,here\n1,Widget,25.00,Tools\n");
    assert_eq!(
        output,
        "ProductID,Name,Price,Category,PriceRange\n1,WIDGET,25.00,Tools,Medium\n"
    );
    assert_eq!(counts.rows_read, 1);
    assert_eq!(counts.rows_transformed, 1);
}

#[test]
fn blank_lines_are_not_counted() {
    let (output, counts) = process_str(
        "ProductID,Name,Price,Category\n1,Widget,25.00,Tools\n\n   \n\t\n3,Cable,15.00,Electronics\n",
    );
    assert_eq!(
        output,
        "ProductID,Name,Price,Category,PriceRange\n\
         1,WIDGET,25.00,Tools,Medium\n\
         3,CABLE,13.50,Electronics,Medium\n"
    );
    assert_eq!(
        counts,
        RowCounts {
            rows_read: 2,
            rows_transformed: 2,
            rows_skipped: 0,
        }
    );
}

#[test]
fn blank_first_line_is_the_header() {
    let (output, counts) = process_str("\n1,Widget,25.00,Tools\n");
    assert!(output.ends_with("1,WIDGET,25.00,Tools,Medium\n"));
    assert_eq!(counts.rows_transformed, 1);
}

#[test]
fn malformed_rows_are_isolated() {
    let (output, counts) = process_str(
        "h\n1,Widget,25.00\nx,Widget,25.00,Tools\n2,Gadget,cheap,Tools\n2,Phone,600.00,Electronics\n",
    );
    assert_eq!(
        output,
        "ProductID,Name,Price,Category,PriceRange\n2,PHONE,540.00,Premium Electronics,Premium\n"
    );
    assert_eq!(
        counts,
        RowCounts {
            rows_read: 4,
            rows_transformed: 1,
            rows_skipped: 3,
        }
    );
}

#[test]
fn crlf_input_and_missing_trailing_newline() {
    let (output, counts) = process_str("h\r\n1,Widget,25.00,Tools\r\n4,Lamp,9.999,Home");
    assert_eq!(
        output,
        "ProductID,Name,Price,Category,PriceRange\n\
         1,WIDGET,25.00,Tools,Medium\n\
         4,LAMP,10.00,Home,Low\n"
    );
    assert_eq!(counts.rows_read, 2);
}

#[test]
fn lone_carriage_returns_end_lines() {
    let (output, counts) =
        process_str("h\r1,Widget,25.00,Tools\r\r2,Phone,600.00,Electronics\r");
    assert_eq!(
        output,
        "ProductID,Name,Price,Category,PriceRange\n\
         1,WIDGET,25.00,Tools,Medium\n\
         2,PHONE,540.00,Premium Electronics,Premium\n"
    );
    assert_eq!(
        counts,
        RowCounts {
            rows_read: 2,
            rows_transformed: 2,
            rows_skipped: 0,
        }
    );
}

#[test]
fn blank_crlf_first_line_is_the_header() {
    let (output, counts) = process_str("\r\n1,Widget,25.00,Tools\r\n");
    assert!(output.ends_with("1,WIDGET,25.00,Tools,Medium\n"));
    assert_eq!(counts.rows_read, 1);
}

#[test]
fn invalid_utf8_is_replaced() {
    let mut output = Vec::new();
    let counts = process(&b"h\n1,Wid\xffget,25.00,Tools\n"[..], &mut output).unwrap();
    assert_eq!(counts.rows_transformed, 1);
    assert!(String::from_utf8(output)
        .unwrap()
        .ends_with("1,WID\u{FFFD}GET,25.00,Tools,Medium\n"));
}

#[cfg(test)]
struct BrokenReader {
    data: Option<&'static [u8]>,
}

#[cfg(test)]
impl io::Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.take() {
            Some(data) => {
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
            None => Err(io::Error::new(io::ErrorKind::Other, "device gone")),
        }
    }
}

#[cfg(test)]
struct FullDisk {
    room: usize,
    written: Vec<u8>,
}

#[cfg(test)]
impl io::Write for FullDisk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.room == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left"));
        }
        let n = buf.len().min(self.room);
        self.written.extend_from_slice(&buf[..n]);
        self.room -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn read_failure_mid_stream_keeps_partial_output() {
    let input = BrokenReader {
        data: Some(&b"h\n1,Widget,25.00,Tools\n"[..]),
    };
    let mut output = Vec::new();

    let result = process(input, &mut output);

    assert!(matches!(result, Err(PipelineError::Io(_))));
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "ProductID,Name,Price,Category,PriceRange\n1,WIDGET,25.00,Tools,Medium\n"
    );
}

#[test]
fn write_failure_aborts_and_keeps_partial_output() {
    let mut disk = FullDisk {
        room: 10,
        written: Vec::new(),
    };

    let result = process("h\n1,Widget,25.00,Tools\n".as_bytes(), &mut disk);

    assert!(matches!(
        result,
        Err(PipelineError::Io(_)) | Err(PipelineError::Csv(_))
    ));
    assert_eq!(disk.written, b"ProductID,");
}

#[test]
fn quotes_are_plain_characters() {
    let (output, counts) = process_str("h\n5,\"Big\" Box,12,Home\n6,\"a,b\",1,Home\n");
    assert!(output.ends_with("5,\"BIG\" BOX,12.00,Home,Medium\n"));
    assert_eq!(counts.rows_skipped, 1);
}

#[test]
fn summary_block() {
    let summary = RunSummary {
        counts: RowCounts {
            rows_read: 5,
            rows_transformed: 4,
            rows_skipped: 1,
        },
        output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
    };
    assert_eq!(
        summary.to_string(),
        "Run Summary\n\
         Rows read (non-header): 5\n\
         Rows transformed (written): 4\n\
         Rows skipped: 1\n\
         Output file written: data/transformed_products.csv\n"
    );
}

#[test]
fn error_messages() {
    let missing = PipelineError::MissingInput(PathBuf::from(DEFAULT_INPUT_PATH));
    assert_eq!(
        missing.to_string(),
        "ERROR: Missing input file at data/products.csv\nProgram exiting without processing."
    );
    let io_error = PipelineError::from(io::Error::new(io::ErrorKind::Other, "disk full"));
    assert_eq!(
        io_error.to_string(),
        "ERROR: An I/O error occurred while processing files.\nProgram exiting cleanly."
    );
}
