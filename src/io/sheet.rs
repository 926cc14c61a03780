use std::fs::File;
use std::io::{
    BufReader,
    Read,
};
use std::path::Path;

use anyhow::{
    anyhow,
    Context,
};
use itertools::Itertools;
use log::info;

use super::header::normalize_headers;
use crate::data_structs::{
    RawTable,
    ScalarValue,
};

/// Reads a delimited sheet: the first record holds the (possibly merged)
/// headers, every following record one row. Empty cells are missing.
pub fn read_sheet<R: Read>(
    reader: R,
    delimiter: u8,
) -> anyhow::Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::default()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(false)
        .from_reader(reader);
    let mut records = csv_reader.records();

    let header_record = records
        .next()
        .ok_or_else(|| anyhow!("sheet is empty"))?
        .context("Failed to read header row")?;
    let headers = normalize_headers(&header_record.iter().collect_vec())?;

    let rows = records
        .enumerate()
        .map(|(idx, record)| {
            let record = record.with_context(|| format!("Failed to read row {}", idx + 1))?;
            Ok(record.iter().map(ScalarValue::parse_cell).collect_vec())
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let table = RawTable::try_from_rows(headers, rows)?;
    info!(
        "Read sheet with {} rows, {} columns and bin groups {:?}",
        table.height(),
        table.width(),
        table.bin_groups()
    );
    Ok(table)
}

/// Reads a sheet from disk. `.tsv`/`.tab` files are tab separated, anything
/// else comma separated.
pub fn read_sheet_path<P: AsRef<Path>>(path: P) -> anyhow::Result<RawTable> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    };
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_sheet(BufReader::new(file), delimiter)
        .with_context(|| format!("Failed to read sheet {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use polars::prelude::DataType;

    use super::*;
    use crate::error::AnalysisError;

    const SHEET: &str = "\
Genotype,Week,Weight,Unnamed: 3,Unnamed: 4,Total Weight
WT,1,10,11,12,33
WT,2,12,,14,26
KO,1,9,10,11,30
";

    #[test]
    fn test_read_sheet() {
        let table = read_sheet(SHEET.as_bytes(), b',').unwrap();
        assert_eq!(table.column_names(), vec![
            "Genotype",
            "Week",
            "Weight bin 1",
            "Weight bin 2",
            "Weight bin 3",
            "Total Weight"
        ]);
        assert_eq!(table.height(), 3);
        assert_eq!(table.bin_count("Weight"), 3);
        assert_eq!(table.column("Week").unwrap().dtype(), &DataType::Float64);
        assert_eq!(table.cell("Weight bin 2", 1).unwrap(), None);
    }

    #[test]
    fn test_read_sheet_path() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        file.write_all(SHEET.replace(',', "\t").as_bytes()).unwrap();
        let table = read_sheet_path(file.path()).unwrap();
        assert_eq!(table.bin_groups(), vec!["Weight".to_string()]);
        assert_eq!(table.aggregate_column("Weight").unwrap(), "Total Weight");
    }

    #[test]
    fn test_invalid_sheets() {
        assert!(read_sheet("".as_bytes(), b',').is_err());
        assert!(read_sheet("A,B\n1,2,3\n".as_bytes(), b',').is_err());

        let err = read_sheet(",A\n1,2\n".as_bytes(), b',').unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::Schema(_))
        ));
        assert!(read_sheet_path("/definitely/not/here.csv").is_err());
    }
}
