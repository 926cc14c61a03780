use log::trace;

use crate::data_structs::bin_column_name;
use crate::error::{
    AnalysisError,
    StatResult,
};

/// Blank headers and the `Unnamed: <n>` form exporters emit for the tail of
/// a merged cell.
pub fn is_placeholder(header: &str) -> bool {
    let trimmed = header.trim();
    trimmed.is_empty() || trimmed.starts_with("Unnamed")
}

/// Expands merged-cell headers into bin columns.
///
/// A named header followed by `k` placeholders becomes
/// `"<name> bin 1"`..=`"<name> bin <k + 1>"`; named headers without trailing
/// placeholders are only trimmed.
pub fn normalize_headers<S: AsRef<str>>(headers: &[S]) -> StatResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(headers.len());
    // (index of the named header, its name, bins so far)
    let mut run: Option<(usize, String, usize)> = None;

    for (idx, header) in headers.iter().enumerate() {
        let header = header.as_ref();
        if !is_placeholder(header) {
            let name = header.trim().to_owned();
            normalized.push(name.clone());
            run = Some((idx, name, 1));
            continue;
        }
        let Some((origin, name, count)) = run.as_mut()
        else {
            return Err(AnalysisError::schema(format!(
                "placeholder header '{}' at position {} has no preceding named column",
                header, idx
            )));
        };
        *count += 1;
        if *count == 2 {
            normalized[*origin] = bin_column_name(name, 1);
        }
        normalized.push(bin_column_name(name, *count));
        trace!("Header {} renamed to '{}'", idx, normalized[idx]);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["Weight", "", ""], &["Weight bin 1", "Weight bin 2", "Weight bin 3"])]
    #[case(&["ID", "Weight", "Unnamed: 2", "Total Weight"], &["ID", "Weight bin 1", "Weight bin 2", "Total Weight"])]
    #[case(&[" Genotype ", "Week"], &["Genotype", "Week"])]
    #[case(
        &["A", " ", "B", "Unnamed: 3", "Unnamed: 4", "C"],
        &["A bin 1", "A bin 2", "B bin 1", "B bin 2", "B bin 3", "C"]
    )]
    fn test_normalize_headers(
        #[case] input: &[&str],
        #[case] expected: &[&str],
    ) {
        assert_eq!(normalize_headers(input).unwrap(), expected);
    }

    #[test]
    fn test_leading_placeholder() {
        assert!(matches!(
            normalize_headers(&["", "Weight"]),
            Err(AnalysisError::Schema(_))
        ));
        assert!(matches!(
            normalize_headers(&["Unnamed: 0"]),
            Err(AnalysisError::Schema(_))
        ));
    }

    #[test]
    fn test_empty() {
        assert!(normalize_headers::<&str>(&[]).unwrap().is_empty());
    }
}
