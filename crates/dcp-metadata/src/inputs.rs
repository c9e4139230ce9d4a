// crates/dcp-metadata/src/inputs.rs
//
// Process inputs file: a two-row TSV, parameter names on the first row and
// their values on the second.

use dcp_core::{DcpError, InputParameter};

pub fn parse_inputs_tsv(contents: &str) -> Result<Vec<InputParameter>, DcpError> {
    let mut rows = contents.lines().filter(|line| !line.trim().is_empty());
    let header = rows
        .next()
        .ok_or_else(|| DcpError::Validation("Inputs file is empty".to_string()))?;
    let values = rows.next().unwrap_or("");
    if rows.next().is_some() {
        return Err(DcpError::Validation(
            "Inputs file must have exactly one row of values".to_string(),
        ));
    }

    let names: Vec<&str> = header.split('\t').collect();
    let values: Vec<&str> = values.split('\t').collect();
    if names.len() != values.len() {
        return Err(DcpError::Validation(format!(
            "Inputs file has {} names but {} values",
            names.len(),
            values.len()
        )));
    }

    Ok(names
        .into_iter()
        .zip(values)
        .map(|(name, value)| InputParameter::new(name.trim(), value.trim_end_matches('\r')))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_values_in_order() {
        let tsv = "sample_id\tr1_fastq\tcount\nheart_1k\tgs://b/r1.fastq.gz\t3\n";
        let inputs = parse_inputs_tsv(tsv).unwrap();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0], InputParameter::new("sample_id", "heart_1k"));
        assert_eq!(inputs[1].parameter_value, "gs://b/r1.fastq.gz");
        assert_eq!(inputs[2].parameter_name, "count");
    }

    #[test]
    fn tolerates_crlf() {
        let inputs = parse_inputs_tsv("a\tb\r\n1\t2\r\n").unwrap();
        assert_eq!(inputs[1], InputParameter::new("b", "2"));
    }

    #[test]
    fn rejects_mismatched_columns() {
        assert!(matches!(
            parse_inputs_tsv("a\tb\n1\n"),
            Err(DcpError::Validation(_))
        ));
        assert!(matches!(parse_inputs_tsv(""), Err(DcpError::Validation(_))));
        assert!(parse_inputs_tsv("a\n1\n2\n").is_err());
    }
}
