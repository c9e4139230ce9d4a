// crates/dcp-core/src/format.rs
//
// File format and MIME type inference from file names.
//
// `format_from_name` walks an ordered regex table and returns the format of
// the first pattern that matches, so more specific suffixes (`.csv.gz`) must
// be listed before the suffixes they contain (`.csv`). Both lookups ignore
// case. MIME types not pinned here come from the `mime_guess` database.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Format returned when no pattern matches.
pub const UNKNOWN_FORMAT: &str = "unknown";

/// Ordered (pattern, format) pairs. First match wins.
const FORMAT_PATTERNS: &[(&str, &str)] = &[
    (r"\.zarr!", "zarr"),
    (r"\.bam$", "bam"),
    (r"\.bai$", "bai"),
    (r"\.loom$", "loom"),
    (r"\.(fasta|fa)\.gz$", "fasta.gz"),
    (r"\.(fasta|fa)$", "fasta"),
    (r"\.h5ad$", "h5ad"),
    (r"\.h5$", "h5"),
    (r"\.mtx$", "mtx"),
    (r"\.npz$", "npz"),
    (r"\.npy$", "npy"),
    (r"\.csv\.gz$", "csv.gz"),
    (r"\.csv$", "csv"),
    (r"\.tsv\.gz$", "tsv.gz"),
    (r"\.tsv$", "tsv"),
    (r"\.gtf\.gz$", "gtf.gz"),
    (r"\.gtf$", "gtf"),
    (r"\.(fastq|fq)\.gz$", "fastq.gz"),
    (r"\.tar(\.gz)?$", "tar"),
    (r"\.bed$", "bed"),
    (r"\.txt$", "txt"),
    (r"\.json$", "json"),
    (r"\.log$", "log"),
];

static FORMAT_TABLE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    FORMAT_PATTERNS
        .iter()
        .filter_map(|(pattern, format)| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .ok()
                .map(|re| (re, *format))
        })
        .collect()
});

/// Infer the file format from a path or URL.
pub fn format_from_name(path: &str) -> &'static str {
    FORMAT_TABLE
        .iter()
        .find(|(re, _)| re.is_match(path))
        .map(|(_, format)| *format)
        .unwrap_or(UNKNOWN_FORMAT)
}

/// Last path segment of a local path or cloud URL.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Final extension of the file name, including the dot (`.bam`).
///
/// Returns an empty string for names without an extension or dot-files.
pub fn extension_of(path: &str) -> &str {
    let name = file_name_of(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}

/// MIME type for the file, defaulting to `application/unknown`.
///
/// Genomics formats are pinned; other extensions fall back to `mime_guess`.
pub fn content_type_for(path: &str) -> &'static str {
    let name = file_name_of(path).to_ascii_lowercase();
    if name.ends_with(".loom") {
        return "application/vnd.loom";
    }
    if name.ends_with(".bam") || name.ends_with(".fa") || name.ends_with(".fasta") {
        return "application/octet-stream";
    }

    match extension_of(&name) {
        ".log" => "text/plain",
        ".tsv" => "text/tab-separated-values",
        ".gz" => "application/gzip",
        ".h5" | ".h5ad" => "application/x-hdf5",
        ".bai" | ".npy" | ".npz" | ".mtx" => "application/octet-stream",
        _ => mime_guess::from_path(&name)
            .first_raw()
            .unwrap_or("application/unknown"),
    }
}
