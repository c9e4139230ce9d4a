// crates/dcp-metadata/src/reference.rs
//
// Reference files (genomes, annotations, indices) used by a pipeline, and the
// enumerations their documents are validated against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use dcp_core::{file_name_of, format_from_name, uuid5, DcpError};

use crate::documents::{FileCore, FileDescriptor, Provenance, ReferenceFile, TextLabel};
use crate::files::{build_file_descriptor, FileContent, FILE_SOURCE};
use crate::schema::SchemaUrls;

/// Known species: (genus species, NCBI taxon id).
pub const SPECIES: &[(&str, u32)] = &[("Homo sapiens", 9606), ("Mus musculus", 10090)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyType {
    Primary,
    Complete,
    Patch,
}

impl AssemblyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyType::Primary => "primary assembly",
            AssemblyType::Complete => "complete assembly",
            AssemblyType::Patch => "patch assembly",
        }
    }
}

impl FromStr for AssemblyType {
    type Err = DcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_end_matches(" assembly") {
            "primary" => Ok(AssemblyType::Primary),
            "complete" => Ok(AssemblyType::Complete),
            "patch" => Ok(AssemblyType::Patch),
            _ => Err(DcpError::Validation(format!(
                "Unknown assembly type {:?}; expected primary, complete, or patch",
                s
            ))),
        }
    }
}

impl fmt::Display for AssemblyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    GenomeSequence,
    TranscriptomeSequence,
    AnnotationReference,
    TranscriptomeIndex,
    GenomeSequenceIndex,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::GenomeSequence => "genome sequence",
            ReferenceType::TranscriptomeSequence => "transcriptome sequence",
            ReferenceType::AnnotationReference => "annotation reference",
            ReferenceType::TranscriptomeIndex => "transcriptome index",
            ReferenceType::GenomeSequenceIndex => "genome sequence index",
        }
    }
}

impl FromStr for ReferenceType {
    type Err = DcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "genome sequence" => Ok(ReferenceType::GenomeSequence),
            "transcriptome sequence" => Ok(ReferenceType::TranscriptomeSequence),
            "annotation reference" => Ok(ReferenceType::AnnotationReference),
            "transcriptome index" => Ok(ReferenceType::TranscriptomeIndex),
            "genome sequence index" => Ok(ReferenceType::GenomeSequenceIndex),
            _ => Err(DcpError::Validation(format!("Unknown reference type {:?}", s))),
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `genus_species` is known and matches `ncbi_taxon_id`.
pub fn validate_species(genus_species: &str, ncbi_taxon_id: u32) -> Result<(), DcpError> {
    match SPECIES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(genus_species.trim()))
    {
        Some((_, id)) if *id == ncbi_taxon_id => Ok(()),
        Some((name, id)) => Err(DcpError::Validation(format!(
            "Taxon id {} does not match {} ({})",
            ncbi_taxon_id, name, id
        ))),
        None => Err(DcpError::Validation(format!(
            "Unknown species {:?}",
            genus_species
        ))),
    }
}

/// Everything needed to describe one reference file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceInput {
    pub path: String,
    pub size: u64,
    pub sha256: String,
    #[serde(default)]
    pub crc32c: String,
    pub creation_time: String,
    pub genus_species: String,
    pub ncbi_taxon_id: u32,
    pub assembly_type: AssemblyType,
    pub reference_type: ReferenceType,
    pub reference_version: String,
}

/// Reference file document plus the descriptor for its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBundle {
    pub reference_file: ReferenceFile,
    pub file_descriptor: FileDescriptor,
}

/// Build a reference file document. Its id is uuid5 of the file's sha256, so
/// the same bytes always map to the same reference.
pub fn build_reference_file(
    input: &ReferenceInput,
    urls: &SchemaUrls<'_>,
    workspace_version: &str,
) -> Result<ReferenceBundle, DcpError> {
    validate_species(&input.genus_species, input.ncbi_taxon_id)?;
    if input.sha256.trim().is_empty() {
        return Err(DcpError::Validation(format!(
            "Reference {} has no sha256",
            input.path
        )));
    }

    let document_id = uuid5(&input.sha256);
    let reference_file = ReferenceFile {
        described_by: urls.reference_file(),
        schema_type: "file".to_string(),
        file_core: FileCore {
            file_name: file_name_of(&input.path).to_string(),
            format: format_from_name(&input.path).to_string(),
            file_source: FILE_SOURCE.to_string(),
            content_description: Vec::new(),
        },
        reference_type: input.reference_type.to_string(),
        assembly_type: input.assembly_type.to_string(),
        genus_species: vec![TextLabel::new(input.genus_species.trim())],
        ncbi_taxon_id: vec![input.ncbi_taxon_id],
        reference_version: input.reference_version.clone(),
        provenance: Provenance::new(document_id.clone(), workspace_version),
    };

    let content = FileContent {
        path: &input.path,
        size: input.size,
        sha256: &input.sha256,
        crc32c: &input.crc32c,
        creation_time: &input.creation_time,
    };
    let file_descriptor = build_file_descriptor(urls, workspace_version, &content, &document_id)?;

    tracing::debug!("Reference file {} -> {}", input.path, document_id);
    Ok(ReferenceBundle {
        reference_file,
        file_descriptor,
    })
}
