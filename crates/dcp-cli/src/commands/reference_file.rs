// crates/dcp-cli/src/commands/reference_file.rs
//
// `dcp create-reference-file`: describe a local reference file (genome,
// annotation, index) as a reference_file document plus its descriptor.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use sha2::{Digest, Sha256};

use dcp_core::{DcpError, OutputSink};
use dcp_metadata::{
    build_reference_file, AssemblyType, ReferenceInput, ReferenceType, SchemaUrls,
    SchemaVersions,
};

use super::Context;

pub const REFERENCE_FILE_JSON: &str = "reference_file.json";

#[derive(Debug, Args)]
pub struct ReferenceFileCmd {
    /// Local path of the reference file.
    #[arg(long = "file_path")]
    pub file_path: String,

    /// Genus and species, e.g. "Homo sapiens".
    #[arg(long = "genus_species")]
    pub genus_species: String,

    #[arg(long = "ncbi_taxon_id")]
    pub ncbi_taxon_id: u32,

    /// primary, complete, or patch.
    #[arg(long = "assembly_type")]
    pub assembly_type: String,

    /// e.g. "genome sequence" or "transcriptome index".
    #[arg(long = "reference_type")]
    pub reference_type: String,

    #[arg(long = "reference_version")]
    pub reference_version: String,

    #[arg(long = "schema_url")]
    pub schema_url: String,

    #[arg(long = "workspace_version")]
    pub workspace_version: String,

    /// Hex crc32c of the file, when known.
    #[arg(long, default_value = "")]
    pub crc32c: String,
}

/// Size and lowercase hex sha256 of a file, read in chunks.
pub fn hash_file(path: &Path) -> Result<(u64, String), DcpError> {
    let mut file = File::open(path)
        .map_err(|e| DcpError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 1 << 16];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((size, hex::encode(hasher.finalize())))
}

fn modified_time(path: &Path) -> Result<String, DcpError> {
    let modified: DateTime<Utc> = path.metadata()?.modified()?.into();
    Ok(modified.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string())
}

/// Run the create-reference-file command.
pub async fn run(ctx: &Context, cmd: &ReferenceFileCmd) -> Result<(), DcpError> {
    let assembly_type: AssemblyType = cmd.assembly_type.parse()?;
    let reference_type: ReferenceType = cmd.reference_type.parse()?;

    let path = Path::new(&cmd.file_path);
    let (size, sha256) = hash_file(path)?;
    let input = ReferenceInput {
        path: cmd.file_path.clone(),
        size,
        sha256,
        crc32c: cmd.crc32c.clone(),
        creation_time: modified_time(path)?,
        genus_species: cmd.genus_species.clone(),
        ncbi_taxon_id: cmd.ncbi_taxon_id,
        assembly_type,
        reference_type,
        reference_version: cmd.reference_version.clone(),
    };

    let versions = SchemaVersions::default();
    let urls = SchemaUrls::new(&cmd.schema_url, &versions);
    let bundle = build_reference_file(&input, &urls, &cmd.workspace_version)?;

    let sink = ctx.sink();
    let document_id = &bundle.reference_file.provenance.document_id;
    sink.write_json(
        REFERENCE_FILE_JSON,
        &serde_json::json!({ "input": input, "documents": &bundle }),
    )?;
    sink.write_document(
        "reference_file",
        document_id,
        &cmd.workspace_version,
        &serde_json::to_value(&bundle.reference_file)?,
    )?;
    sink.write_document(
        "file_descriptor",
        &bundle.file_descriptor.provenance.document_id,
        &cmd.workspace_version,
        &serde_json::to_value(&bundle.file_descriptor)?,
    )?;

    tracing::info!("Reference {} is document {}", cmd.file_path, document_id);
    println!("{}", document_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use std::fs;

    #[test]
    fn hashes_file_contents() {
        let path = std::env::temp_dir().join(format!("dcp_ref_{}.fa", uuid::Uuid::new_v4()));
        fs::write(&path, b"test").unwrap();
        let (size, sha256) = hash_file(&path).unwrap();
        assert_eq!(size, 4);
        assert_eq!(
            sha256,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn writes_reference_documents() {
        let dir = std::env::temp_dir().join(format!("dcp_ref_cmd_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let genome = dir.join("GRCh38.primary_assembly.genome.fa");
        fs::write(&genome, b">chr1\nACGT\n").unwrap();
        let out = dir.join("out");

        let ctx = Context::new(ToolsConfig {
            output_dir: out.to_string_lossy().into_owned(),
            ..ToolsConfig::default()
        })
        .unwrap();
        let cmd = ReferenceFileCmd {
            file_path: genome.to_string_lossy().into_owned(),
            genus_species: "Homo sapiens".to_string(),
            ncbi_taxon_id: 9606,
            assembly_type: "primary".to_string(),
            reference_type: "genome sequence".to_string(),
            reference_version: "GencodeV27".to_string(),
            schema_url: "https://schema.example.org".to_string(),
            workspace_version: "2021-07-26T14:48:29.000000Z".to_string(),
            crc32c: String::new(),
        };
        run(&ctx, &cmd).await.unwrap();

        let detail: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(REFERENCE_FILE_JSON)).unwrap())
                .unwrap();
        assert_eq!(detail["input"]["size"], 11);
        assert_eq!(fs::read_dir(out.join("reference_file")).unwrap().count(), 1);
        assert_eq!(fs::read_dir(out.join("file_descriptor")).unwrap().count(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn mismatched_species_is_rejected() {
        let path = std::env::temp_dir().join(format!("dcp_ref_{}.fa", uuid::Uuid::new_v4()));
        fs::write(&path, b"ACGT").unwrap();
        let ctx = Context::new(ToolsConfig::default()).unwrap();
        let cmd = ReferenceFileCmd {
            file_path: path.to_string_lossy().into_owned(),
            genus_species: "Mus musculus".to_string(),
            ncbi_taxon_id: 9606,
            assembly_type: "primary".to_string(),
            reference_type: "genome sequence".to_string(),
            reference_version: "M21".to_string(),
            schema_url: "https://schema.example.org".to_string(),
            workspace_version: "2021-07-26T14:48:29.000000Z".to_string(),
            crc32c: String::new(),
        };
        assert!(matches!(run(&ctx, &cmd).await, Err(DcpError::Validation(_))));
        let _ = fs::remove_file(&path);
    }
}
