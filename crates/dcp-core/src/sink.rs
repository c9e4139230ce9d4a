// crates/dcp-core/src/sink.rs
//
// DirectorySink: the default OutputSink, writing artifacts beneath a root
// directory passed in by the caller.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::DcpError;
use crate::traits::OutputSink;

/// Writes artifacts into `root`, creating subdirectories on demand.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for DirectorySink {
    fn write_text(&self, name: &str, contents: &str) -> Result<(), DcpError> {
        let escapes = Path::new(name).components().any(|part| {
            matches!(part, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if escapes || name.split('/').any(|part| part == "..") {
            return Err(DcpError::Io(format!("Refusing to write outside sink: {}", name)));
        }
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_root(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dcp_sink_{}_{}", label, uuid::Uuid::new_v4()))
    }

    #[test]
    fn writes_text_and_documents() {
        let root = temp_root("docs");
        let sink = DirectorySink::new(&root);

        sink.write_text("submission_url.txt", "http://envelope/1").unwrap();
        sink.write_document("analysis_file", "abc", "2021-07-26T14:48:29.000000Z", &json!({"a": 1}))
            .unwrap();

        assert_eq!(
            fs::read_to_string(root.join("submission_url.txt")).unwrap(),
            "http://envelope/1"
        );
        let doc = fs::read_to_string(
            root.join("analysis_file/abc_2021-07-26T14:48:29.000000Z.json"),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed, json!({"a": 1}));

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn rejects_parent_traversal() {
        let sink = DirectorySink::new(temp_root("escape"));
        assert!(matches!(
            sink.write_text("../outside.txt", "x"),
            Err(DcpError::Io(_))
        ));
    }

    #[test]
    fn rejects_absolute_names() {
        let root = temp_root("absolute");
        let sink = DirectorySink::new(&root);
        let target = temp_root("absolute_target").join("outside.txt");
        match sink.write_text(&target.to_string_lossy(), "x") {
            Err(DcpError::Io(msg)) => assert!(msg.starts_with("Refusing to write outside sink")),
            other => panic!("Expected Io, got: {:?}", other),
        }
        assert!(!target.exists());
        assert!(!root.exists());
    }
}
