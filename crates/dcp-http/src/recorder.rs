// crates/dcp-http/src/recorder.rs
//
// On-disk recording of request/response pairs as numbered text files:
// `request_NNN.txt` (method, URL, body) and `response_NNN.txt` (status, body).
//
// The starting number is discovered once by scanning the directory; after
// that numbers come from an atomic counter, so concurrent requests never
// collide. `request_000.txt` / `response_000.txt` are written at construction
// so downstream globs always match something.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use dcp_core::DcpError;

const REQUEST_PREFIX: &str = "request_";
const RESPONSE_PREFIX: &str = "response_";

#[derive(Debug)]
pub struct Recorder {
    dir: PathBuf,
    next: AtomicU32,
}

impl Recorder {
    /// Prepare `dir` for recording and position the counter past any
    /// existing recordings.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DcpError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file_name(REQUEST_PREFIX, 0)), "")?;
        fs::write(dir.join(file_name(RESPONSE_PREFIX, 0)), "")?;

        let start = highest_recorded(&dir)? + 1;
        tracing::debug!("Recording HTTP traffic to {} from {:03}", dir.display(), start);

        Ok(Self {
            dir,
            next: AtomicU32::new(start),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve the number for one request/response pair.
    pub fn next_number(&self) -> u32 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    pub fn record_request(
        &self,
        number: u32,
        method: &str,
        url: &str,
        body: Option<&str>,
    ) -> Result<(), DcpError> {
        let contents = format!("{}\n{}\n{}", method, url, body.unwrap_or(""));
        fs::write(self.dir.join(file_name(REQUEST_PREFIX, number)), contents)?;
        Ok(())
    }

    pub fn record_response(&self, number: u32, status: u16, body: &str) -> Result<(), DcpError> {
        let contents = format!("{}\n{}", status, body);
        fs::write(self.dir.join(file_name(RESPONSE_PREFIX, number)), contents)?;
        Ok(())
    }
}

fn file_name(prefix: &str, number: u32) -> String {
    format!("{}{:03}.txt", prefix, number)
}

/// Highest number among `request_###.txt` / `response_###.txt` in `dir`.
fn highest_recorded(dir: &Path) -> Result<u32, DcpError> {
    let mut highest = 0;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(number) = parse_number(name) {
            highest = highest.max(number);
        }
    }
    Ok(highest)
}

fn parse_number(name: &str) -> Option<u32> {
    let stem = name.strip_suffix(".txt")?;
    let digits = stem
        .strip_prefix(REQUEST_PREFIX)
        .or_else(|| stem.strip_prefix(RESPONSE_PREFIX))?;
    if digits.len() < 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dcp_recorder_{}_{}", label, uuid::Uuid::new_v4()))
    }

    #[test]
    fn writes_placeholder_files_and_starts_at_one() {
        let dir = temp_dir("fresh");
        let recorder = Recorder::new(&dir).unwrap();

        assert!(dir.join("request_000.txt").exists());
        assert!(dir.join("response_000.txt").exists());
        assert_eq!(recorder.next_number(), 1);
        assert_eq!(recorder.next_number(), 2);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn advances_past_highest_existing_suffix() {
        let dir = temp_dir("existing");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("request_004.txt"), "x").unwrap();
        fs::write(dir.join("response_007.txt"), "x").unwrap();
        fs::write(dir.join("request_notanumber.txt"), "x").unwrap();
        fs::write(dir.join("other_999.txt"), "x").unwrap();

        let recorder = Recorder::new(&dir).unwrap();
        assert_eq!(recorder.next_number(), 8);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn records_request_and_response_contents() {
        let dir = temp_dir("contents");
        let recorder = Recorder::new(&dir).unwrap();
        let n = recorder.next_number();

        recorder
            .record_request(n, "POST", "http://ingest/envelopes", Some("{}"))
            .unwrap();
        recorder.record_response(n, 201, r#"{"ok":true}"#).unwrap();

        assert_eq!(
            fs::read_to_string(dir.join("request_001.txt")).unwrap(),
            "POST\nhttp://ingest/envelopes\n{}"
        );
        assert_eq!(
            fs::read_to_string(dir.join("response_001.txt")).unwrap(),
            "201\n{\"ok\":true}"
        );

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn concurrent_numbers_are_unique() {
        let dir = temp_dir("concurrent");
        let recorder = std::sync::Arc::new(Recorder::new(&dir).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = recorder.clone();
                std::thread::spawn(move || (0..50).map(|_| r.next_number()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 400);
        assert_eq!(all[0], 1);

        fs::remove_dir_all(dir).ok();
    }
}
