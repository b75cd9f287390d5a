//! Append-only durable log of discovered links.
//!
//! The log is the only durable owner of link identity. Each record is one
//! line of UTF-8 framed as `<RS><address><US><url>\n`, where the separators
//! are reserved code points that appear in neither addresses nor URLs.
//! Append order is the only order: records are never rewritten or removed.
//!
//! Resumability comes from the *resume cursor*: the address of the last
//! record known durably written. It is derived state: recovered at startup
//! by a bounded backwards scan of the file tail (never a full-file read),
//! and advanced in memory after every successful append. `append_batch`
//! skips everything at or before the cursor, so handing it the same working
//! set repeatedly is idempotent.
//!
//! Writers are serialized through a single async writer section. Readers
//! ([`ReplayStream`]) are unsynchronized against writers: append-only,
//! line-terminated framing makes that safe, provided a reader treats a line
//! without its terminator as not yet durable.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::address::Address;

/// Precedes every record on disk (U+241E, symbol for record separator).
pub const RECORD_SEPARATOR: char = '\u{241E}';

/// Divides address from URL within a record (U+241F, symbol for unit
/// separator).
pub const UNIT_SEPARATOR: char = '\u{241F}';

/// Bytes read from the end of the file when recovering the resume cursor.
/// Records are single lines, so the final record sits inside this window
/// for any non-pathological URL.
const CURSOR_TAIL_WINDOW: u64 = 8 * 1024;

/// One discovered link: content address plus the URL it was derived from.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub address: Address,
    pub url: String,
}

impl LinkRecord {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            address: Address::of_url(&url),
            url,
        }
    }
}

/// What a [`ReplayStream`] produced on one pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailItem {
    /// The next durable record in log order.
    Record(LinkRecord),
    /// No further durable record right now. `torn` distinguishes a clean
    /// end of file (`false`) from a partially-written final line still
    /// awaiting its terminator (`true`).
    Pending { torn: bool },
}

struct WriterState {
    cursor: Option<Address>,
}

/// Append-only link store with a recoverable resume cursor.
pub struct LinkLog {
    path: PathBuf,
    writer: Mutex<WriterState>,
}

impl LinkLog {
    /// Open (or create the directory for) the log at `path` and recover the
    /// resume cursor from the final durable record.
    ///
    /// Suspension points: directory creation, tail read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create link log directory {}", parent.display())
            })?;
        }

        let cursor = recover_cursor(&path).await;
        match cursor {
            Some(address) => info!(%address, "recovered link log resume cursor"),
            None => debug!(path = %path.display(), "link log starts empty"),
        }

        Ok(Self {
            path,
            writer: Mutex::new(WriterState { cursor }),
        })
    }

    /// Address of the last record known durably written, if any.
    pub async fn cursor(&self) -> Option<Address> {
        self.writer.lock().await.cursor
    }

    /// Append the not-yet-durable suffix of `records` to the log.
    ///
    /// `records` is the caller's full working set in discovery order;
    /// everything at or before the resume cursor is skipped, so repeated
    /// calls with a growing set never duplicate a record. The cursor
    /// advances after each successful line write, and each line is flushed
    /// individually so a mid-batch failure leaves the cursor at the last
    /// record that actually landed. I/O errors are logged, never raised.
    ///
    /// Returns the number of records written. Suspension points: writer
    /// section acquisition, file open, per-record write/flush.
    pub async fn append_batch(&self, records: &[LinkRecord]) -> usize {
        let mut writer = self.writer.lock().await;

        let start = match writer.cursor {
            None => 0,
            Some(cursor) => match records.iter().position(|r| r.address == cursor) {
                Some(at) => at + 1,
                None => {
                    // The cursor's record is not in this working set, so
                    // nothing here is known to come after it.
                    debug!(%cursor, "resume cursor not present in batch; nothing to append");
                    return 0;
                }
            },
        };
        if start >= records.len() {
            return 0;
        }

        let mut file = match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
        {
            Ok(file) => file,
            Err(e) => {
                error!(path = %self.path.display(), "failed to open link log for append: {e}");
                return 0;
            }
        };

        let mut written = 0;
        for record in &records[start..] {
            let line = format!(
                "{RECORD_SEPARATOR}{}{UNIT_SEPARATOR}{}\n",
                record.address, record.url
            );
            let result = async {
                file.write_all(line.as_bytes()).await?;
                file.flush().await
            }
            .await;
            match result {
                Ok(()) => {
                    writer.cursor = Some(record.address);
                    written += 1;
                }
                Err(e) => {
                    error!(url = %record.url, "link log append failed: {e}");
                    break;
                }
            }
        }

        if written > 0 {
            info!(written, path = %self.path.display(), "appended link records");
        }
        written
    }

    /// Start a fresh replay pass over the durable log.
    ///
    /// Records are yielded in log order; addresses in `completed` (the
    /// comment-file completion probe) and malformed lines are skipped. The
    /// stream is independent of any concurrent writer and of other replay
    /// passes; each call re-reads from the start of the file.
    #[must_use]
    pub fn replay(&self, completed: HashSet<Address>) -> ReplayStream {
        ReplayStream {
            path: self.path.clone(),
            reader: None,
            offset: 0,
            completed,
            skipped_completed: 0,
        }
    }
}

/// Recover the resume cursor by parsing the last terminated line of the
/// file, scanning only a bounded tail window. Missing or empty file means
/// start-of-log.
async fn recover_cursor(path: &Path) -> Option<Address> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(_) => return None,
    };
    let len = match file.metadata().await {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!(path = %path.display(), "could not stat link log: {e}");
            return None;
        }
    };
    if len == 0 {
        return None;
    }

    let start = len.saturating_sub(CURSOR_TAIL_WINDOW);
    let mut tail = Vec::with_capacity((len - start) as usize);
    if let Err(e) = file.seek(SeekFrom::Start(start)).await {
        warn!(path = %path.display(), "could not seek link log tail: {e}");
        return None;
    }
    if let Err(e) = file.read_to_end(&mut tail).await {
        warn!(path = %path.display(), "could not read link log tail: {e}");
        return None;
    }

    let text = String::from_utf8_lossy(&tail);
    // A tail without a final newline is a torn append; only terminated
    // lines count as durable.
    let durable = match text.rfind('\n') {
        Some(end) => &text[..end],
        None => return None,
    };
    durable
        .lines()
        .rev()
        .find_map(parse_record)
        .map(|record| record.address)
}

/// Parse one framed line into a record. Returns `None` on corrupt framing.
fn parse_record(line: &str) -> Option<LinkRecord> {
    let line = line.strip_prefix(RECORD_SEPARATOR).unwrap_or(line);
    let (hex, url) = line.split_once(UNIT_SEPARATOR)?;
    let address = hex.parse().ok()?;
    Some(LinkRecord {
        address,
        url: url.to_string(),
    })
}

/// Lazy reader over the durable log, tolerant of a concurrently appending
/// writer.
///
/// `next()` never blocks waiting for new data: when the durable end of the
/// log is reached it reports [`TailItem::Pending`], and the caller decides
/// whether to poll again (the log may grow) or give up. A final line that
/// has not yet received its terminator is reported as `Pending { torn:
/// true }` and re-read on the next pull once complete.
pub struct ReplayStream {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    /// Byte offset of the first line not yet consumed; lets a dropped
    /// reader resume mid-pass instead of replaying from the start.
    offset: u64,
    completed: HashSet<Address>,
    skipped_completed: u64,
}

impl ReplayStream {
    /// Pull the next durable record, skipping completed addresses and
    /// malformed lines.
    ///
    /// Suspension points: lazy file open/seek, buffered line reads, rewind
    /// on a torn tail.
    pub async fn next(&mut self) -> TailItem {
        loop {
            if self.reader.is_none() {
                match File::open(&self.path).await {
                    Ok(mut file) => {
                        if let Err(e) = file.seek(SeekFrom::Start(self.offset)).await {
                            error!(path = %self.path.display(), "replay seek failed: {e}");
                            return TailItem::Pending { torn: false };
                        }
                        self.reader = Some(BufReader::new(file));
                    }
                    // The log may simply not exist yet (discovery has not
                    // flushed); report pending and retry the open later.
                    Err(_) => return TailItem::Pending { torn: false },
                }
            }
            let Some(reader) = self.reader.as_mut() else {
                continue;
            };

            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) => return TailItem::Pending { torn: false },
                Ok(n) if !line.ends_with('\n') => {
                    // Torn tail: rewind so the completed line is re-read on
                    // a later pull.
                    if let Err(e) = reader.seek(SeekFrom::Current(-(n as i64))).await {
                        error!(path = %self.path.display(), "replay rewind failed: {e}");
                        self.reader = None;
                    }
                    return TailItem::Pending { torn: true };
                }
                Ok(n) => {
                    self.offset += n as u64;
                    match parse_record(line.trim_end_matches('\n')) {
                        Some(record) if self.completed.contains(&record.address) => {
                            self.skipped_completed += 1;
                            debug!(url = %record.url, "skipping already-completed link");
                        }
                        Some(record) => return TailItem::Record(record),
                        None => {
                            warn!(path = %self.path.display(), "skipping malformed link record");
                        }
                    }
                }
                Err(e) => {
                    error!(path = %self.path.display(), "link log read failed: {e}");
                    self.reader = None;
                    return TailItem::Pending { torn: false };
                }
            }
        }
    }

    /// Records skipped so far because their comment file already exists.
    #[must_use]
    pub fn skipped_completed(&self) -> u64 {
        self.skipped_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record_roundtrip() {
        let record = LinkRecord::new("https://example.com/a".to_string());
        let line = format!(
            "{RECORD_SEPARATOR}{}{UNIT_SEPARATOR}{}",
            record.address, record.url
        );
        assert_eq!(parse_record(&line), Some(record));
    }

    #[test]
    fn parse_record_rejects_missing_separator() {
        assert_eq!(parse_record("not a record"), None);
        assert_eq!(
            parse_record(&format!("{RECORD_SEPARATOR}deadbeef no unit sep")),
            None
        );
    }

    #[test]
    fn parse_record_tolerates_absent_record_separator() {
        let record = LinkRecord::new("https://example.com/b".to_string());
        let line = format!("{}{UNIT_SEPARATOR}{}", record.address, record.url);
        assert_eq!(parse_record(&line), Some(record));
    }
}
