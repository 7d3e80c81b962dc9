// src/producer.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limited parallel file production
//!
//! Each chunk from the partition becomes one task on a rayon pool of
//! `num_writers` threads. A task writes its file in bursts of
//! `write_speed / num_writers` MB, flushing and syncing after every burst and
//! padding each burst to one second of wall-clock time. All tasks use the same
//! seed, so equal-sized files are byte-identical.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::RunConfig;
use crate::constants::*;
use crate::error::ProduceError;
use crate::generator::SeededStream;
use crate::partition::{Chunk, Partition};

/// Shared stop flag for a production run
///
/// Raised by the orchestrator on the first write failure and by the
/// interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pads each burst up to a fixed wall-clock interval
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
    poll: Duration,
}

impl Default for Pacer {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(BURST_INTERVAL_MS),
            poll: Duration::from_millis(CANCEL_POLL_MS),
        }
    }
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Sleep until one interval has passed since `started`
    ///
    /// Returns false if `cancel` was raised before or while waiting.
    pub fn pad(&self, started: Instant, cancel: &Cancellation) -> bool {
        let deadline = started + self.interval;
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(self.poll));
        }
    }
}

/// Outcome of one finished file
#[derive(Debug, Clone)]
pub struct ChunkReport {
    pub index: usize,
    pub path: PathBuf,
    pub bytes: u64,
    pub bursts: u64,
    pub elapsed: Duration,
}

/// Outcome of a whole production run
#[derive(Debug, Clone)]
pub struct ProduceReport {
    pub files: usize,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl ProduceReport {
    /// Achieved aggregate speed in GB/s
    pub fn throughput_gbps(&self) -> f64 {
        self.bytes as f64 / BYTES_PER_GB / self.elapsed.as_secs_f64()
    }

    /// Achieved aggregate speed in MB/s
    pub fn throughput_mbps(&self) -> f64 {
        self.bytes as f64 / BYTES_PER_MB as f64 / self.elapsed.as_secs_f64()
    }
}

/// Generate the next `len` bytes of `stream` into `writer`, `buf.len()` at a time
///
/// Checks `cancel` before every block. Returns false if it was raised, with
/// only the blocks before it written.
pub fn write_burst<W: Write>(
    stream: &mut SeededStream,
    writer: &mut W,
    len: u64,
    buf: &mut [u8],
    cancel: &Cancellation,
) -> io::Result<bool> {
    let mut left = len;
    while left > 0 {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        let n = (buf.len() as u64).min(left) as usize;
        stream.fill(&mut buf[..n]);
        writer.write_all(&buf[..n])?;
        left -= n as u64;
    }
    Ok(true)
}

/// Write one chunk's file at the per-worker rate
///
/// The file is created only if the run has not been cancelled yet. A
/// cancelled or failed write leaves whatever was written on disk.
pub fn write_chunk(
    config: &RunConfig,
    chunk: Chunk,
    pacer: &Pacer,
    cancel: &Cancellation,
) -> Result<ChunkReport, ProduceError> {
    if cancel.is_cancelled() {
        return Err(ProduceError::Interrupted);
    }

    let path = config.file_path(chunk.index);
    let io_err = |source| ProduceError::Io {
        index: chunk.index,
        path: path.clone(),
        source,
    };

    let burst_bytes = config.burst_bytes();
    tracing::info!(
        "Writing {} ({} bytes, {:.3} MB/s)",
        path.display(),
        chunk.size,
        config.per_worker_speed()
    );

    let mut file = File::create(&path).map_err(io_err)?;
    let mut stream = SeededStream::new(config.seed);
    let mut buf = vec![0u8; (WRITE_BLOCK_SIZE as u64).min(burst_bytes).min(chunk.size) as usize];

    let started = Instant::now();
    let mut remaining = chunk.size;
    let mut bursts = 0;

    while remaining > 0 {
        if cancel.is_cancelled() {
            tracing::debug!("File {} cancelled with {} bytes left", chunk.index, remaining);
            return Err(ProduceError::Interrupted);
        }

        let burst = burst_bytes.min(remaining);
        let burst_start = Instant::now();

        let completed =
            write_burst(&mut stream, &mut file, burst, &mut buf, cancel).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.sync_data().map_err(io_err)?;
        if !completed {
            tracing::debug!("File {} cancelled mid-burst", chunk.index);
            return Err(ProduceError::Interrupted);
        }

        remaining -= burst;
        bursts += 1;
        tracing::trace!(
            "File {} burst {}: {} bytes in {:?}",
            chunk.index,
            bursts,
            burst,
            burst_start.elapsed()
        );

        // The final short burst is padded too
        if !pacer.pad(burst_start, cancel) && remaining > 0 {
            tracing::debug!("File {} cancelled with {} bytes left", chunk.index, remaining);
            return Err(ProduceError::Interrupted);
        }
    }

    drop(file);

    Ok(ChunkReport {
        index: chunk.index,
        path,
        bytes: chunk.size,
        bursts,
        elapsed: started.elapsed(),
    })
}

/// Orchestrates one production run over a writer pool
pub struct Producer {
    config: RunConfig,
    pacer: Pacer,
    cancel: Cancellation,
}

impl Producer {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            pacer: Pacer::default(),
            cancel: Cancellation::new(),
        }
    }

    /// Override the burst interval
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for stopping the run from another thread
    pub fn cancellation(&self) -> Cancellation {
        self.cancel.clone()
    }

    /// Dispatch one task per chunk and wait for all of them
    ///
    /// On the first write failure the run is cancelled, every dispatched
    /// task is still awaited, and that failure is returned.
    pub fn run(&self) -> Result<ProduceReport, ProduceError> {
        self.config.validate_writers()?;
        let partition = Partition::from_config(&self.config)?;

        tracing::info!(
            "Starting production: {} files, {} bytes, {} writers, {} MB/s target",
            partition.len(),
            partition.total_bytes(),
            self.config.num_writers,
            self.config.write_speed
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_writers)
            .thread_name(|i| format!("blr-writer-{i}"))
            .build()?;

        let started = Instant::now();
        let (tx, rx) = mpsc::channel();
        let mut pending = BTreeSet::new();

        for chunk in partition.chunks() {
            if self.cancel.is_cancelled() {
                tracing::debug!("Cancelled before dispatching file {}", chunk.index);
                break;
            }

            let tx = tx.clone();
            let config = self.config.clone();
            let pacer = self.pacer;
            let cancel = self.cancel.clone();
            pool.spawn(move || {
                let result = write_chunk(&config, chunk, &pacer, &cancel);
                let _ = tx.send((chunk.index, result));
            });
            pending.insert(chunk.index);
        }
        drop(tx);

        tracing::debug!("Dispatched {} tasks", pending.len());

        let mut first_error = None;
        let mut files = 0;
        let mut bytes = 0;

        while !pending.is_empty() {
            let Ok((index, result)) = rx.recv() else {
                tracing::warn!("{} writer tasks exited without reporting", pending.len());
                break;
            };
            pending.remove(&index);

            match result {
                Ok(report) => {
                    tracing::info!(
                        "Finished {} in {:.2}s ({} bursts)",
                        report.path.display(),
                        report.elapsed.as_secs_f64(),
                        report.bursts
                    );
                    files += 1;
                    bytes += report.bytes;
                }
                Err(ProduceError::Interrupted) => {}
                Err(e) => {
                    if first_error.is_none() {
                        tracing::error!("Writer failed, cancelling run: {}", e);
                        self.cancel.cancel();
                        first_error = Some(e);
                    } else {
                        tracing::debug!("Additional writer failure: {}", e);
                    }
                }
            }
        }

        let elapsed = started.elapsed();

        if let Some(e) = first_error {
            return Err(e);
        }
        if self.cancel.is_cancelled() {
            tracing::warn!("Production interrupted after {} files", files);
            return Err(ProduceError::Interrupted);
        }

        tracing::info!("Production complete: {} files in {:?}", files, elapsed);
        Ok(ProduceReport {
            files,
            bytes,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{expected_checksum, file_checksum};

    const MB: u64 = BYTES_PER_MB;

    fn init_tracing() {
        use tracing_subscriber::{fmt, EnvFilter};
        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn fast_pacer() -> Pacer {
        Pacer::new(Duration::from_millis(10))
    }

    fn config(dir: &std::path::Path, data_size_mb: f64, max_file_size: u64) -> RunConfig {
        RunConfig::new(dir, data_size_mb / MB_PER_GB, max_file_size, 64.0, 4, 10).unwrap()
    }

    #[test]
    fn test_write_chunk_content() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), 2.0, 1);
        let chunk = Chunk {
            index: 3,
            size: MB + 17,
        };

        let report = write_chunk(&config, chunk, &fast_pacer(), &Cancellation::new()).unwrap();
        assert_eq!(report.path, dir.path().join("blr_data_3.raw"));
        assert_eq!(std::fs::metadata(&report.path).unwrap().len(), MB + 17);
        assert_eq!(
            file_checksum(&report.path).unwrap(),
            expected_checksum(10, MB + 17)
        );
    }

    #[test]
    fn test_pacing_pads_every_burst() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        // 4 MB/s over 2 writers: 2 MB bursts, a 5 MB file needs 3
        let config = RunConfig::new(dir.path(), 1.0, 8, 4.0, 2, 10).unwrap();
        let chunk = Chunk {
            index: 0,
            size: 5 * MB,
        };
        let pacer = Pacer::new(Duration::from_millis(100));

        let report = write_chunk(&config, chunk, &pacer, &Cancellation::new()).unwrap();
        assert_eq!(report.bursts, 3);
        assert!(report.elapsed >= Duration::from_millis(300));
    }

    #[test]
    fn test_cancel_during_pad() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new(dir.path(), 1.0, 8, 1.0, 1, 10).unwrap();
        let chunk = Chunk {
            index: 0,
            size: 3 * MB,
        };
        let cancel = Cancellation::new();
        let pacer = Pacer::new(Duration::from_secs(30));

        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = Instant::now();
        let result = write_chunk(&config, chunk, &pacer, &cancel);
        handle.join().unwrap();

        assert!(matches!(result, Err(ProduceError::Interrupted)));
        assert!(started.elapsed() < Duration::from_secs(10));
        // Partial output stays on disk
        assert_eq!(std::fs::metadata(config.file_path(0)).unwrap().len(), MB);
    }

    /// Sink that raises the cancellation flag once it has received `after` bytes
    struct CancellingSink {
        data: Vec<u8>,
        after: usize,
        cancel: Cancellation,
    }

    impl Write for CancellingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            if self.data.len() >= self.after {
                self.cancel.cancel();
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_burst_stops_between_blocks() {
        init_tracing();
        let cancel = Cancellation::new();
        let mut sink = CancellingSink {
            data: Vec::new(),
            after: 2 * 4096,
            cancel: cancel.clone(),
        };
        let mut stream = SeededStream::new(10);
        let mut buf = vec![0u8; 4096];

        // 16 blocks requested; the flag goes up after the second
        let completed = write_burst(&mut stream, &mut sink, 16 * 4096, &mut buf, &cancel).unwrap();
        assert!(!completed);
        assert_eq!(sink.data.len(), 2 * 4096);

        let mut expected = vec![0u8; 2 * 4096];
        SeededStream::new(10).fill(&mut expected);
        assert_eq!(sink.data, expected);
    }

    #[test]
    fn test_write_burst_full_length() {
        let cancel = Cancellation::new();
        let mut sink = Vec::new();
        let mut stream = SeededStream::new(3);
        let mut buf = vec![0u8; 4099];

        assert!(write_burst(&mut stream, &mut sink, 50_000, &mut buf, &cancel).unwrap());
        assert!(write_burst(&mut stream, &mut sink, 50_003, &mut buf, &cancel).unwrap());

        let mut expected = vec![0u8; 100_003];
        SeededStream::new(3).fill(&mut expected);
        assert_eq!(sink, expected);
    }

    #[test]
    fn test_cancel_inside_large_burst() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        // One writer at 512 MB/s: the whole file is a single burst of 128 blocks
        let config = RunConfig::new(dir.path(), 1.0, 512, 512.0, 1, 10).unwrap();
        let chunk = Chunk {
            index: 0,
            size: 512 * MB,
        };
        let cancel = Cancellation::new();
        let pacer = Pacer::new(Duration::from_secs(30));

        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            trigger.cancel();
        });

        let result = write_chunk(&config, chunk, &pacer, &cancel);
        handle.join().unwrap();

        assert!(matches!(result, Err(ProduceError::Interrupted)));
        let written = std::fs::metadata(config.file_path(0))
            .map(|m| m.len())
            .unwrap_or(0);
        assert!(written < chunk.size);
        assert_eq!(written % WRITE_BLOCK_SIZE as u64, 0);
    }

    #[test]
    fn test_run_rejects_zero_write_speed() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new(dir.path(), 1.0 / MB_PER_GB, 1, 0.0, 1, 10).unwrap();

        let result = Producer::new(config).with_pacer(fast_pacer()).run();
        assert!(matches!(result, Err(ProduceError::Config(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_run_writes_every_chunk() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), 2.5, 1);

        let report = Producer::new(config.clone())
            .with_pacer(fast_pacer())
            .run()
            .unwrap();
        assert_eq!(report.files, 3);
        assert_eq!(report.bytes, config.total_bytes());
        assert!(report.throughput_mbps() > 0.0);

        let sizes: Vec<u64> = (0..3)
            .map(|i| std::fs::metadata(config.file_path(i)).unwrap().len())
            .collect();
        assert_eq!(sizes, vec![MB, MB, MB / 2]);
        assert!(!config.file_path(3).exists());

        // Same seed, same size: identical files
        assert_eq!(
            std::fs::read(config.file_path(0)).unwrap(),
            std::fs::read(config.file_path(1)).unwrap()
        );
    }

    #[test]
    fn test_even_split_writes_no_empty_file() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), 2.0, 1);

        let report = Producer::new(config.clone())
            .with_pacer(fast_pacer())
            .run()
            .unwrap();
        assert_eq!(report.files, 2);
        assert!(!config.file_path(2).exists());
    }

    #[test]
    fn test_cancelled_run_creates_nothing() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let producer = Producer::new(config(dir.path(), 2.0, 1)).with_pacer(fast_pacer());
        producer.cancellation().cancel();

        assert!(matches!(producer.run(), Err(ProduceError::Interrupted)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_failure_cancels_run() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), 4.0, 1);
        // A directory where file 1 should go makes its creation fail
        std::fs::create_dir(config.file_path(1)).unwrap();

        let producer = Producer::new(config).with_pacer(fast_pacer());
        match producer.run() {
            Err(ProduceError::Io { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected write failure, got {other:?}"),
        }
        assert!(producer.cancellation().is_cancelled());
    }
}
