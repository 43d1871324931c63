use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::TryRecvError;

use crate::models::IngestMessage;
use crate::services::detector::{CongestionDetector, PositionOutcome};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: u64,
    pub opened: u64,
    pub refreshed: u64,
    pub ignored: u64,
    pub closed: u64,
    pub malformed: u64,
    pub failed: u64,
}

/// Drives the detector from newline-delimited JSON and writes every
/// lifecycle event to `output` as one JSON line.
///
/// Undecodable lines and repository failures are logged and skipped;
/// redelivery is up to whoever feeds the stream.
pub async fn run_ingest<R, W>(
    detector: &CongestionDetector,
    input: R,
    mut output: W,
) -> anyhow::Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = detector.subscribe();
    let mut stats = IngestStats::default();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        let message: IngestMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(line = stats.lines, error = %err, "skipping malformed ingest line");
                stats.malformed += 1;
                continue;
            }
        };

        match message {
            IngestMessage::Position(update) => match detector.process_position(&update).await {
                Ok(PositionOutcome::Opened(_)) => stats.opened += 1,
                Ok(PositionOutcome::Refreshed { .. }) => stats.refreshed += 1,
                Ok(PositionOutcome::Ignored(_)) => stats.ignored += 1,
                Err(err) => {
                    tracing::error!(vessel_id = %update.vessel_id, transient = err.is_transient(), error = %err, "position update failed");
                    stats.failed += 1;
                }
            },
            IngestMessage::Departure(signal) => match detector.process_departure(&signal).await {
                Ok(closed) => stats.closed += closed.len() as u64,
                Err(err) => {
                    tracing::error!(vessel_id = %signal.vessel_id, transient = err.is_transient(), error = %err, "departure failed");
                    stats.failed += 1;
                }
            },
        }

        loop {
            match events.try_recv() {
                Ok(event) => {
                    let mut json = serde_json::to_vec(&event)?;
                    json.push(b'\n');
                    output.write_all(&json).await?;
                }
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event output fell behind");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        output.flush().await?;
    }

    tracing::info!(?stats, "ingest stream finished");
    Ok(stats)
}
