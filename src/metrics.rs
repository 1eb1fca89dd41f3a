//! Per-upload metrics and CLI-friendly formatting.

use std::time::Duration;

/// Counters collected during one `upload_preimage` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetrics {
    /// Preimage size in bytes.
    pub preimage_bytes: usize,
    /// Blocks the preimage was split into.
    pub blocks: usize,
    /// AddLeaves batches sent during this call.
    pub batches_sent: usize,
    /// Blocks skipped because an earlier call already had them accepted.
    pub blocks_skipped: usize,
    /// Transactions handed to the sender.
    pub transactions: usize,
    /// Total calldata across those transactions.
    pub calldata_bytes: usize,
    /// Time spent chunking, absorbing and building the tree.
    pub prepare_duration: Duration,
    /// Wall time of the whole call, sender included.
    pub total_duration: Duration,
}

impl UploadMetrics {
    /// Format metrics as a table for CLI output
    pub fn format_table(&self) -> String {
        let rows = [
            ("Preimage size", format!("{} bytes", self.preimage_bytes)),
            ("Blocks", self.blocks.to_string()),
            ("AddLeaves batches", self.batches_sent.to_string()),
            ("Blocks resumed", self.blocks_skipped.to_string()),
            ("Transactions", self.transactions.to_string()),
            ("Calldata", format!("{:.1} KB", self.calldata_kb())),
            (
                "Prepare time",
                format!("{:.3}s", self.prepare_duration.as_secs_f64()),
            ),
            (
                "Total time",
                format!("{:.3}s", self.total_duration.as_secs_f64()),
            ),
        ];

        let mut output = String::new();
        output.push_str("  ┌────────────────────┬──────────────────┐\n");
        for (label, value) in rows {
            output.push_str(&format!("  │ {:<18} │ {:>16} │\n", label, value));
        }
        output.push_str("  └────────────────────┴──────────────────┘\n");
        output
    }

    /// Calldata size in KB
    pub fn calldata_kb(&self) -> f64 {
        self.calldata_bytes as f64 / 1024.0
    }
}
