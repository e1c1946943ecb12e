//! Decode statistics collection

/// Per-connection decode statistics
///
/// Updated by [`PduSession`](crate::session::PduSession) and
/// [`PduReader`](crate::reader::PduReader) as they run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStatistics {
    /// Total bytes handed to the decoder
    pub bytes_received: u64,
    /// PDUs decoded successfully
    pub pdus_decoded: u64,
    /// PDUs abandoned because of a decode error
    pub pdus_rejected: u64,
    /// Feeds that ended in the middle of a PDU
    pub partial_feeds: u64,
    /// Reads that hit the read timeout
    pub timeouts: u64,
}

impl DecodeStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn add_bytes_received(&mut self, count: usize) {
        self.bytes_received += count as u64;
    }

    pub fn increment_pdus_decoded(&mut self) {
        self.pdus_decoded += 1;
    }

    pub fn increment_pdus_rejected(&mut self) {
        self.pdus_rejected += 1;
    }

    pub fn increment_partial_feeds(&mut self) {
        self.partial_feeds += 1;
    }

    pub fn increment_timeouts(&mut self) {
        self.timeouts += 1;
    }

    /// Percentage of PDUs that were rejected
    ///
    /// Returns 0.0 if no PDU has been seen.
    pub fn rejection_rate(&self) -> f64 {
        let total = self.pdus_decoded + self.pdus_rejected;
        if total == 0 {
            0.0
        } else {
            (self.pdus_rejected as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_clear() {
        let mut stats = DecodeStatistics::new();
        stats.add_bytes_received(10);
        stats.increment_pdus_decoded();
        stats.increment_pdus_decoded();
        stats.increment_pdus_decoded();
        stats.increment_pdus_rejected();
        assert_eq!(stats.bytes_received, 10);
        assert_eq!(stats.rejection_rate(), 25.0);

        stats.clear();
        assert_eq!(stats, DecodeStatistics::default());
        assert_eq!(stats.rejection_rate(), 0.0);
    }
}
