use alloc::vec::Vec;

/// Slot usage and memory statistics for a [`HashTable`].
///
/// Produced by [`HashTable::debug_stats`].
///
/// [`HashTable`]: crate::HashTable
/// [`HashTable::debug_stats`]: crate::HashTable::debug_stats
#[derive(Debug, Clone, PartialEq)]
pub struct DebugStats {
    /// Number of live entries
    pub populated: usize,
    /// Live entries plus tombstones since the last rehash
    pub consumed: usize,
    /// Number of tombstoned slots
    pub tombstones: usize,
    /// Total number of slots allocated
    pub capacity: usize,
    /// Load factor the growth policy sees (consumed / capacity)
    pub load_factor: f64,
    /// Fraction of slots holding a live entry (populated / capacity)
    pub occupancy: f64,
    /// Longest distance of any live entry from its home slot
    pub max_probe_length: usize,
    /// Average distance of live entries from their home slots
    pub mean_probe_length: f64,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
    /// Memory in bytes held by slots without a live entry
    pub wasted_bytes: usize,
}

impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% occupancy)",
            self.populated,
            self.capacity,
            self.occupancy * 100.0
        );
        println!(
            "Consumed: {}/{} ({:.2}% load factor, {} tombstones)",
            self.consumed,
            self.capacity,
            self.load_factor * 100.0,
            self.tombstones
        );
        println!(
            "Probe length: max {}, mean {:.3}",
            self.max_probe_length, self.mean_probe_length
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// Counts of live entries by distance from their home slot.
///
/// Bin `n` holds the number of entries that sit `n` slots past the slot their
/// hash maps to. Produced by [`HashTable::probe_histogram`].
///
/// [`HashTable::probe_histogram`]: crate::HashTable::probe_histogram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    bins: Vec<usize>,
}

impl ProbeHistogram {
    pub(crate) fn new(bins: Vec<usize>) -> Self {
        Self { bins }
    }

    /// Returns the per-distance counts. Always holds at least one bin.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// Returns the number of entries counted.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Returns the largest distance with a non-zero count, or zero when no
    /// entries were counted.
    pub fn max_probe_length(&self) -> usize {
        self.bins.iter().rposition(|&count| count > 0).unwrap_or(0)
    }

    /// Returns the average distance over all counted entries.
    pub fn mean_probe_length(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }

        let weighted: usize = self
            .bins
            .iter()
            .enumerate()
            .map(|(distance, &count)| distance * count)
            .sum();
        weighted as f64 / total as f64
    }

    /// Pretty-prints the histogram as a horizontal bar chart on stdout.
    ///
    /// Each row corresponds to one probe distance, from zero up to the
    /// longest observed.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.total());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                0 => None,
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                _ => Some('▉'),
            };
            bar.extend(partial);
            bar
        };

        let width = self.max_probe_length().to_string().len().max(2);
        for (distance, &count) in self.bins.iter().enumerate().take(self.max_probe_length() + 1) {
            println!("{:>width$} | {} ({})", distance, make_bar(count), count);
        }
    }
}
