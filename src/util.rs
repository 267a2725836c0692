/// Tracks the current line number while parsing.
///
/// Header lines and ASCII rows are counted alike, so errors can point at the
/// offending line of the file. Binary rows advance it too, which keeps the
/// count meaningful as a row index.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationTracker {
    /// Current 1-based line index in the input stream.
    pub line_index: usize,
}

impl LocationTracker {
    /// Creates a new tracker at the start of a stream.
    pub fn new() -> Self {
        LocationTracker { line_index: 0 }
    }

    /// Advances the tracker to the next line.
    pub fn next_line(&mut self) {
        self.line_index += 1;
    }
}

/// Upper bound on rows reserved up front for a single element.
///
/// Declared counts come from untrusted headers; anything beyond this grows
/// on demand as rows actually arrive.
pub const MAX_PREALLOCATED_ROWS: usize = 1 << 20;

/// Converts a declared row count to `usize`, failing when the platform
/// cannot address it.
pub fn row_count(element: &str, count: u64) -> Result<usize, crate::errors::DataError> {
    usize::try_from(count).map_err(|_| crate::errors::DataError::CountOverflow {
        element: element.to_string(),
        count,
    })
}

/// Capacity to reserve for `count` rows.
pub fn preallocation(count: usize) -> usize {
    count.min(MAX_PREALLOCATED_ROWS)
}
