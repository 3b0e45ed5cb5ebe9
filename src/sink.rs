// Output sink abstraction for `print`/the I/O opcode family, so the
// embedder can redirect output without the core depending on stdout.

pub trait PrintSink {
    fn print(&mut self, s: &str);
}

#[derive(Default)]
pub struct StdoutSink;

impl PrintSink for StdoutSink {
    fn print(&mut self, s: &str) {
        print!("{s}");
    }
}

/// Captures everything printed, in order. Used by tests to assert on
/// program output without touching stdout.
#[derive(Default)]
pub struct CapturingSink {
    pub chunks: Vec<String>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn joined(&self) -> String {
        self.chunks.concat()
    }
}

impl PrintSink for CapturingSink {
    fn print(&mut self, s: &str) {
        self.chunks.push(s.to_string());
    }
}
