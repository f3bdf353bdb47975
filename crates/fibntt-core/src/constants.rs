//! Constants shared by the backends and the binary.

/// Operand size (in bits) above which the big-integer backend runs the three
/// products of a doubling step concurrently.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Progress fraction an update must advance by before observers see it.
pub const PROGRESS_REPORT_THRESHOLD: f64 = 0.01;

/// Largest index whose Fibonacci number fits one limb.
pub const MAX_FIB_U64: u64 = 93;

/// `F(0..=93)`, answered without running a backend.
pub const FIB_TABLE: [u64; 94] = fib_table();

const fn fib_table() -> [u64; 94] {
    let mut table = [0u64; 94];
    let (mut a, mut b) = (0u64, 1u64);
    let mut i = 0;
    while i < table.len() {
        table[i] = a;
        // Wraps only beyond F(93), which the table never stores.
        let next = a.wrapping_add(b);
        a = b;
        b = next;
        i += 1;
    }
    table
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    /// Any failure without a dedicated code, including invalid indices.
    pub const ERROR_GENERIC: i32 = 1;
    /// The run exceeded `--timeout`.
    pub const ERROR_TIMEOUT: i32 = 2;
    /// Backends disagreed, or a harness checkpoint failed.
    pub const ERROR_MISMATCH: i32 = 3;
    /// Bad flags or option values.
    pub const ERROR_CONFIG: i32 = 4;
    /// Interrupted with Ctrl+C.
    pub const ERROR_CANCELED: i32 = 130;
}
