#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use fibntt_core::calculator::{Calculator, FibCalculator};
use fibntt_core::fastdoubling::BigIntFastDoubling;
use fibntt_core::matrix::MatrixExponentiation;
use fibntt_core::ntt::NttFastDoubling;
use fibntt_core::observers::NoOpObserver;
use fibntt_core::options::Options;
use fibntt_core::progress::CancellationToken;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    // Use first 4 bytes as n, capped at 20000 for speed (3 backends)
    let n = u64::from(u32::from_le_bytes([data[0], data[1], data[2], data[3]])) % 20_000;

    let ntt: Arc<dyn Calculator> = Arc::new(FibCalculator::new(Arc::new(NttFastDoubling::new())));
    let fast: Arc<dyn Calculator> =
        Arc::new(FibCalculator::new(Arc::new(BigIntFastDoubling::new())));
    let matrix: Arc<dyn Calculator> =
        Arc::new(FibCalculator::new(Arc::new(MatrixExponentiation::new())));

    let cancel = CancellationToken::new();
    let observer = NoOpObserver::new();
    let opts = Options::default().normalize();

    let ntt_result = ntt.calculate(&cancel, &observer, 0, n, &opts);
    let fast_result = fast.calculate(&cancel, &observer, 0, n, &opts);
    let matrix_result = matrix.calculate(&cancel, &observer, 0, n, &opts);

    assert_eq!(ntt_result, fast_result, "Ntt != FastDoubling at n={n}");
    assert_eq!(ntt_result, matrix_result, "Ntt != Matrix at n={n}");
});
