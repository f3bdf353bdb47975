#![no_main]

use libfuzzer_sys::fuzz_target;

use fibntt_core::calculator::CoreCalculator;
use fibntt_core::ntt::NttFastDoubling;
use fibntt_core::observers::NoOpObserver;
use fibntt_core::options::Options;
use fibntt_core::progress::CancellationToken;

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }
    // First 4 bytes pick n, the fifth the task budget exponent (0..=5)
    let n = u64::from(u32::from_le_bytes([data[0], data[1], data[2], data[3]])) % 200_000;
    let log = u32::from(data[4] % 6);

    let calc = NttFastDoubling::new();
    let cancel = CancellationToken::new();
    let observer = NoOpObserver::new();

    let sequential = calc.calculate_core(&cancel, &observer, 0, n, &Options::sequential());
    let parallel = calc.calculate_core(
        &cancel,
        &observer,
        0,
        n,
        &Options {
            parallelism_log: Some(log),
            ..Options::default()
        },
    );

    assert_eq!(sequential, parallel, "parallelism {log} changed F({n})");
});
