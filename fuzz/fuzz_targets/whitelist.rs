#![no_main]
use libfuzzer_sys::fuzz_target;
use veccalc::Whitelist;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let verdict = Whitelist::<f64>::default().verdict(s);
        assert_eq!(verdict.message().is_empty(), verdict.is_valid() || s.is_empty());
    }
});
