#![no_main]

use deployconf::config::Validator;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(source) else {
        return;
    };

    let result = Validator::new().validate(&value);
    assert_eq!(result.is_valid(), !result.has_errors());
});
