#![no_main]

use deployconf::config::ConfigLoader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Running the whole pipeline must never panic, only return an error.
    let mut loader = ConfigLoader::with_defaults();
    if let Ok(result) = loader.load_from_str(source) {
        assert!(result.config.site_names().all(|name| result.config.has_site(name)));
    }
});
