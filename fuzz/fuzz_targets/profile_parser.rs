#![no_main]

use fdata::DataReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed profiles must be reported as errors, never panic
        let mut reader = DataReader::new(input);
        if reader.parse().is_ok() {
            let mut sink = std::io::sink();
            let _ = reader.dump(&mut sink);
            for name in reader.all_funcs_branch_data().keys() {
                let _ = reader.get_func_branch_data_regex(&[*name]);
            }
        }
    }
});
