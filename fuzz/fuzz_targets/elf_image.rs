#![no_main]

use depdiscover_elf::{ElfImage, dynamic_entries, needed_libraries};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(image) = ElfImage::parse(data.to_vec()) {
        let _ = dynamic_entries(&image);
        let _ = needed_libraries(&image);
    }
});
