#![no_main]

use std::path::PathBuf;

use libfuzzer_sys::fuzz_target;
use xgettext_go::package::Package;
use xgettext_go::{generate, ExtractOptions};

fuzz_target!(|sources: Vec<String>| {
    let sources = sources
        .into_iter()
        .enumerate()
        .map(|(idx, source)| (PathBuf::from(format!("file{idx}.go")), source))
        .collect();
    let Ok(package) = Package::from_sources("fuzz", "example.com/fuzz", sources) else {
        return;
    };
    if let Ok(template) = generate(&package, &ExtractOptions::default()) {
        let _ = template.to_catalog();
    }
});
