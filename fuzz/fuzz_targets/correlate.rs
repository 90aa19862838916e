#![no_main]

use arbitrary::Arbitrary;
use depdiscover_sbom_scanner::{
    Correlator, Dependency, DependencyKind, LegacyMatchPolicy, NoLookup, Provenance,
    StrictMatchPolicy,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Debug, Arbitrary)]
struct Input {
    strict: bool,
    declared: Vec<(String, String)>,
    headers: Vec<String>,
    libraries: Vec<String>,
}

fuzz_target!(|input: Input| {
    let correlator = if input.strict {
        Correlator::new(Arc::new(StrictMatchPolicy), Arc::new(NoLookup))
    } else {
        Correlator::new(Arc::new(LegacyMatchPolicy), Arc::new(NoLookup))
    };

    let declared: Vec<Dependency> = input
        .declared
        .into_iter()
        .map(|(name, version)| {
            Dependency::declared(name, version, DependencyKind::Vcpkg, Provenance::Manifest)
        })
        .collect();
    let declared_len = declared.len();

    let outcome = correlator.correlate(declared, input.headers, input.libraries.clone());

    // 선언 레코드는 모두 남고, 합성 레코드는 그 뒤에만 온다
    assert!(outcome.dependencies.len() >= declared_len);
    assert!(
        outcome.dependencies[declared_len..]
            .iter()
            .all(|d| d.is_synthetic())
    );

    // 라이브러리는 최대 한 레코드에만 귀속된다
    let mut owned: Vec<&String> = outcome
        .dependencies
        .iter()
        .flat_map(|d| d.libraries.iter())
        .collect();
    let total = owned.len();
    owned.sort();
    owned.dedup();
    assert_eq!(owned.len(), total);
});
