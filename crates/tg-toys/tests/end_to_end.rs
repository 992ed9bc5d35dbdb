use rand::SeedableRng;
use rand::rngs::StdRng;
use tg_core::{Error, ProcessKind};
use tg_hist::{Axis, Grid2D, InMemoryLoader, algebra};
use tg_toys::{
    EstimateKind, Ledger, LedgerRow, NameSubstitution, Pdf, PseudoDataConfig, PseudoDataGenerator,
    RegionCatalog, TransferChain, build_asimov, sample,
};

fn axes() -> (Axis, Axis) {
    (Axis::uniform(2, 0.0, 2.0).unwrap(), Axis::uniform(2, 0.0, 2.0).unwrap())
}

fn grid(name: &str, rows: &[Vec<f64>]) -> Grid2D {
    let (x, y) = axes();
    Grid2D::from_rows(name, x, y, rows).unwrap()
}

fn row(region: &str, process: &str, kind: ProcessKind, file: &str) -> LedgerRow {
    LedgerRow {
        region: region.into(),
        process: process.into(),
        process_type: kind,
        variation: "nominal".into(),
        source_filename: file.into(),
        source_histname: format!("{process}_{region}"),
    }
}

/// Fail data `[[10,5],[3,2]]`, no fail background, constant 0.5 transfer.
fn scenario() -> (Ledger, InMemoryLoader, Vec<Grid2D>) {
    let ledger = Ledger::new(vec![
        row("Fail", "data_obs", ProcessKind::Data, "data.json"),
        row("Pass", "data_obs", ProcessKind::Data, "data.json"),
    ]);
    let loader = InMemoryLoader::new()
        .with("data.json", grid("data_obs_Fail", &[vec![10.0, 5.0], vec![3.0, 2.0]]))
        .with("data.json", grid("data_obs_Pass", &[vec![4.0, 3.0], vec![2.0, 1.0]]));
    let transfers = vec![grid("b_0x0", &[vec![0.5, 0.5], vec![0.5, 0.5]])];
    (ledger, loader, transfers)
}

#[test]
fn pass_asimov_is_half_the_fail_residual() {
    let (ledger, loader, transfers) = scenario();
    let regions = vec!["Fail".to_string(), "Pass".to_string()];
    let chain = TransferChain::new(regions.clone(), transfers).unwrap();
    let templates = RegionCatalog::resolve(&ledger, &regions, &NameSubstitution::none())
        .unwrap()
        .load(&loader)
        .unwrap();
    let residual = TransferChain::fail_residual(&templates[0]).unwrap();
    let estimates = build_asimov(&templates, &chain.propagate(residual).unwrap()).unwrap();

    let pass = &estimates[1];
    assert_eq!(pass.asimov().content(), &[5.0, 2.5, 1.5, 1.0]);
    assert!(pass.get(EstimateKind::Background).content().iter().all(|v| *v == 0.0));
    assert_eq!(pass.observed, 10.0);
}

#[test]
fn ten_event_toy_sums_to_ten() {
    let (ledger, loader, transfers) = scenario();
    let mut cfg = PseudoDataConfig::new(["Fail", "Pass"]);
    cfg.blind_fail = true;
    let report = PseudoDataGenerator::new(cfg).generate(&ledger, &loader, transfers).unwrap();
    assert_eq!(report.toys.len(), 1);
    let toy = &report.toys[0];
    assert_eq!(toy.region, "Pass");
    assert_eq!(toy.n_events, 10);
    assert_eq!(algebra::integral(&toy.toy), 10.0);
}

#[test]
fn first_bin_drawn_half_the_time() {
    let asimov = grid("asimov_Pass", &[vec![5.0, 2.5], vec![1.5, 1.0]]);
    let pdf = Pdf::from_asimov(&asimov).unwrap();
    let cdf = pdf.cdf().unwrap();
    let n = 20_000;
    let toy = sample(&pdf, &cdf, n, "Pass", &mut StdRng::seed_from_u64(2024)).unwrap();
    assert_eq!(algebra::integral(&toy), n as f64);
    let frac = toy.get(1, 1) / n as f64;
    assert!((0.45..=0.55).contains(&frac), "bin (1,1) fraction = {frac}");
    let frac_22 = toy.get(2, 2) / n as f64;
    assert!((0.07..=0.13).contains(&frac_22), "bin (2,2) fraction = {frac_22}");
}

#[test]
fn three_region_chain_needs_two_transfers() {
    let (ledger, loader, transfers) = scenario();
    let err = PseudoDataGenerator::new(PseudoDataConfig::new(["Fail", "Loose", "Pass"]))
        .generate(&ledger, &loader, transfers)
        .unwrap_err();
    assert!(matches!(err, Error::ChainLengthMismatch { regions: 3, transfers: 1 }));
    assert!(err.is_configuration());
}

#[test]
fn toys_in_signal_region_via_substitution() {
    let ledger = Ledger::new(vec![
        row("CR_fail", "data_obs", ProcessKind::Data, "data.json"),
        row("CR_fail", "ttbar", ProcessKind::Background, "ttbar.json"),
        row("CR_pass", "data_obs", ProcessKind::Data, "data.json"),
        row("CR_pass", "ttbar", ProcessKind::Background, "ttbar.json"),
    ]);
    let loader = InMemoryLoader::new()
        .with("data.json", grid("data_obs_SR_fail", &[vec![20.0, 10.0], vec![6.0, 4.0]]))
        .with("data.json", grid("data_obs_SR_pass", &[vec![8.0, 4.0], vec![2.0, 1.0]]))
        .with("ttbar.json", grid("ttbar_SR_fail", &[vec![2.0, 0.0], vec![0.0, 0.0]]))
        .with("ttbar.json", grid("ttbar_SR_pass", &[vec![1.0, 1.0], vec![1.0, 1.0]]));

    let mut cfg = PseudoDataConfig::new(["SR_fail", "SR_pass"]);
    cfg.substitutions = NameSubstitution::new([("CR_fail", "SR_fail"), ("CR_pass", "SR_pass")]);
    let report = PseudoDataGenerator::new(cfg.clone())
        .generate(&ledger, &loader, vec![grid("b_0x0", &[vec![0.25; 2], vec![0.25; 2]])])
        .unwrap();
    assert!(report.is_complete());
    // (20-2)*0.25 + 1 = 5.5, 10*0.25 + 1 = 3.5, 6*0.25 + 1 = 2.5, 4*0.25 + 1 = 2.
    assert_eq!(report.estimates[1].asimov().content(), &[5.5, 3.5, 2.5, 2.0]);
    assert_eq!(report.toys[1].n_events, 15);

    // Without the substitution the signal-region names are unknown.
    cfg.substitutions = NameSubstitution::none();
    let err = PseudoDataGenerator::new(cfg)
        .generate(&ledger, &loader, vec![grid("b_0x0", &[vec![0.25; 2], vec![0.25; 2]])])
        .unwrap_err();
    assert!(matches!(err, Error::RegionNotFound { .. }));
}
