//! Backend determinism
//!
//! Sequential and parallel runs over randomised environments must produce
//! identical rays, eigenrays and fields, bit for bit.

use ocean_acoustics_core::{
    AngleSpec, BoundaryCondition, BoundaryGrid, BoundaryProfile, BoundaryVertex, Dimensionality, Environment,
    GridSpec, HalfSpace, Nx2D, Parallelism, Params, ReceiverGrid, RunType, Session, SoundSpeedProfile,
    SspInterpolation, SspPoint, ThreeD, TwoD,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const WATER_TOP: f64 = 0.0;
const PROFILE_BOTTOM: f64 = 140.0;

fn random_profile(rng: &mut StdRng) -> SoundSpeedProfile {
    let points = [0.0, 20.0, 45.0, 80.0, PROFILE_BOTTOM]
        .iter()
        .map(|z| SspPoint::new(*z, rng.random_range(1480.0..1520.0)))
        .collect();
    SoundSpeedProfile::new(SspInterpolation::Pchip, points).unwrap()
}

fn seabed() -> BoundaryCondition {
    BoundaryCondition::HalfSpace(HalfSpace::fluid(1700.0, 1.6))
}

fn environment_2d(rng: &mut StdRng) -> Environment<BoundaryProfile> {
    let bottom = [0.0, 400.0, 900.0, 1500.0, 3000.0]
        .iter()
        .map(|r| BoundaryVertex::new(*r, rng.random_range(90.0..130.0)))
        .collect();
    Environment::new(
        random_profile(rng),
        BoundaryProfile::flat(WATER_TOP),
        BoundaryProfile::new(bottom).unwrap(),
        BoundaryCondition::PressureRelease,
        seabed(),
    )
    .unwrap()
}

fn environment_3d(rng: &mut StdRng) -> Environment<BoundaryGrid> {
    let xs = vec![-2000.0, 0.0, 2000.0];
    let ys = vec![-2000.0, 0.0, 2000.0];
    let depths = (0..9).map(|_| rng.random_range(90.0..130.0)).collect();
    Environment::new(
        random_profile(rng),
        BoundaryGrid::flat(WATER_TOP),
        BoundaryGrid::new(GridSpec { xs, ys, depths }).unwrap(),
        BoundaryCondition::PressureRelease,
        seabed(),
    )
    .unwrap()
}

fn receivers(rng: &mut StdRng, bearings: Vec<f64>) -> ReceiverGrid {
    let mut ranges: Vec<f64> = (0..6).map(|_| rng.random_range(100.0..1500.0)).collect();
    ranges.sort_by(f64::total_cmp);
    ReceiverGrid {
        ranges,
        depths: vec![15.0, 35.0, 55.0, 75.0],
        bearings,
    }
}

/// Run the same parameters on both backends and compare every output.
fn assert_backends_agree<D>(params: &Params<D>)
where
    D: Dimensionality,
    D::Space: ocean_acoustics_core::field::BeamInfluence + ocean_acoustics_core::eigen::EigenSearch,
{
    for run_type in [RunType::Ray, RunType::Eigenray, RunType::Coherent, RunType::Incoherent] {
        let mut outputs = Vec::new();
        for parallelism in [Parallelism::Sequential, Parallelism::Parallel { threads: 4 }] {
            let mut p = params.clone();
            p.run.run_type = run_type;
            p.run.parallelism = parallelism;
            let mut session = Session::setup(p).unwrap();
            let summary = session.run();
            outputs.push((
                summary,
                session.rays().to_vec(),
                session.eigenrays().to_vec(),
                session.fields().to_vec(),
            ));
        }
        let (a, b) = (&outputs[0], &outputs[1]);
        assert_eq!(a.0, b.0, "{run_type:?} summaries differ");
        assert!(a.1 == b.1, "{run_type:?} rays differ");
        assert!(a.2 == b.2, "{run_type:?} eigenrays differ");
        assert!(a.3 == b.3, "{run_type:?} fields differ");
    }
}

#[test]
fn test_2d_backends_agree() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..3 {
        let mut p = Params::<TwoD>::new(environment_2d(&mut rng));
        p.run.sources.depths = vec![rng.random_range(10.0..80.0), rng.random_range(10.0..80.0)];
        p.run.receivers = receivers(&mut rng, vec![0.0]);
        p.run.declinations = AngleSpec::fan(-25.0, 25.0, 151);
        p.run.frequency = rng.random_range(50.0..500.0);
        p.run.step_size = 15.0;
        assert_backends_agree(&p);
    }
}

#[test]
fn test_nx2d_backends_agree() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut p = Params::<Nx2D>::new(environment_3d(&mut rng));
    p.run.sources.depths = vec![40.0];
    p.run.receivers = receivers(&mut rng, vec![0.0, 45.0, 200.0]);
    p.run.declinations = AngleSpec::fan(-20.0, 20.0, 101);
    p.run.step_size = 20.0;
    assert_backends_agree(&p);
}

#[test]
fn test_3d_backends_agree() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut p = Params::<ThreeD>::new(environment_3d(&mut rng));
    p.run.sources.depths = vec![40.0];
    p.run.receivers = receivers(&mut rng, vec![0.0, 90.0]);
    p.run.declinations = AngleSpec::fan(-20.0, 20.0, 41);
    p.run.bearings = Some(AngleSpec::fan(0.0, 360.0, 25));
    p.run.step_size = 25.0;
    assert_backends_agree(&p);
}

#[test]
fn test_repeated_runs_are_identical() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut p = Params::<TwoD>::new(environment_2d(&mut rng));
    p.run.run_type = RunType::Coherent;
    p.run.receivers = receivers(&mut rng, vec![0.0]);
    p.run.declinations = AngleSpec::fan(-30.0, 30.0, 201);
    let mut session = Session::setup(p).unwrap();
    session.run();
    let first = session.fields().to_vec();
    session.run();
    assert!(session.fields() == first.as_slice());
    assert_eq!(session.run_count(), 2);
}
