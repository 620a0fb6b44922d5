//! End-to-end scenarios in an isovelocity channel
//!
//! Every scenario uses a 1500 m/s ocean between a pressure-release surface
//! at 0 m and a rigid seabed at 100 m, with the source at 50 m.

use approx::assert_relative_eq;
use ocean_acoustics_core::dimension::PlanarMedium;
use ocean_acoustics_core::environment::AttenuationModel;
use ocean_acoustics_core::field::{BeamInfluence, BeamSettings};
use ocean_acoustics_core::ray::{self, TraceParams};
use ocean_acoustics_core::{
    AngleSpec, AttenuationUnits, BeamBox, BeamType, BoundaryCondition, BoundaryProfile, Environment,
    Environment2D, Field, FieldMode, Launch, Parallelism, Params, Planar, Point3, RayOrigin, ReceiverGrid,
    RunType, Session, SoundSpeedProfile, Termination, TwoD,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn channel() -> Environment2D {
    Environment::new(
        SoundSpeedProfile::isovelocity(1500.0, 0.0, 100.0).unwrap(),
        BoundaryProfile::flat(0.0),
        BoundaryProfile::flat(100.0),
        BoundaryCondition::PressureRelease,
        BoundaryCondition::Rigid,
    )
    .unwrap()
}

fn params(declinations: Vec<f64>) -> Params<TwoD> {
    let mut p = Params::new(channel());
    p.run.parallelism = Parallelism::Sequential;
    p.run.declinations = AngleSpec::Explicit(declinations);
    p.run.step_size = 20.0;
    p
}

#[test]
fn test_scenario_a_horizontal_ray_runs_straight_to_the_box() {
    let mut p = params(vec![0.0]);
    p.run.beam_box = BeamBox {
        max_range: Some(5000.0),
        max_depth: None,
    };
    let mut session = Session::setup(p).unwrap();
    session.run();

    let rays = session.rays();
    assert_eq!(rays.len(), 1);
    let ray = &rays[0];
    assert_eq!(ray.termination, Termination::RangeLimit);
    assert_eq!(ray.bounces(), (0, 0));
    for point in &ray.points {
        assert_relative_eq!(point.x.y, 50.0, epsilon = 1e-9);
        assert_relative_eq!(point.t.y, 0.0, epsilon = 1e-15);
    }
    let last = ray.last().unwrap();
    assert_relative_eq!(last.x.x, 5000.0, max_relative = 1e-6);
    assert!(ray.points.windows(2).all(|w| w[1].x.x > w[0].x.x));
}

#[test]
fn test_scenario_b_steep_ray_reflects_off_the_seabed() {
    let mut session = Session::setup(params(vec![60.0])).unwrap();
    session.run();
    let ray = &session.rays()[0];

    let hit = ray
        .points
        .iter()
        .position(|p| p.bottom_bounces == 1)
        .expect("ray should reach the seabed");
    let before = &ray.points[hit - 1];
    let after = &ray.points[hit];

    assert_eq!(before.bottom_bounces, 0);
    assert_eq!(after.top_bounces, 0);
    assert_relative_eq!(after.x.y, 100.0, epsilon = 1e-6);
    assert_relative_eq!(after.x.x, 50.0 / 60f64.to_radians().tan(), max_relative = 1e-6);
    assert!(before.t.y > 0.0);
    assert!(after.t.y < 0.0);
    assert_relative_eq!(after.t.y, -before.t.y, max_relative = 1e-9);
    assert_relative_eq!(after.t.x, before.t.x, max_relative = 1e-9);
}

#[test]
fn test_scenario_c_one_eigenray_per_receiver() {
    let mut p = params(vec![-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0]);
    p.run.run_type = RunType::Eigenray;
    p.run.step_size = 10.0;
    p.run.receivers = ReceiverGrid {
        ranges: vec![1000.0],
        depths: vec![45.0, 55.0],
        bearings: vec![0.0],
    };
    let mut session = Session::setup(p).unwrap();
    let summary = session.run();

    assert_eq!(summary.eigenrays, 2);
    let eigenrays = session.eigenrays();
    let expected = (5.0_f64 / 1000.0).atan().to_degrees();
    for (depth_slot, sign, bracket) in [(0, -1.0, (-1.0, 0.0)), (1, 1.0, (0.0, 1.0))] {
        let found: Vec<_> = eigenrays
            .iter()
            .filter(|e| e.receiver.depth == depth_slot)
            .collect();
        assert_eq!(found.len(), 1, "receiver {depth_slot}");
        let e = found[0];
        assert_eq!((e.topology.top, e.topology.bottom), (0, 0));
        assert!(e.declination > bracket.0 && e.declination < bracket.1);
        assert!(e.miss <= 1.0);
        assert_relative_eq!(e.declination, sign * expected, epsilon = 0.02);
        assert_eq!(e.source_index(), 0);
    }
}

#[test]
fn test_scenario_d_reaccumulating_a_beam_is_identical() {
    let env = channel();
    let model = AttenuationModel {
        frequency: 100.0,
        units: AttenuationUnits::default(),
        thorp: false,
    };
    let medium = PlanarMedium::new(&env, model);
    let origin = RayOrigin::new(Point3::new(0.0, 0.0, 50.0), 0.0);
    let params = TraceParams {
        step: 10.0,
        max_steps: 10_000,
        max_range: 2000.0,
        max_depth: 200.0,
        amplitude_floor: ray::DEFAULT_AMPLITUDE_FLOOR,
    };
    let beam_ray = ray::trace::<Planar, _>(&medium, &origin, Launch::new(10.0, 0.0), 0, &params);
    let beam = BeamSettings {
        beam_type: BeamType::GeometricHat,
        frequency: 100.0,
        declination_step: 1f64.to_radians(),
        bearing_step: 0.0,
        source_speed: 1500.0,
    };
    let grid = ReceiverGrid {
        ranges: (1..=20).map(|i| f64::from(i) * 100.0).collect(),
        depths: (1..=9).map(|i| f64::from(i) * 10.0).collect(),
        bearings: vec![0.0],
    };

    let mut field = Field::new(0, grid, FieldMode::Coherent);
    Planar::accumulate(&mut field, &beam_ray, &beam);
    let first = field.values().to_vec();
    assert!(first.iter().any(|v| v.norm() > 0.0), "beam should reach some receivers");

    field.reset();
    assert!(field.values().iter().all(|v| v.norm() == 0.0));
    Planar::accumulate(&mut field, &beam_ray, &beam);
    assert_eq!(field.values(), first.as_slice());
}

#[test]
fn test_field_runs_repeat_exactly() {
    let mut p = params(vec![0.0]);
    p.run.declinations = AngleSpec::fan(-20.0, 20.0, 81);
    p.run.run_type = RunType::Incoherent;
    p.run.receivers = ReceiverGrid {
        ranges: vec![250.0, 500.0, 750.0, 1000.0],
        depths: vec![20.0, 40.0, 60.0, 80.0],
        bearings: vec![0.0],
    };
    let mut session = Session::setup(p).unwrap();
    session.run();
    let first = session.fields()[0].clone();
    session.run();
    assert_eq!(session.fields()[0], first);

    // Every receiver sits inside the fan, so each sees some energy
    for d in 0..4 {
        for r in 0..4 {
            let tl = first.transmission_loss(0, d, r).unwrap();
            assert!(tl.is_finite() && tl > 0.0, "TL at depth {d} range {r} is {tl}");
        }
    }
}
