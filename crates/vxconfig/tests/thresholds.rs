//! Threshold tests: parsing, percentile resolution and climatology.

use vxconfig::threshold::{compute_percentile, percentile, set_perc_pair, valid_sorted};
use vxconfig::{
    ClimoPoint, CompareOp, Config, Lookup, Lookups, PercSamples, PercThreshType, SingleThresh,
    ThreshNode, ThreshType, ThresholdError,
};

fn thresh(text: &str) -> SingleThresh {
    text.parse()
        .unwrap_or_else(|err| panic!("can't parse {text:?}: {err}"))
}

/// Load `source` and return the threshold array `name`.
fn load_thresh_array(source: &str, name: &str) -> vxconfig::ThreshArray {
    let mut config = Config::new();
    config.read_string("config", source).unwrap();
    config
        .lookup_thresh_array(name, Lookup::Required)
        .unwrap()
        .unwrap()
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_canonical_round_trip() {
    for text in [
        ">=30.5",
        "<=-1",
        ">0&&<=10",
        "<0||>100",
        "!(>0&&<1)",
        "NA",
        ">SOP50",
        "<=OCDP25",
        ">SFP10(2.5)",
    ] {
        assert_eq!(thresh(text).get_str(), text);
    }
}

#[test]
fn test_abbreviated_round_trip() {
    let t = thresh("ge30&&le45");
    assert_eq!(t.get_abbr_str(), "ge30.and.le45");
    let t = thresh("lt0||gt100");
    assert_eq!(t.get_abbr_str(), "lt0.or.gt100");
}

#[test]
fn test_percentile_aliases() {
    assert_eq!(thresh(">SCP50").get_ptype(), Some(PercThreshType::SampleObsClimo));
    assert_eq!(thresh(">CDP50").get_ptype(), Some(PercThreshType::ObsClimoDist));
    assert_eq!(thresh(">SFCP50").get_ptype(), Some(PercThreshType::SampleFcstClimo));
}

#[test]
fn test_tree_is_walkable_from_outside() {
    let t = thresh("ge5&&!lt10");
    let Some(ThreshNode::And { left, right, text }) = t.node() else {
        panic!("expected an and node, got {:?}", t.node());
    };
    assert_eq!(text.as_str(), ">=5&&!<10");
    assert_eq!(text.abbr(), "ge5.and..not.lt10");
    assert_eq!(left.get_str(), ">=5");
    let ThreshNode::Not { child, text } = right.as_ref() else {
        panic!("expected a not node, got {right:?}");
    };
    assert_eq!(text.as_str(), "!<10");
    assert_eq!(child.thresh_type(), ThreshType::Lt);

    let built = ThreshNode::or(
        ThreshNode::Simple(vxconfig::threshold::SimpleNode::compare(CompareOp::Lt, 0.0, "0")),
        ThreshNode::Simple(vxconfig::threshold::SimpleNode::compare(CompareOp::Gt, 100.0, "100")),
    );
    let ThreshNode::Or { text, .. } = &built else {
        panic!("expected an or node, got {built:?}");
    };
    assert_eq!(text.as_str(), "<0||>100");
    assert_eq!(SingleThresh::new(built), thresh("<0||>100"));
}

// =============================================================================
// Sample Percentiles
// =============================================================================

#[test]
fn test_sample_percentile_matches_independent_computation() {
    let obs: Vec<f64> = (1..=100).map(f64::from).collect();
    let mut t = thresh(">SOP50");
    assert!(matches!(t.check(1.0), Err(ThresholdError::Unresolved(_))));

    t.set_perc(&PercSamples {
        obs: Some(&obs),
        ..Default::default()
    })
    .unwrap();

    let expected = percentile(&valid_sorted(&obs), 0.5).unwrap();
    assert_eq!(t.get_value(), Some(expected));
    assert_eq!(t.get_str(), format!(">SOP50({expected})"));

    let passing = obs.iter().filter(|x| t.check(**x).unwrap()).count();
    assert!((passing as f64 / obs.len() as f64 - 0.5).abs() <= 0.05);
}

#[test]
fn test_bad_data_ignored() {
    let fcst = [3.0, -9999.0, 1.0, f64::NAN, 2.0];
    assert_eq!(valid_sorted(&fcst), vec![1.0, 2.0, 3.0]);

    let mut t = thresh("<=SFP100");
    t.set_perc(&PercSamples {
        fcst: Some(&fcst),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(t.get_value(), Some(3.0));
}

#[test]
fn test_missing_sample_is_error() {
    let mut t = thresh(">SFP50");
    assert!(matches!(
        t.set_perc(&PercSamples::default()),
        Err(ThresholdError::MissingSample { .. })
    ));
}

#[test]
fn test_coarse_sample_still_resolves() {
    // only three distinct values; the achieved fraction misses the 5%
    // tolerance, which is logged but not an error
    let obs = [1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 3.0];
    let mut t = thresh("<SOP30");
    t.set_perc(&PercSamples {
        obs: Some(&obs),
        ..Default::default()
    })
    .unwrap();
    assert!(t.get_value().is_some());
}

#[test]
fn test_frequency_bias_pair() {
    let fcst: Vec<f64> = (1..=10).map(f64::from).collect();
    let obs: Vec<f64> = (1..=10).map(f64::from).collect();
    let mut fthr = thresh("==FBIAS1");
    let mut othr = thresh(">5");

    set_perc_pair(
        &mut fthr,
        &mut othr,
        &PercSamples {
            fcst: Some(&fcst),
            obs: Some(&obs),
            ..Default::default()
        },
    )
    .unwrap();

    let opct = compute_percentile(&obs, 5.0, false).unwrap();
    let expected = percentile(&valid_sorted(&fcst), opct).unwrap();
    assert_eq!(fthr.get_type(), ThreshType::Gt);
    assert!((fthr.get_value().unwrap() - expected).abs() < 1e-9);
}

// =============================================================================
// Climatology
// =============================================================================

#[test]
fn test_climo_distribution_check() {
    let t = thresh(">OCDP90");
    let climo = ClimoPoint {
        obs_mean: Some(10.0),
        obs_sd: Some(2.0),
        ..Default::default()
    };
    // the 90th percentile of N(10, 2) is about 12.563
    assert!(t.check_with_climo(12.6, Some(&climo)).unwrap());
    assert!(!t.check_with_climo(12.5, Some(&climo)).unwrap());
    assert!(matches!(
        t.check_with_climo(12.6, Some(&ClimoPoint::default())),
        Err(ThresholdError::MissingClimo(_))
    ));
}

#[test]
fn test_obs_climo_prob() {
    let close = |a: Option<f64>, b: f64| (a.unwrap() - b).abs() < 1e-9;
    assert!(close(thresh(">OCDP90").obs_climo_prob(), 0.1));
    assert!(close(thresh("<=OCDP25").obs_climo_prob(), 0.25));
    assert!(close(thresh("<OCDP10||>OCDP90").obs_climo_prob(), 0.2));
    assert!(close(thresh(">OCDP10&&<OCDP90").obs_climo_prob(), 0.8));
    assert_eq!(thresh(">5").obs_climo_prob(), None);
}

// =============================================================================
// Threshold Arrays
// =============================================================================

#[test]
fn test_array_first_match() {
    let cats = load_thresh_array("cats = [ <0, <10, >=10 ];", "cats");
    assert_eq!(cats.check_all(-5.0).unwrap(), Some(0));
    assert_eq!(cats.check_all(5.0).unwrap(), Some(1));
    assert_eq!(cats.check_all(50.0).unwrap(), Some(2));
}

#[test]
fn test_prob_thresholds() {
    let good = load_thresh_array("p = [ >=0.0, >=0.25, >=0.5, >=0.75, >=1.0 ];", "p");
    assert!(good.check_prob_thresh().is_ok());

    let bad = load_thresh_array("p = [ >=0.0, >0.5, >=1.0 ];", "p");
    assert!(matches!(
        bad.check_prob_thresh(),
        Err(ThresholdError::InvalidProbThresh { .. })
    ));
}

#[test]
fn test_unit_conversion() {
    let mut cats = load_thresh_array("t = [ >273.15, <=0.5&&>0 ];", "t");
    cats.multiply_by(2.0);
    assert_eq!(cats[0].get_value(), Some(546.3));
    assert!(cats[1].check(0.9).unwrap());
    assert!(!cats[1].check(1.1).unwrap());
}
