use safe_commute::crash::dataset::{CrashDataset, load_csv_at};
use safe_commute::crash::record::{TimeBucket, Weather};
use safe_commute::crash::stats::DatasetStats;
use safe_commute::geo::Coordinate;
use safe_commute::geocode::GazetteerGeocoder;
use safe_commute::request::{RouteRequest, TrafficDensity, TransportMode};
use safe_commute::scoring::model::{CrashHistoryModel, HeuristicModel, SafetyModel};
use safe_commute::scoring::{SafetyAssessment, assess_route, round_score};
use std::fs;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use time::macros::datetime;

const CRASHES: &str = "\
CrashDateTime,Latitude,Longitude,FatalInjuries,SevereInjuries,ModerateInjuries,MinorInjuries,Weather,CollisionType,PedestrianInvolved,AStreetName,BStreetName
2023-03-01 07:30:00,37.305,-121.90,0,1,0,0,Rain,Broadside,No,First St,Main St
2023-04-11 07:45:00,37.310,-121.90,0,0,1,0,Clear,Rear End,No,First St,Main St
2023-05-20 08:10:00,37.315,-121.90,0,0,0,1,Clear,Rear End,No,First St,Main St
2023-06-02 07:05:00,37.320,-121.90,0,0,0,0,Rain,Sideswipe,No,First St,Main St
2023-07-14 13:00:00,37.500,-121.50,1,0,0,0,Clear,Head-On,No,Far Rd,Remote Ave
2023-08-09 19:30:00,,,0,0,0,1,Clear,Rear End,No,Oak St,
";

fn load_fixture() -> Result<CrashDataset, Box<dyn std::error::Error>> {
    let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
    let path = std::env::temp_dir().join(format!("safe-commute-pipeline-{unique}.csv"));
    fs::write(&path, CRASHES)?;
    let dataset = load_csv_at(&path, datetime!(2024-01-01 0:00 UTC));
    let _ = fs::remove_file(&path);
    Ok(dataset?)
}

fn geocoder() -> GazetteerGeocoder {
    GazetteerGeocoder::new(vec![
        ("Home".to_string(), Coordinate::new(37.30, -121.90)),
        ("Work".to_string(), Coordinate::new(37.33, -121.90)),
    ])
}

fn request(bucket: TimeBucket) -> RouteRequest {
    RouteRequest {
        origin: "home".to_string(),
        destination: "work".to_string(),
        travel_time_bucket: bucket,
        weather: Weather::Clear,
        traffic_density: TrafficDensity::Medium,
        transport_mode: TransportMode::Driving,
        user_preferences: None,
    }
}

fn assess(model: &dyn SafetyModel, bucket: TimeBucket) -> SafetyAssessment {
    assess_route(model, &geocoder(), &request(bucket)).expect("locations resolve")
}

#[test]
fn history_near_route_drives_bucket_scores() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = Arc::new(load_fixture()?);
    assert_eq!(dataset.len(), 6);

    let model = CrashHistoryModel::new(Arc::clone(&dataset), 1.0);
    let rush = assess(&model, TimeBucket::MorningRush);
    let midday = assess(&model, TimeBucket::MidDay);

    assert!(rush.data_backed);
    assert_eq!(rush.crash_count, 4);
    assert_eq!(rush.bucket_scores.len(), TimeBucket::ALL.len());
    assert_eq!(rush.bucket_scores[&TimeBucket::MorningRush], 1.0);
    assert!(rush.bucket_scores[&TimeBucket::MidDay] > 9.99);
    assert!(midday.final_score > rush.final_score);
    assert_eq!(rush.display_score, round_score(rush.final_score));
    Ok(())
}

#[test]
fn history_lowers_score_compared_to_no_data() -> Result<(), Box<dyn std::error::Error>> {
    let loaded = CrashHistoryModel::new(Arc::new(load_fixture()?), 1.0);
    let empty = CrashHistoryModel::new(Arc::new(CrashDataset::empty()), 1.0);

    let with_history = assess(&loaded, TimeBucket::MorningRush);
    let without_history = assess(&empty, TimeBucket::MorningRush);

    assert_eq!(without_history.crash_count, 0);
    assert!(with_history.final_score < without_history.final_score);
    assert!(with_history.alert_count > 0);
    Ok(())
}

#[test]
fn heuristic_model_ignores_history() -> Result<(), Box<dyn std::error::Error>> {
    let assessment = assess(&HeuristicModel, TimeBucket::MorningRush);

    assert!(!assessment.data_backed);
    assert_eq!(assessment.crash_count, 0);
    assert_eq!(assessment.component_breakdown, None);
    assert!(assessment.route_length_miles > 2.0);
    Ok(())
}

#[test]
fn stats_rank_the_busiest_intersection() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load_fixture()?;

    let stats = DatasetStats::from_records(dataset.records());

    assert_eq!(stats.total_incidents, 6);
    assert_eq!(stats.incidents_by_bucket[&TimeBucket::MorningRush], 4);
    assert_eq!(stats.weather_distribution[&Weather::Rain], 2);
    let top = &stats.hotspots[0];
    assert_eq!(top.location, "First St & Main St");
    assert_eq!(top.crash_count, 4);
    assert_eq!(top.peak_hour, 7);
    Ok(())
}
