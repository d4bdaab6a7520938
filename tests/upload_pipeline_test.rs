// ==========================================
// 上传流水线集成测试
// ==========================================
// 测试目标: 解析 -> 聚合 -> 落库 -> 历史查询，全链路
// ==========================================


use chem_equipment::api::ApiError;
use chem_equipment::app::AppState;
use chem_equipment::config::AppConfig;
use chem_equipment::logging;
use test_helpers::{make_csv, make_xlsx, SAMPLE_CSV};

#[test]
fn test_csv_upload_summary() {
    logging::init_test();
    let (_temp_file, state) = test_helpers::create_test_state().expect("state");

    let record = state
        .dataset_api
        .upload(Some("plant_a.csv"), SAMPLE_CSV.as_bytes())
        .expect("upload");

    assert_eq!(record.summary.total_equipment, 3);
    assert_eq!(record.summary.avg_flowrate, 20.0);
    assert_eq!(record.summary.avg_pressure, 3.0);
    assert_eq!(record.summary.avg_temperature, 60.0);
    assert_eq!(
        record.summary.type_distribution.to_pairs(),
        vec![("Pump".to_string(), 2), ("Valve".to_string(), 1)]
    );
    assert_eq!(record.source_filename.as_deref(), Some("plant_a.csv"));
}

#[test]
fn test_xlsx_upload_matches_csv() {
    logging::init_test();
    let (_temp_file, state) = test_helpers::create_test_state().expect("state");

    let rows = [
        ("Pump", 10.0, 2.0, 50.0),
        ("Valve", 20.0, 3.0, 60.0),
        ("Pump", 30.0, 4.0, 70.0),
    ];
    let xlsx = make_xlsx(&["Type", "Flowrate", "Pressure", "Temperature"], &rows);
    let from_xlsx = state
        .dataset_api
        .upload(Some("PLANT.XLSX"), &xlsx)
        .expect("xlsx upload");
    let from_csv = state
        .dataset_api
        .upload(Some("plant.csv"), make_csv(&rows).as_bytes())
        .expect("csv upload");

    assert_eq!(from_xlsx.summary, from_csv.summary);
    assert!(from_csv.id > from_xlsx.id);
}

#[test]
fn test_means_are_rounded_to_two_decimals() {
    let (_temp_file, state) = test_helpers::create_test_state().expect("state");

    let csv = make_csv(&[
        ("Pump", 1.0, 1.0, 1.0),
        ("Pump", 2.0, 2.0, 2.0),
        ("Pump", 2.0, 2.0, 2.0),
    ]);
    let record = state
        .dataset_api
        .upload(Some("r.csv"), csv.as_bytes())
        .expect("upload");

    // 5 / 3 = 1.6666...
    assert_eq!(record.summary.avg_flowrate, 1.67);
}

#[test]
fn test_rejections_leave_history_untouched() {
    let (_temp_file, state) = test_helpers::create_test_state().expect("state");
    let api = &state.dataset_api;

    api.upload(Some("ok.csv"), SAMPLE_CSV.as_bytes()).expect("upload");

    let missing = api.upload(Some("bad.csv"), b"Type,Flowrate,Pressure\nPump,1,2\n");
    match missing {
        Err(ApiError::MissingColumn(columns)) => assert_eq!(columns, vec!["Temperature"]),
        other => panic!("Expected MissingColumn, got {:?}", other),
    }

    let invalid = api.upload(
        Some("bad.csv"),
        b"Type,Flowrate,Pressure,Temperature\nPump,abc,2,3\n",
    );
    assert!(matches!(invalid, Err(ApiError::InvalidData(_))));

    assert!(matches!(
        api.upload(Some("data.json"), b"{}"),
        Err(ApiError::UnsupportedFormat)
    ));
    assert!(matches!(
        api.upload(Some("garbage.xlsx"), b"not a workbook"),
        Err(ApiError::InvalidData(_))
    ));

    assert_eq!(api.history(None).expect("history").len(), 1);
}

#[test]
fn test_history_survives_restart() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("db");

    let first_id = {
        let state = AppState::new(AppConfig::with_db_path(db_path.clone())).expect("state");
        state
            .dataset_api
            .upload(Some("plant.csv"), SAMPLE_CSV.as_bytes())
            .expect("upload")
            .id
    };

    let state = AppState::new(AppConfig::with_db_path(db_path)).expect("reopen");
    let history = state.dataset_api.history(None).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, first_id);

    // id 不复用
    let next = state
        .dataset_api
        .upload(Some("plant.csv"), SAMPLE_CSV.as_bytes())
        .expect("upload");
    assert!(next.id > first_id);
}

#[test]
fn test_huge_readings_store_finite_means() {
    logging::init_test();
    let (_temp_file, state) = test_helpers::create_test_state().expect("state");

    let csv = "Type,Flowrate,Pressure,Temperature\nPump,1e307,1,20\nValve,1e307,2,30\n";
    let record = state
        .dataset_api
        .upload(Some("huge.csv"), csv.as_bytes())
        .expect("upload");
    assert_eq!(record.summary.avg_flowrate, 1e307);
    assert_eq!(record.summary.avg_pressure, 1.5);

    // 两行 1e308 之和溢出
    let csv = "Type,Flowrate,Pressure,Temperature\nPump,1e308,1,20\nPump,1e308,1,20\n";
    let record = state
        .dataset_api
        .upload(Some("overflow.csv"), csv.as_bytes())
        .expect("upload");
    assert_eq!(record.summary.avg_flowrate, 1e308);

    let json = serde_json::to_value(&record).expect("serialize");
    assert_eq!(json["avg_flowrate"].as_f64(), Some(1e308));

    let stored = state.dataset_api.get_dataset(record.id).expect("stored");
    assert_eq!(stored.summary.avg_flowrate, 1e308);
}

#[test]
fn test_duplicate_required_column_rejected() {
    logging::init_test();
    let (_temp_file, state) = test_helpers::create_test_state().expect("state");

    let csv = "Type,Flowrate,Pressure,Temperature,Flowrate\nPump,1,1,1,2\n";
    let result = state.dataset_api.upload(Some("dup.csv"), csv.as_bytes());
    match result {
        Err(ApiError::InvalidData(msg)) => assert!(msg.contains("Flowrate"), "{}", msg),
        other => panic!("Expected InvalidData, got {:?}", other.map(|r| r.id)),
    }
    assert!(state.dataset_api.history(None).expect("history").is_empty());
}
