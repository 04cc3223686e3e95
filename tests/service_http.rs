mod support;

use std::time::Duration;

use exoscope::config::AppSettings;
use exoscope::dashboard::DashboardController;
use exoscope::dataset::DatasetFile;
use exoscope::labels::PredictionLabel;
use exoscope::service::{HttpPredictionService, PredictionService, ServiceError, UPLOAD_FIELD};
use support::fake_service::FakeService;

const PREDICTIONS: &str = r#"[
    {"koi_period": 9.48, "koi_fpflag_nt": 0, "koi_depth": 615.8, "prediction": "CONFIRMED", "confidence": 0.97},
    {"koi_period": 54.4, "koi_fpflag_nt": 0, "koi_depth": 874.8, "prediction": "CANDIDATE", "confidence": 0.61},
    {"koi_period": 1.73, "koi_fpflag_nt": 1, "koi_depth": 10829.0, "prediction": "FALSE_POSITIVE", "confidence": 0.99}
]"#;

const IMPORTANCE: &str = r#"[{"feature": "koi_depth", "score": 50}, {"feature": "koi_period", "score": 100}]"#;

fn settings_for(service: &FakeService) -> AppSettings {
    let mut settings = AppSettings::default();
    settings.service.base_url = service.base_url.clone();
    settings.service.timeout_secs = 5;
    settings
}

fn client_for(service: &FakeService) -> HttpPredictionService {
    let settings = settings_for(service);
    HttpPredictionService::new(settings.endpoints().unwrap(), settings.timeout())
}

fn write_dataset(dir: &std::path::Path) -> DatasetFile {
    let path = dir.join("kepler_koi.csv");
    std::fs::write(&path, "koi_period,koi_depth\n9.48,615.8\n54.4,874.8\n1.73,10829.0\n").unwrap();
    DatasetFile::open(path).unwrap()
}

#[test]
fn upload_is_sent_as_multipart_file_field() {
    let service = FakeService::start(&[("/predict", 200, PREDICTIONS)]);
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path());

    let result_set = client_for(&service).submit_dataset(&dataset).unwrap();
    assert_eq!(result_set.len(), 3);
    assert_eq!(result_set.rows()[2].label, PredictionLabel::FalsePositive);
    assert_eq!(result_set.feature_columns(), ["koi_period", "koi_depth"]);

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/predict");
    assert!(
        request
            .content_type
            .as_deref()
            .unwrap()
            .starts_with("multipart/form-data; boundary=")
    );
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains(&format!(
        "Content-Disposition: form-data; name=\"{UPLOAD_FIELD}\"; filename=\"kepler_koi.csv\""
    )));
    assert!(body.contains("54.4,874.8"));
}

#[test]
fn error_status_carries_code_and_body() {
    let service = FakeService::start(&[("/predict", 422, r#"{"detail": "bad columns"}"#)]);
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path());

    let err = client_for(&service).submit_dataset(&dataset).unwrap_err();
    match err {
        ServiceError::Status { code, body } => {
            assert_eq!(code, 422);
            assert!(body.contains("bad columns"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_array_prediction_body_is_malformed() {
    let service = FakeService::start(&[("/predict", 200, r#"{"rows": []}"#)]);
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path());

    let err = client_for(&service).submit_dataset(&dataset).unwrap_err();
    assert!(matches!(err, ServiceError::Malformed(_)));
}

#[test]
fn unreachable_service_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let mut settings = AppSettings::default();
    settings.service.base_url = format!("http://{addr}");
    let client = HttpPredictionService::new(settings.endpoints().unwrap(), Duration::from_secs(2));

    let err = client.fetch_feature_importance().unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
}

#[test]
fn dashboard_shows_importance_when_matrix_endpoint_fails() {
    let service = FakeService::start(&[
        ("/predict", 200, PREDICTIONS),
        ("/metrics/feature-importance", 200, IMPORTANCE),
        ("/metrics/confusion-matrix", 500, "Internal Server Error"),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kepler_koi.csv");
    std::fs::write(&path, "koi_period\n1\n").unwrap();

    let mut dashboard = DashboardController::from_settings(settings_for(&service)).unwrap();
    dashboard.select_dataset(&path).unwrap();
    assert!(dashboard.submit());
    dashboard.refresh_metrics();
    assert!(dashboard.wait_until_idle(Duration::from_secs(10)));

    let results = dashboard.results();
    assert_eq!(results.total_count(), 3);
    assert_eq!(results.columns(), ["koi_period", "koi_depth"]);
    assert_eq!(results.summary().false_positive, 1);

    let importance = dashboard.metrics().importance().data().unwrap();
    assert_eq!(importance[0].feature_key, "koi_period");
    assert_eq!(importance[0].normalized_score, 1.0);
    assert_eq!(importance[1].normalized_score, 0.5);
    assert!(dashboard.metrics().evaluation().data().is_none());
    assert!(dashboard.metrics().evaluation().last_error().is_some());
}
