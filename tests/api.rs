//! Integration tests for the HTTP clients.
//!
//! These tests use wiremock to simulate the Occupi backend and the
//! prediction service and verify request shapes, envelope handling and
//! transport failures.

use chrono::NaiveDate;
use occupi_client::{
    api::{ApiResponse, OccupiClient, UNEXPECTED_ERROR},
    config::NetworkConfig,
    models::{AnalyticsMetric, AnalyticsRange, CheckInRequest, LoginRequest},
    predictions::PredictionClient,
    traits::PredictionSource,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn network() -> NetworkConfig {
    NetworkConfig {
        request_timeout_secs: 10,
        connect_timeout_secs: 5,
    }
}

fn login_request() -> LoginRequest {
    LoginRequest {
        email: "test@example.com".to_string(),
        password: "password".to_string(),
    }
}

// ==================== Envelope Tests ====================

/// Test a successful login response carrying a token.
#[tokio::test]
async fn test_login_success() {
    let mock_server = MockServer::start().await;

    let body = r#"{
        "status": 200,
        "message": "Successful login!",
        "data": {"token": "abc.def.ghi"},
        "meta": null
    }"#;

    Mock::given(method("POST"))
        .and(path("/auth/login-mobile"))
        .and(body_json(serde_json::json!({
            "email": "test@example.com",
            "password": "password"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let response = client.login(&login_request()).await.unwrap();

    assert!(response.is_ok());
    assert_eq!(response.message(), "Successful login!");
    assert_eq!(response.into_data().unwrap().token, "abc.def.ghi");
}

/// Test that an error envelope is returned as a value, not an error.
#[tokio::test]
async fn test_login_error_envelope() {
    let mock_server = MockServer::start().await;

    let body = r#"{
        "status": 400,
        "message": "Invalid email or password",
        "error": {"code": "INVALID_AUTH", "message": "Invalid email or password", "details": null}
    }"#;

    Mock::given(method("POST"))
        .and(path("/auth/login-mobile"))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let response = client.login(&login_request()).await.unwrap();

    match response {
        ApiResponse::Unsuccessful(err) => {
            assert_eq!(err.status, 400);
            assert_eq!(err.message, "Invalid email or password");
            assert_eq!(err.error.unwrap().code, "INVALID_AUTH");
        }
        ApiResponse::Success(_) => panic!("Expected an unsuccessful response"),
    }
}

/// Test a non-2xx reply without a readable body.
#[tokio::test]
async fn test_server_error_without_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login-mobile"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let response = client.login(&login_request()).await.unwrap();

    assert!(!response.is_ok());
    assert_eq!(response.status(), 502);
    assert_eq!(response.message(), UNEXPECTED_ERROR);
}

/// Test that an undecodable 2xx body is an error.
#[tokio::test]
async fn test_success_with_invalid_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login-mobile"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let result = client.login(&login_request()).await;

    assert!(result.is_err(), "Should fail on invalid JSON");
}

/// Test client timeout behavior.
#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user-details"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":200,"message":"ok","data":{"email":"a@b.c"}}"#)
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let config = NetworkConfig {
        request_timeout_secs: 1,
        connect_timeout_secs: 1,
    };

    let client = OccupiClient::new(mock_server.uri(), &config).unwrap();
    let result = client.user_details("a@b.c", "token").await;

    assert!(result.is_err(), "Should timeout");
}

// ==================== Request Shape Tests ====================

/// Test that the token is sent verbatim and the email as a query parameter.
#[tokio::test]
async fn test_user_details_sends_token_and_email() {
    let mock_server = MockServer::start().await;

    let body = r#"{
        "status": 200,
        "message": "Successfully fetched user details",
        "data": {"email": "test@example.com", "name": "Test User", "employeeid": "31231"}
    }"#;

    Mock::given(method("GET"))
        .and(path("/api/user-details"))
        .and(query_param("email", "test@example.com"))
        .and(header("Authorization", "raw-session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let user = client
        .user_details("test@example.com", "raw-session-token")
        .await
        .unwrap()
        .into_data()
        .unwrap();

    assert_eq!(user.name.as_deref(), Some("Test User"));
    assert_eq!(user.employeeid.as_deref(), Some("31231"));
}

/// Test that bookings are filtered by a JSON email filter.
#[tokio::test]
async fn test_bookings_filter() {
    let mock_server = MockServer::start().await;

    let body = r#"{
        "status": 200,
        "message": "Successfully fetched bookings!",
        "data": [
            {"occupiId": "OCC1", "roomId": "RM1", "roomName": "HDMI Room", "emails": ["test@example.com"]}
        ]
    }"#;

    Mock::given(method("GET"))
        .and(path("/api/view-bookings"))
        .and(query_param("filter", r#"{"email":"test@example.com"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let bookings = client
        .bookings("test@example.com", "token")
        .await
        .unwrap()
        .into_data()
        .unwrap();

    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].room_name, "HDMI Room");
}

/// Test the check-in request body.
#[tokio::test]
async fn test_check_in_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/check-in"))
        .and(body_json(serde_json::json!({
            "bookingId": "OCC1",
            "email": "test@example.com"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":200,"message":"Successfully checked in!","data":null}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let request = CheckInRequest {
        booking_id: "OCC1".to_string(),
        email: "test@example.com".to_string(),
    };
    let response = client.check_in(&request, "token").await.unwrap();

    assert!(response.is_ok());
    assert_eq!(response.message(), "Successfully checked in!");
}

/// Test client can be cloned and used concurrently.
#[tokio::test]
async fn test_api_client_clone_and_concurrent_use() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/get-users"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":200,"message":"ok","data":[{"email":"a@b.c"}]}"#),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let client1 = client.clone();
    let client2 = client.clone();

    let (r1, r2, r3) = tokio::join!(
        client.users("t"),
        client1.users("t"),
        client2.users("t")
    );

    assert!(r1.is_ok());
    assert!(r2.is_ok());
    assert!(r3.is_ok());
}

// ==================== Analytics & Presence Tests ====================

/// Test every analytics metric hits its own endpoint with the email and window.
#[tokio::test]
async fn test_analytics_endpoints_and_query() {
    let mock_server = MockServer::start().await;

    for metric in AnalyticsMetric::ALL {
        Mock::given(method("GET"))
            .and(path(format!("/analytics/{}", metric.endpoint())))
            .and(query_param("email", "test@example.com"))
            .and(query_param("timeFrom", "2024-09-02T00:00:00.000Z"))
            .and(query_param("timeTo", "2024-09-06T23:59:59.999Z"))
            .and(header("Authorization", "token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "message": "Successfully fetched analytics",
                "data": [{"overallTotal": 31.5, "ratio": 0.8}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();
    let range = AnalyticsRange::days(
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
        NaiveDate::from_ymd_opt(2024, 9, 6).unwrap(),
    );

    for metric in AnalyticsMetric::ALL {
        let rows = client
            .analytics(metric, "test@example.com", &range, "token")
            .await
            .unwrap()
            .into_data()
            .unwrap();
        assert_eq!(rows[0].overall_total, Some(31.5));
        assert_eq!(rows[0].ratio, Some(0.8));
    }
}

/// Test office presence calls are authorized GETs with envelope handling.
#[tokio::test]
async fn test_office_enter_and_exit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rtc/enter"))
        .and(header("Authorization", "token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":200,"message":"Entered office","data":null}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rtc/exit"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OccupiClient::new(mock_server.uri(), &network()).unwrap();

    let entered = client.enter_office("token").await.unwrap();
    assert!(entered.is_ok());
    assert_eq!(entered.message(), "Entered office");

    let exited = client.exit_office("token").await.unwrap();
    assert!(!exited.is_ok());
    assert_eq!(exited.message(), UNEXPECTED_ERROR);
}

// ==================== Prediction Service Tests ====================

/// Test weekly predictions parsing.
#[tokio::test]
async fn test_prediction_week() {
    let mock_server = MockServer::start().await;

    let body = r#"[
        {"Date": "2024-08-05", "Day_of_Week": 1, "Predicted_Attendance_Level": "300-450", "Predicted_Class": 2},
        {"Date": "2024-08-06", "Day_of_Week": 2, "Predicted_Attendance_Level": "450-600", "Predicted_Class": 3}
    ]"#;

    Mock::given(method("GET"))
        .and(path("/predict_week"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(mock_server.uri(), &network()).unwrap();
    let week = client.week().await.unwrap().unwrap();

    assert_eq!(week.len(), 2);
    assert_eq!(week[1].predicted_class, Some(3));
}

/// Test that a JSON null body is "no data".
#[tokio::test]
async fn test_prediction_null_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(mock_server.uri(), &network()).unwrap();
    assert!(client.day().await.unwrap().is_none());
}

/// Test the query parameters of the date-based endpoints.
#[tokio::test]
async fn test_prediction_date_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/predict_week_from_date"))
        .and(query_param("date", "2025-09-22"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/predict_day"))
        .and(query_param("date", "2025-09-22"))
        .and(query_param("start_hour", "8"))
        .and(query_param("end_hour", "16"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"Date": "2025-09-22", "Hourly_Predictions": [{"Hour": 8, "Predicted_Class": 1}]}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 9, 22).unwrap();
    let client = PredictionClient::new(mock_server.uri(), &network())
        .unwrap()
        .with_hour_window(8, 16);

    assert_eq!(client.week_from(date).await.unwrap(), Some(vec![]));
    let hourly = client.hourly(Some(date)).await.unwrap().unwrap();
    assert_eq!(hourly.hourly_predictions[0].hour, 8);
}

/// Test that a non-2xx prediction reply is an error.
#[tokio::test]
async fn test_prediction_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recommend"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(mock_server.uri(), &network()).unwrap();
    let result = client.recommendations().await;

    assert!(result.is_err(), "Should fail on 500 status");
}
