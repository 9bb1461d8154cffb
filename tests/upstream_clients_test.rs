// HTTP adapter tests against a local mock server
use energy_dashboard::application::telemetry_repository::{TimeSeriesSource, UpstreamError};
use energy_dashboard::application::weather_provider::{Coordinates, WeatherProvider};
use energy_dashboard::infrastructure::influx_repository::InfluxRepository;
use energy_dashboard::infrastructure::weather_client::HttpWeatherClient;
use serde_json::json;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn influx(server: &MockServer, timeout: Duration) -> InfluxRepository {
    InfluxRepository::new(server.uri(), "home".to_string(), "s3cr3t".to_string(), timeout).unwrap()
}

#[tokio::test]
async fn test_influx_posts_flux_and_returns_csv() {
    let server = MockServer::start().await;
    let flux = "from(bucket: \"energy\") |> range(start: -600s)";
    Mock::given(method("POST"))
        .and(path("/api/v2/query"))
        .and(query_param("org", "home"))
        .and(header("authorization", "Token s3cr3t"))
        .and(header("content-type", "application/vnd.flux"))
        .and(body_string(flux))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(",result,table,_time\n,_result,0,t1\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let body = influx(&server, Duration::from_secs(5)).query_csv(flux).await.unwrap();
    assert!(body.starts_with(",result,table,_time"));
}

#[tokio::test]
async fn test_influx_error_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .mount(&server)
        .await;

    let err = influx(&server, Duration::from_secs(5)).query_csv("x").await.unwrap_err();
    match err {
        UpstreamError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "service unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_influx_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let err = influx(&server, Duration::from_millis(50)).query_csv("x").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn test_weather_geocode_and_forecast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("key", "k"))
        .and(query_param("q", "Freiburg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "Freiburg",
                "region": "Baden-Wurttemberg",
                "country": "Germany",
                "lat": 47.99,
                "lon": 7.85
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .and(query_param("q", "47.99,7.85"))
        .and(query_param("days", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"forecast": {"forecastday": []}})),
        )
        .mount(&server)
        .await;

    let client = HttpWeatherClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let place = client.geocode("k", "Freiburg").await.unwrap().unwrap();
    assert_eq!(place.name, "Freiburg, Baden-Wurttemberg, Germany");
    assert_eq!(place.coordinates, Coordinates { lat: 47.99, lng: 7.85 });

    let forecast = client.forecast("k", place.coordinates, 3).await.unwrap();
    assert_eq!(forecast, json!({"forecast": {"forecastday": []}}));
}

#[tokio::test]
async fn test_weather_unknown_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = HttpWeatherClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    assert_eq!(client.geocode("k", "Atlantis").await.unwrap(), None);
}

#[tokio::test]
async fn test_weather_html_with_200_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=UTF-8")
                .set_body_string("<html>Invalid API key</html>"),
        )
        .mount(&server)
        .await;

    let client = HttpWeatherClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let err = client
        .current("bad", Coordinates { lat: 1.0, lng: 2.0 })
        .await
        .unwrap_err();
    assert!(
        matches!(err, UpstreamError::ContentType(ref ct) if ct.starts_with("text/html")),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_weather_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"API key invalid\"}"))
        .mount(&server)
        .await;

    let client = HttpWeatherClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let err = client.current("bad", Coordinates { lat: 1.0, lng: 2.0 }).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Status { status: 401, .. }));
}

#[tokio::test]
async fn test_weather_body_timeout_is_a_timeout() {
    // Headers arrive at once, the body never finishes.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let head = "HTTP/1.1 200 OK\r\n\
                    content-type: application/json\r\n\
                    content-length: 64\r\n\r\n{";
        socket.write_all(head.as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let client =
        HttpWeatherClient::new(format!("http://{}", addr), Duration::from_millis(200)).unwrap();
    let err = client.current("k", Coordinates { lat: 1.0, lng: 2.0 }).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Timeout), "got {err:?}");
}
