//! Request pipeline behavior against a mocked transport and recording UI.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::ui::{
    Alert, AlertAction, AlertPresenter, InteractionLock, NetworkActivityIndicator,
    ProgressOverlay,
};
use core_api::{transport_code, Api, ApiError, Endpoint, ErrorCode, ParameterEncoding, Session};
use mockall::mock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

mock! {
    Transport {}

    #[async_trait]
    impl HttpClient for Transport {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

type Log = Arc<Mutex<Vec<String>>>;

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// UI bridge that appends every call to a shared log.
struct RecordingUi {
    log: Log,
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingUi {
    fn new(log: &Log) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            alerts: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, entry: &str) {
        self.log.lock().unwrap().push(entry.to_string());
    }

    fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl NetworkActivityIndicator for RecordingUi {
    fn set_visible(&self, visible: bool) {
        self.push(if visible { "activity:on" } else { "activity:off" });
    }
}

impl ProgressOverlay for RecordingUi {
    fn show(&self) {
        self.push("overlay:show");
    }

    fn dismiss(&self) {
        self.push("overlay:dismiss");
    }
}

impl InteractionLock for RecordingUi {
    fn set_interaction_enabled(&self, enabled: bool) {
        self.push(if enabled { "interaction:on" } else { "interaction:off" });
    }
}

impl AlertPresenter for RecordingUi {
    fn present(&self, alert: Alert) {
        self.push("alert");
        self.alerts.lock().unwrap().push(alert);
    }
}

/// Transport whose responses are held back until released per URL.
#[derive(Default)]
struct GatedTransport {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl GatedTransport {
    fn gate(&self, url: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl HttpClient for GatedTransport {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.gate(&request.url).notified().await;
        Ok(HttpResponse::new(
            200,
            r#"{"errorCode":0,"errorDescription":""}"#,
        ))
    }
}

fn respond_with(status: u16, body: &'static str) -> MockTransport {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(move |_| Ok(HttpResponse::new(status, body)));
    transport
}

fn session_with(transport: impl HttpClient + 'static, ui: &Arc<RecordingUi>) -> Session {
    Session::builder(Arc::new(transport))
        .ui(ui.clone())
        .token("tok-1")
        .build()
}

fn recorded(request: core_api::Request, log: &Log) -> core_api::Request {
    let (a, b, c, d, e) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
    request
        .add_completion_handler(move |_| a.lock().unwrap().push("completion1".to_string()))
        .add_completion_handler(move |_| b.lock().unwrap().push("completion2".to_string()))
        .add_failure_handler(move |err| c.lock().unwrap().push(format!("failure1:{}", err.code())))
        .add_failure_handler(move |err| d.lock().unwrap().push(format!("failure2:{}", err.code())))
        .add_finish_handler(move || e.lock().unwrap().push("finish".to_string()))
}

#[tokio::test]
async fn test_success_delivers_full_body_and_orders_finalization() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let body = r#"{"errorCode":0,"errorDescription":"","orders":[{"id":1}],"total":1}"#;
    let api = Api::new(session_with(respond_with(200, body), &ui));

    let seen = Arc::new(Mutex::new(None));
    let s = seen.clone();
    let request = api
        .request(Endpoint::OrderHistory)
        .add_completion_handler(move |body| *s.lock().unwrap() = Some(body.clone()))
        .add_activity_indicator_view()
        .disable_user_interaction();

    let outcome = recorded(request, &log).execute().wait().await;

    let expected = json!({
        "errorCode": 0,
        "errorDescription": "",
        "orders": [{"id": 1}],
        "total": 1
    });
    assert_eq!(outcome, Some(Ok(expected.clone())));
    assert_eq!(*seen.lock().unwrap(), Some(expected));
    assert_eq!(
        entries(&log),
        vec![
            "activity:on",
            "overlay:show",
            "interaction:off",
            "completion1",
            "completion2",
            "activity:off",
            "finish",
            "overlay:dismiss",
            "interaction:on",
        ]
    );
}

#[tokio::test]
async fn test_application_error_reaches_failure_handlers_then_alert() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let body = r#"{"errorCode":3,"errorDescription":"Bad data"}"#;
    let api = Api::new(session_with(respond_with(200, body), &ui));

    let request = api
        .request(Endpoint::UpdateUser)
        .method(HttpMethod::Post)
        .show_alert_if_error(vec![AlertAction::cancel("OK")])
        .show_alert_if_error(vec![AlertAction::new("Ignored")]);

    let outcome = recorded(request, &log).execute().wait().await;

    let err = outcome.unwrap().unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::ErrorData));
    assert_eq!(err.description(), "Bad data");
    assert_eq!(
        entries(&log),
        vec![
            "activity:on",
            "failure1:3",
            "failure2:3",
            "alert",
            "activity:off",
            "finish",
        ]
    );

    let alerts = ui.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Error");
    assert_eq!(alerts[0].message, "Bad data");
    assert_eq!(alerts[0].actions, vec![AlertAction::cancel("OK")]);
}

#[tokio::test]
async fn test_unknown_error_code_maps_to_unknown() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let body = r#"{"errorCode":42,"errorDescription":"Machine offline"}"#;
    let api = Api::new(session_with(respond_with(200, body), &ui));

    let err = api.request(Endpoint::MachineTypes).run().await.unwrap_err();

    assert_eq!(err.error_code(), Some(ErrorCode::Unknown));
    assert_eq!(err.description(), "Machine offline");
}

#[tokio::test]
async fn test_missing_envelope_is_parse_error() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let api = Api::new(session_with(respond_with(200, r#"{"families":[]}"#), &ui));

    let err = api.request(Endpoint::Families).run().await.unwrap_err();

    assert_eq!(err.code(), -999);
    assert_eq!(err.description(), "ServerResultCodeParseError");
}

#[tokio::test]
async fn test_http_status_failure_ignores_body() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let body = r#"{"errorCode":0,"errorDescription":""}"#;
    let api = Api::new(session_with(respond_with(401, body), &ui));

    let request = recorded(api.request(Endpoint::UserDetails), &log);
    let err = request.run().await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 401, .. }));
    assert_eq!(
        entries(&log),
        vec!["activity:on", "failure1:401", "failure2:401", "activity:off", "finish"]
    );
}

#[tokio::test]
async fn test_transport_failure_reaches_failure_handlers() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(|_| Err(BridgeError::Connection("connection refused".to_string())));
    let api = Api::new(session_with(transport, &ui));

    let err = recorded(api.request(Endpoint::Packs), &log)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.code(), transport_code::CANNOT_CONNECT);
    assert!(err.description().contains("connection refused"));
    assert!(!entries(&log).contains(&"completion1".to_string()));
}

#[tokio::test]
async fn test_send_sms_sends_token_and_phone_headers() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .withf(|request: &HttpRequest| {
            request.method == HttpMethod::Get
                && request.url == "http://url.com/sendsms"
                && request.headers.len() == 2
                && request.headers.get("access_token").map(String::as_str) == Some("tok-1")
                && request.headers.get("phone_num").map(String::as_str) == Some("+15550100")
                && request.body.is_none()
        })
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"errorCode":0,"errorDescription":""}"#,
            ))
        });
    let api = Api::new(session_with(transport, &ui));

    let body = api.send_sms("+15550100").run().await.unwrap();

    assert_eq!(body["errorCode"], 0);
}

#[tokio::test]
async fn test_form_encoded_get_params_land_in_query() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .withf(|request: &HttpRequest| {
            request.url == "http://url.com/street?city=12&substring=Her"
                && request.body.is_none()
        })
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"errorCode":0,"errorDescription":"","streets":[]}"#,
            ))
        });
    let api = Api::new(session_with(transport, &ui));

    let params = match json!({"substring": "Her", "city": 12}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let body = api
        .request(Endpoint::StreetsBySubstringAndCity)
        .params(params)
        .encoding(ParameterEncoding::Form)
        .run()
        .await
        .unwrap();

    assert_eq!(body["streets"], json!([]));
}

#[tokio::test]
async fn test_json_params_become_body() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .withf(|request: &HttpRequest| {
            let body: Option<Value> = request
                .body
                .as_ref()
                .and_then(|b| serde_json::from_slice(b).ok());
            request.method == HttpMethod::Post
                && request.headers.get("Content-Type").map(String::as_str)
                    == Some("application/json")
                && body == Some(json!({"packId": 9}))
        })
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"errorCode":0,"errorDescription":""}"#,
            ))
        });
    let api = Api::new(session_with(transport, &ui));

    let params = match json!({"packId": 9}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let result = api
        .request(Endpoint::OpenOrder)
        .method(HttpMethod::Post)
        .params(params)
        .run()
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cancelled_request_runs_no_handlers_and_other_request_completes() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let transport = Arc::new(GatedTransport::default());
    let session = Session::builder(transport.clone())
        .ui(ui.clone())
        .build();
    let api = Api::new(session.clone());

    let cancelled_log = Log::default();
    let first = recorded(api.request(Endpoint::Packs), &cancelled_log)
        .add_activity_indicator_view()
        .disable_user_interaction()
        .execute();
    let completed_log = Log::default();
    let second = recorded(api.request(Endpoint::Banners), &completed_log).execute();

    assert_eq!(session.active_requests(), 2);

    assert!(first.cancel());
    assert!(first.is_cancelled());
    assert_eq!(session.active_requests(), 1);
    assert!(!session.is_overlay_visible());
    assert!(!session.is_interaction_locked());

    transport.gate("http://url.com/packs").notify_one();
    transport.gate("http://url.com/banners").notify_one();

    assert_eq!(first.wait().await, None);
    assert!(second.wait().await.unwrap().is_ok());

    assert!(entries(&cancelled_log).is_empty());
    assert_eq!(
        entries(&completed_log),
        vec!["completion1", "completion2", "finish"]
    );
    assert!(!session.is_network_active());

    let ui_log = entries(&log);
    let count = |entry: &str| ui_log.iter().filter(|e| e.as_str() == entry).count();
    assert_eq!(count("activity:on"), 1);
    assert_eq!(count("activity:off"), 1);
    assert_eq!(count("overlay:dismiss"), 1);
    assert_eq!(count("interaction:on"), 1);
}

#[tokio::test]
async fn test_cancel_before_transport_settles_wins() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let mut transport = MockTransport::new();
    transport.expect_execute().returning(|_| {
        Ok(HttpResponse::new(
            200,
            r#"{"errorCode":0,"errorDescription":""}"#,
        ))
    });
    let api = Api::new(session_with(transport, &ui));

    let handler_log = Log::default();
    // On the current-thread test runtime the spawned task has not been
    // polled yet when cancel runs.
    let handle = recorded(api.request(Endpoint::Banners), &handler_log).execute();
    assert!(handle.cancel());

    assert_eq!(handle.wait().await, None);
    assert!(entries(&handler_log).is_empty());
    assert_eq!(entries(&log), vec!["activity:on", "activity:off"]);
}

#[tokio::test]
async fn test_overlapping_requests_keep_indicator_until_last_finishes() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let transport = Arc::new(GatedTransport::default());
    let session = Session::builder(transport.clone())
        .ui(ui.clone())
        .build();
    let api = Api::new(session.clone());

    let first = api.request(Endpoint::Packs).add_activity_indicator_view().execute();
    let second = api.request(Endpoint::Banners).add_activity_indicator_view().execute();

    transport.gate("http://url.com/banners").notify_one();
    assert!(second.wait().await.is_some());

    assert!(session.is_network_active());
    assert!(session.is_overlay_visible());
    assert!(!entries(&log).contains(&"activity:off".to_string()));

    transport.gate("http://url.com/packs").notify_one();
    assert!(first.wait().await.is_some());

    assert!(!session.is_network_active());
    assert_eq!(
        entries(&log),
        vec!["activity:on", "overlay:show", "activity:off", "overlay:dismiss"]
    );
}

#[tokio::test]
async fn test_alert_without_presenter_is_ignored() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(|_| Err(BridgeError::Timeout));
    let session = Session::builder(Arc::new(transport)).build();
    let api = Api::new(session);

    let failures = Log::default();
    let f = failures.clone();
    let err = api
        .request(Endpoint::GiftByCapsuleType)
        .show_alert_if_error(vec![])
        .add_failure_handler(move |err| f.lock().unwrap().push(err.code().to_string()))
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.code(), transport_code::TIMED_OUT);
    assert_eq!(entries(&failures), vec![transport_code::TIMED_OUT.to_string()]);
}

#[tokio::test]
async fn test_panicking_handler_releases_ui() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let body = r#"{"errorCode":0,"errorDescription":""}"#;
    let session = session_with(respond_with(200, body), &ui);
    let api = Api::new(session.clone());

    let handle = api
        .request(Endpoint::DrinkTypes)
        .add_activity_indicator_view()
        .add_completion_handler(|_| panic!("handler bug"))
        .execute();

    assert_eq!(handle.wait().await, None);
    assert!(!session.is_network_active());
    assert!(!session.is_overlay_visible());
}

#[tokio::test]
async fn test_dropping_handle_does_not_cancel() {
    let log = Log::default();
    let ui = RecordingUi::new(&log);
    let body = r#"{"errorCode":0,"errorDescription":""}"#;
    let session = session_with(respond_with(200, body), &ui);
    let api = Api::new(session.clone());

    let done = Arc::new(Notify::new());
    let d = done.clone();
    drop(
        api.request(Endpoint::CapsuleTypes)
            .add_finish_handler(move || d.notify_one())
            .execute(),
    );

    done.notified().await;
    assert!(!session.is_network_active());
}
